use serde::Serialize;

use super::ListingRequest;
use super::blocks::BlockDefinition;
use crate::models::preference::Preferences;
use crate::models::ticket::TicketOrder;

/// Snap a requested offset onto a page boundary inside `[0, count)`.
///
/// Past the end lands on the start of the last (possibly partial) page.
pub fn clamp_start(start: i64, count: i64, per_page: i64) -> i64 {
    let per_page = per_page.max(1);
    if start < 0 {
        0
    } else if start >= count {
        let tail = if count % per_page == 0 { per_page } else { count % per_page };
        (count - tail).max(0)
    } else {
        start - start % per_page
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    TicketId,
    TicketName,
    Replies,
    AllReplies,
    Urgency,
    Updated,
    Assigned,
    Status,
    Starter,
    LastReply,
}

impl SortColumn {
    pub const ALL: [SortColumn; 10] = [
        SortColumn::TicketId,
        SortColumn::TicketName,
        SortColumn::Replies,
        SortColumn::AllReplies,
        SortColumn::Urgency,
        SortColumn::Updated,
        SortColumn::Assigned,
        SortColumn::Status,
        SortColumn::Starter,
        SortColumn::LastReply,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::TicketId => "ticketid",
            SortColumn::TicketName => "ticketname",
            SortColumn::Replies => "replies",
            SortColumn::AllReplies => "allreplies",
            SortColumn::Urgency => "urgency",
            SortColumn::Updated => "updated",
            SortColumn::Assigned => "assigned",
            SortColumn::Status => "status",
            SortColumn::Starter => "starter",
            SortColumn::LastReply => "lastreply",
        }
    }

    pub fn from_item(item: &str) -> Option<Self> {
        SortColumn::ALL.into_iter().find(|c| c.as_str() == item)
    }

    /// SQL expression over the ticket query's table aliases.
    fn sql_expr(&self) -> &'static str {
        match self {
            SortColumn::TicketId => "t.id",
            SortColumn::TicketName => "t.subject",
            SortColumn::Replies => "t.num_replies",
            SortColumn::AllReplies => "(t.num_replies + t.deleted_replies)",
            SortColumn::Urgency => "t.urgency",
            SortColumn::Updated => "t.last_updated",
            SortColumn::Assigned => "COALESCE(m_assigned.real_name, '')",
            SortColumn::Status => "t.status",
            SortColumn::Starter => "COALESCE(m_started.real_name, '')",
            SortColumn::LastReply => "COALESCE(m_updated.real_name, '')",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedSort {
    pub column: SortColumn,
    pub direction: SortDirection,
    /// The token was fully valid and is echoed back into links.
    pub explicit: bool,
}

impl ResolvedSort {
    pub fn token(&self) -> String {
        format!("{}_{}", self.column.as_str(), self.direction.as_str())
    }

    pub fn order(&self) -> TicketOrder {
        TicketOrder {
            expr: self.column.sql_expr(),
            descending: self.direction == SortDirection::Desc,
        }
    }
}

/// Resolve a `<item>_<asc|desc>` token.
///
/// An unknown item falls back to `updated` but keeps a valid direction; an unknown
/// direction becomes `asc`; anything without exactly one underscore gets the
/// context default.
pub fn parse_sort(token: Option<&str>, default_direction: SortDirection) -> ResolvedSort {
    let fallback = ResolvedSort {
        column: SortColumn::Updated,
        direction: default_direction,
        explicit: false,
    };
    let Some(token) = token else {
        return fallback;
    };
    let Some((item, dir)) = token.split_once('_') else {
        return fallback;
    };
    if item.is_empty() || dir.contains('_') {
        return fallback;
    }

    let column = SortColumn::from_item(item);
    let direction = match dir {
        "asc" => Some(SortDirection::Asc),
        "desc" => Some(SortDirection::Desc),
        _ => None,
    };
    ResolvedSort {
        column: column.unwrap_or(SortColumn::Updated),
        direction: direction.unwrap_or(SortDirection::Asc),
        explicit: column.is_some() && direction.is_some(),
    }
}

/// Pagination window and ordering for one block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockPlan {
    pub start: i64,
    pub per_page: i64,
    pub sort: ResolvedSort,
}

/// Per-request planning inputs shared by every block.
pub struct Planner<'a> {
    pub request: &'a ListingRequest,
    pub preferences: &'a Preferences,
    pub items_per_page: i64,
    pub default_direction: SortDirection,
}

impl Planner<'_> {
    /// The viewer's page size for a block, else the configured default.
    pub fn page_size(&self, block: &BlockDefinition) -> i64 {
        self.preferences
            .block_page_size(block.key.as_str())
            .unwrap_or(self.items_per_page)
            .max(1)
    }

    /// `count` must already reflect any active filter.
    pub fn plan(&self, block: &BlockDefinition, count: i64) -> BlockPlan {
        let key = block.key.as_str();
        let (start, per_page) = if block.viewing_as_block {
            (0, count.max(1))
        } else {
            let per_page = self.page_size(block);
            let requested = self.request.start_for(key);
            (clamp_start(requested, count, per_page), per_page)
        };

        let token = self
            .request
            .sort_for(key)
            .or_else(|| self.preferences.block_sort(key));
        let sort = parse_sort(token, self.default_direction);

        log::debug!(
            "block {key}: count={count} start={start} per_page={per_page} sort={}",
            sort.token()
        );
        BlockPlan { start, per_page, sort }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingContext;
    use crate::listing::blocks::blocks_for;
    use std::collections::HashMap;

    #[test]
    fn clamp_handles_the_partial_last_page() {
        assert_eq!(clamp_start(25, 23, 10), 20);
        assert_eq!(clamp_start(23, 23, 10), 20);
        assert_eq!(clamp_start(30, 30, 10), 20);
        assert_eq!(clamp_start(17, 23, 10), 10);
        assert_eq!(clamp_start(-5, 23, 10), 0);
        assert_eq!(clamp_start(40, 0, 10), 0);
    }

    #[test]
    fn clamp_is_idempotent_and_in_range() {
        for count in 0..40 {
            for per_page in 1..12 {
                for start in -3..50 {
                    let once = clamp_start(start, count, per_page);
                    assert_eq!(clamp_start(once, count, per_page), once);
                    if count == 0 {
                        assert_eq!(once, 0);
                    } else {
                        assert!(once >= 0 && once < count);
                        assert_eq!(once % per_page, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn sort_tokens_resolve_per_registry() {
        let s = parse_sort(Some("urgency_desc"), SortDirection::Asc);
        assert_eq!((s.column, s.direction, s.explicit), (SortColumn::Urgency, SortDirection::Desc, true));

        let s = parse_sort(Some("bogus_desc"), SortDirection::Asc);
        assert_eq!((s.column, s.direction, s.explicit), (SortColumn::Updated, SortDirection::Desc, false));

        let s = parse_sort(Some("urgency_sideways"), SortDirection::Desc);
        assert_eq!((s.column, s.direction, s.explicit), (SortColumn::Urgency, SortDirection::Asc, false));

        let s = parse_sort(Some("urgency"), SortDirection::Desc);
        assert_eq!((s.column, s.direction, s.explicit), (SortColumn::Updated, SortDirection::Desc, false));

        let s = parse_sort(Some("a_b_c"), SortDirection::Asc);
        assert_eq!((s.column, s.direction), (SortColumn::Updated, SortDirection::Asc));
    }

    #[test]
    fn every_registered_column_round_trips_its_token() {
        for column in SortColumn::ALL {
            let token = format!("{}_asc", column.as_str());
            assert_eq!(parse_sort(Some(&token), SortDirection::Desc).column, column);
        }
    }

    #[test]
    fn plan_prefers_request_then_preference() {
        let request = ListingRequest::from_query(&HashMap::from([
            ("st_staff".to_string(), "25".to_string()),
            ("so_staff".to_string(), "ticketid_desc".to_string()),
        ]));
        let preferences = Preferences(HashMap::from([
            ("blocks_user_count".to_string(), "5".to_string()),
            ("block_order_user_block".to_string(), "urgency_desc".to_string()),
        ]));
        let planner = Planner {
            request: &request,
            preferences: &preferences,
            items_per_page: 10,
            default_direction: SortDirection::Asc,
        };
        let blocks = blocks_for(ListingContext::Home, true);

        let staff = planner.plan(&blocks[2], 23);
        assert_eq!((staff.start, staff.per_page), (20, 10));
        assert_eq!(staff.sort.token(), "ticketid_desc");

        let user = planner.plan(&blocks[3], 12);
        assert_eq!((user.start, user.per_page), (0, 5));
        assert_eq!(user.sort.column, SortColumn::Urgency);
    }

    #[test]
    fn single_block_view_shows_everything_from_zero() {
        let request = ListingRequest::from_query(&HashMap::from([("st_new".to_string(), "40".to_string())]));
        let preferences = Preferences::default();
        let planner = Planner {
            request: &request,
            preferences: &preferences,
            items_per_page: 10,
            default_direction: SortDirection::Asc,
        };
        let blocks = blocks_for(ListingContext::ViewBlock(crate::listing::blocks::BlockKey::New), true);
        let plan = planner.plan(&blocks[1], 42);
        assert_eq!((plan.start, plan.per_page), (0, 42));
    }
}
