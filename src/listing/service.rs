use std::collections::HashMap;

use super::actions::ActionContext;
use super::assembler::{RowOptions, apply_identities, decorate, member_ids};
use super::blocks::{BlockDefinition, blocks_for};
use super::planner::Planner;
use super::prefix::{PrefixField, compose};
use super::reducer::{FilterField, reduce_in_use};
use super::{Block, CanonicalParams, Listing, ListingContext, ListingRequest};
use crate::auth::capability::{Capability, CapabilityChecker};
use crate::config::Config;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::custom_field::{self, FieldDefinition};
use crate::models::field_value;
use crate::models::member::IdentityResolver;
use crate::models::preference::Preferences;
use crate::models::ticket::{self, TicketQuery};

/// The member a listing is built for.
pub struct Viewer<'a> {
    pub id: i64,
    pub checker: &'a dyn CapabilityChecker,
    pub preferences: &'a Preferences,
}

fn check_access(context: ListingContext, viewer: &Viewer<'_>, dept: Option<i64>) -> Result<(), AppError> {
    let checker = viewer.checker;
    match context {
        ListingContext::Closed => {
            if checker.has_capability(Capability::ViewClosedAny, dept)
                || checker.has_capability(Capability::ViewClosedOwn, dept)
            {
                Ok(())
            } else {
                Err(AppError::PermissionDenied(Capability::ViewClosedOwn.code().to_string()))
            }
        }
        ListingContext::RecycleBin => {
            if checker.has_capability(Capability::AccessRecycleBin, dept) {
                Ok(())
            } else {
                Err(AppError::PermissionDenied(Capability::AccessRecycleBin.code().to_string()))
            }
        }
        ListingContext::Home | ListingContext::ViewBlock(_) => Ok(()),
    }
}

/// Whether the viewer sees every ticket or only the ones they started.
fn sees_any(context: ListingContext, checker: &dyn CapabilityChecker, dept: Option<i64>) -> bool {
    let general = checker.has_capability(Capability::Staff, dept)
        || checker.has_capability(Capability::ViewTicketAny, dept);
    match context {
        ListingContext::Closed => general && checker.has_capability(Capability::ViewClosedAny, dept),
        _ => general,
    }
}

/// Prefix fields the viewer may see that apply to the listed department(s).
fn prefix_fields(
    definitions: &[FieldDefinition],
    dept: Option<i64>,
    is_staff: bool,
    is_admin: bool,
) -> Vec<PrefixField> {
    definitions
        .iter()
        .filter(|def| def.active && def.location.on_ticket() && def.placement.is_prefix())
        .filter(|def| def.visibility.visible_to(is_staff, is_admin))
        .filter(|def| match dept {
            Some(d) => def.requirement_for(d).is_applicable(),
            None => def.departments.values().any(|r| r.is_applicable()),
        })
        .filter_map(PrefixField::from_definition)
        .collect()
}

/// Plan, fetch and decorate every block of a listing context.
pub async fn build_listing<R: IdentityResolver>(
    pool: &DbPool,
    config: &Config,
    viewer: &Viewer<'_>,
    resolver: &R,
    context: ListingContext,
    request: &ListingRequest,
) -> Result<Listing, AppError> {
    let dept = request.dept;
    check_access(context, viewer, dept)?;

    let checker = viewer.checker;
    let is_staff = checker.has_capability(Capability::Staff, dept);
    let is_admin = checker.has_capability(Capability::Admin, dept);
    let see_any = sees_any(context, checker, dept);
    let filter = request.filter();

    let definitions: Vec<BlockDefinition> = blocks_for(context, is_staff);
    if let ListingContext::ViewBlock(target) = context {
        if !definitions.iter().any(|b| b.key == target && b.display) {
            return Err(AppError::NotFound(format!("Block '{}'", target.as_str())));
        }
    }

    let planner = Planner {
        request,
        preferences: viewer.preferences,
        items_per_page: config.items_per_page,
        default_direction: context.default_direction(),
    };
    let row_options = RowOptions {
        zerofill: config.ticket_zerofill,
        show_dept: config.multi_department && dept.is_none(),
    };
    let action_context = ActionContext {
        checker,
        viewer: viewer.id,
        multi_department: config.multi_department,
        helpdesk_only: config.helpdesk_only,
    };

    let mut blocks = Vec::with_capacity(definitions.len());
    for def in definitions {
        if !def.display {
            continue;
        }
        let query = TicketQuery {
            predicate: &def.predicate,
            viewer: viewer.id,
            see_any,
            dept,
            filter,
        };
        let count = ticket::count(pool, &query).await?;
        if def.viewing_as_block && count == 0 {
            return Err(AppError::NotFound(format!("Block '{}' is empty", def.key.as_str())));
        }

        let plan = planner.plan(&def, count);
        let tickets = if !def.collapsed && count > 0 {
            ticket::find_block_rows(pool, &query, plan.sort.order(), plan.start, plan.per_page)
                .await?
                .iter()
                .map(|record| decorate(record, &row_options, &action_context))
                .collect()
        } else {
            vec![]
        };

        blocks.push(Block {
            key: def.key,
            icon: def.icon,
            title: def.title,
            count,
            columns: def.columns,
            required: def.required,
            collapsed: def.collapsed,
            viewing_as_block: def.viewing_as_block,
            plan,
            tickets,
        });
    }

    let ids = member_ids(blocks.iter().flat_map(|b| b.tickets.iter()));
    let identities = if ids.is_empty() { HashMap::new() } else { resolver.resolve(&ids).await? };
    // Rows with no resolvable member still need the unassigned fallback.
    for row in blocks.iter_mut().flat_map(|b| b.tickets.iter_mut()) {
        apply_identities(row, &identities);
    }

    let canonical = canonical_params(&blocks, request);
    blocks.retain(|b| b.count > 0 || b.required || b.collapsed);

    let ticket_ids: Vec<i64> = blocks
        .iter()
        .flat_map(|b| b.tickets.iter().map(|t| t.id))
        .collect();
    let mut filter_fields = vec![];
    if !ticket_ids.is_empty() {
        let definitions = custom_field::list_definitions(pool).await?;
        let fields = prefix_fields(&definitions, dept, is_staff, is_admin);
        if !fields.is_empty() {
            let field_ids: Vec<i64> = fields.iter().map(|f| f.id).collect();
            let values = field_value::batch_get(pool, &ticket_ids, &field_ids).await?;
            apply_prefixes(&mut blocks, &values, &fields, context, dept);

            let candidates: Vec<FilterField> = fields
                .iter()
                .filter(|f| f.filterable)
                .map(|f| FilterField { id: f.id, name: f.name.clone(), options: f.options.active_map() })
                .collect();
            if !candidates.is_empty() {
                let ids: Vec<i64> = candidates.iter().map(|f| f.id).collect();
                let recorded = field_value::recorded_values(pool, &ids).await?;
                filter_fields = reduce_in_use(candidates, &recorded);
            }
        }
    }

    Ok(Listing {
        context: context.name(),
        home_view: if is_staff { "staff" } else { "user" },
        blocks,
        filter_fields,
        canonical,
    })
}

fn apply_prefixes(
    blocks: &mut [Block],
    values: &field_value::TicketValues,
    fields: &[PrefixField],
    context: ListingContext,
    dept: Option<i64>,
) {
    for row in blocks.iter_mut().flat_map(|b| b.tickets.iter_mut()) {
        let composed = compose(&row.raw_subject, values.get(&row.id), fields, context.base_path(), dept);
        row.subject = composed.subject;
        row.prefix_links = composed.links;
    }
}

/// Parameters worth keeping in links: non-zero starts, valid sorts, the filter and department.
fn canonical_params(blocks: &[Block], request: &ListingRequest) -> CanonicalParams {
    let mut params = HashMap::new();
    for block in blocks {
        let key = block.key.as_str();
        if block.plan.start != 0 && !block.viewing_as_block {
            params.insert(format!("st_{key}"), block.plan.start.to_string());
        }
        if block.plan.sort.explicit {
            params.insert(format!("so_{key}"), block.plan.sort.token());
        }
    }
    if let Some((field, value)) = request.filter() {
        params.insert("field".to_string(), field.to_string());
        params.insert("filter".to_string(), value.to_string());
    }
    if let Some(dept) = request.dept {
        params.insert("dept".to_string(), dept.to_string());
    }
    CanonicalParams(params.into_iter().collect())
}
