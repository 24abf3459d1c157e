//! Ticket grids: several independently paginated and sortable blocks per page.
//!
//! A request is parsed once into an immutable [`ListingRequest`]; the service plans,
//! fetches and decorates every block and hands back a [`Listing`] together with the
//! sanitised parameters a renderer should use for its links.

pub mod actions;
pub mod assembler;
pub mod blocks;
pub mod planner;
pub mod prefix;
pub mod reducer;
pub mod service;

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use assembler::TicketRow;
use blocks::{BlockKey, Column};
use planner::{BlockPlan, SortDirection};
use reducer::FilterField;

pub use service::build_listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingContext {
    Home,
    Closed,
    RecycleBin,
    ViewBlock(BlockKey),
}

impl ListingContext {
    /// Closed and deleted tickets list newest first unless asked otherwise.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            ListingContext::Closed | ListingContext::RecycleBin => SortDirection::Desc,
            ListingContext::Home | ListingContext::ViewBlock(_) => SortDirection::Asc,
        }
    }

    /// Page that prefix filter links point back to.
    pub fn base_path(&self) -> &'static str {
        match self {
            ListingContext::Closed => "/helpdesk/closed",
            ListingContext::RecycleBin => "/helpdesk/recyclebin",
            ListingContext::Home | ListingContext::ViewBlock(_) => "/helpdesk",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ListingContext::Home => "home",
            ListingContext::Closed => "closed",
            ListingContext::RecycleBin => "recyclebin",
            ListingContext::ViewBlock(_) => "viewblock",
        }
    }
}

/// Listing parameters as submitted. Never modified after parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingRequest {
    starts: HashMap<String, i64>,
    sorts: HashMap<String, String>,
    pub filter: Option<(i64, String)>,
    pub dept: Option<i64>,
}

impl ListingRequest {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let mut request = ListingRequest::default();
        for (name, value) in query {
            if let Some(block) = name.strip_prefix("st_") {
                // Unparseable offsets count as "not given".
                if let Ok(start) = value.trim().parse::<i64>() {
                    request.starts.insert(block.to_string(), start);
                }
            } else if let Some(block) = name.strip_prefix("so_") {
                request.sorts.insert(block.to_string(), value.clone());
            }
        }

        let field = query.get("field").and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0);
        let filter = query.get("filter").map(|v| v.trim()).unwrap_or("");
        if field > 0 && !filter.is_empty() {
            request.filter = Some((field, filter.to_string()));
        }
        request.dept = query
            .get("dept")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|d| *d > 0);
        request
    }

    pub fn start_for(&self, block: &str) -> i64 {
        self.starts.get(block).copied().unwrap_or(0)
    }

    pub fn sort_for(&self, block: &str) -> Option<&str> {
        self.sorts.get(block).map(String::as_str)
    }

    pub fn filter(&self) -> Option<(i64, &str)> {
        self.filter.as_ref().map(|(field, value)| (*field, value.as_str()))
    }
}

/// Sanitised parameters: only non-zero starts, fully valid sort tokens and a usable filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalParams(pub BTreeMap<String, String>);

impl CanonicalParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn to_query_string(&self) -> String {
        serde_urlencoded::to_string(&self.0).unwrap_or_default()
    }
}

/// One planned, populated block.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub key: BlockKey,
    pub icon: &'static str,
    pub title: &'static str,
    pub count: i64,
    pub columns: Vec<Column>,
    pub required: bool,
    pub collapsed: bool,
    pub viewing_as_block: bool,
    pub plan: BlockPlan,
    pub tickets: Vec<TicketRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub context: &'static str,
    /// "staff" or "user"; selects the renderer's home layout.
    pub home_view: &'static str,
    pub blocks: Vec<Block>,
    pub filter_fields: Vec<FilterField>,
    pub canonical: CanonicalParams,
}

impl Listing {
    pub fn block(&self, key: BlockKey) -> Option<&Block> {
        self.blocks.iter().find(|b| b.key == key)
    }
}
