use std::env;

/// Runtime settings, read once at start-up from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Default page size for ticket blocks without a member preference.
    pub items_per_page: i64,
    /// Width ticket ids are zero-padded to for display.
    pub ticket_zerofill: usize,
    pub multi_department: bool,
    /// When set, tickets cannot be converted into forum topics.
    pub helpdesk_only: bool,
    pub session_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://data/helpdesk.db?mode=rwc".to_string(),
            bind_addr: "127.0.0.1:8080".to_string(),
            items_per_page: 10,
            ticket_zerofill: 5,
            multi_department: true,
            helpdesk_only: false,
            session_key: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            items_per_page: parse_var("ITEMS_PER_PAGE", defaults.items_per_page).max(1),
            ticket_zerofill: parse_var("TICKET_ZEROFILL", defaults.ticket_zerofill),
            multi_department: parse_flag("MULTI_DEPARTMENT", defaults.multi_department),
            helpdesk_only: parse_flag("HELPDESK_ONLY", defaults.helpdesk_only),
            session_key: env::var("SESSION_KEY").ok(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring unparseable {name}={raw}");
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
