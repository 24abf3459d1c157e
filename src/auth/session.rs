use actix_session::Session;
use crate::errors::AppError;

/// Capability codes carried in the session, optionally scoped to a department as `code@dept`.
#[derive(Debug, Clone, Default)]
pub struct Permissions {
    pub codes: Vec<String>,
    pub is_admin: bool,
}

impl Permissions {
    /// Exact, unscoped code.
    pub fn has(&self, code: &str) -> bool {
        self.is_admin || self.codes.iter().any(|p| p == code)
    }

    /// `code` held globally, or for `dept`. With no department, a grant in any department counts.
    pub fn has_in(&self, code: &str, dept: Option<i64>) -> bool {
        if self.has(code) {
            return true;
        }
        self.codes.iter().any(|p| match p.split_once('@') {
            Some((c, scope)) if c == code => match dept {
                Some(d) => scope.parse::<i64>().is_ok_and(|s| s == d),
                None => true,
            },
            _ => false,
        })
    }

    pub fn from_csv(csv: &str) -> Self {
        let codes = csv
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Permissions { codes, is_admin: false }
    }
}

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

/// The logged-in member, or a session error for anonymous requests.
pub fn require_user(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or_else(|| AppError::Session("Not logged in".to_string()))
}

pub fn get_permissions(session: &Session) -> Result<Permissions, String> {
    let mut permissions = match session.get::<String>("permissions") {
        Ok(Some(csv)) => Permissions::from_csv(&csv),
        Ok(None) => return Err("No permissions in session".to_string()),
        Err(e) => return Err(format!("Session error: {}", e)),
    };
    permissions.is_admin = session.get::<bool>("is_admin").unwrap_or(None).unwrap_or(false);
    Ok(permissions)
}

/// Check permission; returns Err(AppError) if denied.
pub fn require_permission(session: &Session, code: &str) -> Result<(), AppError> {
    let permissions = get_permissions(session)
        .map_err(|e| AppError::Session(format!("Failed to get permissions: {}", e)))?;

    if permissions.has(code) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(code.to_string()))
    }
}
