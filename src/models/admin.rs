use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An administrator account. Canonical copy lives in the `administrators`
/// collection; a shadow copy may exist as one JSON file per username under
/// the fallback directory so login still works when the store is down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Administrator {
    pub id: String,
    pub username: String,
    /// bcrypt hash, never exposed to templates.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

#[derive(Debug, FromForm, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Option<String> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            Some("Please enter both username and password.".to_string())
        } else {
            None
        }
    }
}
