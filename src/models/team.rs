use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::valid_email;

/// A staff/volunteer profile shown on the team page. Primary store only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub image: Option<String>,
    pub display_order: i64,
    /// active | hidden
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct TeamMemberInput {
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
    pub bio: String,
    pub image: Option<String>,
    pub display_order: i64,
    pub status: String,
}

impl TeamMemberInput {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Full name is required".to_string());
        } else if self.name.trim().len() > 100 {
            errors.push("Name must be less than 100 characters".to_string());
        }
        if self.role.trim().is_empty() {
            errors.push("Role is required".to_string());
        }
        if !self.email.trim().is_empty() && !valid_email(self.email.trim()) {
            errors.push("Please enter a valid email address".to_string());
        }
        if self.status != "active" && self.status != "hidden" {
            errors.push("Invalid status selected".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_email_is_allowed() {
        let input = TeamMemberInput {
            name: "Amaka Obi".to_string(),
            role: "Coordinator".to_string(),
            email: String::new(),
            phone: String::new(),
            bio: String::new(),
            image: None,
            display_order: 0,
            status: "active".to_string(),
        };
        assert!(input.validate().is_empty());
    }

    #[test]
    fn missing_name_and_role_rejected() {
        let input = TeamMemberInput {
            name: String::new(),
            role: String::new(),
            email: "bad".to_string(),
            phone: String::new(),
            bio: String::new(),
            image: None,
            display_order: 0,
            status: "active".to_string(),
        };
        assert_eq!(input.validate().len(), 3);
    }
}
