use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A news/activity post. Primary store only — if the store is down these
/// are simply unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub title: String,
    pub content: String,
    /// draft | published
    pub status: String,
    pub image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Activity {
    pub fn display_date(&self) -> String {
        super::display_date(self.created_at)
    }

    /// Short plain excerpt for list views.
    pub fn excerpt(&self, max: usize) -> String {
        let text = self.content.trim();
        if text.chars().count() <= max {
            return text.to_string();
        }
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// Validated fields for create/edit. Image handling lives in the route
/// layer since it involves the upload dir.
#[derive(Debug, Clone)]
pub struct ActivityInput {
    pub title: String,
    pub content: String,
    pub status: String,
    pub image: Option<String>,
}

impl ActivityInput {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let title = self.title.trim();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        } else if title.len() > 255 {
            errors.push("Title must be between 1 and 255 characters".to_string());
        }
        if self.content.trim().len() < 10 {
            errors.push("Content is required and must be at least 10 characters".to_string());
        }
        if self.status != "draft" && self.status != "published" {
            errors.push("Invalid status selected".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ActivityInput {
        ActivityInput {
            title: "Community Outreach".to_string(),
            content: "We visited three schools this month.".to_string(),
            status: "published".to_string(),
            image: None,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_empty());
    }

    #[test]
    fn empty_title_and_bad_status_rejected() {
        let mut i = input();
        i.title = "  ".to_string();
        i.status = "archived".to_string();
        assert_eq!(i.validate().len(), 2);
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let mut a_input = input();
        a_input.content = "abcdefghij".repeat(3);
        let a = Activity {
            id: "0".repeat(24),
            title: a_input.title,
            content: a_input.content,
            status: "published".to_string(),
            image: None,
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: chrono::Utc::now().naive_utc(),
        };
        assert_eq!(a.excerpt(10), "abcdefghij...");
        assert_eq!(a.excerpt(100), "abcdefghij".repeat(3));
    }
}
