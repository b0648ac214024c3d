use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::valid_email;

/// Timestamp format used in fallback files and display contexts.
pub const DATE_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// A contact-form submission. Lives in the `contact_messages` collection,
/// or as a single JSON file under the fallback directory when the primary
/// store was unreachable at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    /// 24-hex ObjectId for primary records, a unique string for fallback
    /// records. Only primary ids are actionable (status updates, delete).
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    /// unread | read | replied
    pub status: String,
    pub created_at: NaiveDateTime,
    pub ip_address: String,
    pub user_agent: String,
    pub reply_message: Option<String>,
    pub replied_by: Option<String>,
    pub replied_at: Option<NaiveDateTime>,
    /// True when the record came from the file fallback rather than the
    /// primary store.
    pub from_fallback: bool,
}

impl ContactMessage {
    pub fn display_date(&self) -> String {
        super::display_date(self.created_at)
    }
}

/// Raw contact form fields. The `website` field is a honeypot and must
/// stay empty.
#[derive(Debug, FromForm, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub website: Option<String>,
}

impl ContactForm {
    /// A filled honeypot marks a bot; the route pretends the submission
    /// succeeded so the bot learns nothing.
    pub fn is_bot(&self) -> bool {
        self.website.as_deref().map(|s| !s.is_empty()).unwrap_or(false)
    }

    /// Field-level validation matching the public form rules. Returns all
    /// problems at once so the form can show them together.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.len() < 2 {
            errors.push("Name must be at least 2 characters long".to_string());
        } else if name.len() > 100 {
            errors.push("Name must be less than 100 characters".to_string());
        }

        let email = self.email.trim();
        if email.is_empty() || !valid_email(email) {
            errors.push("Please enter a valid email address".to_string());
        } else if email.len() > 100 {
            errors.push("Email must be less than 100 characters".to_string());
        }

        let subject = self.subject.trim();
        if subject.is_empty() {
            errors.push("Subject is required".to_string());
        } else if subject.len() > 255 {
            errors.push("Subject must be less than 255 characters".to_string());
        }

        let message = self.message.trim();
        if message.len() < 10 {
            errors.push("Message must be at least 10 characters long".to_string());
        } else if message.len() > 5000 {
            errors.push("Message must be less than 5000 characters".to_string());
        }

        if let Some(ref hp) = self.website {
            if !hp.is_empty() {
                errors.push("Spam detected".to_string());
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            subject: "General Inquiry".to_string(),
            message: "Hello, I would like more information.".to_string(),
            website: None,
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(form().validate().is_empty());
    }

    #[test]
    fn short_name_rejected() {
        let mut f = form();
        f.name = "J".to_string();
        assert_eq!(f.validate().len(), 1);
    }

    #[test]
    fn bad_email_rejected() {
        let mut f = form();
        f.email = "not-an-email".to_string();
        assert!(!f.validate().is_empty());
    }

    #[test]
    fn short_message_rejected() {
        let mut f = form();
        f.message = "too short".to_string();
        assert!(!f.validate().is_empty());
    }

    #[test]
    fn oversized_fields_rejected() {
        let mut f = form();
        f.subject = "x".repeat(256);
        f.message = "y".repeat(5001);
        assert_eq!(f.validate().len(), 2);
    }

    #[test]
    fn honeypot_trips_spam_check() {
        let mut f = form();
        assert!(!f.is_bot());
        f.website = Some("http://spam.example".to_string());
        assert!(f.is_bot());
        assert!(f.validate().iter().any(|e| e.contains("Spam")));
    }
}
