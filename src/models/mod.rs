use chrono::NaiveDateTime;
use chrono_tz::Africa::Lagos;
use chrono_tz::Tz;

pub mod activity;
pub mod admin;
pub mod contact;
pub mod page;
pub mod team;

/// Site display timezone. Timestamps are stored as UTC everywhere.
pub const SITE_TZ: Tz = Lagos;

/// Format a stored UTC timestamp for display, e.g. "Mar 4, 2025 2:15 PM".
pub fn display_date(utc: NaiveDateTime) -> String {
    utc.and_utc()
        .with_timezone(&SITE_TZ)
        .format("%b %-d, %Y %-I:%M %p")
        .to_string()
}

/// Loose email shape check: one '@' with a dotted domain after it.
pub fn valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(valid_email("jane@example.com"));
        assert!(valid_email("a.b+c@sub.example.org"));
        assert!(!valid_email("janeexample.com"));
        assert!(!valid_email("jane@"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("jane@example"));
        assert!(!valid_email("jane@.com"));
        assert!(!valid_email("a@b@c.com"));
    }
}
