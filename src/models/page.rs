use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Pages the admin editor may create or overwrite. Everything else 404s.
pub const EDITABLE_PAGES: &[&str] = &["home", "about", "contact"];

/// A static content page, keyed by `page_name`. Primary store only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub page_name: String,
    pub title: String,
    /// Trusted HTML authored in the admin panel; rendered unescaped.
    pub content: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, FromForm, Deserialize)]
pub struct PageForm {
    pub page_name: String,
    pub title: String,
    pub content: String,
}

impl PageForm {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !EDITABLE_PAGES.contains(&self.page_name.as_str()) {
            errors.push("Please select a page to edit.".to_string());
        }
        if self.title.trim().is_empty() {
            errors.push("Page title is required.".to_string());
        }
        if self.content.trim().is_empty() {
            errors.push("Page content is required.".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_page_name_rejected() {
        let form = PageForm {
            page_name: "secret".to_string(),
            title: "T".to_string(),
            content: "C".to_string(),
        };
        assert_eq!(form.validate().len(), 1);
    }

    #[test]
    fn known_page_accepted() {
        let form = PageForm {
            page_name: "about".to_string(),
            title: "About Us".to_string(),
            content: "<p>Who we are.</p>".to_string(),
        };
        assert!(form.validate().is_empty());
    }
}
