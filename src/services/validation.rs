//! Field-level input validation shared by the admin and public forms.

use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, thiserror::Error)]
#[error("Validation failed for {} field(s)", fields.len())]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record an error; the first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
        self
    }

    pub fn required_opt(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        self.required(field, value.unwrap_or_default())
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if value.is_some_and(|v| v.chars().count() > max) {
            self.add(field, format!("Must be at most {} characters", max));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            if !is_valid_email(v) {
                self.add(field, "Invalid email address");
            }
        }
        self
    }

    pub fn url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            if !is_http_url(v) {
                self.add(field, "Must be an http(s) URL");
            }
        }
        self
    }

    pub fn range(&mut self, field: &str, value: i32, min: i32, max: i32) -> &mut Self {
        if value < min || value > max {
            self.add(field, format!("Must be between {} and {}", min, max));
        }
        self
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

pub fn is_http_url(value: &str) -> bool {
    url::Url::parse(value.trim())
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Trim and turn blank strings into `None`.
pub fn normalize(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_first_error_per_field() {
        let mut errors = ValidationErrors::new();
        errors.required("title", "  ").max_len("title", Some("  "), 1);
        assert_eq!(errors.get("title"), Some("This field is required"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn optional_fields_skip_format_checks_when_blank() {
        let mut errors = ValidationErrors::new();
        errors.email("email", Some("")).url("facebook_url", None);
        assert!(errors.is_empty());
    }

    #[test]
    fn checks_email_and_url_formats() {
        assert!(is_valid_email("veli@ornek.com"));
        assert!(!is_valid_email("veli@ornek"));
        assert!(!is_valid_email("veli ornek@x.com"));
        assert!(is_http_url("https://facebook.com/ornek"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("ftp://files.example.com"));
    }

    #[test]
    fn rating_range() {
        let mut errors = ValidationErrors::new();
        errors.range("rating", 6, 1, 5);
        assert_eq!(errors.get("rating"), Some("Must be between 1 and 5"));
    }

    #[test]
    fn normalize_trims_and_drops_blank() {
        assert_eq!(normalize(Some("  a ".into())), Some("a".to_string()));
        assert_eq!(normalize(Some("   ".into())), None);
    }
}
