use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex"));

pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.is_empty() || slug.len() > 100 {
        return Err(AppError::BadRequest(
            "Slug must be between 1 and 100 characters".to_string(),
        ));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AppError::BadRequest(
            "Slug must contain only lowercase letters, numbers, and hyphens".to_string(),
        ));
    }
    Ok(())
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

/// Check `value` against a closed set, e.g. channel kinds.
pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "{field} must be one of: {}",
            allowed.join(", ")
        )))
    }
}

pub fn validate_http_url(field: &str, value: &str) -> Result<(), AppError> {
    let url = reqwest::Url::parse(value)
        .map_err(|_| AppError::BadRequest(format!("{field} must be a valid URL")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::BadRequest(format!(
            "{field} must be an http or https URL"
        )));
    }
    Ok(())
}

pub fn validate_hex_color(value: &str) -> Result<(), AppError> {
    if HEX_COLOR.is_match(value) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "primary_color must look like #rrggbb".to_string(),
        ))
    }
}

pub fn require_object(field: &str, value: &serde_json::Value) -> Result<(), AppError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{field} must be a JSON object")))
    }
}

/// Clamp `limit` to 1..=max (default when absent) and `offset` to >= 0.
pub fn page(limit: Option<i64>, offset: Option<i64>, default: i64, max: i64) -> (i64, i64) {
    let limit = limit.unwrap_or(default).clamp(1, max);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Acme  Corp!"), "acme-corp");
        assert_eq!(slugify("--Hello__World--"), "hello-world");
    }

    #[test]
    fn slug_rules() {
        assert!(validate_slug("acme-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Acme").is_err());
        assert!(validate_slug(&"a".repeat(101)).is_err());
    }

    #[test]
    fn urls_must_be_http() {
        assert!(validate_http_url("url", "https://hooks.example.com/x").is_ok());
        assert!(validate_http_url("url", "ftp://example.com").is_err());
        assert!(validate_http_url("url", "not a url").is_err());
    }

    #[test]
    fn hex_colors() {
        assert!(validate_hex_color("#1A2b3c").is_ok());
        assert!(validate_hex_color("1a2b3c").is_err());
        assert!(validate_hex_color("#1a2b3").is_err());
    }

    #[test]
    fn one_of_lists_allowed_values() {
        let err = one_of("kind", "sms", &["whatsapp", "webchat"]).unwrap_err();
        assert!(err.to_string().contains("whatsapp, webchat"));
    }

    #[test]
    fn objects_only() {
        assert!(require_object("config", &json!({})).is_ok());
        assert!(require_object("config", &json!([])).is_err());
    }

    #[test]
    fn page_is_clamped() {
        assert_eq!(page(None, None, 50, 100), (50, 0));
        assert_eq!(page(Some(500), Some(-3), 50, 100), (100, 0));
        assert_eq!(page(Some(0), Some(20), 50, 100), (1, 20));
    }
}
