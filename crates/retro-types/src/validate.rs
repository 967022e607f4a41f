//! Payload validation shared by the server and the client.
//!
//! Limits mirror the API contract: names are capped at 100 characters and
//! stripped of markup, card content is capped at 500 characters, list
//! endpoints clamp their page size.

use std::sync::LazyLock;

use regex::Regex;

pub const MAX_SESSION_NAME_LEN: usize = 100;
pub const MAX_CARD_CONTENT_LEN: usize = 500;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const MAX_PAGE_LIMIT: u32 = 500;
pub const MAX_BODY_BYTES: usize = 16 * 1024;

static MARKUP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Validate and sanitize a session name: length-checked, markup-stripped,
/// trimmed, and required to be non-empty after sanitization.
pub fn session_name(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err("Name must not be empty".into());
    }
    if raw.chars().count() > MAX_SESSION_NAME_LEN {
        return Err(format!(
            "Name must be at most {MAX_SESSION_NAME_LEN} characters"
        ));
    }
    let cleaned = MARKUP.replace_all(raw, "").trim().to_string();
    if cleaned.is_empty() {
        return Err("Name must not be empty after sanitization".into());
    }
    Ok(cleaned)
}

/// Validate and trim card content.
pub fn card_content(raw: &str) -> Result<String, String> {
    if raw.chars().count() > MAX_CARD_CONTENT_LEN {
        return Err(format!(
            "Content must be at most {MAX_CARD_CONTENT_LEN} characters"
        ));
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Content must not be empty".into());
    }
    Ok(trimmed.to_string())
}

/// Clamp a requested page size into `1..=MAX_PAGE_LIMIT`, defaulting to
/// `DEFAULT_PAGE_LIMIT` when absent.
pub fn clamp_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_name_strips_markup() {
        assert_eq!(session_name("  Sprint <b>1</b> ").unwrap(), "Sprint 1");
        assert_eq!(
            session_name("<script>alert(1)</script>Retro").unwrap(),
            "alert(1)Retro"
        );
    }

    #[test]
    fn session_name_rejects_empty_after_sanitization() {
        let err = session_name("<br>").unwrap_err();
        assert!(err.contains("after sanitization"));
        assert!(session_name("").is_err());
    }

    #[test]
    fn session_name_rejects_overlong() {
        let long = "x".repeat(MAX_SESSION_NAME_LEN + 1);
        assert!(session_name(&long).is_err());
        let ok = "x".repeat(MAX_SESSION_NAME_LEN);
        assert_eq!(session_name(&ok).unwrap(), ok);
    }

    #[test]
    fn card_content_trims_and_caps() {
        assert_eq!(card_content("  went well  ").unwrap(), "went well");
        assert!(card_content("   ").is_err());
        assert!(card_content(&"y".repeat(MAX_CARD_CONTENT_LEN + 1)).is_err());
    }

    #[test]
    fn limit_clamps_into_range() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(9999)), MAX_PAGE_LIMIT);
    }
}
