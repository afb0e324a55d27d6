//! Utility functions

use std::sync::LazyLock;

use regex::Regex;

pub static SLUG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9-]+$").expect("slug pattern is valid")
});

pub static HEX_COLOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("color pattern is valid")
});

pub fn is_valid_slug(s: &str) -> bool {
    SLUG_REGEX.is_match(s)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let keep = local.chars().take(if local.len() <= 2 { 1 } else { 2 }).collect::<String>();
        format!("{}***{}", keep, domain)
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert!(is_valid_slug("demo-restaurant"));
        assert!(is_valid_slug("cafe42"));
        assert!(!is_valid_slug("Demo"));
        assert!(!is_valid_slug("with space"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_hex_color() {
        assert!(HEX_COLOR_REGEX.is_match("#000"));
        assert!(HEX_COLOR_REGEX.is_match("#1a2B3c"));
        assert!(!HEX_COLOR_REGEX.is_match("red"));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("owner@demo.com"), "ow***@demo.com");
        assert_eq!(mask_email("a@b.c"), "a***@b.c");
        assert_eq!(mask_email("nope"), "***");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Owner@Demo.COM "), "owner@demo.com");
    }
}
