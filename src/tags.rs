//! Image tag validation and placeholder expansion

use anyhow::Result;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;

/// Tag that expands to the current UTC time, e.g. `2024-05-01T13.45.09Z`
pub const TIMESTAMP_PLACEHOLDER: &str = "{timestamp}";

/// `strftime` format for expanded timestamp tags (`:` is not allowed in tags)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H.%M.%SZ";

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][-_.A-Za-z0-9]{0,127}$").expect("tag pattern is a valid regex")
});

/// Check a single tag against the registry tag grammar
pub fn is_valid_tag(tag: &str) -> bool {
    TAG_PATTERN.is_match(tag)
}

/// Split a comma-separated tag list, validate each tag and expand the
/// timestamp placeholder using `now`.
///
/// Order is preserved. Every entry is validated, including empty ones
/// produced by stray commas.
pub fn parse_tags(list: &str, now: DateTime<Utc>) -> Result<Vec<String>> {
    list.split(',').map(|tag| expand_tag(tag, now)).collect()
}

/// Validate and expand one tag
pub fn expand_tag(tag: &str, now: DateTime<Utc>) -> Result<String> {
    if tag == TIMESTAMP_PLACEHOLDER {
        return Ok(now.format(TIMESTAMP_FORMAT).to_string());
    }
    if !is_valid_tag(tag) {
        return Err(Error::InvalidTag(tag.to_string()).into());
    }
    Ok(tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 9).unwrap()
    }

    #[test]
    fn test_accepts_common_tags() {
        for tag in ["latest", "v1.2.3", "build-42", "_private", "1"] {
            assert!(is_valid_tag(tag), "{} should be valid", tag);
        }
    }

    #[test]
    fn test_rejects_bad_tags() {
        for tag in ["-bad", "", ".hidden", "has space", "a:b", "ümlaut"] {
            assert!(!is_valid_tag(tag), "{:?} should be invalid", tag);
        }
    }

    #[test]
    fn test_length_limit() {
        let max = "a".repeat(128);
        let too_long = "a".repeat(129);
        assert!(is_valid_tag(&max));
        assert!(!is_valid_tag(&too_long));
    }

    #[test]
    fn test_placeholder_expands_to_timestamp() {
        let tag = expand_tag(TIMESTAMP_PLACEHOLDER, fixed_now()).unwrap();
        assert_eq!(tag, "2024-05-01T13.45.09Z");

        let shape = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}\.\d{2}\.\d{2}Z$").unwrap();
        let live = expand_tag(TIMESTAMP_PLACEHOLDER, Utc::now()).unwrap();
        assert!(shape.is_match(&live));
        assert!(is_valid_tag(&live));
    }

    #[test]
    fn test_parse_tag_list() {
        let tags = parse_tags("latest,{timestamp},v2", fixed_now()).unwrap();
        assert_eq!(tags, vec!["latest", "2024-05-01T13.45.09Z", "v2"]);
    }

    #[test]
    fn test_parse_tag_list_reports_invalid_tag() {
        let err = parse_tags("latest,-bad", fixed_now()).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::InvalidTag(tag)) => assert_eq!(tag, "-bad"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_tag_list_rejects_empty_entry() {
        assert!(parse_tags("latest,,v2", fixed_now()).is_err());
        assert!(parse_tags("", fixed_now()).is_err());
    }
}
