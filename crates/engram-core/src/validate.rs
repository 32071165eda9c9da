//! Identifier validation.
//!
//! Node names participate in string-built SQL fragments (recursive CTEs),
//! so the whitelist is the primary defense; the character-class and Unicode
//! checks below are defense in depth.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::MAX_NAME_LEN;
use crate::errors::{EngramError, EngramResult};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,200}$").expect("name pattern is valid"));

/// Unicode code points that never belong in an identifier: NUL, RLO, RLM,
/// zero-width space, and the U+FFFF non-character.
const FORBIDDEN_UNICODE: [char; 5] = ['\u{0000}', '\u{202E}', '\u{200F}', '\u{200B}', '\u{FFFF}'];

/// SQL/HTML metacharacters rejected before the whitelist even runs.
const FORBIDDEN_ASCII: [char; 5] = ['<', '>', '"', '\'', '\\'];

/// Validate an externally supplied node name.
///
/// Fails when the name is empty, longer than 200 characters, contains a
/// forbidden code point or metacharacter, or does not fully match
/// `^[A-Za-z0-9_-]{1,200}$`.
pub fn validate_name(name: &str) -> EngramResult<()> {
    if name.is_empty() {
        return Err(invalid("name", "must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(invalid("name", "must be at most 200 characters"));
    }
    if name.chars().any(|c| FORBIDDEN_UNICODE.contains(&c)) {
        return Err(invalid("name", "contains a forbidden unicode code point"));
    }
    if name.chars().any(|c| FORBIDDEN_ASCII.contains(&c)) {
        return Err(invalid("name", "contains a forbidden metacharacter"));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(invalid("name", "must match [A-Za-z0-9_-]{1,200}"));
    }
    Ok(())
}

/// Validate a tenant identifier: non-empty after trimming.
pub fn validate_tenant(tenant: &str) -> EngramResult<()> {
    if tenant.trim().is_empty() {
        return Err(invalid("tenant", "must not be empty"));
    }
    Ok(())
}

/// Escape a string for embedding in a SQL literal by doubling single quotes.
///
/// Bound parameters are always preferred; this exists for the rare
/// diagnostic paths that render literals.
pub fn escape_sql(input: &str) -> String {
    input.replace('\'', "''")
}

fn invalid(field: &str, reason: &str) -> EngramError {
    EngramError::Validation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_simple_names() {
        validate_name("ok_1").unwrap();
        validate_name("mem-1a2b3c4d").unwrap();
        validate_name("A").unwrap();
        validate_name(&"x".repeat(200)).unwrap();
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(validate_name("").is_err());
        assert!(validate_name(&"a".repeat(201)).is_err());
    }

    #[test]
    fn rejects_forbidden_unicode() {
        assert!(validate_name("n\u{0000}").is_err());
        assert!(validate_name("n\u{202E}").is_err());
        assert!(validate_name("n\u{200F}").is_err());
        assert!(validate_name("n\u{200B}").is_err());
        assert!(validate_name("n\u{FFFF}").is_err());
    }

    #[test]
    fn rejects_metacharacters() {
        for c in ['<', '>', '"', '\'', '\\'] {
            assert!(validate_name(&format!("a{c}b")).is_err(), "should reject {c:?}");
        }
    }

    #[test]
    fn rejects_injection_payloads() {
        assert!(validate_name("x'; DROP TABLE nodes; --").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("a;b").is_err());
    }

    #[test]
    fn tenant_must_be_non_empty() {
        assert!(validate_tenant("").is_err());
        assert!(validate_tenant("   ").is_err());
        validate_tenant("u1").unwrap();
    }

    #[test]
    fn escape_sql_doubles_quotes() {
        assert_eq!(escape_sql("it's"), "it''s");
        assert_eq!(escape_sql("plain"), "plain");
        assert_eq!(escape_sql("''"), "''''");
    }

    proptest! {
        #[test]
        fn whitelist_strings_always_pass(name in "[A-Za-z0-9_-]{1,200}") {
            prop_assert!(validate_name(&name).is_ok());
        }

        #[test]
        fn validated_names_survive_escaping_unchanged(name in "[A-Za-z0-9_-]{1,200}") {
            // Anything the validator admits contains no quote to escape.
            prop_assert_eq!(escape_sql(&name), name);
        }
    }
}
