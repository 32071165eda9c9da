//! Secret redaction applied to every string that reaches a log sink or a
//! user-facing error message.

use std::sync::LazyLock;

use regex::Regex;

static SECRET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sk-[A-Za-z0-9_-]{20,}").expect("secret pattern is valid"));

/// Replace anything that looks like an API token with `[REDACTED]`.
pub fn redact_secrets(input: &str) -> String {
    SECRET_PATTERN.replace_all(input, "[REDACTED]").into_owned()
}
