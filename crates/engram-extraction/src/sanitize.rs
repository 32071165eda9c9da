//! Raw LLM output sanitization, applied before any parsing.
//!
//! Strips C0/C1 control characters (keeping tab, LF, CR) and `<script>`
//! blocks. Model output is untrusted input.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script pattern is valid")
});

/// Clean a raw model response for downstream parsing.
pub fn sanitize_output(raw: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(raw, "");
    without_scripts
        .chars()
        .filter(|&c| !is_stripped_control(c))
        .collect()
}

/// C0 controls except tab/LF/CR, DEL, and the C1 range.
fn is_stripped_control(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}' => true,
        _ => false,
    }
}
