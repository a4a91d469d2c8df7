use regex::Regex;
use std::sync::LazyLock;

// `\s` is Unicode-aware and already covers U+3000; it is listed for clarity.
static STRIP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\u{3000}()]").expect("static pattern is valid"));

/// Canonicalize a raw cell value into a comparable label key.
///
/// Removes every whitespace variant (including the full-width space and line
/// breaks) and ASCII parentheses. Missing cells normalize to the empty string,
/// which never matches an anchor.
///
/// ```
/// use inspection_record_service::inspection::normalize_label;
///
/// assert_eq!(normalize_label(Some(" 定徑前 (Da)\n")), "定徑前Da");
/// assert_eq!(normalize_label(None), "");
/// ```
pub fn normalize_label(raw: Option<&str>) -> String {
    match raw {
        Some(text) => STRIP_PATTERN.replace_all(text, "").trim().to_string(),
        None => String::new(),
    }
}
