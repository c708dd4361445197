//! Markdown code fence stripping.

const FENCE: &str = "```";

/// Returns the body of the first fenced code block in `raw`, or `raw`
/// itself when there is no complete fence. The result is trimmed.
///
/// The opening fence may carry a language tag (`json`, `JSON`, ...), which is
/// dropped.
pub(crate) fn unwrap_fenced(raw: &str) -> &str {
    let Some((_, after_open)) = raw.split_once(FENCE) else {
        return raw.trim();
    };

    let body = after_open.trim_start_matches(|c: char| c.is_ascii_alphanumeric());

    match body.split_once(FENCE) {
        Some((inner, _)) => inner.trim(),
        None => raw.trim(),
    }
}
