//! Result description snippets.

/// Descriptions longer than this are shortened in results.
pub const SNIPPET_CHARS: usize = 300;

const ELLIPSIS: &str = "...";

/// Shorten `description` for display.
///
/// Text within [`SNIPPET_CHARS`] is returned as is. Longer text is cut at
/// the last whitespace before the limit (or hard at the limit when there
/// is none) and suffixed with `...`.
pub fn snippet(description: &str) -> String {
    let Some((cut, _)) = description.char_indices().nth(SNIPPET_CHARS) else {
        return description.to_string();
    };

    let head = &description[..cut];
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };
    format!("{}{}", head.trim_end(), ELLIPSIS)
}
