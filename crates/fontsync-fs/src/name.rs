//! Filename sanitization

/// Characters that are replaced when deriving a safe filename
pub const INVALID_FILENAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Substitute used when sanitization empties the name entirely
const FALLBACK_NAME: &str = "unnamed_font";

/// Derive a filesystem-safe filename
///
/// Replaces each invalid character with `_`, strips leading and trailing
/// whitespace and dots, and falls back to a fixed placeholder when nothing
/// remains.
pub fn safe_file_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
