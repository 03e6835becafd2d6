//! URL-safe slugs derived from display names.

use deunicode::deunicode;

/// Derive a slug from a display name.
///
/// The name is first transliterated to ASCII (`Café` becomes `Cafe`). ASCII
/// letters and digits are kept (lowercased); runs of whitespace, hyphens and
/// underscores collapse into a single hyphen; anything else is dropped.
/// Leading and trailing hyphens are trimmed.
pub fn slugify(input: &str) -> String {
    let ascii = deunicode(input);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    out
}

/// Check that a slug only contains lowercase ASCII alphanumerics and single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
