//! Upload filename handling.
//!
//! Browsers send whatever the user's file was called, so every name goes
//! through [`sanitize_filename`] before it touches a path or an object key.

use unicode_normalization::UnicodeNormalization;

use crate::constants::ALLOWED_EXTENSIONS;

/// Reduce an untrusted filename to a filesystem-safe ASCII name.
///
/// - NFKD-decomposes and drops everything that is not ASCII (`é` -> `e`)
/// - turns path separators into whitespace, so no directory survives
/// - joins whitespace runs with `_`
/// - drops characters outside `[A-Za-z0-9_.-]`
/// - trims leading and trailing `.` and `_`
/// - lower-cases the extension (`logo.JPG` -> `logo.jpg`)
///
/// Returns `None` when nothing is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let ascii: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return None;
    }

    Some(match trimmed.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => trimmed.to_string(),
    })
}

/// Lower-cased extension of `name`, if it has one.
pub fn extension(name: &str) -> Option<String> {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext.to_ascii_lowercase()),
        _ => None,
    }
}

/// Whether `name` carries one of the accepted image extensions.
pub fn allowed_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}
