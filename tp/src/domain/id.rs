//! Session ID generation
//!
//! IDs use the format: `{8-char-hex}-trip-{slug}`
//! Example: `9f3a61c2-trip-paris-france`

/// Generate a session ID, slugged from the destination when one is known
pub fn generate_session_id(destination: Option<&str>) -> String {
    let uuid = uuid::Uuid::now_v7().simple().to_string();
    // v7 leads with the timestamp; the tail is random
    let hex = &uuid[uuid.len() - 8..];
    match destination.map(slugify).filter(|s| !s.is_empty()) {
        Some(slug) => format!("{}-trip-{}", hex, slug),
        None => format!("{}-trip", hex),
    }
}

/// Slugify a title for use in IDs
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Check that a caller-supplied session ID is usable as a file name
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !id.starts_with('.')
}
