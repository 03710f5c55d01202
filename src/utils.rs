//! Text normalization helpers shared by table readers and title matching.

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Normalize a column header: lowercase, with spaces replaced by underscores.
///
/// `Type of Page` becomes `type_of_page`.
pub fn snake_case_header(header: &str) -> String {
    normalize_inline_whitespace(header)
        .to_lowercase()
        .replace(' ', "_")
}

/// Lowercase slug used to compare titles (`Arab Observer` and `arab_observer` match).
pub fn title_slug(title: &str) -> String {
    snake_case_header(title).replace('-', "_")
}

/// True when `title` contains `key` after slugging both.
pub fn title_matches(title: &str, key: &str) -> bool {
    let key = title_slug(key);
    !key.is_empty() && title_slug(title).contains(&key)
}

/// Collapse repeated underscores into one.
pub fn collapse_underscores(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut previous_underscore = false;
    for ch in text.chars() {
        if ch == '_' {
            if !previous_underscore {
                collapsed.push(ch);
            }
            previous_underscore = true;
        } else {
            collapsed.push(ch);
            previous_underscore = false;
        }
    }
    collapsed
}
