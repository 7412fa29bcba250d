//! Header row normalization shared by CSV and spreadsheet sources.
//!
//! Only column names are cleaned up; data cells are kept as read.

/// Trim a header cell, strip a BOM and collapse inner whitespace runs.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut parts = trimmed.split_whitespace();
    let mut normalized = String::new();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized
}

/// Build column names from the raw header cells.
///
/// Blank header cells get a positional name (`Column3`) so every column
/// still maps to an element.
pub fn build_headers<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    raw.into_iter()
        .enumerate()
        .map(|(idx, value)| {
            let name = normalize_header(value);
            if name.is_empty() {
                format!("Column{}", idx + 1)
            } else {
                name
            }
        })
        .collect()
}
