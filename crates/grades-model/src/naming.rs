//! Naming rules for generated element names and output files.

use thiserror::Error;

/// A sanitized column name that still cannot be used as an XML element name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("column '{column}' does not yield a valid XML element name ('{name}')")]
pub struct InvalidElementName {
    pub column: String,
    pub name: String,
}

/// Turn a column header into an element name: spaces and slashes become `_`.
pub fn sanitize_column_name(column: &str) -> String {
    column.trim().replace([' ', '/'], "_")
}

/// Sanitize a column header and check the result is a usable XML name.
pub fn element_name_for_column(column: &str) -> Result<String, InvalidElementName> {
    let name = sanitize_column_name(column);
    if is_xml_name(&name) {
        Ok(name)
    } else {
        Err(InvalidElementName {
            column: column.to_string(),
            name,
        })
    }
}

/// Check an XML 1.0 element name without namespace prefix.
///
/// Colons are rejected: generated documents carry no namespaces.
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '\u{b7}'))
}

/// File-name stem for a module: every non-alphanumeric character becomes `_`.
pub fn safe_file_stem(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch.is_alphanumeric() { ch } else { '_' })
        .collect()
}

/// Upper-case the first character, lower-case the rest (`notes` -> `Notes`).
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
