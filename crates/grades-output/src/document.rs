//! XML document generation from a [`Table`].
//!
//! Layout:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Root>
//!   <Notes>
//!     <StudentID>21010395</StudentID>
//!     <Grade/>
//!   </Notes>
//! </Root>
//! ```

use std::path::Path;

use grades_model::{DocumentSpec, Table, element_name_for_column, is_xml_name};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{OutputError, Result};
use crate::fs::write_atomic;

/// Serialize a table into an indented UTF-8 XML document.
///
/// Every element name is checked before anything is written, so a bad
/// header fails the whole document rather than producing half of it.
pub fn serialize_table(table: &Table, spec: &DocumentSpec) -> Result<Vec<u8>> {
    check_name("root", &spec.root_element)?;
    check_name("record", &spec.record_element)?;
    let names = table
        .headers
        .iter()
        .map(|header| element_name_for_column(header))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut xml = Writer::new_with_indent(Vec::new(), b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(serialize_error)?;

    if table.is_empty() {
        xml.write_event(Event::Empty(BytesStart::new(spec.root_element.as_str())))
            .map_err(serialize_error)?;
    } else {
        xml.write_event(Event::Start(BytesStart::new(spec.root_element.as_str())))
            .map_err(serialize_error)?;
        for (row_idx, row) in table.rows().iter().enumerate() {
            xml.write_event(Event::Start(BytesStart::new(spec.record_element.as_str())))
                .map_err(serialize_error)?;
            for (name, value) in names.iter().zip(row) {
                if value.is_empty() {
                    xml.write_event(Event::Empty(BytesStart::new(name.as_str())))
                        .map_err(serialize_error)?;
                    continue;
                }
                let text = value.to_text();
                check_chars(&text, row_idx + 1, name)?;
                xml.write_event(Event::Start(BytesStart::new(name.as_str())))
                    .map_err(serialize_error)?;
                xml.write_event(Event::Text(BytesText::new(&text)))
                    .map_err(serialize_error)?;
                xml.write_event(Event::End(BytesEnd::new(name.as_str())))
                    .map_err(serialize_error)?;
            }
            xml.write_event(Event::End(BytesEnd::new(spec.record_element.as_str())))
                .map_err(serialize_error)?;
        }
        xml.write_event(Event::End(BytesEnd::new(spec.root_element.as_str())))
            .map_err(serialize_error)?;
    }

    let mut bytes = xml.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

/// Serialize a table and write it to `path` atomically.
///
/// Returns the number of bytes written.
pub fn write_document(table: &Table, spec: &DocumentSpec, path: &Path) -> Result<usize> {
    let bytes = serialize_table(table, spec)?;
    write_atomic(path, &bytes)?;
    Ok(bytes.len())
}

fn check_name(role: &'static str, name: &str) -> Result<()> {
    if is_xml_name(name) {
        Ok(())
    } else {
        Err(OutputError::InvalidElement {
            role,
            name: name.to_string(),
        })
    }
}

fn check_chars(text: &str, row: usize, column: &str) -> Result<()> {
    match text.chars().find(|ch| !is_xml_char(*ch)) {
        Some(ch) => Err(OutputError::InvalidCharacter {
            row,
            column: column.to_string(),
            code: u32::from(ch),
        }),
        None => Ok(()),
    }
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn serialize_error(error: impl std::fmt::Display) -> OutputError {
    OutputError::Serialize {
        message: error.to_string(),
    }
}
