//! Element tree read with quick-xml.
//!
//! Keeps just what validation and module listing need: element names,
//! attributes, text and the line each element starts on.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, ValidateError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Root name declared by `<!DOCTYPE ...>`, if any.
    pub doctype: Option<String>,
    pub root: XmlElement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    /// 1-based line of the start tag.
    pub line: u32,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated character data of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// This element and all of its descendants, in document order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            found.push(element);
            let children: Vec<&XmlElement> = element.elements().collect();
            stack.extend(children.into_iter().rev());
        }
        found
    }
}

/// Read and parse an XML file.
pub fn read_document(path: &Path) -> Result<XmlDocument> {
    let bytes = std::fs::read(path).map_err(|source| ValidateError::document_io(path, source))?;
    parse_document(&bytes, path)
}

/// Parse XML bytes; `path` only labels errors.
pub fn parse_document(bytes: &[u8], path: &Path) -> Result<XmlDocument> {
    let lines = LineIndex::new(bytes);
    let malformed = |offset: usize, message: String| ValidateError::MalformedDocument {
        path: path.to_path_buf(),
        line: lines.line_at(offset),
        message,
    };

    let mut reader = Reader::from_reader(bytes);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut doctype = None;

    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|error| malformed(reader.error_position() as usize, error.to_string()))?;
        match event {
            Event::Start(start) => {
                let element = open_element(&reader, &start, lines.line_at(offset))
                    .map_err(|message| malformed(offset, message))?;
                if stack.is_empty() && root.is_some() {
                    return Err(malformed(offset, "content after the root element".into()));
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, &start, lines.line_at(offset))
                    .map_err(|message| malformed(offset, message))?;
                attach(&mut stack, &mut root, element)
                    .map_err(|message| malformed(offset, message))?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| malformed(offset, "unexpected end tag".into()))?;
                attach(&mut stack, &mut root, element)
                    .map_err(|message| malformed(offset, message))?;
            }
            Event::Text(text) => {
                let value = reader
                    .decoder()
                    .decode(&text)
                    .map_err(|error| malformed(offset, error.to_string()))?;
                push_text(&mut stack, &value).map_err(|message| malformed(offset, message))?;
            }
            Event::CData(data) => {
                let value = reader
                    .decoder()
                    .decode(&data)
                    .map_err(|error| malformed(offset, error.to_string()))?;
                push_text(&mut stack, &value).map_err(|message| malformed(offset, message))?;
            }
            Event::GeneralRef(reference) => {
                let name = reader
                    .decoder()
                    .decode(&reference)
                    .map_err(|error| malformed(offset, error.to_string()))?;
                let resolved = resolve_reference(&name)
                    .ok_or_else(|| malformed(offset, format!("undefined entity '&{name};'")))?;
                push_text(&mut stack, resolved.encode_utf8(&mut [0; 4]))
                    .map_err(|message| malformed(offset, message))?;
            }
            Event::DocType(text) => {
                let value = reader
                    .decoder()
                    .decode(&text)
                    .map_err(|error| malformed(offset, error.to_string()))?;
                doctype = value.split_whitespace().next().map(str::to_string);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            bytes.len(),
            format!("element '{}' is not closed", open.name),
        ));
    }
    let root = root.ok_or_else(|| malformed(bytes.len(), "no root element".into()))?;
    Ok(XmlDocument { doctype, root })
}

fn open_element(
    reader: &Reader<&[u8]>,
    start: &BytesStart<'_>,
    line: u32,
) -> std::result::Result<XmlElement, String> {
    let decoder = reader.decoder();
    let name = decoder
        .decode(start.name().as_ref())
        .map_err(|error| error.to_string())?
        .into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|error| error.to_string())?;
        let key = decoder
            .decode(attribute.key.as_ref())
            .map_err(|error| error.to_string())?
            .into_owned();
        let value = attribute
            .decode_and_unescape_value(decoder)
            .map_err(|error| error.to_string())?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        line,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> std::result::Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(format!(
            "element '{}' after the root element",
            element.name
        ))
    }
}

fn push_text(stack: &mut [XmlElement], value: &str) -> std::result::Result<(), String> {
    let Some(parent) = stack.last_mut() else {
        return if value.trim().is_empty() {
            Ok(())
        } else {
            Err("text outside the root element".into())
        };
    };
    if let Some(XmlNode::Text(existing)) = parent.children.last_mut() {
        existing.push_str(value);
    } else {
        parent.children.push(XmlNode::Text(value.to_string()));
    }
    Ok(())
}

/// Predefined entities and character references.
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()
            } else {
                name.strip_prefix('#').and_then(|dec| dec.parse().ok())
            };
            code.and_then(char::from_u32)
        }
    }
}

/// Byte offset to 1-based line lookup.
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        let mut starts = vec![0];
        starts.extend(
            bytes
                .iter()
                .enumerate()
                .filter(|(_, byte)| **byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { starts }
    }

    pub(crate) fn line_at(&self, offset: usize) -> u32 {
        let line = self.starts.partition_point(|start| *start <= offset);
        u32::try_from(line).unwrap_or(u32::MAX)
    }
}
