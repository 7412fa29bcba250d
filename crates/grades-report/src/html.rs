//! HTML report flattening for the PDF renderer.
//!
//! Only the structure the report stylesheet emits matters here: headings,
//! paragraphs, list items and tables. Everything else is either walked
//! through (containers) or its text is folded into the surrounding
//! paragraph (inline markup).

use libxml::parser::Parser;
use libxml::tree::Node;

use crate::error::{ReportError, Result};
use crate::pdf::Block;

/// Parse an HTML document into layout blocks, in document order.
pub fn parse_blocks(html: &str) -> Result<Vec<Block>> {
    let document = Parser::default_html()
        .parse_string(html)
        .map_err(|error| ReportError::render(format!("cannot parse HTML report: {error:?}")))?;
    let root = document
        .get_root_element()
        .ok_or_else(|| ReportError::render("HTML report is empty"))?;
    let body =
        find_element(&root, "body").ok_or_else(|| ReportError::render("HTML document has no <body>"))?;
    let mut blocks = Vec::new();
    collect(&body, &mut blocks);
    Ok(blocks)
}

fn find_element(node: &Node, name: &str) -> Option<Node> {
    if node.is_element_node() && node.get_name().eq_ignore_ascii_case(name) {
        return Some(node.clone());
    }
    node.get_child_nodes()
        .iter()
        .find_map(|child| find_element(child, name))
}

fn collect(node: &Node, blocks: &mut Vec<Block>) {
    let mut inline = String::new();
    for child in node.get_child_nodes() {
        if child.is_text_node() {
            inline.push_str(&child.get_content());
            continue;
        }
        if !child.is_element_node() {
            continue;
        }
        let name = child.get_name().to_ascii_lowercase();
        if is_inline(&name) {
            inline.push(' ');
            inline.push_str(&child.get_content());
            continue;
        }
        flush(&mut inline, blocks);
        if let Some(level) = heading_level(&name) {
            let text = collapse(&child.get_content());
            if !text.is_empty() {
                blocks.push(Block::Heading { level, text });
            }
            continue;
        }
        match name.as_str() {
            "head" | "style" | "script" | "title" | "hr" => {}
            "p" | "li" | "dt" | "dd" | "pre" | "blockquote" | "address" => {
                paragraph(&child.get_content(), false, blocks);
            }
            "caption" => paragraph(&child.get_content(), true, blocks),
            "table" => table(&child, blocks),
            _ => collect(&child, blocks),
        }
    }
    flush(&mut inline, blocks);
}

fn flush(inline: &mut String, blocks: &mut Vec<Block>) {
    paragraph(inline, false, blocks);
    inline.clear();
}

fn paragraph(text: &str, bold: bool, blocks: &mut Vec<Block>) {
    let text = collapse(text);
    if !text.is_empty() {
        blocks.push(Block::Paragraph { text, bold });
    }
}

fn table(node: &Node, blocks: &mut Vec<Block>) {
    let mut rows: Vec<Row> = Vec::new();
    for child in elements(node) {
        match child.get_name().to_ascii_lowercase().as_str() {
            "caption" => paragraph(&child.get_content(), true, blocks),
            "thead" | "tbody" | "tfoot" => rows.extend(
                elements(&child)
                    .filter(|row| row.get_name().eq_ignore_ascii_case("tr"))
                    .map(|row| Row::read(&row)),
            ),
            "tr" => rows.push(Row::read(&child)),
            _ => {}
        }
    }
    let header = match rows.first() {
        Some(first) if first.all_header && !first.cells.is_empty() => rows.remove(0).cells,
        _ => Vec::new(),
    };
    let rows: Vec<Vec<String>> = rows.into_iter().map(|row| row.cells).collect();
    if header.is_empty() && rows.is_empty() {
        return;
    }
    blocks.push(Block::Table { header, rows });
}

struct Row {
    cells: Vec<String>,
    /// Every cell is a `<th>`.
    all_header: bool,
}

impl Row {
    fn read(node: &Node) -> Self {
        let mut cells = Vec::new();
        let mut all_header = true;
        for cell in elements(node) {
            let name = cell.get_name().to_ascii_lowercase();
            if name != "td" && name != "th" {
                continue;
            }
            all_header &= name == "th";
            cells.push(collapse(&cell.get_content()));
        }
        Self { cells, all_header }
    }
}

fn elements(node: &Node) -> impl Iterator<Item = Node> {
    node.get_child_nodes()
        .into_iter()
        .filter(Node::is_element_node)
}

fn heading_level(name: &str) -> Option<u8> {
    name.strip_prefix('h')
        .and_then(|digit| digit.parse::<u8>().ok())
        .filter(|level| (1..=6).contains(level))
}

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr" | "b" | "br" | "code" | "em" | "i" | "small" | "span" | "strong" | "sub"
            | "sup" | "u"
    )
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
