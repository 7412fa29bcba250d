//! Native DTD validation.
//!
//! Supported declarations:
//!
//! - `<!ELEMENT>` with `EMPTY`, `ANY`, mixed `(#PCDATA | a)*` and children
//!   models (sequence, choice, `?` `*` `+`, nested groups)
//! - `<!ATTLIST>` with `CDATA`, `ID`, `IDREF(S)`, `ENTITY`/`ENTITIES`,
//!   `NMTOKEN(S)`, `NOTATION` and enumerated types, and every default form
//! - internal parameter entities, expanded wherever they are referenced
//!
//! Values of tokenized attribute types are normalized (trimmed, space runs
//! collapsed) before they are checked, as a validating XML processor does.
//!
//! Not supported: external parameter entities (skipped), conditional
//! sections (rejected), checking `ENTITY` values against declared unparsed
//! entities, and namespace-aware names (a prefixed name is matched as
//! written).

mod automaton;
mod grammar;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use grades_model::{SchemaKind, ValidationIssue, ValidationResult, is_xml_name};

pub use automaton::{ContentAutomaton, Mismatch};
pub use grammar::{
    AttributeDecl, AttributeType, ContentSpec, DefaultDecl, ElementDecl, Grammar, Occurrence,
    Particle, SyntaxError, parse_grammar,
};

use crate::error::{Result, ValidateError};
use crate::tree::{XmlDocument, XmlElement, XmlNode, read_document};

/// A compiled DTD, reusable across documents.
#[derive(Debug, Clone)]
pub struct DtdValidator {
    path: PathBuf,
    grammar: Grammar,
    automata: HashMap<String, ContentAutomaton>,
}

impl DtdValidator {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|source| ValidateError::schema_io(path, source))?;
        Self::from_text(&text, path)
    }

    /// Compile DTD text; `path` labels errors and results.
    pub fn from_text(text: &str, path: &Path) -> Result<Self> {
        let grammar = parse_grammar(text).map_err(|error| ValidateError::InvalidSchema {
            path: path.to_path_buf(),
            line: Some(error.line),
            message: format!("line {}: {}", error.line, error.message),
        })?;
        let automata = grammar
            .elements
            .values()
            .filter_map(|decl| match &decl.content {
                ContentSpec::Children(particle) => {
                    Some((decl.name.clone(), ContentAutomaton::compile(particle)))
                }
                _ => None,
            })
            .collect();
        tracing::debug!(
            schema = %path.display(),
            elements = grammar.elements.len(),
            "compiled DTD"
        );
        Ok(Self {
            path: path.to_path_buf(),
            grammar,
            automata,
        })
    }

    pub fn schema_path(&self) -> &Path {
        &self.path
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn validate(&self, document: &Path) -> Result<ValidationResult> {
        let tree = read_document(document)?;
        Ok(ValidationResult::new(
            document,
            &self.path,
            SchemaKind::Dtd,
            self.check(&tree),
        ))
    }

    /// Every issue of a parsed document, in document order.
    pub fn check(&self, document: &XmlDocument) -> Vec<ValidationIssue> {
        let mut state = CheckState::default();
        if let Some(doctype) = &document.doctype
            && doctype != &document.root.name
        {
            state.issue(
                document.root.line,
                format!(
                    "root element '{}' does not match DOCTYPE '{doctype}'",
                    document.root.name
                ),
            );
        }
        self.check_element(&document.root, &mut state);
        state.resolve_references();
        state.issues
    }

    fn check_element(&self, element: &XmlElement, state: &mut CheckState) {
        match self.grammar.element(&element.name) {
            Some(decl) => {
                self.check_attributes(element, state);
                self.check_content(element, decl, state);
            }
            None => {
                state.issue(
                    element.line,
                    format!("element '{}' is not declared", element.name),
                );
                self.check_attributes(element, state);
            }
        }
        for child in element.elements() {
            self.check_element(child, state);
        }
    }

    fn check_attributes(&self, element: &XmlElement, state: &mut CheckState) {
        let decls = self.grammar.attributes_of(&element.name);
        for decl in decls {
            let value = element.attribute(&decl.name);
            match (&decl.default, value) {
                (DefaultDecl::Required, None) => state.issue(
                    element.line,
                    format!(
                        "element '{}' is missing required attribute '{}'",
                        element.name, decl.name
                    ),
                ),
                (DefaultDecl::Fixed(fixed), Some(actual))
                    if normalize_value(&decl.kind, actual) != normalize_value(&decl.kind, fixed) =>
                {
                    state.issue(
                        element.line,
                        format!(
                            "attribute '{}' of element '{}' must be \"{fixed}\", found \"{actual}\"",
                            decl.name, element.name
                        ),
                    );
                }
                _ => {}
            }
        }
        for (name, value) in &element.attributes {
            match decls.iter().find(|decl| &decl.name == name) {
                Some(decl) => check_attribute_value(element, decl, value, state),
                None => state.issue(
                    element.line,
                    format!(
                        "attribute '{name}' of element '{}' is not declared",
                        element.name
                    ),
                ),
            }
        }
    }

    fn check_content(&self, element: &XmlElement, decl: &ElementDecl, state: &mut CheckState) {
        match &decl.content {
            ContentSpec::Any => {}
            ContentSpec::Empty => {
                if !element.children.is_empty() {
                    state.issue(
                        element.line,
                        format!("element '{}' is declared EMPTY but has content", element.name),
                    );
                }
            }
            ContentSpec::Mixed(allowed) => {
                for child in element.elements() {
                    if !allowed.contains(&child.name) {
                        state.issue(
                            child.line,
                            format!(
                                "element '{}' is not allowed in '{}'",
                                child.name, element.name
                            ),
                        );
                    }
                }
            }
            ContentSpec::Children(particle) => {
                let has_text = element.children.iter().any(|node| match node {
                    XmlNode::Text(text) => !text.trim().is_empty(),
                    XmlNode::Element(_) => false,
                });
                if has_text {
                    state.issue(
                        element.line,
                        format!(
                            "element '{}' has character data but allows only elements {}",
                            element.name,
                            particle.notation()
                        ),
                    );
                }
                let Some(automaton) = self.automata.get(&decl.name) else {
                    return;
                };
                let children: Vec<&XmlElement> = element.elements().collect();
                let names = children.iter().map(|child| child.name.as_str());
                match automaton.check(names) {
                    Ok(()) => {}
                    Err(Mismatch::Unexpected { index, expected }) => {
                        let child = children[index];
                        state.issue(
                            child.line,
                            format!(
                                "element '{}' is not expected in '{}'; expected {}",
                                child.name,
                                element.name,
                                describe_expected(&expected)
                            ),
                        );
                    }
                    Err(Mismatch::Incomplete { expected }) => state.issue(
                        element.line,
                        format!(
                            "content of element '{}' is incomplete; expected {}",
                            element.name,
                            describe_expected(&expected)
                        ),
                    ),
                }
            }
        }
    }
}

fn check_attribute_value(
    element: &XmlElement,
    decl: &AttributeDecl,
    value: &str,
    state: &mut CheckState,
) {
    let normalized = normalize_value(&decl.kind, value);
    let value = &*normalized;
    let invalid = |state: &mut CheckState, what: &str| {
        state.issue(
            element.line,
            format!(
                "attribute '{}' of element '{}' is not {what}: \"{value}\"",
                decl.name, element.name
            ),
        );
    };
    match &decl.kind {
        AttributeType::CData | AttributeType::Entity | AttributeType::Entities => {}
        AttributeType::Id => {
            if !is_xml_name(value) {
                invalid(state, "a valid ID");
            } else if !state.ids.insert(value.to_string()) {
                state.issue(element.line, format!("duplicate ID \"{value}\""));
            }
        }
        AttributeType::IdRef => {
            if is_xml_name(value) {
                state.references.push((element.line, value.to_string()));
            } else {
                invalid(state, "a valid IDREF");
            }
        }
        AttributeType::IdRefs => {
            let refs: Vec<&str> = value.split_whitespace().collect();
            if refs.is_empty() || !refs.iter().all(|id| is_xml_name(id)) {
                invalid(state, "a valid IDREFS list");
            } else {
                state
                    .references
                    .extend(refs.into_iter().map(|id| (element.line, id.to_string())));
            }
        }
        AttributeType::NmToken => {
            if !is_nmtoken(value) {
                invalid(state, "a valid NMTOKEN");
            }
        }
        AttributeType::NmTokens => {
            let tokens: Vec<&str> = value.split_whitespace().collect();
            if tokens.is_empty() || !tokens.iter().all(|token| is_nmtoken(token)) {
                invalid(state, "a valid NMTOKENS list");
            }
        }
        AttributeType::Enumeration(allowed) | AttributeType::Notation(allowed) => {
            if !allowed.iter().any(|option| option == value) {
                let choices = allowed.join("|");
                invalid(state, &format!("one of ({choices})"));
            }
        }
    }
}

/// Attribute-value normalization for tokenized types; `CDATA` is kept as is.
fn normalize_value<'a>(kind: &AttributeType, value: &'a str) -> Cow<'a, str> {
    if *kind == AttributeType::CData || !value.contains(char::is_whitespace) {
        return Cow::Borrowed(value);
    }
    Cow::Owned(value.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn is_nmtoken(value: &str) -> bool {
    !value.is_empty() && value.chars().all(grammar::is_name_char)
}

fn describe_expected(expected: &[String]) -> String {
    match expected {
        [] => "no more elements".to_string(),
        [only] => format!("'{only}'"),
        many => {
            let quoted: Vec<String> = many.iter().map(|name| format!("'{name}'")).collect();
            format!("one of {}", quoted.join(", "))
        }
    }
}

#[derive(Default)]
struct CheckState {
    issues: Vec<ValidationIssue>,
    ids: HashSet<String>,
    references: Vec<(u32, String)>,
}

impl CheckState {
    fn issue(&mut self, line: u32, message: String) {
        self.issues.push(ValidationIssue::new(Some(line), message));
    }

    fn resolve_references(&mut self) {
        let dangling: Vec<(u32, String)> = self
            .references
            .iter()
            .filter(|(_, id)| !self.ids.contains(id))
            .cloned()
            .collect();
        for (line, id) in dangling {
            self.issue(line, format!("IDREF \"{id}\" does not match any ID"));
        }
    }
}
