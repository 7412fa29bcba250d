//! XSLT report filter.
//!
//! The stylesheet owns filtering, grouping and formatting; this module only
//! loads the inputs, binds parameters and serializes the result as HTML.

use std::path::{Path, PathBuf};

use grades_model::ModuleFilter;
use grades_validate::read_document;
use libxml::parser::Parser;
use libxml::tree::SaveOptions;
use libxslt::stylesheet::Stylesheet;

use crate::error::{ReportError, Result};

/// Parameter names understood by the report stylesheet.
pub const PARAM_MODULE_FILTER: &str = "moduleFilter";
pub const PARAM_STUDENTS_FILE: &str = "studentsFile";
pub const PARAM_GENERATED_ON: &str = "generatedOn";

/// Values bound to the stylesheet parameters.
#[derive(Debug, Clone)]
pub struct ReportParams {
    pub module: ModuleFilter,
    /// Passed to the stylesheet unchanged; empty when absent.
    pub students_file: Option<PathBuf>,
    pub generated_on: Option<String>,
}

impl ReportParams {
    pub fn new(module: ModuleFilter) -> Self {
        Self {
            module,
            students_file: None,
            generated_on: None,
        }
    }

    /// `(name, XPath expression)` pairs as the XSLT engine expects them.
    fn bindings(&self) -> Vec<(&'static str, String)> {
        let students = self
            .students_file
            .as_deref()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();
        vec![
            (PARAM_MODULE_FILTER, xpath_string_literal(self.module.as_str())),
            (PARAM_STUDENTS_FILE, xpath_string_literal(&students)),
            (
                PARAM_GENERATED_ON,
                xpath_string_literal(self.generated_on.as_deref().unwrap_or_default()),
            ),
        ]
    }
}

/// A compiled report stylesheet.
pub struct ReportTransform {
    path: PathBuf,
    stylesheet: Stylesheet,
}

impl ReportTransform {
    pub fn load(path: &Path) -> Result<Self> {
        let parse_error = |message: String| ReportError::StylesheetParse {
            path: path.to_path_buf(),
            message,
        };
        // Checked up front so a missing or ill-formed stylesheet is reported
        // the same way as the input document.
        read_document(path).map_err(|error| match ReportError::from_document(path, error) {
            ReportError::XmlSyntax { message, .. } => parse_error(message),
            other => other,
        })?;
        let location = path_str(path).map_err(parse_error)?;
        let stylesheet =
            libxslt::parser::parse_file(location).map_err(|error| parse_error(error.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            stylesheet,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the stylesheet over `document` and return the HTML text.
    pub fn apply(&mut self, document: &Path, params: &ReportParams) -> Result<String> {
        read_document(document).map_err(|error| ReportError::from_document(document, error))?;
        let location = path_str(document).map_err(|message| ReportError::XmlSyntax {
            path: document.to_path_buf(),
            message,
        })?;
        let source = Parser::default()
            .parse_file(location)
            .map_err(|error| ReportError::XmlSyntax {
                path: document.to_path_buf(),
                message: format!("{error:?}"),
            })?;

        let bindings = params.bindings();
        let bound: Vec<(&str, &str)> = bindings
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        let result = self
            .stylesheet
            .transform(source, bound)
            .map_err(|error| ReportError::TransformApply {
                path: self.path.clone(),
                message: error.to_string(),
            })?;
        let html = result.to_string_with_options(SaveOptions {
            as_html: true,
            format: true,
            ..SaveOptions::default()
        });
        Ok(html)
    }
}

/// Quote a value as an XPath 1.0 string literal.
///
/// XPath has no escape sequences, so a value holding both quote characters
/// is split into pieces joined with `concat()`.
pub fn xpath_string_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let pieces: Vec<String> = value
        .split('\'')
        .map(|piece| format!("'{piece}'"))
        .collect();
    format!("concat({})", pieces.join(", \"'\", "))
}

fn path_str(path: &Path) -> std::result::Result<&str, String> {
    path.to_str()
        .ok_or_else(|| format!("path is not valid UTF-8: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_pick_a_safe_quote() {
        assert_eq!(xpath_string_literal("GINF31 XML"), "'GINF31 XML'");
        assert_eq!(
            xpath_string_literal("GINF43 traitement de l'image"),
            "\"GINF43 traitement de l'image\""
        );
        assert_eq!(
            xpath_string_literal(r#"l'image "vision""#),
            r#"concat('l', "'", 'image "vision"')"#
        );
        assert_eq!(xpath_string_literal(""), "''");
    }
}
