use std::fmt;

use serde::Serialize;

/// Failure categories shared by every pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Missing input, schema or stylesheet file.
    NotFound,
    /// Malformed tabular or XML source.
    Parse,
    /// Malformed or inapplicable schema.
    Schema,
    /// Stylesheet parse or application failure.
    Transform,
    /// HTML to PDF failure.
    Render,
    /// Invalid operator selection.
    Input,
    /// Failure writing an output file.
    Io,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::NotFound => "not found",
            Self::Parse => "parse error",
            Self::Schema => "schema error",
            Self::Transform => "transform error",
            Self::Render => "render error",
            Self::Input => "input error",
            Self::Io => "io error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
