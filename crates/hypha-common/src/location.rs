use serde::Serialize;
use std::fmt;

/// A 1-based line/column position in a named (or anonymous) source file.
///
/// Every AST node and every diagnostic carries one of these, captured at the
/// first token of the production it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(file: Option<String>, line: u32, column: u32) -> Self {
        SourceLocation { file, line, column }
    }

    /// A location with no file name, used for synthetic nodes the
    /// interpreter builds itself (e.g. injected signals).
    pub fn synthetic() -> Self {
        SourceLocation { file: None, line: 0, column: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}:{}:{}", self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}
