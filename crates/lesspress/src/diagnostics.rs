use crate::compiler::CompileError;
use crate::engine::EngineError;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::path::{Path, PathBuf, is_separator};

/// End column used when the length of the offending line is unknown
pub const LINE_END_COLUMN: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 0-based
    pub line: usize,
    /// 0-based
    pub character: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// A single-line range from `character` to the end-of-line bound
    pub fn line(line: usize, character: usize) -> Self {
        Self {
            start: Position { line, character },
            end: Position { line, character: LINE_END_COLUMN },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub range: Range,
    pub message: String,
    pub severity: Severity,
}

/// Convert a compile failure of `document` into a diagnostic
pub fn from_error(error: &CompileError, document: &Path) -> Diagnostic {
    let (file, range, message) = match error {
        CompileError::Io { path, .. } | CompileError::Engine(EngineError::Io { path, .. }) => {
            let message = format!("Cannot open file '{}'", path.display());
            (document.to_path_buf(), Range::line(0, 0), message)
        }
        CompileError::Engine(EngineError::Syntax {
            message,
            line: Some(line),
            column,
            filename,
        }) => {
            let file = affected_file(filename.as_deref(), document);
            let range = Range::line(line.saturating_sub(1), column.unwrap_or(0));
            (file, range, message.clone())
        }
        CompileError::Engine(EngineError::Syntax { message, line: None, filename, .. }) => {
            (affected_file(filename.as_deref(), document), Range::line(0, 0), message.clone())
        }
        other => (document.to_path_buf(), Range::line(0, 0), other.to_string()),
    };

    Diagnostic { file, range, message, severity: Severity::Error }
}

/// Which file an error belongs to.
/// A bare filename equal to the document's own name means the document.
fn affected_file(filename: Option<&str>, document: &Path) -> PathBuf {
    let Some(filename) = filename else {
        return document.to_path_buf();
    };

    let is_bare = !filename.contains(is_separator);
    let is_document = document.file_name().is_some_and(|name| name == filename);
    if is_bare && is_document { document.to_path_buf() } else { PathBuf::from(filename) }
}

/// Diagnostics per file, replaced wholesale on each compile
#[derive(Debug, Default)]
pub struct DiagnosticCollection {
    entries: FxHashMap<PathBuf, Vec<Diagnostic>>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the diagnostics of `file`; an empty list clears it
    pub fn set(&mut self, file: &Path, diagnostics: Vec<Diagnostic>) {
        if diagnostics.is_empty() {
            self.entries.remove(file);
        } else {
            self.entries.insert(file.to_path_buf(), diagnostics);
        }
    }

    pub fn delete(&mut self, file: &Path) {
        self.entries.remove(file);
    }

    pub fn get(&self, file: &Path) -> &[Diagnostic] {
        self.entries.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All diagnostics, sorted by file
    pub fn all(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<_> = self.entries.values().flatten().collect();
        all.sort_by(|a, b| a.file.cmp(&b.file));
        all
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
