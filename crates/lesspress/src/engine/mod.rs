mod lessc;

pub use lessc::LesscEngine;

use crate::plugin::Plugin;
use crate::types::RootFileInfo;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Error types for engine renders
#[derive(Error, Debug)]
pub enum EngineError {
    /// A positioned compile error. `line` is 1-based, `column` 0-based.
    #[error("{message}")]
    Syntax {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
        filename: Option<String>,
    },

    #[error("Cannot open file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Less compiler '{program}' could not be started")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),
}

/// Source map settings handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapOptions {
    /// Directory stripped from source paths recorded in the map
    pub basepath: PathBuf,
    /// Offset from the output directory back to the source directory
    pub rootpath: String,
    /// Embed the map in the stylesheet instead of a sibling file
    pub file_inline: bool,
    /// Map reference written into the stylesheet (`None` when inline)
    pub url: Option<String>,
}

/// Everything an engine needs for one render.
/// Built fresh by the compiler for every invocation.
#[derive(Clone)]
pub struct EngineOptions {
    /// Options passed through unmodified (compress, math, ...)
    pub settings: Map<String, Value>,
    pub root_file_info: RootFileInfo,
    pub source_map: Option<SourceMapOptions>,
    pub plugins: Vec<Arc<dyn Plugin>>,
}

impl std::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("settings", &self.settings)
            .field("root_file_info", &self.root_file_info)
            .field("source_map", &self.source_map)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Result of a successful render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub css: String,
    pub map: Option<String>,
}

/// A CSS preprocessing engine, treated as a black box
pub trait Engine: Send + Sync {
    /// Engine identifier (e.g., "lessc")
    fn name(&self) -> &str;

    /// Render `source` into CSS (and optionally a source map)
    fn render(&self, source: &str, options: &EngineOptions) -> Result<RenderOutput, EngineError>;
}
