pub mod cli;
pub mod collector;
pub mod command;
pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod directives;
pub mod documents;
pub mod engine;
pub mod output;
pub mod plugin;
pub mod px2vw;
pub mod reporter;
pub mod status;
pub mod types;
pub mod watch;
pub mod workspace;

pub use command::{CompileCommand, CompileOutcome, Preprocessor};
pub use compiler::{CompileError, Compiler};
pub use config::{ConfigError, ConfigurationSource, SettingsFile, StaticConfiguration};
pub use diagnostics::{Diagnostic, DiagnosticCollection};
pub use documents::{Documents, NoDocuments, OpenDocuments};
pub use engine::{Engine, EngineError, LesscEngine};
pub use plugin::{Plugin, PluginRegistry};
pub use reporter::Report;
pub use status::{StatusLine, StatusMessage};
pub use types::{OutSetting, Options, Px2VwOptions, RootFileInfo};
pub use workspace::Workspace;
