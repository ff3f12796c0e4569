use crate::compiler::{CompileError, Compiler};
use crate::config::{ConfigurationSource, get_global_options};
use crate::diagnostics::{self, Diagnostic, DiagnosticCollection};
use crate::status::{StatusLine, StatusMessage};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Rewrites a document's text before it is compiled
pub trait Preprocessor: Send + Sync {
    fn process(&self, text: &str, document: &Path) -> Result<String, CompileError>;
}

impl<F> Preprocessor for F
where
    F: Fn(&str, &Path) -> Result<String, CompileError> + Send + Sync,
{
    fn process(&self, text: &str, document: &Path) -> Result<String, CompileError> {
        self(text, document)
    }
}

/// Result of one save-triggered compile
#[derive(Debug)]
pub enum CompileOutcome {
    Compiled { elapsed: Duration, written: Vec<PathBuf> },
    Failed { diagnostic: Diagnostic, error: CompileError },
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Compiled { .. })
    }

    pub fn status(&self) -> StatusMessage {
        match self {
            CompileOutcome::Compiled { elapsed, .. } => {
                StatusMessage::Compiled { elapsed: *elapsed }
            }
            CompileOutcome::Failed { .. } => StatusMessage::Failed,
        }
    }
}

/// Compiles a saved document; the only place compile errors are caught.
pub struct CompileCommand<'a> {
    compiler: &'a Compiler,
    configuration: &'a dyn ConfigurationSource,
    preprocessor: Option<&'a dyn Preprocessor>,
}

impl<'a> CompileCommand<'a> {
    pub fn new(compiler: &'a Compiler, configuration: &'a dyn ConfigurationSource) -> Self {
        Self { compiler, configuration, preprocessor: None }
    }

    pub fn with_preprocessor(mut self, preprocessor: Option<&'a dyn Preprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Compile `document` whose current text is `text`
    pub fn execute(&self, document: &Path, text: &str) -> CompileOutcome {
        let start = Instant::now();

        match self.run(document, text) {
            Ok(written) => CompileOutcome::Compiled { elapsed: start.elapsed(), written },
            Err(error) => {
                let diagnostic = diagnostics::from_error(&error, document);
                CompileOutcome::Failed { diagnostic, error }
            }
        }
    }

    /// Like [`execute`](Self::execute), also updating the adapter's
    /// diagnostics and status line
    pub fn execute_and_report(
        &self,
        document: &Path,
        text: &str,
        diagnostics: &mut DiagnosticCollection,
        status: &mut StatusLine,
    ) -> CompileOutcome {
        status.show(StatusMessage::Compiling);
        let outcome = self.execute(document, text);

        match &outcome {
            CompileOutcome::Compiled { .. } => diagnostics.set(document, Vec::new()),
            CompileOutcome::Failed { diagnostic, .. } => {
                diagnostics.set(&diagnostic.file, vec![diagnostic.clone()]);
            }
        }
        status.show(outcome.status());

        outcome
    }

    fn run(&self, document: &Path, text: &str) -> Result<Vec<PathBuf>, CompileError> {
        let processed;
        let text = match self.preprocessor {
            Some(preprocessor) => {
                processed = preprocessor.process(text, document)?;
                processed.as_str()
            }
            None => text,
        };

        let defaults = get_global_options(document, self.configuration);
        self.compiler.compile(document, text, &defaults)
    }
}
