use lesspress::diagnostics::Diagnostic;
use lesspress::{
    CompileCommand, CompileOutcome, Compiler, LesscEngine, OpenDocuments, Options,
    StaticConfiguration, Workspace,
};
use napi::bindgen_prelude::*;
use napi_derive::napi;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An open, possibly unsaved, editor buffer
#[napi(object)]
pub struct OpenDocument {
    pub path: String,
    pub text: String,
}

/// A save event to compile
#[napi(object)]
pub struct CompileRequest {
    /// Absolute path of the saved document
    pub path: String,

    /// Current text of the saved document
    pub text: String,

    /// JSON object holding the `less.compile` settings
    pub configuration: Option<String>,

    /// Workspace folder paths, first one is the workspace root
    pub workspace_folders: Option<Vec<String>>,

    /// Other open buffers; imported files and `main` targets that are open
    /// are compiled from this text instead of disk
    pub open_documents: Option<Vec<OpenDocument>>,

    /// Less compiler executable (defaults to `lessc`)
    pub lessc: Option<String>,
}

/// A compile error located in a file
#[napi(object)]
pub struct CompileDiagnostic {
    pub file: String,

    /// 0-based
    pub line: u32,

    /// 0-based
    pub character: u32,

    pub end_character: u32,

    pub message: String,
}

/// Result of one compile
#[napi(object)]
pub struct CompileResult {
    pub success: bool,

    /// Status bar text
    pub status: String,

    pub elapsed_ms: Option<f64>,

    /// Files written, in write order
    pub written: Vec<String>,

    pub diagnostics: Vec<CompileDiagnostic>,
}

impl From<&Diagnostic> for CompileDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        CompileDiagnostic {
            file: diagnostic.file.to_string_lossy().to_string(),
            line: diagnostic.range.start.line as u32,
            character: diagnostic.range.start.character as u32,
            end_character: diagnostic.range.end.character as u32,
            message: diagnostic.message.clone(),
        }
    }
}

impl From<CompileOutcome> for CompileResult {
    fn from(outcome: CompileOutcome) -> Self {
        let status = outcome.status().text();
        match outcome {
            CompileOutcome::Compiled { elapsed, written } => CompileResult {
                success: true,
                status,
                elapsed_ms: Some(elapsed.as_secs_f64() * 1000.0),
                written: written.iter().map(|p| p.to_string_lossy().to_string()).collect(),
                diagnostics: Vec::new(),
            },
            CompileOutcome::Failed { diagnostic, .. } => CompileResult {
                success: false,
                status,
                elapsed_ms: None,
                written: Vec::new(),
                diagnostics: vec![CompileDiagnostic::from(&diagnostic)],
            },
        }
    }
}

fn parse_configuration(configuration: Option<&str>) -> Result<Option<Options>> {
    configuration
        .map(serde_json::from_str::<Options>)
        .transpose()
        .map_err(|e| Error::from_reason(format!("Invalid configuration: {e}")))
}

fn compile_request(request: CompileRequest) -> Result<CompileResult> {
    let configured = parse_configuration(request.configuration.as_deref())?;
    let configuration = StaticConfiguration::new(configured);

    let documents = Arc::new(OpenDocuments::new());
    for document in request.open_documents.unwrap_or_default() {
        documents.open(Path::new(&document.path), document.text);
    }

    let workspace = Workspace::new(
        request.workspace_folders.unwrap_or_default().into_iter().map(PathBuf::from).collect(),
    );
    let engine = match request.lessc {
        Some(program) => LesscEngine::with_program(program),
        None => LesscEngine::new(),
    };
    let compiler =
        Compiler::new(Arc::new(engine)).with_workspace(workspace).with_documents(documents);

    let document = Path::new(&request.path);
    let outcome = CompileCommand::new(&compiler, &configuration).execute(document, &request.text);
    Ok(outcome.into())
}

/// Compile a saved Less document (async)
///
/// @param request - The saved document and its editor context
/// @returns Promise with the files written or the diagnostic
#[napi]
pub async fn compile(request: CompileRequest) -> Result<CompileResult> {
    // Run the compile and its file writes in the blocking thread pool
    tokio::task::spawn_blocking(move || compile_request(request))
        .await
        .map_err(|e| Error::from_reason(format!("Task panicked: {e}")))?
}

/// Compile a saved Less document (sync)
///
/// @param request - The saved document and its editor context
/// @returns The files written or the diagnostic
#[napi]
pub fn compile_sync(request: CompileRequest) -> Result<CompileResult> {
    compile_request(request)
}
