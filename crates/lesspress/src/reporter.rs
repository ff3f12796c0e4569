use crate::command::CompileOutcome;
use crate::diagnostics::Diagnostic;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Serializable summary of one compile
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub document: PathBuf,
    pub success: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u128>,
    pub written: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(document: &Path, outcome: &CompileOutcome) -> Self {
        let status = outcome.status().text();
        match outcome {
            CompileOutcome::Compiled { elapsed, written } => Self {
                document: document.to_path_buf(),
                success: true,
                status,
                elapsed_ms: Some(elapsed.as_millis()),
                written: written.clone(),
                diagnostics: Vec::new(),
            },
            CompileOutcome::Failed { diagnostic, .. } => Self {
                document: document.to_path_buf(),
                success: false,
                status,
                elapsed_ms: None,
                written: Vec::new(),
                diagnostics: vec![diagnostic.clone()],
            },
        }
    }
}

fn relative<'a>(path: &'a Path, cwd: &Path) -> &'a Path {
    path.strip_prefix(cwd).unwrap_or(path)
}

/// Render a diagnostic as `file:line:col: error: message` (1-based)
pub fn format_diagnostic(diagnostic: &Diagnostic, cwd: &Path) -> String {
    format!(
        "{}:{}:{}: error: {}",
        relative(&diagnostic.file, cwd).display(),
        diagnostic.range.start.line + 1,
        diagnostic.range.start.character + 1,
        diagnostic.message
    )
}

pub fn report_text(report: &Report, cwd: &Path, verbose: bool) {
    let document = relative(&report.document, cwd);

    if report.success {
        if report.written.is_empty() {
            println!("{}: no output", document.display());
        } else {
            println!("{}: {}", document.display(), report.status);
        }
        if verbose {
            for file in &report.written {
                println!("  wrote {}", relative(file, cwd).display());
            }
        }
        return;
    }

    eprintln!("{}: {}", document.display(), report.status);
    for diagnostic in &report.diagnostics {
        eprintln!("  {}", format_diagnostic(diagnostic, cwd));
    }
}

pub fn report_json(report: &Report) {
    match serde_json::to_string(report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: Failed to serialize report: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Range, Severity};
    use std::time::Duration;

    #[test]
    fn test_report_success() {
        let outcome = CompileOutcome::Compiled {
            elapsed: Duration::from_millis(12),
            written: vec![PathBuf::from("/w/site.css")],
        };
        let report = Report::new(Path::new("/w/site.less"), &outcome);

        assert!(report.success);
        assert_eq!(report.status, "Less compiled in 12ms");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["elapsedMs"], 12);
        assert_eq!(json["written"][0], "/w/site.css");
    }

    #[test]
    fn test_format_diagnostic() {
        let diagnostic = Diagnostic {
            file: PathBuf::from("/w/css/site.less"),
            range: Range::line(2, 4),
            message: "Unrecognised input".to_string(),
            severity: Severity::Error,
        };

        assert_eq!(
            format_diagnostic(&diagnostic, Path::new("/w")),
            "css/site.less:3:5: error: Unrecognised input"
        );
    }
}
