use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lesspress::cli::{Cli, Command, OutputFormat};
use lesspress::collector::Collector;
use lesspress::reporter::{Report, report_json, report_text};
use lesspress::watch::{WatchEvent, WatchOptions, watch};
use lesspress::workspace::normalize_path;
use lesspress::{
    CompileCommand, Compiler, DiagnosticCollection, LesscEngine, SettingsFile, StatusLine,
    Workspace,
};

/// Editor-like state shared by every save
struct Session {
    compiler: Compiler,
    configuration: SettingsFile,
    diagnostics: DiagnosticCollection,
    status: StatusLine,
    cwd: PathBuf,
    format: OutputFormat,
    verbose: bool,
}

impl Session {
    /// Compile `path` as if it had just been saved. Returns whether it succeeded.
    fn save(&mut self, path: &Path) -> bool {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: Failed to read '{}': {}", path.display(), e);
                return false;
            }
        };

        let command = CompileCommand::new(&self.compiler, &self.configuration);
        let outcome =
            command.execute_and_report(path, &text, &mut self.diagnostics, &mut self.status);

        let report = Report::new(path, &outcome);
        match self.format {
            OutputFormat::Text => report_text(&report, &self.cwd, self.verbose),
            OutputFormat::Json => report_json(&report),
        }

        outcome.is_success()
    }

    fn close(&mut self, path: &Path) {
        self.diagnostics.delete(path);
    }
}

/// Files to compile for one command-line path
fn collect_sources(path: &Path, ignore: &[String]) -> Option<Vec<PathBuf>> {
    if path.is_dir() {
        Some(Collector::new(path, ignore).collect())
    } else if path.is_file() {
        Some(vec![path.to_path_buf()])
    } else {
        None
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    if let Some(config_path) = &cli.config {
        if !config_path.exists() {
            eprintln!("Error: Config file not found: {}", config_path.display());
            std::process::exit(1);
        }
    }

    let folders = if cli.workspace.is_empty() {
        vec![cwd.clone()]
    } else {
        cli.workspace.iter().map(|folder| cwd.join(folder)).collect()
    };
    let workspace = Workspace::new(folders);

    let engine = Arc::new(LesscEngine::with_program(cli.lessc.clone()));
    let compiler = Compiler::new(engine).with_workspace(workspace.clone());
    let configuration = SettingsFile::new(cli.config.map(|path| cwd.join(path)), workspace);

    let mut session = Session {
        compiler,
        configuration,
        diagnostics: DiagnosticCollection::new(),
        status: StatusLine::new(),
        cwd: cwd.clone(),
        format: cli.format,
        verbose: cli.verbose,
    };

    match cli.command {
        Command::Compile { paths, ignore } => {
            let mut failed = false;

            for path in paths {
                let path = normalize_path(&cwd.join(&path));
                let Some(sources) = collect_sources(&path, &ignore) else {
                    eprintln!("Error: No such file or directory: {}", path.display());
                    failed = true;
                    continue;
                };

                if sources.is_empty() && cli.verbose {
                    eprintln!("Warning: No Less files found in {}", path.display());
                }

                for source in sources {
                    failed |= !session.save(&source);
                }
            }

            if failed {
                std::process::exit(1);
            }
        }
        Command::Watch { dir, ignore } => {
            let root = normalize_path(&cwd.join(&dir));
            let json = matches!(session.format, OutputFormat::Json);

            let running = Arc::new(AtomicBool::new(true));
            let running_clone = running.clone();
            ctrlc::set_handler(move || {
                running_clone.store(false, Ordering::SeqCst);
            })?;

            if !json {
                println!("Watching {} for changes", root.display());
                println!("Press Ctrl+C to stop");
            }

            let options = WatchOptions { root, ignore };
            watch(&options, running, |event| {
                match &event {
                    WatchEvent::Saved { path } => {
                        session.save(path);
                        return;
                    }
                    WatchEvent::Closed { path } => session.close(path),
                    WatchEvent::Started { .. } | WatchEvent::Shutdown => {}
                }

                if json {
                    println!("{}", event.to_json());
                } else if cli.verbose {
                    if let WatchEvent::Closed { path } = &event {
                        println!("{}: removed", path.strip_prefix(&cwd).unwrap_or(path).display());
                    }
                }
            })?;

            if !json {
                println!("Stopped watching");
            }
        }
    }

    Ok(())
}
