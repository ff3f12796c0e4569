use super::{Engine, EngineError, EngineOptions, RenderOutput};
use crate::types::is_truthy;
use regex::Regex;
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

const DEFAULT_PROGRAM: &str = "lessc";
const OUTPUT_NAME: &str = "output.css";

/// Names lessc gives to source read from stdin
const STDIN_NAMES: &[&str] = &["-", "input"];

/// Drives the `lessc` command-line compiler.
///
/// Source is piped on stdin as given. The process runs in the root file's
/// directory so relative imports resolve as they would for the file itself.
/// Plugins add flags and may place helper files in a scratch directory, where
/// output is also written and read back.
pub struct LesscEngine {
    program: String,
}

impl LesscEngine {
    pub fn new() -> Self {
        Self { program: DEFAULT_PROGRAM.to_string() }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for LesscEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn lessc_error_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // Examples:
        //   ParseError: Unrecognised input in /w/a.less on line 3, column 5:
        //   NameError: variable @c is undefined in - on line 1, column 13:
        Regex::new(
            r"(?m)^(?:\w*Error: )?(?P<message>.*?)(?: in (?P<file>.+?))? on line (?P<line>\d+), column (?P<column>\d+):",
        )
        .unwrap()
    })
}

/// Translate passthrough options into lessc flags. Unknown keys are ignored.
pub fn option_args(options: &EngineOptions) -> Vec<String> {
    let mut args = Vec::new();
    let settings = &options.settings;
    let flag = |key: &str| settings.get(key).is_some_and(is_truthy);

    if flag("compress") {
        args.push("--compress".to_string());
    }
    if flag("relativeUrls") || options.root_file_info.relative_urls {
        args.push("--rewrite-urls=all".to_string());
    }
    if flag("ieCompat") {
        args.push("--ie-compat".to_string());
    }
    if flag("javascriptEnabled") {
        args.push("--js".to_string());
    }
    if flag("strictUnits") {
        args.push("--strict-units=on".to_string());
    }
    match settings.get("math") {
        Some(Value::String(math)) if !math.is_empty() => args.push(format!("--math={math}")),
        Some(Value::Number(math)) => args.push(format!("--math={math}")),
        _ => {}
    }

    let mut include_paths = vec![options.root_file_info.current_directory.clone()];
    if let Some(Value::Array(paths)) = settings.get("paths") {
        include_paths.extend(paths.iter().filter_map(Value::as_str).map(PathBuf::from));
    }
    if let Ok(joined) = std::env::join_paths(&include_paths) {
        args.push(format!("--include-path={}", joined.to_string_lossy()));
    }

    for (key, flag) in [("globalVars", "--global-var"), ("modifyVars", "--modify-var")] {
        if let Some(Value::Object(vars)) = settings.get(key) {
            for (name, value) in vars {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                args.push(format!("{flag}={name}={value}"));
            }
        }
    }

    args
}

/// Flags for source map generation, given the scratch map path
pub fn source_map_args(options: &EngineOptions, map_path: &Path) -> Vec<String> {
    let Some(source_map) = &options.source_map else {
        return Vec::new();
    };

    let mut args = vec![
        format!("--source-map={}", map_path.display()),
        format!("--source-map-basepath={}", source_map.basepath.display()),
    ];
    if !source_map.rootpath.is_empty() {
        args.push(format!("--source-map-rootpath={}", source_map.rootpath));
    }
    if source_map.file_inline {
        args.push("--source-map-map-inline".to_string());
    } else if let Some(url) = &source_map.url {
        args.push(format!("--source-map-url={url}"));
    }

    args
}

/// Turn lessc's stderr into a structured error
pub fn parse_lessc_error(stderr: &str, root_filename: &str) -> EngineError {
    if let Some(caps) = lessc_error_regex().captures(stderr) {
        let filename = caps.name("file").map(|m| m.as_str().trim()).map(|file| {
            if STDIN_NAMES.contains(&file) { root_filename.to_string() } else { file.to_string() }
        });
        let line = caps["line"].parse::<usize>().ok();
        // lessc prints 1-based columns
        let column = caps["column"].parse::<usize>().ok().map(|c| c.saturating_sub(1));

        return EngineError::Syntax {
            message: caps["message"].trim().to_string(),
            line,
            column,
            filename,
        };
    }

    let message = stderr.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("lessc failed");
    EngineError::Failed(message.to_string())
}

impl Engine for LesscEngine {
    fn name(&self) -> &str {
        "lessc"
    }

    fn render(&self, source: &str, options: &EngineOptions) -> Result<RenderOutput, EngineError> {
        let root = &options.root_file_info;

        let scratch = tempfile::tempdir()
            .map_err(|e| EngineError::Failed(format!("Cannot create scratch directory: {e}")))?;
        let css_path = scratch.path().join(OUTPUT_NAME);
        let map_path = scratch.path().join(format!("{OUTPUT_NAME}.map"));

        let mut plugin_args = Vec::new();
        for plugin in &options.plugins {
            let args = plugin.lessc_args(scratch.path()).map_err(|e| {
                EngineError::Failed(format!("Cannot prepare plugin '{}': {e}", plugin.name()))
            })?;
            plugin_args.extend(args);
        }

        let mut command = Command::new(&self.program);
        command
            .arg("--no-color")
            .args(option_args(options))
            .args(source_map_args(options, &map_path))
            .args(plugin_args)
            .arg("-")
            .arg(&css_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if root.current_directory.is_dir() {
            command.current_dir(&root.current_directory);
        }

        let mut child = command.spawn().map_err(|source| match source.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                EngineError::Unavailable { program: self.program.clone(), source }
            }
            _ => EngineError::Failed(format!("Cannot run {}: {source}", self.program)),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(source.as_bytes()) {
                // lessc exited before reading everything; its stderr says why
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(EngineError::Failed(format!("Cannot write to lessc: {e}"))),
                Ok(()) => {}
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| EngineError::Failed(format!("lessc did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(parse_lessc_error(&stderr, &root.filename));
        }

        let css = std::fs::read_to_string(&css_path)
            .map_err(|source| EngineError::Io { path: css_path.clone(), source })?;
        let map = std::fs::read_to_string(&map_path).ok();

        Ok(RenderOutput { css, map })
    }
}
