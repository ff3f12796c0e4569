use crate::directives;
use crate::documents::{Documents, NoDocuments};
use crate::engine::{Engine, EngineError, EngineOptions, SourceMapOptions};
use crate::output::{ResolvedOutput, resolve_output};
use crate::plugin::PluginRegistry;
use crate::px2vw;
use crate::types::{Options, Px2VwOptions, RootFileInfo};
use crate::workspace::{Workspace, normalize_path, relative_path};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Options consumed by path resolution, never passed to the engine
const RESOLVER_KEYS: &[&str] = &["out", "outExt", "main"];

/// Error types for a compile
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Cannot open file '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid option '{key}': {message}")]
    InvalidOption { key: String, message: String },
}

/// Compiles Less files, following `main` redirection and writing outputs.
///
/// All work is sequential: redirected targets are compiled one after the
/// other and the first failure stops the rest.
pub struct Compiler {
    engine: Arc<dyn Engine>,
    workspace: Workspace,
    documents: Arc<dyn Documents>,
}

impl Compiler {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine, workspace: Workspace::default(), documents: Arc::new(NoDocuments) }
    }

    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = workspace;
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn Documents>) -> Self {
        self.documents = documents;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Compile `source` whose text is `content`.
    ///
    /// Returns the files written, in write order. An empty list means the
    /// file asked for no output (`out: false`).
    pub fn compile(
        &self,
        source: &Path,
        content: &str,
        defaults: &Options,
    ) -> Result<Vec<PathBuf>, CompileError> {
        let source = normalize_path(source);
        let options = directives::parse(content, defaults);

        if let Some(targets) = self.main_targets(&source, &options) {
            let mut written = Vec::new();
            for target in targets {
                let target_content = self.read_source(&target)?;
                let target_defaults = Options {
                    root_file_info: Some(RootFileInfo::from_path(&target)),
                    ..defaults.clone()
                };
                written.extend(self.compile(&target, &target_content, &target_defaults)?);
            }
            return Ok(written);
        }

        let Some(output) = resolve_output(&source, &options, &self.workspace) else {
            return Ok(Vec::new());
        };

        self.render_and_write(&source, content, options, output)
    }

    /// Live text of `path` when it is open, else its contents on disk
    fn read_source(&self, path: &Path) -> Result<String, CompileError> {
        match self.documents.get(path) {
            Some(text) => Ok(text),
            None => fs::read_to_string(path)
                .map_err(|e| CompileError::Io { path: path.to_path_buf(), source: e }),
        }
    }

    /// Absolute `main` targets, or `None` when compilation should not be
    /// redirected. A file naming itself as `main` is treated as having none.
    fn main_targets(&self, source: &Path, options: &Options) -> Option<Vec<PathBuf>> {
        let source_dir = source.parent().unwrap_or(Path::new(""));
        let targets: Vec<PathBuf> = options
            .main_targets()
            .iter()
            .map(|main| self.workspace.interpolate(main, source))
            .map(|main| normalize_path(&source_dir.join(main)))
            .collect();

        if targets.is_empty() || targets.iter().any(|t| t == source) {
            None
        } else {
            Some(targets)
        }
    }

    fn render_and_write(
        &self,
        source: &Path,
        content: &str,
        mut options: Options,
        output: ResolvedOutput,
    ) -> Result<Vec<PathBuf>, CompileError> {
        for key in RESOLVER_KEYS {
            options.remove(key);
        }

        let source_map = self.source_map_options(source, &mut options, &output);
        let plugins = PluginRegistry::for_options(&options, Arc::clone(&self.documents));
        options.remove("autoprefixer");
        let px2vw = take_px2vw_options(&mut options)?;

        let engine_options = EngineOptions {
            root_file_info: options
                .root_file_info
                .take()
                .unwrap_or_else(|| RootFileInfo::from_path(source)),
            settings: options.values,
            source_map,
            plugins: plugins.into_plugins(),
        };

        let rendered = self.engine.render(content, &engine_options)?;
        let css = match &px2vw {
            Some(px2vw) => px2vw::rewrite(&rendered.css, px2vw),
            None => rendered.css,
        };

        let mut written = Vec::new();
        write_file_contents(&output.css_path, &css)?;
        written.push(output.css_path.clone());

        if let (Some(map), Some(target)) = (rendered.map, &output.source_map) {
            write_file_contents(&target.path, &map)?;
            written.push(target.path.clone());
        }

        Ok(written)
    }

    /// Replace the user's `sourceMap` setting with engine source map options
    fn source_map_options(
        &self,
        source: &Path,
        options: &mut Options,
        output: &ResolvedOutput,
    ) -> Option<SourceMapOptions> {
        let requested = options.source_map_requested();
        let file_inline = options.source_map_inline();
        options.remove("sourceMap");
        options.remove("sourceMapFileInline");

        if !requested {
            return None;
        }

        let source_dir = source.parent().unwrap_or(Path::new(""));
        let output_dir = output.css_path.parent().unwrap_or(Path::new(""));

        Some(SourceMapOptions {
            basepath: source_dir.to_path_buf(),
            rootpath: relative_path(output_dir, source_dir),
            file_inline,
            url: output.source_map.as_ref().map(|m| m.url.clone()),
        })
    }
}

fn take_px2vw_options(options: &mut Options) -> Result<Option<Px2VwOptions>, CompileError> {
    let invalid = |message: String| CompileError::InvalidOption {
        key: "px2vwOptions".to_string(),
        message,
    };

    let parsed = options.px2vw_options().map_err(|e| invalid(e.to_string()))?;
    options.remove("px2vwOptions");

    match parsed {
        Some(px2vw) if px2vw.viewport_width.is_nan() || px2vw.viewport_width <= 0.0 => {
            Err(invalid("viewportWidth must be a positive number".to_string()))
        }
        parsed => Ok(parsed),
    }
}

/// Write a file, creating missing parent directories first
fn write_file_contents(path: &Path, content: &str) -> Result<(), CompileError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| CompileError::Io { path: dir.to_path_buf(), source: e })?;
    }
    fs::write(path, content).map_err(|e| CompileError::Io { path: path.to_path_buf(), source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RenderOutput;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Records every render and echoes a fixed stylesheet
    #[derive(Default)]
    struct FakeEngine {
        calls: Mutex<Vec<(String, EngineOptions)>>,
        map: Option<String>,
    }

    impl Engine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }

        fn render(
            &self,
            source: &str,
            options: &EngineOptions,
        ) -> Result<RenderOutput, EngineError> {
            self.calls.lock().unwrap().push((source.to_string(), options.clone()));
            Ok(RenderOutput { css: ".a { width: 75px; }".to_string(), map: self.map.clone() })
        }
    }

    fn compiler(engine: &Arc<FakeEngine>) -> Compiler {
        let engine: Arc<dyn Engine> = Arc::clone(engine) as Arc<dyn Engine>;
        Compiler::new(engine)
    }

    #[test]
    fn test_engine_options_drop_resolver_keys() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("styles.less");
        let engine = Arc::new(FakeEngine::default());

        let defaults = Options::new().with("outExt", ".wxss").with("compress", true);
        compiler(&engine).compile(&source, "// out: dist/\n.a {}", &defaults).unwrap();

        let calls = engine.calls.lock().unwrap();
        let (_, options) = &calls[0];
        assert!(options.settings.get("out").is_none());
        assert!(options.settings.get("outExt").is_none());
        assert_eq!(options.settings.get("compress"), Some(&json!(true)));
        assert_eq!(options.root_file_info.filename, "styles.less");
        assert!(dir.path().join("dist/styles.wxss").is_file());
    }

    #[test]
    fn test_source_map_options_injected() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("less/styles.less");
        let engine = Arc::new(FakeEngine { map: Some("{}".to_string()), ..Default::default() });

        let defaults = Options::new().with("sourceMap", true).with("out", "../css/");
        compiler(&engine).compile(&source, ".a {}", &defaults).unwrap();

        let calls = engine.calls.lock().unwrap();
        let source_map = calls[0].1.source_map.clone().unwrap();
        assert_eq!(source_map.basepath, dir.path().join("less"));
        assert_eq!(source_map.rootpath, "../less");
        assert!(!source_map.file_inline);
        assert_eq!(source_map.url.as_deref(), Some("./styles.css.map"));
        assert!(calls[0].1.settings.get("sourceMap").is_none());
    }

    #[test]
    fn test_px2vw_rewrite_applied() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("styles.less");
        let engine = Arc::new(FakeEngine::default());

        let defaults = Options::new().with("px2vwOptions", json!({ "viewportWidth": 750 }));
        compiler(&engine).compile(&source, ".a {}", &defaults).unwrap();

        let css = fs::read_to_string(dir.path().join("styles.css")).unwrap();
        assert_eq!(css, ".a { width: 10vw; }");
        assert!(engine.calls.lock().unwrap()[0].1.settings.get("px2vwOptions").is_none());
    }

    #[test]
    fn test_invalid_px2vw_options() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("styles.less");
        let engine = Arc::new(FakeEngine::default());

        let defaults = Options::new().with("px2vwOptions", json!({ "viewportWidth": 0 }));
        let error = compiler(&engine).compile(&source, ".a {}", &defaults).unwrap_err();

        assert!(matches!(
            error,
            CompileError::InvalidOption { ref key, .. } if key == "px2vwOptions"
        ));
        assert!(engine.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_autoprefixer_becomes_plugin() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("styles.less");
        let engine = Arc::new(FakeEngine::default());

        compiler(&engine)
            .compile(&source, "// autoprefixer: > 1%; last 2 versions\n.a {}", &Options::new())
            .unwrap();

        let calls = engine.calls.lock().unwrap();
        let names: Vec<_> = calls[0].1.plugins.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["autoprefixer", "document-resolver"]);
        assert!(calls[0].1.settings.get("autoprefixer").is_none());
    }

    #[test]
    fn test_main_target_missing_is_io_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("partial.less");
        let engine = Arc::new(FakeEngine::default());

        let error = compiler(&engine)
            .compile(&source, "// main: missing.less\n", &Options::new())
            .unwrap_err();

        match error {
            CompileError::Io { path, .. } => assert_eq!(path, dir.path().join("missing.less")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_open_main_target_compiled_from_live_text() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("_vars.less");
        let target = dir.path().join("site.less");
        fs::write(&target, ".saved {}").unwrap();
        let documents = Arc::new(crate::documents::OpenDocuments::new());
        documents.open(&target, ".unsaved {}");
        let engine = Arc::new(FakeEngine::default());

        let written = compiler(&engine)
            .with_documents(documents)
            .compile(&source, "// main: site.less\n", &Options::new())
            .unwrap();

        assert_eq!(written, vec![dir.path().join("site.css")]);
        assert_eq!(engine.calls.lock().unwrap()[0].0, ".unsaved {}");
    }
}
