use crate::types::{Options, RootFileInfo};
use crate::workspace::Workspace;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Namespaced setting holding the compile options
pub const CONFIG_SECTION: &str = "less.compile";

/// Settings file looked up inside each workspace folder
pub const SETTINGS_FILE: &str = ".vscode/settings.json";

/// Error types for loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Setting '{0}' is not an object")]
    NotAnObject(String),
}

/// Source of workspace-level configured options
pub trait ConfigurationSource: Send + Sync {
    /// Options stored under `section`, optionally scoped to the file at `scope`
    fn get(&self, section: &str, scope: Option<&Path>) -> Option<Options>;
}

/// A fixed configuration, already parsed
#[derive(Debug, Clone, Default)]
pub struct StaticConfiguration {
    options: Option<Options>,
}

impl StaticConfiguration {
    pub fn new(options: Option<Options>) -> Self {
        Self { options }
    }
}

impl ConfigurationSource for StaticConfiguration {
    fn get(&self, _section: &str, _scope: Option<&Path>) -> Option<Options> {
        self.options.clone()
    }
}

/// Settings read from JSON-with-comments files.
///
/// An explicit file wins; otherwise `.vscode/settings.json` of the
/// workspace folder containing the scoped file is used. Files are re-read on
/// every lookup so edits apply to the next save.
#[derive(Debug, Clone, Default)]
pub struct SettingsFile {
    explicit: Option<PathBuf>,
    workspace: Workspace,
}

impl SettingsFile {
    pub fn new(explicit: Option<PathBuf>, workspace: Workspace) -> Self {
        Self { explicit, workspace }
    }

    fn settings_path(&self, scope: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = &self.explicit {
            return Some(path.clone());
        }
        let folder = scope.and_then(|s| self.workspace.folder_for(s))?;
        let path = folder.join(SETTINGS_FILE);
        path.is_file().then_some(path)
    }
}

impl ConfigurationSource for SettingsFile {
    fn get(&self, section: &str, scope: Option<&Path>) -> Option<Options> {
        let path = self.settings_path(scope)?;
        match load_section(&path, section) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Warning: Failed to parse settings file '{}': {}", path.display(), e);
                None
            }
        }
    }
}

/// Load `section` from a settings file, accepting both the flat
/// (`"less.compile": {}`) and nested (`"less": {"compile": {}}`) forms.
pub fn load_section(path: &Path, section: &str) -> Result<Option<Options>, ConfigError> {
    let mut content = fs::read_to_string(path)?;
    json_strip_comments::strip(&mut content)?;
    let settings: Value = serde_json::from_str(&content)?;

    let value = settings.get(section).or_else(|| {
        section.split('.').try_fold(&settings, |node, key| node.get(key))
    });

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Object(_)) => Ok(Some(serde_json::from_value(value.clone())?)),
        Some(_) => Err(ConfigError::NotAnObject(section.to_string())),
    }
}

/// Defaults for compiling `source`: root file metadata and
/// `relativeUrls: false`. Plugins are never part of the defaults.
pub fn default_options(source: &Path) -> Options {
    Options {
        root_file_info: Some(RootFileInfo::from_path(source)),
        ..Options::default()
    }
    .with("relativeUrls", false)
}

/// Resolve the global options for `source`: defaults with the configured
/// options shallow-merged on top.
pub fn get_global_options(source: &Path, configuration: &dyn ConfigurationSource) -> Options {
    let mut options = default_options(source);
    if let Some(configured) = configuration.get(CONFIG_SECTION, Some(source)) {
        options.merge(configured);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_global_options_without_configuration() {
        let source = Path::new("/home/mrcrowl/dev/css/test.less");
        let options = get_global_options(source, &StaticConfiguration::default());

        let expected = Options {
            root_file_info: Some(RootFileInfo {
                filename: "test.less".to_string(),
                current_directory: PathBuf::from("/home/mrcrowl/dev/css"),
                relative_urls: false,
                entry_path: "/home/mrcrowl/dev/css/".to_string(),
                rootpath: None,
                root_filename: None,
            }),
            ..Options::default()
        }
        .with("relativeUrls", false);

        assert_eq!(options, expected);
    }

    #[test]
    fn test_configured_options_win() {
        let configured = Options::new().with("relativeUrls", true).with("outExt", ".wxss");
        let options = get_global_options(
            Path::new("/w/a.less"),
            &StaticConfiguration::new(Some(configured)),
        );

        assert_eq!(options.get("relativeUrls"), Some(&json!(true)));
        assert_eq!(options.out_ext(), Some(".wxss"));
        assert_eq!(options.root_file_info.unwrap().filename, "a.less");
    }

    #[test]
    fn test_load_flat_section_with_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
                // compile next to the sources
                "less.compile": { "compress": true, "out": "../css/" },
                "editor.tabSize": 2
            }"#,
        )
        .unwrap();

        let options = load_section(&path, CONFIG_SECTION).unwrap().unwrap();
        assert_eq!(options.get("compress"), Some(&json!(true)));
        assert_eq!(options.get("out"), Some(&json!("../css/")));
    }

    #[test]
    fn test_load_nested_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "less": { "compile": { "sourceMap": true } } }"#).unwrap();

        let options = load_section(&path, CONFIG_SECTION).unwrap().unwrap();
        assert!(options.source_map_requested());
    }

    #[test]
    fn test_load_missing_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "editor.tabSize": 2 }"#).unwrap();

        assert!(load_section(&path, CONFIG_SECTION).unwrap().is_none());
    }

    #[test]
    fn test_load_non_object_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "less.compile": true }"#).unwrap();

        assert!(matches!(load_section(&path, CONFIG_SECTION), Err(ConfigError::NotAnObject(_))));
    }

    #[test]
    fn test_settings_file_scoped_to_workspace_folder() {
        let dir = tempdir().unwrap();
        let root = dir.path().to_path_buf();
        fs::create_dir_all(root.join(".vscode")).unwrap();
        fs::write(root.join(SETTINGS_FILE), r#"{ "less.compile": { "outExt": "wxss" } }"#).unwrap();

        let settings = SettingsFile::new(None, Workspace::new(vec![root.clone()]));

        let options = settings.get(CONFIG_SECTION, Some(&root.join("css/app.less"))).unwrap();
        assert_eq!(options.out_ext(), Some("wxss"));
        assert!(settings.get(CONFIG_SECTION, Some(Path::new("/elsewhere/app.less"))).is_none());
    }

    #[test]
    fn test_malformed_settings_file_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let settings = SettingsFile::new(Some(path), Workspace::default());
        assert!(settings.get(CONFIG_SECTION, None).is_none());
    }
}
