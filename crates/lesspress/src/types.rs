use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File extension of Less sources
pub const LESS_EXT: &str = ".less";

/// Default extension of compiled stylesheets
pub const CSS_EXT: &str = ".css";

/// Metadata describing the entry file of a compile.
///
/// The engine resolves relative imports against `current_directory` and
/// `entry_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFileInfo {
    pub filename: String,
    pub current_directory: PathBuf,
    pub relative_urls: bool,
    pub entry_path: String,
    pub rootpath: Option<String>,
    pub root_filename: Option<String>,
}

impl RootFileInfo {
    /// Derive root file metadata purely from a source path.
    /// The filename is always reported with the `.less` extension.
    pub fn from_path(source: &Path) -> Self {
        let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let dir = source.parent().map(Path::to_path_buf).unwrap_or_default();
        let entry_path = format!("{}/", dir.to_string_lossy());

        Self {
            filename: format!("{stem}{LESS_EXT}"),
            current_directory: dir,
            relative_urls: false,
            entry_path,
            rootpath: None,
            root_filename: None,
        }
    }
}

/// What the `out` option asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutSetting {
    /// Absent (or a non-string truthy value): `<stem><ext>` next to the source
    Default,
    /// `false` or `null`: do not compile at all
    Disabled,
    /// A path template, possibly containing `$1`, `$2` and workspace tokens
    Template(String),
}

/// Options for the pixel to viewport-width rewrite
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Px2VwOptions {
    /// Reference viewport width in pixels
    pub viewport_width: f64,
}

/// Effective options for one compile invocation.
///
/// Everything except the root file metadata is kept as JSON so that
/// per-file directives, workspace settings and engine passthrough options
/// share one representation. Plugin instances deliberately have no place
/// here: they are built fresh for every render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(rename = "rootFileInfo", default, skip_serializing_if = "Option::is_none")]
    pub root_file_info: Option<RootFileInfo>,

    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Shallow merge: every key in `overlay` replaces the key here.
    pub fn merge(&mut self, overlay: Options) {
        if overlay.root_file_info.is_some() {
            self.root_file_info = overlay.root_file_info;
        }
        self.values.extend(overlay.values);
    }

    /// `main` as an ordered list of target templates.
    /// Non-string and empty entries (e.g. `main: true`, `main: ''`, undefined
    /// slots) are skipped.
    pub fn main_targets(&self) -> Vec<String> {
        let targets = match self.get("main") {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        targets.into_iter().filter(|t| !t.is_empty()).map(str::to_string).collect()
    }

    pub fn out(&self) -> OutSetting {
        match self.get("out") {
            None => OutSetting::Default,
            Some(Value::Null) | Some(Value::Bool(false)) => OutSetting::Disabled,
            Some(Value::String(s)) => OutSetting::Template(s.clone()),
            Some(_) => OutSetting::Default,
        }
    }

    pub fn out_ext(&self) -> Option<&str> {
        self.get("outExt").and_then(Value::as_str)
    }

    pub fn source_map_requested(&self) -> bool {
        self.get("sourceMap").is_some_and(is_truthy)
    }

    pub fn source_map_inline(&self) -> bool {
        self.get("sourceMapFileInline").is_some_and(is_truthy)
    }

    /// Browser queries for the autoprefixer, normalized.
    /// Returns `None` when `autoprefixer` is unset or falsy.
    pub fn autoprefixer_browsers(&self) -> Option<String> {
        let value = self.get("autoprefixer").filter(|v| is_truthy(v))?;
        let raw = match value {
            Value::String(s) => s.clone(),
            Value::Array(items) => {
                items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(",")
            }
            other => other.to_string(),
        };
        Some(normalize_browsers(&raw))
    }

    /// `px2vwOptions`, if set. `null` counts as unset.
    pub fn px2vw_options(&self) -> Result<Option<Px2VwOptions>, serde_json::Error> {
        match self.get("px2vwOptions") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Px2VwOptions::deserialize(value).map(Some),
        }
    }
}

/// Split a browser list on `,` or `;`, trim each query and drop empties.
pub fn normalize_browsers(raw: &str) -> String {
    raw.split([',', ';']).map(str::trim).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(", ")
}

/// JavaScript truthiness of an option value
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_root_file_info_from_path() {
        let info = RootFileInfo::from_path(Path::new("/home/mrcrowl/dev/styles/style.less"));

        assert_eq!(info.filename, "style.less");
        assert_eq!(info.current_directory, PathBuf::from("/home/mrcrowl/dev/styles"));
        assert_eq!(info.entry_path, "/home/mrcrowl/dev/styles/");
        assert!(!info.relative_urls);
        assert_eq!(info.rootpath, None);
        assert_eq!(info.root_filename, None);
    }

    #[test]
    fn test_root_file_info_forces_less_extension() {
        let info = RootFileInfo::from_path(Path::new("/a/b/theme.wxless"));
        assert_eq!(info.filename, "theme.less");
    }

    #[test]
    fn test_out_setting() {
        assert_eq!(Options::new().out(), OutSetting::Default);
        assert_eq!(Options::new().with("out", false).out(), OutSetting::Disabled);
        assert_eq!(Options::new().with("out", Value::Null).out(), OutSetting::Disabled);
        assert_eq!(Options::new().with("out", true).out(), OutSetting::Default);
        assert_eq!(
            Options::new().with("out", "../dist/").out(),
            OutSetting::Template("../dist/".to_string())
        );
    }

    #[test]
    fn test_main_targets() {
        assert!(Options::new().main_targets().is_empty());
        assert!(Options::new().with("main", true).main_targets().is_empty());
        assert_eq!(Options::new().with("main", "a.less").main_targets(), vec!["a.less"]);
        assert_eq!(
            Options::new().with("main", json!(["a.less", null, "b.less"])).main_targets(),
            vec!["a.less", "b.less"]
        );
    }

    #[test]
    fn test_merge_overlay_wins() {
        let mut base = Options::new().with("relativeUrls", false).with("compress", true);
        base.merge(Options::new().with("relativeUrls", true));

        assert_eq!(base.get("relativeUrls"), Some(&json!(true)));
        assert_eq!(base.get("compress"), Some(&json!(true)));
    }

    #[test]
    fn test_autoprefixer_browsers_normalized() {
        let options = Options::new().with("autoprefixer", " > 5%; last 2 Chrome versions,, ie 11 ");
        assert_eq!(
            options.autoprefixer_browsers().as_deref(),
            Some("> 5%, last 2 Chrome versions, ie 11")
        );

        let options = Options::new().with("autoprefixer", json!(["> 1%", "not dead"]));
        assert_eq!(options.autoprefixer_browsers().as_deref(), Some("> 1%, not dead"));

        assert_eq!(Options::new().with("autoprefixer", false).autoprefixer_browsers(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!(1)));
    }

    #[test]
    fn test_options_deserialize_from_settings() {
        let options: Options = serde_json::from_value(json!({
            "outExt": ".wxss",
            "sourceMap": true
        }))
        .unwrap();

        assert_eq!(options.root_file_info, None);
        assert_eq!(options.out_ext(), Some(".wxss"));
        assert!(options.source_map_requested());
    }

    #[test]
    fn test_px2vw_options() {
        assert_eq!(Options::new().px2vw_options().unwrap(), None);
        assert_eq!(Options::new().with("px2vwOptions", Value::Null).px2vw_options().unwrap(), None);

        let options = Options::new().with("px2vwOptions", json!({ "viewportWidth": 375 }));
        assert_eq!(
            options.px2vw_options().unwrap(),
            Some(Px2VwOptions { viewport_width: 375.0 })
        );

        assert!(Options::new().with("px2vwOptions", json!("wide")).px2vw_options().is_err());
    }

    #[test]
    fn test_empty_main_is_absent() {
        assert!(Options::new().with("main", "").main_targets().is_empty());
        assert_eq!(
            Options::new().with("main", json!(["", "site.less", null])).main_targets(),
            vec!["site.less".to_string()]
        );
    }
}
