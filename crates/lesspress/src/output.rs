use crate::types::{CSS_EXT, OutSetting, Options};
use crate::workspace::{Workspace, normalize_path};
use std::path::{Path, PathBuf, is_separator};

/// Where a compile writes its results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    pub css_path: PathBuf,
    pub source_map: Option<SourceMapTarget>,
}

/// A source map written next to the stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapTarget {
    pub path: PathBuf,
    /// Reference recorded inside the stylesheet, e.g. `./styles.css.map`
    pub url: String,
}

/// Pick the output extension: `outExt` normalized to a single leading dot,
/// the empty string for an explicitly empty `outExt`, else `.css`.
pub fn output_extension(options: &Options) -> String {
    match options.out_ext() {
        Some("") => String::new(),
        Some(ext) => format!(".{}", ext.trim_start_matches('.')),
        None => CSS_EXT.to_string(),
    }
}

/// Compute the destination paths for compiling `source`.
///
/// Returns `None` when `out` is `false` or `null`, meaning no output is
/// wanted and the engine must not run.
pub fn resolve_output(
    source: &Path,
    options: &Options,
    workspace: &Workspace,
) -> Option<ResolvedOutput> {
    let source_dir = source.parent().unwrap_or(Path::new(""));
    let base_name =
        source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = output_extension(options);

    let relative = match options.out() {
        OutSetting::Disabled => return None,
        OutSetting::Default => format!("{base_name}{extension}"),
        OutSetting::Template(template) => {
            let interpolated = workspace.interpolate(
                &template.replace("$1", &base_name).replace("$2", &extension),
                source,
            );

            if interpolated.ends_with(is_separator) {
                format!("{interpolated}{base_name}{extension}")
            } else if Path::new(&interpolated).extension().is_none() {
                format!("{interpolated}{extension}")
            } else {
                interpolated
            }
        }
    };

    let css_path = normalize_path(&source_dir.join(relative));
    let source_map = if options.source_map_requested() && !options.source_map_inline() {
        Some(source_map_target(&css_path))
    } else {
        None
    };

    Some(ResolvedOutput { css_path, source_map })
}

fn source_map_target(css_path: &Path) -> SourceMapTarget {
    let mut path = css_path.as_os_str().to_owned();
    path.push(".map");
    let path = PathBuf::from(path);
    let url = format!(
        "./{}",
        path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
    );
    SourceMapTarget { path, url }
}
