use std::path::{Component, Path, PathBuf};

const WORKSPACE_FOLDER_TOKEN: &str = "${workspaceFolder}";
const WORKSPACE_ROOT_TOKEN: &str = "${workspaceRoot}";

/// The set of folders open in the editor
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    folders: Vec<PathBuf>,
}

impl Workspace {
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self { folders: folders.into_iter().map(|f| normalize_path(&f)).collect() }
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// The deepest workspace folder containing `path`
    pub fn folder_for(&self, path: &Path) -> Option<&Path> {
        let path = normalize_path(path);
        self.folders
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .map(PathBuf::as_path)
    }

    /// The single-root workspace path (first folder), kept for `${workspaceRoot}`
    pub fn root(&self) -> Option<&Path> {
        self.folders.first().map(PathBuf::as_path)
    }

    /// Substitute `${workspaceFolder}` and `${workspaceRoot}` in `template`.
    /// Tokens that cannot be resolved for `source` are left intact.
    pub fn interpolate(&self, template: &str, source: &Path) -> String {
        let mut result = template.to_string();

        if result.contains(WORKSPACE_FOLDER_TOKEN) {
            if let Some(folder) = self.folder_for(source) {
                result = result.replace(WORKSPACE_FOLDER_TOKEN, &folder.to_string_lossy());
            }
        }

        if result.contains(WORKSPACE_ROOT_TOKEN) {
            if let Some(root) = self.root() {
                result = result.replace(WORKSPACE_ROOT_TOKEN, &root.to_string_lossy());
            }
        }

        result
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. The filesystem is never consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) && normalized.pop();
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

/// Path of `to` relative to `from`, using `/` separators.
/// Both paths are expected to be absolute and normalized.
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &to[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_for_prefers_deepest() {
        let workspace = Workspace::new(vec![PathBuf::from("/w"), PathBuf::from("/w/packages/ui")]);

        assert_eq!(
            workspace.folder_for(Path::new("/w/packages/ui/a.less")),
            Some(Path::new("/w/packages/ui"))
        );
        assert_eq!(workspace.folder_for(Path::new("/w/css/a.less")), Some(Path::new("/w")));
        assert_eq!(workspace.folder_for(Path::new("/elsewhere/a.less")), None);
    }

    #[test]
    fn test_folder_for_is_component_wise() {
        let workspace = Workspace::new(vec![PathBuf::from("/w")]);
        assert_eq!(workspace.folder_for(Path::new("/www/a.less")), None);
    }

    #[test]
    fn test_interpolate_workspace_folder() {
        let workspace = Workspace::new(vec![PathBuf::from("/home/abc/dev/project")]);
        let source = Path::new("/home/abc/dev/project/css/test.less");

        assert_eq!(
            workspace.interpolate("${workspaceFolder}/test.css", source),
            "/home/abc/dev/project/test.css"
        );
        assert_eq!(
            workspace.interpolate("${workspaceRoot}/out/", source),
            "/home/abc/dev/project/out/"
        );
    }

    #[test]
    fn test_interpolate_leaves_unresolved_tokens() {
        let workspace = Workspace::default();
        let source = Path::new("/a/b/test.less");

        assert_eq!(
            workspace.interpolate("${workspaceFolder}/x.css", source),
            "${workspaceFolder}/x.css"
        );
        assert_eq!(
            workspace.interpolate("${workspaceRoot}/x.css", source),
            "${workspaceRoot}/x.css"
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/b/../c/./d.css")), PathBuf::from("/a/c/d.css"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(Path::new("/a/dist"), Path::new("/a/src")), "../src");
        assert_eq!(relative_path(Path::new("/a/b"), Path::new("/a/b")), "");
        assert_eq!(relative_path(Path::new("/a"), Path::new("/a/b/c")), "b/c");
    }
}
