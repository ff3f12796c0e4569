use crate::types::LESS_EXT;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use std::path::{Path, PathBuf};

/// Expand brace patterns like `**/*.{less,wxless}` into multiple patterns
fn expand_brace_pattern(pattern: &str) -> Vec<String> {
    if let Some(start) = pattern.find('{') {
        if let Some(end) = pattern[start..].find('}') {
            let end = start + end;
            let prefix = &pattern[..start];
            let suffix = &pattern[end + 1..];
            let alternatives = &pattern[start + 1..end];

            return alternatives
                .split(',')
                .flat_map(|alt| {
                    let expanded = format!("{prefix}{alt}{suffix}");
                    expand_brace_pattern(&expanded)
                })
                .collect();
        }
    }
    vec![pattern.to_string()]
}

/// Compile a list of glob patterns into a GlobSet for efficient matching
fn compile_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        for expanded in expand_brace_pattern(pattern) {
            match Glob::new(&expanded) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => eprintln!("Warning: Ignoring invalid pattern '{expanded}': {e}"),
            }
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Whether `path` is a Less source
pub fn is_less_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == LESS_EXT.strip_prefix('.')
}

/// Finds Less sources below a directory
pub struct Collector {
    root: PathBuf,
    ignore: GlobSet,
}

impl Collector {
    pub fn new(root: &Path, ignore_patterns: &[String]) -> Self {
        Self { root: root.to_path_buf(), ignore: compile_globset(ignore_patterns) }
    }

    /// Whether a path relative to the root matches an ignore pattern
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.ignore.is_match(relative)
    }

    /// Collect all `.less` files, honouring `.gitignore` and skipping
    /// `node_modules`. Results are sorted for a stable compile order.
    pub fn collect(&self) -> Vec<PathBuf> {
        let mut walker_builder = WalkBuilder::new(&self.root);
        walker_builder.hidden(false).git_ignore(true);

        // Always exclude node_modules directories during traversal
        let mut overrides = OverrideBuilder::new(&self.root);
        overrides.add("!**/node_modules/").ok();
        if let Ok(built) = overrides.build() {
            walker_builder.overrides(built);
        }

        let mut files: Vec<PathBuf> = walker_builder
            .build()
            .flatten()
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file() && is_less_file(path) && !self.is_ignored(path))
            .collect();

        files.sort();
        files
    }
}
