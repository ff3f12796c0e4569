use crate::workspace::normalize_path;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Live, possibly unsaved, editor contents
pub trait Documents: Send + Sync {
    /// Text of `path` if it is currently open
    fn get(&self, path: &Path) -> Option<String>;

    /// Every open document, sorted by path
    fn snapshot(&self) -> Vec<(PathBuf, String)>;
}

/// Open documents keyed by normalized absolute path
#[derive(Debug, Default)]
pub struct OpenDocuments {
    documents: RwLock<FxHashMap<PathBuf, String>>,
}

impl OpenDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, path: &Path, text: impl Into<String>) {
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(normalize_path(path), text.into());
        }
    }

    pub fn close(&self, path: &Path) {
        if let Ok(mut documents) = self.documents.write() {
            documents.remove(&normalize_path(path));
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Documents for OpenDocuments {
    fn get(&self, path: &Path) -> Option<String> {
        self.documents.read().ok()?.get(&normalize_path(path)).cloned()
    }

    fn snapshot(&self) -> Vec<(PathBuf, String)> {
        let mut documents: Vec<_> = match self.documents.read() {
            Ok(documents) => documents.iter().map(|(p, t)| (p.clone(), t.clone())).collect(),
            Err(_) => Vec::new(),
        };
        documents.sort();
        documents
    }
}

/// No open documents: everything is read from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDocuments;

impl Documents for NoDocuments {
    fn get(&self, _path: &Path) -> Option<String> {
        None
    }

    fn snapshot(&self) -> Vec<(PathBuf, String)> {
        Vec::new()
    }
}
