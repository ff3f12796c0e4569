//! Save detection for the command-line adapter.
//!
//! Filesystem events stand in for editor save/close events:
//! - created or modified `.less` files are reported as saved (debounced)
//! - removed `.less` files are reported as closed

use crate::collector::Collector;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};
use thiserror::Error;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Debounce duration in milliseconds
const DEBOUNCE_MS: u64 = 100;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Watch options
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directory to watch recursively
    pub root: PathBuf,
    /// Glob patterns (relative to `root`) to ignore
    pub ignore: Vec<String>,
}

/// Events reported by [`watch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WatchEvent {
    Started { root: PathBuf },
    Saved { path: PathBuf },
    Closed { path: PathBuf },
    Shutdown,
}

impl WatchEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Watcher state for debouncing
struct WatcherState {
    pending_changes: FxHashSet<PathBuf>,
    last_change: Option<Instant>,
}

impl WatcherState {
    fn new() -> Self {
        Self { pending_changes: FxHashSet::default(), last_change: None }
    }

    fn add_change(&mut self, path: PathBuf) {
        self.pending_changes.insert(path);
        self.last_change = Some(Instant::now());
    }

    fn should_flush(&self) -> bool {
        match self.last_change {
            Some(last) => {
                !self.pending_changes.is_empty()
                    && last.elapsed() >= Duration::from_millis(DEBOUNCE_MS)
            }
            None => false,
        }
    }

    fn take_changes(&mut self) -> Vec<PathBuf> {
        let mut changes: Vec<_> = self.pending_changes.drain().collect();
        changes.sort();
        self.last_change = None;
        changes
    }
}

/// Watch `options.root` until `running` is cleared.
///
/// `on_event` is called on this thread, one event at a time, so saves are
/// handled strictly in sequence.
pub fn watch(
    options: &WatchOptions,
    running: Arc<AtomicBool>,
    mut on_event: impl FnMut(WatchEvent),
) -> Result<(), WatchError> {
    let collector = Collector::new(&options.root, &options.ignore);
    let (tx, rx) = channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        Config::default(),
    )?;
    watcher.watch(&options.root, RecursiveMode::Recursive)?;

    on_event(WatchEvent::Started { root: options.root.clone() });

    let mut state = WatcherState::new();

    while running.load(Ordering::SeqCst) {
        if let Ok(event) = rx.recv_timeout(Duration::from_millis(50)) {
            let paths = event
                .paths
                .into_iter()
                .filter(|p| crate::collector::is_less_file(p) && !collector.is_ignored(p));

            match event.kind {
                EventKind::Create(_) | EventKind::Modify(_) => {
                    for path in paths {
                        state.add_change(path);
                    }
                }
                EventKind::Remove(_) => {
                    for path in paths {
                        state.pending_changes.remove(&path);
                        on_event(WatchEvent::Closed { path });
                    }
                }
                _ => {}
            }
        }

        if state.should_flush() {
            for path in state.take_changes() {
                // Renames and editor swap files can leave stale paths behind
                if path.is_file() {
                    on_event(WatchEvent::Saved { path });
                }
            }
        }
    }

    on_event(WatchEvent::Shutdown);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[test]
    fn test_watch_event_to_json() {
        let event = WatchEvent::Saved { path: PathBuf::from("css/site.less") };
        let json = event.to_json();
        assert!(json.contains("\"event\":\"saved\""));
        assert!(json.contains("\"path\":\"css/site.less\""));

        assert_eq!(WatchEvent::Shutdown.to_json(), r#"{"event":"shutdown"}"#);
    }

    #[test]
    fn test_watcher_state_debounce() {
        let mut state = WatcherState::new();
        assert!(!state.should_flush());

        state.add_change(PathBuf::from("b.less"));
        state.add_change(PathBuf::from("a.less"));
        state.add_change(PathBuf::from("a.less"));
        assert!(!state.should_flush());

        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS + 20));
        assert!(state.should_flush());
        assert_eq!(state.take_changes(), vec![PathBuf::from("a.less"), PathBuf::from("b.less")]);
        assert!(!state.should_flush());
    }

    #[test]
    fn test_watch_stops_when_not_running() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("site.less"), "").unwrap();
        let options = WatchOptions { root: dir.path().to_path_buf(), ignore: Vec::new() };
        let running = Arc::new(AtomicBool::new(false));
        let events = Mutex::new(Vec::new());

        watch(&options, running, |event| events.lock().unwrap().push(event)).unwrap();

        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![WatchEvent::Started { root: dir.path().to_path_buf() }, WatchEvent::Shutdown]
        );
    }
}
