// ABOUTME: Watch module for monitoring slide sources and project assets
// ABOUTME: Classifies debounced file changes and broadcasts reload messages to viewers

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, FileIdMap};
use parking_lot::{Mutex, RwLock};

use crate::errors::{Result, SlideError};
use crate::hub::SessionHub;
use crate::layout::{LayoutRegistry, LAYOUTS_DIR};
use crate::message::PushMessage;
use crate::utils;

/// Project subdirectories whose contents affect the rendered deck.
pub const WATCHED_DIRS: &[&str] = &["templates", LAYOUTS_DIR, "components", "styles"];
/// Stylesheet picked up from the project root.
pub const ROOT_STYLESHEET: &str = "style.css";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A stylesheet; viewers can swap it without reloading.
    Style,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: PathBuf) -> Self {
        let kind = classify(&path);
        Self { path, kind }
    }
}

/// `.css` → Style, everything else → Generic.
pub fn classify(path: &Path) -> ChangeKind {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("css") => ChangeKind::Style,
        _ => ChangeKind::Generic,
    }
}

/// The message a batch of changes calls for, if any.
pub fn batch_message(events: &[ChangeEvent]) -> Option<PushMessage> {
    if events.is_empty() {
        None
    } else if events.iter().any(|e| e.kind == ChangeKind::Generic) {
        Some(PushMessage::Reload)
    } else {
        Some(PushMessage::StyleReload)
    }
}

/// Editor scratch files that never affect the deck.
fn is_scratch_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.starts_with('.') || name.ends_with('~') || name.ends_with(".swp") || name.ends_with(".tmp")
}

/// Watches the slide source and project assets, pushing reloads to the hub.
pub struct ChangeWatcher {
    root: PathBuf,
    source: PathBuf,
    debounce: Duration,
    hub: SessionHub,
    layouts: Arc<RwLock<LayoutRegistry>>,
}

impl ChangeWatcher {
    pub fn new(
        root: &Path,
        source: &Path,
        debounce_ms: u64,
        hub: SessionHub,
        layouts: Arc<RwLock<LayoutRegistry>>,
    ) -> Self {
        // The source may not exist yet, so resolve its directory instead.
        let source = match (source.parent(), source.file_name()) {
            (Some(parent), Some(name)) => utils::absolute_path(parent).join(name),
            _ => utils::absolute_path(source),
        };
        Self {
            root: utils::absolute_path(root),
            source,
            debounce: Duration::from_millis(debounce_ms),
            hub,
            layouts,
        }
    }

    /// Whether a changed path can affect what viewers see.
    pub fn is_relevant(&self, path: &Path) -> bool {
        if is_scratch_file(path) {
            return false;
        }
        if path == self.source || path == self.root.join(ROOT_STYLESHEET) {
            return true;
        }
        WATCHED_DIRS
            .iter()
            .any(|dir| path.starts_with(self.root.join(dir)))
    }

    /// Classify one debounced batch, refresh layouts if needed, and broadcast.
    /// Returns the message sent, if any.
    pub fn handle_batch<I>(&self, paths: I) -> Option<PushMessage>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut events: Vec<ChangeEvent> = Vec::new();
        for path in paths {
            if self.is_relevant(&path) && !events.iter().any(|e| e.path == path) {
                debug!("Detected relevant change in {:?}", path);
                events.push(ChangeEvent::new(path));
            }
        }

        let layouts_changed = {
            let layouts = self.layouts.read();
            events.iter().any(|e| layouts.watches(&e.path))
        };
        if layouts_changed {
            self.layouts.write().rescan();
        }

        let message = batch_message(&events)?;
        let delivered = self.hub.broadcast(&message);
        info!(
            "{} change(s) detected, sent {:?} to {} viewers",
            events.len(),
            message,
            delivered
        );
        Some(message)
    }

    /// Paths handed to the OS watcher non-recursively: the root itself (for
    /// the source and root stylesheet) and the source's own directory.
    fn watch_targets(&self) -> Vec<PathBuf> {
        let mut targets = vec![self.root.clone()];
        if let Some(parent) = self.source.parent() {
            if parent != self.root {
                targets.push(parent.to_path_buf());
            }
        }
        targets
    }

    /// Start watching on a background thread.
    pub fn spawn(self) -> Result<WatchHandle> {
        if !self.root.is_dir() {
            return Err(SlideError::PathNotFoundError(self.root.clone()));
        }
        if !self.source.exists() {
            warn!("Slide source {:?} does not exist yet", self.source);
        }

        let (tx, rx) = mpsc::channel::<DebounceEventResult>();
        let mut debouncer = new_debouncer(self.debounce, None, tx)
            .map_err(|e| SlideError::WatchError(format!("Failed to create file watcher: {}", e)))?;

        for path in self.watch_targets() {
            debouncer
                .watcher()
                .watch(&path, RecursiveMode::NonRecursive)
                .map_err(|e| SlideError::WatchError(format!("Failed to watch {:?}: {}", path, e)))?;
            debug!("Watching {:?}", path);
        }
        let mut assets = AssetDirs::new(&self.root);
        assets.refresh(|dir| watch_recursive(&mut debouncer, dir));
        info!("Watching for changes in {:?}", self.root);

        let debouncer = Arc::new(Mutex::new(Some(debouncer)));
        let shared = debouncer.clone();
        let hub = self.hub.clone();
        let thread = thread::Builder::new()
            .name("hyperslide-watch".into())
            .spawn(move || {
                for result in rx {
                    match result {
                        Ok(events) => {
                            let paths: Vec<PathBuf> = events
                                .into_iter()
                                .filter(|event| !event.kind.is_access())
                                .flat_map(|event| event.event.paths)
                                .collect();
                            assets.refresh(|dir| match shared.lock().as_mut() {
                                Some(debouncer) => watch_recursive(debouncer, dir),
                                None => Err(SlideError::WatchError("Watcher is stopped".into())),
                            });
                            self.handle_batch(paths);
                        }
                        Err(errors) => {
                            for e in errors {
                                error!("Watch error: {:?}", e);
                            }
                        }
                    }
                }
                debug!("Watcher channel closed");
                hub.close_all();
            })?;

        Ok(WatchHandle {
            debouncer,
            thread: Some(thread),
        })
    }
}

type FileDebouncer = Debouncer<RecommendedWatcher, FileIdMap>;

fn watch_recursive(debouncer: &mut FileDebouncer, dir: &Path) -> Result<()> {
    debouncer
        .watcher()
        .watch(dir, RecursiveMode::Recursive)
        .map_err(|e| SlideError::WatchError(format!("Failed to watch {:?}: {}", dir, e)))
}

/// The asset directories under the root that currently have a recursive
/// watch. Directories created later are picked up by `refresh`.
#[derive(Debug)]
pub struct AssetDirs {
    candidates: Vec<PathBuf>,
    watched: HashSet<PathBuf>,
}

impl AssetDirs {
    pub fn new(root: &Path) -> Self {
        Self {
            candidates: WATCHED_DIRS.iter().map(|dir| root.join(dir)).collect(),
            watched: HashSet::new(),
        }
    }

    /// Watch every asset directory that exists but is not watched yet, and
    /// forget the ones that disappeared. Returns the directories newly watched.
    pub fn refresh<F>(&mut self, mut watch: F) -> Vec<PathBuf>
    where
        F: FnMut(&Path) -> Result<()>,
    {
        let mut added = Vec::new();
        for dir in &self.candidates {
            if !dir.is_dir() {
                if self.watched.remove(dir) {
                    debug!("Asset directory {:?} removed", dir);
                }
                continue;
            }
            if self.watched.contains(dir) {
                continue;
            }
            match watch(dir) {
                Ok(()) => {
                    debug!("Watching {:?} (recursive)", dir);
                    self.watched.insert(dir.clone());
                    added.push(dir.clone());
                }
                Err(e) => warn!("{}", e),
            }
        }
        added
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }
}

/// Keeps the watcher alive; stopping it closes every viewer connection.
pub struct WatchHandle {
    debouncer: Arc<Mutex<Option<FileDebouncer>>>,
    thread: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let debouncer = self.debouncer.lock().take();
        if let Some(debouncer) = debouncer {
            debouncer.stop();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Watcher thread panicked");
            }
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
