// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Library inbox watcher
//!
//! Documents dropped into the watched folder get a cheatsheet written next
//! to them as `<stem>.cheatsheet.json`.

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::documents;
use crate::Result;

const CHEATSHEET_SUFFIX: &str = "cheatsheet.json";

/// Events emitted by the watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A new file was created
    FileCreated(PathBuf),
    /// A file was moved or renamed into place (finished browser downloads)
    FileRenamed(PathBuf),
    /// Watcher error
    Error(String),
}

/// File system watcher
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    watched_paths: Vec<PathBuf>,
    event_rx: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    /// Create a new file watcher
    pub fn new() -> Result<Self> {
        let (tx, rx) = channel();

        let config = Config::default().with_poll_interval(Duration::from_secs(2));

        let watcher = RecommendedWatcher::new(tx, config)?;

        Ok(Self {
            watcher,
            watched_paths: Vec::new(),
            event_rx: rx,
        })
    }

    /// Add a directory to watch
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
            info!("Created watch directory: {:?}", path);
        }

        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched_paths.push(path.to_path_buf());
        info!("Watching: {:?}", path);

        Ok(())
    }

    /// Get the next event (blocking with timeout)
    pub fn next_event(&self, timeout: Duration) -> Option<WatchEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(Ok(event)) => Self::convert_event(event),
            Ok(Err(e)) => Some(WatchEvent::Error(e.to_string())),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => None,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                Some(WatchEvent::Error("Watcher disconnected".to_string()))
            }
        }
    }

    fn convert_event(event: Event) -> Option<WatchEvent> {
        match event.kind {
            EventKind::Create(_) => event.paths.into_iter().next().map(WatchEvent::FileCreated),
            // Rename events list the old path first; the new name is last
            EventKind::Modify(ModifyKind::Name(
                RenameMode::To | RenameMode::Both | RenameMode::Any,
            )) => event.paths.into_iter().last().map(WatchEvent::FileRenamed),
            _ => None,
        }
    }

    /// Get currently watched paths
    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched_paths
    }
}

/// Check if a dropped file should get a cheatsheet
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    // Skip hidden files
    if filename.starts_with('.') {
        return false;
    }

    // Skip temporary files
    let temp_extensions = [".tmp", ".part", ".crdownload", ".partial", ".download"];
    if temp_extensions.iter().any(|ext| filename.ends_with(ext)) {
        return false;
    }

    // Skip system files
    let skip_names = ["desktop.ini", "thumbs.db", ".ds_store"];
    if skip_names.iter().any(|n| filename.eq_ignore_ascii_case(n)) {
        return false;
    }

    documents::is_supported(path)
}

/// `notes/bio.pdf` → `notes/bio.cheatsheet.json`
pub fn cheatsheet_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    source.with_file_name(format!("{}.{}", stem, CHEATSHEET_SUFFIX))
}

/// Wait for file to be stable (not being written)
pub async fn wait_for_stable(path: &Path, max_wait: Duration) -> bool {
    let check_interval = Duration::from_millis(500);
    let start = std::time::Instant::now();

    let mut last_size = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return false,
    };

    loop {
        tokio::time::sleep(check_interval).await;

        if start.elapsed() > max_wait {
            warn!("File stability check timed out for {:?}", path);
            return true;
        }

        let current_size = match std::fs::metadata(path) {
            Ok(m) => m.len(),
            Err(_) => return false,
        };

        if current_size == last_size {
            return true;
        }

        last_size = current_size;
        debug!("File {:?} still being written, size: {}", path, current_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_process() {
        assert!(should_process(Path::new("inbox/Lecture 4.pdf")));
        assert!(should_process(Path::new("inbox/summary.md")));
        assert!(!should_process(Path::new("inbox/.hidden.pdf")));
        assert!(!should_process(Path::new("inbox/big.pdf.part")));
        assert!(!should_process(Path::new("inbox/Thumbs.db")));
        assert!(!should_process(Path::new("inbox/bio.cheatsheet.json")));
        assert!(!should_process(Path::new("inbox/photo.png")));
    }

    #[test]
    fn test_rename_reports_new_name() {
        let from = PathBuf::from("inbox/lecture.pdf.crdownload");
        let to = PathBuf::from("inbox/lecture.pdf");

        let both = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(from.clone())
            .add_path(to.clone());
        assert_eq!(
            FileWatcher::convert_event(both),
            Some(WatchEvent::FileRenamed(to.clone()))
        );

        let moved_in = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(to.clone());
        assert_eq!(
            FileWatcher::convert_event(moved_in),
            Some(WatchEvent::FileRenamed(to.clone()))
        );
        assert!(should_process(&to));

        let moved_out = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path(from);
        assert_eq!(FileWatcher::convert_event(moved_out), None);
    }

    #[test]
    fn test_content_changes_and_removals_are_ignored() {
        let path = PathBuf::from("inbox/bio.pdf");
        let created = Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(path.clone());
        assert_eq!(
            FileWatcher::convert_event(created),
            Some(WatchEvent::FileCreated(path.clone()))
        );

        let written = Event::new(EventKind::Modify(ModifyKind::Data(
            notify::event::DataChange::Content,
        )))
        .add_path(path.clone());
        assert_eq!(FileWatcher::convert_event(written), None);

        let removed = Event::new(EventKind::Remove(notify::event::RemoveKind::File)).add_path(path);
        assert_eq!(FileWatcher::convert_event(removed), None);
    }

    #[test]
    fn test_cheatsheet_output_path() {
        assert_eq!(
            cheatsheet_output_path(Path::new("library/Organic Chem.pdf")),
            PathBuf::from("library/Organic Chem.cheatsheet.json")
        );
    }

    #[tokio::test]
    async fn test_wait_for_stable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("done.pdf");
        std::fs::write(&file, b"%PDF-1.5").unwrap();
        assert!(wait_for_stable(&file, Duration::from_secs(5)).await);
        assert!(!wait_for_stable(&dir.path().join("gone.pdf"), Duration::from_secs(1)).await);
    }

    #[test]
    fn test_watch_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let inbox = dir.path().join("inbox");
        let mut watcher = FileWatcher::new().unwrap();
        watcher.watch(&inbox).unwrap();
        assert!(inbox.is_dir());
        assert_eq!(watcher.watched_paths(), &[inbox]);
    }
}
