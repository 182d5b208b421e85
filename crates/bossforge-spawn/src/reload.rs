//! Hot reload of the spawn configuration.
//!
//! Two triggers share one code path: a `notify` file watch with a debounce
//! window, and [`ConfigHotReloader::reload_now`] for admin commands. A load
//! or validation failure leaves the last-known-good configuration untouched.

use crate::config::RefreshConfig;
use crate::scheduler::SpawnOrchestrator;
use bossforge_common::ConfigError;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default quiet window after a file event before reloading.
const DEFAULT_DEBOUNCE_MILLIS: u64 = 1_000;

/// Reloads the config document into a running orchestrator.
pub struct ConfigHotReloader {
    path: PathBuf,
    orchestrator: Arc<SpawnOrchestrator>,
    debounce: Duration,
}

impl ConfigHotReloader {
    /// Creates a reloader for the given document and orchestrator.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, orchestrator: Arc<SpawnOrchestrator>) -> Self {
        Self {
            path: path.into(),
            orchestrator,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MILLIS),
        }
    }

    /// Overrides the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// The watched document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads, validates, and applies the document right now.
    ///
    /// On failure the running configuration is left untouched and the error
    /// is returned for the caller (admin command) to surface.
    pub fn reload_now(&self) -> Result<(), ConfigError> {
        match RefreshConfig::load_from(&self.path) {
            Ok(config) => {
                info!(path = %self.path.display(), "reloading spawn configuration");
                self.orchestrator.apply_config(&config);
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path.display(), "reload failed, keeping previous config: {e}");
                Err(e)
            }
        }
    }

    /// Starts watching the document's directory for changes.
    ///
    /// The parent directory is watched rather than the file itself so that
    /// editors which replace the file on save do not silently break the
    /// watch. Events are debounced: a reload fires only after the configured
    /// quiet window with no further writes.
    pub fn watch(self) -> Result<ReloadWatcher, ConfigError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let file_name = self.path.file_name().map(std::ffi::OsStr::to_os_string);

        let (tx, rx) = unbounded::<()>();
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let relevant = match &file_name {
                    Some(name) => event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(name.as_os_str())),
                    None => true,
                };
                if relevant && (event.kind.is_create() || event.kind.is_modify()) {
                    let _ = tx.send(());
                }
            })
            .map_err(|e| ConfigError::Watch(e.to_string()))?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::Watch(e.to_string()))?;
        info!(path = %self.path.display(), "watching spawn configuration");

        let debounce = self.debounce;
        let thread = std::thread::spawn(move || {
            // one iteration per burst of file events
            while rx.recv().is_ok() {
                loop {
                    match rx.recv_timeout(debounce) {
                        Ok(()) => {}
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
                debug!("config file settled, reloading");
                let _ = self.reload_now();
            }
        });

        Ok(ReloadWatcher {
            watcher: Some(watcher),
            thread: Some(thread),
        })
    }
}

/// Keeps the file watch alive; stopping it joins the reload thread.
pub struct ReloadWatcher {
    watcher: Option<RecommendedWatcher>,
    thread: Option<JoinHandle<()>>,
}

impl ReloadWatcher {
    /// Stops watching and waits for any in-flight reload to finish.
    pub fn stop(mut self) {
        // dropping the watcher closes the event channel, ending the thread
        self.watcher.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ReloadWatcher {
    fn drop(&mut self) {
        self.watcher.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
