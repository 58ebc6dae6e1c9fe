//! Hot reload of the gate config file.
//!
//! Edits are re-read, parsed and validated off the async runtime (notify's
//! callback thread). Only configs that validate reach the server; a bad edit
//! leaves the running gates on their previous settings. Saves that leave the
//! text unchanged are not forwarded.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{parse_config, ConfigError};
use crate::config::schema::GateConfig;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches one config file and forwards each valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end handed to `HttpServer::run`.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                updates,
            },
            rx,
        )
    }

    /// Start watching. Notifications stop when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let reloader = Reloader::new(self.path.clone(), self.updates);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => reloader.on_event(&event),
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Watching config file");
        Ok(watcher)
    }
}

/// Callback-side state: the watched path and the last text forwarded.
struct Reloader {
    path: PathBuf,
    updates: mpsc::UnboundedSender<GateConfig>,
    last_text: Mutex<Option<String>>,
}

impl Reloader {
    fn new(path: PathBuf, updates: mpsc::UnboundedSender<GateConfig>) -> Self {
        let last_text = std::fs::read_to_string(&path).ok();
        Self {
            path,
            updates,
            last_text: Mutex::new(last_text),
        }
    }

    fn on_event(&self, event: &Event) {
        if !is_content_change(&event.kind) || !self.concerns_file(event) {
            return;
        }

        match self.reload() {
            Ok(Some(config)) => {
                tracing::info!(path = %self.path.display(), "Config file changed, applying");
                if self.updates.send(config).is_err() {
                    tracing::debug!("Server gone; dropping reloaded config");
                }
            }
            Ok(None) => tracing::debug!(path = %self.path.display(), "Config text unchanged"),
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Rejected config reload, keeping current settings"
            ),
        }
    }

    /// Events with no paths (some poll backends) are assumed to concern the file.
    fn concerns_file(&self, event: &Event) -> bool {
        event.paths.is_empty()
            || event
                .paths
                .iter()
                .any(|p| p.file_name() == self.path.file_name())
    }

    /// `Ok(None)` when the text matches what was last forwarded.
    fn reload(&self) -> Result<Option<GateConfig>, ConfigError> {
        let text = std::fs::read_to_string(&self.path)?;
        let mut last = self
            .last_text
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if last.as_deref() == Some(text.as_str()) {
            return Ok(None);
        }

        let config = parse_config(&text)?;
        *last = Some(text);
        Ok(Some(config))
    }
}

fn is_content_change(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Modify(_) | EventKind::Create(_))
}
