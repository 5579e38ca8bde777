//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! and deploy tools that replace the file by rename are still picked up.
//! Events for other files are ignored, and a reload only happens when the
//! file content actually changed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::RouterConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut last = fs::read_to_string(&path).ok();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !ours {
                        return;
                    }

                    let content = match fs::read_to_string(&path) {
                        Ok(content) => content,
                        Err(e) => {
                            tracing::warn!(path = ?path, error = %e, "Config file unreadable; keeping current configuration");
                            return;
                        }
                    };
                    if last.as_deref() == Some(content.as_str()) {
                        return;
                    }

                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    match parse_config(&content) {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config; keeping current configuration");
                        }
                    }
                    last = Some(content);
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn replace(path: &Path, content: &str) {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, content).unwrap();
        fs::rename(&tmp, path).unwrap();
    }

    #[tokio::test]
    async fn reloads_replaced_file_and_skips_invalid() {
        let dir = std::env::temp_dir().join(format!("tenant-router-{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("router.toml");
        fs::write(&path, "[tenancy]\nrewrite_prefix = \"/_sites\"\n").unwrap();

        let (watcher, mut rx) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();

        replace(&path, "[tenancy]\nrewrite_prefix = \"/sites\"\n");
        let config = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no reload within 5s")
            .unwrap();
        assert_eq!(config.tenancy.rewrite_prefix, "/sites");

        while rx.try_recv().is_ok() {}
        replace(&path, "[tenancy]\nrewrite_prefix = \"sites/\"\n");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
