//! Reboot detection around a transaction
//!
//! Maintainer scripts touch a marker file when the system needs a reboot.
//! The job samples its mtime before installing and compares afterwards.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use pkgjob_events::EventEmitter;
use pkgjob_resolver::ChangeSet;
use pkgjob_store::PackageStore;
use pkgjob_types::RestartKind;
use tokio::fs;

/// Reported when the marker changed but nothing was recorded as changed
pub const PLACEHOLDER_PACKAGE_ID: &str = "apt-backend;;;";

#[derive(Debug, Clone)]
pub struct RestartWatch {
    marker: PathBuf,
    before: Option<SystemTime>,
}

impl RestartWatch {
    /// Sample the marker's mtime
    pub async fn start(marker: impl Into<PathBuf>) -> Self {
        let marker = marker.into();
        let before = modified(&marker).await;
        Self { marker, before }
    }

    /// Whether the marker appeared or was touched since [`Self::start`]
    pub async fn triggered(&self) -> bool {
        match (modified(&self.marker).await, self.before) {
            (Some(after), Some(before)) => after > before,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Emit require-restart events when the marker was touched
    ///
    /// Packages known to need a reboot are named first; failing those every
    /// changed package is, and failing that a placeholder. Returns whether
    /// anything was emitted.
    pub async fn finish(&self, store: &PackageStore, changes: &ChangeSet, emitter: &impl EventEmitter) -> bool {
        if !self.triggered().await {
            return false;
        }
        tracing::debug!(marker = %self.marker.display(), "restart marker touched");

        let ids: Vec<String> = if changes.restart.is_empty() {
            changes.all().map(|vk| store.build_identifier(vk).to_string()).collect()
        } else {
            changes
                .restart
                .iter()
                .map(|&vk| store.build_identifier(vk).to_string())
                .collect()
        };

        if ids.is_empty() {
            emitter.emit_require_restart(RestartKind::System, PLACEHOLDER_PACKAGE_ID);
        } else {
            for id in ids {
                emitter.emit_require_restart(RestartKind::System, id);
            }
        }
        true
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).await.ok()?.modified().ok()
}
