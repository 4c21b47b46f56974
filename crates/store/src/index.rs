//! Package database seam
//!
//! The job never parses system files itself. It asks a [`PackageIndex`] for
//! a freshly built store, and asks it to refresh before reloading.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pkgjob_errors::{Error, StoreError};
use tokio::fs;

use crate::builder::StoreBuilder;
use crate::model::Origin;
use crate::store::PackageStore;

#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Build a store from the current database contents
    async fn load(&self) -> Result<PackageStore, Error>;

    /// Bring the underlying database up to date
    async fn refresh(&self) -> Result<(), Error>;
}

/// A package list file and the repository it came from
#[derive(Debug, Clone)]
pub struct ListSource {
    pub path: PathBuf,
    pub origin: Origin,
}

/// Index backed by dpkg-style control files on disk
#[derive(Debug, Clone)]
pub struct ControlIndex {
    status: PathBuf,
    extended_states: Option<PathBuf>,
    lists: Vec<ListSource>,
    native_arch: String,
    pins: Vec<(String, i32)>,
}

impl ControlIndex {
    #[must_use]
    pub fn new(status: impl Into<PathBuf>, native_arch: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            extended_states: None,
            lists: Vec::new(),
            native_arch: native_arch.into(),
            pins: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extended_states(mut self, path: impl Into<PathBuf>) -> Self {
        self.extended_states = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_list(mut self, path: impl Into<PathBuf>, origin: Origin) -> Self {
        self.lists.push(ListSource {
            path: path.into(),
            origin,
        });
        self
    }

    #[must_use]
    pub fn with_pin(mut self, name: impl Into<String>, priority: i32) -> Self {
        self.pins.push((name.into(), priority));
        self
    }
}

async fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

#[async_trait]
impl PackageIndex for ControlIndex {
    async fn load(&self) -> Result<PackageStore, Error> {
        let mut builder = StoreBuilder::new(&self.native_arch);

        builder.add_status(&read(&self.status).await?)?;

        if let Some(path) = &self.extended_states {
            // A missing extended_states file just means nothing is auto
            if fs::try_exists(path).await.unwrap_or(false) {
                builder.add_extended_states(&read(path).await?);
            }
        }

        for list in &self.lists {
            let text = read(&list.path).await?;
            builder.add_list(&text, &list.origin).map_err(|e| {
                StoreError::OpenFailed {
                    message: format!("{}: {e}", list.path.display()),
                }
            })?;
        }

        for (name, priority) in &self.pins {
            builder.pin(name, *priority);
        }

        let store = builder.build();
        tracing::debug!(
            packages = store.package_count(),
            lists = self.lists.len(),
            "loaded package index"
        );
        Ok(store)
    }

    async fn refresh(&self) -> Result<(), Error> {
        for list in &self.lists {
            if !fs::try_exists(&list.path).await.unwrap_or(false) {
                tracing::warn!(path = %list.path.display(), "package list missing after refresh");
            }
        }
        Ok(())
    }
}

/// Index serving a prepared builder, used by embedders and tests
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    builder: StoreBuilder,
    loads: Arc<AtomicUsize>,
    refreshes: Arc<AtomicUsize>,
}

impl MemoryIndex {
    #[must_use]
    pub fn new(builder: StoreBuilder) -> Self {
        Self {
            builder,
            loads: Arc::new(AtomicUsize::new(0)),
            refreshes: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PackageIndex for MemoryIndex {
    async fn load(&self) -> Result<PackageStore, Error> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(self.builder.build())
    }

    async fn refresh(&self) -> Result<(), Error> {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
