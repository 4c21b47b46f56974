//! Operations context for dependency injection

use std::sync::Arc;

use pkgjob_config::Config;
use pkgjob_errors::Error;
use pkgjob_events::{EventEmitter, EventSender};
use pkgjob_install::{DpkgInstaller, FetchQueueFactory, FileFetchQueueFactory, SystemInstaller};
use pkgjob_platform::{NetworkMonitor, SpaceProbe, StatvfsProbe, StaticNetwork};
use pkgjob_query::{ChangelogSource, MimeIndex};
use pkgjob_store::PackageIndex;

/// Collaborators shared by every operation of a job
#[derive(Clone)]
pub struct OpsCtx {
    /// System configuration
    pub config: Config,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Source of the package store
    pub index: Arc<dyn PackageIndex>,
    /// Creates one fetch queue per transaction
    pub fetcher: Arc<dyn FetchQueueFactory>,
    pub installer: Arc<dyn SystemInstaller>,
    pub network: Arc<dyn NetworkMonitor>,
    pub space: Arc<dyn SpaceProbe>,
    /// Application metadata for mimetype lookups
    pub mime: Option<Arc<dyn MimeIndex>>,
    pub changelogs: Option<Arc<dyn ChangelogSource>>,
}

impl std::fmt::Debug for OpsCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsCtx")
            .field("config", &self.config)
            .field("mime", &self.mime.is_some())
            .field("changelogs", &self.changelogs.is_some())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    config: Option<Config>,
    tx: Option<EventSender>,
    index: Option<Arc<dyn PackageIndex>>,
    fetcher: Option<Arc<dyn FetchQueueFactory>>,
    installer: Option<Arc<dyn SystemInstaller>>,
    network: Option<Arc<dyn NetworkMonitor>>,
    space: Option<Arc<dyn SpaceProbe>>,
    mime: Option<Arc<dyn MimeIndex>>,
    changelogs: Option<Arc<dyn ChangelogSource>>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set package index
    #[must_use]
    pub fn with_index(mut self, index: Arc<dyn PackageIndex>) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn FetchQueueFactory>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn with_installer(mut self, installer: Arc<dyn SystemInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    #[must_use]
    pub fn with_network(mut self, network: Arc<dyn NetworkMonitor>) -> Self {
        self.network = Some(network);
        self
    }

    #[must_use]
    pub fn with_space_probe(mut self, space: Arc<dyn SpaceProbe>) -> Self {
        self.space = Some(space);
        self
    }

    #[must_use]
    pub fn with_mime_index(mut self, mime: Arc<dyn MimeIndex>) -> Self {
        self.mime = Some(mime);
        self
    }

    #[must_use]
    pub fn with_changelogs(mut self, changelogs: Arc<dyn ChangelogSource>) -> Self {
        self.changelogs = Some(changelogs);
        self
    }

    /// Build the context
    ///
    /// The fetcher, installer, network oracle and space probe fall back to
    /// the local file fetcher, `dpkg`, an always-online network and
    /// `statvfs`. Configuration falls back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the event sender or the index is missing.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let tx = self.tx.ok_or_else(|| missing("event_sender"))?;
        let index = self.index.ok_or_else(|| missing("index"))?;

        Ok(OpsCtx {
            config: self.config.unwrap_or_default(),
            tx,
            index,
            fetcher: self
                .fetcher
                .unwrap_or_else(|| Arc::new(FileFetchQueueFactory)),
            installer: self
                .installer
                .unwrap_or_else(|| Arc::new(DpkgInstaller::default())),
            network: self
                .network
                .unwrap_or_else(|| Arc::new(StaticNetwork::default())),
            space: self.space.unwrap_or_else(|| Arc::new(StatvfsProbe)),
            mime: self.mime,
            changelogs: self.changelogs,
        })
    }
}

fn missing(component: &str) -> Error {
    Error::internal(format!("missing component: {component}"))
}
