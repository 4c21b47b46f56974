//! Opening the package cache for a job
//!
//! Writing roles hold the archive lock for as long as the cache is open.
//! Contention is retried on a fixed delay, and loading the index shares the
//! same retry budget while the lock is held.

use std::sync::Arc;

use pkgjob_errors::{Error, PendingErrors, StoreError};
use pkgjob_events::{EventEmitter, Status};
use pkgjob_resolver::{now_report, CacheOptions, DepCache};
use pkgjob_store::{ArchiveLock, PackageStore};
use tokio::fs;

use crate::context::OpsCtx;

/// A loaded store with its resolver state
///
/// Dropping it discards the pending diagnostics and releases the archive
/// lock if it is still held.
#[derive(Debug)]
pub struct JobCache {
    cache: DepCache,
    pending: PendingErrors,
    lock: Option<ArchiveLock>,
}

impl JobCache {
    /// Load the store, taking the archive lock first when `with_lock`
    ///
    /// # Errors
    ///
    /// Fails with `StoreError::UpgradeInProgress` when the upgrade marker
    /// exists, whatever `with_lock` says, with `StoreError::CannotGetLock` once the retries are used up,
    /// or with the index error when loading without the lock fails.
    pub async fn open(ctx: &OpsCtx, with_lock: bool) -> Result<Self, Error> {
        // A distribution upgrade blocks every job, readers included
        let marker = ctx.config.upgrade_lock();
        if fs::try_exists(&marker).await.unwrap_or(false) {
            return Err(StoreError::UpgradeInProgress {
                path: marker.display().to_string(),
            }
            .into());
        }

        let mut pending = PendingErrors::new();
        let mut retry = LockRetry::new(ctx);

        let lock = if with_lock {
            let archive_dir = ctx.config.archive_dir();
            loop {
                match ArchiveLock::try_acquire(&archive_dir) {
                    Ok(Some(lock)) => break Some(lock),
                    Ok(None) => tracing::debug!(dir = %archive_dir.display(), "archive directory is busy"),
                    Err(err) => pending.push_error(err.to_string()),
                }
                retry.wait(ctx, &mut pending).await?;
            }
        } else {
            None
        };

        ctx.emit_status(Status::LoadingCache);
        let store = loop {
            match ctx.index.load().await {
                Ok(store) => break store,
                Err(err) if with_lock => {
                    tracing::debug!(%err, "package index could not be loaded");
                    pending.push_error(err.to_string());
                    retry.wait(ctx, &mut pending).await?;
                }
                Err(err) => return Err(err),
            }
        };

        let options = CacheOptions {
            install_recommends: ctx.config.resolver.install_recommends,
        };
        Ok(Self::from_store(store, options, lock).with_pending(pending))
    }

    /// Wrap an already loaded store
    #[must_use]
    pub fn from_store(store: PackageStore, options: CacheOptions, lock: Option<ArchiveLock>) -> Self {
        Self {
            cache: DepCache::new(Arc::new(store), options),
            pending: PendingErrors::new(),
            lock,
        }
    }

    fn with_pending(mut self, pending: PendingErrors) -> Self {
        self.pending = pending;
        self
    }

    /// Make sure the cache can be used for a new request
    ///
    /// Unfinished packages are queued for repair. Unless `allow_broken`,
    /// remaining breakage is fixed and the upgrade set minimized.
    ///
    /// # Errors
    ///
    /// Fails on a recorded pending error, on marks left from an earlier
    /// run, and with `StoreError::UnfinishedTransaction` carrying the
    /// unmet-dependency report when the breakage cannot be fixed.
    pub fn check_consistency(&mut self, allow_broken: bool) -> Result<(), Error> {
        if self.pending.has_pending_error() {
            return Err(StoreError::PendingErrors {
                message: self.pending.error_summary(),
            }
            .into());
        }

        if self.cache.inst_count() > 0 || self.cache.del_count() > 0 {
            return Err(StoreError::InconsistentCounts.into());
        }

        self.cache.apply_status();

        if self.cache.broken_count() == 0 || allow_broken {
            return Ok(());
        }

        tracing::info!(broken = self.cache.broken_count(), "correcting dependencies");
        if let Err(err) = self.cache.fix_broken() {
            tracing::debug!(%err, "fix-broken left problems behind");
        }

        if self.cache.broken_count() > 0 {
            tracing::warn!("Unable to correct dependencies");
            return Err(StoreError::UnfinishedTransaction {
                report: now_report(&self.cache),
            }
            .into());
        }

        self.cache.minimize_upgrade();
        Ok(())
    }

    #[must_use]
    pub fn cache(&self) -> &DepCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DepCache {
        &mut self.cache
    }

    #[must_use]
    pub fn store(&self) -> &PackageStore {
        self.cache.store()
    }

    pub fn pending_mut(&mut self) -> &mut PendingErrors {
        &mut self.pending
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Hand the archive lock over to the transaction executor
    pub fn take_lock(&mut self) -> Option<ArchiveLock> {
        self.lock.take()
    }
}

/// Shared attempt counter for the lock and the index load
struct LockRetry {
    attempts: u32,
    used: u32,
}

impl LockRetry {
    fn new(ctx: &OpsCtx) -> Self {
        Self {
            attempts: ctx.config.lock.attempts.max(1),
            used: 0,
        }
    }

    /// Count a failed attempt and sleep before the next one
    async fn wait(&mut self, ctx: &OpsCtx, pending: &mut PendingErrors) -> Result<(), Error> {
        self.used += 1;
        if self.used >= self.attempts {
            return Err(StoreError::CannotGetLock {
                attempts: self.attempts,
            }
            .into());
        }

        // Errors from the failed attempt are stale once we retry
        pending.discard();
        ctx.emit_status(Status::WaitingForLock);
        tokio::time::sleep(ctx.config.lock_retry_delay()).await;
        Ok(())
    }
}
