//! Running a resolved transaction
//!
//! The executor takes a [`DepCache`] whose marks are final, fetches the
//! archives it needs and hands the ordered steps to the system installer.
//! It never changes marks.

use pkgjob_errors::{Error, TransactionError};
use pkgjob_events::EventEmitter;
use pkgjob_platform::{CancelToken, NetworkMonitor, SpaceProbe};
use pkgjob_resolver::{check_essential, install_report, ChangeSet, DepCache};
use pkgjob_store::ArchiveLock;

use crate::context::ExecuteContext;
use crate::fetch::{FetchQueue, FetchResult};
use crate::installer::{InstallItem, InstallProgress, SystemInstaller};
use crate::plan::FetchPlan;
use crate::result::{TransactionOutcome, TransactionResult};
use crate::status::AcquireStatus;

pub const BROKEN_PACKAGES_MESSAGE: &str =
    "Internal error, InstallPackages was called with broken packages!";

pub struct TransactionExecutor<'a> {
    network: &'a dyn NetworkMonitor,
    space: &'a dyn SpaceProbe,
    installer: &'a dyn SystemInstaller,
    cancel: CancelToken,
}

impl<'a> TransactionExecutor<'a> {
    #[must_use]
    pub fn new(
        network: &'a dyn NetworkMonitor,
        space: &'a dyn SpaceProbe,
        installer: &'a dyn SystemInstaller,
        cancel: CancelToken,
    ) -> Self {
        Self {
            network,
            space,
            installer,
            cancel,
        }
    }

    /// Fetch and install the marks of `cache`
    ///
    /// `held_lock` is the archive lock when the caller already owns it;
    /// otherwise it is taken here unless simulating. Either way it is
    /// released before the installer runs.
    ///
    /// # Errors
    ///
    /// Fails when an essential package would be removed, anything is still
    /// broken, the archive lock is busy, an archive cannot be located, the
    /// system is offline with bytes to fetch, the archive directory is out
    /// of space, the download fails or the installer fails.
    pub async fn execute(
        &self,
        cache: &DepCache,
        ctx: &ExecuteContext,
        queue: &mut dyn FetchQueue,
        held_lock: Option<ArchiveLock>,
    ) -> Result<TransactionResult, Error> {
        check_essential(cache)?;

        if cache.broken_count() > 0 {
            let report = install_report(cache);
            return Err(Error::internal(format!("{BROKEN_PACKAGES_MESSAGE}\n{report}")));
        }

        if cache.del_count() == 0 && cache.inst_count() == 0 {
            tracing::debug!("nothing to do");
            return Ok(TransactionResult::new(TransactionOutcome::NoOp, ChangeSet::default()));
        }

        let lock = if ctx.simulate {
            held_lock
        } else {
            Some(match held_lock {
                Some(lock) => lock,
                None => acquire_lock(ctx)?,
            })
        };

        let plan = FetchPlan::build(cache, &ctx.archive_dir)?;
        let fetch = plan.fetch_needed();
        let partial = plan.partial_present();

        if fetch > 0 {
            ctx.emit_download_size_remaining(fetch);
            if !ctx.simulate && !self.network.is_online() {
                return Err(TransactionError::NoNetwork.into());
            }
        }

        if fetch > partial {
            let free = self.space.probe(&ctx.archive_dir)?;
            if !free.has_room_for(fetch - partial) {
                return Err(TransactionError::NoSpaceOnDevice {
                    path: ctx.archive_dir.display().to_string(),
                }
                .into());
            }
        }

        let changes = ChangeSet::classify(cache);

        if ctx.simulate {
            emit_changes(cache, ctx, &changes);
            return Ok(TransactionResult::new(TransactionOutcome::Simulated, changes));
        }

        for item in &plan.items {
            queue.enqueue(item.clone());
        }
        let mut status = AcquireStatus::new(ctx.event_sender.clone(), self.cancel.clone());
        status.start();
        match queue.run(&mut status).await {
            FetchResult::Continue => {}
            _ if self.cancel.is_cancelled() => {}
            FetchResult::Failed(message) => {
                return Err(TransactionError::DownloadFailed { message }.into());
            }
            FetchResult::Cancelled => {
                return Err(TransactionError::DownloadFailed {
                    message: "Download was interrupted".to_string(),
                }
                .into());
            }
        }

        let result = |outcome| TransactionResult::new(outcome, changes.clone()).with_fetched_bytes(fetch);

        if ctx.download_only {
            return Ok(result(TransactionOutcome::Downloaded));
        }
        if self.cancel.is_cancelled() {
            tracing::debug!("cancelled after download");
            return Ok(result(TransactionOutcome::Cancelled));
        }

        // Point of no return
        ctx.emit_allow_cancel(false);
        self.cancel.disallow();
        ctx.emit_percentage(None);
        drop(lock);

        let items = InstallItem::from_steps(cache, &plan.steps, &ctx.archive_dir);
        let mut progress = InstallProgress::new(ctx.event_sender.clone(), self.cancel.clone(), items.len());
        self.installer.install(&items, &mut progress).await?;

        Ok(result(TransactionOutcome::Installed))
    }
}

fn acquire_lock(ctx: &ExecuteContext) -> Result<ArchiveLock, Error> {
    let locked = || TransactionError::DownloadDirLocked {
        path: ctx.archive_dir.display().to_string(),
    };
    match ArchiveLock::try_acquire(&ctx.archive_dir) {
        Ok(Some(lock)) => Ok(lock),
        Ok(None) => Err(locked().into()),
        Err(err) => {
            tracing::debug!(%err, "archive lock could not be created");
            Err(locked().into())
        }
    }
}

/// Report every change of a simulated run
fn emit_changes(cache: &DepCache, ctx: &ExecuteContext, changes: &ChangeSet) {
    let store = cache.store();
    for (info, versions) in changes.ordered() {
        for &vk in versions {
            ctx.emit_package(
                info,
                store.build_identifier(vk).to_string(),
                store.version(vk).summary.clone(),
            );
        }
    }
}
