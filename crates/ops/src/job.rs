//! A package-management job
//!
//! A job opens the cache once for its role and then serves queries and
//! transactions from it. Every failing operation emits exactly one
//! error-code event before it returns the error; the private helpers only
//! propagate.

use pkgjob_errors::{Error, StoreError};
use pkgjob_events::{
    AppEvent, EventEmitter, JobEvent, PackageDetails, PackageEvent, PhaseProgress, Status,
    UpdateDetail,
};
use pkgjob_install::{ExecuteContext, RestartWatch, TransactionExecutor, TransactionResult};
use pkgjob_platform::CancelToken;
use pkgjob_query::{
    emission_versions, filter_downloaded, update_detail, ChangelogSource, ProvidesKind, Query,
    UpdateBuckets,
};
use pkgjob_resolver::{apply_request, TransactionRequest};
use pkgjob_store::{ResolvedPackage, VersionKey};
use pkgjob_types::{Filter, FilterSet, InfoKind, Role};
use uuid::Uuid;

use crate::cache::JobCache;
use crate::context::OpsCtx;
use crate::types::TransactionFlags;

pub struct Job {
    id: Uuid,
    ctx: OpsCtx,
    role: Role,
    flags: TransactionFlags,
    cache: Option<JobCache>,
    cancel: CancelToken,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("flags", &self.flags)
            .field("open", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl Job {
    #[must_use]
    pub fn new(ctx: OpsCtx) -> Self {
        let cancel = CancelToken::new(Some(ctx.tx.clone()));
        Self {
            id: Uuid::new_v4(),
            ctx,
            role: Role::Query,
            flags: TransactionFlags::default(),
            cache: None,
            cancel,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn context(&self) -> &OpsCtx {
        &self.ctx
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// The open cache, if [`Self::init`] succeeded
    #[must_use]
    pub fn cache(&self) -> Option<&JobCache> {
        self.cache.as_ref()
    }

    /// Open the cache for `role` and check it is consistent
    ///
    /// Writing roles take the archive lock unless `flags.simulate` is set.
    /// Repair jobs accept a broken cache.
    ///
    /// # Errors
    ///
    /// Fails when the lock cannot be taken, the index cannot be loaded or
    /// the cache holds breakage that cannot be corrected.
    pub async fn init(&mut self, role: Role, flags: TransactionFlags) -> Result<(), Error> {
        self.role = role;
        self.flags = flags;
        let result = self.open().await;
        self.report(result)
    }

    async fn open(&mut self) -> Result<(), Error> {
        // Release our own lock before trying to take it again
        self.cache = None;
        let with_lock = self.role.needs_lock() && !self.flags.simulate;
        tracing::debug!(job = %self.id, role = ?self.role, with_lock, "opening package cache");

        let mut cache = JobCache::open(&self.ctx, with_lock).await?;
        cache.check_consistency(self.role.allows_broken())?;
        self.cache = Some(cache);
        Ok(())
    }

    /// Request cancellation; returns whether this was the first request
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Emit the final status and drop the cache
    pub fn finish(&mut self, success: bool) {
        self.cache = None;
        self.ctx.emit_status(Status::Finished);
        self.ctx.emit(AppEvent::Job(JobEvent::Finished { success }));
    }

    /// Mark `request` onto the cache, then fetch and install the result
    ///
    /// A cancelled run is reported through the outcome, not as an error.
    /// The request is resolved on a copy of the cache state, so a simulated
    /// or failed run leaves nothing marked for the next one.
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised, when the request cannot be
    /// resolved and on any executor failure.
    pub async fn run_transaction(
        &mut self,
        request: &TransactionRequest,
        flags: TransactionFlags,
    ) -> Result<TransactionResult, Error> {
        let result = self.transact(request, flags).await;
        self.report(result)
    }

    async fn transact(
        &mut self,
        request: &TransactionRequest,
        flags: TransactionFlags,
    ) -> Result<TransactionResult, Error> {
        let ctx = &self.ctx;
        let cache = self.cache.as_mut().ok_or_else(not_open)?;
        ctx.emit_status(Status::Running);

        // Marks go on a copy; the job's cache keeps the state it was opened with
        let mut marked = cache.cache().clone();
        let mut progress = PhaseProgress::new(Some(ctx.tx.clone()));
        apply_request(&mut marked, request, &self.cancel, &mut progress)?;

        let exec_ctx = ExecuteContext::new()
            .with_simulate(flags.simulate)
            .with_download_only(flags.download_only)
            .with_archive_dir(ctx.config.archive_dir())
            .with_event_sender(ctx.tx.clone());
        let executor = TransactionExecutor::new(
            ctx.network.as_ref(),
            ctx.space.as_ref(),
            ctx.installer.as_ref(),
            self.cancel.clone(),
        );

        let watch = RestartWatch::start(ctx.config.restart_marker()).await;
        let mut queue = ctx.fetcher.create();
        let lock = if flags.simulate { None } else { cache.take_lock() };
        let result = executor
            .execute(&marked, &exec_ctx, queue.as_mut(), lock)
            .await?;

        if result.touched_system() {
            watch.finish(marked.store(), &result.changes, ctx).await;
        }
        tracing::info!(job = %self.id, outcome = ?result.outcome, "transaction finished");
        Ok(result)
    }

    /// Install the packages named by `ids`
    ///
    /// # Errors
    ///
    /// Fails with `PackageNotFound` when none of the ids resolve, otherwise
    /// as [`Self::run_transaction`].
    pub async fn install_packages<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        flags: TransactionFlags,
    ) -> Result<TransactionResult, Error> {
        let request = self.report(self.resolve_request(ids).map(TransactionRequest::install))?;
        self.run_transaction(&request, flags).await
    }

    /// Upgrade the packages named by `ids` to the listed versions
    ///
    /// # Errors
    ///
    /// As [`Self::install_packages`].
    pub async fn update_packages<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        flags: TransactionFlags,
    ) -> Result<TransactionResult, Error> {
        let request = self.report(self.resolve_request(ids).map(TransactionRequest::update))?;
        self.run_transaction(&request, flags).await
    }

    /// Remove the packages named by `ids`, and their garbage when
    /// autoremove is configured
    ///
    /// # Errors
    ///
    /// As [`Self::install_packages`].
    pub async fn remove_packages<S: AsRef<str>>(
        &mut self,
        ids: &[S],
        flags: TransactionFlags,
    ) -> Result<TransactionResult, Error> {
        let autoremove = self.ctx.config.resolver.autoremove;
        let request = self.report(
            self.resolve_request(ids)
                .map(|packages| TransactionRequest::remove(packages, autoremove)),
        )?;
        self.run_transaction(&request, flags).await
    }

    /// Fix broken dependencies; the job must have been opened as
    /// [`Role::RepairSystem`]
    ///
    /// # Errors
    ///
    /// As [`Self::run_transaction`].
    pub async fn repair_system(&mut self, flags: TransactionFlags) -> Result<TransactionResult, Error> {
        self.run_transaction(&TransactionRequest::repair(), flags).await
    }

    /// Bring the package database up to date and reopen the cache
    ///
    /// # Errors
    ///
    /// Fails when the index refresh fails or the cache cannot be reopened.
    pub async fn refresh_cache(&mut self) -> Result<(), Error> {
        let result = self.refresh().await;
        self.report(result)
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        self.ctx.emit_status(Status::RefreshCache);
        self.cache = None;
        self.ctx.index.refresh().await?;
        self.cache = Some(JobCache::open(&self.ctx, true).await?);
        Ok(())
    }

    /// Flag the packages named by `ids` as automatically installed
    ///
    /// Returns how many packages were flagged.
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn mark_auto_installed<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize, Error> {
        let result = self.mark_auto(ids);
        self.report(result)
    }

    fn mark_auto<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize, Error> {
        let cache = self.cache.as_mut().ok_or_else(not_open)?;
        let resolved = cache.store().resolve_identifiers(ids);
        let mut marked = 0;
        for package in resolved {
            if self.cancel.is_cancelled() {
                break;
            }
            let pk = cache.store().version(package.version).package;
            cache.cache_mut().mark_auto(pk, true);
            marked += 1;
        }
        Ok(marked)
    }

    /// Versions named by `ids` that pass `filters`
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn resolve<S: AsRef<str>>(&self, ids: &[S], filters: FilterSet) -> Result<Vec<VersionKey>, Error> {
        let result = self.open_cache().map(|cache| {
            self.ctx.emit_status(Status::Query);
            let versions = cache
                .store()
                .resolve_identifiers(ids)
                .into_iter()
                .map(|resolved| resolved.version)
                .collect();
            self.apply_filters(cache, versions, filters)
        });
        self.report(result)
    }

    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn search_names<S: AsRef<str>>(&self, values: &[S], filters: FilterSet) -> Result<Vec<VersionKey>, Error> {
        let result = self.query(|query| Ok(query.search_names(values)), filters);
        self.report(result)
    }

    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn search_details<S: AsRef<str>>(&self, values: &[S], filters: FilterSet) -> Result<Vec<VersionKey>, Error> {
        let result = self.query(|query| Ok(query.search_details(values)), filters);
        self.report(result)
    }

    /// # Errors
    ///
    /// Fails with `GroupNotFound` on an empty group name.
    pub fn search_groups<S: AsRef<str>>(&self, groups: &[S], filters: FilterSet) -> Result<Vec<VersionKey>, Error> {
        let result = self.query(|query| query.get_packages_from_group(groups), filters);
        self.report(result)
    }

    /// Every real package, one version each
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn get_packages(&self, filters: FilterSet) -> Result<Vec<VersionKey>, Error> {
        let result = self.query(|query| Ok(query.get_packages()), filters);
        self.report(result)
    }

    /// Installed versions that came from the repository `uri dist sections`
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn get_packages_from_repo<S: AsRef<str>>(
        &self,
        dist: &str,
        sections: &[S],
        uri: &str,
    ) -> Result<Vec<VersionKey>, Error> {
        let result = self.query(
            |query| Ok(query.get_packages_from_repo(dist, sections, uri)),
            FilterSet::none(),
        );
        self.report(result)
    }

    /// Packages providing `values` as a codec, a shared library or a
    /// mimetype handler
    ///
    /// # Errors
    ///
    /// Fails when a mimetype lookup is requested without a metadata index,
    /// or when the index cannot be loaded.
    pub async fn what_provides<S: AsRef<str>>(
        &self,
        kind: ProvidesKind,
        values: &[S],
        filters: FilterSet,
    ) -> Result<Vec<VersionKey>, Error> {
        let result = self.provides(kind, values, filters).await;
        self.report(result)
    }

    async fn provides<S: AsRef<str>>(
        &self,
        kind: ProvidesKind,
        values: &[S],
        filters: FilterSet,
    ) -> Result<Vec<VersionKey>, Error> {
        let cache = self.open_cache()?;
        self.ctx.emit_status(Status::Query);
        let query = Query::new(cache.store()).with_cancel(&self.cancel);

        let mut found = Vec::new();
        if matches!(kind, ProvidesKind::Any | ProvidesKind::Codec) {
            found.extend(query.provides_codec(values));
        }
        if matches!(kind, ProvidesKind::Any | ProvidesKind::SharedLibrary) {
            found.extend(query.provides_library(values));
        }
        if matches!(kind, ProvidesKind::Any | ProvidesKind::Mimetype) {
            match &self.ctx.mime {
                Some(index) => found.extend(query.provides_mimetype(values, index.as_ref()).await?),
                None if kind == ProvidesKind::Mimetype => {
                    return Err(Error::internal("no application metadata index is configured"));
                }
                None => {}
            }
        }
        Ok(self.apply_filters(cache, found, filters))
    }

    /// Dependencies of the packages named by `ids`
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn get_depends<S: AsRef<str>>(
        &self,
        ids: &[S],
        filters: FilterSet,
        recursive: bool,
    ) -> Result<Vec<VersionKey>, Error> {
        let result = self.walk(ids, filters, |query, vk| query.get_depends(vk, recursive));
        self.report(result)
    }

    /// Packages depending on the packages named by `ids`
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn get_requires<S: AsRef<str>>(
        &self,
        ids: &[S],
        filters: FilterSet,
        recursive: bool,
    ) -> Result<Vec<VersionKey>, Error> {
        let result = self.walk(ids, filters, |query, vk| query.get_requires(vk, recursive));
        self.report(result)
    }

    fn walk<S, F>(&self, ids: &[S], filters: FilterSet, step: F) -> Result<Vec<VersionKey>, Error>
    where
        S: AsRef<str>,
        F: Fn(&Query<'_>, VersionKey) -> Vec<VersionKey>,
    {
        let cache = self.open_cache()?;
        self.ctx.emit_status(Status::Query);
        let query = Query::new(cache.store()).with_cancel(&self.cancel);

        let mut found = Vec::new();
        for resolved in cache.store().resolve_identifiers(ids) {
            if self.cancel.is_cancelled() {
                break;
            }
            found.extend(step(&query, resolved.version));
        }
        Ok(self.apply_filters(cache, found, filters))
    }

    /// Emit and return the details of the packages named by `ids`
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn get_details<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<PackageDetails>, Error> {
        let result = self.open_cache().map(|cache| {
            self.ctx.emit_status(Status::Query);
            let versions = cache
                .store()
                .resolve_identifiers(ids)
                .into_iter()
                .map(|resolved| resolved.version)
                .collect();
            let details = Query::new(cache.store())
                .with_cancel(&self.cancel)
                .get_details(versions);
            for detail in &details {
                self.ctx
                    .emit(AppEvent::Package(PackageEvent::Details(detail.clone())));
            }
            details
        });
        self.report(result)
    }

    /// Work out what a full upgrade would do and emit it
    ///
    /// Updates are emitted as `Normal` and kept-back packages as `Blocked`,
    /// both through `filters`.
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn get_updates(&self, filters: FilterSet) -> Result<UpdateBuckets, Error> {
        let result = self.open_cache().map(|cache| {
            self.ctx.emit_status(Status::Query);
            let buckets = UpdateBuckets::collect(cache.cache());
            self.emit_with(cache, buckets.updates.clone(), filters, InfoKind::Normal, false);
            self.emit_with(cache, buckets.blocked.clone(), filters, InfoKind::Blocked, false);
            buckets
        });
        self.report(result)
    }

    /// Emit and return advisory details for the versions named by `ids`
    ///
    /// Changelogs are only fetched when a source is configured, fetching
    /// is enabled and the network is up.
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub async fn get_update_detail<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<UpdateDetail>, Error> {
        let result = self.update_details(ids).await;
        self.report(result)
    }

    async fn update_details<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<UpdateDetail>, Error> {
        let cache = self.open_cache()?;
        let store = cache.store();

        let source: Option<&dyn ChangelogSource> = self
            .ctx
            .changelogs
            .as_deref()
            .filter(|_| self.ctx.config.network.fetch_changelogs && self.ctx.network.is_online());
        self.ctx.emit_status(if source.is_some() {
            Status::DownloadChangelog
        } else {
            Status::Query
        });

        let mut details = Vec::new();
        for resolved in store.resolve_identifiers(ids) {
            if self.cancel.is_cancelled() {
                break;
            }
            let detail = update_detail(store, resolved.version, source).await;
            self.ctx
                .emit(AppEvent::Package(PackageEvent::UpdateDetail(detail.clone())));
            details.push(detail);
        }
        Ok(details)
    }

    /// Emit `versions` through `filters`
    ///
    /// `InfoKind::Unknown` is replaced per version by `Installed` or
    /// `Available`. With `multiversion` the older versions of each package
    /// are emitted too, subject to the newest filters. Returns how many
    /// packages were emitted.
    ///
    /// # Errors
    ///
    /// Fails when the job was not initialised.
    pub fn emit_packages(
        &self,
        versions: Vec<VersionKey>,
        filters: FilterSet,
        info: InfoKind,
        multiversion: bool,
    ) -> Result<usize, Error> {
        let result = self
            .open_cache()
            .map(|cache| self.emit_with(cache, versions, filters, info, multiversion));
        self.report(result)
    }

    fn emit_with(
        &self,
        cache: &JobCache,
        versions: Vec<VersionKey>,
        filters: FilterSet,
        info: InfoKind,
        multiversion: bool,
    ) -> usize {
        let store = cache.store();
        let filtered = self.apply_filters(cache, versions, filters);

        let mut emitted = 0;
        for vk in emission_versions(store, &filtered, filters, multiversion) {
            if self.cancel.is_cancelled() {
                break;
            }
            let info = match info {
                InfoKind::Unknown if store.is_current(vk) => InfoKind::Installed,
                InfoKind::Unknown => InfoKind::Available,
                other => other,
            };
            self.ctx.emit_package(
                info,
                store.build_identifier(vk).to_string(),
                store.version(vk).summary.clone(),
            );
            emitted += 1;
        }
        emitted
    }

    fn query<F>(&self, run: F, filters: FilterSet) -> Result<Vec<VersionKey>, Error>
    where
        F: FnOnce(&Query<'_>) -> Result<Vec<VersionKey>, Error>,
    {
        let cache = self.open_cache()?;
        self.ctx.emit_status(Status::Query);
        let query = Query::new(cache.store()).with_cancel(&self.cancel);
        let found = run(&query)?;
        Ok(self.apply_filters(cache, found, filters))
    }

    /// Predicate filters, then the download state last
    fn apply_filters(&self, cache: &JobCache, versions: Vec<VersionKey>, filters: FilterSet) -> Vec<VersionKey> {
        let filtered = Query::new(cache.store())
            .with_cancel(&self.cancel)
            .filter(versions, filters);

        let downloaded = filters.contains(Filter::Downloaded);
        if downloaded || filters.contains(Filter::NotDownloaded) {
            filter_downloaded(cache.cache(), &filtered, &self.ctx.config.archive_dir(), downloaded)
        } else {
            filtered
        }
    }

    fn resolve_request<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<ResolvedPackage>, Error> {
        let resolved = self.open_cache()?.store().resolve_identifiers(ids);
        if resolved.is_empty() {
            let id = ids.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ");
            return Err(StoreError::PackageNotFound { id }.into());
        }
        Ok(resolved)
    }

    fn open_cache(&self) -> Result<&JobCache, Error> {
        self.cache.as_ref().ok_or_else(not_open)
    }

    /// Emit the terminal error event for a failed operation
    fn report<T>(&self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(err) = &result {
            tracing::warn!(job = %self.id, %err, "operation failed");
            self.ctx.emit_failure(err);
        }
        result
    }
}

fn not_open() -> Error {
    Error::internal("the package cache is not open")
}
