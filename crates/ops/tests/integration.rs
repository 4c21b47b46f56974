//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use pkgjob_config::Config;
    use pkgjob_errors::{Error, ErrorCode};
    use pkgjob_events::{AppEvent, EventReceiver, JobEvent, PackageEvent, ProgressEvent, Status};
    use pkgjob_install::{InstallItem, InstallProgress, SystemInstaller};
    use pkgjob_ops::*;
    use pkgjob_platform::{FreeSpace, SpaceProbe};
    use pkgjob_query::{MimeComponent, MimeIndex, CHANGELOG_UNAVAILABLE};
    use pkgjob_store::{repo_origin, ArchiveLock, MemoryIndex, StoreBuilder};
    use pkgjob_types::{Filter, FilterSet, InfoKind, RestartKind, Role};
    use tempfile::TempDir;

    const STATUS: &str = "\
Package: hello
Status: install ok installed
Architecture: amd64
Version: 1.0
Section: utils
Description: greeter

Package: oldtool
Status: install ok installed
Architecture: amd64
Version: 1.0
Section: utils
Description: legacy tool
";

    const LIST: &str = "\
Package: hello
Architecture: amd64
Version: 2.0
Section: utils
Size: 5
Filename: pool/hello_2.0_amd64.deb
Description: greeter

Package: newpkg
Architecture: amd64
Version: 1.0
Section: utils
Size: 3
Depends: libnew
Filename: pool/newpkg_1.0_amd64.deb
Description: new package

Package: libnew
Architecture: amd64
Version: 1.0
Section: libs
Size: 4
Filename: pool/libnew_1.0_amd64.deb
Description: new library

Package: linux-image-6
Architecture: amd64
Version: 6.1
Section: kernel
Size: 1
Filename: pool/linux-image-6_6.1_amd64.deb
Description: kernel
";

    struct Fixture {
        dir: TempDir,
        index: MemoryIndex,
        installer: Arc<RecordingInstaller>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_status(STATUS)
        }

        fn with_status(status: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let pool = dir.path().join("mirror/pool");
            std::fs::create_dir_all(&pool).unwrap();
            std::fs::create_dir_all(dir.path().join("archives")).unwrap();
            for (file, size) in [
                ("hello_2.0_amd64.deb", 5),
                ("newpkg_1.0_amd64.deb", 3),
                ("libnew_1.0_amd64.deb", 4),
                ("linux-image-6_6.1_amd64.deb", 1),
            ] {
                std::fs::write(pool.join(file), vec![b'x'; size]).unwrap();
            }

            let uri = format!("file://{}", dir.path().join("mirror").display());
            let mut builder = StoreBuilder::new("amd64");
            builder.add_status(status).unwrap();
            builder
                .add_list(LIST, &repo_origin("Debian", "stable", "main", &uri))
                .unwrap();

            let installer = Arc::new(RecordingInstaller {
                marker: dir.path().join("reboot-required"),
                ..RecordingInstaller::default()
            });
            Self {
                index: MemoryIndex::new(builder),
                installer,
                dir,
            }
        }

        fn archives(&self) -> PathBuf {
            self.dir.path().join("archives")
        }

        fn config(&self) -> Config {
            let mut config = Config::default();
            config.paths.archive_dir = Some(self.archives());
            config.paths.restart_marker = Some(self.dir.path().join("reboot-required"));
            config.paths.upgrade_lock = Some(self.dir.path().join("upgrade-lock"));
            config.lock.attempts = 3;
            config.lock.retry_delay_ms = 1000;
            config
        }

        fn job(&self) -> (Job, EventReceiver) {
            let (tx, rx) = pkgjob_events::channel();
            let ctx = OpsContextBuilder::new()
                .with_config(self.config())
                .with_event_sender(tx)
                .with_index(Arc::new(self.index.clone()))
                .with_installer(self.installer.clone())
                .with_space_probe(Arc::new(Plenty))
                .build()
                .unwrap();
            (Job::new(ctx), rx)
        }
    }

    struct Plenty;

    impl SpaceProbe for Plenty {
        fn probe(&self, _path: &Path) -> Result<FreeSpace, Error> {
            Ok(FreeSpace {
                free_blocks: 1 << 30,
                block_size: 4096,
                ram_backed: false,
            })
        }
    }

    /// Records what it was asked to do and touches the reboot marker when
    /// a kernel is installed
    #[derive(Default)]
    struct RecordingInstaller {
        marker: PathBuf,
        names: Mutex<Vec<String>>,
    }

    impl RecordingInstaller {
        fn names(&self) -> Vec<String> {
            self.names.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SystemInstaller for RecordingInstaller {
        async fn install(&self, items: &[InstallItem], progress: &mut InstallProgress) -> Result<(), Error> {
            progress.start();
            for item in items {
                progress.item_started(item);
                if item.name.starts_with("linux-image-") {
                    std::fs::write(&self.marker, b"").unwrap();
                }
                self.names.lock().unwrap().push(item.name.clone());
                progress.item_finished(item);
            }
            Ok(())
        }
    }

    struct StaticMime;

    #[async_trait]
    impl MimeIndex for StaticMime {
        async fn load(&self) -> Result<(), String> {
            Ok(())
        }

        fn components_for(&self, mimetype: &str) -> Vec<MimeComponent> {
            if mimetype != "text/x-greeting" {
                return Vec::new();
            }
            vec![
                MimeComponent {
                    id: "org.example.Hello".to_string(),
                    package: Some("hello".to_string()),
                },
                MimeComponent {
                    id: "org.example.Orphan".to_string(),
                    package: None,
                },
            ]
        }
    }

    fn drain(rx: &mut EventReceiver) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn error_codes(events: &[AppEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Job(JobEvent::ErrorCode { failure }) => failure.code.clone(),
                _ => None,
            })
            .collect()
    }

    fn statuses(events: &[AppEvent]) -> Vec<Status> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Progress(ProgressEvent::StatusChanged { status }) => Some(*status),
                _ => None,
            })
            .collect()
    }

    fn emitted(events: &[AppEvent]) -> Vec<(InfoKind, String)> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Package(PackageEvent::Emitted { info, package_id, .. }) => {
                    Some((*info, package_id.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn ids(job: &Job, versions: &[pkgjob_store::VersionKey]) -> Vec<String> {
        let store = job.cache().unwrap().store();
        versions
            .iter()
            .map(|&vk| store.build_identifier(vk).to_string())
            .collect()
    }

    #[test]
    fn test_builder_requires_index_and_sender() {
        let err = OpsContextBuilder::new().build().unwrap_err();
        assert!(err.to_string().contains("missing component: event_sender"));

        let (tx, _rx) = pkgjob_events::channel();
        let err = OpsContextBuilder::new().with_event_sender(tx).build().unwrap_err();
        assert!(err.to_string().contains("missing component: index"));
    }

    #[tokio::test]
    async fn test_query_job_opens_without_lock() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();

        assert!(!job.cache().unwrap().is_locked());
        assert!(ArchiveLock::try_acquire(&fixture.archives()).unwrap().is_some());
        assert_eq!(statuses(&drain(&mut rx)), [Status::LoadingCache]);

        // A plain name yields the installed version and the candidate
        let found = job.resolve(&["hello"], FilterSet::none()).unwrap();
        assert_eq!(
            ids(&job, &found),
            ["hello;1.0;amd64;installed:local", "hello;2.0;amd64;debian-stable-main"]
        );

        let installed = job.resolve(&["hello"], FilterSet::none().with(Filter::Installed)).unwrap();
        assert_eq!(ids(&job, &installed), ["hello;1.0;amd64;installed:local"]);
        assert!(job.resolve(&["no-such-package"], FilterSet::none()).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_contention_exhausts_retries() {
        let fixture = Fixture::new();
        let _held = ArchiveLock::try_acquire(&fixture.archives()).unwrap().unwrap();
        let (mut job, mut rx) = fixture.job();

        let started = tokio::time::Instant::now();
        let err = job.init(Role::Install, TransactionFlags::default()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotGetLock);
        assert_eq!(
            err.to_string(),
            "store error: could not acquire the package system lock after 3 attempts"
        );
        assert_eq!(started.elapsed(), Duration::from_millis(2000));

        let events = drain(&mut rx);
        assert_eq!(statuses(&events), [Status::WaitingForLock, Status::WaitingForLock]);
        assert_eq!(error_codes(&events), [ErrorCode::CannotGetLock.as_str()]);
        assert!(job.cache().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_released_while_waiting() {
        let fixture = Fixture::new();
        let held = ArchiveLock::try_acquire(&fixture.archives()).unwrap().unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            drop(held);
        });

        let (mut job, mut rx) = fixture.job();
        job.init(Role::Install, TransactionFlags::default()).await.unwrap();
        assert!(job.cache().unwrap().is_locked());

        let events = drain(&mut rx);
        assert_eq!(
            statuses(&events),
            [Status::WaitingForLock, Status::WaitingForLock, Status::LoadingCache]
        );
        assert!(error_codes(&events).is_empty());
    }

    #[tokio::test]
    async fn test_upgrade_marker_fails_immediately() {
        let fixture = Fixture::new();
        std::fs::write(fixture.dir.path().join("upgrade-lock"), b"").unwrap();
        let (mut job, mut rx) = fixture.job();

        let err = job.init(Role::Update, TransactionFlags::default()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::CannotGetLock);
        assert!(err.to_string().contains("an upgrade is in progress"));

        let events = drain(&mut rx);
        assert!(statuses(&events).is_empty());
        assert_eq!(error_codes(&events).len(), 1);
        assert_eq!(fixture.index.load_count(), 0);

        // Readers and simulated writers are blocked too
        for (role, flags) in [
            (Role::Update, TransactionFlags::simulate()),
            (Role::Query, TransactionFlags::default()),
            (Role::RepairSystem, TransactionFlags::default()),
        ] {
            let err = job.init(role, flags).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::CannotGetLock);
        }
        assert_eq!(error_codes(&drain(&mut rx)).len(), 3);
        assert_eq!(fixture.index.load_count(), 0);

        std::fs::remove_file(fixture.dir.path().join("upgrade-lock")).unwrap();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();
    }

    #[tokio::test]
    async fn test_operations_need_an_open_cache() {
        let fixture = Fixture::new();
        let (job, mut rx) = fixture.job();

        let err = job.get_packages(FilterSet::none()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(error_codes(&drain(&mut rx)).len(), 1);
    }

    #[tokio::test]
    async fn test_simulated_install() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Install, TransactionFlags::simulate()).await.unwrap();
        assert!(!job.cache().unwrap().is_locked());

        let result = job
            .install_packages(&["newpkg"], TransactionFlags::simulate())
            .await
            .unwrap();
        assert_eq!(result.outcome, TransactionOutcome::Simulated);

        let events = drain(&mut rx);
        assert!(statuses(&events).contains(&Status::Running));
        assert_eq!(
            emitted(&events),
            [
                (InfoKind::Installing, "newpkg;1.0;amd64;debian-stable-main".to_string()),
                (InfoKind::Installing, "libnew;1.0;amd64;debian-stable-main".to_string()),
            ]
        );
        assert!(fixture.installer.names().is_empty());
        assert!(error_codes(&events).is_empty());
    }

    #[tokio::test]
    async fn test_install_runs_the_installer_and_releases_the_lock() {
        let fixture = Fixture::new();
        let (mut job, _rx) = fixture.job();
        job.init(Role::Install, TransactionFlags::default()).await.unwrap();
        assert!(job.cache().unwrap().is_locked());

        let result = job
            .install_packages(&["newpkg"], TransactionFlags::default())
            .await
            .unwrap();
        assert_eq!(result.outcome, TransactionOutcome::Installed);
        assert_eq!(result.fetched_bytes, 7);
        assert_eq!(fixture.installer.names(), ["libnew", "newpkg"]);
        assert!(fixture.archives().join("libnew_1.0_amd64.deb").exists());

        assert!(!job.cache().unwrap().is_locked());
        assert!(ArchiveLock::try_acquire(&fixture.archives()).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_simulated_run_leaves_no_marks() {
        let fixture = Fixture::new();
        let (mut job, _rx) = fixture.job();
        job.init(Role::Install, TransactionFlags::default()).await.unwrap();

        let result = job
            .install_packages(&["newpkg"], TransactionFlags::simulate())
            .await
            .unwrap();
        assert_eq!(result.outcome, TransactionOutcome::Simulated);
        assert_eq!(job.cache().unwrap().cache().inst_count(), 0);
        assert!(job.cache().unwrap().is_locked());

        job.update_packages(&["hello"], TransactionFlags::default())
            .await
            .unwrap();
        assert_eq!(fixture.installer.names(), ["hello"]);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_marks() {
        let fixture = Fixture::new();
        std::fs::remove_file(fixture.dir.path().join("mirror/pool/newpkg_1.0_amd64.deb")).unwrap();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Install, TransactionFlags::default()).await.unwrap();
        drain(&mut rx);

        let err = job
            .install_packages(&["newpkg"], TransactionFlags::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PackageDownloadFailed);
        assert_eq!(error_codes(&drain(&mut rx)).len(), 1);
        assert!(fixture.installer.names().is_empty());

        job.update_packages(&["hello"], TransactionFlags::default())
            .await
            .unwrap();
        assert_eq!(fixture.installer.names(), ["hello"]);
    }

    #[tokio::test]
    async fn test_remove_and_kernel_restart() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Install, TransactionFlags::default()).await.unwrap();

        job.install_packages(&["linux-image-6"], TransactionFlags::default())
            .await
            .unwrap();
        let restarts: Vec<(RestartKind, String)> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Job(JobEvent::RequireRestart { kind, package_id }) => Some((kind, package_id)),
                _ => None,
            })
            .collect();
        assert_eq!(
            restarts,
            [(RestartKind::System, "linux-image-6;6.1;amd64;debian-stable-main".to_string())]
        );

        let (mut job, _rx) = fixture.job();
        job.init(Role::Remove, TransactionFlags::default()).await.unwrap();
        let result = job
            .remove_packages(&["oldtool"], TransactionFlags::default())
            .await
            .unwrap();
        assert_eq!(result.outcome, TransactionOutcome::Installed);
        assert_eq!(fixture.installer.names().last().map(String::as_str), Some("oldtool"));
    }

    #[tokio::test]
    async fn test_unknown_package_reports_one_error() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Install, TransactionFlags::default()).await.unwrap();
        drain(&mut rx);

        let err = job
            .install_packages(&["does-not-exist"], TransactionFlags::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PackageNotFound);
        assert_eq!(error_codes(&drain(&mut rx)), [ErrorCode::PackageNotFound.as_str()]);
    }

    #[tokio::test]
    async fn test_repair_role_accepts_broken_cache() {
        let status = format!("{STATUS}\nPackage: app\nStatus: install ok installed\nArchitecture: amd64\nVersion: 1.0\nDepends: gone-lib\nDescription: broken\n");
        let fixture = Fixture::with_status(&status);
        let (mut job, _rx) = fixture.job();

        job.init(Role::RepairSystem, TransactionFlags::simulate()).await.unwrap();
        assert!(job.cache().unwrap().cache().broken_count() > 0);
    }

    #[tokio::test]
    async fn test_refresh_reloads_under_lock() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();

        job.refresh_cache().await.unwrap();
        assert_eq!(fixture.index.refresh_count(), 1);
        assert_eq!(fixture.index.load_count(), 2);
        assert!(job.cache().unwrap().is_locked());
        assert_eq!(
            statuses(&drain(&mut rx)),
            [Status::LoadingCache, Status::RefreshCache, Status::LoadingCache]
        );
    }

    #[tokio::test]
    async fn test_mark_auto_installed() {
        let fixture = Fixture::new();
        let (mut job, _rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();

        let marked = job.mark_auto_installed(&["oldtool"]).unwrap();
        assert!(marked >= 1);
        let cache = job.cache().unwrap();
        let pk = cache.store().find_by_name("oldtool").unwrap();
        assert!(cache.cache().is_auto(pk));
    }

    #[tokio::test]
    async fn test_emit_packages_resolves_unknown_info() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();
        drain(&mut rx);

        let found = job.resolve(&["hello"], FilterSet::none()).unwrap();
        assert_eq!(job.emit_packages(found, FilterSet::none(), InfoKind::Unknown, false).unwrap(), 2);
        assert_eq!(
            emitted(&drain(&mut rx)),
            [
                (InfoKind::Installed, "hello;1.0;amd64;installed:local".to_string()),
                (InfoKind::Available, "hello;2.0;amd64;debian-stable-main".to_string()),
            ]
        );

        // Older versions only, through the multi-version expansion
        let candidate = job
            .resolve(&["hello"], FilterSet::none().with(Filter::NotInstalled))
            .unwrap();
        let older = FilterSet::none().with(Filter::NotNewest);
        assert_eq!(job.emit_packages(candidate, older, InfoKind::Unknown, true).unwrap(), 1);
        assert_eq!(
            emitted(&drain(&mut rx)),
            [(InfoKind::Installed, "hello;1.0;amd64;installed:local".to_string())]
        );
    }

    #[tokio::test]
    async fn test_downloaded_filter() {
        let fixture = Fixture::new();
        std::fs::write(fixture.archives().join("hello_2.0_amd64.deb"), b"12345").unwrap();
        let (mut job, _rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();

        let downloaded = job
            .resolve(&["hello", "newpkg"], FilterSet::none().with(Filter::Downloaded))
            .unwrap();
        assert_eq!(ids(&job, &downloaded), ["hello;2.0;amd64;debian-stable-main"]);

        let missing = job
            .resolve(&["newpkg"], FilterSet::none().with(Filter::NotDownloaded))
            .unwrap();
        assert_eq!(ids(&job, &missing), ["newpkg;1.0;amd64;debian-stable-main"]);
    }

    #[tokio::test]
    async fn test_updates_and_details() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();
        drain(&mut rx);

        let buckets = job.get_updates(FilterSet::none()).unwrap();
        assert_eq!(ids(&job, &buckets.updates), ["hello;2.0;amd64;debian-stable-main"]);
        assert_eq!(
            emitted(&drain(&mut rx)),
            [(InfoKind::Normal, "hello;2.0;amd64;debian-stable-main".to_string())]
        );

        let details = job
            .get_update_detail(&["hello;2.0;amd64;debian-stable-main"])
            .await
            .unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].changelog, CHANGELOG_UNAVAILABLE);
        assert_eq!(details[0].updates, ["hello;1.0;amd64;installed:local"]);

        let events = drain(&mut rx);
        assert_eq!(statuses(&events), [Status::Query]);
        assert!(events
            .iter()
            .any(|e| matches!(e, AppEvent::Package(PackageEvent::UpdateDetail(_)))));

        let details = job.get_details(&["libnew"]).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].size, 4);
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, AppEvent::Package(PackageEvent::Details(d)) if d.package_id.starts_with("libnew;"))));
    }

    #[tokio::test]
    async fn test_depends_and_requires() {
        let fixture = Fixture::new();
        let (mut job, _rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();

        let depends = job.get_depends(&["newpkg"], FilterSet::none(), false).unwrap();
        assert_eq!(ids(&job, &depends), ["libnew;1.0;amd64;debian-stable-main"]);

        let requires = job.get_requires(&["libnew"], FilterSet::none(), true).unwrap();
        assert_eq!(ids(&job, &requires), ["newpkg;1.0;amd64;debian-stable-main"]);
    }

    #[tokio::test]
    async fn test_what_provides_mimetype() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();
        drain(&mut rx);

        let err = job
            .what_provides(ProvidesKind::Mimetype, &["text/x-greeting"], FilterSet::none())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(error_codes(&drain(&mut rx)).len(), 1);

        // Without a metadata index, Any still answers codec and library lookups
        assert!(job
            .what_provides(ProvidesKind::Any, &["text/x-greeting"], FilterSet::none())
            .await
            .unwrap()
            .is_empty());

        let (tx, _rx) = pkgjob_events::channel();
        let ctx = OpsContextBuilder::new()
            .with_config(fixture.config())
            .with_event_sender(tx)
            .with_index(Arc::new(fixture.index.clone()))
            .with_mime_index(Arc::new(StaticMime))
            .build()
            .unwrap();
        let mut job = Job::new(ctx);
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();
        let found = job
            .what_provides(ProvidesKind::Mimetype, &["text/x-greeting"], FilterSet::none())
            .await
            .unwrap();
        assert_eq!(ids(&job, &found), ["hello;1.0;amd64;installed:local"]);
    }

    #[tokio::test]
    async fn test_empty_group_is_rejected() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();
        drain(&mut rx);

        let err = job.search_groups(&[""], FilterSet::none()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::GroupNotFound);
        assert_eq!(error_codes(&drain(&mut rx)), [ErrorCode::GroupNotFound.as_str()]);

        let names = job.search_names(&["NEW"], FilterSet::none()).unwrap();
        assert_eq!(
            ids(&job, &names),
            ["libnew;1.0;amd64;debian-stable-main", "newpkg;1.0;amd64;debian-stable-main"]
        );
    }

    #[tokio::test]
    async fn test_finish_and_cancel() {
        let fixture = Fixture::new();
        let (mut job, mut rx) = fixture.job();
        job.init(Role::Query, TransactionFlags::default()).await.unwrap();
        drain(&mut rx);

        assert!(job.cancel());
        assert!(!job.cancel());
        assert!(job.cancel_token().is_cancelled());

        job.finish(false);
        assert!(job.cache().is_none());
        let events = drain(&mut rx);
        assert!(matches!(
            events.last(),
            Some(AppEvent::Job(JobEvent::Finished { success: false }))
        ));
        assert!(statuses(&events).contains(&Status::Finished));
    }
}
