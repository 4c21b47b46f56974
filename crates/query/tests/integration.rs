//! Integration tests for query

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pkgjob_errors::{Error, ErrorCode};
    use pkgjob_platform::CancelToken;
    use pkgjob_query::*;
    use pkgjob_resolver::{CacheOptions, DepCache};
    use pkgjob_store::{archive_file_name, repo_origin, PackageStore, StoreBuilder, VersionKey};
    use pkgjob_types::{Filter, FilterSet, RestartKind, UpdateState, Version};
    use proptest::prelude::*;

    const STATUS: &str = "\
Package: editor
Status: install ok installed
Architecture: amd64
Version: 1.0
Section: editors
Installed-Size: 10
Depends: libtext
Description: a text editor
 Edits text.

Package: libtext
Status: install ok installed
Architecture: amd64
Version: 1.0
Section: libs
Installed-Size: 4
Description: text library

Package: viewer
Status: install ok installed
Architecture: amd64
Version: 1.0
Section: graphics
Description: image viewer

Package: frozen
Status: hold ok installed
Architecture: amd64
Version: 1.0
Section: utils
Description: pinned tool
";

    const LIST: &str = "\
Package: editor
Architecture: amd64
Version: 1.0
Section: editors
Size: 100
Installed-Size: 10
Depends: libtext
Filename: pool/e/editor_1.0_amd64.deb
Description: a text editor
 Edits text.

Package: editor
Architecture: amd64
Version: 2.0
Section: editors
Size: 120
Installed-Size: 12
Depends: libtext (>= 2.0)
Obsoletes: oldedit
Filename: pool/e/editor_2.0_amd64.deb
Description: a text editor
 Edits text faster.

Package: libtext
Architecture: amd64
Version: 2.0
Section: libs
Size: 40
Filename: pool/l/libtext_2.0_amd64.deb
Description: text library

Package: libtext-devel
Architecture: amd64
Version: 2.0
Section: Development/C
Size: 50
Depends: libtext (= 2.0)
Filename: pool/l/libtext-devel_2.0_amd64.deb
Description: text library headers

Package: viewer
Architecture: amd64
Version: 2.0
Section: graphics
Depends: missing-lib
Filename: pool/v/viewer_2.0_amd64.deb
Description: image viewer

Package: frozen
Architecture: amd64
Version: 2.0
Section: utils
Filename: pool/f/frozen_2.0_amd64.deb
Description: pinned tool

Package: paint
Architecture: amd64
Version: 3.0
Section: non-free/graphics
Size: 5
Provides: image-editor
Filename: pool/p/paint_3.0_amd64.deb
Gstreamer-Version: 1.0
Gstreamer-Elements: pngdec, jpegdec
Description: painting program
 Draws pictures.

Package: paint-dbgsym
Architecture: amd64
Version: 3.0
Section: debug
Filename: pool/p/paint-dbgsym_3.0_amd64.deb
Gstreamer-Version: 1.0
Gstreamer-Elements: pngdec
Description: debug symbols for paint

Package: libgl2-3
Architecture: amd64
Version: 3.0
Section: libs
Filename: pool/l/libgl2-3_3.0_amd64.deb
Description: GL library

Package: wine32
Architecture: i386
Version: 9.0
Section: otherosfs
Filename: pool/w/wine32_9.0_i386.deb
Description: compatibility layer
";

    fn store() -> Arc<PackageStore> {
        let origin = repo_origin("Debian", "stable", "main", "http://deb.example.org/debian");
        let mut builder = StoreBuilder::new("amd64");
        builder.add_status(STATUS).unwrap();
        builder.add_list(LIST, &origin).unwrap();
        Arc::new(builder.build())
    }

    fn names(store: &PackageStore, versions: &[VersionKey]) -> Vec<String> {
        versions
            .iter()
            .map(|&vk| {
                let ver = store.version(vk);
                format!("{}-{}", store.owner(vk).name, ver.version)
            })
            .collect()
    }

    fn candidate(store: &PackageStore, name: &str) -> VersionKey {
        store.candidate_version(store.find_by_name(name).unwrap()).unwrap()
    }

    fn current(store: &PackageStore, name: &str) -> VersionKey {
        store.current_version(store.find_by_name(name).unwrap()).unwrap()
    }

    #[test]
    fn test_filters() {
        let store = store();
        let query = Query::new(&store);
        let all = query.get_packages();

        let installed = query.filter(all.clone(), FilterSet::none().with(Filter::Installed));
        assert_eq!(
            names(&store, &installed),
            ["editor-1.0", "frozen-1.0", "libtext-1.0", "viewer-1.0"]
        );

        let devel = query.filter(all.clone(), FilterSet::none().with(Filter::Development));
        assert_eq!(names(&store, &devel), ["libtext-devel-2.0"]);

        let gui = query.filter(all.clone(), FilterSet::none().with(Filter::Gui));
        assert_eq!(names(&store, &gui), ["paint-3.0", "viewer-1.0"]);

        let non_free = query.filter(all.clone(), FilterSet::none().with(Filter::NotFree));
        assert!(names(&store, &non_free).contains(&"paint-3.0".to_string()));

        let foreign = query.filter(all.clone(), FilterSet::none().with(Filter::NotArch));
        assert_eq!(names(&store, &foreign), ["wine32-9.0"]);

        let combined = query.filter(
            all,
            FilterSet::none().with(Filter::NotInstalled).with(Filter::Gui),
        );
        assert_eq!(names(&store, &combined), ["paint-3.0"]);
    }

    #[test]
    fn test_positive_filter_wins_over_its_negation() {
        let store = store();
        let query = Query::new(&store);
        let all = query.get_packages();

        let both = FilterSet::none()
            .with(Filter::Development)
            .with(Filter::NotDevelopment);
        assert_eq!(names(&store, &query.filter(all.clone(), both)), ["libtext-devel-2.0"]);

        let both = FilterSet::none().with(Filter::NotGui).with(Filter::Gui);
        assert_eq!(names(&store, &query.filter(all.clone(), both)), ["paint-3.0", "viewer-1.0"]);

        let both = FilterSet::none().with(Filter::Free).with(Filter::NotFree);
        assert_eq!(
            query.filter(all.clone(), both),
            query.filter(all, FilterSet::none().with(Filter::Free))
        );
    }

    const FAMILIES: [(Filter, Filter); 5] = [
        (Filter::Installed, Filter::NotInstalled),
        (Filter::Development, Filter::NotDevelopment),
        (Filter::Gui, Filter::NotGui),
        (Filter::Free, Filter::NotFree),
        (Filter::Arch, Filter::NotArch),
    ];

    /// (installed, devel, gui, free, arch index) per package
    fn generated_store(packages: &[(bool, bool, bool, bool, usize)]) -> PackageStore {
        let mut status = String::new();
        let mut list = String::new();
        for (i, &(installed, devel, gui, free, arch)) in packages.iter().enumerate() {
            let name = format!("pkg{i}{}", if devel { "-devel" } else { "" });
            let arch = ["amd64", "i386", "all"][arch];
            let section = format!(
                "{}{}",
                if free { "" } else { "non-free/" },
                if gui { "x11" } else { "utils" }
            );
            let record = format!("Package: {name}\nArchitecture: {arch}\nVersion: 1.0\nSection: {section}\n");
            if installed {
                status.push_str(&format!("{record}Status: install ok installed\nDescription: generated\n\n"));
            }
            list.push_str(&format!("{record}Filename: pool/{name}_1.0_{arch}.deb\nDescription: generated\n\n"));
        }

        let mut builder = StoreBuilder::new("amd64");
        builder.add_status(&status).unwrap();
        builder
            .add_list(&list, &repo_origin("Debian", "stable", "main", "http://deb.example.org/debian"))
            .unwrap();
        builder.build()
    }

    proptest! {
        #[test]
        fn combined_filters_intersect(
            packages in prop::collection::vec(
                (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), 0usize..3),
                1..8,
            ),
            first in 0usize..5,
            second in 0usize..5,
            first_negated in any::<bool>(),
            second_negated in any::<bool>(),
        ) {
            prop_assume!(first != second);
            let pick = |family: usize, negated: bool| {
                let (positive, negative) = FAMILIES[family];
                if negated { negative } else { positive }
            };
            let (a, b) = (pick(first, first_negated), pick(second, second_negated));

            let store = generated_store(&packages);
            let query = Query::new(&store);
            let all = query.get_packages();

            let only_a = query.filter(all.clone(), FilterSet::none().with(a));
            let only_b = query.filter(all.clone(), FilterSet::none().with(b));
            let combined = query.filter(all, FilterSet::none().with(a).with(b));

            let expected: Vec<VersionKey> = only_a.into_iter().filter(|vk| only_b.contains(vk)).collect();
            prop_assert_eq!(combined, expected);
        }
    }

    #[test]
    fn test_sort_and_dedup() {
        let store = store();
        let mut versions = vec![
            candidate(&store, "paint"),
            current(&store, "editor"),
            candidate(&store, "editor"),
            candidate(&store, "paint"),
        ];
        sort_and_dedup(&store, &mut versions);
        assert_eq!(names(&store, &versions), ["editor-1.0", "editor-2.0", "paint-3.0"]);
    }

    #[test]
    fn test_emission_versions() {
        let store = store();
        let editor = candidate(&store, "editor");

        let all = emission_versions(&store, &[editor], FilterSet::none(), true);
        assert_eq!(names(&store, &all), ["editor-2.0", "editor-1.0"]);

        let newest = emission_versions(&store, &[editor], FilterSet::none().with(Filter::Newest), true);
        assert_eq!(names(&store, &newest), ["editor-2.0"]);

        let older = emission_versions(&store, &[editor], FilterSet::none().with(Filter::NotNewest), true);
        assert_eq!(names(&store, &older), ["editor-1.0"]);

        let single = emission_versions(&store, &[editor], FilterSet::none(), false);
        assert_eq!(names(&store, &single), ["editor-2.0"]);
    }

    #[test]
    fn test_search() {
        let store = store();
        let query = Query::new(&store);

        let hits = query.search_names(&["LIBTEXT"]);
        assert_eq!(names(&store, &hits), ["libtext-1.0", "libtext-devel-2.0"]);

        // Virtual names resolve to their providers
        let virtual_hits = query.search_names(&["image-editor"]);
        assert_eq!(names(&store, &virtual_hits), ["paint-3.0"]);

        // Dependency-only names are never listed
        assert!(query.search_names(&["missing-lib"]).is_empty());

        let details = query.search_details(&["draws"]);
        assert_eq!(names(&store, &details), ["paint-3.0"]);
        assert!(query.search_names(&["draws"]).is_empty());
    }

    #[test]
    fn test_cancelled_search_stops() {
        let store = store();
        let cancel = CancelToken::new(None);
        cancel.cancel();
        let query = Query::new(&store).with_cancel(&cancel);
        assert!(query.search_names(&["e"]).is_empty());
        assert!(query.get_packages().is_empty());
    }

    #[test]
    fn test_groups() {
        let store = store();
        let query = Query::new(&store);

        let programming = query.get_packages_from_group(&["programming"]).unwrap();
        assert_eq!(names(&store, &programming), ["libtext-devel-2.0"]);

        let err = query.get_packages_from_group(&[""]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::GroupNotFound);
        assert_eq!(err.to_string(), "query error: An empty group was received");
    }

    #[test]
    fn test_packages_from_repo() {
        let store = store();
        let query = Query::new(&store);
        let found = query.get_packages_from_repo("stable", &["main"], "http://deb.example.org/debian/");
        // Versions only known from the status database came from no repository
        assert_eq!(names(&store, &found), ["editor-1.0"]);
        assert!(query
            .get_packages_from_repo("testing", &["main"], "http://deb.example.org/debian")
            .is_empty());
    }

    #[test]
    fn test_provides_library_and_codec() {
        let store = store();
        let query = Query::new(&store);

        let libs = query.provides_library(&["libGL2.so.3", "notalib.so.1"]);
        assert_eq!(names(&store, &libs), ["libgl2-3-3.0"]);

        // The debug package carries the same metadata but is skipped
        let codecs = query.provides_codec(&["gstreamer1(element-pngdec)"]);
        assert_eq!(names(&store, &codecs), ["paint-3.0"]);
        assert!(query.provides_codec(&["not-a-codec"]).is_empty());
    }

    struct StaticMimeIndex {
        fail: bool,
    }

    #[async_trait]
    impl MimeIndex for StaticMimeIndex {
        async fn load(&self) -> Result<(), String> {
            if self.fail {
                Err("pool is empty".to_string())
            } else {
                Ok(())
            }
        }

        fn components_for(&self, mimetype: &str) -> Vec<MimeComponent> {
            if mimetype != "image/png" {
                return Vec::new();
            }
            vec![
                MimeComponent {
                    id: "org.example.Paint".to_string(),
                    package: Some("paint".to_string()),
                },
                MimeComponent {
                    id: "org.example.Orphan".to_string(),
                    package: None,
                },
                MimeComponent {
                    id: "org.example.Gone".to_string(),
                    package: Some("no-such-package".to_string()),
                },
            ]
        }
    }

    #[tokio::test]
    async fn test_provides_mimetype() {
        let store = store();
        let query = Query::new(&store);

        let found = query
            .provides_mimetype(&["image/png"], &StaticMimeIndex { fail: false })
            .await
            .unwrap();
        assert_eq!(names(&store, &found), ["paint-3.0"]);

        let err = query
            .provides_mimetype(&["image/png"], &StaticMimeIndex { fail: true })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
        assert_eq!(err.to_string(), "internal error: Failed to load AppStream metadata: pool is empty");
    }

    #[test]
    fn test_depends_and_requires() {
        let store = store();
        let query = Query::new(&store);

        let devel = candidate(&store, "libtext-devel");
        assert_eq!(names(&store, &query.get_depends(devel, false)), ["libtext-1.0"]);

        let libtext = current(&store, "libtext");
        let direct = query.get_requires(libtext, false);
        assert_eq!(names(&store, &direct), ["editor-1.0", "libtext-devel-2.0"]);

        // Versions other than the listed one have no dependents
        let newer = candidate(&store, "libtext");
        assert!(query.get_requires(newer, true).is_empty());
    }

    #[test]
    fn test_details() {
        let store = store();
        let query = Query::new(&store);
        let details = query.get_details(vec![candidate(&store, "paint"), current(&store, "editor")]);

        assert_eq!(details.len(), 2);
        let editor = &details[0];
        assert!(editor.package_id.starts_with("editor;1.0;amd64;installed"));
        assert_eq!(editor.size, 10 * 1024);
        assert_eq!(editor.description, "Edits text.");

        let paint = &details[1];
        assert_eq!(paint.package_id, "paint;3.0;amd64;debian-stable-main");
        assert_eq!(paint.size, 5);
        assert_eq!(paint.summary, "painting program");
    }

    #[test]
    fn test_update_buckets() {
        let store = store();
        let cache = DepCache::new(Arc::clone(&store), CacheOptions::default());
        let buckets = UpdateBuckets::collect(&cache);

        assert_eq!(names(&store, &buckets.updates), ["editor-2.0", "libtext-2.0"]);
        assert_eq!(names(&store, &buckets.blocked), ["viewer-2.0"]);
        assert!(buckets.installs.is_empty());
        assert!(buckets.removals.is_empty());
        // The snapshot is throwaway
        assert_eq!(cache.inst_count(), 0);
    }

    struct FixedChangelog;

    #[async_trait]
    impl ChangelogSource for FixedChangelog {
        async fn fetch(&self, source: &str, _version: &Version) -> Result<String, Error> {
            Ok(format!(
                "{source} (2.0) stable; urgency=low\n\n  * Faster editing (Closes: #77)\n\n -- Dev <dev@example.org>  Tue, 02 Jan 2024 10:00:00 +0000\n\n{source} (1.0) stable; urgency=low\n\n  * First release\n"
            ))
        }
    }

    #[tokio::test]
    async fn test_update_detail() {
        let store = store();
        let editor = candidate(&store, "editor");

        let detail = update_detail(&store, editor, Some(&FixedChangelog)).await;
        assert_eq!(detail.package_id, "editor;2.0;amd64;debian-stable-main");
        assert_eq!(detail.updates.len(), 1);
        assert!(detail.updates[0].starts_with("editor;1.0;amd64;installed"));
        assert_eq!(detail.obsoletes, ["oldedit"]);
        assert_eq!(detail.state, UpdateState::Stable);
        assert_eq!(detail.restart, RestartKind::None);
        assert_eq!(detail.update_text, " == 2.0 ==\n * Faster editing (Closes: #77)");
        assert_eq!(
            detail.bugzilla_urls,
            ["https://bugs.debian.org/cgi-bin/bugreport.cgi?bug=77"]
        );
        assert!(detail.issued.is_some());
        assert_eq!(detail.updated, None);

        let offline = update_detail(&store, editor, None).await;
        assert_eq!(offline.changelog, CHANGELOG_UNAVAILABLE);
        assert!(offline.update_text.is_empty());
    }

    #[test]
    fn test_downloaded_filter() {
        let store = store();
        let cache = DepCache::new(Arc::clone(&store), CacheOptions::default());
        let archives = tempfile::tempdir().unwrap();

        let paint = candidate(&store, "paint");
        let libgl = candidate(&store, "libgl2-3");
        let name = archive_file_name("paint", store.version(paint));
        assert_eq!(name, "paint_3.0_amd64.deb");
        std::fs::write(archives.path().join(name), b"12345").unwrap();

        let downloaded = filter_downloaded(&cache, &[paint, libgl], archives.path(), true);
        assert_eq!(names(&store, &downloaded), ["paint-3.0"]);

        let missing = filter_downloaded(&cache, &[paint, libgl], archives.path(), false);
        assert_eq!(names(&store, &missing), ["libgl2-3-3.0"]);

        // A short file is only partial
        std::fs::write(archives.path().join("paint_3.0_amd64.deb"), b"12").unwrap();
        assert!(filter_downloaded(&cache, &[paint], archives.path(), true).is_empty());
        assert_eq!(cache.inst_count(), 0);
    }
}
