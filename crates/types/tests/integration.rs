//! Integration tests for types

#[cfg(test)]
mod tests {
    use pkgjob_types::*;
    use proptest::prelude::*;

    #[test]
    fn test_restart_rule() {
        assert!(restart_required("linux-image-6.1.0-13-amd64"));
        assert!(restart_required("nvidia-driver"));
        assert!(restart_required("libc6"));
        assert!(restart_required("dbus-broker"));
        assert!(!restart_required("libc6-dev"));
        assert!(!restart_required("linux-headers-amd64"));
    }

    #[test]
    fn test_sorting_real_versions() {
        let mut versions: Vec<Version> = ["2.36-9+deb12u3", "2.36-9", "1:2.0", "2.36~rc1-1", "2.36-10"]
            .iter()
            .map(|s| Version::parse(s).unwrap())
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(Version::as_str).collect();
        assert_eq!(
            sorted,
            vec!["2.36~rc1-1", "2.36-9", "2.36-9+deb12u3", "2.36-10", "1:2.0"]
        );
    }

    #[test]
    fn test_version_serialization() {
        let v = Version::parse("1:2.3-4").unwrap();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#""1:2.3-4""#);
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    fn version_strategy() -> impl Strategy<Value = String> {
        (0u32..3, "[0-9]{1,3}(\\.[0-9a-z~+]{1,3}){0,3}", proptest::option::of("[0-9][0-9a-z.+~]{0,4}"))
            .prop_map(|(epoch, upstream, revision)| {
                let mut s = String::new();
                if epoch > 0 {
                    s.push_str(&format!("{epoch}:"));
                }
                s.push_str(&upstream);
                if let Some(rev) = revision {
                    s.push('-');
                    s.push_str(&rev);
                }
                s
            })
    }

    proptest! {
        #[test]
        fn ordering_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
            let va = Version::parse(&a).unwrap();
            let vb = Version::parse(&b).unwrap();
            prop_assert_eq!(va.cmp(&vb), vb.cmp(&va).reverse());
        }

        #[test]
        fn ordering_is_transitive(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            let mut vs = [
                Version::parse(&a).unwrap(),
                Version::parse(&b).unwrap(),
                Version::parse(&c).unwrap(),
            ];
            vs.sort();
            prop_assert!(vs[0] <= vs[1] && vs[1] <= vs[2] && vs[0] <= vs[2]);
        }

        #[test]
        fn equal_constraint_matches_itself(a in version_strategy()) {
            let v = Version::parse(&a).unwrap();
            let c = VersionConstraint::new(VersionOp::Equal, v.clone());
            prop_assert!(c.matches(&v));
            let c = VersionConstraint::new(VersionOp::Less, v.clone());
            prop_assert!(!c.matches(&v));
        }
    }

    const TOKENS: [&str; 8] = [
        "installed", "~installed", "devel", "~devel", "gui", "newest", "~downloaded", "arch",
    ];

    proptest! {
        #[test]
        fn filter_tokens_compose(picked in prop::collection::vec(prop::sample::select(TOKENS.to_vec()), 0..6)) {
            let set = FilterSet::parse(&picked.join(";"));
            for token in &picked {
                prop_assert!(set.iter().any(|f| f.as_str() == *token));
            }
            prop_assert!(set.iter().count() <= picked.len());
            prop_assert_eq!(FilterSet::parse(&set.to_string()), set);
        }
    }
}
