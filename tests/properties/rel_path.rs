//! Property tests for project-relative paths.

use proptest::prelude::*;

use crship::RelPath;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: parsing never panics and accepted paths are normalized.
    #[test]
    fn property_rel_path_normalizes(input in "[a-z./]{0,32}") {
        if let Ok(path) = RelPath::new(&input) {
            let s = path.as_str();
            prop_assert!(!s.starts_with('/'));
            prop_assert!(!s.ends_with('/'));
            prop_assert!(!s.contains("//"));
            prop_assert!(s.split('/').all(|seg| seg != "." && seg != ".."));
            // Parsing is idempotent
            prop_assert_eq!(RelPath::new(s).unwrap(), path.clone());
        }
    }

    /// PROPERTY: a path under a remote root never escapes it.
    #[test]
    fn property_under_stays_below_root(
        segments in proptest::collection::vec("[a-z0-9_.-]{1,8}", 1..5),
        root in prop_oneof![Just("/www"), Just("/www/"), Just("/")],
    ) {
        if let Ok(path) = RelPath::new(&segments.join("/")) {
            let remote = path.under(root);
            let prefix = root.trim_end_matches('/');
            let expected_prefix = format!("{}/", prefix);
            prop_assert!(remote.starts_with(&expected_prefix));
            prop_assert!(!remote.contains("/../"));
        }
    }
}
