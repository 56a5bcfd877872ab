//! Property tests for the differential planner.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crship::domain::entities::{FileRecord, LocalTree, PlanAction, RemoteListing};
use crship::domain::services::{plan, PlanConfig};
use crship::RelPath;

fn path_segment() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,6}").unwrap()
}

fn rel_path() -> impl Strategy<Value = String> {
    proptest::collection::vec(path_segment(), 1..=3).prop_map(|segments| segments.join("/"))
}

/// path -> (size, mtime)
fn file_set() -> impl Strategy<Value = BTreeMap<String, (u64, i64)>> {
    proptest::collection::btree_map(rel_path(), (0u64..4096, 1_600_000_000i64..1_700_000_000), 0..24)
}

fn local_tree(files: &BTreeMap<String, (u64, i64)>) -> LocalTree {
    let mut tree = LocalTree::new("/project");
    for (path, (size, mtime)) in files {
        let rel = RelPath::new(path).unwrap();
        tree.insert(FileRecord::new(rel, *size, Some(*mtime)));
    }
    tree
}

/// The remote state after every local file has been uploaded
fn mirrored(local: &LocalTree) -> RemoteListing {
    let mut remote = RemoteListing::empty_root();
    for record in local.files.values() {
        remote.insert(record.clone());
    }
    remote.dirs = local.dirs.clone();
    remote
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: every local file appears in the plan exactly once, in path order.
    #[test]
    fn property_one_entry_per_local_file(
        local in file_set(),
        remote in file_set(),
        delete in any::<bool>(),
    ) {
        let local = local_tree(&local);
        let mut listing = RemoteListing::empty_root();
        for (path, (size, mtime)) in &remote {
            listing.insert(FileRecord::new(RelPath::new(path).unwrap(), *size, Some(*mtime)));
        }
        let config = PlanConfig { delete_extraneous: delete, ..PlanConfig::default() };

        let result = plan(&local, &listing, &config);

        let local_entries: Vec<_> = result
            .entries
            .iter()
            .filter(|e| e.action != PlanAction::Delete)
            .map(|e| e.path.clone())
            .collect();
        let expected: Vec<_> = local.files.keys().cloned().collect();
        prop_assert_eq!(local_entries, expected);

        for entry in result.deletes() {
            prop_assert!(delete);
            prop_assert!(!local.files.contains_key(&entry.path));
            prop_assert!(local.covers(&entry.path));
        }
    }

    /// PROPERTY: planning against a mirror of the local tree transfers nothing.
    #[test]
    fn property_rerun_after_upload_is_all_skip(local in file_set()) {
        let local = local_tree(&local);
        let remote = mirrored(&local);

        let result = plan(&local, &remote, &PlanConfig::default());

        prop_assert!(result.is_noop());
        prop_assert_eq!(result.skips().count(), local.len());
        prop_assert!(result.directories.is_empty());
    }

    /// PROPERTY: a size difference always means upload, whatever the timestamps say.
    #[test]
    fn property_size_difference_forces_upload(
        local in file_set(),
        bump in 1u64..1024,
    ) {
        let local = local_tree(&local);
        let mut remote = mirrored(&local);
        for record in remote.files.values_mut() {
            record.size += bump;
        }

        let result = plan(&local, &remote, &PlanConfig::default());

        prop_assert_eq!(result.uploads().count(), local.len());
    }

    /// PROPERTY: missing directories are listed parent before child.
    #[test]
    fn property_directories_parent_first(local in file_set()) {
        let local = local_tree(&local);
        let result = plan(&local, &RemoteListing::missing_root(), &PlanConfig::default());

        for (i, dir) in result.directories.iter().enumerate() {
            for ancestor in dir.ancestors() {
                let pos = result.directories.iter().position(|d| *d == ancestor);
                prop_assert!(matches!(pos, Some(p) if p < i));
            }
        }
    }
}
