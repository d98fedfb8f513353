//! Properties of artifact paths in the version store

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use revwatch::watcher::versioner::artifact_path;

fn folder_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("created"), Just("modified"), Just("deleted")]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    /// PROPERTY: Artifacts land in Version_<date>/<folder>/ and keep the extension
    #[test]
    fn property_artifact_keeps_stem_and_extension(
        dirs in prop::collection::vec("[a-z]{1,5}", 0..3),
        stem in "[a-z0-9]{1,12}",
        ext in "[a-z]{1,5}",
        folder in folder_strategy(),
        hour in 0u32..24,
        ms in 0u32..1000,
    ) {
        let mut source = PathBuf::from("/data");
        source.extend(&dirs);
        source.push(format!("{stem}.{ext}"));
        let timestamp = format!("{hour:02}-30-15-{ms:03}");

        let artifact = artifact_path(Path::new("/data/versions"), &source, folder, "2024-03-09", &timestamp);

        let expected_parent = Path::new("/data/versions").join("Version_2024-03-09").join(folder);
        prop_assert_eq!(artifact.parent(), Some(expected_parent.as_path()));
        let expected_name = format!("{stem}_{timestamp}.{ext}");
        prop_assert_eq!(artifact.file_name().and_then(|n| n.to_str()), Some(expected_name.as_str()));
    }

    /// PROPERTY: Files without an extension get no trailing dot
    #[test]
    fn property_no_extension_no_dot(stem in "[a-z0-9]{1,12}", folder in folder_strategy()) {
        let source = Path::new("/data").join(&stem);

        let artifact = artifact_path(Path::new("/data/versions"), &source, folder, "2024-03-09", "08-05-07-000");

        let name = artifact.file_name().and_then(|n| n.to_str()).unwrap().to_string();
        prop_assert_eq!(name, format!("{stem}_08-05-07-000"));
        prop_assert!(artifact.extension().is_none());
    }

    /// PROPERTY: Distinct timestamps never collide for the same source
    #[test]
    fn property_distinct_timestamps_distinct_paths(a in 0u32..86_400_000, b in 0u32..86_400_000) {
        prop_assume!(a != b);
        let stamp = |t: u32| {
            format!("{:02}-{:02}-{:02}-{:03}", t / 3_600_000, t / 60_000 % 60, t / 1000 % 60, t % 1000)
        };
        let source = Path::new("/data/a.txt");
        let versions = Path::new("/data/versions");

        prop_assert_ne!(
            artifact_path(versions, source, "modified", "2024-03-09", &stamp(a)),
            artifact_path(versions, source, "modified", "2024-03-09", &stamp(b))
        );
    }
}
