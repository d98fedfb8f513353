//! Properties of directory-creation debouncing

use std::path::Path;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use revwatch::watcher::Debouncer;

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    /// PROPERTY: A repeat is accepted only once the window has passed
    #[test]
    fn property_repeat_accepted_after_window(gap_ms in 0u64..2_000) {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let start = Instant::now();
        let dir = Path::new("/data/sub");

        prop_assert!(debouncer.accept(dir, start));
        let second = debouncer.accept(dir, start + Duration::from_millis(gap_ms));

        prop_assert_eq!(second, gap_ms > 500);
    }

    /// PROPERTY: Paths are debounced independently
    #[test]
    fn property_paths_independent(names in prop::collection::hash_set("[a-z]{1,8}", 1..20)) {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let now = Instant::now();

        for name in &names {
            prop_assert!(debouncer.accept(&Path::new("/data").join(name), now));
        }
        prop_assert_eq!(debouncer.len(), names.len());
    }

    /// PROPERTY: Within one window, bursts of the same path yield one acceptance
    #[test]
    fn property_burst_accepted_once(offsets in prop::collection::vec(0u64..=500, 1..30)) {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let start = Instant::now();
        let dir = Path::new("/data/burst");

        let mut sorted = offsets;
        sorted.sort_unstable();
        let accepted = std::iter::once(0)
            .chain(sorted)
            .filter(|ms| debouncer.accept(dir, start + Duration::from_millis(*ms)))
            .count();

        prop_assert_eq!(accepted, 1);
    }
}
