//! Properties of the priority queue between classification and dispatch

use std::path::PathBuf;

use chrono::{DateTime, Local, TimeZone};
use proptest::prelude::*;
use revwatch::watcher::{EventKind, EventQueue, FileEvent};

fn kind_strategy() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::Modified),
        Just(EventKind::Deleted),
        Just(EventKind::Created),
        Just(EventKind::FolderDeleted),
    ]
}

fn event_strategy() -> impl Strategy<Value = FileEvent> {
    (kind_strategy(), "[a-z]{1,6}", 0i64..10_000).prop_map(|(kind, name, ms)| {
        let at: DateTime<Local> = Local
            .timestamp_millis_opt(1_700_000_000_000 + ms)
            .unwrap();
        FileEvent::new(PathBuf::from(format!("/data/{name}.txt")), kind, at)
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    /// PROPERTY: Draining yields kinds in priority order, whatever the push order
    #[test]
    fn property_drain_is_priority_ordered(events in prop::collection::vec(event_strategy(), 0..40)) {
        let queue = EventQueue::new();
        queue.extend(events.clone());

        let drained: Vec<FileEvent> = queue.drain().collect();
        let priorities: Vec<u8> = drained.iter().map(|e| e.kind.priority()).collect();

        prop_assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(drained.len(), events.len());
        prop_assert!(queue.is_empty());
    }

    /// PROPERTY: Nothing is lost or invented by the queue
    #[test]
    fn property_drain_is_a_permutation(events in prop::collection::vec(event_strategy(), 0..40)) {
        let queue = EventQueue::new();
        for event in &events {
            queue.push(event.clone());
        }

        let mut drained: Vec<FileEvent> = queue.drain().collect();
        let mut expected = events;
        drained.sort();
        expected.sort();

        prop_assert_eq!(drained, expected);
    }
}
