//! Scenario: a single file is created, edited and removed
//!
//! **Journey**: Watch an empty directory, drop a file in, change it, delete it.
//!
//! **Steps**:
//! 1. Start watching an empty root
//! 2. Move `a.txt` ("v1") into the root
//! 3. Overwrite `a.txt` with "v2"
//! 4. Delete `a.txt`
//!
//! **Success Criteria**:
//! - `created/` holds the first content
//! - `modified/` holds the content before the edit
//! - `deleted/` holds the last known content
//! - The version store itself never produces artifacts

use std::fs;

use crate::common::*;
use revwatch::{EventKind, VersionEvent};

#[test]
fn scenario_create_modify_delete() {
    let env = WatchEnv::start();

    // Step 2: creation is versioned with the new content
    env.put("a.txt", "v1");
    wait_until("created artifact", || {
        env.artifact_contents("created", "a") == vec!["v1".to_string()]
    });
    wait_until("a.txt tracked", || env.tracks("a.txt", "v1"));

    // Step 3: modification is versioned with the previous content
    fs::write(env.path("a.txt"), "v2").unwrap();
    wait_until("a.txt tracked with new content", || env.tracks("a.txt", "v2"));
    wait_until("modified artifact", || {
        env.artifact_contents("modified", "a")
            .contains(&"v1".to_string())
    });

    // Step 4: deletion is versioned with the last known content
    fs::remove_file(env.path("a.txt")).unwrap();
    wait_until("deleted artifact", || {
        env.artifact_contents("deleted", "a") == vec!["v2".to_string()]
    });
    assert!(!env.snapshot().contains(&env.path("a.txt")));

    let events = env.stop();
    assert!(matches!(events.last(), Some(VersionEvent::Shutdown)));

    let versioned: Vec<(EventKind, String)> = events
        .iter()
        .filter_map(|e| match e {
            VersionEvent::Versioned { kind, path, .. } => Some((*kind, path.clone())),
            _ => None,
        })
        .collect();
    assert!(versioned.contains(&(EventKind::Created, "a.txt".to_string())));
    assert!(versioned.contains(&(EventKind::Deleted, "a.txt".to_string())));
    assert!(versioned.iter().all(|(_, path)| !path.starts_with("versions")));
}

#[test]
fn scenario_existing_files_are_baseline() {
    let env = WatchEnv::start_with(|root| {
        fs::write(root.join("notes.md"), "draft").unwrap();
        fs::create_dir(root.join("docs")).unwrap();
        fs::write(root.join("docs").join("plan.txt"), "old plan").unwrap();
    });

    // No artifacts for what was already there
    assert!(env.artifacts("created").is_empty());
    assert!(env.tracks("notes.md", "draft"));
    assert!(env.tracks("docs/plan.txt", "old plan"));
    assert!(env.registrar().is_registered(&env.path("docs")));

    // A pre-existing nested file is versioned on change like any other
    fs::write(env.path("docs/plan.txt"), "new plan").unwrap();
    wait_until("plan versioned", || {
        env.artifact_contents("modified", "plan")
            .contains(&"old plan".to_string())
    });
}

#[test]
fn scenario_replacing_a_file_keeps_old_content() {
    let env = WatchEnv::start_with(|root| {
        fs::write(root.join("report.csv"), "q1").unwrap();
    });

    // Renaming over a tracked file replaces its content in one step
    env.put("report.csv", "q2");
    wait_until("report tracked with new content", || {
        env.tracks("report.csv", "q2")
    });
    wait_until("previous content versioned", || {
        env.artifact_contents("modified", "report")
            .contains(&"q1".to_string())
    });
}

#[test]
fn scenario_shutdown_reports_start_and_stop() {
    let env = WatchEnv::start_with(|root| {
        fs::write(root.join("a.txt"), "x").unwrap();
    });
    let root = env.root.display().to_string();

    let events = env.stop();

    match events.first() {
        Some(VersionEvent::WatchStarted {
            root: reported,
            tracked_files,
            watched_directories,
        }) => {
            assert_eq!(reported, &root);
            assert_eq!(*tracked_files, 1);
            assert_eq!(*watched_directories, 1);
        }
        other => panic!("expected watch_started first, got {other:?}"),
    }
    assert!(matches!(events.last(), Some(VersionEvent::Shutdown)));
}
