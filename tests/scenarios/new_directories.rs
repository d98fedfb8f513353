//! Scenario: directories appear and disappear while watching
//!
//! **Journey**: Move a populated folder into the root, then delete it.
//!
//! **Steps**:
//! 1. Start watching an empty root
//! 2. Move `sub/` containing `b.txt` and `deep/c.txt` into the root
//! 3. Remove `sub/` recursively
//!
//! **Success Criteria**:
//! - Every directory in the new tree is registered
//! - Files that arrived with the folder get `created/` artifacts
//! - Removing the folder writes one `deleted/` artifact per tracked file
//! - The removed tree is no longer registered

use std::fs;

use crate::common::*;
use revwatch::VersionEvent;

#[test]
fn scenario_populated_directory_then_removal() {
    let env = WatchEnv::start();

    // Step 2
    env.put_tree("sub", &[("b.txt", "x"), ("deep/c.txt", "y")]);
    wait_until("sub registered", || {
        env.registrar().is_registered(&env.path("sub"))
            && env.registrar().is_registered(&env.path("sub/deep"))
    });
    wait_until("b.txt versioned", || {
        env.artifact_contents("created", "b") == vec!["x".to_string()]
    });
    wait_until("c.txt versioned", || {
        env.artifact_contents("created", "c") == vec!["y".to_string()]
    });
    assert!(env.tracks("sub/b.txt", "x"));
    assert!(env.tracks("sub/deep/c.txt", "y"));
    env.wait_for("registration reported", |events| {
        events.iter().any(|e| {
            matches!(e, VersionEvent::DirectoryRegistered { path } if path == "sub")
        })
    });

    // Step 3
    fs::remove_dir_all(env.path("sub")).unwrap();
    wait_until("deleted artifacts", || {
        env.artifact_contents("deleted", "b") == vec!["x".to_string()]
            && env.artifact_contents("deleted", "c") == vec!["y".to_string()]
    });
    wait_until("sub forgotten", || {
        !env.registrar().is_registered(&env.path("sub"))
    });
    assert!(!env.snapshot().contains(&env.path("sub/b.txt")));
    assert!(!env.snapshot().contains(&env.path("sub/deep/c.txt")));
}

#[test]
fn scenario_empty_directory_then_file() {
    let env = WatchEnv::start();

    fs::create_dir(env.path("inbox")).unwrap();
    wait_until("inbox registered", || {
        env.registrar().is_registered(&env.path("inbox"))
    });

    // Files added after registration are seen through the new watch
    env.put("inbox/letter.txt", "hello");
    wait_until("letter versioned", || {
        env.artifact_contents("created", "letter") == vec!["hello".to_string()]
    });
}
