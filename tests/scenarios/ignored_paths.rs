//! Scenario: paths excluded from versioning
//!
//! **Journey**: A `.revwatchignore` excludes scratch files; the version
//! store is never versioned.
//!
//! **Success Criteria**:
//! - Ignored files produce no artifacts and are not tracked
//! - Writing inside `versions/` by hand produces no artifacts

use std::fs;
use std::time::Duration;

use crate::common::*;

#[test]
fn scenario_ignore_file_excludes_matches() {
    let env = WatchEnv::start_with(|root| {
        fs::write(root.join(".revwatchignore"), "*.tmp\nscratch/\n").unwrap();
        fs::write(root.join("old.tmp"), "skip").unwrap();
    });
    assert!(!env.snapshot().contains(&env.path("old.tmp")));

    env.put("build.tmp", "noise");
    env.put("kept.txt", "signal");
    wait_until("kept.txt versioned", || {
        env.artifact_contents("created", "kept") == vec!["signal".to_string()]
    });

    // Give a late notification for the ignored file a chance to show up
    std::thread::sleep(Duration::from_millis(300));
    assert!(env.artifact_contents("created", "build").is_empty());
    assert!(!env.snapshot().contains(&env.path("build.tmp")));
}

#[test]
fn scenario_version_store_is_not_versioned() {
    let env = WatchEnv::start();

    env.put("a.txt", "v1");
    wait_until("created artifact", || {
        env.artifact_contents("created", "a").len() == 1
    });

    let stray = env.path("versions").join("stray.txt");
    fs::write(&stray, "by hand").unwrap();
    env.put("marker.txt", "m");
    wait_until("marker versioned", || {
        env.artifact_contents("created", "marker").len() == 1
    });

    std::thread::sleep(Duration::from_millis(300));
    assert!(env.artifact_contents("created", "stray").is_empty());
    assert!(!env.snapshot().contains(&stray));
}
