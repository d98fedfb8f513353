//! End-to-end scenarios against a real watched directory.

mod common;

#[path = "scenarios/file_lifecycle.rs"]
mod file_lifecycle;

#[path = "scenarios/new_directories.rs"]
mod new_directories;

#[path = "scenarios/ignored_paths.rs"]
mod ignored_paths;
