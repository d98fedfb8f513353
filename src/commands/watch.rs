use std::path::Path;

use anyhow::{Context, Result};
use revwatch::logging::{self, LogConfig};
use revwatch::{Config, VersionEvent, VersionWatcher};
use tracing::warn;

pub fn cmd_watch(
    root: &Path,
    config_path: Option<&Path>,
    json: bool,
    verbose: u8,
    quiet: bool,
) -> Result<()> {
    let (config, warnings) = Config::resolve(config_path)?;

    let level = config.log.level.adjusted(verbose, quiet);
    if let Err(e) = logging::init(LogConfig::new(level)) {
        eprintln!("Warning: logging already initialised: {e}");
    }
    for warning in &warnings {
        warn!("{warning}");
    }

    let watcher = VersionWatcher::new(config.to_watch_options(root))
        .with_context(|| format!("cannot watch {}", root.display()))?;

    // Set up Ctrl+C handler
    let handle = watcher.shutdown_handle();
    ctrlc::set_handler(move || handle.shutdown()).context("Error setting Ctrl+C handler")?;

    if !json {
        println!("revwatch");
        println!("Root:     {}", watcher.root().display());
        println!("Versions: {}", watcher.versions_root().display());
        println!("Press Ctrl+C to stop\n");
    }

    watcher.run(|event| {
        if json {
            println!("{}", event.to_json());
            return;
        }
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        let rendered = render_event(&timestamp, &event);
        match event {
            VersionEvent::Error { .. } => eprintln!("{rendered}"),
            _ => println!("{rendered}"),
        }
    })?;

    Ok(())
}

/// One human-readable line per event
fn render_event(timestamp: &str, event: &VersionEvent) -> String {
    match event {
        VersionEvent::WatchStarted {
            root,
            tracked_files,
            watched_directories,
        } => format!(
            "{timestamp} watching {root} ({tracked_files} files, {watched_directories} directories)"
        ),
        VersionEvent::DirectoryRegistered { path } => {
            format!("{timestamp} watching new directory {path}")
        }
        VersionEvent::Versioned {
            kind,
            path,
            artifact,
        } => format!("{timestamp} {kind} {path} -> {artifact}"),
        VersionEvent::Error { message } => format!("{timestamp} error: {message}"),
        VersionEvent::Shutdown => format!("{timestamp} stopped"),
    }
}
