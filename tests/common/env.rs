//! Test environment running a real watcher on a temp directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use revwatch::watcher::{SnapshotStore, WatchRegistrar};
use revwatch::{RevwatchResult, ShutdownHandle, VersionEvent, VersionWatcher, WatchOptions};
use tempfile::TempDir;

/// How long to wait for the watcher to catch up before failing a test
pub const DEADLINE: Duration = Duration::from_secs(10);

const POLL: Duration = Duration::from_millis(20);

/// Poll `cond` until it holds or the deadline passes.
pub fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let start = Instant::now();
    while !cond() {
        if start.elapsed() > DEADLINE {
            panic!("timed out after {DEADLINE:?} waiting for {what}");
        }
        std::thread::sleep(POLL);
    }
}

/// A watched root plus a sibling staging directory on the same file system.
///
/// Files prepared in staging and renamed into the root arrive in one step,
/// so the watcher never sees them half-written.
pub struct WatchEnv {
    _base: TempDir,
    pub root: PathBuf,
    pub staging: PathBuf,
    handle: ShutdownHandle,
    snapshot: Arc<SnapshotStore>,
    registrar: Arc<WatchRegistrar>,
    events: Arc<Mutex<Vec<VersionEvent>>>,
    thread: Option<JoinHandle<RevwatchResult<()>>>,
}

impl WatchEnv {
    /// Start watching an empty root
    pub fn start() -> Self {
        Self::start_with(|_| {})
    }

    /// Let `prepare` populate the root, then start watching it
    pub fn start_with(prepare: impl FnOnce(&Path)) -> Self {
        let base = tempfile::tempdir().expect("create temp dir");
        let root = base.path().join("root");
        let staging = base.path().join("staging");
        fs::create_dir(&root).expect("create root");
        fs::create_dir(&staging).expect("create staging");
        prepare(&root);

        let root = fs::canonicalize(&root).expect("canonical root");
        let staging = fs::canonicalize(&staging).expect("canonical staging");

        let watcher = VersionWatcher::new(WatchOptions::new(&root)).expect("start watcher");
        let handle = watcher.shutdown_handle();
        let snapshot = watcher.snapshot();
        let registrar = watcher.registrar();
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&events);
        let thread = std::thread::spawn(move || {
            watcher.run(move |event| sink.lock().unwrap().push(event))
        });

        let env = Self {
            _base: base,
            root,
            staging,
            handle,
            snapshot,
            registrar,
            events,
            thread: Some(thread),
        };
        env.wait_for("watch to start", |events| {
            events
                .iter()
                .any(|e| matches!(e, VersionEvent::WatchStarted { .. }))
        });
        env
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write `content` to `relative` in one step (staged, then renamed in)
    pub fn put(&self, relative: &str, content: &str) {
        let staged = self.staging.join(relative.replace('/', "_"));
        fs::write(&staged, content).expect("write staged file");
        fs::rename(&staged, self.path(relative)).expect("move staged file into root");
    }

    /// Build a directory tree in staging and move it into the root whole
    pub fn put_tree(&self, relative: &str, files: &[(&str, &str)]) {
        let staged = self.staging.join(relative);
        for (name, content) in files {
            let file = staged.join(name);
            fs::create_dir_all(file.parent().expect("file has parent")).expect("create staged dirs");
            fs::write(file, content).expect("write staged file");
        }
        fs::rename(&staged, self.path(relative)).expect("move staged tree into root");
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    pub fn registrar(&self) -> &WatchRegistrar {
        &self.registrar
    }

    pub fn events(&self) -> Vec<VersionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn wait_for(&self, what: &str, cond: impl Fn(&[VersionEvent]) -> bool) {
        wait_until(what, || cond(&self.events.lock().unwrap()));
    }

    /// All artifacts of one kind (`created`, `modified`, `deleted`), any date
    pub fn artifacts(&self, kind: &str) -> Vec<PathBuf> {
        let versions = self.root.join("versions");
        let mut found = Vec::new();
        let Ok(days) = fs::read_dir(&versions) else {
            return found;
        };
        for day in days.flatten() {
            if let Ok(entries) = fs::read_dir(day.path().join(kind)) {
                found.extend(entries.flatten().map(|e| e.path()));
            }
        }
        found.sort();
        found
    }

    /// Contents of all artifacts of one kind whose name starts with `stem_`
    pub fn artifact_contents(&self, kind: &str, stem: &str) -> Vec<String> {
        let prefix = format!("{stem}_");
        self.artifacts(kind)
            .iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .map(|p| fs::read_to_string(p).expect("read artifact"))
            .collect()
    }

    pub fn tracks(&self, relative: &str, content: &str) -> bool {
        self.snapshot.holds(&self.path(relative), content.as_bytes())
    }

    /// Stop the watcher and return everything it reported
    pub fn stop(mut self) -> Vec<VersionEvent> {
        self.shutdown();
        self.events()
    }

    fn shutdown(&mut self) {
        self.handle.shutdown();
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .expect("watcher thread panicked")
                .expect("watcher returned an error");
        }
    }
}

impl Drop for WatchEnv {
    fn drop(&mut self) {
        if self.thread.is_some() && !std::thread::panicking() {
            self.shutdown();
        } else {
            self.handle.shutdown();
        }
    }
}
