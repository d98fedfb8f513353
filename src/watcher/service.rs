//! The running watcher: setup, the notification wait loop, and shutdown
//!
//! One thread (the caller of [`VersionWatcher::run`]) blocks on the
//! notification channel. Everything it receives before the channel runs dry
//! forms a batch, and each batch is handed to the worker pool, where it is
//! classified, re-ordered by kind priority, and dispatched in that order.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use notify::{RecommendedWatcher, Watcher};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, error, info, warn};

use super::backoff::{RetryPolicy, Sleeper, ThreadSleeper};
use super::classify::{Classified, Classifier};
use super::debounce::{Debouncer, DEBOUNCE_MS};
use super::dispatcher::{DispatchOutcome, Dispatched, EventDispatcher};
use super::event::{EventKind, FileEvent, VersionEvent};
use super::queue::EventQueue;
use super::registrar::{NotifyFacility, WatchRegistrar};
use super::snapshot::SnapshotStore;
use super::versioner::VersionWriter;
use crate::clock::{Clock, SystemClock};
use crate::error::{RevwatchError, RevwatchResult};
use crate::fs::{FileSystem, LocalFs, WalkErrors};
use crate::ignore_patterns::IgnorePatterns;
use crate::lock::StoreLock;
use crate::scope::WatchScope;

/// Default name of the version store below the watched root
pub const VERSIONS_DIR: &str = "versions";

/// Watch options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    /// Directory tree to protect
    pub root: PathBuf,
    /// Version store name under the root
    pub versions_dir: String,
    /// Window for collapsing duplicate directory creations
    pub debounce: Duration,
    /// Retry budget for reading freshly created files
    pub retry: RetryPolicy,
    /// Worker threads; 0 sizes the pool to the machine
    pub workers: usize,
}

impl WatchOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            versions_dir: VERSIONS_DIR.to_string(),
            debounce: Duration::from_millis(DEBOUNCE_MS),
            retry: RetryPolicy::default(),
            workers: 0,
        }
    }

    pub fn with_versions_dir(mut self, name: impl Into<String>) -> Self {
        self.versions_dir = name.into();
        self
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

enum Signal {
    Fs(notify::Result<notify::Event>),
    Shutdown,
}

/// Stops a running watcher from any thread (e.g. a Ctrl+C handler).
#[derive(Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
    wake: Sender<Signal>,
}

impl ShutdownHandle {
    /// Ask the wait loop to stop after the batch in progress. Work already
    /// handed to the pool still completes.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        // The loop may be blocked waiting; a closed channel means it is gone.
        let _ = self.wake.send(Signal::Shutdown);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// A raw notification plus when it was picked up
struct Captured {
    result: notify::Result<notify::Event>,
    captured_at: DateTime<Local>,
    seen: Instant,
}

/// Shared state used by batch jobs on the pool
struct Pipeline {
    scope: WatchScope,
    fs: Arc<dyn FileSystem>,
    snapshot: Arc<SnapshotStore>,
    registrar: Arc<WatchRegistrar>,
    debouncer: Debouncer,
    dispatcher: EventDispatcher,
}

impl Pipeline {
    fn process<F>(&self, batch: Vec<Captured>, on_event: &F)
    where
        F: Fn(VersionEvent) + Sync,
    {
        let classifier = Classifier {
            scope: &self.scope,
            fs: self.fs.as_ref(),
            registrar: &self.registrar,
            snapshot: &self.snapshot,
            debouncer: &self.debouncer,
        };
        let queue = EventQueue::new();

        for captured in batch {
            let event = match captured.result {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "watch notification error");
                    on_event(VersionEvent::Error {
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            for classified in classifier.classify(&event, captured.captured_at, captured.seen) {
                match classified {
                    Classified::File(file_event) => queue.push(file_event),
                    Classified::NewDirectory(dir) => {
                        self.on_new_directory(&dir, captured.captured_at, &queue, on_event)
                    }
                }
            }
        }

        for event in queue.drain() {
            for dispatched in self.dispatcher.dispatch(&event) {
                self.report(&dispatched, on_event);
            }
            if event.kind == EventKind::FolderDeleted {
                let forgotten = self.registrar.forget_tree(&event.path);
                debug!(path = %event.path.display(), directories = forgotten.len(), "folder unregistered");
            }
        }

        self.debouncer.prune(Instant::now());
    }

    /// Track files that appeared after the initial snapshot but before their
    /// directories were registered. Nothing notifies about those.
    fn catch_up<F>(&self, on_event: &F)
    where
        F: Fn(VersionEvent) + Sync,
    {
        let root = self.scope.root();
        let files = match self.fs.list_files(root, &self.scope, WalkErrors::Skip) {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "cannot rescan tree after registration");
                return;
            }
        };
        let captured_at = Local::now();
        let mut found = 0;
        for file in files.into_iter().filter(|f| !self.snapshot.contains(f)) {
            found += 1;
            let event = FileEvent::new(file, EventKind::Created, captured_at);
            for dispatched in self.dispatcher.dispatch(&event) {
                self.report(&dispatched, on_event);
            }
        }
        if found > 0 {
            info!(files = found, "versioned files created during startup");
        }
    }

    fn on_new_directory<F>(
        &self,
        dir: &Path,
        captured_at: DateTime<Local>,
        queue: &EventQueue,
        on_event: &F,
    ) where
        F: Fn(VersionEvent) + Sync,
    {
        let created = self.registrar.on_directory_created(dir);
        for registered in &created.registered {
            info!(path = %registered.display(), "watching new directory");
            on_event(VersionEvent::DirectoryRegistered {
                path: self.relative(registered),
            });
        }
        queue.extend(
            created
                .files
                .into_iter()
                .map(|file| FileEvent::new(file, EventKind::Created, captured_at)),
        );
    }

    fn report<F>(&self, dispatched: &Dispatched, on_event: &F)
    where
        F: Fn(VersionEvent) + Sync,
    {
        match &dispatched.outcome {
            DispatchOutcome::Versioned(artifact) => {
                info!(
                    kind = %dispatched.kind,
                    path = %dispatched.path.display(),
                    artifact = %artifact.display(),
                    "versioned"
                );
                on_event(VersionEvent::Versioned {
                    kind: dispatched.kind,
                    path: self.relative(&dispatched.path),
                    artifact: self.relative(artifact),
                });
            }
            DispatchOutcome::Abandoned(reason) => {
                on_event(VersionEvent::Error {
                    message: format!(
                        "{} {}: {}",
                        dispatched.kind,
                        self.relative(&dispatched.path),
                        reason
                    ),
                });
            }
            DispatchOutcome::AlreadyVersioned(_)
            | DispatchOutcome::Unchanged
            | DispatchOutcome::Untracked => {}
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(self.scope.root())
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// A configured watcher over one root. Holds the version store lock until
/// dropped.
pub struct VersionWatcher {
    pipeline: Pipeline,
    pool: ThreadPool,
    signals: Receiver<Signal>,
    handle: ShutdownHandle,
    _lock: StoreLock,
}

impl VersionWatcher {
    /// Validate the root, take the store lock, scan the tree into the
    /// snapshot and set up the OS watch handle. Nothing is registered yet.
    pub fn new(options: WatchOptions) -> RevwatchResult<Self> {
        Self::with_collaborators(
            options,
            Arc::new(LocalFs::new()),
            Arc::new(SystemClock),
            Arc::new(ThreadSleeper),
        )
    }

    pub fn with_collaborators(
        options: WatchOptions,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> RevwatchResult<Self> {
        if !fs.exists(&options.root) {
            return Err(RevwatchError::RootNotFound { path: options.root });
        }
        if !fs.is_dir(&options.root) {
            return Err(RevwatchError::NotADirectory { path: options.root });
        }
        // Notifications carry resolved paths on some platforms.
        let root = std::fs::canonicalize(&options.root)?;

        let scope = WatchScope::new(root.clone(), &options.versions_dir);
        fs.create_dir_all(scope.versions_root())?;
        let lock = StoreLock::acquire(scope.versions_root())?;

        let ignore = IgnorePatterns::load(&root)?;
        if !ignore.is_empty() {
            info!(patterns = ignore.pattern_count(), "loaded ignore file");
        }
        let scope = scope.with_ignore(ignore);

        let files = fs.list_files(&root, &scope, WalkErrors::Abort)?;
        let snapshot = Arc::new(SnapshotStore::load(fs.as_ref(), &files));
        info!(root = %root.display(), files = snapshot.len(), "initial snapshot taken");

        let pool = ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .thread_name(|i| format!("revwatch-worker-{i}"))
            .build()?;

        let (tx, signals) = mpsc::channel();
        let notify_tx = tx.clone();
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<notify::Event>| {
                let _ = notify_tx.send(Signal::Fs(res));
            },
            notify::Config::default(),
        )?;
        let registrar = Arc::new(WatchRegistrar::new(
            Box::new(NotifyFacility::new(watcher)),
            fs.clone(),
            scope.clone(),
        ));

        let writer = VersionWriter::new(fs.clone(), clock, scope.versions_root().to_path_buf());
        let dispatcher = EventDispatcher::new(
            snapshot.clone(),
            writer,
            fs.clone(),
            options.retry,
            sleeper,
        );

        Ok(Self {
            pipeline: Pipeline {
                scope,
                fs,
                snapshot,
                registrar,
                debouncer: Debouncer::new(options.debounce),
                dispatcher,
            },
            pool,
            signals,
            handle: ShutdownHandle {
                running: Arc::new(AtomicBool::new(true)),
                wake: tx,
            },
            _lock: lock,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.handle.clone()
    }

    /// The resolved watched root
    pub fn root(&self) -> &Path {
        self.pipeline.scope.root()
    }

    pub fn versions_root(&self) -> &Path {
        self.pipeline.scope.versions_root()
    }

    pub fn snapshot(&self) -> Arc<SnapshotStore> {
        Arc::clone(&self.pipeline.snapshot)
    }

    pub fn registrar(&self) -> Arc<WatchRegistrar> {
        Arc::clone(&self.pipeline.registrar)
    }

    /// Register the tree and process notifications until shut down.
    ///
    /// Files created between [`VersionWatcher::new`] and registration are
    /// versioned as creations before `WatchStarted` is reported.
    ///
    /// Returns `Err` only if the tree could not be registered. Batches
    /// already handed to the pool are finished before this returns.
    pub fn run<F>(&self, on_event: F) -> RevwatchResult<()>
    where
        F: Fn(VersionEvent) + Sync,
    {
        let registrar = &self.pipeline.registrar;
        if let Err(e) = registrar.watch_all() {
            error!(error = %e, "cannot register directory tree, shutting down");
            registrar.close();
            on_event(VersionEvent::Error {
                message: e.to_string(),
            });
            on_event(VersionEvent::Shutdown);
            return Err(e);
        }
        self.pipeline.catch_up(&on_event);

        on_event(VersionEvent::WatchStarted {
            root: self.root().display().to_string(),
            tracked_files: self.pipeline.snapshot.len(),
            watched_directories: registrar.registered_count(),
        });

        let pipeline = &self.pipeline;
        let on_event = &on_event;
        self.pool.in_place_scope(|jobs| {
            while self.handle.is_running() {
                let (batch, stop) = self.next_batch();
                if !batch.is_empty() {
                    debug!(notifications = batch.len(), "dispatching batch");
                    jobs.spawn(move |_| pipeline.process(batch, on_event));
                }
                if stop {
                    break;
                }
            }
        });

        registrar.close();
        info!("watcher stopped");
        on_event(VersionEvent::Shutdown);
        Ok(())
    }

    /// Block for the next notification, then take whatever else is already
    /// queued. The flag is true when the loop should stop.
    fn next_batch(&self) -> (Vec<Captured>, bool) {
        let mut batch = Vec::new();
        let first = match self.signals.recv() {
            Ok(Signal::Fs(result)) => result,
            Ok(Signal::Shutdown) => return (batch, true),
            Err(_) => {
                warn!("notification channel closed, stopping");
                return (batch, true);
            }
        };
        batch.push(capture(first));

        loop {
            match self.signals.try_recv() {
                Ok(Signal::Fs(result)) => batch.push(capture(result)),
                Ok(Signal::Shutdown) => return (batch, true),
                Err(TryRecvError::Empty) => return (batch, false),
                Err(TryRecvError::Disconnected) => {
                    warn!("notification channel closed, stopping");
                    return (batch, true);
                }
            }
        }
    }
}

fn capture(result: notify::Result<notify::Event>) -> Captured {
    Captured {
        result,
        captured_at: Local::now(),
        seen: Instant::now(),
    }
}
