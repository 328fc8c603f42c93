//! Per-path debouncing of filesystem events.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

type Callback = Arc<dyn Fn(PathBuf) + Send + Sync>;

struct Timer {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct Timers {
    next_generation: u64,
    by_path: HashMap<PathBuf, Timer>,
}

/// Coalesces bursts of events per path into one callback.
///
/// Every event for a path cancels that path's running timer and starts a new
/// one. The callback runs, on a blocking thread, once a path has been quiet
/// for the whole window. Paths are independent of each other.
pub struct Debouncer {
    runtime: Handle,
    window: Duration,
    callback: Callback,
    timers: Arc<Mutex<Timers>>,
}

impl Debouncer {
    pub fn new<F>(runtime: Handle, window: Duration, callback: F) -> Self
    where
        F: Fn(PathBuf) + Send + Sync + 'static,
    {
        Self {
            runtime,
            window,
            callback: Arc::new(callback),
            timers: Arc::new(Mutex::new(Timers::default())),
        }
    }

    /// Records an event for `path`, restarting its window.
    pub fn notify(&self, path: &Path) {
        let mut timers = lock(&self.timers);
        timers.next_generation += 1;
        let generation = timers.next_generation;

        let task = self.runtime.spawn(fire(
            path.to_path_buf(),
            generation,
            self.window,
            Arc::clone(&self.callback),
            Arc::clone(&self.timers),
        ));

        if let Some(previous) = timers.by_path.insert(path.to_path_buf(), Timer { generation, task }) {
            trace!(path = %path.display(), "Debounce window restarted");
            previous.task.abort();
        }
    }

    /// Number of paths with a running window.
    pub fn pending(&self) -> usize {
        lock(&self.timers).by_path.len()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        for (_, timer) in lock(&self.timers).by_path.drain() {
            timer.task.abort();
        }
    }
}

async fn fire(path: PathBuf, generation: u64, window: Duration, callback: Callback, timers: Arc<Mutex<Timers>>) {
    tokio::time::sleep(window).await;

    {
        let mut timers = lock(&timers);
        // A newer event may have replaced this timer after the sleep ended.
        let current = timers
            .by_path
            .get(&path)
            .is_some_and(|timer| timer.generation == generation);
        if !current {
            return;
        }
        timers.by_path.remove(&path);
    }

    let _ = tokio::task::spawn_blocking(move || callback(path)).await;
}

fn lock(timers: &Mutex<Timers>) -> std::sync::MutexGuard<'_, Timers> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}
