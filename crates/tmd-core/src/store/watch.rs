//! Filesystem watch over the model root.

use std::path::PathBuf;
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::diagnostic::CompilerError;
use super::debounce::Debouncer;
use super::ModelStore;

/// A running watch. Dropping it stops watching and cancels pending windows.
pub struct ModelWatch {
    _watcher: RecommendedWatcher,
    debouncer: Arc<Debouncer>,
}

impl ModelWatch {
    /// Paths waiting for their debounce window to end.
    pub fn pending(&self) -> usize {
        self.debouncer.pending()
    }
}

impl ModelStore {
    /// Watches the model root and feeds quiet paths to
    /// [`on_file_changed`](ModelStore::on_file_changed).
    ///
    /// Timers run on `runtime`; each reload runs on a blocking thread.
    pub fn watch(self: &Arc<Self>, runtime: Handle) -> Result<ModelWatch, CompilerError> {
        let root = self.config().model_root.clone();
        let watch_error = |e: notify::Error| CompilerError::WatchFailed {
            path: root.clone(),
            message: e.to_string(),
        };

        let store = Arc::clone(self);
        let debouncer = Arc::new(Debouncer::new(runtime, self.config().debounce(), move |path: PathBuf| {
            store.on_file_changed(&path, None);
        }));

        let sink = Arc::clone(&debouncer);
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
                ) {
                    return;
                }
                for path in event.paths.iter().filter(|p| ModelConfig::is_model_file(p)) {
                    sink.notify(path);
                }
            }
            Err(error) => warn!(%error, "File watch error"),
        })
        .map_err(watch_error)?;

        watcher.watch(&root, RecursiveMode::Recursive).map_err(watch_error)?;
        info!(root = %root.display(), "Watching model files");

        Ok(ModelWatch {
            _watcher: watcher,
            debouncer,
        })
    }
}
