//! Notification interface implemented by generators and editors.

use std::sync::Arc;

use crate::diagnostic::ModelError;
use crate::model::ModelFile;

/// Diagnostics of one file for one batch.
#[derive(Debug, Clone)]
pub struct FileDiagnostics {
    pub file: Arc<ModelFile>,
    pub errors: Vec<ModelError>,
}

impl FileDiagnostics {
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(ModelError::is_error)
    }
}

/// A consumer of resolution batches.
///
/// Called with the store lock held: implementations must not call back into
/// the store.
pub trait ModelWatcher: Send {
    /// Stable name. Watchers sharing a name are told apart by their number.
    fn name(&self) -> &str;

    /// Ordinal among the registered watchers sharing this watcher's name, from 1.
    fn set_number(&mut self, _number: usize) {}

    /// Called after every batch, committed or not, for all affected files.
    fn on_errors(&mut self, diagnostics: &[FileDiagnostics]);

    /// Called after a committed batch with its files in dependency order.
    fn on_files_changed(&mut self, files: &[Arc<ModelFile>]);
}

/// A watcher as registered in the store.
pub(crate) struct RegisteredWatcher {
    pub number: usize,
    pub watcher: Box<dyn ModelWatcher>,
}

impl RegisteredWatcher {
    pub fn full_name(&self) -> String {
        format!("{}@{}", self.watcher.name(), self.number)
    }
}
