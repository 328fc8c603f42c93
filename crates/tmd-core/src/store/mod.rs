//! Model store: the registry of loaded files and the incremental engine.
//!
//! Every load updates the source map, the latest parse of each file on disk,
//! and marks the file pending. [`ModelStore::apply_updates`] turns the pending
//! set into one batch:
//!
//! ```text
//! pending ─► working copy ─► affected set ─► topological sort ─► resolve each
//!                                                   │                 │
//!                                              cycle: reject     any error: reject
//!                                                                     │
//!                                                              otherwise: commit
//! ```
//!
//! The registry holds `Arc<ModelFile>`s. A batch builds a working map from the
//! sources, reusing committed copies of files that did not change, resolves
//! owned copies and swaps the map in only on success, so watchers never
//! observe a partially-resolved model. Changes of a rejected batch stay in the
//! source map and are resolved again with the next batch.

mod debounce;
mod graph;
mod watch;
mod watcher;

pub use debounce::Debouncer;
pub use watch::ModelWatch;
pub use watcher::{FileDiagnostics, ModelWatcher};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::ModelConfig;
use crate::diagnostic::{CompilerError, ModelElement, ModelError, ModelErrorKind};
use crate::frontend::ModelFileLoader;
use crate::model::{Class, Domain, ModelFile};
use crate::resolve::{resolve_file, ClassIndex, DomainIndex};
use watcher::RegisteredWatcher;

/// A file that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Result of one batch.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    /// Nothing was pending.
    Unchanged,
    /// The batch was committed. `warnings` lists the files with warnings.
    Committed {
        files: Vec<Arc<ModelFile>>,
        warnings: Vec<FileDiagnostics>,
    },
    /// The batch had errors and the registry was left as it was.
    Rejected { diagnostics: Vec<FileDiagnostics> },
}

impl BatchOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, BatchOutcome::Committed { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, BatchOutcome::Rejected { .. })
    }

    /// Every diagnostic of the batch.
    pub fn diagnostics(&self) -> &[FileDiagnostics] {
        match self {
            BatchOutcome::Unchanged => &[],
            BatchOutcome::Committed { warnings, .. } => warnings,
            BatchOutcome::Rejected { diagnostics } => diagnostics,
        }
    }
}

#[derive(Default)]
struct StoreState {
    /// Committed, resolved files.
    files: BTreeMap<String, Arc<ModelFile>>,
    /// Latest parse of every loadable file on disk, unresolved.
    sources: BTreeMap<String, Arc<ModelFile>>,
    /// Files whose source is not reflected in `files` yet.
    stale: BTreeSet<String>,
    /// Files changed since the last batch.
    pending: BTreeSet<String>,
    load_failures: BTreeMap<String, LoadFailure>,
    watchers: Vec<RegisteredWatcher>,
}

/// The process-wide model registry.
///
/// Every operation takes the single store lock, so file changes and batches
/// are serialized.
pub struct ModelStore {
    config: ModelConfig,
    loader: ModelFileLoader,
    state: Mutex<StoreState>,
}

impl ModelStore {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            loader: ModelFileLoader::new(config.clone()),
            config,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a watcher and assigns its number among same-named watchers.
    pub fn add_watcher(&self, mut watcher: Box<dyn ModelWatcher>) {
        let mut state = self.state();
        let number = state
            .watchers
            .iter()
            .filter(|w| w.watcher.name() == watcher.name())
            .count()
            + 1;

        watcher.set_number(number);
        let registered = RegisteredWatcher { number, watcher };
        debug!(watcher = %registered.full_name(), "Watcher registered");
        state.watchers.push(registered);
    }

    /// `name@number` of every registered watcher, in registration order.
    pub fn watcher_names(&self) -> Vec<String> {
        self.state().watchers.iter().map(RegisteredWatcher::full_name).collect()
    }

    /// Clears the registry and loads every model file under the model root
    /// as a single batch.
    pub fn load_all(&self) -> Result<BatchOutcome, CompilerError> {
        let root = &self.config.model_root;
        if !root.is_dir() {
            return Err(CompilerError::io(root, "model root is not a directory"));
        }

        let mut state = self.state();
        if !state.watchers.is_empty() {
            let names: Vec<_> = state.watchers.iter().map(RegisteredWatcher::full_name).collect();
            info!(watchers = %names.join(", "), "Registered watchers");
        }
        info!(root = %root.display(), "Loading model");

        state.files.clear();
        state.sources.clear();
        state.stale.clear();
        state.pending.clear();
        state.load_failures.clear();

        for entry in WalkDir::new(root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && ModelConfig::is_model_file(entry.path()) {
                self.stage(&mut state, entry.path(), None);
            }
        }

        Ok(self.apply(&mut state))
    }

    /// Loads, reloads or removes one file and runs a batch.
    ///
    /// Without `content`, the file is read from disk; a missing file is removed.
    pub fn on_file_changed(&self, path: &Path, content: Option<&str>) -> BatchOutcome {
        info!(path = %path.display(), "File changed");
        let mut state = self.state();
        self.stage(&mut state, path, content);
        self.apply(&mut state)
    }

    /// Runs a batch over the pending files. A no-op when nothing is pending.
    pub fn apply_updates(&self) -> BatchOutcome {
        let mut state = self.state();
        self.apply(&mut state)
    }

    /// Snapshot of the committed registry, in name order.
    pub fn files(&self) -> Vec<Arc<ModelFile>> {
        self.state().files.values().cloned().collect()
    }

    pub fn file(&self, name: &str) -> Option<Arc<ModelFile>> {
        self.state().files.get(name).cloned()
    }

    /// Every committed class declared in its own file.
    pub fn classes(&self) -> Vec<Class> {
        self.state()
            .files
            .values()
            .flat_map(|f| f.own_classes().cloned().collect::<Vec<_>>())
            .collect()
    }

    /// Every committed domain.
    pub fn domains(&self) -> Vec<Domain> {
        self.state()
            .files
            .values()
            .flat_map(|f| f.domains.clone())
            .collect()
    }

    /// Names of the classes `file` can reference: its own and its dependencies'.
    pub fn available_classes(&self, file: &str) -> Vec<String> {
        let state = self.state();
        let Some(current) = state.files.get(file) else {
            return Vec::new();
        };

        let dependencies: Vec<&ModelFile> = current
            .uses
            .iter()
            .filter_map(|u| state.files.get(&u.name))
            .map(|f| &**f)
            .collect();

        ClassIndex::build(current, &dependencies)
            .names()
            .map(str::to_string)
            .collect()
    }

    /// Files that failed to parse, by logical name.
    pub fn load_failures(&self) -> BTreeMap<String, LoadFailure> {
        self.state().load_failures.clone()
    }

    /// Parses one file into the source map and marks it pending.
    fn stage(&self, state: &mut StoreState, path: &Path, content: Option<&str>) {
        let name = self.config.file_name(path);

        if content.is_none() && !path.exists() {
            debug!(file = %name, "Model file removed");
            state.load_failures.remove(&name);
            state.remove_source(name);
            return;
        }

        match self.loader.load(path, content) {
            Ok(Some(file)) => {
                state.load_failures.remove(&name);
                state.sources.insert(name.clone(), Arc::new(file));
                state.stale.insert(name.clone());
                state.pending.insert(name);
            }
            Ok(None) => {
                debug!(file = %name, "Model file is empty");
                state.load_failures.remove(&name);
                state.remove_source(name);
            }
            Err(e) => {
                error!(file = %name, error = %e, "Failed to load model file");
                state.load_failures.insert(
                    name.clone(),
                    LoadFailure {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    },
                );
                state.remove_source(name);
            }
        }
    }

    /// Runs one batch over the pending set. The pending set is cleared
    /// whatever the outcome.
    fn apply(&self, state: &mut StoreState) -> BatchOutcome {
        if state.pending.is_empty() {
            return BatchOutcome::Unchanged;
        }
        state.pending.clear();

        let mut working: BTreeMap<String, Arc<ModelFile>> = state
            .sources
            .iter()
            .map(|(name, source)| {
                let file = match state.files.get(name) {
                    Some(committed) if !state.stale.contains(name) => committed,
                    _ => source,
                };
                (name.clone(), Arc::clone(file))
            })
            .collect();

        let has_domains = |file: Option<&Arc<ModelFile>>| file.is_some_and(|f| !f.domains.is_empty());
        let widen = state
            .stale
            .iter()
            .any(|name| has_domains(state.files.get(name)) || has_domains(state.sources.get(name)));

        let affected = if widen {
            working.keys().cloned().collect()
        } else {
            graph::affected_files(&working, &state.stale)
        };
        debug!(affected = affected.len(), widened = widen, "Resolving batch");

        let sorted = match graph::sort(&working, &affected) {
            Ok(sorted) => sorted,
            Err(cycle) => {
                let diagnostics = cycle_diagnostics(&working, &affected, &cycle);
                return self.reject(state, diagnostics);
            }
        };

        let domains = DomainIndex::build(working.values().map(|f| &**f));
        let mut diagnostics = Vec::with_capacity(sorted.len());

        for name in &sorted {
            let Some(current) = working.get(name) else {
                continue;
            };
            let mut file = (**current).clone();

            let mut errors = resolve_file(&mut file, &working, &domains, &self.config);
            errors.retain(|e| e.is_error() || !self.config.nowarn.contains(&e.kind));

            let file = Arc::new(file);
            working.insert(name.clone(), Arc::clone(&file));
            diagnostics.push(FileDiagnostics { file, errors });
        }

        if diagnostics.iter().any(FileDiagnostics::has_errors) {
            return self.reject(state, diagnostics);
        }

        for watcher in &mut state.watchers {
            watcher.watcher.on_errors(&diagnostics);
        }
        log_diagnostics(&diagnostics);

        let files: Vec<Arc<ModelFile>> = diagnostics.iter().map(|d| Arc::clone(&d.file)).collect();
        state.files = working;
        state.stale.clear();
        info!(files = files.len(), "Model updated");

        for watcher in &mut state.watchers {
            watcher.watcher.on_files_changed(&files);
        }

        BatchOutcome::Committed {
            files,
            warnings: diagnostics.into_iter().filter(|d| !d.errors.is_empty()).collect(),
        }
    }

    /// Leaves `sources` and `stale` as they are, so the next batch retries.
    fn reject(&self, state: &mut StoreState, diagnostics: Vec<FileDiagnostics>) -> BatchOutcome {
        for watcher in &mut state.watchers {
            watcher.watcher.on_errors(&diagnostics);
        }
        log_diagnostics(&diagnostics);
        warn!("Model update rejected, keeping the previous model");

        BatchOutcome::Rejected { diagnostics }
    }
}

impl StoreState {
    /// Drops a file that no longer parses or no longer exists. A file that was
    /// never known is left alone.
    fn remove_source(&mut self, name: String) {
        let known = self.sources.remove(&name).is_some() || self.files.contains_key(&name);
        if known {
            self.stale.insert(name.clone());
            self.pending.insert(name);
        }
    }
}

/// One circular-dependency error on the first file of the cycle, and empty
/// diagnostics for the rest of the affected set.
fn cycle_diagnostics(
    files: &BTreeMap<String, Arc<ModelFile>>,
    affected: &[String],
    cycle: &[String],
) -> Vec<FileDiagnostics> {
    let Some(first) = cycle.first() else {
        return Vec::new();
    };
    let next = cycle.get(1).unwrap_or(first);

    let mut path = cycle.to_vec();
    path.push(first.clone());
    let message = format!("Circular dependency between files: {}", path.join(" -> "));

    affected
        .iter()
        .filter_map(|name| files.get(name))
        .map(|file| {
            let mut errors = Vec::new();
            if &file.name == first {
                let mut error = ModelError::new(
                    ModelErrorKind::CircularDependency,
                    file.name.clone(),
                    ModelElement::File { name: file.name.clone() },
                    message.clone(),
                );
                if let Some(reference) = file.uses.iter().find(|u| &u.name == next) {
                    error = error.at(reference);
                }
                errors.push(error);
            }
            FileDiagnostics {
                file: Arc::clone(file),
                errors,
            }
        })
        .collect()
}

fn log_diagnostics(diagnostics: &[FileDiagnostics]) {
    for error in diagnostics.iter().flat_map(|d| &d.errors) {
        if error.is_error() {
            error!(file = %error.file, code = error.kind.code(), "{error}");
        } else {
            warn!(file = %error.file, code = error.kind.code(), "{error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Named(&'static str, Arc<Mutex<Vec<usize>>>);

    impl ModelWatcher for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn set_number(&mut self, number: usize) {
            self.1.lock().unwrap().push(number);
        }

        fn on_errors(&mut self, _: &[FileDiagnostics]) {}

        fn on_files_changed(&mut self, _: &[Arc<ModelFile>]) {}
    }

    #[test]
    fn test_watchers_are_numbered_per_name() {
        let store = ModelStore::new(ModelConfig::default());
        let numbers = Arc::new(Mutex::new(Vec::new()));

        store.add_watcher(Box::new(Named("jpa", Arc::clone(&numbers))));
        store.add_watcher(Box::new(Named("ts", Arc::clone(&numbers))));
        store.add_watcher(Box::new(Named("jpa", Arc::clone(&numbers))));

        assert_eq!(store.watcher_names(), vec!["jpa@1", "ts@1", "jpa@2"]);
        assert_eq!(*numbers.lock().unwrap(), vec![1, 1, 2]);
    }

    #[test]
    fn test_load_all_requires_root_directory() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(ModelConfig::new(dir.path().join("missing")));

        assert!(matches!(store.load_all(), Err(CompilerError::IoError { .. })));
    }

    #[test]
    fn test_apply_updates_without_pending_is_unchanged() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("A.tmd"), "module: A\n").unwrap();
        let store = ModelStore::new(ModelConfig::new(dir.path()));

        assert!(store.load_all().unwrap().is_committed());
        assert!(matches!(store.apply_updates(), BatchOutcome::Unchanged));
        assert_eq!(store.files().len(), 1);
    }

    #[test]
    fn test_empty_unregistered_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(ModelConfig::new(dir.path()));
        store.load_all().unwrap();

        let outcome = store.on_file_changed(&dir.path().join("New.tmd"), Some(""));
        assert!(matches!(outcome, BatchOutcome::Unchanged));
    }
}
