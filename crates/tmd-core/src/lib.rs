//! # tmd-core
//!
//! Loading and incremental resolution of `.tmd` model files.
//!
//! A model is spread across many files. Each file is parsed on its own into
//! a [`ModelFile`] whose cross-file names are still plain references; the
//! [`ModelStore`] then resolves the files that a change affects, in
//! dependency order, and commits the batch only when no error came out of it.
//!
//! ## Architecture
//!
//! ```text
//! .tmd text
//!     │
//!     ▼
//! ┌──────────────┐
//! │   Frontend   │  YAML events → sections → ModelFile
//! │ (fail fast)  │  (references unresolved)
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Store     │  pending set → affected set → topological order
//! │              │  (cycle: reject the batch)
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Resolve    │  bind references, expand aliases, collect ModelErrors
//! │  (per file)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Watchers   │  on_errors always, on_files_changed on commit
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tmd_core::{ModelConfig, ModelStore};
//!
//! let store = ModelStore::new(ModelConfig::load("tmd.yaml".as_ref())?);
//! store.add_watcher(Box::new(MyGenerator::default()));
//! let outcome = store.load_all()?;
//! ```

pub mod config;
pub mod diagnostic;
pub mod frontend;
pub mod model;
pub mod resolve;
pub mod store;

pub use config::ModelConfig;
pub use diagnostic::{CompilerError, ModelElement, ModelError, ModelErrorKind, Severity};
pub use frontend::ModelFileLoader;
pub use model::ModelFile;
pub use store::{BatchOutcome, FileDiagnostics, LoadFailure, ModelStore, ModelWatch, ModelWatcher};
