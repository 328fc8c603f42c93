//! Model configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::diagnostic::{CompilerError, ModelErrorKind};

/// Extension of model files.
pub const MODEL_FILE_EXTENSION: &str = "tmd";

/// Configuration consumed by the model store and the resolver.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Application name stamped into every namespace.
    pub app: String,

    /// Directory enumerated for model files.
    pub model_root: PathBuf,

    /// Allow classes with more than one primary key.
    pub allow_composite_primary_key: bool,

    /// Warning kinds dropped from every batch.
    pub nowarn: Vec<ModelErrorKind>,

    /// Per-path debounce window for filesystem events, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            app: String::new(),
            model_root: PathBuf::from("."),
            allow_composite_primary_key: false,
            nowarn: Vec::new(),
            debounce_ms: 500,
        }
    }
}

impl ModelConfig {
    pub fn new(model_root: impl Into<PathBuf>) -> Self {
        Self {
            model_root: model_root.into(),
            ..Self::default()
        }
    }

    /// Loads a YAML configuration file.
    ///
    /// A relative `modelRoot` is resolved against the configuration file's directory.
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let content = std::fs::read_to_string(path).map_err(|e| CompilerError::io(path, e.to_string()))?;

        let mut config: Self = serde_yaml::from_str(&content).map_err(|e| CompilerError::InvalidConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.model_root.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.model_root = base.join(&config.model_root);
        }

        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Whether `path` looks like a model file.
    pub fn is_model_file(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == MODEL_FILE_EXTENSION)
    }

    /// Logical name of a model file: its path relative to the model root,
    /// extension stripped, `/`-separated.
    pub fn file_name(&self, path: &Path) -> String {
        let root = normalize(&self.model_root);
        let file = normalize(path);

        let relative = pathdiff::diff_paths(&file, &root).unwrap_or(file);
        let relative = relative.with_extension("");

        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Absolute, symlink-free form of `path` where the filesystem allows it.
///
/// Deleted files cannot be canonicalized, so their parent is used instead.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        if let Ok(parent) = parent.canonicalize() {
            return parent.join(name);
        }
    }

    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
