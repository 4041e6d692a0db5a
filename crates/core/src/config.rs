//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the service context.
//! Nothing in request handling reads environment variables.

use crate::error::{StartupError, StartupResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the classifier artifact relates to the feature tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModelMode {
    /// The artifact is a bare estimator; tables come from disk or the reference dataset.
    #[default]
    Estimator,
    /// The artifact embeds the tables it was trained with.
    Pipeline,
}

impl ModelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Estimator => "estimator",
            Self::Pipeline => "pipeline",
        }
    }
}

impl FromStr for ModelMode {
    type Err = StartupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "estimator" => Ok(Self::Estimator),
            "pipeline" => Ok(Self::Pipeline),
            other => Err(StartupError::InvalidConfig(format!(
                "unknown model mode '{other}', expected 'estimator' or 'pipeline'"
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    model_path: PathBuf,
    model_mode: ModelMode,
    dataset_path: PathBuf,
    tables_path: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::InvalidConfig`] if any path is empty or the tables path would
    /// overwrite the model or the dataset.
    pub fn new(
        model_path: PathBuf,
        model_mode: ModelMode,
        dataset_path: PathBuf,
        tables_path: PathBuf,
    ) -> StartupResult<Self> {
        for (name, path) in [
            ("model path", &model_path),
            ("dataset path", &dataset_path),
            ("tables path", &tables_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(StartupError::InvalidConfig(format!("{name} cannot be empty")));
            }
        }
        if tables_path == model_path || tables_path == dataset_path {
            return Err(StartupError::InvalidConfig(
                "tables path must differ from the model and dataset paths".into(),
            ));
        }

        Ok(Self {
            model_path,
            model_mode,
            dataset_path,
            tables_path,
        })
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn model_mode(&self) -> ModelMode {
        self.model_mode
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn tables_path(&self) -> &Path {
        &self.tables_path
    }

    /// Checks that every file startup will read exists, reporting all missing ones together.
    ///
    /// The model is always required. In estimator mode the dataset is required unless persisted
    /// tables already exist.
    pub fn validate_paths(&self) -> StartupResult<()> {
        let mut missing = Vec::new();
        if !self.model_path.is_file() {
            missing.push(self.model_path.clone());
        }
        if self.model_mode == ModelMode::Estimator
            && !self.tables_path.is_file()
            && !self.dataset_path.is_file()
        {
            missing.push(self.dataset_path.clone());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StartupError::MissingFiles(missing))
        }
    }
}

/// Parse the model mode from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`ModelMode::Estimator`].
pub fn model_mode_from_env_value(value: Option<String>) -> StartupResult<ModelMode> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value.map(|v| v.parse::<ModelMode>()).transpose()?;

    Ok(parsed.unwrap_or_default())
}
