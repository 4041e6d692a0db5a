use std::path::PathBuf;

/// Rejection of a raw patient record by the schema validator.
///
/// Every variant carries the complete list of violations found at that stage so callers
/// can report them all at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown fields: {}", .0.join(", "))]
    UnknownFields(Vec<String>),
    #[error("Invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingRequiredField(Vec<String>),
    #[error("Contradictory inputs: {}", .0.join(", "))]
    ContradictoryInput(Vec<String>),
}

impl ValidationError {
    /// The individual violations, one entry per offending field or rule.
    pub fn violations(&self) -> Vec<String> {
        match self {
            Self::UnknownFields(names) => names.clone(),
            Self::InvalidField { field, message } => vec![format!("{field}: {message}")],
            Self::MissingRequiredField(names) => names.clone(),
            Self::ContradictoryInput(messages) => messages.clone(),
        }
    }
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Failures raised by a classifier implementation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("feature vector has {found} columns, classifier expects {expected}")]
    ShapeMismatch { expected: usize, found: usize },
    #[error("column '{column}' holds text, classifier expects a number")]
    UnsupportedDtype { column: String },
    #[error("classifier produced a non-finite value")]
    NonFiniteOutput,
    #[error("class probabilities do not form a distribution")]
    InvalidDistribution,
    #[error("classifier has no classes")]
    NoClasses,
}

/// A request-fatal prediction failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Prediction failed: {0}")]
pub struct PredictionError(#[from] pub ClassifierError);

pub type PredictionResult<T> = std::result::Result<T, PredictionError>;

/// Problems reading the reference dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read reference dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("reference dataset has no data rows")]
    Empty,
}

/// Process-fatal failures while building the service context.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Missing model or dataset files: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    MissingFiles(Vec<PathBuf>),
    #[error("failed to read {path}: {source}", path = path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}", path = path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load model artifact: {0}")]
    ArtifactLoad(String),
    #[error("failed to load reference dataset: {0}")]
    Dataset(#[from] DatasetError),
    #[error("failed to serialize feature tables: {0}")]
    TablesSerialization(serde_yaml::Error),
    #[error("failed to serialize encoder mappings: {0}")]
    MappingsSerialization(serde_json::Error),
    #[error("feature tables are corrupt: {0}")]
    CorruptTables(String),
    #[error("model expects feature columns that differ from the codec: {0}")]
    ColumnOrderMismatch(String),
    #[error("pipeline mode requires the model artifact to embed feature tables")]
    PipelineTablesMissing,
}

pub type StartupResult<T> = std::result::Result<T, StartupError>;

/// Request-level failure of a service operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}
