//! The service context: everything a request needs, built once at startup.
//!
//! A [`ServiceContext`] holds the feature codec and the loaded classifier. It is never mutated
//! after [`ServiceContext::initialise`] returns; share it as `Arc<ServiceContext>`. Replacing the
//! model means building a new context and publishing a new `Arc`.

use crate::classifier::{LoadedClassifier, ModelArtifact, ModelOutput, PredictionAdapter};
use crate::codec::{FeatureCodec, FeatureTables, ReferenceDataset};
use crate::config::{CoreConfig, ModelMode};
use crate::constants::PAYLOAD_HASH_HEX_LEN;
use crate::diet_plan::{assemble_diet_plan, DietPlan};
use crate::error::{ServiceError, StartupError, StartupResult};
use crate::patient::PatientRecord;
use crate::safety::{check_safety, sanitize_diet_plan};
use crate::validation::validate_value;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    pub model_version: String,
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
    pub dataset_path: String,
}

/// Response of the predict and diet plan operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PredictionResponse {
    pub meta: ResponseMeta,
    /// Sanitized echo of the validated input.
    pub patient: PatientRecord,
    pub model_output: ModelOutput,
    /// Clinical safety warnings in rule order.
    pub warnings: Vec<String>,
    /// Categorical values the encoders had never seen.
    pub encoding_warnings: Vec<String>,
    pub diet_plan: Option<DietPlan>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthReport {
    pub status: String,
    pub model_version: String,
    /// Always true when served: a context is only built after its classifier loaded, and
    /// startup aborts otherwise.
    pub models_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug)]
pub struct ServiceContext {
    model_version: String,
    dataset_path: PathBuf,
    codec: FeatureCodec,
    adapter: PredictionAdapter,
}

impl ServiceContext {
    /// Loads the artifact and resolves the feature tables for the configured mode.
    ///
    /// - pipeline: the artifact must embed its tables
    /// - estimator: persisted tables are loaded if present, otherwise built from the reference
    ///   dataset and persisted; a failed save is logged and startup continues
    ///
    /// # Errors
    ///
    /// Any [`StartupError`]; the process should exit before serving.
    pub fn initialise(cfg: &CoreConfig) -> StartupResult<Self> {
        cfg.validate_paths()?;

        let artifact = ModelArtifact::load(cfg.model_path())?;
        let (model_version, classifier, embedded) = artifact.into_parts();

        let tables = match cfg.model_mode() {
            ModelMode::Pipeline => embedded.ok_or(StartupError::PipelineTablesMissing)?,
            ModelMode::Estimator => {
                if embedded.is_some() {
                    tracing::warn!("Artifact embeds feature tables; estimator mode ignores them");
                }
                estimator_tables(cfg.tables_path(), cfg.dataset_path())?
            }
        };

        tracing::info!(
            "Service context ready: model {} ({} mode, {} encoders, {} scalers)",
            model_version,
            cfg.model_mode().as_str(),
            tables.encoders.len(),
            tables.scalers.len()
        );

        Ok(Self::from_parts(
            model_version,
            cfg.dataset_path().to_path_buf(),
            tables,
            classifier,
        ))
    }

    /// Assembles a context from already loaded parts.
    pub fn from_parts(
        model_version: String,
        dataset_path: PathBuf,
        tables: FeatureTables,
        classifier: LoadedClassifier,
    ) -> Self {
        Self {
            model_version,
            dataset_path,
            codec: FeatureCodec::new(tables),
            adapter: PredictionAdapter::new(classifier),
        }
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn codec(&self) -> &FeatureCodec {
        &self.codec
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy".into(),
            model_version: self.model_version.clone(),
            models_loaded: true,
            timestamp: now_rfc3339(),
        }
    }

    /// Validates, encodes and predicts. The response carries no diet plan.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a rejected record, [`ServiceError::Prediction`] when the
    /// classifier fails.
    pub fn predict(&self, raw: &Value) -> Result<PredictionResponse, ServiceError> {
        self.run(raw, false)
    }

    /// Like [`ServiceContext::predict`], plus a sanitized diet plan.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceContext::predict`].
    pub fn generate_diet_plan(&self, raw: &Value) -> Result<PredictionResponse, ServiceError> {
        self.run(raw, true)
    }

    fn run(&self, raw: &Value, with_plan: bool) -> Result<PredictionResponse, ServiceError> {
        let record = validate_value(raw).map_err(|e| {
            tracing::warn!("Rejected patient record: {}", e);
            e
        })?;
        let hash = match payload_hash(&record) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!("Could not hash patient record: {}", e);
                "unhashed".to_owned()
            }
        };
        tracing::info!("Processing record {}", hash);

        let encoded = self.codec.encode(&record);
        let model_output = self.adapter.predict(&encoded.vector).map_err(|e| {
            tracing::error!("Prediction for record {} failed: {}", hash, e);
            e
        })?;

        let warnings = check_safety(&record);
        let diet_plan = with_plan.then(|| {
            let mut plan = assemble_diet_plan(&record, &warnings);
            sanitize_diet_plan(&mut plan, &record);
            plan
        });

        tracing::info!(
            "Record {} predicted {} with {} safety warnings",
            hash,
            model_output.pred_label,
            warnings.len()
        );

        Ok(PredictionResponse {
            meta: ResponseMeta {
                model_version: self.model_version.clone(),
                generated_at: now_rfc3339(),
                dataset_path: self.dataset_path.display().to_string(),
            },
            patient: record,
            model_output,
            warnings,
            encoding_warnings: encoded.warnings.iter().map(ToString::to_string).collect(),
            diet_plan,
        })
    }
}

fn estimator_tables(tables_path: &Path, dataset_path: &Path) -> StartupResult<FeatureTables> {
    if tables_path.is_file() {
        return FeatureTables::load(tables_path);
    }

    tracing::info!(
        "No feature tables at {}, building from {}",
        tables_path.display(),
        dataset_path.display()
    );
    let dataset = ReferenceDataset::from_path(dataset_path)?;
    let tables = FeatureTables::build(&dataset);
    if let Err(e) = tables.save(tables_path) {
        tracing::warn!("Could not persist feature tables: {}", e);
    }
    Ok(tables)
}

/// Short SHA-256 digest of the sanitized record, for correlating log lines without logging
/// patient data.
///
/// # Errors
///
/// Returns the serialization error if the record cannot be written as JSON.
pub fn payload_hash(record: &PatientRecord) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, record)?;
    let digest = hex::encode(hasher.finalize());
    Ok(digest[..PAYLOAD_HASH_HEX_LEN].to_owned())
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
