//! # Diet Core
//!
//! Core logic of the Ayurvedic diet inference service.
//!
//! This crate contains the request pipeline and everything it depends on:
//! - schema validation of raw patient records ([`validation`])
//! - feature encoding and scaling against tables fitted from a reference dataset ([`codec`])
//! - classifier loading and output normalization ([`classifier`])
//! - clinical safety warnings and diet plan sanitization ([`safety`])
//!
//! **No API concerns**: HTTP routing, CORS and process startup belong in `api-rest` and the
//! binaries. Configuration is resolved by the caller and passed in as [`CoreConfig`].

pub mod classifier;
pub mod codec;
pub mod config;
pub mod constants;
pub mod context;
pub mod diet_plan;
pub mod error;
pub mod fields;
pub mod patient;
pub mod safety;
pub mod validation;

pub use classifier::{LoadedClassifier, ModelArtifact, ModelOutput, PredictionAdapter};
pub use codec::{EncodedFeatures, EncodingWarning, FeatureCodec, FeatureTables, FeatureVector, ReferenceDataset};
pub use config::{model_mode_from_env_value, CoreConfig, ModelMode};
pub use context::{payload_hash, HealthReport, PredictionResponse, ResponseMeta, ServiceContext};
pub use diet_plan::{assemble_diet_plan, DietPlan, Meal, PlanSummary};
pub use error::{
    ClassifierError, DatasetError, PredictionError, PredictionResult, ServiceError, StartupError,
    StartupResult, ValidationError, ValidationResult,
};
pub use patient::PatientRecord;
pub use safety::{check_safety, sanitize_diet_plan, SafetyRule, SAFETY_RULES};
pub use validation::{validate, validate_value};
