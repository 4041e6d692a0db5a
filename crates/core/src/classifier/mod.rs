//! Prediction adapter.
//!
//! Classifiers come in two capabilities: those that only return a label and those that also
//! return a probability distribution over their classes. The capability is fixed when the
//! artifact is loaded ([`LoadedClassifier`]); [`PredictionAdapter`] turns either into the same
//! [`ModelOutput`] shape.

pub mod artifact;

pub use artifact::{CentroidModel, ModelArtifact, ModelSpec, SoftmaxModel};

use crate::codec::FeatureVector;
use crate::error::{ClassifierError, PredictionResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// A trained classifier that produces a point label.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    fn predict(&self, features: &FeatureVector) -> Result<String, ClassifierError>;
}

/// A classifier that can also report class probabilities.
pub trait ProbabilisticClassifier: Classifier {
    /// Class labels, in the order `predict_proba` reports them.
    fn classes(&self) -> &[String];

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError>;
}

/// A classifier together with its capability, chosen at load time.
#[derive(Debug)]
pub enum LoadedClassifier {
    WithDistribution(Box<dyn ProbabilisticClassifier>),
    LabelOnly(Box<dyn Classifier>),
}

/// Debug echo of what the classifier returned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawOutput {
    pub prediction: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<Vec<f64>>>,
}

/// Normalized prediction result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelOutput {
    pub pred_label: String,
    /// Probability of the predicted class; `None` when the classifier has no distribution.
    pub pred_score: Option<f64>,
    /// Class label to probability; `None` when the classifier has no distribution.
    pub pred_proba: Option<BTreeMap<String, f64>>,
    pub raw_output: RawOutput,
}

/// Tolerance for the probability distribution summing to one.
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Runs the loaded classifier and normalizes its output.
#[derive(Debug)]
pub struct PredictionAdapter {
    classifier: LoadedClassifier,
}

impl PredictionAdapter {
    pub fn new(classifier: LoadedClassifier) -> Self {
        Self { classifier }
    }

    pub fn has_distribution(&self) -> bool {
        matches!(self.classifier, LoadedClassifier::WithDistribution(_))
    }

    /// Predicts on one encoded vector.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PredictionError`] wrapping whatever the classifier failed with. Failures
    /// are never replaced by a default prediction.
    pub fn predict(&self, features: &FeatureVector) -> PredictionResult<ModelOutput> {
        match &self.classifier {
            LoadedClassifier::WithDistribution(model) => {
                let probabilities = model.predict_proba(features)?;
                let label = model.predict(features)?;
                check_distribution(model.classes(), &probabilities)?;

                let pred_score = probabilities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let pred_proba = model
                    .classes()
                    .iter()
                    .cloned()
                    .zip(probabilities.iter().copied())
                    .collect();

                Ok(ModelOutput {
                    pred_label: label.clone(),
                    pred_score: Some(pred_score),
                    pred_proba: Some(pred_proba),
                    raw_output: RawOutput {
                        prediction: vec![label],
                        probabilities: Some(vec![probabilities]),
                    },
                })
            }
            LoadedClassifier::LabelOnly(model) => {
                let label = model.predict(features)?;
                Ok(ModelOutput {
                    pred_label: label.clone(),
                    pred_score: None,
                    pred_proba: None,
                    raw_output: RawOutput {
                        prediction: vec![label],
                        probabilities: None,
                    },
                })
            }
        }
    }
}

fn check_distribution(classes: &[String], probabilities: &[f64]) -> Result<(), ClassifierError> {
    if classes.is_empty() {
        return Err(ClassifierError::NoClasses);
    }
    if probabilities.len() != classes.len() {
        return Err(ClassifierError::ShapeMismatch {
            expected: classes.len(),
            found: probabilities.len(),
        });
    }
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(ClassifierError::NonFiniteOutput);
    }
    let total: f64 = probabilities.iter().sum();
    let in_range = probabilities.iter().all(|p| (0.0..=1.0).contains(p));
    if !in_range || (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(ClassifierError::InvalidDistribution);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FeatureCodec, FeatureTables, ReferenceDataset};
    use crate::patient::PatientRecord;

    #[derive(Debug)]
    struct Fixed {
        classes: Vec<String>,
        probabilities: Vec<f64>,
    }

    impl Classifier for Fixed {
        fn predict(&self, _features: &FeatureVector) -> Result<String, ClassifierError> {
            Ok(self.classes[1].clone())
        }
    }

    impl ProbabilisticClassifier for Fixed {
        fn classes(&self) -> &[String] {
            &self.classes
        }

        fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
            Ok(self.probabilities.clone())
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl Classifier for Failing {
        fn predict(&self, features: &FeatureVector) -> Result<String, ClassifierError> {
            Err(ClassifierError::ShapeMismatch {
                expected: 3,
                found: features.len(),
            })
        }
    }

    fn vector() -> FeatureVector {
        let dataset = ReferenceDataset::from_reader("gender\nmale\n".as_bytes()).expect("csv");
        let codec = FeatureCodec::new(FeatureTables::build(&dataset));
        codec.encode(&PatientRecord::default()).vector
    }

    fn fixed(probabilities: Vec<f64>) -> Fixed {
        Fixed {
            classes: vec!["kapha_pacifying".into(), "vata_pacifying".into()],
            probabilities,
        }
    }

    #[test]
    fn distribution_capable_output_is_complete() {
        let adapter = PredictionAdapter::new(LoadedClassifier::WithDistribution(Box::new(
            fixed(vec![0.25, 0.75]),
        )));
        let output = adapter.predict(&vector()).expect("prediction");

        assert_eq!(output.pred_label, "vata_pacifying");
        assert_eq!(output.pred_score, Some(0.75));
        let proba = output.pred_proba.expect("distribution");
        assert_eq!(proba["kapha_pacifying"], 0.25);
        assert_eq!(proba["vata_pacifying"], 0.75);
        assert_eq!(output.raw_output.probabilities, Some(vec![vec![0.25, 0.75]]));
    }

    #[test]
    fn label_only_output_has_no_scores() {
        let adapter =
            PredictionAdapter::new(LoadedClassifier::LabelOnly(Box::new(fixed(vec![]))));
        let output = adapter.predict(&vector()).expect("prediction");

        assert_eq!(output.pred_label, "vata_pacifying");
        assert_eq!(output.pred_score, None);
        assert_eq!(output.pred_proba, None);
        assert_eq!(output.raw_output.probabilities, None);
        assert!(!adapter.has_distribution());
    }

    #[test]
    fn classifier_failure_is_surfaced() {
        let adapter = PredictionAdapter::new(LoadedClassifier::LabelOnly(Box::new(Failing)));
        let err = adapter.predict(&vector()).expect_err("failure");
        assert!(matches!(err.0, ClassifierError::ShapeMismatch { .. }));
        assert!(err.to_string().starts_with("Prediction failed"));
    }

    #[test]
    fn malformed_distribution_is_rejected() {
        let adapter = PredictionAdapter::new(LoadedClassifier::WithDistribution(Box::new(
            fixed(vec![0.6, 0.6]),
        )));
        let err = adapter.predict(&vector()).expect_err("sum exceeds one");
        assert_eq!(err.0, ClassifierError::InvalidDistribution);
    }
}
