//! On-disk classifier artifacts.
//!
//! An artifact is a JSON document holding the model identifier, the feature column contract, the
//! model parameters and, for self-contained pipeline artifacts, the feature tables the model was
//! trained with. Loading failures are startup failures; nothing here runs per request except
//! the `predict` implementations.

use super::{Classifier, LoadedClassifier, ProbabilisticClassifier};
use crate::codec::{FeatureTables, FeatureVector};
use crate::error::{ClassifierError, StartupError, StartupResult};
use crate::fields::feature_column_names;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Multinomial logistic model. Exposes a probability distribution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxModel {
    pub classes: Vec<String>,
    /// One coefficient row per class, one coefficient per feature column.
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl SoftmaxModel {
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("softmax model has no classes".into());
        }
        if self.coefficients.len() != self.classes.len()
            || self.intercepts.len() != self.classes.len()
        {
            return Err(format!(
                "softmax model has {} classes but {} coefficient rows and {} intercepts",
                self.classes.len(),
                self.coefficients.len(),
                self.intercepts.len()
            ));
        }
        if let Some(row) = self.coefficients.iter().find(|row| row.len() != n_features) {
            return Err(format!(
                "softmax coefficient row has {} entries, expected {n_features}",
                row.len()
            ));
        }
        Ok(())
    }
}

impl Classifier for SoftmaxModel {
    fn predict(&self, features: &FeatureVector) -> Result<String, ClassifierError> {
        let probabilities = self.predict_proba(features)?;
        let best = probabilities
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &p)| match best {
                Some((_, q)) if q >= p => best,
                _ => Some((i, p)),
            })
            .ok_or(ClassifierError::NoClasses)?;
        Ok(self.classes[best.0].clone())
    }
}

impl ProbabilisticClassifier for SoftmaxModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>, ClassifierError> {
        let x = numeric_input(features, self.coefficients.first().map_or(0, Vec::len))?;

        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, intercept)| intercept + row.iter().zip(&x).map(|(w, v)| w * v).sum::<f64>())
            .collect();

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(ClassifierError::NonFiniteOutput);
        }
        let exp: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        Ok(exp.into_iter().map(|e| e / total).collect())
    }
}

/// Nearest-centroid model. Produces a label only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CentroidModel {
    pub classes: Vec<String>,
    pub centroids: Vec<Vec<f64>>,
}

impl CentroidModel {
    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("centroid model has no classes".into());
        }
        if self.centroids.len() != self.classes.len() {
            return Err(format!(
                "centroid model has {} classes but {} centroids",
                self.classes.len(),
                self.centroids.len()
            ));
        }
        if let Some(c) = self.centroids.iter().find(|c| c.len() != n_features) {
            return Err(format!(
                "centroid has {} entries, expected {n_features}",
                c.len()
            ));
        }
        Ok(())
    }
}

impl Classifier for CentroidModel {
    fn predict(&self, features: &FeatureVector) -> Result<String, ClassifierError> {
        let x = numeric_input(features, self.centroids.first().map_or(0, Vec::len))?;

        let mut best: Option<(usize, f64)> = None;
        for (i, centroid) in self.centroids.iter().enumerate() {
            let distance: f64 = centroid.iter().zip(&x).map(|(c, v)| (c - v).powi(2)).sum();
            if !distance.is_finite() {
                return Err(ClassifierError::NonFiniteOutput);
            }
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }

        let (index, _) = best.ok_or(ClassifierError::NoClasses)?;
        Ok(self.classes[index].clone())
    }
}

fn numeric_input(features: &FeatureVector, expected: usize) -> Result<Vec<f64>, ClassifierError> {
    if features.len() != expected {
        return Err(ClassifierError::ShapeMismatch {
            expected,
            found: features.len(),
        });
    }
    features.to_numeric()
}

/// Model parameters, tagged by model family.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Softmax(SoftmaxModel),
    NearestCentroid(CentroidModel),
}

/// A trained classifier artifact as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArtifact {
    pub model_id: String,
    /// Column order the model was trained on; must match the codec's pinned layout.
    pub feature_columns: Vec<String>,
    pub model: ModelSpec,
    /// Tables embedded by self-contained pipeline artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_tables: Option<FeatureTables>,
}

impl ModelArtifact {
    /// Reads and checks an artifact file.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::FileRead`] if the file cannot be read, otherwise the errors of
    /// [`ModelArtifact::from_json`].
    pub fn load(path: &Path) -> StartupResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| StartupError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = Self::from_json(&json)?;
        tracing::info!(
            "Loaded model {} from {}",
            artifact.model_id,
            path.display()
        );
        Ok(artifact)
    }

    /// Parses and checks an artifact document.
    ///
    /// # Errors
    ///
    /// - [`StartupError::ArtifactLoad`] if the document is malformed or its parameters are
    ///   inconsistent
    /// - [`StartupError::ColumnOrderMismatch`] if `feature_columns` differs from the pinned layout
    pub fn from_json(json: &str) -> StartupResult<Self> {
        let artifact: Self =
            serde_json::from_str(json).map_err(|e| StartupError::ArtifactLoad(e.to_string()))?;
        artifact.check()?;
        Ok(artifact)
    }

    fn check(&self) -> StartupResult<()> {
        if self.model_id.trim().is_empty() {
            return Err(StartupError::ArtifactLoad("model_id cannot be empty".into()));
        }

        let expected = feature_column_names();
        if let Some(index) = (0..expected.len().max(self.feature_columns.len())).find(|&i| {
            self.feature_columns.get(i).map(String::as_str) != expected.get(i).copied()
        }) {
            return Err(StartupError::ColumnOrderMismatch(format!(
                "column {index}: model has {:?}, codec has {:?}",
                self.feature_columns.get(index),
                expected.get(index)
            )));
        }

        let n_features = expected.len();
        match &self.model {
            ModelSpec::Softmax(model) => model.check(n_features),
            ModelSpec::NearestCentroid(model) => model.check(n_features),
        }
        .map_err(StartupError::ArtifactLoad)?;

        if let Some(tables) = &self.feature_tables {
            tables.check_integrity()?;
        }
        Ok(())
    }

    /// Splits the artifact into its identifier, the classifier with its capability, and any
    /// embedded feature tables.
    pub fn into_parts(self) -> (String, LoadedClassifier, Option<FeatureTables>) {
        let classifier = match self.model {
            ModelSpec::Softmax(model) => LoadedClassifier::WithDistribution(Box::new(model)),
            ModelSpec::NearestCentroid(model) => LoadedClassifier::LabelOnly(Box::new(model)),
        };
        (self.model_id, classifier, self.feature_tables)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::codec::{FeatureCodec, ReferenceDataset};
    use crate::fields::FEATURE_COLUMN_COUNT;
    use crate::patient::PatientRecord;

    /// Softmax artifact whose only non-zero weight is on `has_diabetes`.
    pub(crate) fn diabetes_softmax() -> ModelArtifact {
        let columns = feature_column_names();
        let diabetes = columns
            .iter()
            .position(|c| *c == "has_diabetes")
            .expect("has_diabetes column");
        let mut weights = vec![0.0; FEATURE_COLUMN_COUNT];
        weights[diabetes] = 2.0;

        ModelArtifact {
            model_id: "ayur_softmax_test".into(),
            feature_columns: columns.into_iter().map(String::from).collect(),
            model: ModelSpec::Softmax(SoftmaxModel {
                classes: vec!["balanced".into(), "low_gi".into()],
                coefficients: vec![vec![0.0; FEATURE_COLUMN_COUNT], weights],
                intercepts: vec![0.0, 0.0],
            }),
            feature_tables: None,
        }
    }

    fn full_dataset() -> ReferenceDataset {
        let header = crate::fields::CategoricalField::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let row = vec!["x"; crate::fields::CategoricalField::ALL.len()].join(",");
        ReferenceDataset::from_reader(format!("{header}\n{row}\n").as_bytes()).expect("csv")
    }

    fn vector(has_diabetes: bool) -> FeatureVector {
        let codec = FeatureCodec::new(FeatureTables::build(&full_dataset()));
        let record = PatientRecord {
            has_diabetes,
            ..Default::default()
        };
        codec.encode(&record).vector
    }

    #[test]
    fn softmax_probabilities_follow_weights() {
        let artifact = diabetes_softmax();
        let ModelSpec::Softmax(model) = &artifact.model else {
            panic!("expected softmax");
        };

        let neutral = model.predict_proba(&vector(false)).expect("proba");
        assert!((neutral[0] - 0.5).abs() < 1e-12);

        let diabetic = model.predict_proba(&vector(true)).expect("proba");
        let expected = 1.0 / (1.0 + (-2.0f64).exp());
        assert!((diabetic[1] - expected).abs() < 1e-12);
        assert_eq!(model.predict(&vector(true)).expect("label"), "low_gi");
    }

    #[test]
    fn centroid_model_picks_nearest_class() {
        let far = vec![5.0; FEATURE_COLUMN_COUNT];
        let model = CentroidModel {
            classes: vec!["far".into(), "origin".into()],
            centroids: vec![far, vec![0.0; FEATURE_COLUMN_COUNT]],
        };
        assert_eq!(model.predict(&vector(false)).expect("label"), "origin");
    }

    #[test]
    fn text_column_fails_prediction() {
        let artifact = diabetes_softmax();
        let ModelSpec::Softmax(model) = &artifact.model else {
            panic!("expected softmax");
        };
        let dataset = ReferenceDataset::from_reader("gender\nmale\n".as_bytes()).expect("csv");
        let codec = FeatureCodec::new(FeatureTables::build(&dataset));
        let record = PatientRecord {
            season: Some("winter".into()),
            ..Default::default()
        };
        let vector = codec.encode(&record).vector;

        let err = model.predict_proba(&vector).expect_err("text column");
        assert!(matches!(err, ClassifierError::UnsupportedDtype { .. }));
    }

    #[test]
    fn json_round_trip_keeps_capability() {
        let json = serde_json::to_string(&diabetes_softmax()).expect("serialize");
        assert!(json.contains("\"type\":\"softmax\""));

        let artifact = ModelArtifact::from_json(&json).expect("parse artifact");
        let (model_id, classifier, tables) = artifact.into_parts();
        assert_eq!(model_id, "ayur_softmax_test");
        assert!(matches!(classifier, LoadedClassifier::WithDistribution(_)));
        assert!(tables.is_none());
    }

    #[test]
    fn column_order_mismatch_is_fatal() {
        let mut artifact = diabetes_softmax();
        artifact.feature_columns.swap(0, 1);
        let json = serde_json::to_string(&artifact).expect("serialize");

        let err = ModelArtifact::from_json(&json).expect_err("column mismatch");
        match err {
            StartupError::ColumnOrderMismatch(msg) => assert!(msg.starts_with("column 0")),
            other => panic!("expected ColumnOrderMismatch, got {other:?}"),
        }
    }

    #[test]
    fn inconsistent_parameters_are_fatal() {
        let mut artifact = diabetes_softmax();
        if let ModelSpec::Softmax(model) = &mut artifact.model {
            model.intercepts.pop();
        }
        let json = serde_json::to_string(&artifact).expect("serialize");
        let err = ModelArtifact::from_json(&json).expect_err("bad parameters");
        assert!(matches!(err, StartupError::ArtifactLoad(_)));
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = ModelArtifact::load(&dir.path().join("absent.json")).expect_err("no file");
        assert!(matches!(err, StartupError::FileRead { .. }));
    }
}
