//! Feature codec: turns a validated patient record into the model's input vector.
//!
//! The codec owns the fitted [`FeatureTables`] and applies them per request:
//! - categorical fields become integer codes; unseen labels get code 0 and an [`EncodingWarning`]
//! - numeric fields are z-scored; missing numbers become 0.0, i.e. the training mean
//! - fields without a table entry pass through unchanged; absent ones become 0.0
//!
//! The output column order is [`crate::fields::feature_columns`], never the dataset's.

pub mod dataset;
pub mod tables;

pub use dataset::ReferenceDataset;
pub use tables::{CategoryEncoder, EncoderMapping, EncoderTable, FeatureTables, ScalerTable, Standardizer};

use crate::constants::UNKNOWN_CATEGORY;
use crate::error::ClassifierError;
use crate::fields::{feature_columns, CategoricalField, FeatureColumn, NumericField};
use crate::patient::PatientRecord;
use serde::Serialize;

/// A single model input cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    /// An unencoded label, passed through because no encoder exists for its column.
    Text(String),
}

/// Model input in the pinned column order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureVector {
    columns: Vec<&'static str>,
    values: Vec<FeatureValue>,
}

impl FeatureVector {
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn values(&self) -> &[FeatureValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        let index = self.columns.iter().position(|c| *c == column)?;
        self.values.get(index)
    }

    /// All cells as numbers, for estimators that only accept numeric input.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::UnsupportedDtype`] naming the first text column.
    pub fn to_numeric(&self) -> Result<Vec<f64>, ClassifierError> {
        self.columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| match value {
                FeatureValue::Number(n) => Ok(*n),
                FeatureValue::Text(_) => Err(ClassifierError::UnsupportedDtype {
                    column: (*column).to_owned(),
                }),
            })
            .collect()
    }
}

/// Non-fatal signal that a categorical label was not in the encoder vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodingWarning {
    pub field: CategoricalField,
    pub value: String,
}

impl std::fmt::Display for EncodingWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unseen value '{}' for {}, using default code 0",
            self.value,
            self.field.as_str()
        )
    }
}

/// Result of encoding one record.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedFeatures {
    pub vector: FeatureVector,
    pub warnings: Vec<EncodingWarning>,
}

/// Applies fitted tables to patient records. Cheap to share; holds no per-request state.
#[derive(Clone, Debug)]
pub struct FeatureCodec {
    tables: FeatureTables,
}

impl FeatureCodec {
    pub fn new(tables: FeatureTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &FeatureTables {
        &self.tables
    }

    /// Encodes a record. Never fails: unseen labels degrade to code 0 with a warning.
    pub fn encode(&self, record: &PatientRecord) -> EncodedFeatures {
        let columns = feature_columns();
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut warnings = Vec::new();

        for column in columns {
            let value = match column {
                FeatureColumn::Categorical(field) => {
                    self.encode_categorical(field, record.categorical(field), &mut warnings)
                }
                FeatureColumn::Numeric(field) => self.encode_numeric(field, record.numeric(field)),
                FeatureColumn::Condition(flag) => flag_value(record.condition(flag)),
                FeatureColumn::Preference(flag) => flag_value(record.preference(flag)),
            };
            names.push(column.name());
            values.push(value);
        }

        EncodedFeatures {
            vector: FeatureVector {
                columns: names,
                values,
            },
            warnings,
        }
    }

    fn encode_categorical(
        &self,
        field: CategoricalField,
        value: Option<&str>,
        warnings: &mut Vec<EncodingWarning>,
    ) -> FeatureValue {
        let Some(encoder) = self.tables.encoders.get(&field) else {
            // No vocabulary for this column: absent values fill with 0 like any missing cell.
            return match value {
                Some(label) => FeatureValue::Text(label.to_owned()),
                None => FeatureValue::Number(0.0),
            };
        };

        match value {
            Some(label) => match encoder.code(label) {
                Some(code) => FeatureValue::Number(code as f64),
                None => {
                    tracing::warn!("Unseen value '{}' for {}, using default", label, field.as_str());
                    warnings.push(EncodingWarning {
                        field,
                        value: label.to_owned(),
                    });
                    FeatureValue::Number(0.0)
                }
            },
            // Absent is not unseen: use the vocabulary's "unknown" code when it has one.
            None => FeatureValue::Number(encoder.code(UNKNOWN_CATEGORY).unwrap_or(0) as f64),
        }
    }

    fn encode_numeric(&self, field: NumericField, value: Option<f64>) -> FeatureValue {
        let Some(value) = value else {
            return FeatureValue::Number(0.0);
        };
        match self.tables.scalers.get(&field) {
            Some(scaler) => FeatureValue::Number(scaler.transform(value)),
            None => FeatureValue::Number(value),
        }
    }
}

fn flag_value(flag: bool) -> FeatureValue {
    FeatureValue::Number(if flag { 1.0 } else { 0.0 })
}
