//! Encoder and scaler tables.
//!
//! Tables are fitted once from the reference dataset, persisted as YAML and reloaded on later
//! starts. After construction they are never mutated; the service shares them read-only.

use crate::constants::{MAPPINGS_FILENAME, UNKNOWN_CATEGORY};
use crate::error::{StartupError, StartupResult};
use crate::fields::{feature_column_names, CategoricalField, NumericField};
use crate::codec::dataset::ReferenceDataset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Label vocabulary of one categorical field. A label's code is its index in `classes`, which is
/// kept sorted so the mapping is reproducible regardless of dataset row order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Fits an encoder over the observed labels. Blank cells count as [`UNKNOWN_CATEGORY`].
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| {
                let v = v.trim();
                if v.is_empty() {
                    UNKNOWN_CATEGORY.to_owned()
                } else {
                    v.to_owned()
                }
            })
            .collect();
        Self {
            classes: classes.into_iter().collect(),
        }
    }

    pub fn code(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(label))
            .ok()
    }

    pub fn label(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    fn check(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("encoder has no classes".into());
        }
        if self.classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err("encoder classes are not strictly sorted".into());
        }
        Ok(())
    }
}

/// Z-score parameters of one numeric field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    pub mean: f64,
    pub std_dev: f64,
}

impl Standardizer {
    /// Fits mean and population standard deviation, imputing missing values with the mean of the
    /// present ones first. Returns `None` when no value is present.
    pub fn fit(values: &[Option<f64>]) -> Option<Self> {
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            return None;
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;

        let imputed = values.iter().map(|v| v.unwrap_or(mean));
        let variance = imputed.map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let std_dev = variance.sqrt();

        Some(Self {
            mean,
            // A constant column carries no information; keep it at the mean after scaling.
            std_dev: if std_dev > 0.0 { std_dev } else { 1.0 },
        })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    fn check(&self) -> Result<(), String> {
        if !self.mean.is_finite() || !self.std_dev.is_finite() || self.std_dev <= 0.0 {
            return Err(format!(
                "invalid scaler statistics (mean={}, std_dev={})",
                self.mean, self.std_dev
            ));
        }
        Ok(())
    }
}

pub type EncoderTable = BTreeMap<CategoricalField, CategoryEncoder>;
pub type ScalerTable = BTreeMap<NumericField, Standardizer>;

/// Encoder and scaler tables together with the column order they were built for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureTables {
    pub feature_columns: Vec<String>,
    pub encoders: EncoderTable,
    pub scalers: ScalerTable,
}

/// Documentation entry written to `mappings.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderMapping {
    pub classes: Vec<String>,
    pub n_classes: usize,
}

impl FeatureTables {
    /// Fits every encoder and scaler whose column exists in the dataset.
    pub fn build(dataset: &ReferenceDataset) -> Self {
        let mut encoders = EncoderTable::new();
        for field in CategoricalField::ALL {
            let Some(cells) = dataset.column(field.as_str()) else {
                tracing::warn!("Reference dataset has no column {}, skipping encoder", field.as_str());
                continue;
            };
            let encoder = CategoryEncoder::fit(cells);
            tracing::info!(
                "Built encoder for {} with {} classes",
                field.as_str(),
                encoder.classes().len()
            );
            encoders.insert(field, encoder);
        }

        let mut scalers = ScalerTable::new();
        for field in NumericField::ALL {
            let Some(cells) = dataset.column(field.as_str()) else {
                tracing::warn!("Reference dataset has no column {}, skipping scaler", field.as_str());
                continue;
            };
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| cell.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
                .collect();
            match Standardizer::fit(&values) {
                Some(scaler) => {
                    tracing::info!("Built scaler for {}", field.as_str());
                    scalers.insert(field, scaler);
                }
                None => {
                    tracing::warn!("Could not build scaler for {}: no numeric values", field.as_str());
                }
            }
        }

        Self {
            feature_columns: feature_column_names().into_iter().map(String::from).collect(),
            encoders,
            scalers,
        }
    }

    /// Class vocabularies keyed by field name, as documented in `mappings.json`.
    pub fn mappings(&self) -> BTreeMap<String, EncoderMapping> {
        self.encoders
            .iter()
            .map(|(field, encoder)| {
                (
                    field.as_str().to_owned(),
                    EncoderMapping {
                        classes: encoder.classes().to_vec(),
                        n_classes: encoder.classes().len(),
                    },
                )
            })
            .collect()
    }

    /// Verifies the tables were built for the pinned column layout and hold sane values.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::CorruptTables`] describing the first problem found.
    pub fn check_integrity(&self) -> StartupResult<()> {
        let expected = feature_column_names();
        if self.feature_columns.iter().map(String::as_str).ne(expected.iter().copied()) {
            return Err(StartupError::CorruptTables(
                "feature column order differs from the pinned layout".into(),
            ));
        }
        for (field, encoder) in &self.encoders {
            encoder
                .check()
                .map_err(|e| StartupError::CorruptTables(format!("{}: {e}", field.as_str())))?;
        }
        for (field, scaler) in &self.scalers {
            scaler
                .check()
                .map_err(|e| StartupError::CorruptTables(format!("{}: {e}", field.as_str())))?;
        }
        Ok(())
    }

    /// Writes the tables as YAML to `path` and the encoder documentation to a sibling
    /// `mappings.json`.
    ///
    /// # Errors
    ///
    /// Returns a [`StartupError`] if serialisation or either write fails.
    pub fn save(&self, path: &Path) -> StartupResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StartupError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let yaml = serde_yaml::to_string(self).map_err(StartupError::TablesSerialization)?;
        std::fs::write(path, yaml).map_err(|source| StartupError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Saved feature tables to {}", path.display());

        let mappings_path = path.with_file_name(MAPPINGS_FILENAME);
        let json = serde_json::to_string_pretty(&self.mappings())
            .map_err(StartupError::MappingsSerialization)?;
        std::fs::write(&mappings_path, json).map_err(|source| StartupError::FileWrite {
            path: mappings_path.clone(),
            source,
        })?;
        tracing::info!("Saved mappings to {}", mappings_path.display());

        Ok(())
    }

    /// Reads tables written by [`FeatureTables::save`] and checks their integrity.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::FileRead`] if the file cannot be read and
    /// [`StartupError::CorruptTables`] if it cannot be parsed or fails the integrity check.
    pub fn load(path: &Path) -> StartupResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|source| StartupError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let tables: Self = serde_yaml::from_str(&yaml)
            .map_err(|e| StartupError::CorruptTables(e.to_string()))?;
        tables.check_integrity()?;
        tracing::info!("Loaded feature tables from {}", path.display());
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> ReferenceDataset {
        let csv = "\
diet_type,gender,age,bmi,sleep_hours
vegetarian,male,30,22,
vegan,female,40,,7
vegetarian,,50,26,7
";
        ReferenceDataset::from_reader(csv.as_bytes()).expect("parse csv")
    }

    #[test]
    fn encoder_codes_are_sorted_and_stable() {
        let a = CategoryEncoder::fit(["vegetarian", "vegan", "keto"]);
        let b = CategoryEncoder::fit(["keto", "vegetarian", "vegan", "keto"]);
        assert_eq!(a, b);
        assert_eq!(a.code("keto"), Some(0));
        assert_eq!(a.code("vegan"), Some(1));
        assert_eq!(a.code("vegetarian"), Some(2));
        assert_eq!(a.code("paleo"), None);
        assert_eq!(a.label(1), Some("vegan"));
    }

    #[test]
    fn blank_cells_become_unknown() {
        let tables = FeatureTables::build(&dataset());
        let gender = &tables.encoders[&CategoricalField::Gender];
        assert_eq!(gender.classes(), ["female", "male", "unknown"]);
    }

    #[test]
    fn scaler_imputes_missing_with_mean() {
        let tables = FeatureTables::build(&dataset());
        let bmi = tables.scalers[&NumericField::Bmi];
        assert!((bmi.mean - 24.0).abs() < 1e-12);
        // Imputed column is [22, 24, 26]: population variance 8/3.
        assert!((bmi.std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_column_gets_unit_deviation() {
        let tables = FeatureTables::build(&dataset());
        let sleep = tables.scalers[&NumericField::SleepHours];
        assert_eq!(sleep.mean, 7.0);
        assert_eq!(sleep.std_dev, 1.0);
        assert_eq!(sleep.transform(7.0), 0.0);
    }

    #[test]
    fn absent_columns_are_skipped() {
        let tables = FeatureTables::build(&dataset());
        assert!(!tables.encoders.contains_key(&CategoricalField::Season));
        assert!(!tables.scalers.contains_key(&NumericField::WaistCircumferenceCm));
        assert_eq!(tables.feature_columns.len(), crate::fields::FEATURE_COLUMN_COUNT);
    }

    #[test]
    fn save_and_load_preserve_tables() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("model").join("feature_tables.yaml");
        let tables = FeatureTables::build(&dataset());

        tables.save(&path).expect("save tables");
        let loaded = FeatureTables::load(&path).expect("load tables");
        assert_eq!(loaded, tables);

        let mappings = std::fs::read_to_string(dir.path().join("model").join(MAPPINGS_FILENAME))
            .expect("read mappings");
        let mappings: BTreeMap<String, EncoderMapping> =
            serde_json::from_str(&mappings).expect("parse mappings");
        assert_eq!(mappings["diet_type"].n_classes, 2);
    }

    #[test]
    fn load_rejects_unsorted_classes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("feature_tables.yaml");
        let mut tables = FeatureTables::build(&dataset());
        tables.encoders.insert(
            CategoricalField::Season,
            CategoryEncoder {
                classes: vec!["winter".into(), "summer".into()],
            },
        );
        tables.save(&path).expect("save tables");

        let err = FeatureTables::load(&path).expect_err("unsorted classes");
        match err {
            StartupError::CorruptTables(msg) => assert!(msg.contains("season")),
            other => panic!("expected CorruptTables, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_foreign_column_order() {
        let mut tables = FeatureTables::build(&dataset());
        tables.feature_columns.swap(0, 1);
        let err = tables.check_integrity().expect_err("column order");
        assert!(matches!(err, StartupError::CorruptTables(_)));
    }
}
