//! Reference dataset access.
//!
//! The reference dataset is a CSV file with a header row. It is read once, when the feature
//! tables are built, and never touched during request handling. Cells are kept as raw text; the
//! table builder decides how to interpret each column.

use crate::error::DatasetError;
use std::io::Read;
use std::path::Path;

/// Tabular historical records used to fit encoders and scalers.
#[derive(Clone, Debug)]
pub struct ReferenceDataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReferenceDataset {
    /// Reads a CSV file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Csv`] if the file cannot be opened or parsed, and
    /// [`DatasetError::Empty`] if it holds no data rows.
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let dataset = Self::collect(reader)?;
        tracing::info!(
            "Loaded reference dataset with {} rows from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Reads CSV data from any reader.
    ///
    /// # Errors
    ///
    /// Same as [`ReferenceDataset::from_path`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        Self::collect(reader)
    }

    fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DatasetError> {
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_owned).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()?;

        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Raw cells of the named column, one per row, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_columns_by_name() {
        let csv = "gender,age\nmale,35\nfemale,\n";
        let dataset = ReferenceDataset::from_reader(csv.as_bytes()).expect("parse csv");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.column("gender"), Some(vec!["male", "female"]));
        assert_eq!(dataset.column("age"), Some(vec!["35", ""]));
        assert_eq!(dataset.column("season"), None);
    }

    #[test]
    fn header_only_file_is_empty() {
        let err = ReferenceDataset::from_reader("gender,age\n".as_bytes())
            .expect_err("no data rows");
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "diet_type\nvegan\nvegetarian").expect("write csv");
        let dataset = ReferenceDataset::from_path(file.path()).expect("read csv");
        assert!(dataset.has_column("diet_type"));
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "gender,age\nmale,35,extra\n";
        let err = ReferenceDataset::from_reader(csv.as_bytes()).expect_err("ragged row");
        assert!(matches!(err, DatasetError::Csv(_)));
    }
}
