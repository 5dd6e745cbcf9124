//! CSV adapter: Implementation of DatasetSource.
//!
//! Reads the reference heart dataset (`OHCA.csv`) with the `csv` crate and
//! decodes each row through serde. The file is never written.

use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};

use crate::ports::{DatasetColumn, DatasetError, DatasetRow, DatasetSource};

/// Header columns every dataset file must carry.
const REQUIRED_COLUMNS: [&str; 2] = ["sex", "output"];

/// Dataset backed by a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvDataset {
    path: PathBuf,
}

impl CsvDataset {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode rows from any reader.
    ///
    /// # Errors
    /// Returns `DatasetError::Decode` for missing columns or malformed rows,
    /// and `DatasetError::Empty` when the input has a header but no rows.
    pub fn read_rows<R: Read>(reader: R) -> Result<Vec<DatasetRow>, DatasetError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| DatasetError::Decode(e.to_string()))?
            .clone();
        let required = DatasetColumn::ALL
            .iter()
            .map(DatasetColumn::header)
            .chain(REQUIRED_COLUMNS);
        for column in required {
            if !headers.iter().any(|h| h == column) {
                return Err(DatasetError::Decode(format!("missing column {column:?}")));
            }
        }

        let mut rows = Vec::new();
        for (line, result) in rdr.deserialize::<DatasetRow>().enumerate() {
            let row = result.map_err(|e| DatasetError::Decode(format!("row {}: {e}", line + 1)))?;
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(rows)
    }
}

impl DatasetSource for CsvDataset {
    fn load(&self) -> Result<Vec<DatasetRow>, DatasetError> {
        if !self.path.exists() {
            return Err(DatasetError::NotFound(format!("{:?}", self.path)));
        }
        let file = std::fs::File::open(&self.path)?;
        let rows = Self::read_rows(file)?;
        tracing::info!("Loaded {} dataset rows from {:?}", rows.len(), self.path);
        Ok(rows)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) const SAMPLE_CSV: &str = "\
age,sex,cp,trtbps,chol,fbs,restecg,thalachh,exng,oldpeak,slp,caa,thall,output
63,1,3,145,233,1,0,150,0,2.3,0,0,1,1
37,1,2,130,250,0,1,187,0,3.5,0,0,2,1
41,0,1,130,204,0,0,172,0,1.4,2,0,2,1
56,1,1,120,236,0,1,178,0,0.8,2,0,2,1
57,0,0,120,354,0,1,163,1,0.6,2,0,2,1
67,1,0,160,286,0,0,108,1,1.5,1,3,2,0
";

    #[test]
    fn test_read_rows() {
        let rows = CsvDataset::read_rows(SAMPLE_CSV.as_bytes()).expect("rows");
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].chol, 233.0);
        assert!((rows[1].oldpeak - 3.5).abs() < f64::EPSILON);
        assert!(!rows[5].presence());
    }

    #[test]
    fn test_missing_column() {
        let csv = "age,sex,output\n63,1,1\n";
        assert!(matches!(
            CsvDataset::read_rows(csv.as_bytes()),
            Err(DatasetError::Decode(_))
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        let header = SAMPLE_CSV.lines().next().expect("header");
        assert!(matches!(
            CsvDataset::read_rows(format!("{header}\n").as_bytes()),
            Err(DatasetError::Empty)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("OHCA.csv");
        std::fs::write(&path, SAMPLE_CSV).expect("write");

        let dataset = CsvDataset::new(&path);
        assert_eq!(dataset.load().expect("load").len(), 6);
        assert!(matches!(
            CsvDataset::new(temp.path().join("missing.csv")).load(),
            Err(DatasetError::NotFound(_))
        ));
    }
}
