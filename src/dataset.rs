//! Fixed tabular dataset boundary
//!
//! Loads the demo CSV once at startup and exposes the stable column set, a
//! rendered sample of the first rows for prompt construction, and the raw CSV
//! text for handing the frame to the execution sandbox.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("dataset file not found: {0}")]
    NotFound(String),

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no header row")]
    MissingHeader,
}

/// The loaded tabular dataset
#[derive(Debug, Clone)]
pub struct TabularDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    csv_text: String,
}

impl TabularDataset {
    /// Load the dataset from a CSV file. Fatal at startup if missing or
    /// unreadable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_str(&text)
    }

    /// Parse a dataset from CSV text
    pub fn from_csv_str(text: &str) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if columns.is_empty() {
            return Err(DatasetError::MissingHeader);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Ok(Self {
            columns,
            rows,
            csv_text: text.to_string(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Raw CSV text, used to rebuild the frame inside the sandbox
    pub fn csv_text(&self) -> &str {
        &self.csv_text
    }

    /// Render the first `n` rows as a fixed-width text table (header
    /// included), the sample embedded into generation prompts.
    pub fn head_preview(&self, n: usize) -> String {
        let sample: Vec<&Vec<String>> = self.rows.iter().take(n).collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        for row in &sample {
            for (i, field) in row.iter().enumerate() {
                if i < widths.len() && field.len() > widths[i] {
                    widths[i] = field.len();
                }
            }
        }

        let render_row = |fields: &[String]| -> String {
            fields
                .iter()
                .enumerate()
                .map(|(i, f)| format!("{:width$}", f, width = widths.get(i).copied().unwrap_or(0)))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![render_row(&self.columns)];
        for row in sample {
            lines.push(render_row(row));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Region,Sales,Profit\nWest,100,20\nEast,250,-5\nSouth,75,12\n";

    #[test]
    fn parses_columns_and_rows() {
        let ds = TabularDataset::from_csv_str(SAMPLE).unwrap();
        assert_eq!(ds.columns(), &["Region", "Sales", "Profit"]);
        assert_eq!(ds.row_count(), 3);
    }

    #[test]
    fn head_preview_is_aligned_and_bounded() {
        let ds = TabularDataset::from_csv_str(SAMPLE).unwrap();
        let preview = ds.head_preview(2);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 rows
        assert!(lines[0].starts_with("Region"));
        assert!(lines[1].contains("West"));
        assert!(!preview.contains("South"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = TabularDataset::load("/no/such/dataset.csv").unwrap_err();
        assert!(matches!(err, DatasetError::NotFound(_)));
    }
}
