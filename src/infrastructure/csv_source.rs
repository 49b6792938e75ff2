// CSV dataset source implementation
use crate::application::dataset_source::DatasetSource;
use crate::domain::record::RawRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    path: PathBuf,
    date_column: String,
    value_column: String,
    category_column: String,
}

impl CsvDatasetSource {
    pub fn new(
        path: PathBuf,
        date_column: String,
        value_column: String,
        category_column: String,
    ) -> Self {
        Self {
            path,
            date_column,
            value_column,
            category_column,
        }
    }

    /// Parse CSV text with a header row into raw records. Extra columns are
    /// ignored; the three configured columns must be present.
    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<RawRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_reader(bytes);

        let headers = reader.headers().context("Failed to read CSV header")?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("Column {:?} not found in {}", name, self.path.display()))
        };
        let date_idx = column(self.date_column.as_str())?;
        let value_idx = column(self.value_column.as_str())?;
        let category_idx = column(self.category_column.as_str())?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.context("Failed to parse CSV row")?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
            rows.push(RawRecord::new(
                field(date_idx),
                field(value_idx),
                field(category_idx),
            ));
        }

        tracing::debug!("Parsed {} CSV rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

#[async_trait]
impl DatasetSource for CsvDatasetSource {
    async fn load(&self) -> Result<Vec<RawRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        self.parse(&bytes)
    }
}
