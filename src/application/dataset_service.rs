// Dataset service - Use case for loading and grouping the chart data
use crate::application::dataset_source::DatasetSource;
use crate::domain::record::RecordNormalizer;
use crate::domain::series::{Dataset, SeriesGrouper};
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;

/// What to do with a row that fails normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    #[default]
    Skip,
    Abort,
}

#[derive(Clone)]
pub struct DatasetService {
    source: Arc<dyn DatasetSource>,
    normalizer: RecordNormalizer,
    policy: MalformedPolicy,
}

impl DatasetService {
    pub fn new(
        source: Arc<dyn DatasetSource>,
        normalizer: RecordNormalizer,
        policy: MalformedPolicy,
    ) -> Self {
        Self {
            source,
            normalizer,
            policy,
        }
    }

    pub async fn load(&self) -> anyhow::Result<Dataset> {
        let rows = self.source.load().await.context("Failed to load dataset")?;
        let total = rows.len();

        let mut records = Vec::with_capacity(total);
        let mut skipped = 0usize;
        for (i, raw) in rows.iter().enumerate() {
            match self.normalizer.normalize(raw) {
                Ok(record) => records.push(record),
                Err(e) => match self.policy {
                    MalformedPolicy::Skip => {
                        tracing::warn!("Skipping row {}: {}", i + 1, e);
                        skipped += 1;
                    }
                    MalformedPolicy::Abort => {
                        return Err(anyhow::Error::new(e).context(format!("Row {}", i + 1)));
                    }
                },
            }
        }

        let dataset = SeriesGrouper::group(records);
        if dataset.is_empty() {
            tracing::warn!("No usable rows out of {}", total);
        }
        tracing::info!(
            "Loaded {} rows ({} skipped) into {} series, {} points",
            total,
            skipped,
            dataset.categories().len(),
            dataset.point_count()
        );

        Ok(dataset)
    }
}
