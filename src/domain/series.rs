// Series domain model - per-category time series and the grouped dataset
use super::record::Record;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub category: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn new(category: String, points: Vec<SeriesPoint>) -> Self {
        Self { category, points }
    }

    /// Bucket-average the points down to at most `max_points`, keeping each
    /// bucket's middle timestamp.
    pub fn downsampled(&self, max_points: usize) -> Vec<SeriesPoint> {
        if max_points == 0 || self.points.len() <= max_points {
            return self.points.clone();
        }

        let bucket_size = (self.points.len() as f64 / max_points as f64).ceil() as usize;
        self.points
            .chunks(bucket_size)
            .map(|chunk| {
                let avg = chunk.iter().map(|p| p.value).sum::<f64>() / chunk.len() as f64;
                SeriesPoint::new(chunk[chunk.len() / 2].timestamp, avg)
            })
            .collect()
    }
}

/// The full grouped dataset. Built once at load and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    categories: Vec<String>,
    series: HashMap<String, Series>,
}

impl Dataset {
    /// Sorted distinct categories observed in the data.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn series(&self, category: &str) -> Option<&Series> {
        self.series.get(category)
    }

    /// Series in category order.
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.categories.iter().filter_map(|c| self.series.get(c))
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.series.values().map(|s| s.points.len()).sum()
    }
}

pub struct SeriesGrouper;

impl SeriesGrouper {
    /// Partition records by category. Points within a series are sorted by
    /// timestamp; equal timestamps keep their input order.
    pub fn group(records: impl IntoIterator<Item = Record>) -> Dataset {
        let mut series: HashMap<String, Series> = HashMap::new();

        for record in records {
            series
                .entry(record.category.clone())
                .or_insert_with(|| Series::new(record.category, Vec::new()))
                .points
                .push(SeriesPoint::new(record.timestamp, record.value));
        }

        for s in series.values_mut() {
            s.points.sort_by_key(|p| p.timestamp);
        }

        let mut categories: Vec<String> = series.keys().cloned().collect();
        categories.sort();

        Dataset { categories, series }
    }
}
