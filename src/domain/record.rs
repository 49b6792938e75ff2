// Record domain model - raw rows and their typed form
use super::error::ChartError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// One row as delivered by a dataset source, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub date: String,
    pub value: String,
    pub category: String,
}

impl RawRecord {
    pub fn new(
        date: impl Into<String>,
        value: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            value: value.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Coerces raw rows into records.
///
/// Field names are only used to label errors, so they should match the
/// column names the rows were read from.
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    date_field: String,
    value_field: String,
    category_field: String,
    date_formats: Vec<String>,
}

impl RecordNormalizer {
    pub fn new(
        date_field: impl Into<String>,
        value_field: impl Into<String>,
        category_field: impl Into<String>,
        date_formats: Vec<String>,
    ) -> Self {
        Self {
            date_field: date_field.into(),
            value_field: value_field.into(),
            category_field: category_field.into(),
            date_formats,
        }
    }

    pub fn normalize(&self, raw: &RawRecord) -> Result<Record, ChartError> {
        let category = raw.category.trim();
        if category.is_empty() {
            return Err(self.malformed(&self.category_field, &raw.category));
        }

        let timestamp = self
            .parse_date(raw.date.trim())
            .ok_or_else(|| self.malformed(&self.date_field, &raw.date))?;

        let value = raw
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.malformed(&self.value_field, &raw.value))?;

        Ok(Record {
            category: category.to_string(),
            timestamp,
            value,
        })
    }

    /// RFC 3339 first, then each configured pattern as a date-time and as a
    /// plain date (midnight UTC).
    fn parse_date(&self, text: &str) -> Option<DateTime<Utc>> {
        if text.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Some(ts.with_timezone(&Utc));
        }

        self.date_formats.iter().find_map(|format| {
            NaiveDateTime::parse_from_str(text, format)
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(text, format)
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(|naive| naive.and_utc())
        })
    }

    fn malformed(&self, field: &str, raw: &str) -> ChartError {
        ChartError::MalformedRecord {
            field: field.to_string(),
            raw: raw.to_string(),
        }
    }
}
