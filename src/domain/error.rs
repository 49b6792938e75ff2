// Domain errors raised while turning raw rows into a chart
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    /// A raw field could not be coerced into its typed value.
    #[error("malformed record: field `{field}` has invalid value {raw:?}")]
    MalformedRecord { field: String, raw: String },

    /// No usable records remain, so no scale domain can be derived.
    #[error("dataset is empty: no records to chart")]
    EmptyDataset,
}
