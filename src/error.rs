use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, AggregateError>;

/// Contract violations and I/O failures surfaced by the aggregator.
///
/// Nothing in the crate catches these; callers decide whether to fall back
/// to an empty view or halt the week advance.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("duplicate catalog item id {id}")]
    DuplicateItem { id: String },

    #[error("invalid {field} for item {item_id}: {value}")]
    InvalidMetric {
        item_id: String,
        field: &'static str,
        value: f64,
    },

    #[error("failed to read or write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {origin}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to scan {}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl AggregateError {
    pub(crate) fn invalid_metric(item_id: &str, field: &'static str, value: f64) -> Self {
        Self::InvalidMetric {
            item_id: item_id.to_string(),
            field,
            value,
        }
    }
}
