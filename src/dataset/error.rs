use thiserror::Error;

/// Dataset-level failure. Any of these degrades the dataset to empty.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to fetch {path}: {status} - {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    #[error("failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to decompress payload: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("invalid JSON on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub type DatasetResult<T> = Result<T, DatasetError>;
