//! Dataset loading: sources, NDJSON decoding and the snapshot-owning service

pub mod decoder;
pub mod error;
pub mod service;
pub mod source;

pub use decoder::{decode_ndjson, decode_ndjson_gz, Decoded};
pub use error::{DatasetError, DatasetResult};
pub use service::{
    DataService, DatasetPaths, FailureReporter, LogReporter, Snapshot, ALL_FAILED_MESSAGE,
};
pub use source::{DatasetSource, DirectorySource, HttpSource};
