//! Errors raised while loading and validating dataset snapshots.

use std::path::PathBuf;

/// Exit codes for trackdiff.
pub mod codes {
    pub const INVALID_INPUT: i32 = 1;
    pub const UNREADABLE_INPUT: i32 = 2;
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{label} is not a JSON object")]
    NotAnObject { label: &'static str },

    #[error("{label} is missing required key \"{key}\"")]
    MissingKey {
        label: &'static str,
        key: &'static str,
    },

    #[error("{map} empty")]
    EmptyMap { map: &'static str },

    #[error("{label} has a malformed {map} entry for \"{key}\": {reason}")]
    MalformedEntry {
        label: &'static str,
        map: &'static str,
        key: String,
        reason: String,
    },

    #[error("old and new snapshots are identical")]
    IdenticalSnapshots,
}

pub fn exit_code(err: &LoadError) -> i32 {
    match err {
        LoadError::Io { .. } | LoadError::Json { .. } => codes::UNREADABLE_INPUT,
        LoadError::NotAnObject { .. }
        | LoadError::MissingKey { .. }
        | LoadError::EmptyMap { .. }
        | LoadError::MalformedEntry { .. }
        | LoadError::IdenticalSnapshots => codes::INVALID_INPUT,
    }
}
