//! Error type shared by every stage of the generator.
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // ------------------------------ Config -------------------------------- //
    #[error("failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: &'static str, message: String },

    // ------------------------------ Input --------------------------------- //
    #[error("no input files configured")]
    NoInput,

    #[error("glob pattern matched no files: {pattern}")]
    GlobNoMatch { pattern: String },

    #[error("invalid glob pattern: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("failed to expand glob: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode line {line} of {path}: {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("no samples were read; nothing to infer")]
    NoSamples,

    // ------------------------------ Model --------------------------------- //
    #[error(
        "only {found} of the {candidates} marker candidates are unused as field-name prefixes; \
         add characters to the marker candidate list"
    )]
    MarkersExhausted { candidates: usize, found: usize },

    // ------------------------------ Output -------------------------------- //
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
