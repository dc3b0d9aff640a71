//! Provides the error type returned when importing a `.bvh` file.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Index;

/// Importing is all-or-nothing: every variant means the import failed and no
/// model was produced. The variant only says why.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File contains no tokens")]
    Empty,
    #[error("Expected {expected} at token {index}, found end of file")]
    UnexpectedEof { index: Index, expected: &'static str },
    #[error("Expected {expected} at token {index}, found `{found}`")]
    UnexpectedToken {
        index: Index,
        expected: &'static str,
        found: String,
    },
    #[error("Invalid number `{token}` at token {index}")]
    InvalidNumber { index: Index, token: String },
    #[error("Joint `{joint}` declares `{count}` channels, expected 3 or 6")]
    InvalidChannelCount { joint: String, count: String },
    #[error("Unknown channel `{channel}` on joint `{joint}`")]
    UnknownChannel { joint: String, channel: String },
    #[error("Joint `{joint}` has an unsupported channel layout: {reason}")]
    InvalidChannelLayout { joint: String, reason: &'static str },
    #[error("Hierarchy is nested deeper than {max_depth} joints")]
    TooDeep { max_depth: usize },
    #[error("Hierarchy declares no ROOT joint")]
    MissingRoot,
    #[error("Invalid frame time {0}")]
    InvalidFrameTime(f64),
    #[error("Motion section holds {found} values, expected {expected}")]
    FrameDataMismatch { expected: usize, found: usize },
}
