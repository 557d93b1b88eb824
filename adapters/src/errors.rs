//! Custom error types specific to the `adapters` crate.
//!
//! This module defines errors that can occur while launching external programs,
//! issuing camera commands, or reading media files, providing a unified error
//! handling mechanism for all adapter interactions.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("{program} is not installed at {path}")]
    NotInstalled { program: &'static str, path: PathBuf },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No camera is connected")]
    NoCamera,

    #[error("Camera rejected `{command}`: {reply}")]
    Rejected { command: String, reply: String },

    #[error("{program} exited with status {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: i32,
        stderr: String,
    },

    #[error("Unexpected output from {program}: {reason}")]
    Parse { program: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
