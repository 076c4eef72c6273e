//! Errors shared by the server, the correction store, and the client.
//! An empty id lookup is not among them: it is a pipeline state.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StitchError {
    /// Non-2xx status, transport failure, timeout, or unusable body.
    #[error("{gateway} request failed: {message}")]
    Upstream {
        gateway: &'static str,
        message: String,
    },

    /// Correction store could not be read, parsed, or written.
    #[error("title store {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    /// Invalid configuration; fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StitchError {
    pub fn upstream(gateway: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            gateway,
            message: message.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
