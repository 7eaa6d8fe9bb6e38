//! CLI error type

use std::io;
use std::path::PathBuf;

use redlog_core::ConfigError;
use redlog_redis::{ConnectionError, SinkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("batch {batch} failed after {attempts} attempt(s): {source}")]
    Publish {
        batch: usize,
        attempts: u32,
        #[source]
        source: SinkError,
    },

    #[error("cannot read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading records failed: {0}")]
    Io(#[from] io::Error),

    #[error("{failed} of {total} endpoints unreachable")]
    Unreachable { failed: usize, total: usize },
}
