//! Error types.
//!
//! Only [`InlineError`] ever fails a transform. Everything that goes wrong
//! with a stylesheet, a fetch or the cache is recovered from and reported as
//! a [`Diagnostic`].

use std::io;
use std::time::Duration;

use css::CssDiagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InlineError>;

/// Fatal errors.
#[derive(Debug, Error)]
pub enum InlineError {
    #[error("invalid base url `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] io::Error),
}

/// Why a stylesheet could not be loaded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unsupported location `{0}`")]
    Unsupported(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// A cache backend call failed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),
}

/// A recovered, non-fatal problem.
#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Css(#[from] CssDiagnostic),

    #[error("could not load stylesheet `{url}`: {source}")]
    FetchFailure {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("{source}; computing without the cache")]
    CacheUnavailable {
        #[from]
        source: CacheError,
    },
}
