//! Error types for each pipeline stage

use thiserror::Error;

/// Access token could not be obtained
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token endpoint could not be reached or returned garbage
    #[error("token request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Token endpoint answered with an error payload
    #[error("token endpoint rejected refresh ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
}

/// Recently played tracks could not be fetched
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("recently played request failed: {0}")]
    Api(#[from] reqwest::Error),

    #[error("recently played endpoint returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// A play event violates the extraction contract
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransformError {
    #[error("play event #{index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("play event #{index} has unparseable played_at `{value}`")]
    InvalidTimestamp { index: usize, value: String },
}

/// Records could not be persisted
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("could not attach staging schema at {path}: {source}")]
    AttachStaging {
        path: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Any failure of a full pipeline run
#[derive(Error, Debug)]
pub enum EtlError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl EtlError {
    /// Stage that produced the error, used in log lines
    pub fn stage(&self) -> &'static str {
        match self {
            EtlError::Auth(_) | EtlError::Extraction(_) => "extract",
            EtlError::Transform(_) => "transform",
            EtlError::Load(_) => "load",
        }
    }
}
