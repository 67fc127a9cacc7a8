//! Shared error types for the services crate.

use thiserror::Error;

use storage::blob::BlobError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by identity providers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("not authenticated")]
    NotAuthenticated,
}

/// Errors emitted while estimating artifact duration.
///
/// Always recovered by the upload pipeline; a failed estimate falls back
/// to the default duration instead of aborting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodingError {
    #[error("unrecognized audio container: {0}")]
    Unsupported(String),
    #[error("audio stream carries no track")]
    NoAudioTrack,
    #[error("audio stream carries no duration information")]
    UnknownDuration,
}

/// Errors emitted by `UploadService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UploadError {
    #[error(transparent)]
    Authentication(#[from] IdentityError),
    #[error("artifact storage failed: {0}")]
    Storage(#[from] BlobError),
    #[error("session persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error(transparent)]
    Authentication(#[from] IdentityError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CoachService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoachError {
    #[error("voice coach is not configured")]
    Disabled,
    #[error("voice coach returned an empty reply")]
    EmptyResponse,
    #[error("voice coach request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("failed to encode coaching context: {0}")]
    Context(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
