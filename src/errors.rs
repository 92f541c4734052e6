use crate::models::RecordId;
use crate::store::Collection;
use axum::http::StatusCode;
use thiserror::Error;

/// A persistence call failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid record data: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{backend} responded with status {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("no {collection} record with id {id}")]
    NotFound { collection: Collection, id: RecordId },

    #[error("{0}")]
    Rejected(String),
}

/// An import file could not be read.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON format.")]
    InvalidJson,

    #[error("Invalid JSON format: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid CSV format: {0}")]
    InvalidCsv(String),

    #[error("Unsupported file type '{0}'. Import a .json or .csv export.")]
    UnsupportedFile(String),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::InvalidCsv(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("'{value}' is not a valid {field}")]
    UnknownOption { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("no favorite with id {0}")]
    UnknownFavorite(RecordId),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    pub fn bad_gateway(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::not_found(err.to_string()),
            StoreError::Io(_) | StoreError::Serde(_) => Self::internal(err),
            StoreError::Http(_) | StoreError::Status { .. } | StoreError::Rejected(_) => {
                Self::bad_gateway(err)
            }
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Store(err) => err.into(),
            TrackerError::Import(err) => Self::bad_request(err.to_string()),
            TrackerError::Validation(err) => Self::bad_request(err.to_string()),
            TrackerError::Export(err) => Self::internal(err),
            TrackerError::UnknownFavorite(_) => Self::not_found(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
