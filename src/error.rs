//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent a bill that could not be parsed or failed validation.
    ///
    /// The string describes every problem found with the bill and is shown to
    /// the client as-is.
    #[error("{0}")]
    InvalidBill(String),

    /// The bill ID in the request path is not a well-formed ID.
    ///
    /// Callers should pass in the rejected ID so that it can be logged.
    #[error("invalid bill ID")]
    InvalidBillId(String),

    /// The request body could not be read, e.g. it was larger than
    /// [REQUEST_BODY_LIMIT](crate::REQUEST_BODY_LIMIT).
    #[error("could not read request body: {0}")]
    InvalidRequestBody(String),

    /// The body of a response could not be read back for logging.
    #[error("could not read response body: {0}")]
    ResponseBodyError(String),

    /// Tried to delete a bill that does not exist
    #[error("bill does not exist")]
    DeleteMissingBill,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("not found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("{0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_CHECK,
                },
                description,
            ) => Error::InvalidBill(format!(
                "bill validation failed: {}",
                description.unwrap_or_else(|| "constraint failed".to_owned())
            )),
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// A description of what went wrong.
    pub message: String,
}

impl Error {
    /// The HTTP status code that this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidBill(_) | Error::InvalidBillId(_) | Error::InvalidRequestBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::DeleteMissingBill | Error::NotFound => StatusCode::NOT_FOUND,
            Error::SqlError(_) | Error::DatabaseLockError | Error::ResponseBodyError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (
            status_code,
            Json(ErrorResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
