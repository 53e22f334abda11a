//! JSON response bodies shared by the endpoints, and the conversion of [Error] into HTTP responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::QueryRejection;
use serde::{Deserialize, Serialize};

use crate::{Error, ErrorKind};

/// The body of every error response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// A message describing what went wrong, safe to show to clients.
    pub error: String,
}

/// The body of responses that only carry a message, e.g. after a delete.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageBody {
    /// A human readable message.
    pub message: String,
}

/// Respond with 200 OK and `message` as a [MessageBody].
pub fn message_response(message: impl Into<String>) -> Response {
    (
        StatusCode::OK,
        Json(MessageBody {
            message: message.into(),
        }),
    )
        .into_response()
}

impl Error {
    /// The HTTP status code a client should see for this error.
    ///
    /// Deleting something that is already gone is reported as a bad request
    /// rather than not found, matching what existing clients expect.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::DeleteMissingTransaction | Error::NotSettled(_) | Error::MissingTransfer(_) => {
                return StatusCode::BAD_REQUEST;
            }
            _ => {}
        }

        match self.kind() {
            ErrorKind::Validation | ErrorKind::Forbidden | ErrorKind::Locked => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::UpstreamUnavailable | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidPayload(rejection.body_text())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidPayload(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidPayload(rejection.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self.kind() {
            ErrorKind::UpstreamUnavailable | ErrorKind::Internal => {
                tracing::error!("Responding with an internal server error: {self}");
                "An unexpected error occurred. Try again later or check the server logs."
                    .to_owned()
            }
            _ => {
                tracing::debug!("Rejecting request: {self}");
                self.to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
