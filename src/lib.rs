//! Kakeibo is the account service of a household-bookkeeping application.
//!
//! This library provides a JSON REST API for the shared expenses of a group:
//! recording group transactions, searching them, and settling a month so that
//! every member ends up having paid the same amount.
//!
//! Once a month is settled its transactions are locked, and they stay locked
//! until the settlement is deleted.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod category;
mod config;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod membership;
mod month;
mod responses;
mod routing;
mod settlement;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::ServerConfig;
pub use database_id::{GroupId, TransactionId, TransferId};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use membership::{HttpMembershipOracle, Membership, MembershipOracle};
pub use month::YearMonth;
pub use routing::build_router;
pub use user::UserID;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The broad category an [Error] falls into.
///
/// The HTTP layer decides status codes from the kind, so new error variants only
/// need to pick the right kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, e.g. a bad path ID, month or body field.
    Validation,
    /// The session is missing or has expired.
    Auth,
    /// The session is valid but the user is not a member of the group.
    Forbidden,
    /// The month has already been settled.
    Locked,
    /// The entity being created already exists.
    Conflict,
    /// The referenced entity does not exist.
    NotFound,
    /// The membership oracle did not answer in time.
    UpstreamUnavailable,
    /// Everything else.
    Internal,
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A month was not in the strict `yyyy-MM` format.
    #[error("\"{0}\" is not a valid month, expected the format yyyy-MM")]
    InvalidMonth(String),

    /// A date was not in the `yyyy-MM-dd` format.
    #[error("\"{0}\" is not a valid date, expected the format yyyy-MM-dd")]
    InvalidDate(String),

    /// Transaction amounts are counted in the minor currency unit and must be at least one.
    #[error("the amount must be a positive integer, got {0}")]
    InvalidAmount(i64),

    /// A transaction payload did not set exactly one of its medium and custom category.
    #[error("exactly one of medium_category_id and custom_category_id must be set")]
    BadCategory,

    /// The medium or custom category does not exist, does not belong to the
    /// big category, or belongs to another group.
    #[error("the category does not exist or does not belong to the given big category")]
    InvalidCategory,

    /// The lower bound of an amount range was greater than the upper bound.
    #[error("the low amount {0} is greater than the high amount {1}")]
    InvalidAmountRange(i64, i64),

    /// A search limit outside of the allowed range.
    #[error("the limit must be between 1 and {max}, got {0}", max = crate::transaction::MAX_SEARCH_LIMIT)]
    InvalidLimit(u32),

    /// A month cannot be settled when nobody owes anybody anything.
    #[error("there is nothing to settle for {0}")]
    NothingToSettle(YearMonth),

    /// The transfer named in the request path was not part of the request body.
    #[error("the transfer {0} is not in the list of transfers to update")]
    TransferIdMismatch(TransferId),

    /// The request path, query string or body could not be parsed.
    #[error("invalid request: {0}")]
    InvalidPayload(String),

    /// The request did not carry a session cookie, or the session has expired.
    #[error("no valid session")]
    NoSession,

    /// The user behind the session is not a member of the group in the request path.
    #[error("user {0} is not a member of group {1}")]
    NotGroupMember(UserID, GroupId),

    /// The month the transaction belongs to has been settled, so its
    /// transactions can no longer change.
    #[error("the transactions for {0} have been settled and can no longer be changed")]
    MonthLocked(YearMonth),

    /// A settlement for the month already exists.
    #[error("the transactions for {0} have already been settled")]
    AlreadySettled(YearMonth),

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to delete the settlement of a month that has not been settled.
    #[error("the transactions for {0} have not been settled")]
    NotSettled(YearMonth),

    /// Tried to update a transfer that is not part of the settlement.
    #[error("the transfer {0} is not part of this settlement")]
    MissingTransfer(TransferId),

    /// The membership oracle could not be reached or gave an unexpected answer.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("the membership service is unavailable: {0}")]
    MembershipUnavailable(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// The broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidMonth(_)
            | Error::InvalidDate(_)
            | Error::InvalidAmount(_)
            | Error::BadCategory
            | Error::InvalidCategory
            | Error::InvalidAmountRange(_, _)
            | Error::InvalidLimit(_)
            | Error::NothingToSettle(_)
            | Error::TransferIdMismatch(_)
            | Error::InvalidPayload(_) => ErrorKind::Validation,
            Error::NoSession => ErrorKind::Auth,
            Error::NotGroupMember(_, _) => ErrorKind::Forbidden,
            Error::MonthLocked(_) => ErrorKind::Locked,
            Error::AlreadySettled(_) => ErrorKind::Conflict,
            Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::NotSettled(_)
            | Error::MissingTransfer(_) => ErrorKind::NotFound,
            Error::MembershipUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Error::SqlError(_) | Error::DatabaseLockError => ErrorKind::Internal,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred: {}", value);
        Error::SqlError(value)
    }
}
