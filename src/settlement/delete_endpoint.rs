use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, GroupId, YearMonth, db::lock_connection, responses::message_response,
    settlement::db::delete_settlement,
};

/// The state needed to delete a settlement.
#[derive(Debug, Clone)]
pub struct DeleteSettlementState {
    /// The database connection for managing settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteSettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting the settlement of a month, which reopens the month for changes.
pub async fn delete_settlement_endpoint(
    State(state): State<DeleteSettlementState>,
    path: Result<Path<(GroupId, String)>, PathRejection>,
) -> Result<Response, Error> {
    let Path((group_id, month)) = path?;
    let month: YearMonth = month.parse()?;

    let connection = lock_connection(&state.db_connection)?;
    delete_settlement(group_id, month, &connection)?;

    Ok(message_response(format!(
        "Deleted the settlement for {month}."
    )))
}
