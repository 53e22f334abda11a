use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, GroupId, YearMonth,
    db::lock_connection,
    responses::message_response,
    settlement::{
        aggregation::totals_by_user, db::read_settlement, response::SettlementResponse,
    },
};

/// The state needed to read a settlement.
#[derive(Debug, Clone)]
pub struct GetSettlementState {
    /// The database connection for reading settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetSettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for getting the settlement of a month.
///
/// Responds with a message rather than an error if the month has not been settled.
pub async fn get_settlement_endpoint(
    State(state): State<GetSettlementState>,
    path: Result<Path<(GroupId, String)>, PathRejection>,
) -> Result<Response, Error> {
    let Path((group_id, month)) = path?;
    let month: YearMonth = month.parse()?;

    let connection = lock_connection(&state.db_connection)?;
    let transfers = read_settlement(group_id, month, &connection)?;

    if transfers.is_empty() {
        return Ok(message_response(format!("{month} has not been settled.")));
    }

    // The month is locked, so these are the totals the transfers were planned from.
    let totals = totals_by_user(group_id, month.first_day(), month.last_day(), &connection)?;

    Ok(Json(SettlementResponse::new(group_id, month, totals, transfers)).into_response())
}
