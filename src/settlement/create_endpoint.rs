use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, GroupId, YearMonth,
    db::lock_connection,
    settlement::{response::SettlementResponse, settle::settle_month},
};

/// The state needed to settle a month.
#[derive(Debug, Clone)]
pub struct CreateSettlementState {
    /// The database connection for managing settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateSettlementState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for settling a month, responds with the new settlement.
///
/// The month stays locked until the settlement is deleted.
pub async fn create_settlement_endpoint(
    State(state): State<CreateSettlementState>,
    path: Result<Path<(GroupId, String)>, PathRejection>,
) -> Result<Response, Error> {
    let Path((group_id, month)) = path?;
    let month: YearMonth = month.parse()?;

    let connection = lock_connection(&state.db_connection)?;
    let settlement = settle_month(group_id, month, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(SettlementResponse::from_settlement(
            group_id, month, settlement,
        )),
    )
        .into_response())
}
