use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, GroupId, TransferId, YearMonth,
    db::lock_connection,
    settlement::db::{TransferConfirmation, update_confirmations},
};

/// The state needed to confirm transfers.
#[derive(Debug, Clone)]
pub struct ConfirmTransfersState {
    /// The database connection for managing settlements.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ConfirmTransfersState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for setting the payment and receipt flags of transfers,
/// responds with every transfer of the settlement.
///
/// The transfer in the path must be one of the transfers in the body.
pub async fn confirm_transfers_endpoint(
    State(state): State<ConfirmTransfersState>,
    path: Result<Path<(GroupId, String, TransferId)>, PathRejection>,
    confirmations: Result<Json<Vec<TransferConfirmation>>, JsonRejection>,
) -> Result<Response, Error> {
    let Path((group_id, month, transfer_id)) = path?;
    let month: YearMonth = month.parse()?;
    let Json(confirmations) = confirmations?;

    if !confirmations
        .iter()
        .any(|confirmation| confirmation.id == transfer_id)
    {
        return Err(Error::TransferIdMismatch(transfer_id));
    }

    let connection = lock_connection(&state.db_connection)?;
    let transfers = update_confirmations(group_id, month, &confirmations, &connection)?;

    Ok(Json(transfers).into_response())
}
