use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::Response,
};
use axum_extra::extract::{Query, QueryRejection};
use rusqlite::Connection;

use crate::{
    AppState, Error, GroupId,
    db::lock_connection,
    transaction::{
        list_endpoint::transaction_list_response,
        search::{SearchQuery, TransactionFilter, search_transactions},
    },
};

/// The state needed to search transactions.
#[derive(Debug, Clone)]
pub struct SearchTransactionsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SearchTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for searching the transactions of a group.
///
/// `user_id` may be repeated to match transactions posted by any of several members.
pub async fn search_transactions_endpoint(
    State(state): State<SearchTransactionsState>,
    path: Result<Path<GroupId>, PathRejection>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Response, Error> {
    let Path(group_id) = path?;
    let Query(query) = query?;
    let filter = TransactionFilter::try_from(query)?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = search_transactions(group_id, &filter, &connection)?;

    Ok(transaction_list_response(
        transactions,
        "No transactions match the search conditions.".to_owned(),
    ))
}
