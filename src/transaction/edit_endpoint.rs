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
use time::OffsetDateTime;

use crate::{
    AppState, Error, GroupId,
    database_id::TransactionId,
    db::lock_connection,
    transaction::{core::TransactionPayload, db::put_transaction},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for replacing the fields of a transaction, responds with the updated transaction.
///
/// Any member of the group may edit any of the group's transactions.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    path: Result<Path<(GroupId, TransactionId)>, PathRejection>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Response, Error> {
    let Path((group_id, transaction_id)) = path?;
    let Json(payload) = payload?;

    let connection = lock_connection(&state.db_connection)?;
    let transaction = put_transaction(
        group_id,
        transaction_id,
        &payload,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok(Json(transaction).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
    };
    use serde_json::Value;
    use time::macros::{date, datetime};

    use crate::{
        Error, UserID,
        test_utils::{get_test_connection, parse_json_body, settle_month_for_test, test_payload},
        transaction::{get_transaction, post_transaction},
    };

    use super::{EditTransactionState, edit_transaction_endpoint};

    #[tokio::test]
    async fn can_update_transaction() {
        let conn = get_test_connection();
        let created = post_transaction(
            7,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 04 - 02), 1000),
            datetime!(2021-04-02 09:00:00 UTC),
            &conn,
        )
        .expect("could not create test transaction");
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };
        let mut payload = test_payload(date!(2021 - 04 - 05), 1500);
        payload.memo = Some("dinner".to_owned());

        let response = edit_transaction_endpoint(
            State(state.clone()),
            Ok(Path((7, created.id))),
            Ok(Json(payload)),
        )
        .await
        .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = parse_json_body(response).await;
        assert_eq!(body["amount"], 1500);
        assert_eq!(body["user_id"], "taro");
        let connection = state.db_connection.lock().unwrap();
        let stored = get_transaction(7, created.id, &connection).unwrap().unwrap();
        assert_eq!(stored.transaction_date, date!(2021 - 04 - 05));
        assert_eq!(stored.memo.as_deref(), Some("dinner"));
        assert_eq!(stored.posted_date, created.posted_date);
        assert!(stored.updated_date > created.updated_date);
    }

    #[tokio::test]
    async fn cannot_move_transaction_into_settled_month() {
        let conn = get_test_connection();
        settle_month_for_test(7, &conn);
        let created = post_transaction(
            7,
            &UserID::new("taro"),
            &test_payload(date!(2021 - 04 - 02), 1000),
            datetime!(2021-04-02 09:00:00 UTC),
            &conn,
        )
        .unwrap();
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let result = edit_transaction_endpoint(
            State(state.clone()),
            Ok(Path((7, created.id))),
            Ok(Json(test_payload(date!(2021 - 03 - 15), 1000))),
        )
        .await;

        assert_eq!(result.err(), Some(Error::MonthLocked("2021-03".parse().unwrap())));
        let connection = state.db_connection.lock().unwrap();
        let stored = get_transaction(7, created.id, &connection).unwrap().unwrap();
        assert_eq!(stored.transaction_date, date!(2021 - 04 - 02));
    }

    #[tokio::test]
    async fn missing_transaction_is_not_found() {
        let state = EditTransactionState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let result = edit_transaction_endpoint(
            State(state),
            Ok(Path((7, 42))),
            Ok(Json(test_payload(date!(2021 - 04 - 05), 1500))),
        )
        .await;

        assert_eq!(result.err(), Some(Error::UpdateMissingTransaction));
    }
}
