use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error, GroupId, UserID,
    db::lock_connection,
    transaction::{core::TransactionPayload, db::post_transaction},
};

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for recording a transaction for the signed in user,
/// responds with the stored transaction.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<GroupId>, PathRejection>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Response, Error> {
    let Path(group_id) = path?;
    let Json(payload) = payload?;

    let connection = lock_connection(&state.db_connection)?;
    let transaction = post_transaction(
        group_id,
        &user_id,
        &payload,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Json,
        extract::{Path, State},
        http::StatusCode,
    };
    use serde_json::Value;
    use time::macros::date;

    use crate::{
        Error, UserID,
        test_utils::{get_test_connection, parse_json_body, settle_month_for_test, test_payload},
        transaction::{get_transaction, list_by_month},
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn state_with(connection: rusqlite::Connection) -> CreateTransactionState {
        CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn creates_transaction_for_session_user() {
        let state = state_with(get_test_connection());
        let mut payload = test_payload(date!(2021 - 03 - 02), 1200);
        payload.shop = Some("スーパー".to_owned());

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(UserID::new("taro")),
            Ok(Path(7)),
            Ok(Json(payload)),
        )
        .await
        .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = parse_json_body(response).await;
        assert_eq!(body["user_id"], "taro");
        assert_eq!(body["amount"], 1200);
        assert_eq!(body["transaction_date"], "2021/03/02(火)");
        assert_eq!(body["big_category_name"], "食費");
        let id = body["id"].as_i64().expect("id should be a number");
        let connection = state.db_connection.lock().unwrap();
        let stored = get_transaction(7, id, &connection).unwrap().unwrap();
        assert_eq!(stored.shop.as_deref(), Some("スーパー"));
    }

    #[tokio::test]
    async fn rejects_transaction_in_settled_month() {
        let connection = get_test_connection();
        settle_month_for_test(7, &connection);
        let state = state_with(connection);

        let result = create_transaction_endpoint(
            State(state.clone()),
            Extension(UserID::new("taro")),
            Ok(Path(7)),
            Ok(Json(test_payload(date!(2021 - 03 - 31), 500))),
        )
        .await;

        assert_eq!(result.err(), Some(Error::MonthLocked("2021-03".parse().unwrap())));
        let connection = state.db_connection.lock().unwrap();
        let listed = list_by_month(7, "2021-03".parse().unwrap(), &connection).unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let state = state_with(get_test_connection());

        let result = create_transaction_endpoint(
            State(state),
            Extension(UserID::new("taro")),
            Ok(Path(7)),
            Ok(Json(test_payload(date!(2021 - 03 - 02), 0))),
        )
        .await;

        assert_eq!(result.err(), Some(Error::InvalidAmount(0)));
    }
}
