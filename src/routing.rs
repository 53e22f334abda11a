//! Application router configuration with guarded and unguarded route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};

use crate::{
    AppState, endpoints,
    membership::group_guard,
    responses::{ErrorBody, message_response},
    settlement::{
        confirm_transfers_endpoint, create_settlement_endpoint, delete_settlement_endpoint,
        get_settlement_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        list_transactions_endpoint, search_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unguarded_routes = Router::new().route(endpoints::HEALTH, get(get_health));

    let group_routes = Router::new()
        .route(endpoints::TRANSACTIONS, post(create_transaction_endpoint))
        .route(
            endpoints::SEARCH_TRANSACTIONS,
            get(search_transactions_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(list_transactions_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::SETTLEMENT,
            get(get_settlement_endpoint)
                .post(create_settlement_endpoint)
                .delete(delete_settlement_endpoint),
        )
        .route(endpoints::TRANSFER, put(confirm_transfers_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), group_guard));

    group_routes
        .merge(unguarded_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Report that the server is up.
async fn get_health() -> Response {
    message_response("ok")
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_owned(),
        }),
    )
        .into_response()
}
