//! Group transactions: the records members post of money spent or received for the group.
//!
//! This module contains:
//! - The `GroupTransaction` model and the `TransactionPayload` clients send
//! - The transaction store, whose mutations respect the month lock
//! - Searching transactions with a filter
//! - The route handlers for the transaction endpoints

mod core;
mod create_endpoint;
mod db;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod search;
mod search_endpoint;

pub use core::{GroupTransaction, TransactionPayload, TransactionType};
pub use create_endpoint::create_transaction_endpoint;
pub use db::{create_transaction_table, list_by_month, post_transaction};
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::list_transactions_endpoint;
pub use search::MAX_SEARCH_LIMIT;
pub use search_endpoint::search_transactions_endpoint;

#[cfg(test)]
pub use db::get_transaction;
