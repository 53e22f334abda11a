//! Monthly settlement of a group's shared expenses.
//!
//! This module contains:
//! - The aggregation of each member's expenses over a month
//! - The planner that turns those totals into transfers between members
//! - The settlement store and the month lock it implies
//! - The route handlers for the settlement endpoints

mod aggregation;
mod confirm_endpoint;
mod create_endpoint;
mod db;
mod delete_endpoint;
mod get_endpoint;
mod lock;
mod planner;
mod response;
mod settle;

pub use confirm_endpoint::confirm_transfers_endpoint;
pub use create_endpoint::create_settlement_endpoint;
pub use db::{Transfer, TransferConfirmation, create_settlement_table};
pub use delete_endpoint::delete_settlement_endpoint;
pub use get_endpoint::get_settlement_endpoint;
pub use lock::ensure_unlocked;
pub use response::SettlementResponse;

#[cfg(test)]
pub use lock::is_settled;
#[cfg(test)]
pub use settle::settle_month;
