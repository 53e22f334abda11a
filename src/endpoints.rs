//! The API endpoints URIs.
//!
//! The `{id}` segment after `transactions` is a month (`yyyy-MM`) for listing and settlement
//! routes and a transaction ID for editing and deleting. Both must share one parameter name
//! since they occupy the same position in the route tree.

/// The route for health checks, which is not guarded by the membership check.
pub const HEALTH: &str = "/health";
/// The route to create a group transaction.
pub const TRANSACTIONS: &str = "/groups/{group_id}/transactions";
/// The route to list a month's transactions, or to edit or delete one transaction.
pub const TRANSACTION: &str = "/groups/{group_id}/transactions/{id}";
/// The route to search a group's transactions.
pub const SEARCH_TRANSACTIONS: &str = "/groups/{group_id}/transactions/search";
/// The route to read, create or delete the settlement of a month.
pub const SETTLEMENT: &str = "/groups/{group_id}/transactions/{id}/account";
/// The route to confirm the transfers of a settlement.
pub const TRANSFER: &str = "/groups/{group_id}/transactions/{id}/account/{transfer_id}";

/// Replace the parameters in `endpoint_path` with `params`, in order.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/groups/{group_id}', '{group_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters.
///
/// Parameters without a matching value are left as they are, and extra values are ignored.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, params: &[&str]) -> String {
    let mut formatted = String::with_capacity(endpoint_path.len());
    let mut params = params.iter();
    let mut rest = endpoint_path;

    while let Some(param_start) = rest.find('{') {
        let Some(param_length) = rest[param_start..].find('}') else {
            break;
        };
        let param_end = param_start + param_length + 1;

        formatted.push_str(&rest[..param_start]);
        match params.next() {
            Some(value) => formatted.push_str(value),
            None => formatted.push_str(&rest[param_start..param_end]),
        }

        rest = &rest[param_end..];
    }

    formatted.push_str(rest);
    formatted
}
