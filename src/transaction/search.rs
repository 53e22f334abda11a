//! Searching group transactions with a filter built from a query string.
//!
//! Every user-supplied value is bound as a query parameter. Only the sort
//! column and direction are written into the SQL text, and both come from
//! closed enums.

use rusqlite::{Connection, params_from_iter, types::Value};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, UserID,
    database_id::{BigCategoryId, GroupId},
    transaction::core::{GroupTransaction, SELECT_TRANSACTION, TransactionType, map_transaction_row},
};

/// The largest number of transactions a single search may return.
pub const MAX_SEARCH_LIMIT: u32 = 1000;

const QUERY_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The column to sort search results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// The day the money changed hands.
    #[default]
    TransactionDate,
    /// When the transaction was last changed.
    UpdatedDate,
    /// The amount of the transaction.
    Amount,
}

impl SortKey {
    fn column(&self) -> &'static str {
        match self {
            SortKey::TransactionDate => "t.transaction_date",
            SortKey::UpdatedDate => "t.updated_date",
            SortKey::Amount => "t.amount",
        }
    }
}

/// The order to sort search results in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// The raw query string of a search request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    transaction_type: Option<TransactionType>,
    big_category_id: Option<BigCategoryId>,
    low_amount: Option<i64>,
    high_amount: Option<i64>,
    shop: Option<String>,
    memo: Option<String>,
    #[serde(default)]
    user_id: Vec<UserID>,
    sort: Option<SortKey>,
    sort_type: Option<SortOrder>,
    limit: Option<u32>,
}

/// A validated set of search conditions. Unset conditions match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// The earliest transaction date, inclusive.
    pub start_date: Option<Date>,
    /// The latest transaction date, inclusive.
    pub end_date: Option<Date>,
    /// Only expenses or only incomes.
    pub transaction_type: Option<TransactionType>,
    /// Only transactions in this big category.
    pub big_category_id: Option<BigCategoryId>,
    /// The smallest amount, inclusive.
    pub low_amount: Option<i64>,
    /// The largest amount, inclusive.
    pub high_amount: Option<i64>,
    /// Text the shop must contain.
    pub shop: Option<String>,
    /// Text the memo must contain.
    pub memo: Option<String>,
    /// Only transactions posted by one of these users. Empty means any user.
    pub user_ids: Vec<UserID>,
    /// The column to sort by.
    pub sort: SortKey,
    /// The direction to sort in.
    pub sort_order: SortOrder,
    /// The most transactions to return. `None` returns all matches.
    pub limit: Option<u32>,
}

impl TryFrom<SearchQuery> for TransactionFilter {
    type Error = Error;

    fn try_from(query: SearchQuery) -> Result<Self, Self::Error> {
        if let (Some(low), Some(high)) = (query.low_amount, query.high_amount)
            && low > high
        {
            return Err(Error::InvalidAmountRange(low, high));
        }

        if let Some(limit) = query.limit
            && !(1..=MAX_SEARCH_LIMIT).contains(&limit)
        {
            return Err(Error::InvalidLimit(limit));
        }

        Ok(Self {
            start_date: parse_query_date(query.start_date)?,
            end_date: parse_query_date(query.end_date)?,
            transaction_type: query.transaction_type,
            big_category_id: query.big_category_id,
            low_amount: query.low_amount,
            high_amount: query.high_amount,
            shop: non_empty(query.shop),
            memo: non_empty(query.memo),
            user_ids: query.user_id,
            sort: query.sort.unwrap_or_default(),
            sort_order: query.sort_type.unwrap_or_default(),
            limit: query.limit,
        })
    }
}

fn parse_query_date(text: Option<String>) -> Result<Option<Date>, Error> {
    match non_empty(text) {
        Some(text) => Date::parse(&text, QUERY_DATE_FORMAT)
            .map(Some)
            .map_err(|_| Error::InvalidDate(text)),
        None => Ok(None),
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.is_empty())
}

/// Escape `text` for use inside a `LIKE` pattern with `\` as the escape character.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }

    escaped
}

/// Get the transactions of `group_id` that match `filter`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn search_transactions(
    group_id: GroupId,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<GroupTransaction>, Error> {
    let mut where_clause_parts = vec!["t.group_id = ?".to_owned()];
    let mut query_parameters = vec![Value::Integer(group_id)];

    if let Some(start_date) = filter.start_date {
        where_clause_parts.push("t.transaction_date >= ?".to_owned());
        query_parameters.push(Value::Text(start_date.to_string()));
    }

    if let Some(end_date) = filter.end_date {
        where_clause_parts.push("t.transaction_date <= ?".to_owned());
        query_parameters.push(Value::Text(end_date.to_string()));
    }

    if let Some(transaction_type) = filter.transaction_type {
        where_clause_parts.push("t.transaction_type = ?".to_owned());
        query_parameters.push(Value::Text(transaction_type.as_str().to_owned()));
    }

    if let Some(big_category_id) = filter.big_category_id {
        where_clause_parts.push("t.big_category_id = ?".to_owned());
        query_parameters.push(Value::Integer(big_category_id));
    }

    if let Some(low_amount) = filter.low_amount {
        where_clause_parts.push("t.amount >= ?".to_owned());
        query_parameters.push(Value::Integer(low_amount));
    }

    if let Some(high_amount) = filter.high_amount {
        where_clause_parts.push("t.amount <= ?".to_owned());
        query_parameters.push(Value::Integer(high_amount));
    }

    if let Some(shop) = &filter.shop {
        where_clause_parts.push("t.shop LIKE ? ESCAPE '\\'".to_owned());
        query_parameters.push(Value::Text(format!("%{}%", escape_like(shop))));
    }

    if let Some(memo) = &filter.memo {
        where_clause_parts.push("t.memo LIKE ? ESCAPE '\\'".to_owned());
        query_parameters.push(Value::Text(format!("%{}%", escape_like(memo))));
    }

    if !filter.user_ids.is_empty() {
        let placeholders = vec!["?"; filter.user_ids.len()].join(", ");
        where_clause_parts.push(format!("t.user_id IN ({placeholders})"));
        query_parameters.extend(
            filter
                .user_ids
                .iter()
                .map(|user_id| Value::Text(user_id.to_string())),
        );
    }

    let mut query_string = format!(
        "{SELECT_TRANSACTION} WHERE {} ORDER BY {} {}, t.updated_date DESC, t.id DESC",
        where_clause_parts.join(" AND "),
        filter.sort.column(),
        filter.sort_order.keyword(),
    );

    if let Some(limit) = filter.limit {
        query_string.push_str(" LIMIT ?");
        query_parameters.push(Value::Integer(i64::from(limit)));
    }

    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}
