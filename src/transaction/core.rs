//! Defines the data models for group transactions and their JSON wire forms.

use rusqlite::{
    Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize, Serializer};
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID, YearMonth,
    category::CategoryRef,
    database_id::{BigCategoryId, CustomCategoryId, GroupId, MediumCategoryId, TransactionId},
};

time::serde::format_description!(payload_date_format, Date, "[year]-[month]-[day]");

/// The characters for Sunday through Saturday used when displaying dates.
const WEEKDAYS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

// ============================================================================
// MODELS
// ============================================================================

/// Whether money left or entered the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money spent by a member on behalf of the group.
    Expense,
    /// Money received by a member on behalf of the group.
    Income,
}

impl TransactionType {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// The client-supplied fields of a group transaction, used to create and update them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Whether this is an expense or an income.
    pub transaction_type: TransactionType,
    /// The day the money changed hands, as `yyyy-MM-dd`.
    #[serde(with = "payload_date_format")]
    pub transaction_date: Date,
    /// Where the money was spent.
    #[serde(default)]
    pub shop: Option<String>,
    /// A free text note.
    #[serde(default)]
    pub memo: Option<String>,
    /// The amount in the minor currency unit.
    pub amount: i64,
    /// The top-level category.
    pub big_category_id: BigCategoryId,
    /// A default sub-category, mutually exclusive with `custom_category_id`.
    #[serde(default)]
    pub medium_category_id: Option<MediumCategoryId>,
    /// A group-defined sub-category, mutually exclusive with `medium_category_id`.
    #[serde(default)]
    pub custom_category_id: Option<CustomCategoryId>,
}

impl TransactionPayload {
    /// The settlement month of the transaction.
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.transaction_date)
    }

    /// The category fields of the payload.
    pub fn category(&self) -> CategoryRef {
        CategoryRef {
            big_category_id: self.big_category_id,
            medium_category_id: self.medium_category_id,
            custom_category_id: self.custom_category_id,
        }
    }

    /// Check the amount, which is counted in the minor currency unit.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if the amount is less than one.
    pub fn check_amount(&self) -> Result<(), Error> {
        if self.amount < 1 {
            return Err(Error::InvalidAmount(self.amount));
        }

        Ok(())
    }

    /// The shop, with blank text treated as no shop.
    pub fn shop(&self) -> Option<&str> {
        non_blank(self.shop.as_deref())
    }

    /// The memo, with blank text treated as no memo.
    pub fn memo(&self) -> Option<&str> {
        non_blank(self.memo.as_deref())
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|text| !text.trim().is_empty())
}

/// A group transaction as it is stored and returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTransaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The group the transaction belongs to.
    #[serde(skip)]
    pub group_id: GroupId,
    /// Whether this is an expense or an income.
    pub transaction_type: TransactionType,
    /// When the transaction was first recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub posted_date: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_date: OffsetDateTime,
    /// The day the money changed hands.
    #[serde(serialize_with = "serialize_transaction_date")]
    pub transaction_date: Date,
    /// Where the money was spent.
    pub shop: Option<String>,
    /// A free text note.
    pub memo: Option<String>,
    /// The amount in the minor currency unit.
    pub amount: i64,
    /// The member who posted the transaction.
    pub user_id: UserID,
    /// The name of the top-level category.
    pub big_category_name: String,
    /// The name of the default sub-category, if used.
    pub medium_category_name: Option<String>,
    /// The name of the group-defined sub-category, if used.
    pub custom_category_name: Option<String>,
}

impl GroupTransaction {
    /// The settlement month of the transaction.
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.transaction_date)
    }
}

/// Format `date` as `yyyy/MM/dd(曜)`, e.g. `2021/03/15(月)`.
pub fn format_transaction_date(date: Date) -> String {
    let weekday = WEEKDAYS[usize::from(date.weekday().number_days_from_sunday())];

    format!(
        "{:04}/{:02}/{:02}({weekday})",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn serialize_transaction_date<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_transaction_date(*date))
}

// ============================================================================
// ROW MAPPING
// ============================================================================

/// The columns read by [map_transaction_row], joined with the category names.
///
/// Callers append their own `WHERE` and `ORDER BY` clauses.
pub const SELECT_TRANSACTION: &str = "SELECT t.id, t.group_id, t.transaction_type, \
        t.posted_date, t.updated_date, t.transaction_date, t.shop, t.memo, t.amount, \
        t.user_id, b.name, m.name, c.name \
    FROM group_transactions t \
    INNER JOIN big_category b ON b.id = t.big_category_id \
    LEFT JOIN medium_category m ON m.id = t.medium_category_id \
    LEFT JOIN custom_category c ON c.id = t.custom_category_id";

/// Map a row selected with [SELECT_TRANSACTION] to a [GroupTransaction].
pub fn map_transaction_row(row: &Row) -> Result<GroupTransaction, rusqlite::Error> {
    Ok(GroupTransaction {
        id: row.get(0)?,
        group_id: row.get(1)?,
        transaction_type: row.get(2)?,
        posted_date: row.get(3)?,
        updated_date: row.get(4)?,
        transaction_date: row.get(5)?,
        shop: row.get(6)?,
        memo: row.get(7)?,
        amount: row.get(8)?,
        user_id: row.get(9)?,
        big_category_name: row.get(10)?,
        medium_category_name: row.get(11)?,
        custom_category_name: row.get(12)?,
    })
}
