//! The identity of a group member as seen by the account service.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// A newtype wrapper for user IDs.
///
/// User IDs are issued by the user service and are opaque strings to this service.
/// The wrapper helps disambiguate user IDs from shop names, memos and other
/// free text that flows through the same code.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserID(String);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The user ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(UserID)
    }
}

#[cfg(test)]
mod user_id_tests {
    use super::UserID;

    #[test]
    fn serializes_as_plain_string() {
        let user_id = UserID::new("taro");

        let json = serde_json::to_string(&user_id).unwrap();

        assert_eq!(json, r#""taro""#);
    }

    #[test]
    fn deserializes_from_plain_string() {
        let user_id: UserID = serde_json::from_str(r#""hanako""#).unwrap();

        assert_eq!(user_id, UserID::new("hanako"));
    }
}
