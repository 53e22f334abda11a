//! Categories for group transactions.
//!
//! Every transaction has a big category and exactly one of a medium category
//! (a default sub-category shared by all groups) or a custom category (a
//! sub-category defined by one group).

use rusqlite::{Connection, OptionalExtension};

use crate::{
    Error,
    database_id::{BigCategoryId, CustomCategoryId, GroupId, MediumCategoryId},
};

/// The big categories every database starts with.
const DEFAULT_BIG_CATEGORIES: [(BigCategoryId, &str); 7] = [
    (1, "収入"),
    (2, "食費"),
    (3, "日用品"),
    (4, "住宅"),
    (5, "水道・光熱費"),
    (6, "交通費"),
    (7, "趣味・娯楽"),
];

/// The medium categories every database starts with, as (id, big category id, name).
const DEFAULT_MEDIUM_CATEGORIES: [(MediumCategoryId, BigCategoryId, &str); 18] = [
    (1, 1, "給与"),
    (2, 1, "賞与"),
    (3, 1, "一時所得"),
    (4, 2, "食料品"),
    (5, 2, "外食"),
    (6, 2, "カフェ"),
    (7, 3, "消耗品"),
    (8, 3, "子育て用品"),
    (9, 3, "ドラッグストア"),
    (10, 4, "家賃"),
    (11, 4, "住宅ローン"),
    (12, 4, "家具・家電"),
    (13, 5, "電気代"),
    (14, 5, "ガス代"),
    (15, 5, "水道代"),
    (16, 6, "電車"),
    (17, 6, "タクシー"),
    (18, 7, "レジャー"),
];

/// The category fields of a transaction payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRef {
    /// The top-level category.
    pub big_category_id: BigCategoryId,
    /// A default sub-category of the big category.
    pub medium_category_id: Option<MediumCategoryId>,
    /// A group-defined sub-category of the big category.
    pub custom_category_id: Option<CustomCategoryId>,
}

impl CategoryRef {
    /// Check that exactly one of the medium and custom category is set.
    ///
    /// # Errors
    /// Returns [Error::BadCategory] if both or neither are set.
    pub fn check_well_formed(&self) -> Result<(), Error> {
        match (self.medium_category_id, self.custom_category_id) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(Error::BadCategory),
        }
    }
}

/// Check that the categories in `category` exist and fit together for `group_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::BadCategory] if not exactly one of the medium and custom category is set,
/// - [Error::InvalidCategory] if the sub-category does not exist, belongs to
///   another big category, or is a custom category of another group,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn validate_category(
    group_id: GroupId,
    category: &CategoryRef,
    connection: &Connection,
) -> Result<(), Error> {
    category.check_well_formed()?;

    let parent = match (category.medium_category_id, category.custom_category_id) {
        (Some(medium_category_id), _) => connection
            .query_row(
                "SELECT big_category_id FROM medium_category WHERE id = ?1",
                [medium_category_id],
                |row| row.get::<_, BigCategoryId>(0),
            )
            .optional()?,
        (None, Some(custom_category_id)) => connection
            .query_row(
                "SELECT big_category_id FROM custom_category WHERE id = ?1 AND group_id = ?2",
                [custom_category_id, group_id],
                |row| row.get::<_, BigCategoryId>(0),
            )
            .optional()?,
        (None, None) => None,
    };

    match parent {
        Some(big_category_id) if big_category_id == category.big_category_id => Ok(()),
        _ => Err(Error::InvalidCategory),
    }
}

/// Create a custom category for `group_id` under `big_category_id`.
///
/// # Errors
/// Returns [Error::InvalidCategory] if the big category does not exist or the
/// group already has a custom category with the same name.
#[cfg(test)]
pub fn create_custom_category(
    group_id: GroupId,
    big_category_id: BigCategoryId,
    name: &str,
    connection: &Connection,
) -> Result<CustomCategoryId, Error> {
    connection
        .query_row(
            "INSERT INTO custom_category (group_id, big_category_id, name)
             VALUES (?1, ?2, ?3)
             RETURNING id",
            (group_id, big_category_id, name),
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code:
                        rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::InvalidCategory,
            error => error.into(),
        })
}

/// Create the category tables and insert the default categories.
///
/// # Errors
/// Returns an error if the tables cannot be created or if there is an SQL error.
pub fn create_category_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS big_category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS medium_category (
            id INTEGER PRIMARY KEY,
            big_category_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            FOREIGN KEY(big_category_id) REFERENCES big_category(id)
        );

        CREATE TABLE IF NOT EXISTS custom_category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL,
            big_category_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(group_id, name),
            FOREIGN KEY(big_category_id) REFERENCES big_category(id)
        );",
    )?;

    let mut insert_big = connection
        .prepare("INSERT OR IGNORE INTO big_category (id, name) VALUES (?1, ?2)")?;
    for (id, name) in DEFAULT_BIG_CATEGORIES {
        insert_big.execute((id, name))?;
    }

    let mut insert_medium = connection.prepare(
        "INSERT OR IGNORE INTO medium_category (id, big_category_id, name) VALUES (?1, ?2, ?3)",
    )?;
    for (id, big_category_id, name) in DEFAULT_MEDIUM_CATEGORIES {
        insert_medium.execute((id, big_category_id, name))?;
    }

    Ok(())
}
