//! Type aliases for the integer IDs of database rows.

/// The ID of a row in the database.
pub type DatabaseId = i64;

/// The ID of a group, issued by the user service.
pub type GroupId = DatabaseId;

/// The ID of a group transaction.
pub type TransactionId = DatabaseId;

/// The ID of a single transfer in a settlement.
pub type TransferId = DatabaseId;

/// The ID of a big (top-level) category.
pub type BigCategoryId = DatabaseId;

/// The ID of a medium category, a default sub-category of a big category.
pub type MediumCategoryId = DatabaseId;

/// The ID of a custom category, a group-defined sub-category of a big category.
pub type CustomCategoryId = DatabaseId;
