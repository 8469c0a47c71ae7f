//! Database ID type definition.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
/// The ID of a sale row.
pub type SaleID = i64;
/// The ID of a category row.
pub type CategoryID = i64;
/// The ID of a fiscal invoice row.
pub type InvoiceID = i64;
