//! Database schema initialization.

use rusqlite::Connection;

use crate::{auth, category, sale};

/// Create the application tables and seed the MEI revenue categories.
///
/// Safe to call on an existing database: tables are only created if missing
/// and categories are only seeded into an empty category table.
///
/// # Errors
/// Returns an error if a table cannot be created or the seed data cannot be
/// inserted.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    auth::create_user_table(connection)?;
    category::create_category_table(connection)?;
    category::seed_default_categories(connection)?;
    sale::create_sale_tables(connection)?;

    Ok(())
}
