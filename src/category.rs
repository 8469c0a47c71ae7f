//! Sale categories.
//!
//! Categories are seed data: they are created when the database is
//! initialized and referenced, never owned, by sales. The monthly report
//! classifies category names into the three MEI revenue classes.

use rusqlite::{Connection, Row};

use crate::{Error, database_id::CategoryID};

/// A sale category, e.g. "Revenda de Mercadorias".
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryID,
    /// The display name of the category.
    pub name: String,
}

/// The three revenue classes on the MEI monthly gross-revenue report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevenueClass {
    /// Resale of merchandise (comércio).
    Resale,
    /// Sale of industrialized products (indústria).
    Product,
    /// Services rendered (serviços).
    Service,
}

impl RevenueClass {
    /// Classify a category name by case-insensitive substring match.
    ///
    /// Returns `None` for names that match no class; such sales are excluded
    /// from every report bucket.
    pub fn classify(category_name: &str) -> Option<RevenueClass> {
        let name = category_name.to_lowercase();

        if name.contains("revenda") || name.contains("mercadoria") {
            Some(RevenueClass::Resale)
        } else if name.contains("industrial") || name.contains("produto") {
            Some(RevenueClass::Product)
        } else if name.contains("servi") {
            Some(RevenueClass::Service)
        } else {
            None
        }
    }
}

/// The categories seeded into a fresh database.
const DEFAULT_CATEGORIES: [&str; 4] = [
    "Revenda de Mercadorias",
    "Venda de Produtos Industrializados",
    "Prestação de Serviços",
    "Outros",
];

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS categoria (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
                )",
        (),
    )?;

    Ok(())
}

/// Insert the default MEI categories, skipping names that already exist.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn seed_default_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO categoria (name) VALUES (?1)")?;

    for name in DEFAULT_CATEGORIES {
        statement.execute((name,))?;
    }

    Ok(())
}

/// Retrieve a category from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(id: CategoryID, connection: &Connection) -> Result<Category, Error> {
    let category = connection
        .prepare("SELECT id, name FROM categoria WHERE id = :id")?
        .query_row(&[(":id", &id)], map_category_row)?;

    Ok(category)
}

/// Retrieve all categories, ordered by id.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name FROM categoria ORDER BY id ASC")?
        .query_map([], map_category_row)?
        .map(|category_result| category_result.map_err(Error::SqlError))
        .collect()
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod category_tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{
        RevenueClass, create_category_table, get_all_categories, get_category,
        seed_default_categories,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).unwrap();
        seed_default_categories(&connection).unwrap();
        connection
    }

    #[test]
    fn seeds_the_mei_categories() {
        let connection = get_test_connection();

        let categories = get_all_categories(&connection).unwrap();
        let names: Vec<&str> = categories
            .iter()
            .map(|category| category.name.as_str())
            .collect();

        assert_eq!(
            names,
            vec![
                "Revenda de Mercadorias",
                "Venda de Produtos Industrializados",
                "Prestação de Serviços",
                "Outros",
            ]
        );
    }

    #[test]
    fn get_category_returns_not_found_for_unknown_id() {
        let connection = get_test_connection();

        assert_eq!(get_category(999, &connection), Err(Error::NotFound));
    }

    #[test]
    fn classifies_seeded_categories() {
        assert_eq!(
            RevenueClass::classify("Revenda de Mercadorias"),
            Some(RevenueClass::Resale)
        );
        assert_eq!(
            RevenueClass::classify("Venda de Produtos Industrializados"),
            Some(RevenueClass::Product)
        );
        assert_eq!(
            RevenueClass::classify("Prestação de Serviços"),
            Some(RevenueClass::Service)
        );
        assert_eq!(RevenueClass::classify("Outros"), None);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(RevenueClass::classify("REVENDA"), Some(RevenueClass::Resale));
        assert_eq!(RevenueClass::classify("serviços"), Some(RevenueClass::Service));
    }
}
