//! The user model and its database functions.
//!
//! A user logs in with their CPF and owns sales. The email address is
//! optional contact data and, when present, must be unique.

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::{
    Error,
    auth::{Cpf, PasswordHash},
    database_id::DatabaseID,
};

/// The ID of a [User].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserID(DatabaseID);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: DatabaseID) -> Self {
        Self(id)
    }

    /// The underlying database ID.
    pub fn as_i64(&self) -> DatabaseID {
        self.0
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        DatabaseID::column_result(value).map(UserID)
    }
}

/// A person who uses the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserID,
    /// The user's CPF, used as the login identifier.
    pub cpf: Cpf,
    /// The user's display name.
    pub name: String,
    /// The user's email address, if they provided one.
    pub email: Option<String>,
    /// The user's salted and hashed password.
    pub password_hash: PasswordHash,
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS usuario (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                cpf TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                email TEXT UNIQUE,
                password_hash TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new user in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCpf] if a user with the same CPF already exists,
/// - [Error::DuplicateEmail] if a user with the same email already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_user(
    cpf: Cpf,
    name: &str,
    email: Option<&str>,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let id = connection
        .prepare(
            "INSERT INTO usuario (cpf, name, email, password_hash)
                VALUES (?1, ?2, ?3, ?4)
                RETURNING id",
        )?
        .query_row(
            (&cpf, name, email, password_hash.to_string()),
            |row| row.get(0),
        )?;

    Ok(User {
        id: UserID::new(id),
        cpf,
        name: name.to_string(),
        email: email.map(str::to_string),
        password_hash,
    })
}

/// Retrieve a user from the database by their CPF.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no user has the given CPF,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_user_by_cpf(cpf: &Cpf, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(
            "SELECT id, cpf, name, email, password_hash
                FROM usuario
                WHERE cpf = :cpf",
        )?
        .query_row(&[(":cpf", cpf)], map_user_row)?;

    Ok(user)
}

/// Retrieve a user from the database by their `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_user_by_id(id: UserID, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(
            "SELECT id, cpf, name, email, password_hash
                FROM usuario
                WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_user_row)?;

    Ok(user)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: row.get(0)?,
        cpf: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
