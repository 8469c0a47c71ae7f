//! Defines the core data models and database queries for sales and their
//! fiscal invoices (Notas Fiscais).
//!
//! A sale either has no invoice, or exactly one invoice whose value matches
//! the sale value. The two rows are written in a single transaction so a
//! failure never leaves an orphaned invoice behind.

use rusqlite::{Connection, Row};
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    category::get_category,
    database_id::{CategoryID, InvoiceID, SaleID},
    money::Centavos,
};

/// Shown when a sale could not be deleted, either because it does not exist
/// or because it belongs to another user. The two cases share one message so
/// a client cannot probe for the existence of other users' sales.
pub const SALE_NOT_FOUND_OR_DENIED_MSG: &str = "Venda não encontrada ou acesso negado.";

/// A fiscal invoice (Nota Fiscal) issued for a sale.
#[derive(Debug, Clone, PartialEq)]
pub struct FiscalInvoice {
    /// The ID of the invoice.
    pub id: InvoiceID,
    /// The invoice number as printed on the document.
    pub number: String,
    /// The date the invoice was issued.
    pub issue_date: Date,
    /// The invoiced value. Always equals the value of the owning sale.
    pub amount: Centavos,
}

/// A sale recorded by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    /// The ID of the sale.
    pub id: SaleID,
    /// When the sale was recorded.
    pub date: OffsetDateTime,
    /// A short description of what was sold.
    pub description: String,
    /// The value of the sale.
    pub amount: Centavos,
    /// The ID of the category the sale belongs to.
    pub category_id: CategoryID,
    /// The display name of the category, joined in for convenience.
    pub category_name: String,
    /// The fiscal invoice issued for this sale, if any.
    pub invoice: Option<FiscalInvoice>,
    /// The user who recorded the sale.
    pub owner: UserID,
}

/// The data needed to record a new sale.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    /// When the sale happened.
    pub date: OffsetDateTime,
    /// A short description of what was sold.
    pub description: String,
    /// The value of the sale.
    pub amount: Centavos,
    /// The ID of the category the sale belongs to.
    pub category_id: CategoryID,
    /// Whether a fiscal invoice was issued for this sale.
    pub invoice_issued: bool,
    /// The invoice number. Required when `invoice_issued` is set.
    pub invoice_number: Option<String>,
    /// The invoice issue date. Required when `invoice_issued` is set.
    pub invoice_issue_date: Option<Date>,
}

/// Create the sale and invoice tables in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_sale_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS notafiscal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                numero TEXT NOT NULL,
                data_emissao TEXT NOT NULL,
                valor INTEGER NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS vendas (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL,
                descricao TEXT NOT NULL,
                valor INTEGER NOT NULL,
                emitiu_nota TEXT NOT NULL CHECK(emitiu_nota IN ('S', 'N')),
                categoria_id INTEGER NOT NULL,
                notafiscal_id INTEGER,
                usuario_id INTEGER NOT NULL,
                FOREIGN KEY(categoria_id) REFERENCES categoria(id),
                FOREIGN KEY(notafiscal_id) REFERENCES notafiscal(id),
                FOREIGN KEY(usuario_id) REFERENCES usuario(id)
                )",
        (),
    )?;

    // Composite index used by the monthly queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_vendas_usuario_data ON vendas(usuario_id, data);",
        (),
    )?;

    Ok(())
}

/// Record a new sale, creating its fiscal invoice in the same transaction
/// when one was issued.
///
/// # Errors
/// This function will return a:
/// - [Error::MissingInvoiceNumber] if the invoice flag is set without an invoice number,
/// - [Error::MissingInvoiceDate] if the invoice flag is set without an issue date,
/// - [Error::UnknownCategory] if the category ID does not refer to a seeded category,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// If an error is returned, neither the sale nor the invoice is persisted.
pub fn record_sale(new_sale: NewSale, owner: UserID, connection: &Connection) -> Result<Sale, Error> {
    let invoice_details = if new_sale.invoice_issued {
        let number = new_sale
            .invoice_number
            .as_deref()
            .map(str::trim)
            .filter(|number| !number.is_empty())
            .ok_or(Error::MissingInvoiceNumber)?;
        let issue_date = new_sale
            .invoice_issue_date
            .ok_or(Error::MissingInvoiceDate)?;

        Some((number.to_string(), issue_date))
    } else {
        None
    };

    let category = get_category(new_sale.category_id, connection)
        .map_err(|error| match error {
            Error::NotFound => Error::UnknownCategory(new_sale.category_id),
            error => error,
        })?;

    // Using unchecked_transaction because we only have &Connection from the MutexGuard.
    let tx = connection.unchecked_transaction()?;

    let invoice = match &invoice_details {
        Some((number, issue_date)) => {
            let id: InvoiceID = tx
                .prepare(
                    "INSERT INTO notafiscal (numero, data_emissao, valor)
                        VALUES (?1, ?2, ?3)
                        RETURNING id",
                )?
                .query_row((number, issue_date, new_sale.amount), |row| row.get(0))?;

            Some(FiscalInvoice {
                id,
                number: number.clone(),
                issue_date: *issue_date,
                amount: new_sale.amount,
            })
        }
        None => None,
    };

    let id: SaleID = tx
        .prepare(
            "INSERT INTO vendas
                (data, descricao, valor, emitiu_nota, categoria_id, notafiscal_id, usuario_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                RETURNING id",
        )?
        .query_row(
            (
                new_sale.date,
                &new_sale.description,
                new_sale.amount,
                if invoice.is_some() { "S" } else { "N" },
                new_sale.category_id,
                invoice.as_ref().map(|invoice| invoice.id),
                owner,
            ),
            |row| row.get(0),
        )?;

    tx.commit()?;

    Ok(Sale {
        id,
        date: new_sale.date,
        description: new_sale.description,
        amount: new_sale.amount,
        category_id: category.id,
        category_name: category.name,
        invoice,
        owner,
    })
}

const SALE_COLUMNS: &str = "v.id, v.data, v.descricao, v.valor, v.categoria_id, c.name,
        v.usuario_id, n.id, n.numero, n.data_emissao, n.valor";

/// Retrieve a sale from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid sale,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_sale(id: SaleID, connection: &Connection) -> Result<Sale, Error> {
    let sale = connection
        .prepare(&format!(
            "SELECT {SALE_COLUMNS}
                FROM vendas v
                JOIN categoria c ON c.id = v.categoria_id
                LEFT JOIN notafiscal n ON n.id = v.notafiscal_id
                WHERE v.id = :id"
        ))?
        .query_row(&[(":id", &id)], map_sale_row)?;

    Ok(sale)
}

/// Retrieve all of `owner`'s sales in the given month, oldest first.
///
/// # Errors
/// This function will return a:
/// - [Error::DateError] if the first day of the month cannot be computed,
/// - or [Error::SqlError] if there is a SQL error.
pub fn sales_for_month(
    owner: UserID,
    year: i32,
    month: Month,
    connection: &Connection,
) -> Result<Vec<Sale>, Error> {
    let start = Date::from_calendar_date(year, month, 1)
        .map_err(|_| Error::DateError)?
        .midnight()
        .assume_utc();
    let (next_year, next_month) = match month {
        Month::December => (year + 1, Month::January),
        month => (year, month.next()),
    };
    let end = Date::from_calendar_date(next_year, next_month, 1)
        .map_err(|_| Error::DateError)?
        .midnight()
        .assume_utc();

    connection
        .prepare(&format!(
            "SELECT {SALE_COLUMNS}
                FROM vendas v
                JOIN categoria c ON c.id = v.categoria_id
                LEFT JOIN notafiscal n ON n.id = v.notafiscal_id
                WHERE v.usuario_id = :owner AND v.data >= :start AND v.data < :end
                ORDER BY v.data ASC, v.id ASC"
        ))?
        .query_map(
            rusqlite::named_params! {":owner": owner, ":start": start, ":end": end},
            map_sale_row,
        )?
        .map(|sale_result| sale_result.map_err(Error::SqlError))
        .collect()
}

/// Retrieve `owner`'s most recent sales, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is a SQL error.
pub fn recent_sales(owner: UserID, limit: u32, connection: &Connection) -> Result<Vec<Sale>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SALE_COLUMNS}
                FROM vendas v
                JOIN categoria c ON c.id = v.categoria_id
                LEFT JOIN notafiscal n ON n.id = v.notafiscal_id
                WHERE v.usuario_id = :owner
                ORDER BY v.data DESC, v.id DESC
                LIMIT :limit"
        ))?
        .query_map(
            rusqlite::named_params! {":owner": owner, ":limit": limit},
            map_sale_row,
        )?
        .map(|sale_result| sale_result.map_err(Error::SqlError))
        .collect()
}

/// Delete one of `requester`'s sales.
///
/// The linked invoice row, if any, is kept: an issued Nota Fiscal is a
/// standalone record and must survive the sale that created it.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid sale,
/// - [Error::Forbidden] if the sale belongs to a different user,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// Callers must report [Error::NotFound] and [Error::Forbidden] identically
/// with [SALE_NOT_FOUND_OR_DENIED_MSG].
pub fn delete_sale(requester: UserID, id: SaleID, connection: &Connection) -> Result<(), Error> {
    let sale = get_sale(id, connection)?;

    if sale.owner != requester {
        return Err(Error::Forbidden);
    }

    connection.execute("DELETE FROM vendas WHERE id = :id", &[(":id", &id)])?;

    Ok(())
}

fn map_sale_row(row: &Row) -> Result<Sale, rusqlite::Error> {
    let invoice_id: Option<InvoiceID> = row.get(7)?;
    let invoice = match invoice_id {
        Some(id) => Some(FiscalInvoice {
            id,
            number: row.get(8)?,
            issue_date: row.get(9)?,
            amount: row.get(10)?,
        }),
        None => None,
    };

    Ok(Sale {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category_id: row.get(4)?,
        category_name: row.get(5)?,
        invoice,
        owner: row.get(6)?,
    })
}
