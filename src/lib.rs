//! Vendas MEI is a web app for Brazilian microentrepreneurs (MEI) to record
//! their sales, optionally attach fiscal invoices (Notas Fiscais), and
//! download the monthly gross-revenue report required for MEI bookkeeping.
//!
//! This library provides an HTTP server that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod html;
mod logging;
mod money;
mod navigation;
mod not_found;
mod report;
mod routing;
mod sale;
#[cfg(test)]
mod test_utils;
mod timezone;

pub use app_state::AppState;
pub use auth::{Cpf, PasswordHash, UserID, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use money::Centavos;
pub use routing::build_router;

use crate::{
    database_id::DatabaseID,
    html::AlertTemplate,
    not_found::get_404_not_found_response,
    routing::{ErrorPageTemplate, render_internal_server_error},
};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The raw amount string could not be parsed as a non-negative monetary
    /// value with at most two decimal places.
    #[error("\"{0}\" is not a valid monetary amount")]
    InvalidAmount(String),

    /// A sale declared an issued invoice but did not provide the invoice
    /// number.
    #[error("an invoice number is required when the invoice flag is set")]
    MissingInvoiceNumber,

    /// A sale declared an issued invoice but did not provide the issue date.
    #[error("an invoice issue date is required when the invoice flag is set")]
    MissingInvoiceDate,

    /// The category ID used to create a sale did not match a seeded category.
    #[error("the category ID {0} does not refer to a valid category")]
    UnknownCategory(DatabaseID),

    /// The CPF was not 11 digits after stripping the mask.
    ///
    /// The offending string should only be logged for debugging on the
    /// server, never echoed back in full to the client.
    #[error("\"{0}\" is not a valid CPF")]
    InvalidCpf(String),

    /// The CPF already exists in the database.
    #[error("the CPF is already registered")]
    DuplicateCpf,

    /// The email already exists in the database.
    #[error("the email is already registered")]
    DuplicateEmail,

    /// The user provided an invalid CPF/password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The user id or expiry cookie is missing from the cookie jar in the
    /// request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    #[error("could not process the cookie expiry date")]
    DateError,

    /// The requester is not the owner of the resource.
    ///
    /// Handlers must report this identically to [Error::NotFound] so that a
    /// client cannot probe for the existence of other users' sales.
    #[error("the requested resource belongs to another user")]
    Forbidden,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical
    /// timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The report PDF could not be produced.
    #[error("could not generate the report PDF: {0}")]
    PdfError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("usuario.cpf") =>
            {
                Error::DuplicateCpf
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("usuario.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(value: lopdf::Error) -> Self {
        Error::PdfError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezone(timezone) => render_internal_server_error(ErrorPageTemplate {
                description: "Fuso horário inválido",
                fix: &format!(
                    "O fuso horário \"{timezone}\" não pôde ser carregado. Verifique a \
                    configuração do servidor."
                ),
            }),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidAmount(_) => html::render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Não foi possível registrar a venda",
                    "Informe um valor monetário válido, por exemplo 150,00.",
                ),
            ),
            Error::MissingInvoiceNumber => html::render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Não foi possível registrar a venda",
                    "Informe o número da nota fiscal.",
                ),
            ),
            Error::MissingInvoiceDate => html::render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Não foi possível registrar a venda",
                    "Informe a data de emissão da nota fiscal.",
                ),
            ),
            Error::UnknownCategory(_) => html::render(
                StatusCode::BAD_REQUEST,
                AlertTemplate::error(
                    "Não foi possível registrar a venda",
                    "Selecione uma categoria válida.",
                ),
            ),
            Error::NotFound | Error::Forbidden => html::render(
                StatusCode::NOT_FOUND,
                AlertTemplate::error(
                    "Não foi possível excluir a venda",
                    sale::SALE_NOT_FOUND_OR_DENIED_MSG,
                ),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                html::render(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AlertTemplate::error(
                        "Algo deu errado",
                        "Ocorreu um erro inesperado. Tente novamente mais tarde ou \
                        verifique os logs do servidor.",
                    ),
                )
            }
        }
    }
}
