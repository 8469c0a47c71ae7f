//! Defines the endpoint for deleting a sale, used by the sales history page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState,
    auth::UserID,
    database_id::SaleID,
    html::{AlertTemplate, render},
    sale::db::delete_sale,
};

/// The state needed to delete a sale.
#[derive(Debug, Clone)]
pub struct DeleteSaleState {
    /// The database connection for managing sales.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteSaleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the requesting user's sales.
///
/// On success the body holds only an out-of-band alert, so the swap removes
/// the table row while the alert is shown. A sale that does not exist and a
/// sale that belongs to another user produce the same alert, so the response
/// does not reveal which of the two happened.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn delete_sale_endpoint(
    State(state): State<DeleteSaleState>,
    Extension(user_id): Extension<UserID>,
    Path(sale_id): Path<SaleID>,
) -> Response {
    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    match delete_sale(user_id, sale_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => render(StatusCode::OK, AlertTemplate::success("Venda excluída", "")),
        Err(error) => {
            tracing::error!("could not delete sale {sale_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_sale_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::Path, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        auth::{Cpf, PasswordHash, UserID, create_user},
        db::initialize,
        money::Centavos,
        sale::db::{NewSale, SALE_NOT_FOUND_OR_DENIED_MSG, get_sale, record_sale},
    };

    use super::{DeleteSaleState, delete_sale_endpoint};

    fn get_test_state() -> DeleteSaleState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        DeleteSaleState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn create_test_user(cpf: &str, state: &DeleteSaleState) -> UserID {
        create_user(
            Cpf::new_unchecked(cpf),
            "Maria",
            None,
            PasswordHash::new_unchecked("definitely hashed"),
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
    }

    fn create_test_sale(owner: UserID, state: &DeleteSaleState) -> i64 {
        record_sale(
            NewSale {
                date: datetime!(2025-06-10 14:30 UTC),
                description: "Venda de teste".to_string(),
                amount: Centavos::new(100),
                category_id: 1,
                invoice_issued: false,
                invoice_number: None,
                invoice_issue_date: None,
            },
            owner,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn deletes_own_sale() {
        let state = get_test_state();
        let owner = create_test_user("12345678901", &state);
        let sale_id = create_test_sale(owner, &state);

        let response = delete_sale_endpoint(
            State(DeleteSaleState {
                db_connection: state.db_connection.clone(),
            }),
            Extension(owner),
            Path(sale_id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_sale(sale_id, &state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn rejects_other_users_sale_with_uniform_message() {
        let state = get_test_state();
        let owner = create_test_user("12345678901", &state);
        let other_user = create_test_user("10987654321", &state);
        let sale_id = create_test_sale(owner, &state);

        let response = delete_sale_endpoint(
            State(DeleteSaleState {
                db_connection: state.db_connection.clone(),
            }),
            Extension(other_user),
            Path(sale_id),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains(SALE_NOT_FOUND_OR_DENIED_MSG));
    }

    #[tokio::test]
    async fn missing_sale_uses_the_same_message() {
        let state = get_test_state();
        let owner = create_test_user("12345678901", &state);

        let response = delete_sale_endpoint(
            State(DeleteSaleState {
                db_connection: state.db_connection.clone(),
            }),
            Extension(owner),
            Path(42),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains(SALE_NOT_FOUND_OR_DENIED_MSG));
    }
}
