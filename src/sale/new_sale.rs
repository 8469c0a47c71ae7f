//! Defines the page and the endpoint for recording a new sale.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState,
    auth::UserID,
    category::{Category, get_all_categories},
    database_id::CategoryID,
    endpoints,
    html::{
        AlertTemplate, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        loading_spinner, render,
    },
    money::Centavos,
    navigation::NavBar,
    sale::db::{NewSale, record_sale},
};

/// Whether a fiscal invoice was issued, as submitted by the sale form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceFlag {
    /// An invoice was issued ("sim").
    #[serde(rename = "S")]
    Issued,
    /// No invoice was issued ("não").
    #[serde(rename = "N")]
    NotIssued,
}

/// The format of the HTML date input, e.g. "2025-06-10".
const DATE_INPUT_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

fn new_sale_view(categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_SALE_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto lg:py-0 max-w-md text-gray-900 dark:text-white"
        {
            form
                hx-post=(endpoints::SALES_API)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Nova venda" }

                div
                {
                    label
                        for="valor"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Valor (R$)"
                    }

                    input
                        name="valor"
                        id="valor"
                        type="text"
                        inputmode="decimal"
                        placeholder="0,00"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="descricao"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Descrição"
                    }

                    input
                        name="descricao"
                        id="descricao"
                        type="text"
                        placeholder="Descrição da venda"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="categoria_id"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Categoria"
                    }

                    select
                        name="categoria_id"
                        id="categoria_id"
                        required
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for category in categories {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }

                div
                {
                    span class=(FORM_LABEL_STYLE) { "Emitiu nota fiscal?" }

                    div class="flex items-center gap-x-6"
                    {
                        label class="flex items-center gap-x-2"
                        {
                            input
                                type="radio"
                                name="emitiu_nota"
                                value="S"
                                id="emitiu_nota_sim";
                            "Sim"
                        }

                        label class="flex items-center gap-x-2"
                        {
                            input
                                type="radio"
                                name="emitiu_nota"
                                value="N"
                                id="emitiu_nota_nao"
                                checked;
                            "Não"
                        }
                    }
                }

                div
                {
                    label
                        for="numero_nota"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Número da nota fiscal"
                    }

                    input
                        name="numero_nota"
                        id="numero_nota"
                        type="text"
                        placeholder="Obrigatório se emitiu nota"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="data_emissao"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Data de emissão"
                    }

                    input
                        name="data_emissao"
                        id="data_emissao"
                        type="date"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Registrar venda"
                }
            }
        }
    };

    base("Nova venda", &content)
}

/// The state needed to display the new sale page or record a sale.
#[derive(Debug, Clone)]
pub struct NewSaleState {
    /// The database connection for managing sales.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewSaleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display the page with the form for recording a new sale.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_new_sale_page(State(state): State<NewSaleState>) -> Response {
    let categories = match get_all_categories(
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(categories) => categories,
        Err(error) => return error.into_response(),
    };

    new_sale_view(&categories).into_response()
}

/// The form data for recording a sale.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaleForm {
    /// The value of the sale in reais, e.g. "150,00".
    pub valor: String,
    /// Text detailing the sale.
    #[serde(default)]
    pub descricao: Option<String>,
    /// The ID of the category the sale belongs to.
    pub categoria_id: CategoryID,
    /// Whether a fiscal invoice was issued.
    pub emitiu_nota: InvoiceFlag,
    /// The invoice number. Required when `emitiu_nota` is "S".
    #[serde(default)]
    pub numero_nota: Option<String>,
    /// The invoice issue date. Required when `emitiu_nota` is "S".
    #[serde(default)]
    pub data_emissao: Option<String>,
}

/// A route handler for recording a new sale, redirects to the sales view on success.
pub async fn create_sale_endpoint(
    State(state): State<NewSaleState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<SaleForm>,
) -> Response {
    let amount = match Centavos::parse_brl(&form.valor) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let invoice_issue_date = match form.data_emissao.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw_date) => match Date::parse(raw_date, DATE_INPUT_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                return render(
                    StatusCode::BAD_REQUEST,
                    AlertTemplate::error(
                        "Não foi possível registrar a venda",
                        "A data de emissão da nota fiscal é inválida.",
                    ),
                );
            }
        },
    };

    let new_sale = NewSale {
        date: OffsetDateTime::now_utc(),
        description: form.descricao.unwrap_or_default().trim().to_string(),
        amount,
        category_id: form.categoria_id,
        invoice_issued: form.emitiu_nota == InvoiceFlag::Issued,
        invoice_number: form.numero_nota,
        invoice_issue_date,
    };

    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    if let Err(error) = record_sale(new_sale, user_id, &connection) {
        tracing::error!("could not record sale: {error}");

        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::SALES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
