//! Defines the route handler for the page that lists a user's sales.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
    sale::db::{Sale, recent_sales},
    timezone::get_local_offset,
};

/// How many sales are shown on the history page.
const SALES_PAGE_LIMIT: u32 = 100;

/// Display format for the sale timestamp, e.g. "10/06/2025 14:30".
const SALE_DATE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day]/[month]/[year] [hour]:[minute]");

/// The state needed to display the sales history page.
#[derive(Debug, Clone)]
pub struct SalesPageState {
    /// The database connection for reading sales.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for SalesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn sale_row(sale: &Sale, local_offset: time::UtcOffset) -> Markup {
    let date_string = sale
        .date
        .to_offset(local_offset)
        .format(SALE_DATE_FORMAT)
        .unwrap_or_else(|_| sale.date.to_string());
    let delete_route = format_endpoint(endpoints::DELETE_SALE, sale.id);

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE) { (date_string) }
            td class=(TABLE_CELL_STYLE) { (sale.description) }
            td class=(TABLE_CELL_STYLE) { (sale.category_name) }
            td class=(TABLE_CELL_STYLE) { (sale.amount) }
            td class=(TABLE_CELL_STYLE)
            {
                @match &sale.invoice {
                    Some(invoice) => (invoice.number),
                    None => "Sem nota",
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_route)
                    hx-target="closest tr"
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    hx-confirm="Excluir esta venda?"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Excluir"
                }
            }
        }
    }
}

fn sales_view(sales: &[Sale], local_offset: time::UtcOffset) -> Markup {
    let nav_bar = NavBar::new(endpoints::SALES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                div class="flex items-center justify-between"
                {
                    h2 class="text-xl font-bold" { "Minhas vendas" }

                    a href=(endpoints::NEW_SALE_VIEW) class=(LINK_STYLE) { "Nova venda" }
                }

                @if sales.is_empty() {
                    p { "Nenhuma venda registrada ainda." }
                } @else {
                    div class="relative overflow-x-auto shadow-md sm:rounded"
                    {
                        table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Data" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Descrição" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Categoria" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Valor" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Nota fiscal" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Ações" }
                                }
                            }

                            tbody
                            {
                                @for sale in sales {
                                    (sale_row(sale, local_offset))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Minhas vendas", &content)
}

/// Display the page that lists the user's most recent sales.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_sales_page(
    State(state): State<SalesPageState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezone(state.local_timezone).into_response();
    };

    let sales = match recent_sales(
        user_id,
        SALES_PAGE_LIMIT,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    ) {
        Ok(sales) => sales,
        Err(error) => return error.into_response(),
    };

    sales_view(&sales, local_offset).into_response()
}
