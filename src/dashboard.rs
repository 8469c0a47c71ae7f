//! This file defines the dashboard route and its handler.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    money::Centavos,
    navigation::NavBar,
    report::month_name_pt,
    sale::{Sale, recent_sales, sales_for_month},
    timezone::get_local_offset,
};

/// How many sales are shown in the dashboard's recent activity list.
const RECENT_SALES_LIMIT: u32 = 5;

/// The state needed to display the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading users and sales.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

fn dashboard_view(
    user_name: &str,
    month_label: &str,
    month_total: Centavos,
    recent: &[Sale],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-2xl space-y-6"
            {
                h2 class="text-2xl font-bold" { "Olá, " (user_name) "!" }

                div class="p-4 bg-white rounded-lg shadow dark:bg-gray-800"
                {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Faturamento de " (month_label)
                    }
                    p class="text-3xl font-bold" { (month_total) }
                }

                div class="space-y-2"
                {
                    h3 class="text-lg font-semibold" { "Últimas vendas" }

                    @if recent.is_empty() {
                        p { "Nenhuma venda registrada ainda." }
                    } @else {
                        ul class="divide-y divide-gray-200 dark:divide-gray-700"
                        {
                            @for sale in recent {
                                li class="py-2 flex justify-between"
                                {
                                    span { (sale.description) }
                                    span class="font-semibold" { (sale.amount) }
                                }
                            }
                        }
                    }
                }

                div class="flex gap-4"
                {
                    a href=(endpoints::NEW_SALE_VIEW) class=(LINK_STYLE) { "Registrar venda" }
                    a href=(endpoints::REPORT_VIEW) class=(LINK_STYLE) { "Gerar relatório" }
                }
            }
        }
    };

    base("Dashboard", &content)
}

/// Display an overview of the user's sales: a greeting, the running total for
/// the current month and the most recent sales.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezone(state.local_timezone).into_response();
    };

    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let month_sales = match sales_for_month(user_id, today.year(), today.month(), &connection) {
        Ok(sales) => sales,
        Err(error) => return error.into_response(),
    };
    let month_total: Centavos = month_sales.iter().map(|sale| sale.amount).sum();

    let recent = match recent_sales(user_id, RECENT_SALES_LIMIT, &connection) {
        Ok(sales) => sales,
        Err(error) => return error.into_response(),
    };

    let month_label = format!("{}/{}", month_name_pt(today.month()), today.year());

    dashboard_view(&user.name, &month_label, month_total, &recent).into_response()
}

#[cfg(test)]
mod dashboard_route_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        auth::{Cpf, PasswordHash, UserID, create_user},
        db::initialize,
        money::Centavos,
        sale::{NewSale, record_sale},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{DashboardState, get_dashboard_page};

    fn get_test_state() -> (DashboardState, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user_id = create_user(
            Cpf::new_unchecked("12345678901"),
            "Maria",
            None,
            PasswordHash::new_unchecked("definitely hashed"),
            &connection,
        )
        .unwrap()
        .id;

        (
            DashboardState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn dashboard_greets_the_user_by_name() {
        let (state, user_id) = get_test_state();

        let response = get_dashboard_page(State(state), Extension(user_id)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let heading_selector = scraper::Selector::parse("h2").unwrap();
        let heading = document
            .select(&heading_selector)
            .next()
            .expect("No greeting heading found")
            .text()
            .collect::<String>();
        assert!(heading.contains("Maria"), "got greeting {heading:?}");
    }

    #[tokio::test]
    async fn dashboard_shows_current_month_total() {
        let (state, user_id) = get_test_state();
        for amount in [10000, 2550] {
            record_sale(
                NewSale {
                    date: OffsetDateTime::now_utc(),
                    description: "Venda".to_string(),
                    amount: Centavos::new(amount),
                    category_id: 1,
                    invoice_issued: false,
                    invoice_number: None,
                    invoice_issue_date: None,
                },
                user_id,
                &state.db_connection.lock().unwrap(),
            )
            .unwrap();
        }

        let response = get_dashboard_page(
            State(DashboardState {
                db_connection: state.db_connection.clone(),
                local_timezone: state.local_timezone.clone(),
            }),
            Extension(user_id),
        )
        .await;

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let total_selector = scraper::Selector::parse("p.text-3xl").unwrap();
        let total = document
            .select(&total_selector)
            .next()
            .expect("No month total found")
            .text()
            .collect::<String>();
        assert_eq!(total.trim(), "R$ 125,50");
    }
}
