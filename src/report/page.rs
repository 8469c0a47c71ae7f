//! Defines the routes for choosing a report period and downloading the
//! generated PDF.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{Month, OffsetDateTime};

use crate::{
    AppState, Error,
    auth::{UserID, get_user_by_id},
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    report::{aggregation::aggregate, month_name_pt, pdf::render_monthly_report},
    sale::sales_for_month,
    timezone::get_local_offset,
};

/// The state needed to render the report page and generate the PDF.
#[derive(Debug, Clone)]
pub struct ReportState {
    /// The database connection for reading users and sales.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for requesting a report.
#[derive(Debug, Deserialize)]
pub struct ReportForm {
    /// The month number, 1 through 12.
    pub mes: u8,
    /// The four digit year.
    pub ano: i32,
}

fn report_view(selected_month: Month, selected_year: i32, error_message: Option<&str>) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                h2 class="text-xl font-bold" { "Relatório mensal" }

                p
                {
                    "Escolha o período para baixar o Relatório Mensal das \
                    Receitas Brutas em PDF."
                }

                // A plain form post so the browser handles the PDF download.
                form method="post" action=(endpoints::REPORT_API) class="space-y-3"
                {
                    div
                    {
                        label for="mes" class=(FORM_LABEL_STYLE) { "Mês" }
                        select name="mes" id="mes" class=(FORM_TEXT_INPUT_STYLE)
                        {
                            @for month_number in 1..=12u8 {
                                @let month = Month::try_from(month_number)
                                    .expect("month numbers 1 through 12 are valid");
                                option
                                    value=(month_number)
                                    selected[month == selected_month]
                                {
                                    (month_name_pt(month))
                                }
                            }
                        }
                    }

                    div
                    {
                        label for="ano" class=(FORM_LABEL_STYLE) { "Ano" }
                        input
                            type="number"
                            name="ano"
                            id="ano"
                            min="2000"
                            max="2100"
                            value=(selected_year)
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    @if let Some(error_message) = error_message {
                        p class="text-red-500 text-base" { (error_message) }
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Baixar relatório" }
                }
            }
        }
    };

    base("Relatório mensal", &content)
}

/// Display the page for choosing a report period.
pub async fn get_report_page(State(state): State<ReportState>) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezone(state.local_timezone).into_response();
    };

    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    report_view(today.month(), today.year(), None).into_response()
}

/// Generate the monthly report PDF for the requested period.
///
/// When the period has no sales the page is shown again with an error
/// message instead of producing an empty report.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn post_report(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ReportForm>,
) -> Response {
    let Ok(month) = Month::try_from(form.mes) else {
        return (
            StatusCode::BAD_REQUEST,
            report_view(Month::January, form.ano, Some("Informe um mês entre 1 e 12.")),
        )
            .into_response();
    };

    let connection = state
        .db_connection
        .lock()
        .expect("Could not acquire database lock");

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => return error.into_response(),
    };

    let sales = match sales_for_month(user_id, form.ano, month, &connection) {
        Ok(sales) => sales,
        Err(error) => return error.into_response(),
    };

    if sales.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            report_view(
                month,
                form.ano,
                Some("Nenhuma venda encontrada para o período."),
            ),
        )
            .into_response();
    }

    let totals = aggregate(&sales);

    let pdf_bytes = match render_monthly_report(&user, form.ano, month, &sales, &totals) {
        Ok(bytes) => bytes,
        Err(error) => return error.into_response(),
    };

    let file_name = format!("relatorio_mei_{:02}_{}.pdf", form.mes, form.ano);

    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        pdf_bytes,
    )
        .into_response()
}

#[cfg(test)]
mod report_route_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        auth::{Cpf, PasswordHash, UserID, create_user},
        db::initialize,
        money::Centavos,
        sale::{NewSale, record_sale},
        test_utils::{assert_content_type, assert_valid_html, get_header, parse_html_document},
    };

    use super::{ReportForm, ReportState, get_report_page, post_report};

    fn get_test_state() -> (ReportState, UserID) {
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
            ReportState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
            },
            user_id,
        )
    }

    #[tokio::test]
    async fn report_page_shows_period_form() {
        let (state, _) = get_test_state();

        let response = get_report_page(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let option_selector = scraper::Selector::parse("select[name=mes] option").unwrap();
        let month_count = document.select(&option_selector).count();
        assert_eq!(month_count, 12, "want 12 month options, got {month_count}");
    }

    #[tokio::test]
    async fn downloads_pdf_for_month_with_sales() {
        let (state, user_id) = get_test_state();
        record_sale(
            NewSale {
                date: datetime!(2025-06-10 14:30 UTC),
                description: "Venda de bolo".to_string(),
                amount: Centavos::new(15000),
                category_id: 1,
                invoice_issued: false,
                invoice_number: None,
                invoice_issue_date: None,
            },
            user_id,
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = post_report(
            State(ReportState {
                db_connection: state.db_connection.clone(),
                local_timezone: state.local_timezone.clone(),
            }),
            Extension(user_id),
            Form(ReportForm { mes: 6, ano: 2025 }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "application/pdf");
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"relatorio_mei_06_2025.pdf\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn month_without_sales_shows_error_message() {
        let (state, user_id) = get_test_state();

        let response = post_report(
            State(ReportState {
                db_connection: state.db_connection.clone(),
                local_timezone: state.local_timezone.clone(),
            }),
            Extension(user_id),
            Form(ReportForm { mes: 1, ano: 2025 }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let error_selector = scraper::Selector::parse("p.text-red-500").unwrap();
        let error_message = document
            .select(&error_selector)
            .next()
            .expect("No error message found")
            .text()
            .collect::<String>();
        assert_eq!(
            error_message.trim(),
            "Nenhuma venda encontrada para o período."
        );
    }
}
