//! The 404 page.

use axum::{http::StatusCode, response::Response};

use crate::html::{error_view, render};

pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    render(
        StatusCode::NOT_FOUND,
        error_view(
            "Página não encontrada",
            "404",
            "Página não encontrada.",
            "Desculpe, essa página não existe. Use o menu para voltar a uma página conhecida.",
        ),
    )
}

#[cfg(test)]
mod not_found_tests {
    use axum::http::StatusCode;

    use crate::test_utils::{assert_valid_html, parse_html_document};

    use super::get_404_not_found;

    #[tokio::test]
    async fn returns_404_with_html_page() {
        let response = get_404_not_found().await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
    }
}
