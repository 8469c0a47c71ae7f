//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/vendas/{sale_id}', use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying a user's sales history.
pub const SALES_VIEW: &str = "/vendas";
/// The page for recording a new sale.
pub const NEW_SALE_VIEW: &str = "/vendas/nova";
/// The page for selecting the monthly report period.
pub const REPORT_VIEW: &str = "/relatorio";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/cadastro";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/login";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/erro";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/logout";
/// The route to register a user.
pub const USERS: &str = "/api/usuarios";
/// The route to create a sale.
pub const SALES_API: &str = "/api/vendas";
/// The route to delete a sale.
pub const DELETE_SALE: &str = "/api/vendas/{sale_id}";
/// The route to generate the monthly PDF report.
pub const REPORT_API: &str = "/api/relatorio";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/vendas/{sale_id}', '{sale_id}' is the
/// parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
