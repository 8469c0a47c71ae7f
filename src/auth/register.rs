//! The registration page for creating a new user account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::{Cpf, user::create_user},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input, text_input,
    },
    routing::get_internal_server_error_redirect,
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 8;

/// The inline error messages for the registration form fields.
#[derive(Debug, Default)]
struct RegistrationErrors<'a> {
    cpf: Option<&'a str>,
    email: Option<&'a str>,
    senha: Option<&'a str>,
    confirmar_senha: Option<&'a str>,
}

fn email_input(value: &str, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="email"
                class=(FORM_LABEL_STYLE)
            {
                "E-mail (opcional)"
            }

            input
                type="email"
                name="email"
                id="email"
                placeholder="voce@exemplo.com"
                class=(FORM_TEXT_INPUT_STYLE)
                value=(value);

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirmar_senha"
                class=(FORM_LABEL_STYLE)
            {
                "Confirmar senha"
            }

            input
                type="password"
                name="confirmar_senha"
                id="confirmar_senha"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

fn registration_form(form_data: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#cpf, #nome, #email, #senha, #confirmar_senha, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("cpf", "CPF", &form_data.cpf, "000.000.000-00", errors.cpf))
            (text_input("nome", "Nome", &form_data.nome, "Seu nome", None))
            (email_input(form_data.email.as_deref().unwrap_or(""), errors.email))
            (password_input("senha", "Senha", PASSWORD_INPUT_MIN_LENGTH, errors.senha))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirmar_senha))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Criar conta"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Já tem uma conta? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Entre aqui"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegisterForm::default(), &Default::default());
    let content = log_in_register("Crie sua conta", &registration_form);
    base("Cadastro", &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub cpf: String,
    pub nome: String,
    pub email: Option<String>,
    pub senha: String,
    pub confirmar_senha: String,
}

pub const DUPLICATE_CPF_ERROR_MSG: &str = "Este CPF já está cadastrado.";
pub const DUPLICATE_EMAIL_ERROR_MSG: &str = "Este e-mail já está cadastrado.";
pub const INVALID_CPF_ERROR_MSG: &str = "Informe um CPF válido com 11 dígitos.";
pub const PASSWORD_MISMATCH_ERROR_MSG: &str = "As senhas não coincidem.";

/// Handler for registration requests via the POST method.
///
/// On success the client is redirected to the log-in page. Otherwise, the
/// form is returned with the offending fields marked with error messages.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let cpf = match Cpf::parse(&user_data.cpf) {
        Ok(cpf) => cpf,
        Err(_) => {
            return registration_form(
                &user_data,
                &RegistrationErrors {
                    cpf: Some(INVALID_CPF_ERROR_MSG),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(&user_data.senha) {
        Ok(password) => password,
        Err(error) => {
            return registration_form(
                &user_data,
                &RegistrationErrors {
                    senha: Some(error.to_string().as_ref()),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if user_data.senha != user_data.confirmar_senha {
        return registration_form(
            &user_data,
            &RegistrationErrors {
                confirmar_senha: Some(PASSWORD_MISMATCH_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    // An empty email field means the user chose not to provide one.
    let email = user_data
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty());

    let result = create_user(
        cpf,
        user_data.nome.trim(),
        email,
        password_hash,
        &state
            .db_connection
            .lock()
            .expect("Could not acquire database lock"),
    );

    match result {
        Ok(_) => (
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateCpf) => registration_form(
            &user_data,
            &RegistrationErrors {
                cpf: Some(DUPLICATE_CPF_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response(),
        Err(Error::DuplicateEmail) => registration_form(
            &user_data,
            &RegistrationErrors {
                email: Some(DUPLICATE_EMAIL_ERROR_MSG),
                ..Default::default()
            },
        )
        .into_response(),
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;
        assert_eq!(response.status(), StatusCode::OK);

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "cpf", "text");
        assert_form_input(&form, "nome", "text");
        assert_form_input(&form, "senha", "password");
        assert_form_input(&form, "confirmar_senha", "password");
        assert_form_submit_button(&form);
    }
}

#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        body::Body,
        extract::State,
        http::{Response, StatusCode},
    };
    use rusqlite::Connection;

    use crate::{
        auth::user::create_user_table,
        endpoints,
        test_utils::{assert_form_error_message, must_get_form, parse_html_fragment},
    };

    use super::{
        DUPLICATE_CPF_ERROR_MSG, INVALID_CPF_ERROR_MSG, PASSWORD_MISMATCH_ERROR_MSG, RegisterForm,
        RegistrationState, register_user,
    };

    const TEST_PASSWORD: &str = "averysecurepassword1";

    fn get_test_state() -> RegistrationState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        RegistrationState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn valid_form() -> RegisterForm {
        RegisterForm {
            cpf: "123.456.789-01".to_string(),
            nome: "Maria".to_string(),
            email: Some("maria@example.com".to_string()),
            senha: TEST_PASSWORD.to_string(),
            confirmar_senha: TEST_PASSWORD.to_string(),
        }
    }

    async fn new_register_request(
        state: RegistrationState,
        form: RegisterForm,
    ) -> Response<Body> {
        register_user(State(state), Form(form)).await
    }

    #[tokio::test]
    async fn register_redirects_to_log_in_on_success() {
        let state = get_test_state();

        let response = new_register_request(state, valid_form()).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("hx-redirect").unwrap(),
            endpoints::LOG_IN_VIEW
        );
    }

    #[tokio::test]
    async fn register_rejects_invalid_cpf() {
        let state = get_test_state();
        let form = RegisterForm {
            cpf: "123".to_string(),
            ..valid_form()
        };

        let response = new_register_request(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(&form, INVALID_CPF_ERROR_MSG);
    }

    #[tokio::test]
    async fn register_rejects_duplicate_cpf() {
        let state = get_test_state();
        new_register_request(
            RegistrationState {
                db_connection: state.db_connection.clone(),
            },
            valid_form(),
        )
        .await;

        let form = RegisterForm {
            email: Some("other@example.com".to_string()),
            ..valid_form()
        };
        let response = new_register_request(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(&form, DUPLICATE_CPF_ERROR_MSG);
    }

    #[tokio::test]
    async fn register_rejects_mismatched_passwords() {
        let state = get_test_state();
        let form = RegisterForm {
            confirmar_senha: "somethingelse1234".to_string(),
            ..valid_form()
        };

        let response = new_register_request(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
        let fragment = parse_html_fragment(response).await;
        let form = must_get_form(&fragment);
        assert_form_error_message(&form, PASSWORD_MISMATCH_ERROR_MSG);
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let state = get_test_state();
        let form = RegisterForm {
            senha: "123".to_string(),
            confirmar_senha: "123".to_string(),
            ..valid_form()
        };

        let response = new_register_request(state, form).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_allows_missing_email() {
        let state = get_test_state();
        let form = RegisterForm {
            email: None,
            ..valid_form()
        };

        let response = new_register_request(state, form).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
