//! The registration page for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        NewUser, PasswordHash, Username, ValidatedPassword, create_user, log_in::username_input,
        set_auth_cookie,
    },
    category::ensure_default_categories,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::get_local_offset,
};

/// The error messages to show next to each field of the registration form.
#[derive(Debug, Default)]
struct RegistrationErrors {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
}

fn field_error(error_message: Option<&str>) -> Markup {
    html! {
        @if let Some(error_message) = error_message
        {
            p class="text-red-500 text-base" { (error_message) }
        }
    }
}

fn confirm_password_input(error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirmar Senha"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus[error_message.is_some()]
            ;

            (field_error(error_message))
        }
    }
}

fn registration_form(form: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                (username_input(&form.username))
                (field_error(errors.username.as_deref()))
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "E-mail" }

                input
                    type="email"
                    name="email"
                    id="email"
                    placeholder="voce@exemplo.com"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(form.email);

                (field_error(errors.email.as_deref()))
            }

            div
            {
                label for="full_name" class=(FORM_LABEL_STYLE) { "Nome completo" }

                input
                    type="text"
                    name="full_name"
                    id="full_name"
                    placeholder="Nome completo (opcional)"
                    class=(FORM_TEXT_INPUT_STYLE)
                    value=(form.full_name);
            }

            (password_input("", 0, errors.password.as_deref()))
            (confirm_password_input(errors.confirm_password.as_deref()))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Criar Conta"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Já tem uma conta? "

                a href=(endpoints::LOG_IN_VIEW) tabindex="0" class=(LINK_STYLE)
                {
                  "Entre aqui"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form =
        registration_form(&RegisterForm::default(), &RegistrationErrors::default());
    let content = log_in_register("Criar Conta", &registration_form);
    base("Cadastro", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered in the registration form.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Check the form fields in order, stopping at the first problem.
fn validate(
    form: &RegisterForm,
) -> Result<(Username, String, ValidatedPassword), RegistrationErrors> {
    let username = Username::new(&form.username).map_err(|error| RegistrationErrors {
        username: Some(error.to_string()),
        ..Default::default()
    })?;

    let email = form.email.trim();
    if email.is_empty() {
        return Err(RegistrationErrors {
            email: Some("Email cannot be empty".to_owned()),
            ..Default::default()
        });
    }

    let password = ValidatedPassword::new(&form.password).map_err(|error| RegistrationErrors {
        password: Some(error.to_string()),
        ..Default::default()
    })?;

    if form.password != form.confirm_password {
        return Err(RegistrationErrors {
            confirm_password: Some("Passwords do not match".to_owned()),
            ..Default::default()
        });
    }

    Ok((username, email.to_owned(), password))
}

/// Create a user account, log the new user in, and redirect them to the dashboard.
///
/// Invalid input and taken usernames or email addresses are reported next to
/// the offending field.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let (username, email, password) = match validate(&form) {
        Ok(fields) => fields,
        Err(errors) => return registration_form(&form, &errors).into_response(),
    };

    let password_hash = match PasswordHash::new(password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");

            return get_internal_server_error_redirect();
        }
    };

    let local_timezone = match get_local_offset(&state.local_timezone) {
        Some(offset) => offset,
        None => return Error::InvalidTimezoneError(state.local_timezone).into_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let new_user = NewUser {
        username,
        email,
        password_hash,
        full_name: form.full_name.trim().to_owned(),
    };

    let user = match create_user(new_user, &connection) {
        Ok(user) => user,
        Err(error @ Error::DuplicateUsername) => {
            let errors = RegistrationErrors {
                username: Some(error.to_string()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(error @ Error::DuplicateEmail) => {
            let errors = RegistrationErrors {
                email: Some(error.to_string()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");

            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Registered user {} ({})", user.username, user.id);

    match ensure_default_categories(&connection) {
        Ok(0) => {}
        Ok(count) => tracing::info!("Created {count} default categories"),
        Err(error) => tracing::error!("Could not create the default categories: {error}"),
    }

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_timezone) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");

            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::{
        auth::get_register_page,
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let title = document
            .select(&Selector::parse("h1").unwrap())
            .next()
            .expect("No h1 found")
            .text()
            .collect::<String>();
        assert_eq!(title.trim(), "Criar Conta");

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "username", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");

        let links = form
            .select(&Selector::parse("a[href]").unwrap())
            .map(|link| link.value().attr("href").unwrap_or_default())
            .collect::<Vec<_>>();
        assert_eq!(links, vec![endpoints::LOG_IN_VIEW]);
    }
}
