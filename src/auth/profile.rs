//! The profile page, where users update their details or delete their account.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{
        User, UserID, UserPatch, delete_user, get_user_by_id, invalidate_auth_cookie, update_user,
    },
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed to show and update the profile.
#[derive(Debug, Clone)]
pub struct ProfileState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed to delete an account and end the session.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<DeleteAccountState> for Key {
    fn from_ref(state: &DeleteAccountState) -> Self {
        state.cookie_key.clone()
    }
}

/// The editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileForm {
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

fn profile_form(username: &str, form: &ProfileForm, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-put=(endpoints::PROFILE_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Usuário" }

                input
                    id="username"
                    type="text"
                    value=(username)
                    disabled
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "E-mail" }

                input
                    id="email"
                    type="email"
                    name="email"
                    value=(form.email)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="full_name" class=(FORM_LABEL_STYLE) { "Nome completo" }

                input
                    id="full_name"
                    type="text"
                    name="full_name"
                    value=(form.full_name)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Salvar Perfil" }
        }
    }
}

fn profile_view(user: &User) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();
    let form = ProfileForm {
        email: user.email.clone(),
        full_name: user.full_name.clone(),
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Perfil" }

            (profile_form(user.username.as_ref(), &form, None))

            div class="mt-8 w-full text-center"
            {
                button
                    type="button"
                    hx-delete=(endpoints::PROFILE_API)
                    hx-confirm="Excluir sua conta? Todas as suas transações também serão excluídas."
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Excluir conta"
                }
            }
        }
    };

    base("Perfil", &[], &content)
}

/// Display the profile of the logged in user.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;

    Ok(profile_view(&user).into_response())
}

/// Update the email address and full name of the logged in user.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<ProfileForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => return error.into_alert_response(),
    };

    let email = form.email.trim();
    if email.is_empty() {
        return profile_form(
            user.username.as_ref(),
            &form,
            Some("Error: Email cannot be empty"),
        )
        .into_response();
    }

    let patch = UserPatch {
        full_name: Some(form.full_name.trim().to_owned()),
        email: Some(email.to_owned()),
    };

    match update_user(user_id, patch, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PROFILE_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateEmail) => Error::DuplicateEmail.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while updating user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Delete the logged in user and all of their transactions, then log them out.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_user(user_id, &connection) {
        Ok(()) => {
            tracing::info!("Deleted user {user_id}");
            (
                invalidate_auth_cookie(jar),
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!("Could not delete user {user_id}: {error}");
            error.into_alert_response()
        }
    }
}
