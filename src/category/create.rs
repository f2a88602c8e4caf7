//! Category creation page and endpoint.

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

use crate::{
    AppState, Error,
    category::{
        CategoryName, NewCategory, create_category,
        domain::{CategoryFormData, DEFAULT_CATEGORY_COLOR, color_or_default},
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let name = match CategoryName::new(&form_data.name) {
        Ok(name) => name,
        Err(error) => {
            return new_category_form_view(&form_data, &format!("Error: {error}")).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let new_category = NewCategory {
        name,
        description: form_data.description.trim().to_owned(),
        color: color_or_default(&form_data.color),
    };

    match create_category(new_category, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::DuplicateCategoryName) => Error::DuplicateCategoryName.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = new_category_form_view(
        &CategoryFormData {
            name: String::new(),
            description: String::new(),
            color: DEFAULT_CATEGORY_COLOR.to_owned(),
        },
        "",
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Nova Categoria", &[], &content)
}

fn new_category_form_view(form_data: &CategoryFormData, error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::CATEGORIES_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (category_form_fields(form_data))

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Criar Categoria" }
        }
    }
}

/// The name, description and colour inputs shared by the create and edit forms.
pub(super) fn category_form_fields(form_data: &CategoryFormData) -> Markup {
    let color = color_or_default(&form_data.color);

    html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Nome" }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Nome da categoria"
                value=(form_data.name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="description" class=(FORM_LABEL_STYLE) { "Descrição" }

            input
                id="description"
                type="text"
                name="description"
                placeholder="Descrição (opcional)"
                value=(form_data.description)
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="color" class=(FORM_LABEL_STYLE) { "Cor" }

            input
                id="color"
                type="color"
                name="color"
                value=(color)
                class="h-10 w-20 cursor-pointer rounded border border-gray-300 dark:border-gray-600";
        }
    }
}


#[cfg(test)]
mod create_category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::State,
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        category::{
            create::CreateCategoryEndpointState, create_category_endpoint, domain::CategoryFormData,
            get_category_by_name,
        },
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, assert_valid_html, get_header,
            must_get_form, parse_html_fragment,
        },
    };

    fn get_category_state() -> CreateCategoryEndpointState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        CreateCategoryEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn form(name: &str, color: &str) -> CategoryFormData {
        CategoryFormData {
            name: name.to_owned(),
            description: "Viagens e passeios".to_owned(),
            color: color.to_owned(),
        }
    }

    #[tokio::test]
    async fn can_create_category() {
        let state = get_category_state();

        let response =
            create_category_endpoint(State(state.clone()), Form(form("Viagem", "#00FF00")))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::CATEGORIES_VIEW);
        let category = get_category_by_name("Viagem", &state.db_connection.lock().unwrap())
            .expect("Category was not created");
        assert_eq!(category.description, "Viagens e passeios");
        assert_eq!(category.color, "#00FF00");
    }

    #[tokio::test]
    async fn blank_color_uses_default() {
        let state = get_category_state();

        create_category_endpoint(State(state.clone()), Form(form("Pets", "")))
            .await
            .into_response();

        let category = get_category_by_name("Pets", &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(category.color, "#D4A5A5");
    }

    #[tokio::test]
    async fn create_category_fails_on_empty_name() {
        let state = get_category_state();

        let response = create_category_endpoint(State(state), Form(form("  ", "")))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            get_header(&response, CONTENT_TYPE.as_str()),
            "text/html; charset=utf-8"
        );
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: Category name cannot be empty");
    }

    #[tokio::test]
    async fn create_category_fails_on_duplicate_name() {
        let state = get_category_state();
        create_category_endpoint(State(state.clone()), Form(form("Viagem", "")))
            .await
            .into_response();

        let response = create_category_endpoint(State(state), Form(form("Viagem", "")))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
