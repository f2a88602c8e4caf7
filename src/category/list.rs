//! The categories page: the shared catalog with per-category transaction counts.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        Category, CategoryId, count_transactions_per_category, ensure_default_categories,
        get_all_categories,
    },
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links,
    },
    navigation::NavBar,
};

/// The state needed for the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the categories page, seeding the default categories on first use.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ensure_default_categories(&connection)?;
    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;
    let transaction_counts = count_transactions_per_category(&connection)?;

    Ok(categories_view(&categories, &transaction_counts).into_response())
}

fn categories_view(
    categories: &[Category],
    transaction_counts: &HashMap<CategoryId, u32>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-4xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categorias" }

                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE)
                    {
                        "Nova Categoria"
                    }
                }

                div class="w-full overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Nome" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Descrição" }
                                th scope="col" class="px-6 py-3 text-right" { "Transações" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Ações" }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                (category_row(
                                    category,
                                    transaction_counts.get(&category.id).copied().unwrap_or(0),
                                ))
                            }
                        }
                    }
                }
            }
        }
    };

    base("Categorias", &[], &content)
}

fn category_row(category: &Category, transaction_count: u32) -> Markup {
    let confirm_message = match transaction_count {
        0 => format!("Excluir a categoria \"{}\"?", category.name),
        count => format!(
            "Excluir a categoria \"{}\"? {count} transação(ões) desta categoria também serão excluídas.",
            category.name
        ),
    };
    let action_links = edit_delete_action_links(
        &format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id),
        &format_endpoint(endpoints::CATEGORY, category.id),
        &confirm_message,
    );

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            th scope="row" class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
            {
                span class="inline-flex items-center gap-2"
                {
                    span
                        class="inline-block w-3 h-3 rounded-full"
                        style={"background-color: " (category.color)}
                    {}
                    (category.name)
                }
            }

            td class=(TABLE_CELL_STYLE) { (category.description) }

            td class="px-6 py-4 text-right" { (transaction_count) }

            td class=(TABLE_CELL_STYLE) { (action_links) }
        }
    }
}

#[cfg(test)]
mod categories_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        category::count_categories,
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_content_type, assert_valid_html, category_id, create_test_user,
            get_shared_connection, insert_transaction, parse_html_document, table_rows,
        },
        transaction::TransactionType,
    };

    use super::{CategoriesPageState, get_categories_page};

    #[tokio::test]
    async fn lists_catalog_with_transaction_counts() {
        let db_connection = get_shared_connection();
        {
            let connection = db_connection.lock().unwrap();
            let ana = create_test_user("ana", &connection);
            let bia = create_test_user("bia", &connection);
            for user_id in [ana, bia] {
                insert_transaction(
                    user_id,
                    TransactionType::Expense,
                    "10",
                    date!(2024 - 01 - 10),
                    "Lazer",
                    &connection,
                );
            }
        }

        let response = get_categories_page(State(CategoriesPageState { db_connection }))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let rows = table_rows(&html);
        assert_eq!(rows.len(), 7);
        let leisure = rows
            .iter()
            .find(|row| row[0] == "Lazer")
            .expect("Could not find the Lazer row");
        assert_eq!(leisure[2], "2");
        let food = rows
            .iter()
            .find(|row| row[0] == "Alimentação")
            .expect("Could not find the Alimentação row");
        assert_eq!(food[2], "0");
    }

    #[tokio::test]
    async fn delete_button_warns_about_cascade() {
        let db_connection = get_shared_connection();
        let leisure = {
            let connection = db_connection.lock().unwrap();
            let user_id = create_test_user("ana", &connection);
            insert_transaction(
                user_id,
                TransactionType::Expense,
                "10",
                date!(2024 - 01 - 10),
                "Lazer",
                &connection,
            );
            category_id("Lazer", &connection)
        };

        let response = get_categories_page(State(CategoriesPageState { db_connection }))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        let selector = Selector::parse(&format!(
            "button[hx-delete=\"{}\"]",
            format_endpoint(endpoints::CATEGORY, leisure)
        ))
        .unwrap();
        let button = html
            .select(&selector)
            .next()
            .expect("Could not find delete button");
        let confirm = button.value().attr("hx-confirm").unwrap();
        assert!(
            confirm.contains("1 transação(ões)"),
            "want cascade warning, got {confirm:?}"
        );
    }

    #[tokio::test]
    async fn seeds_default_categories() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let db_connection = Arc::new(Mutex::new(connection));

        get_categories_page(State(CategoriesPageState {
            db_connection: db_connection.clone(),
        }))
        .await
        .unwrap();

        assert_eq!(count_categories(&db_connection.lock().unwrap()), Ok(7));
    }
}
