//! The page listing the logged in user's transactions, optionally filtered by type or category.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    aggregation::{balance, total_expenses, total_income},
    auth::UserID,
    category::{Category, CategoryId, ensure_default_categories, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        edit_delete_action_links, format_currency, format_date, summary_cards,
    },
    navigation::NavBar,
    transaction::core::{
        Transaction, TransactionType, get_transactions_by_category, get_transactions_by_type,
        get_transactions_by_user,
    },
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The raw query string of the transactions page.
///
/// Values are kept as text so that an empty or unknown value from the
/// filter form means "no filter" instead of a rejected request.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub category_id: Option<String>,
}

/// The filters that were understood from [TransactionsQuery].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TransactionFilter {
    transaction_type: Option<TransactionType>,
    category_id: Option<CategoryId>,
}

impl From<&TransactionsQuery> for TransactionFilter {
    fn from(query: &TransactionsQuery) -> Self {
        Self {
            transaction_type: query
                .transaction_type
                .as_deref()
                .and_then(|value| value.parse().ok()),
            category_id: query
                .category_id
                .as_deref()
                .and_then(|value| value.trim().parse().ok()),
        }
    }
}

impl TransactionFilter {
    fn is_active(&self) -> bool {
        self.transaction_type.is_some() || self.category_id.is_some()
    }
}

fn get_filtered_transactions(
    user_id: UserID,
    filter: TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    match (filter.transaction_type, filter.category_id) {
        (None, None) => get_transactions_by_user(user_id, connection),
        (Some(transaction_type), None) => {
            get_transactions_by_type(user_id, transaction_type, connection)
        }
        (None, Some(category_id)) => get_transactions_by_category(user_id, category_id, connection),
        (Some(transaction_type), Some(category_id)) => {
            let mut transactions = get_transactions_by_category(user_id, category_id, connection)?;
            transactions.retain(|transaction| transaction.transaction_type == transaction_type);
            Ok(transactions)
        }
    }
}

/// Display the logged in user's transactions, newest first.
///
/// Supports `?type=income|expense` and `?category_id=N`.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let filter = TransactionFilter::from(&query);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ensure_default_categories(&connection)?;
    let categories = get_all_categories(&connection)?;
    let transactions = get_filtered_transactions(user_id, filter, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions for {user_id}: {error}"))?;

    Ok(transactions_view(&transactions, &categories, filter).into_response())
}

fn transactions_view(
    transactions: &[Transaction],
    categories: &[Category],
    filter: TransactionFilter,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let categories_by_id: HashMap<CategoryId, &Category> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transações" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Nova Transação"
                    }
                }

                (filter_form(categories, filter))

                (summary_cards(
                    "transactions-summary",
                    total_income(transactions),
                    total_expenses(transactions),
                    balance(transactions),
                ))

                @if transactions.is_empty() {
                    p class="text-gray-600 dark:text-gray-400"
                    {
                        @if filter.is_active() {
                            "Nenhuma transação encontrada com esses filtros."
                        } @else {
                            "Nenhuma transação registrada ainda. "
                            a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                            {
                                "Registre a primeira."
                            }
                        }
                    }
                } @else {
                    div class="w-full overflow-x-auto dark:bg-gray-800"
                    {
                        (transactions_table(transactions, &categories_by_id))
                    }
                }
            }
        }
    };

    base("Transações", &[], &content)
}

fn filter_form(categories: &[Category], filter: TransactionFilter) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="filter-type" class=(FORM_LABEL_STYLE) { "Tipo" }

                select name="type" id="filter-type" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[filter.transaction_type.is_none()] { "Todos" }

                    @for transaction_type in [TransactionType::Income, TransactionType::Expense] {
                        option
                            value=(transaction_type.as_str())
                            selected[filter.transaction_type == Some(transaction_type)]
                        {
                            (transaction_type.label())
                        }
                    }
                }
            }

            div
            {
                label for="filter-category" class=(FORM_LABEL_STYLE) { "Categoria" }

                select name="category_id" id="filter-category" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[filter.category_id.is_none()] { "Todas" }

                    @for category in categories {
                        option
                            value=(category.id)
                            selected[filter.category_id == Some(category.id)]
                        {
                            (category.name)
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filtrar" }

            @if filter.is_active() {
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Limpar filtros" }
            }
        }
    }
}

/// The transaction table, also used for the recent transactions on the dashboard.
pub fn transactions_table(
    transactions: &[Transaction],
    categories_by_id: &HashMap<CategoryId, &Category>,
) -> Markup {
    html! {
        table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
        {
            thead class=(TABLE_HEADER_STYLE)
            {
                tr
                {
                    th scope="col" class=(TABLE_CELL_STYLE) { "Data" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Descrição" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Categoria" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Tipo" }
                    th scope="col" class="px-6 py-3 text-right" { "Valor" }
                    th scope="col" class=(TABLE_CELL_STYLE) { "Ações" }
                }
            }

            tbody
            {
                @for transaction in transactions {
                    (transaction_row(transaction, categories_by_id.get(&transaction.category_id).copied()))
                }
            }
        }
    }
}

fn transaction_row(transaction: &Transaction, category: Option<&Category>) -> Markup {
    let amount_style = match transaction.transaction_type {
        TransactionType::Income => "px-6 py-4 text-right text-green-600 dark:text-green-400",
        TransactionType::Expense => "px-6 py-4 text-right text-red-600 dark:text-red-400",
    };
    let action_links = edit_delete_action_links(
        &format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id),
        &format_endpoint(endpoints::TRANSACTION, transaction.id),
        "Excluir esta transação? Esta ação não pode ser desfeita.",
    );

    html! {
        tr class=(TABLE_ROW_STYLE)
        {
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.date) { (format_date(transaction.date)) }
            }

            td class=(TABLE_CELL_STYLE) { (transaction.description) }

            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(category) = category {
                    span class="inline-flex items-center gap-2"
                    {
                        span
                            class="inline-block w-3 h-3 rounded-full"
                            style={"background-color: " (category.color)}
                        {}
                        (category.name)
                    }
                }
            }

            td class=(TABLE_CELL_STYLE) { (transaction.transaction_type.label()) }

            td class=(amount_style) { (format_currency(transaction.amount.value())) }

            td class=(TABLE_CELL_STYLE) { (action_links) }
        }
    }
}
