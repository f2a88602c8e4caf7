//! Dashboard HTTP handler and view rendering.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    aggregation::{CategoryBreakdown, balance, expenses_by_category, total_expenses, total_income},
    auth::UserID,
    category::{Category, CategoryId, ensure_default_categories, get_all_categories},
    charts::{PageChart, category_breakdown_chart, chart_container, charts_script},
    dashboard::tables::breakdown_table,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base, link, summary_cards},
    navigation::NavBar,
    transaction::{Transaction, get_transactions_by_user, transactions_table},
};

/// How many of the latest transactions are listed on the dashboard.
const RECENT_TRANSACTION_COUNT: usize = 5;

const BREAKDOWN_CHART_ID: &str = "category-breakdown-chart";

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display a page with an overview of the logged in user's finances.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ensure_default_categories(&connection)?;
    let categories = get_all_categories(&connection)?;
    let transactions = get_transactions_by_user(user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get transactions for {user_id}: {error}"))?;

    if transactions.is_empty() {
        return Ok(dashboard_no_data_view().into_response());
    }

    Ok(dashboard_view(&transactions, &categories).into_response())
}

fn dashboard_view(transactions: &[Transaction], categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let breakdown = expenses_by_category(transactions, categories);
    let categories_by_id: HashMap<CategoryId, &Category> = categories
        .iter()
        .map(|category| (category.id, category))
        .collect();
    let recent_transactions = &transactions[..transactions.len().min(RECENT_TRANSACTION_COUNT)];

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-8 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                (summary_cards(
                    "dashboard-summary",
                    total_income(transactions),
                    total_expenses(transactions),
                    balance(transactions),
                ))

                (breakdown_section(&breakdown))

                section class="space-y-4"
                {
                    div class="flex justify-between items-baseline"
                    {
                        h2 class="text-xl font-semibold" { "Transações recentes" }

                        a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "Ver todas" }
                    }

                    div class="w-full overflow-x-auto dark:bg-gray-800"
                    {
                        (transactions_table(recent_transactions, &categories_by_id))
                    }
                }
            }
        }
    };

    if breakdown.is_empty() {
        base("Dashboard", &[], &content)
    } else {
        let chart = PageChart {
            id: BREAKDOWN_CHART_ID,
            options: category_breakdown_chart("Despesas por categoria", &breakdown).to_string(),
        };

        base("Dashboard", &charts_script(&[chart]), &content)
    }
}

fn breakdown_section(breakdown: &CategoryBreakdown) -> Markup {
    html! {
        section id="category-breakdown" class="space-y-4"
        {
            h2 class="text-xl font-semibold" { "Despesas por categoria" }

            @if breakdown.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "Nenhuma despesa registrada." }
            } @else {
                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    (chart_container(BREAKDOWN_CHART_ID))
                    (breakdown_table(breakdown))
                }
            }
        }
    }
}

fn dashboard_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                h1 class="text-xl font-bold" { "Dashboard" }

                p id="no-data"
                {
                    "Nenhuma transação registrada ainda. "
                    (link(endpoints::NEW_TRANSACTION_VIEW, "Registre sua primeira transação"))
                    " para ver o resumo das suas finanças."
                }
            }
        }
    };

    base("Dashboard", &[], &content)
}
