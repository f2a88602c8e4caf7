//! The monthly report: income, expenses and spending per category for one month.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Month;

use crate::{
    AppState, Error,
    aggregation::{MonthlyReport, YearMonth, monthly_report},
    auth::UserID,
    category::{ensure_default_categories, get_all_categories},
    charts::{PageChart, category_breakdown_chart, chart_container, charts_script},
    dashboard::breakdown_table,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base, summary_cards},
    navigation::NavBar,
    timezone::current_local_date,
    transaction::get_transactions_in_date_range,
};

const REPORT_CHART_ID: &str = "report-breakdown-chart";

/// The state needed for the report page.
#[derive(Debug, Clone)]
pub struct ReportPageState {
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query string of the report page.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// The month to report on as "YYYY-MM". Defaults to the current month.
    pub month: Option<String>,
}

/// Display the report for `?month=YYYY-MM`, or for the current local month.
///
/// A malformed month renders the current month instead of an error page.
pub async fn get_report_page(
    State(state): State<ReportPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let requested_month = query
        .month
        .as_deref()
        .filter(|month| !month.trim().is_empty())
        .and_then(|month| {
            month
                .parse::<YearMonth>()
                .inspect_err(|error| tracing::debug!("Ignoring report month: {error}"))
                .ok()
        });
    let year_month = match requested_month {
        Some(year_month) => year_month,
        None => YearMonth::from_date(current_local_date(&state.local_timezone)?),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    ensure_default_categories(&connection)?;
    let categories = get_all_categories(&connection)?;
    let transactions = get_transactions_in_date_range(user_id, &year_month.period(), &connection)?;

    let report = monthly_report(&transactions, &categories, year_month);

    Ok(report_view(&report).into_response())
}

fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "Janeiro",
        Month::February => "Fevereiro",
        Month::March => "Março",
        Month::April => "Abril",
        Month::May => "Maio",
        Month::June => "Junho",
        Month::July => "Julho",
        Month::August => "Agosto",
        Month::September => "Setembro",
        Month::October => "Outubro",
        Month::November => "Novembro",
        Month::December => "Dezembro",
    }
}

fn report_url(year_month: YearMonth) -> String {
    format!("{}?month={year_month}", endpoints::REPORTS_VIEW)
}

fn report_view(report: &MonthlyReport<'_>) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let year_month = report.year_month;
    let title = format!("{} de {}", month_name(year_month.month()), year_month.year());

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-8 w-full lg:max-w-5xl"
            {
                header class="flex justify-between items-baseline flex-wrap gap-4"
                {
                    @if let Some(previous) = year_month.previous() {
                        a id="previous-month" href=(report_url(previous)) class=(LINK_STYLE)
                        {
                            "← " (month_name(previous.month()))
                        }
                    }

                    h1 class="text-xl font-bold" { "Relatório de " (title) }

                    @if let Some(next) = year_month.next() {
                        a id="next-month" href=(report_url(next)) class=(LINK_STYLE)
                        {
                            (month_name(next.month())) " →"
                        }
                    }
                }

                (summary_cards("report-summary", report.income, report.expenses, report.balance))

                section id="report-breakdown" class="space-y-4"
                {
                    h2 class="text-xl font-semibold" { "Despesas por categoria" }

                    @if report.breakdown.is_empty() {
                        p class="text-gray-600 dark:text-gray-400"
                        {
                            "Nenhuma despesa em " (title) "."
                        }
                    } @else {
                        div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                        {
                            (chart_container(REPORT_CHART_ID))
                            (breakdown_table(&report.breakdown))
                        }
                    }
                }

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    (report.transactions.len()) " transação(ões) no mês."
                }
            }
        }
    };

    let page_title = format!("Relatório de {title}");

    if report.breakdown.is_empty() {
        base(&page_title, &[], &content)
    } else {
        let chart = PageChart {
            id: REPORT_CHART_ID,
            options: category_breakdown_chart(&title, &report.breakdown).to_string(),
        };

        base(&page_title, &charts_script(&[chart]), &content)
    }
}
