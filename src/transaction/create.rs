//! The page and endpoint for recording a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// axum_extra's Form reports which field failed to parse in its rejection.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    amount::Amount,
    auth::UserID,
    category::{Category, get_all_categories},
    endpoints,
    html::{FORM_CONTAINER_STYLE, base, currency_input_styles},
    navigation::NavBar,
    timezone::current_local_date,
    transaction::{
        core::{Transaction, create_transaction},
        form::{FormAction, TransactionForm, TransactionFormDefaults, transaction_form},
    },
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn new_transaction_view(defaults: &TransactionFormDefaults, categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let form = transaction_form(
        FormAction::Create(endpoints::TRANSACTIONS_API),
        defaults,
        categories,
        None,
    );

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Nova Transação" }
            (form)
        }
    };

    base("Nova Transação", &[currency_input_styles()], &content)
}

/// Render the page for recording a transaction, dated today by default.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;

    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new transaction page: {error}")
        })?
    };

    Ok(new_transaction_view(&TransactionFormDefaults::new(today), &categories).into_response())
}

/// Create a transaction for the logged in user, then redirect to the transaction list.
///
/// A non-positive amount re-renders the form with an error message.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let amount = match Amount::new(form.amount) {
        Ok(amount) => amount,
        Err(error) => {
            let categories = match get_all_categories(&connection) {
                Ok(categories) => categories,
                Err(error) => return error.into_alert_response(),
            };

            return transaction_form(
                FormAction::Create(endpoints::TRANSACTIONS_API),
                &TransactionFormDefaults::from(&form),
                &categories,
                Some(&format!("Error: {error}")),
            )
            .into_response();
        }
    };

    let new_transaction =
        Transaction::build(form.transaction_type, amount, form.date, form.category_id)
            .description(form.description.trim());

    match create_transaction(user_id, new_transaction, &connection) {
        Ok(transaction) => {
            tracing::debug!("User {user_id} created transaction {}", transaction.id);
            (
                HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::CategoryNotFound(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod new_transaction_page_tests {
    use axum::{extract::State, http::StatusCode};
    use time::OffsetDateTime;

    use crate::{
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_input_with_value,
            assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            get_shared_connection, must_get_form, parse_html_document, select_text,
        },
    };

    use super::{NewTransactionPageState, get_new_transaction_page};

    #[tokio::test]
    async fn new_transaction_page_has_form() {
        let state = NewTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: get_shared_connection(),
        };

        let response = get_new_transaction_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "amount", "number");
        assert_form_input_with_value(
            &form,
            "date",
            "date",
            &OffsetDateTime::now_utc().date().to_string(),
        );
        assert_form_submit_button(&form);

        let options = select_text(&html, "select[name=category_id] option");
        assert_eq!(options.len(), 8, "want placeholder plus 7 default categories");
        assert_eq!(options[1], "Alimentação");
    }

    #[tokio::test]
    async fn new_transaction_page_fails_on_invalid_timezone() {
        let state = NewTransactionPageState {
            local_timezone: "Nowhere/Atlantis".to_owned(),
            db_connection: get_shared_connection(),
        };

        let result = get_new_transaction_page(State(state)).await;

        assert!(result.is_err());
    }
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_error_message, assert_hx_redirect, category_id, create_test_user,
            get_shared_connection, must_get_form, parse_html_fragment,
        },
        transaction::{
            TransactionType, count_transactions, form::TransactionForm, get_transactions_by_user,
        },
    };

    use super::{CreateTransactionState, create_transaction_endpoint};

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let db_connection = get_shared_connection();
        let (user_id, food) = {
            let connection = db_connection.lock().unwrap();
            (
                create_test_user("ana", &connection),
                category_id("Alimentação", &connection),
            )
        };
        let form = TransactionForm {
            transaction_type: TransactionType::Expense,
            amount: d("12.34"),
            date: date!(2024 - 01 - 10),
            category_id: food,
            description: " Mercado ".to_owned(),
        };

        let response = create_transaction_endpoint(
            State(CreateTransactionState {
                db_connection: db_connection.clone(),
            }),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);

        let transactions =
            get_transactions_by_user(user_id, &db_connection.lock().unwrap()).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount.value(), d("12.34"));
        assert_eq!(transactions[0].description, "Mercado");
        assert_eq!(transactions[0].category_id, food);
    }

    #[tokio::test]
    async fn zero_amount_shows_form_error() {
        let db_connection = get_shared_connection();
        let (user_id, food) = {
            let connection = db_connection.lock().unwrap();
            (
                create_test_user("ana", &connection),
                category_id("Alimentação", &connection),
            )
        };
        let form = TransactionForm {
            transaction_type: TransactionType::Expense,
            amount: Decimal::ZERO,
            date: date!(2024 - 01 - 10),
            category_id: food,
            description: String::new(),
        };

        let response = create_transaction_endpoint(
            State(CreateTransactionState {
                db_connection: db_connection.clone(),
            }),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_error_message(
            &must_get_form(&html),
            "Error: the amount must be greater than zero",
        );
        assert_eq!(count_transactions(&db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn oversized_amount_shows_form_error() {
        let db_connection = get_shared_connection();
        let (user_id, home) = {
            let connection = db_connection.lock().unwrap();
            (
                create_test_user("ana", &connection),
                category_id("Moradia", &connection),
            )
        };
        let form = TransactionForm {
            transaction_type: TransactionType::Expense,
            amount: d("100000000000000000000"),
            date: date!(2024 - 01 - 10),
            category_id: home,
            description: String::new(),
        };

        let response = create_transaction_endpoint(
            State(CreateTransactionState {
                db_connection: db_connection.clone(),
            }),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_form_error_message(
            &must_get_form(&html),
            "Error: the amount must be at most 92233720368547758.07",
        );
        assert_eq!(count_transactions(&db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn unknown_category_returns_bad_request() {
        let db_connection = get_shared_connection();
        let user_id = create_test_user("ana", &db_connection.lock().unwrap());
        let form = TransactionForm {
            transaction_type: TransactionType::Income,
            amount: d("100"),
            date: date!(2024 - 01 - 10),
            category_id: 999,
            description: String::new(),
        };

        let response = create_transaction_endpoint(
            State(CreateTransactionState { db_connection }),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
