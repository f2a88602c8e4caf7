//! The page and endpoint for changing an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    amount::Amount,
    auth::UserID,
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, base, currency_input_styles},
    navigation::NavBar,
    transaction::{
        core::{TransactionId, TransactionPatch, get_transaction, update_transaction},
        form::{FormAction, TransactionForm, TransactionFormDefaults, transaction_form},
    },
};

/// The state needed to show and submit the edit transaction form.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn edit_transaction_view(
    transaction_id: TransactionId,
    defaults: &TransactionFormDefaults,
    categories: &[Category],
) -> Markup {
    let edit_url = format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction_id);
    let update_url = format_endpoint(endpoints::TRANSACTION, transaction_id);
    let nav_bar = NavBar::new(&edit_url).into_html();
    let form = transaction_form(FormAction::Update(&update_url), defaults, categories, None);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-xl font-bold mb-4" { "Editar Transação" }
            (form)
        }
    };

    base("Editar Transação", &[currency_input_styles()], &content)
}

/// Render the edit form for one of the logged in user's transactions.
///
/// Transactions owned by other users are reported as not found.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = get_transaction(transaction_id, user_id, &connection)?;
    let categories = get_all_categories(&connection)?;

    Ok(edit_transaction_view(
        transaction_id,
        &TransactionFormDefaults::from(&transaction),
        &categories,
    )
    .into_response())
}

/// Replace the fields of a transaction with the submitted form, then redirect to the list.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<TransactionId>,
    State(state): State<EditTransactionState>,
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
            let update_url = format_endpoint(endpoints::TRANSACTION, transaction_id);

            return transaction_form(
                FormAction::Update(&update_url),
                &TransactionFormDefaults::from(&form),
                &categories,
                Some(&format!("Error: {error}")),
            )
            .into_response();
        }
    };

    let patch = TransactionPatch {
        category_id: Some(form.category_id),
        transaction_type: Some(form.transaction_type),
        description: Some(form.description.trim().to_owned()),
        amount: Some(amount),
        date: Some(form.date),
    };

    match update_transaction(transaction_id, user_id, patch, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::UpdateMissingTransaction | Error::CategoryNotFound(_))) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!("could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod edit_transaction_tests {
    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        Error,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_checked_radio, assert_form_error_message, assert_form_input_with_value,
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, category_id,
            create_test_user, get_shared_connection, insert_transaction, must_get_form,
            parse_html_document, parse_html_fragment,
        },
        transaction::{TransactionType, core::get_transaction, form::TransactionForm},
    };

    use super::{EditTransactionState, get_edit_transaction_page, update_transaction_endpoint};

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[tokio::test]
    async fn edit_page_is_prefilled() {
        let db_connection = get_shared_connection();
        let (user_id, transaction) = {
            let connection = db_connection.lock().unwrap();
            let user_id = create_test_user("ana", &connection);
            let transaction = insert_transaction(
                user_id,
                TransactionType::Income,
                "1000",
                date!(2024 - 01 - 05),
                "Outros",
                &connection,
            );
            (user_id, transaction)
        };

        let response = get_edit_transaction_page(
            Path(transaction.id),
            State(EditTransactionState { db_connection }),
            Extension(user_id),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::TRANSACTION, transaction.id),
            "hx-put",
        );
        assert_checked_radio(&form, "type", "income");
        assert_form_input_with_value(&form, "amount", "number", "1000.00");
        assert_form_input_with_value(&form, "date", "date", "2024-01-05");
    }

    #[tokio::test]
    async fn edit_page_hides_other_users_transactions() {
        let db_connection = get_shared_connection();
        let (intruder, transaction) = {
            let connection = db_connection.lock().unwrap();
            let owner = create_test_user("ana", &connection);
            let intruder = create_test_user("bia", &connection);
            let transaction = insert_transaction(
                owner,
                TransactionType::Expense,
                "10",
                date!(2024 - 01 - 05),
                "Lazer",
                &connection,
            );
            (intruder, transaction)
        };

        let result = get_edit_transaction_page(
            Path(transaction.id),
            State(EditTransactionState { db_connection }),
            Extension(intruder),
        )
        .await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let db_connection = get_shared_connection();
        let (user_id, transaction, transport) = {
            let connection = db_connection.lock().unwrap();
            let user_id = create_test_user("ana", &connection);
            let transaction = insert_transaction(
                user_id,
                TransactionType::Expense,
                "200",
                date!(2024 - 01 - 10),
                "Alimentação",
                &connection,
            );
            (user_id, transaction, category_id("Transporte", &connection))
        };
        let form = TransactionForm {
            transaction_type: TransactionType::Expense,
            amount: d("45.5"),
            date: date!(2024 - 01 - 11),
            category_id: transport,
            description: "Uber".to_owned(),
        };

        let response = update_transaction_endpoint(
            Path(transaction.id),
            State(EditTransactionState {
                db_connection: db_connection.clone(),
            }),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);

        let updated =
            get_transaction(transaction.id, user_id, &db_connection.lock().unwrap()).unwrap();
        assert_eq!(updated.amount.value(), d("45.50"));
        assert_eq!(updated.category_id, transport);
        assert_eq!(updated.description, "Uber");
        assert_eq!(updated.date, date!(2024 - 01 - 11));
        assert_eq!(updated.created_at, transaction.created_at);
        assert!(updated.updated_at >= transaction.updated_at);
    }

    #[tokio::test]
    async fn update_rejects_negative_amount() {
        let db_connection = get_shared_connection();
        let (user_id, transaction) = {
            let connection = db_connection.lock().unwrap();
            let user_id = create_test_user("ana", &connection);
            let transaction = insert_transaction(
                user_id,
                TransactionType::Expense,
                "200",
                date!(2024 - 01 - 10),
                "Alimentação",
                &connection,
            );
            (user_id, transaction)
        };
        let form = TransactionForm {
            transaction_type: TransactionType::Expense,
            amount: d("-5.00"),
            date: transaction.date,
            category_id: transaction.category_id,
            description: String::new(),
        };

        let response = update_transaction_endpoint(
            Path(transaction.id),
            State(EditTransactionState {
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
        let unchanged =
            get_transaction(transaction.id, user_id, &db_connection.lock().unwrap()).unwrap();
        assert_eq!(unchanged, transaction);
    }

    #[tokio::test]
    async fn update_missing_transaction_returns_not_found() {
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
            amount: d("1"),
            date: date!(2024 - 01 - 10),
            category_id: food,
            description: String::new(),
        };

        let response = update_transaction_endpoint(
            Path(404),
            State(EditTransactionState { db_connection }),
            Extension(user_id),
            Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
