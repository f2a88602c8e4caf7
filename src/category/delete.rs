use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    category::{CategoryId, delete_category},
};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a category and every transaction filed under it, responds with an alert.
///
/// The status code has to be 200 OK or HTMX will not remove the table row.
pub async fn delete_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<DeleteCategoryEndpointState>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(removed_transactions) => {
            tracing::info!(
                "Deleted category {category_id} and {removed_transactions} transaction(s)"
            );

            Alert::Success {
                message: "Categoria excluída".to_owned(),
                details: format!("{removed_transactions} transação(ões) removida(s)."),
            }
            .into_response()
        }
        Err(Error::DeleteMissingCategory) => Error::DeleteMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}
