//! FinançasPlus is a web app for tracking personal income and expenses.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

/// How long open connections get to finish after a shutdown signal.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(1);

mod aggregation;
mod alert;
mod amount;
mod app_state;
mod auth;
mod category;
mod charts;
mod dashboard;
mod db;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod report;
mod routing;
mod timezone;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use aggregation::{Period, YearMonth};
pub use amount::Amount;
pub use app_state::AppState;
pub use auth::{
    NewUser, PasswordHash, User, UserID, Username, ValidatedPassword, create_user,
    get_user_by_username, update_password,
};
pub use category::{ensure_default_categories, get_category_by_name};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::{Transaction, TransactionType, count_transactions, create_transaction};

/// Wait for ctrl+c or, on Unix, SIGTERM and then ask the server behind `handle`
/// to finish its open requests and stop.
///
/// If a signal handler cannot be installed, that signal is ignored and the
/// error is logged.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for ctrl+c: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for SIGTERM: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "ctrl+c",
        _ = terminate => "terminate",
    };

    tracing::info!("Received {signal} signal, shutting down");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}
