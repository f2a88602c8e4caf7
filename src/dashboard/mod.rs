//! Dashboard module
//!
//! Provides an overview page with the user's totals, a chart of spending per
//! category and the latest transactions.

mod handlers;
mod tables;

pub use handlers::get_dashboard_page;
pub(crate) use tables::breakdown_table;
