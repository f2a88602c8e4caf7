//! Income and expense records.
//!
//! This module contains everything related to transactions:
//! - The [Transaction] model and the database queries for it, all scoped to a user
//! - The pages and endpoints for listing, creating, editing and deleting transactions

mod core;
mod create;
mod delete;
mod edit;
mod form;
mod list;

pub use core::{
    Transaction, TransactionType, count_transactions, create_transaction,
    create_transaction_table, get_transactions_by_user, get_transactions_in_date_range,
};
pub use create::{create_transaction_endpoint, get_new_transaction_page};
pub use delete::delete_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use list::{get_transactions_page, transactions_table};
