//! Database fixtures shared by handler and store tests.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use time::Date;

use crate::{
    amount::Amount,
    auth::{NewUser, PasswordHash, UserID, Username, create_user},
    category::{CategoryId, ensure_default_categories, get_category_by_name},
    db::initialize,
    transaction::{Transaction, TransactionType, create_transaction},
};

/// An initialised in-memory database with the default categories.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    ensure_default_categories(&connection).expect("Could not seed default categories");
    connection
}

/// [get_test_connection] wrapped up the way handler state holds it.
pub(crate) fn get_shared_connection() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(get_test_connection()))
}

pub(crate) fn create_test_user(username: &str, connection: &Connection) -> UserID {
    create_user(
        NewUser {
            username: Username::new_unchecked(username),
            email: format!("{username}@example.com"),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            full_name: String::new(),
        },
        connection,
    )
    .expect("Could not create test user")
    .id
}

#[track_caller]
pub(crate) fn category_id(name: &str, connection: &Connection) -> CategoryId {
    get_category_by_name(name, connection)
        .expect("Could not find default category")
        .id
}

/// Insert a transaction for `user_id` filed under the category called `category_name`.
#[track_caller]
pub(crate) fn insert_transaction(
    user_id: UserID,
    transaction_type: TransactionType,
    amount: &str,
    date: Date,
    category_name: &str,
    connection: &Connection,
) -> Transaction {
    let amount: Amount = amount.parse().expect("Invalid test amount");

    create_transaction(
        user_id,
        Transaction::build(
            transaction_type,
            amount,
            date,
            category_id(category_name, connection),
        ),
        connection,
    )
    .expect("Could not create test transaction")
}
