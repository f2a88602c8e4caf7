//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    aggregation::Period,
    amount::Amount,
    auth::UserID,
    category::{CategoryId, get_category},
};

/// The database ID of a transaction.
pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, e.g. a salary.
    Income,
    /// Money spent, e.g. groceries.
    Expense,
}

impl TransactionType {
    /// The value used in the database and in forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Receita",
            TransactionType::Expense => "Despesa",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(Error::ValidationError(format!(
                "\"{other}\" is not a transaction type"
            ))),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// An income or expense recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// The category the transaction is filed under.
    pub category_id: CategoryId,
    /// Whether the transaction is an income or an expense.
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// How much money was earned or spent, always positive.
    pub amount: Amount,
    /// When the transaction happened.
    pub date: Date,
    /// When the transaction was recorded.
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    pub updated_at: OffsetDateTime,
}

impl Transaction {
    /// Start building a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(
        transaction_type: TransactionType,
        amount: Amount,
        date: Date,
        category_id: CategoryId,
    ) -> NewTransaction {
        NewTransaction {
            category_id,
            transaction_type,
            description: String::new(),
            amount,
            date,
        }
    }
}

/// The data needed to create a [Transaction].
///
/// The owner and timestamps are filled in by [create_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The category to file the transaction under, it must exist.
    pub category_id: CategoryId,
    /// Whether the transaction is an income or an expense.
    pub transaction_type: TransactionType,
    /// A human-readable description, may be empty.
    pub description: String,
    /// How much money was earned or spent.
    pub amount: Amount,
    /// The date when the transaction occurred.
    pub date: Date,
}

impl NewTransaction {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }
}

/// A partial update for a transaction.
///
/// Only the `Some` fields are written, everything else keeps its current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    /// The new category, it must exist.
    pub category_id: Option<CategoryId>,
    /// The new type.
    pub transaction_type: Option<TransactionType>,
    /// The new description.
    pub description: Option<String>,
    /// The new amount.
    pub amount: Option<Amount>,
    /// The new date.
    pub date: Option<Date>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, category_id, type, description, amount, date, \
    created_at, updated_at";

/// Create a new transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if the category ID does not refer to a category,
/// - [Error::NotFound] if `user_id` does not refer to a user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    ensure_category_exists(new_transaction.category_id, connection)?;

    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, category_id, type, description, amount, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                new_transaction.category_id,
                new_transaction.transaction_type,
                &new_transaction.description,
                new_transaction.amount,
                new_transaction.date,
                now,
                now,
            ),
            map_transaction_row,
        )
        .map_err(|error| match error {
            // The category was checked above, so the user must be missing.
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound,
            error => error.into(),
        })
}

/// Retrieve the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Apply `patch` to the transaction `id` owned by `user_id` and return the result.
///
/// The update timestamp is refreshed even if `patch` is empty.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if the user has no transaction with the ID `id`,
/// - [Error::CategoryNotFound] if the patch moves the transaction to a missing category,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    patch: TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let current = match get_transaction(id, user_id, &sql_transaction) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    if let Some(category_id) = patch.category_id {
        ensure_category_exists(category_id, &sql_transaction)?;
    }

    let updated = Transaction {
        category_id: patch.category_id.unwrap_or(current.category_id),
        transaction_type: patch.transaction_type.unwrap_or(current.transaction_type),
        description: patch.description.unwrap_or(current.description),
        amount: patch.amount.unwrap_or(current.amount),
        date: patch.date.unwrap_or(current.date),
        updated_at: OffsetDateTime::now_utc().max(current.created_at),
        ..current
    };

    sql_transaction.execute(
        "UPDATE \"transaction\"
         SET category_id = ?1, type = ?2, description = ?3, amount = ?4, date = ?5, updated_at = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            updated.category_id,
            updated.transaction_type,
            &updated.description,
            updated.amount,
            updated.date,
            updated.updated_at,
            id,
            user_id.as_i64(),
        ),
    )?;

    sql_transaction.commit()?;

    Ok(updated)
}

/// Delete the transaction `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if the user has no transaction with the ID `id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Get all of a user's transactions, newest first.
pub fn get_transactions_by_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(
        "user_id = ?1",
        rusqlite::params![user_id.as_i64()],
        connection,
    )
}

/// Get a user's transactions dated within `period`, bounds included, newest first.
pub fn get_transactions_in_date_range(
    user_id: UserID,
    period: &Period,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(
        "user_id = ?1 AND date BETWEEN ?2 AND ?3",
        rusqlite::params![user_id.as_i64(), period.start, period.end],
        connection,
    )
}

/// Get a user's incomes or expenses, newest first.
pub fn get_transactions_by_type(
    user_id: UserID,
    transaction_type: TransactionType,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(
        "user_id = ?1 AND type = ?2",
        rusqlite::params![user_id.as_i64(), transaction_type],
        connection,
    )
}

/// Get a user's transactions filed under `category_id`, newest first.
pub fn get_transactions_by_category(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    query_transactions(
        "user_id = ?1 AND category_id = ?2",
        rusqlite::params![user_id.as_i64(), category_id],
        connection,
    )
}

fn query_transactions(
    where_clause: &str,
    params: &[&dyn ToSql],
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE {where_clause}
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(params, map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

fn ensure_category_exists(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    match get_category(category_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::CategoryNotFound(category_id)),
        Err(error) => Err(error),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                description TEXT NOT NULL DEFAULT '',
                amount INTEGER NOT NULL CHECK (amount > 0),
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id),
                FOREIGN KEY(category_id) REFERENCES category(id)
                )",
        (),
    )?;

    // Every listing and report filters by user and orders or ranges by date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let category_id = row.get(2)?;
    let transaction_type = row.get(3)?;
    let description = row.get(4)?;
    let amount = row.get(5)?;
    let date = row.get(6)?;
    let created_at = row.get(7)?;
    let updated_at = row.get(8)?;

    Ok(Transaction {
        id,
        user_id,
        category_id,
        transaction_type,
        description,
        amount,
        date,
        created_at,
        updated_at,
    })
}

// ============================================================================
// TESTS
// ============================================================================
