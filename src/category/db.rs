//! Database operations for the category catalog.

use std::collections::HashMap;

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{
        Category, CategoryId, CategoryName, CategoryPatch, NewCategory,
        domain::DEFAULT_CATEGORIES,
    },
};

/// Create a category and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategoryName] if a category with the same name exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    new_category: NewCategory,
    connection: &Connection,
) -> Result<Category, Error> {
    match get_category_by_name(new_category.name.as_ref(), connection) {
        Ok(_) => return Err(Error::DuplicateCategoryName),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    insert_category(&new_category, connection)
}

fn insert_category(new_category: &NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(
            "INSERT INTO category (name, description, color, created_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, description, color, created_at",
        )?
        .query_row(
            (
                new_category.name.as_ref(),
                &new_category.description,
                &new_category.color,
                OffsetDateTime::now_utc(),
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, description, color, created_at FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve a single category by its exact name.
pub fn get_category_by_name(name: &str, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare(
            "SELECT id, name, description, color, created_at FROM category WHERE name = :name;",
        )?
        .query_row(&[(":name", &name)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories in the order they were created.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, description, color, created_at FROM category ORDER BY id ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Apply `patch` to a category and return the updated category.
///
/// Only the fields set in `patch` are changed.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingCategory] if `category_id` does not refer to a category,
/// - [Error::DuplicateCategoryName] if the new name belongs to a different category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_category(
    category_id: CategoryId,
    patch: CategoryPatch,
    connection: &Connection,
) -> Result<Category, Error> {
    let transaction = connection.unchecked_transaction()?;

    let current = match get_category(category_id, &transaction) {
        Ok(category) => category,
        Err(Error::NotFound) => return Err(Error::UpdateMissingCategory),
        Err(error) => return Err(error),
    };

    if let Some(ref new_name) = patch.name {
        if *new_name != current.name {
            match get_category_by_name(new_name.as_ref(), &transaction) {
                Ok(other) if other.id != category_id => {
                    return Err(Error::DuplicateCategoryName);
                }
                Ok(_) | Err(Error::NotFound) => {}
                Err(error) => return Err(error),
            }
        }
    }

    let name = patch.name.unwrap_or(current.name);
    let description = patch.description.unwrap_or(current.description);
    let color = patch.color.unwrap_or(current.color);

    transaction.execute(
        "UPDATE category SET name = ?1, description = ?2, color = ?3 WHERE id = ?4",
        (name.as_ref(), &description, &color, category_id),
    )?;

    transaction.commit()?;

    Ok(Category {
        id: category_id,
        name,
        description,
        color,
        created_at: current.created_at,
    })
}

/// Delete a category along with every transaction filed under it.
///
/// Both deletes happen in a single SQL transaction. Returns the number of
/// transactions that were removed.
///
/// # Errors
/// Returns [Error::DeleteMissingCategory] if the category does not exist,
/// in which case nothing is deleted.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<usize, Error> {
    let transaction = connection.unchecked_transaction()?;

    let removed_transactions = transaction.execute(
        "DELETE FROM \"transaction\" WHERE category_id = ?1",
        [category_id],
    )?;
    let rows_affected = transaction.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        // Dropping the SQL transaction rolls back the first delete.
        return Err(Error::DeleteMissingCategory);
    }

    transaction.commit()?;

    Ok(removed_transactions)
}

/// Insert the default categories if the catalog is empty.
///
/// Does nothing if any category exists, whichever categories they are.
/// Returns the number of categories created.
pub fn ensure_default_categories(connection: &Connection) -> Result<usize, Error> {
    let transaction = connection.unchecked_transaction()?;

    if count_categories(&transaction)? > 0 {
        return Ok(0);
    }

    for (name, description, color) in DEFAULT_CATEGORIES {
        insert_category(
            &NewCategory {
                name: CategoryName::new_unchecked(name),
                description: description.to_owned(),
                color: color.to_owned(),
            },
            &transaction,
        )?;
    }

    transaction.commit()?;

    Ok(DEFAULT_CATEGORIES.len())
}

/// Get the number of categories in the catalog.
pub fn count_categories(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM category;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Count the transactions of all users filed under each category.
///
/// Categories without transactions are not in the map.
pub fn count_transactions_per_category(
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare("SELECT category_id, COUNT(1) FROM \"transaction\" GROUP BY category_id")?
        .query_map((), |row| {
            let category_id = row.get(0)?;
            let count = row.get(1)?;

            Ok((category_id, count))
        })?
        .collect();

    result.map_err(Error::from)
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL DEFAULT '',
            color TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let description = row.get(2)?;
    let color = row.get(3)?;
    let created_at = row.get(4)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        description,
        color,
        created_at,
    })
}
