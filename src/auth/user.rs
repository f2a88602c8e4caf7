//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The name a user logs in with.
///
/// Leading and trailing whitespace is removed and the name cannot be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    /// Create a username.
    ///
    /// # Errors
    ///
    /// Returns [Error::ValidationError] if `username` is empty or only whitespace.
    pub fn new(username: &str) -> Result<Self, Error> {
        let username = username.trim();

        if username.is_empty() {
            Err(Error::ValidationError("Username cannot be empty".to_owned()))
        } else {
            Ok(Self(username.to_owned()))
        }
    }

    /// Create a username without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(username: &str) -> Self {
        Self(username.to_owned())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The unique name the user logs in with.
    pub username: Username,
    /// The user's unique email address.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's display name, may be empty.
    pub full_name: String,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// The data needed to register a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The name the user will log in with.
    pub username: Username,
    /// The user's email address, it must not belong to another user.
    pub email: String,
    /// The hash of the password the user chose.
    pub password_hash: PasswordHash,
    /// The user's display name, may be empty.
    pub full_name: String,
}

/// The profile fields a user may change, `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    /// The new display name.
    pub full_name: Option<String>,
    /// The new email address.
    pub email: Option<String>,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                full_name TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

fn username_exists(username: &str, connection: &Connection) -> Result<bool, Error> {
    let exists = connection
        .query_row(
            "SELECT 1 FROM user WHERE username = ?1",
            (username,),
            |_| Ok(()),
        )
        .optional()?
        .is_some();

    Ok(exists)
}

fn email_owner(email: &str, connection: &Connection) -> Result<Option<UserID>, Error> {
    let owner = connection
        .query_row("SELECT id FROM user WHERE email = ?1", (email,), |row| {
            row.get(0).map(UserID::new)
        })
        .optional()?;

    Ok(owner)
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns:
/// - [Error::DuplicateUsername] if the username is taken, this is checked before the email,
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    if username_exists(new_user.username.as_ref(), connection)? {
        return Err(Error::DuplicateUsername);
    }

    if email_owner(&new_user.email, connection)?.is_some() {
        return Err(Error::DuplicateEmail);
    }

    let created_at = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO user (username, email, password, full_name, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            new_user.username.as_ref(),
            &new_user.email,
            new_user.password_hash.as_ref(),
            &new_user.full_name,
            created_at,
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: new_user.username,
        email: new_user.email,
        password_hash: new_user.password_hash,
        full_name: new_user.full_name,
        created_at,
    })
}

const SELECT_USER: &str = "SELECT id, username, email, password, full_name, created_at FROM user";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_username: String = row.get(1)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        username: Username::new_unchecked(&raw_username),
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        full_name: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(&format!("{SELECT_USER} WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user that logs in with `username`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that username.
pub fn get_user_by_username(username: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(&format!("{SELECT_USER} WHERE username = :username"))?
        .query_row(&[(":username", &username.trim())], map_user_row)
        .map_err(|error| error.into())
}

/// Update the profile of the user `user_id`.
///
/// The email address is only checked for uniqueness when it changes.
///
/// # Errors
///
/// Returns:
/// - [Error::NotFound] if the user does not exist,
/// - [Error::DuplicateEmail] if another user already has the new email address,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn update_user(
    user_id: UserID,
    patch: UserPatch,
    connection: &Connection,
) -> Result<User, Error> {
    let mut user = get_user_by_id(user_id, connection)?;

    if let Some(email) = patch.email {
        if email != user.email {
            if email_owner(&email, connection)?.is_some() {
                return Err(Error::DuplicateEmail);
            }

            user.email = email;
        }
    }

    if let Some(full_name) = patch.full_name {
        user.full_name = full_name;
    }

    connection.execute(
        "UPDATE user SET email = ?1, full_name = ?2 WHERE id = ?3",
        (&user.email, &user.full_name, user_id.as_i64()),
    )?;

    Ok(user)
}

/// Replace the password hash of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError]
/// if an SQL related error occurred.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the user `user_id` along with all of their transactions.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist, or [Error::SqlError]
/// if an SQL related error occurred, in which case nothing is deleted.
pub fn delete_user(user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let transaction = connection.unchecked_transaction()?;

    transaction.execute(
        "DELETE FROM \"transaction\" WHERE user_id = ?1",
        (user_id.as_i64(),),
    )?;
    let rows_affected = transaction.execute("DELETE FROM user WHERE id = ?1", (user_id.as_i64(),))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::{
            NewUser, PasswordHash, UserID, UserPatch, Username, create_user, delete_user,
            get_user_by_id, get_user_by_username, update_password, update_user,
        },
        db::initialize,
    };

    fn count_users(connection: &Connection) -> Result<usize, Error> {
        connection
            .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
            .map_err(|error| error.into())
    }

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not initialize database");

        conn
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: Username::new_unchecked(username),
            email: email.to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
            full_name: "Ana Souza".to_owned(),
        }
    }

    #[test]
    fn username_is_trimmed() {
        assert_eq!(Username::new("  ana ").unwrap().as_ref(), "ana");
    }

    #[test]
    fn username_cannot_be_blank() {
        assert!(matches!(
            Username::new(" \t"),
            Err(Error::ValidationError(_))
        ));
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user =
            create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.username.as_ref(), "ana");
        assert_eq!(inserted_user.email, "ana@example.com");
        assert_eq!(
            inserted_user.password_hash,
            PasswordHash::new_unchecked("hunter2")
        );
    }

    #[test]
    fn duplicate_username_is_checked_before_email() {
        let db_connection = get_db_connection();
        create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        let result = create_user(new_user("ana", "ana@example.com"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateUsername));
    }

    #[test]
    fn duplicate_email_fails() {
        let db_connection = get_db_connection();
        create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        let result = create_user(new_user("bia", "ana@example.com"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
        assert_eq!(count_users(&db_connection), Ok(1));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn get_user_by_username_succeeds() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        assert_eq!(get_user_by_username("ana", &db_connection), Ok(test_user));
        assert_eq!(
            get_user_by_username("bia", &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_user_changes_only_given_fields() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        let updated = update_user(
            user.id,
            UserPatch {
                full_name: Some("Ana Lima".to_owned()),
                email: None,
            },
            &db_connection,
        )
        .unwrap();

        assert_eq!(updated.full_name, "Ana Lima");
        assert_eq!(updated.email, "ana@example.com");
        assert_eq!(get_user_by_id(user.id, &db_connection), Ok(updated));
    }

    #[test]
    fn update_user_can_keep_own_email() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        let result = update_user(
            user.id,
            UserPatch {
                full_name: None,
                email: Some("ana@example.com".to_owned()),
            },
            &db_connection,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn update_user_rejects_email_of_other_user() {
        let db_connection = get_db_connection();
        create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();
        let bia = create_user(new_user("bia", "bia@example.com"), &db_connection).unwrap();

        let result = update_user(
            bia.id,
            UserPatch {
                full_name: None,
                email: Some("ana@example.com".to_owned()),
            },
            &db_connection,
        );

        assert_eq!(result, Err(Error::DuplicateEmail));
        assert_eq!(
            get_user_by_id(bia.id, &db_connection).unwrap().email,
            "bia@example.com"
        );
    }

    #[test]
    fn delete_user_removes_user() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ana", "ana@example.com"), &db_connection).unwrap();

        delete_user(user.id, &db_connection).unwrap();

        assert_eq!(get_user_by_id(user.id, &db_connection), Err(Error::NotFound));
        assert_eq!(delete_user(user.id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn update_password_replaces_hash() {
        let conn = get_db_connection();
        let user = create_user(
            NewUser {
                username: Username::new_unchecked("ana"),
                email: "ana@example.com".to_owned(),
                password_hash: PasswordHash::new_unchecked("old"),
                full_name: String::new(),
            },
            &conn,
        )
        .unwrap();

        update_password(user.id, &PasswordHash::new_unchecked("new"), &conn).unwrap();

        let updated = get_user_by_id(user.id, &conn).unwrap();
        assert_eq!(updated.password_hash, PasswordHash::new_unchecked("new"));
    }

    #[test]
    fn update_password_of_missing_user_fails() {
        let conn = get_db_connection();

        let result = update_password(UserID::new(42), &PasswordHash::new_unchecked("new"), &conn);

        assert_eq!(result, Err(Error::NotFound));
    }
}
