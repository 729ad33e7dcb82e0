//! Defines the user model and its database queries.
//!
//! Passwords are stored as bcrypt hashes, never in plain text.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};

use crate::Error;

/// Alias for the integer type used for user IDs.
pub type UserId = i64;

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The ID of the user.
    pub id: UserId,
    /// The unique name the user registered with.
    pub username: String,
    /// The unique email address the user registered with.
    pub email: String,
    /// The bcrypt hash of the user's password.
    pub password_hash: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// Whether the account may log in. Disabled accounts keep their data but
    /// are refused at the log in endpoint.
    pub is_active: bool,
    /// When the account was created.
    pub date_joined: DateTime<Utc>,
}

/// The fields needed to create a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The unique name the user registered with.
    pub username: String,
    /// The unique email address the user registered with.
    pub email: String,
    /// The bcrypt hash of the user's password.
    pub password_hash: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
}

/// Create the user table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                date_joined TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new user in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateEmail] if the email is already registered,
/// - or [Error::DuplicateUsername] if the username is already taken,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let date_joined = Utc::now();

    let user = connection
        .prepare(
            "INSERT INTO user (username, email, password_hash, first_name, last_name, is_active, date_joined)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
             RETURNING id, username, email, password_hash, first_name, last_name, is_active, date_joined",
        )?
        .query_row(
            (
                new_user.username,
                new_user.email,
                new_user.password_hash,
                new_user.first_name,
                new_user.last_name,
                date_joined,
            ),
            map_user_row,
        )
        .map_err(Error::from)?;

    Ok(user)
}

/// Retrieve a user from the database by their email address.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no user has the email address,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare(
            "SELECT id, username, email, password_hash, first_name, last_name, is_active, date_joined
             FROM user WHERE email = ?1",
        )?
        .query_row([email], map_user_row)?;

    Ok(user)
}

/// Check whether a user with the given username exists.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn username_exists(username: &str, connection: &Connection) -> Result<bool, Error> {
    let exists = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM user WHERE username = ?1)",
        [username],
        |row| row.get(0),
    )?;

    Ok(exists)
}

/// Check whether a user with the given email address exists.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn email_exists(email: &str, connection: &Connection) -> Result<bool, Error> {
    let exists = connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM user WHERE email = ?1)",
        [email],
        |row| row.get(0),
    )?;

    Ok(exists)
}

/// Map a database row to a [User].
fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        is_active: row.get(6)?,
        date_joined: row.get(7)?,
    })
}
