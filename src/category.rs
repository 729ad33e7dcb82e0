//! This file defines the `Category` type, its database queries and the API
//! routes for listing and creating categories.
//!
//! Categories are a single shared namespace: names are unique across the
//! whole application and every authenticated user may file expenses under
//! any of them.

use std::{fmt::Display, str::FromStr};

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, auth::Claims};

/// The name of a category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name.
    ///
    /// # Errors
    ///
    /// This function will return a [Error::Validation] if `name` is an empty
    /// string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::Validation {
                field: "name",
                message: "Category name cannot be empty".to_owned(),
            })
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CategoryName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryName::new(s)
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alias for the integer type used for category IDs.
pub type CategoryId = i64;

/// A label for grouping expenses, e.g., 'Groceries', 'Transport', 'Rent'.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The unique name of the category.
    pub name: CategoryName,
    /// A free-text description of what belongs in the category.
    pub description: String,
    /// When the category was created.
    pub created_at: DateTime<Utc>,
    /// When the category was last changed.
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the category table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a new category in the database.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategoryName] if a category with the name already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    name: CategoryName,
    description: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    let now = Utc::now();

    let category = connection
        .prepare(
            "INSERT INTO category (name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, name, description, created_at, updated_at",
        )?
        .query_row((name.as_ref(), description, now, now), map_category_row)
        .map_err(Error::from)?;

    Ok(category)
}

/// Retrieve all categories from the database, in name order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, description, created_at, updated_at
             FROM category ORDER BY name ASC",
        )?
        .query_map([], map_category_row)?
        .map(|category_result| category_result.map_err(Error::from))
        .collect()
}

/// Map a database row to a [Category].
fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// The form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The unique name of the category.
    pub name: String,
    /// An optional free-text description.
    #[serde(default)]
    pub description: String,
}

/// A route handler for listing all categories.
///
/// Requires authentication but not ownership: the category namespace is
/// shared between all users.
pub async fn get_categories_endpoint(
    State(state): State<AppState>,
    _claims: Claims,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_categories(&connection)?;

    Ok((StatusCode::OK, Json(categories)).into_response())
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<AppState>,
    _claims: Claims,
    WithRejection(Json(form), _): WithRejection<Json<CategoryForm>, Error>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&form.name)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(name, &form.description, &connection)?;

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{AppState, PaginationConfig, build_router, endpoints};

    use super::Category;

    fn create_test_server() -> TestServer {
        let connection = Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(connection, "42", PaginationConfig::default())
            .expect("Could not create app state.");

        TestServer::new(build_router(state))
    }

    async fn register_and_log_in(server: &TestServer, username: &str, email: &str) -> String {
        server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": username,
                "email": email,
                "password": "Longenough1!",
                "confirm_password": "Longenough1!",
                "first_name": "Alice",
                "last_name": "Smith",
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": email, "password": "Longenough1!" }))
            .await;

        response.assert_status_ok();

        response.json::<serde_json::Value>()["access"]
            .as_str()
            .expect("response should contain an access token")
            .to_owned()
    }

    #[tokio::test]
    async fn create_and_list_categories() {
        let server = create_test_server();
        let token = register_and_log_in(&server, "alice", "alice@test.com").await;

        let response = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .json(&json!({ "name": "Food", "description": "groceries" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Category>();
        assert_eq!(created.name.as_ref(), "Food");

        let response = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let categories = response.json::<Vec<Category>>();
        assert_eq!(categories, vec![created]);
    }

    #[tokio::test]
    async fn categories_are_shared_between_users() {
        let server = create_test_server();
        let alice_token = register_and_log_in(&server, "alice", "alice@test.com").await;
        let bob_token = register_and_log_in(&server, "bob", "bob@test.com").await;

        server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&alice_token)
            .json(&json!({ "name": "Food" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(endpoints::CATEGORIES)
            .authorization_bearer(&bob_token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Category>>().len(), 1);
    }

    #[tokio::test]
    async fn create_fails_on_duplicate_name() {
        let server = create_test_server();
        let token = register_and_log_in(&server, "alice", "alice@test.com").await;

        server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .json(&json!({ "name": "Food" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::CATEGORIES)
            .authorization_bearer(&token)
            .json(&json!({ "name": "Food" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<serde_json::Value>()["field"], "name");
    }

    #[tokio::test]
    async fn endpoints_require_authentication() {
        let server = create_test_server();

        server
            .get(endpoints::CATEGORIES)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        server
            .post(endpoints::CATEGORIES)
            .json(&json!({ "name": "Food" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
