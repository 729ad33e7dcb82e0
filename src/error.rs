//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::category::CategoryId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The client sent input that is malformed or violates a policy.
    ///
    /// `field` names the offending request field so the client can show the
    /// message next to the right input.
    #[error("{message}")]
    Validation {
        /// The request field that failed validation.
        field: &'static str,
        /// Why the field was rejected.
        message: String,
    },

    /// The request body was not valid JSON of the expected shape.
    #[error("{0}")]
    MalformedRequest(String),

    /// A log in request arrived without an email or without a password.
    #[error("Both email and password are required")]
    MissingCredentials,

    /// The email is unknown or the password is wrong.
    ///
    /// The two cases share one error value on purpose: the response must not
    /// reveal whether an email address is registered.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The credentials were correct but the account has been deactivated.
    #[error("Account is disabled")]
    AccountDisabled,

    /// The bearer token is missing, malformed, expired, or of the wrong kind.
    #[error("Invalid authentication credentials")]
    InvalidToken,

    /// An unexpected error occurred while signing a token.
    #[error("could not create authentication token")]
    TokenCreation,

    /// The email used during registration already belongs to a user.
    #[error("User with that email already exists")]
    DuplicateEmail,

    /// The username used during registration is already taken.
    #[error("A user with that username already exists")]
    DuplicateUsername,

    /// Category names are unique across all users and this one is taken.
    #[error("A category with that name already exists")]
    DuplicateCategoryName,

    /// The category ID used to create or update an expense did not match a
    /// real category.
    #[error("{0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The requested resource was not found.
    ///
    /// This is also the answer when the row exists but belongs to another
    /// user, so a client cannot probe for other users' expense IDs.
    #[error("The requested resource could not be found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server,
    /// never sent to the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::MalformedRequest(rejection.body_text())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.contains("category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, field) = match &self {
            Error::Validation { field, .. } => (StatusCode::BAD_REQUEST, Some(*field)),
            Error::MalformedRequest(_) => (StatusCode::BAD_REQUEST, None),
            Error::MissingCredentials => (StatusCode::BAD_REQUEST, None),
            Error::InvalidCredentials | Error::AccountDisabled | Error::InvalidToken => {
                (StatusCode::UNAUTHORIZED, None)
            }
            Error::DuplicateEmail => (StatusCode::BAD_REQUEST, Some("email")),
            Error::DuplicateUsername => (StatusCode::BAD_REQUEST, Some("username")),
            Error::DuplicateCategoryName => (StatusCode::BAD_REQUEST, Some("name")),
            Error::InvalidCategory(_) => (StatusCode::BAD_REQUEST, Some("category")),
            Error::NotFound => (StatusCode::NOT_FOUND, None),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                let body = Json(json!({ "error": "Internal server error" }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        let body = match field {
            Some(field) => Json(json!({ "error": self.to_string(), "field": field })),
            None => Json(json!({ "error": self.to_string() })),
        };

        (status, body).into_response()
    }
}
