//! The registration endpoint.
//!
//! The validators from [crate::validation] run in a fixed order and the
//! first failure is reported with the offending field, mirroring per-field
//! form errors.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    user::{NewUser, create_user, email_exists, username_exists},
    validation::{validate_email, validate_name, validate_password},
};

/// The form data for a registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The unique name to register with.
    pub username: String,
    /// The unique email address to register with.
    pub email: String,
    /// The password for the new account.
    pub password: String,
    /// Repeat of the password to catch typos.
    pub confirm_password: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
}

/// Handler for registration requests.
///
/// # Errors
///
/// This function will return a [Error::Validation] (or a duplicate error)
/// naming the first field that fails:
/// - username empty or already taken,
/// - email malformed or already registered,
/// - first or last name shorter than 3 characters,
/// - password failing the complexity policy or not matching its confirmation.
pub async fn register_endpoint(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<RegisterForm>, Error>,
) -> Result<Response, Error> {
    if form.username.trim().is_empty() {
        return Err(Error::Validation {
            field: "username",
            message: "Username must not be empty".to_owned(),
        });
    }

    {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        if username_exists(&form.username, &connection)? {
            return Err(Error::DuplicateUsername);
        }

        validate_email(&form.email)?;

        if email_exists(&form.email, &connection)? {
            return Err(Error::DuplicateEmail);
        }
    }

    validate_name("first_name", "First name", &form.first_name)?;
    validate_name("last_name", "Last name", &form.last_name)?;
    validate_password(&form.password, &form.confirm_password)?;

    // Hash outside the lock: bcrypt is deliberately slow. A registration
    // racing this one is caught by the unique constraints on insert.
    let password_hash = bcrypt::hash(&form.password, bcrypt::DEFAULT_COST).map_err(|error| {
        tracing::error!("Error hashing password: {error}");
        Error::HashingError(error.to_string())
    })?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    create_user(
        NewUser {
            username: form.username,
            email: form.email,
            password_hash,
            first_name: form.first_name,
            last_name: form.last_name,
        },
        &connection,
    )?;

    let body = Json(json!({ "message": "User registration successful" }));

    Ok((StatusCode::CREATED, body).into_response())
}
