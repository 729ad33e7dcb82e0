//! The log in endpoint: verifies credentials and issues a token pair.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::token::{TokenType, encode_token},
    user::{User, UserId, get_user_by_email},
};

/// The form data for a log in request.
///
/// Both fields are optional so that a missing field produces the 'both
/// email and password are required' error instead of a deserialization
/// failure.
#[derive(Debug, Deserialize)]
pub struct LogInForm {
    /// Email entered during log in.
    pub email: Option<String>,
    /// Password entered during log in.
    pub password: Option<String>,
}

/// The subset of account fields returned to the client after log in.
#[derive(Debug, Serialize)]
pub struct UserSummary {
    /// The ID of the user.
    pub id: UserId,
    /// The user's unique username.
    pub username: String,
    /// The user's unique email address.
    pub email: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Serialize)]
struct LogInResponse {
    message: &'static str,
    access: String,
    refresh: String,
    user: UserSummary,
}

/// Handler for log in requests.
///
/// # Errors
///
/// This function will return an error when:
/// - the email or password field is missing (400),
/// - the email is not registered or the password is wrong (401, one shared
///   message so account existence is not revealed),
/// - the account is disabled (401).
pub async fn log_in_endpoint(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<LogInForm>, Error>,
) -> Result<Response, Error> {
    let (Some(email), Some(password)) = (form.email, form.password) else {
        return Err(Error::MissingCredentials);
    };

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_email(&email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            other => other,
        })?
    };

    let password_is_correct = bcrypt::verify(&password, &user.password_hash).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !password_is_correct {
        return Err(Error::InvalidCredentials);
    }

    if !user.is_active {
        return Err(Error::AccountDisabled);
    }

    let access = encode_token(&user, TokenType::Access, state.encoding_key())?;
    let refresh = encode_token(&user, TokenType::Refresh, state.encoding_key())?;

    let response = LogInResponse {
        message: "Login successful",
        access,
        refresh,
        user: user.into(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
