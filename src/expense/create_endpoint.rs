//! The endpoint for recording a new expense.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState, Error,
    auth::Claims,
    expense::core::{ExpenseForm, create_expense},
};

/// A route handler for creating a new expense owned by the authenticated
/// user.
pub async fn create_expense_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    WithRejection(Json(form), _): WithRejection<Json<ExpenseForm>, Error>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_expense(claims.sub, &form, &connection)?;

    Ok((StatusCode::CREATED, Json(expense)).into_response())
}
