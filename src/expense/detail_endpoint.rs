//! The endpoints for fetching, replacing and deleting a single expense.
//!
//! All three answer 404 for IDs that exist but belong to another user, so
//! the response does not reveal which IDs are taken.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;

use crate::{
    AppState, Error,
    auth::Claims,
    expense::core::{ExpenseForm, ExpenseId, delete_expense, get_expense, update_expense},
};

/// A route handler for fetching one of the authenticated user's expenses.
pub async fn get_expense_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = get_expense(claims.sub, expense_id, &connection)?;

    Ok((StatusCode::OK, Json(expense)).into_response())
}

/// A route handler for replacing all editable fields of an expense.
pub async fn update_expense_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(expense_id): Path<ExpenseId>,
    WithRejection(Json(form), _): WithRejection<Json<ExpenseForm>, Error>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = update_expense(claims.sub, expense_id, &form, &connection)?;

    Ok((StatusCode::OK, Json(expense)).into_response())
}

/// A route handler for deleting an expense.
pub async fn delete_expense_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_expense(claims.sub, expense_id, &connection)?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
