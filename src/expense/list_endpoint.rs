//! The endpoint for listing a user's expenses with filters and pagination.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::Claims,
    expense::{
        core::{Expense, count_expenses, get_expenses},
        filter::ExpenseFilter,
    },
};

/// The query string parameters for the expense listing.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseListQuery {
    /// Case-insensitive substring to match against category names.
    pub category: Option<String>,
    /// Keep expenses on or after this date (YYYY-MM-DD).
    pub date_from: Option<String>,
    /// Keep expenses on or before this date (YYYY-MM-DD).
    pub date_to: Option<String>,
    /// The page number, starting at 1.
    pub page: Option<u64>,
    /// The number of expenses per page.
    pub page_size: Option<u64>,
}

/// One page of expenses plus the total count of matches.
#[derive(Debug, Serialize)]
struct ExpenseListResponse {
    count: u64,
    page: u64,
    page_size: u64,
    results: Vec<Expense>,
}

/// A route handler for listing the authenticated user's expenses.
///
/// The count reflects all rows matching the filter, not just the page that
/// was returned.
pub async fn get_expenses_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Response, Error> {
    let filter = ExpenseFilter::parse(query.category, query.date_from, query.date_to);
    let (page, page_size) = state.pagination_config.resolve(query.page, query.page_size);
    // Saturate rather than overflow: an absurd page number is a valid
    // request for a page past the end, which is simply empty.
    let offset = (page - 1).saturating_mul(page_size);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let count = count_expenses(claims.sub, &filter, &connection)?;
    let results = get_expenses(claims.sub, &filter, page_size, offset, &connection)?;

    let response = ExpenseListResponse {
        count,
        page,
        page_size,
        results,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
