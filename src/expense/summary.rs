//! Aggregated spending summaries.
//!
//! The summary is computed with SQL aggregates over the integer cent
//! amounts, so totals are exact no matter how many rows are summed. It
//! accepts the same filters as the expense listing.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use rusqlite::{Connection, params_from_iter};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::Claims,
    expense::{core::cents_to_amount, filter::ExpenseFilter},
    user::UserId,
};

/// The aggregated spending of one user over the filtered expenses.
#[derive(Debug, PartialEq, Serialize)]
pub struct Summary {
    /// The sum of all matching expense amounts.
    pub total_spent: Decimal,
    /// Per-category totals and counts, keyed by category name.
    pub categories: BTreeMap<String, CategorySummary>,
    /// How many expenses matched.
    pub expense_count: u64,
    /// The earliest and latest expense dates that matched.
    pub date_range: DateRange,
}

/// The spending within a single category.
#[derive(Debug, PartialEq, Serialize)]
pub struct CategorySummary {
    /// The sum of the category's expense amounts.
    pub total: Decimal,
    /// How many expenses are in the category.
    pub count: u64,
}

/// The span of dates covered by the matching expenses.
///
/// Serializes as an empty object when no expenses matched.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct DateRange {
    /// The date of the earliest matching expense.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest: Option<NaiveDate>,
    /// The date of the latest matching expense.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<NaiveDate>,
}

/// Compute the spending summary for `user_id`'s expenses matching `filter`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn summarize_expenses(
    user_id: UserId,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Summary, Error> {
    let (where_clause, params) = filter.to_sql(user_id);

    let totals_sql = format!(
        "SELECT COALESCE(SUM(expense.amount_cents), 0), COUNT(*), MIN(expense.date), MAX(expense.date)
         FROM expense
         JOIN category ON category.id = expense.category_id
         {where_clause}"
    );

    let (total_cents, expense_count, earliest, latest) = connection
        .prepare(&totals_sql)?
        .query_row(params_from_iter(params.clone()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<NaiveDate>>(2)?,
                row.get::<_, Option<NaiveDate>>(3)?,
            ))
        })?;

    let categories_sql = format!(
        "SELECT category.name, SUM(expense.amount_cents), COUNT(*)
         FROM expense
         JOIN category ON category.id = expense.category_id
         {where_clause}
         GROUP BY category.name
         ORDER BY SUM(expense.amount_cents) DESC"
    );

    let categories = connection
        .prepare(&categories_sql)?
        .query_map(params_from_iter(params), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .map(|row_result| {
            row_result.map(|(name, cents, count)| {
                (
                    name,
                    CategorySummary {
                        total: cents_to_amount(cents),
                        count: count as u64,
                    },
                )
            })
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(Summary {
        total_spent: cents_to_amount(total_cents),
        categories,
        expense_count: expense_count as u64,
        date_range: DateRange { earliest, latest },
    })
}

/// The query string parameters for the summary endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// Case-insensitive substring to match against category names.
    pub category: Option<String>,
    /// Keep expenses on or after this date (YYYY-MM-DD).
    pub date_from: Option<String>,
    /// Keep expenses on or before this date (YYYY-MM-DD).
    pub date_to: Option<String>,
}

/// A route handler for the authenticated user's spending summary.
pub async fn expense_summary_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, Error> {
    let filter = ExpenseFilter::parse(query.category, query.date_from, query.date_to);

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let summary = summarize_expenses(claims.sub, &filter, &connection)?;

    Ok((StatusCode::OK, Json(summary)).into_response())
}
