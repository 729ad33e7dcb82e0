//! Defines the axum router for the application.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{log_in_endpoint, register_endpoint},
    category::{create_category_endpoint, get_categories_endpoint},
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, expense_summary_endpoint,
        get_expense_endpoint, get_expenses_endpoint, update_expense_endpoint,
    },
    logging::logging_middleware,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(
            endpoints::EXPENSES,
            get(get_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSE_SUMMARY, get(expense_summary_endpoint))
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(update_expense_endpoint)
                .delete(delete_expense_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
