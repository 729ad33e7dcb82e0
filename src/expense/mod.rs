//! Implements recording, listing, editing and summarizing expenses.
//!
//! Expenses are strictly per-user: every query is scoped to the owner and
//! requests for another user's rows answer 404.

mod core;
mod create_endpoint;
mod detail_endpoint;
mod filter;
mod list_endpoint;
mod summary;

pub use self::core::{
    Expense, ExpenseForm, ExpenseId, create_expense, create_expense_table, get_expense,
};
pub use create_endpoint::create_expense_endpoint;
pub use detail_endpoint::{delete_expense_endpoint, get_expense_endpoint, update_expense_endpoint};
pub use filter::ExpenseFilter;
pub use list_endpoint::get_expenses_endpoint;
pub use summary::{Summary, expense_summary_endpoint, summarize_expenses};
