//! The expense model and its database queries.
//!
//! Amounts are decimal currency values with at most two decimal places.
//! They are stored as integer cents so that SQL aggregation stays exact,
//! and converted back to decimals at the API boundary.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, Row, params_from_iter, types::Value};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{Error, category::CategoryId, expense::filter::ExpenseFilter, user::UserId};

/// Alias for the integer type used for expense IDs.
pub type ExpenseId = i64;

/// A single spending record belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The username of the owner.
    pub user: String,
    /// The ID of the category the expense is filed under.
    pub category: CategoryId,
    /// The name of that category.
    pub category_name: String,
    /// The amount of money spent.
    pub amount: Decimal,
    /// A free-text note on what the money was spent on.
    pub description: String,
    /// The day the expense occurred.
    pub date: NaiveDate,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last changed.
    pub updated_at: DateTime<Utc>,
}

/// The form data for creating or replacing an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// The ID of the category to file the expense under.
    pub category: CategoryId,
    /// The amount of money spent.
    pub amount: Decimal,
    /// A free-text note on what the money was spent on.
    #[serde(default)]
    pub description: String,
    /// The day the expense occurred.
    pub date: NaiveDate,
}

/// Convert a decimal amount to integer cents.
///
/// # Errors
///
/// This function will return a [Error::Validation] if the amount is not
/// greater than zero or has more than two decimal places.
pub fn amount_to_cents(amount: Decimal) -> Result<i64, Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::Validation {
            field: "amount",
            message: "Amount must be greater than zero".to_owned(),
        });
    }

    // checked_mul: the multiplication itself can overflow for amounts near
    // Decimal::MAX, well before the i64 conversion gets to reject them.
    let cents = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or_else(|| Error::Validation {
            field: "amount",
            message: "Amount is too large".to_owned(),
        })?;

    if cents.fract() != Decimal::ZERO {
        return Err(Error::Validation {
            field: "amount",
            message: "Amount cannot have more than 2 decimal places".to_owned(),
        });
    }

    cents.to_i64().ok_or_else(|| Error::Validation {
        field: "amount",
        message: "Amount is too large".to_owned(),
    })
}

/// Convert integer cents back to a decimal amount with two decimal places.
pub fn cents_to_amount(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
                amount_cents INTEGER NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date)",
        (),
    )?;

    Ok(())
}

const SELECT_EXPENSE: &str = "SELECT expense.id, user.username, expense.category_id, category.name,
            expense.amount_cents, expense.description, expense.date,
            expense.created_at, expense.updated_at
     FROM expense
     JOIN user ON user.id = expense.user_id
     JOIN category ON category.id = expense.category_id";

/// Create a new expense in the database, owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the amount is invalid,
/// - [Error::InvalidCategory] if the category ID does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    user_id: UserId,
    form: &ExpenseForm,
    connection: &Connection,
) -> Result<Expense, Error> {
    let cents = amount_to_cents(form.amount)?;
    let now = Utc::now();

    connection
        .execute(
            "INSERT INTO expense (user_id, category_id, amount_cents, description, date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                user_id,
                form.category,
                cents,
                &form.description,
                form.date,
                now,
                now,
            ),
        )
        .map_err(|error| map_foreign_key_error(error, form.category))?;

    get_expense(user_id, connection.last_insert_rowid(), connection)
}

/// Retrieve one of `user_id`'s expenses by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the expense does not exist or belongs to another
///   user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    user_id: UserId,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(&format!(
            "{SELECT_EXPENSE} WHERE expense.id = ?1 AND expense.user_id = ?2"
        ))?
        .query_row((expense_id, user_id), map_expense_row)?;

    Ok(expense)
}

/// Retrieve a page of `user_id`'s expenses matching `filter`.
///
/// Results are ordered newest date first, then by category name and ID so
/// that the order is stable across requests.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn get_expenses(
    user_id: UserId,
    filter: &ExpenseFilter,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (where_clause, mut params) = filter.to_sql(user_id);
    params.push(Value::from(i64::try_from(limit).unwrap_or(i64::MAX)));
    params.push(Value::from(i64::try_from(offset).unwrap_or(i64::MAX)));

    let sql = format!(
        "{SELECT_EXPENSE} {where_clause}
         ORDER BY expense.date DESC, category.name ASC, expense.id ASC
         LIMIT ? OFFSET ?"
    );

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params), map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::from))
        .collect()
}

/// Count `user_id`'s expenses matching `filter`, ignoring pagination.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn count_expenses(
    user_id: UserId,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = filter.to_sql(user_id);

    let sql = format!(
        "SELECT COUNT(*)
         FROM expense
         JOIN category ON category.id = expense.category_id
         {where_clause}"
    );

    let count: i64 = connection
        .prepare(&sql)?
        .query_row(params_from_iter(params), |row| row.get(0))?;

    Ok(count as u64)
}

/// Replace all editable fields of one of `user_id`'s expenses.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the amount is invalid,
/// - [Error::InvalidCategory] if the new category ID does not exist,
/// - [Error::NotFound] if the expense does not exist or belongs to another
///   user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    user_id: UserId,
    expense_id: ExpenseId,
    form: &ExpenseForm,
    connection: &Connection,
) -> Result<Expense, Error> {
    let cents = amount_to_cents(form.amount)?;
    let now = Utc::now();

    let rows_updated = connection
        .execute(
            "UPDATE expense
             SET category_id = ?1, amount_cents = ?2, description = ?3, date = ?4, updated_at = ?5
             WHERE id = ?6 AND user_id = ?7",
            (
                form.category,
                cents,
                &form.description,
                form.date,
                now,
                expense_id,
                user_id,
            ),
        )
        .map_err(|error| map_foreign_key_error(error, form.category))?;

    if rows_updated == 0 {
        return Err(Error::NotFound);
    }

    get_expense(user_id, expense_id, connection)
}

/// Delete one of `user_id`'s expenses.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the expense does not exist or belongs to another
///   user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(
    user_id: UserId,
    expense_id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_deleted = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (expense_id, user_id),
    )?;

    if rows_deleted == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_foreign_key_error(error: rusqlite::Error, category: CategoryId) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(sql_error, _)
            if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Error::InvalidCategory(category)
        }
        other => Error::from(other),
    }
}

/// Map a database row to an [Expense].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let cents: i64 = row.get(4)?;

    Ok(Expense {
        id: row.get(0)?,
        user: row.get(1)?,
        category: row.get(2)?,
        category_name: row.get(3)?,
        amount: cents_to_amount(cents),
        description: row.get(5)?,
        date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod database_tests {
    use chrono::NaiveDate;
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        Error,
        category::{CategoryId, CategoryName, create_category},
        db::initialize,
        expense::filter::ExpenseFilter,
        user::{NewUser, UserId, create_user},
    };

    use super::{
        ExpenseForm, count_expenses, create_expense, delete_expense, get_expense, get_expenses,
        update_expense,
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn seed_user(conn: &Connection, username: &str, email: &str) -> UserId {
        create_user(
            NewUser {
                username: username.to_owned(),
                email: email.to_owned(),
                password_hash: "not a real hash".to_owned(),
                first_name: "Alice".to_owned(),
                last_name: "Smith".to_owned(),
            },
            conn,
        )
        .unwrap()
        .id
    }

    fn seed_category(conn: &Connection, name: &str) -> CategoryId {
        create_category(CategoryName::new(name).unwrap(), "", conn)
            .unwrap()
            .id
    }

    fn form(category: CategoryId, amount: &str, date: &str) -> ExpenseForm {
        ExpenseForm {
            category,
            amount: amount.parse().unwrap(),
            description: "test expense".to_owned(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn create_and_get_expense() {
        let conn = get_test_connection();
        let user_id = seed_user(&conn, "alice", "alice@test.com");
        let category_id = seed_category(&conn, "Food");

        let created =
            create_expense(user_id, &form(category_id, "15.00", "2025-03-01"), &conn).unwrap();

        assert_eq!(created.user, "alice");
        assert_eq!(created.category, category_id);
        assert_eq!(created.category_name, "Food");
        assert_eq!(created.amount, Decimal::new(1500, 2));

        let fetched = get_expense(user_id, created.id, &conn).unwrap();
        assert_eq!(created, fetched);
    }

    #[test]
    fn create_fails_with_unknown_category() {
        let conn = get_test_connection();
        let user_id = seed_user(&conn, "alice", "alice@test.com");

        let result = create_expense(user_id, &form(999, "15.00", "2025-03-01"), &conn);

        assert_eq!(result, Err(Error::InvalidCategory(999)));
    }

    #[test]
    fn get_expense_hides_other_users_rows() {
        let conn = get_test_connection();
        let alice = seed_user(&conn, "alice", "alice@test.com");
        let bob = seed_user(&conn, "bob", "bob@test.com");
        let category_id = seed_category(&conn, "Food");

        let expense = create_expense(alice, &form(category_id, "15.00", "2025-03-01"), &conn).unwrap();

        assert_eq!(get_expense(bob, expense.id, &conn), Err(Error::NotFound));
    }

    #[test]
    fn get_expenses_orders_newest_date_first() {
        let conn = get_test_connection();
        let user_id = seed_user(&conn, "alice", "alice@test.com");
        let category_id = seed_category(&conn, "Food");

        for date in ["2025-03-01", "2025-03-03", "2025-03-02"] {
            create_expense(user_id, &form(category_id, "1.00", date), &conn).unwrap();
        }

        let dates: Vec<String> = get_expenses(user_id, &ExpenseFilter::default(), 20, 0, &conn)
            .unwrap()
            .into_iter()
            .map(|expense| expense.date.to_string())
            .collect();

        assert_eq!(dates, ["2025-03-03", "2025-03-02", "2025-03-01"]);
    }

    #[test]
    fn get_expenses_applies_limit_and_offset() {
        let conn = get_test_connection();
        let user_id = seed_user(&conn, "alice", "alice@test.com");
        let category_id = seed_category(&conn, "Food");

        for day in 1..=5 {
            create_expense(
                user_id,
                &form(category_id, "1.00", &format!("2025-03-0{day}")),
                &conn,
            )
            .unwrap();
        }

        let page = get_expenses(user_id, &ExpenseFilter::default(), 2, 2, &conn).unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[0].date.to_string(), "2025-03-03");
        assert_eq!(
            count_expenses(user_id, &ExpenseFilter::default(), &conn).unwrap(),
            5
        );
    }

    #[test]
    fn update_replaces_fields() {
        let conn = get_test_connection();
        let user_id = seed_user(&conn, "alice", "alice@test.com");
        let food = seed_category(&conn, "Food");
        let transport = seed_category(&conn, "Transport");

        let expense = create_expense(user_id, &form(food, "15.00", "2025-03-01"), &conn).unwrap();

        let updated = update_expense(
            user_id,
            expense.id,
            &form(transport, "25.50", "2025-03-02"),
            &conn,
        )
        .unwrap();

        assert_eq!(updated.category_name, "Transport");
        assert_eq!(updated.amount, Decimal::new(2550, 2));
        assert_eq!(updated.date.to_string(), "2025-03-02");
    }

    #[test]
    fn update_of_other_users_expense_returns_not_found() {
        let conn = get_test_connection();
        let alice = seed_user(&conn, "alice", "alice@test.com");
        let bob = seed_user(&conn, "bob", "bob@test.com");
        let category_id = seed_category(&conn, "Food");

        let expense = create_expense(alice, &form(category_id, "15.00", "2025-03-01"), &conn).unwrap();

        let result = update_expense(
            bob,
            expense.id,
            &form(category_id, "1.00", "2025-03-01"),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_removes_expense() {
        let conn = get_test_connection();
        let user_id = seed_user(&conn, "alice", "alice@test.com");
        let category_id = seed_category(&conn, "Food");

        let expense = create_expense(user_id, &form(category_id, "15.00", "2025-03-01"), &conn).unwrap();

        delete_expense(user_id, expense.id, &conn).unwrap();

        assert_eq!(get_expense(user_id, expense.id, &conn), Err(Error::NotFound));
        assert_eq!(delete_expense(user_id, expense.id, &conn), Err(Error::NotFound));
    }
}
