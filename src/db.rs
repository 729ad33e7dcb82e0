//! Creates the application's database schema.

use rusqlite::Connection;

use crate::{
    category::create_category_table, expense::create_expense_table, user::create_user_table,
};

/// Set up the tables for the application's domain models.
///
/// Foreign keys are switched on for the connection so that deleting a user or
/// a category cascades to the expenses that reference them.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    create_user_table(connection)?;
    create_category_table(connection)?;
    create_expense_table(connection)?;

    Ok(())
}
