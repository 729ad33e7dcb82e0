//! Filtering of expense listings and summaries by category and date range.
//!
//! Filters arrive as optional query string parameters. A date parameter
//! that does not parse as YYYY-MM-DD is silently ignored rather than
//! rejected, so a sloppy client still gets a (less filtered) answer.

use chrono::NaiveDate;
use rusqlite::types::Value;

use crate::user::UserId;

/// The filters a client may apply to expense listings and summaries.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpenseFilter {
    /// Case-insensitive substring match on the category name.
    pub category: Option<String>,
    /// Keep expenses on or after this date.
    pub date_from: Option<NaiveDate>,
    /// Keep expenses on or before this date.
    pub date_to: Option<NaiveDate>,
}

impl ExpenseFilter {
    /// Build a filter from raw query string values.
    ///
    /// An empty category string means no category filter, and malformed
    /// dates are dropped.
    pub fn parse(
        category: Option<String>,
        date_from: Option<String>,
        date_to: Option<String>,
    ) -> Self {
        Self {
            category: category.filter(|name| !name.trim().is_empty()),
            date_from: date_from.as_deref().and_then(parse_date),
            date_to: date_to.as_deref().and_then(parse_date),
        }
    }

    /// Render the filter as a SQL WHERE clause and its parameters.
    ///
    /// The clause always restricts rows to `user_id` and assumes the query
    /// joins the category table as `category`.
    pub fn to_sql(&self, user_id: UserId) -> (String, Vec<Value>) {
        let mut conditions = vec!["expense.user_id = ?".to_owned()];
        let mut params = vec![Value::from(user_id)];

        if let Some(category) = &self.category {
            conditions.push("LOWER(category.name) LIKE ? ESCAPE '\\'".to_owned());
            params.push(Value::from(format!(
                "%{}%",
                escape_like(&category.to_lowercase())
            )));
        }

        if let Some(date_from) = self.date_from {
            conditions.push("expense.date >= ?".to_owned());
            params.push(Value::from(date_from.to_string()));
        }

        if let Some(date_to) = self.date_to {
            conditions.push("expense.date <= ?".to_owned());
            params.push(Value::from(date_to.to_string()));
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Escape the LIKE wildcard characters in `text` so they match literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }

        escaped.push(character);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ExpenseFilter, escape_like};

    #[test]
    fn parse_keeps_well_formed_dates() {
        let filter = ExpenseFilter::parse(
            Some("Food".to_owned()),
            Some("2025-03-01".to_owned()),
            Some("2025-03-31".to_owned()),
        );

        assert_eq!(filter.category.as_deref(), Some("Food"));
        assert_eq!(
            filter.date_from,
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert_eq!(filter.date_to, NaiveDate::from_ymd_opt(2025, 3, 31));
    }

    #[test]
    fn parse_drops_malformed_dates() {
        let filter = ExpenseFilter::parse(
            None,
            Some("not-a-date".to_owned()),
            Some("2025-13-45".to_owned()),
        );

        assert_eq!(filter, ExpenseFilter::default());
    }

    #[test]
    fn parse_ignores_blank_category() {
        let filter = ExpenseFilter::parse(Some("   ".to_owned()), None, None);

        assert_eq!(filter.category, None);
    }

    #[test]
    fn to_sql_with_no_filters_restricts_to_user() {
        let (clause, params) = ExpenseFilter::default().to_sql(7);

        assert_eq!(clause, "WHERE expense.user_id = ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn to_sql_lowercases_the_category_pattern() {
        let filter = ExpenseFilter {
            category: Some("FOOD".to_owned()),
            ..Default::default()
        };

        let (clause, params) = filter.to_sql(7);

        assert!(clause.contains("LOWER(category.name) LIKE ?"));
        assert_eq!(params[1], rusqlite::types::Value::from("%food%".to_owned()));
    }

    #[test]
    fn to_sql_includes_both_date_bounds() {
        let filter = ExpenseFilter {
            date_from: NaiveDate::from_ymd_opt(2025, 3, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..Default::default()
        };

        let (clause, params) = filter.to_sql(7);

        assert!(clause.contains("expense.date >= ?"));
        assert!(clause.contains("expense.date <= ?"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("food"), "food");
    }
}
