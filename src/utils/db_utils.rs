use chrono::NaiveDate;
use sqlx::{Executor, MySql};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::U64(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// ===============================
/// Dynamic UPDATE builder
/// ===============================
///
/// Column names are always string literals chosen by the caller, only the
/// values travel as bind parameters.
#[derive(Debug, Default)]
pub struct SqlUpdate {
    assignments: Vec<(&'static str, SqlValue)>,
}

impl SqlUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &'static str, value: impl Into<SqlValue>) -> &mut Self {
        self.assignments.push((column, value.into()));
        self
    }

    /// Adds the assignment only when a value is present.
    pub fn set_some<V: Into<SqlValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.set(column, v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn to_sql(&self, table: &str, id_column: &str) -> String {
        let set_clause = self
            .assignments
            .iter()
            .map(|(column, _)| format!("`{}` = ?", column))
            .collect::<Vec<_>>()
            .join(", ");

        format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column)
    }

    /// Runs the update against `executor` and returns the affected row count.
    pub async fn execute<'e, E>(
        self,
        executor: E,
        table: &str,
        id_column: &str,
        id: u64,
    ) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = MySql>,
    {
        let sql = self.to_sql(table, id_column);
        let mut query = sqlx::query(&sql);

        for (_, value) in self.assignments {
            query = match value {
                SqlValue::String(v) => query.bind(v),
                SqlValue::U64(v) => query.bind(v),
                SqlValue::Bool(v) => query.bind(v),
                SqlValue::Date(v) => query.bind(v),
                SqlValue::Null => query.bind(None::<String>),
            };
        }

        let result = query.bind(id).execute(executor).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_set_clause_in_insertion_order() {
        let mut update = SqlUpdate::new();
        update
            .set("full_name", "Jane Doe")
            .set_some("phone", None::<String>)
            .set("assigned_to", None::<u64>);

        assert_eq!(
            update.to_sql("users", "id"),
            "UPDATE users SET `full_name` = ?, `assigned_to` = ? WHERE id = ?"
        );
    }

    #[test]
    fn empty_option_becomes_null() {
        assert_eq!(SqlValue::from(None::<u64>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(7u64)), SqlValue::U64(7));
    }

    #[test]
    fn nothing_set_is_empty() {
        let mut update = SqlUpdate::new();
        assert!(update.is_empty());
        update.set_some("notes", None::<String>);
        assert!(update.is_empty());
    }
}
