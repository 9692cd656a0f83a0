//! Dynamic SQL generation.
//!
//! # Responsibility
//! - Pre-generate the fixed CRUD statements for a `TableMeta`.
//! - Build dynamic WHERE/SET fragments from field-value pairs.
//!
//! # Invariants
//! - Non-NULL values are always bound as named parameters, never spliced
//!   into SQL text.
//! - NULL filter values render `IS NULL`; NULL update values render
//!   a literal `NULL` assignment.

use crate::meta::{camel_to_snake, TableMeta};
use rusqlite::types::Value;

/// Named bind parameters; names carry the `:` prefix rusqlite expects.
pub type NamedParams = Vec<(String, Value)>;

/// Name/value pair driving dynamic filter and update clauses.
///
/// Names are Rust field names; the column name is derived with
/// `camel_to_snake` when the clause is built.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

impl FieldValue {
    pub fn of(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Explicit NULL, rendered as `IS NULL` / `= NULL` instead of a bind.
    pub fn null(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
        }
    }
}

/// Raw condition fragment with named binds, appended after `WHERE`.
#[derive(Debug, Clone, Default)]
pub struct Clause {
    sql: String,
    params: NamedParams,
}

impl Clause {
    /// Wraps a raw condition such as `login_count > :min`.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Binds one named parameter; `name` is given without the `:` prefix.
    pub fn bind(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.push((format!(":{name}"), value.into()));
        self
    }

    pub fn as_sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }
}

/// Fixed statements generated once per table mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlSet {
    pub select_all: String,
    pub select_by_id: String,
    pub delete_by_id: String,
    pub insert: String,
}

impl SqlSet {
    pub fn generate(meta: &TableMeta) -> Self {
        let columns = meta
            .insert_columns
            .iter()
            .map(|c| c.column.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let binds = meta
            .insert_columns
            .iter()
            .map(|c| format!(":{}", c.field))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            select_all: format!("SELECT * FROM {}", meta.table),
            select_by_id: format!(
                "SELECT * FROM {} WHERE {} = :id",
                meta.table, meta.id_column
            ),
            delete_by_id: format!("DELETE FROM {} WHERE {} = :id", meta.table, meta.id_column),
            insert: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                meta.table, columns, binds
            ),
        }
    }
}

/// Builds a `WHERE 1=1 AND ...` fragment from field filters.
///
/// Returns an empty conjunct list for an empty filter slice, keeping
/// select-all semantics.
pub fn where_fields(fields: &[FieldValue]) -> (String, NamedParams) {
    let mut sql = String::from(" WHERE 1=1");
    let mut params = NamedParams::new();
    for fv in fields {
        let column = camel_to_snake(&fv.name);
        if fv.value == Value::Null {
            sql.push_str(&format!(" AND {column} IS NULL"));
        } else {
            sql.push_str(&format!(" AND {column} = :{}", fv.name));
            params.push((format!(":{}", fv.name), fv.value.clone()));
        }
    }
    (sql, params)
}

/// Builds the dynamic-update statement `UPDATE t SET ... WHERE id = :id`.
///
/// Callers must reject empty field lists before calling.
pub fn update_fields_sql(meta: &TableMeta, fields: &[FieldValue]) -> (String, NamedParams) {
    let mut sql = format!("UPDATE {} SET ", meta.table);
    let mut params = NamedParams::new();
    for (i, fv) in fields.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        let column = camel_to_snake(&fv.name);
        if fv.value == Value::Null {
            sql.push_str(&format!("{column} = NULL"));
        } else {
            sql.push_str(&format!("{column} = :{}", fv.name));
            params.push((format!(":{}", fv.name), fv.value.clone()));
        }
    }
    sql.push_str(&format!(" WHERE {} = :id", meta.id_column));
    (sql, params)
}

/// Count statement with the same dynamic filter semantics as `where_fields`.
pub fn count_fields_sql(meta: &TableMeta, fields: &[FieldValue]) -> (String, NamedParams) {
    let (where_sql, params) = where_fields(fields);
    (
        format!("SELECT count(*) FROM {}{}", meta.table, where_sql),
        params,
    )
}

/// Paging suffix appended to any select; binds `:limit` and `:offset`.
pub const PAGE_SUFFIX: &str = " LIMIT :limit OFFSET :offset";

#[cfg(test)]
mod tests {
    use super::{count_fields_sql, update_fields_sql, where_fields, FieldValue, SqlSet};
    use crate::meta::{InsertColumn, TableMeta};
    use rusqlite::types::Value;

    fn meta() -> TableMeta {
        TableMeta {
            entity: "UserAccount",
            table: "user_account".to_string(),
            id_field: "id",
            id_column: "id".to_string(),
            insert_columns: vec![
                InsertColumn {
                    field: "user_name",
                    column: "user_name".to_string(),
                },
                InsertColumn {
                    field: "email",
                    column: "email".to_string(),
                },
            ],
        }
    }

    #[test]
    fn generates_fixed_statements() {
        let sql = SqlSet::generate(&meta());
        assert_eq!(sql.select_all, "SELECT * FROM user_account");
        assert_eq!(
            sql.select_by_id,
            "SELECT * FROM user_account WHERE id = :id"
        );
        assert_eq!(
            sql.delete_by_id,
            "DELETE FROM user_account WHERE id = :id"
        );
        assert_eq!(
            sql.insert,
            "INSERT INTO user_account (user_name, email) VALUES (:user_name, :email)"
        );
    }

    #[test]
    fn where_fields_binds_values_and_renders_nulls() {
        let (sql, params) = where_fields(&[
            FieldValue::of("user_name", "ada".to_string()),
            FieldValue::null("email"),
        ]);
        assert_eq!(
            sql,
            " WHERE 1=1 AND user_name = :user_name AND email IS NULL"
        );
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0, ":user_name");
    }

    #[test]
    fn where_fields_empty_keeps_select_all_semantics() {
        let (sql, params) = where_fields(&[]);
        assert_eq!(sql, " WHERE 1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn update_sql_mixes_binds_and_null_assignments() {
        let (sql, params) = update_fields_sql(
            &meta(),
            &[
                FieldValue::of("user_name", "grace".to_string()),
                FieldValue::null("email"),
            ],
        );
        assert_eq!(
            sql,
            "UPDATE user_account SET user_name = :user_name, email = NULL WHERE id = :id"
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn count_sql_carries_filter() {
        let (sql, params) =
            count_fields_sql(&meta(), &[FieldValue::of("login_count", Value::Integer(3))]);
        assert_eq!(
            sql,
            "SELECT count(*) FROM user_account WHERE 1=1 AND login_count = :login_count"
        );
        assert_eq!(params.len(), 1);
    }
}
