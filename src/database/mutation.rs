//! INSERT/UPDATE statements built from JSON objects.
//!
//! Only columns declared in a [`ColumnSpec`] list are written. Every value is
//! bound as text/int/bool and wrapped in `CAST($n AS <type>)` so one binding
//! strategy serves every column type.

use serde_json::{Map, Value};

use crate::filter::{is_valid_identifier, SqlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Boolean,
    Timestamp,
}

impl SqlType {
    fn cast(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamp => "TIMESTAMPTZ",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: SqlType,
}

impl ColumnSpec {
    pub const fn text(name: &'static str) -> Self {
        Self { name, sql_type: SqlType::Text }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self { name, sql_type: SqlType::Integer }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self { name, sql_type: SqlType::Boolean }
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self { name, sql_type: SqlType::Timestamp }
    }
}

struct Params {
    values: Vec<Value>,
}

impl Params {
    fn push(&mut self, value: Value, sql_type: SqlType) -> String {
        self.values.push(value);
        format!("CAST(${} AS {})", self.values.len(), sql_type.cast())
    }
}

fn writable<'a>(columns: &'a [ColumnSpec], values: &'a Map<String, Value>) -> impl Iterator<Item = (&'a ColumnSpec, &'a Value)> {
    columns
        .iter()
        .filter(|c| is_valid_identifier(c.name))
        .filter_map(move |c| values.get(c.name).map(|v| (c, v)))
}

/// `INSERT INTO table (kindergarten_id, cols...) VALUES (...) RETURNING *`
pub fn insert_sql(
    table: &str,
    columns: &[ColumnSpec],
    values: &Map<String, Value>,
    kindergarten_id: i32,
) -> SqlResult {
    let mut params = Params { values: vec![] };
    let mut names = vec!["\"kindergarten_id\"".to_string()];
    let mut placeholders = vec![params.push(Value::from(kindergarten_id), SqlType::Integer)];

    for (column, value) in writable(columns, values) {
        names.push(format!("\"{}\"", column.name));
        placeholders.push(params.push(value.clone(), column.sql_type));
    }

    SqlResult {
        query: format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            table,
            names.join(", "),
            placeholders.join(", ")
        ),
        params: params.values,
    }
}

/// `UPDATE table SET ... WHERE id = $n AND kindergarten_id = $m RETURNING *`
///
/// Returns `None` when no declared column is present in `values`.
pub fn update_sql(
    table: &str,
    columns: &[ColumnSpec],
    values: &Map<String, Value>,
    id: i32,
    kindergarten_id: i32,
) -> Option<SqlResult> {
    let mut params = Params { values: vec![] };
    let assignments: Vec<String> = writable(columns, values)
        .map(|(column, value)| format!("\"{}\" = {}", column.name, params.push(value.clone(), column.sql_type)))
        .collect();

    if assignments.is_empty() {
        return None;
    }

    let id_param = params.push(Value::from(id), SqlType::Integer);
    let scope_param = params.push(Value::from(kindergarten_id), SqlType::Integer);

    Some(SqlResult {
        query: format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = {} AND \"kindergarten_id\" = {} RETURNING *",
            table,
            assignments.join(", "),
            id_param,
            scope_param
        ),
        params: params.values,
    })
}

/// Convert multipart text values to JSON according to the column type.
/// Empty strings become `null`; checkboxes accept `on`, `1`, `true`, `yes`.
pub fn coerce_form_value(sql_type: SqlType, raw: &str) -> Value {
    let trimmed = raw.trim();
    match sql_type {
        SqlType::Text => {
            if raw.is_empty() { Value::Null } else { Value::String(raw.to_string()) }
        }
        _ if trimmed.is_empty() => Value::Null,
        SqlType::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(trimmed.to_string())),
        SqlType::Boolean => Value::Bool(matches!(
            trimmed.to_ascii_lowercase().as_str(),
            "on" | "1" | "true" | "yes"
        )),
        SqlType::Timestamp => Value::String(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[ColumnSpec] = &[
        ColumnSpec::text("title"),
        ColumnSpec::integer("display_order"),
        ColumnSpec::boolean("is_active"),
    ];

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn insert_writes_tenant_and_declared_columns_only() {
        let sql = insert_sql(
            "gallery_images",
            COLUMNS,
            &values(json!({ "title": "Spring", "is_active": true, "kindergarten_id": 99, "id": 5 })),
            3,
        );
        assert_eq!(
            sql.query,
            "INSERT INTO \"gallery_images\" (\"kindergarten_id\", \"title\", \"is_active\") VALUES (CAST($1 AS INTEGER), CAST($2 AS TEXT), CAST($3 AS BOOLEAN)) RETURNING *"
        );
        assert_eq!(sql.params, vec![json!(3), json!("Spring"), json!(true)]);
    }

    #[test]
    fn update_is_scoped_to_tenant() {
        let sql = update_sql("staff_members", COLUMNS, &values(json!({ "display_order": 4 })), 12, 3).unwrap();
        assert_eq!(
            sql.query,
            "UPDATE \"staff_members\" SET \"display_order\" = CAST($1 AS INTEGER) WHERE \"id\" = CAST($2 AS INTEGER) AND \"kindergarten_id\" = CAST($3 AS INTEGER) RETURNING *"
        );
        assert_eq!(sql.params, vec![json!(4), json!(12), json!(3)]);
    }

    #[test]
    fn update_without_columns_is_none() {
        assert!(update_sql("staff_members", COLUMNS, &values(json!({ "kindergarten_id": 1 })), 1, 1).is_none());
    }

    #[test]
    fn coerces_form_values() {
        assert_eq!(coerce_form_value(SqlType::Integer, "7"), json!(7));
        assert_eq!(coerce_form_value(SqlType::Integer, ""), Value::Null);
        assert_eq!(coerce_form_value(SqlType::Boolean, "on"), json!(true));
        assert_eq!(coerce_form_value(SqlType::Boolean, "false"), json!(false));
        assert_eq!(coerce_form_value(SqlType::Text, ""), Value::Null);
        assert_eq!(coerce_form_value(SqlType::Text, " padded "), json!(" padded "));
    }
}
