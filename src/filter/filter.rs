use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{is_valid_identifier, FilterData, FilterOrderInfo, SqlResult};

pub struct Filter {
    table_name: String,
    select_columns: Vec<String>,
    scope: Vec<(String, Value)>,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i32>,
    offset: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::BadIdentifier(table_name, "table"));
        }
        Ok(Self {
            table_name,
            select_columns: vec![],
            scope: vec![],
            where_data: None,
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(select) = data.select { self.select(select)?; }
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit, data.offset)?; }
        else if let Some(offset) = data.offset { self.offset(offset)?; }
        Ok(self)
    }

    pub fn select(&mut self, columns: Vec<String>) -> Result<&mut Self, FilterError> {
        for column in &columns {
            if column != "*" && !is_valid_identifier(column) {
                return Err(FilterError::BadIdentifier(column.clone(), "column"));
            }
        }
        self.select_columns = columns;
        Ok(self)
    }

    /// Equality that is always ANDed in front of the caller's WHERE document,
    /// whatever that document contains.
    pub fn scope(&mut self, column: &str, value: Value) -> Result<&mut Self, FilterError> {
        if !is_valid_identifier(column) {
            return Err(FilterError::BadIdentifier(column.to_string(), "scope column"));
        }
        self.scope.retain(|(existing, _)| existing != column);
        self.scope.push((column.to_string(), value));
        Ok(self)
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        self.order_data = FilterOrder::validate_and_parse(&order_spec)?;
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32, offset: Option<i32>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::NegativePaging("limit")); }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit.unwrap_or(i32::MAX);
        let applied_limit = if limit > max_limit {
            if crate::config::CONFIG.filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        if let Some(off) = offset { self.offset(off)?; }
        Ok(self)
    }

    pub fn offset(&mut self, offset: i32) -> Result<&mut Self, FilterError> {
        if offset < 0 { return Err(FilterError::NegativePaging("offset")); }
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause();

        let query = [
            format!("SELECT {}", self.build_select_clause()),
            format!("FROM \"{}\"", self.table_name),
            if where_result.query.is_empty() { String::new() } else { format!("WHERE {}", where_result.query) },
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params: where_result.params })
    }

    pub fn to_where_sql(&self) -> Result<SqlResult, FilterError> {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        for (column, value) in &self.scope {
            if value.is_null() {
                conditions.push(format!("\"{}\" IS NULL", column));
            } else {
                params.push(value.clone());
                conditions.push(format!("\"{}\" = ${}", column, params.len()));
            }
        }

        if let Some(ref where_data) = self.where_data {
            let (sql, where_params) = FilterWhere::generate(where_data, params.len())?;
            if !sql.is_empty() {
                conditions.push(if self.scope.is_empty() { sql } else { format!("({})", sql) });
            }
            params.extend(where_params);
        }

        Ok(SqlResult { query: conditions.join(" AND "), params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let where_result = self.to_where_sql()?;
        let query = if where_result.query.is_empty() {
            format!("SELECT COUNT(*) as count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.table_name, where_result.query)
        };
        Ok(SqlResult { query, params: where_result.params })
    }

    fn build_select_clause(&self) -> String {
        if self.select_columns.is_empty() || self.select_columns.iter().any(|c| c == "*") {
            "*".to_string()
        } else {
            self.select_columns.iter().map(|c| format!("\"{}\"", c)).collect::<Vec<_>>().join(", ")
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scope_is_anded_before_user_conditions() {
        let mut filter = Filter::new("events").unwrap();
        filter.scope("kindergarten_id", json!(4)).unwrap();
        filter.where_clause(json!({ "is_active": true })).unwrap();
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"events\" WHERE \"kindergarten_id\" = $1 AND (\"is_active\" = $2)"
        );
        assert_eq!(sql.params, vec![json!(4), json!(true)]);
    }

    #[test]
    fn user_where_cannot_widen_scope() {
        let mut filter = Filter::new("events").unwrap();
        filter.scope("kindergarten_id", json!(4)).unwrap();
        filter
            .where_clause(json!({ "$or": [{ "kindergarten_id": 9 }, { "is_active": true }] }))
            .unwrap();
        let sql = filter.to_where_sql().unwrap();
        assert!(sql.query.starts_with("\"kindergarten_id\" = $1 AND ("));
        assert_eq!(sql.params[0], json!(4));
    }

    #[test]
    fn order_limit_offset() {
        let mut filter = Filter::new("staff_members").unwrap();
        filter
            .assign(FilterData {
                order: Some(json!("display_order asc, id desc")),
                limit: Some(10),
                offset: Some(20),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(
            filter.to_sql().unwrap().query,
            "SELECT * FROM \"staff_members\" ORDER BY \"display_order\" ASC, \"id\" DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn count_sql_uses_scope() {
        let mut filter = Filter::new("contact_submissions").unwrap();
        filter.scope("kindergarten_id", json!(2)).unwrap();
        filter.where_clause(json!({ "is_read": false })).unwrap();
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) as count FROM \"contact_submissions\" WHERE \"kindergarten_id\" = $1 AND (\"is_read\" = $2)"
        );
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(Filter::new("events; drop table users").is_err());
        let mut filter = Filter::new("events").unwrap();
        assert!(filter.select(vec!["title\"".to_string()]).is_err());
        assert!(filter.scope("kindergarten id", json!(1)).is_err());
    }

    #[test]
    fn negative_limit_is_rejected() {
        let mut filter = Filter::new("events").unwrap();
        assert!(filter.limit(-1, None).is_err());
        assert!(filter.limit(5, Some(-2)).is_err());
    }
}
