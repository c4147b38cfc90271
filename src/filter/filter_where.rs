use serde_json::Value;

use super::error::FilterError;
use super::types::{is_valid_identifier, FilterOp, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// Render a WHERE document. Placeholders start at `$starting_param_index + 1`.
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(where_data)
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::MalformedWhere("expected an object")),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions_snapshot = std::mem::take(&mut self.conditions);
        for condition in &conditions_snapshot {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        Ok((sql_conditions.join(" AND "), std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::MalformedWhere("unsupported condition format")),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::BadOperand(format!("{} requires an array of conditions", op)))?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = Self::generate(v, self.param_index)?;
                    self.param_index += params.len();
                    self.param_values.extend(params);
                    if !sql.is_empty() {
                        sql_parts.push(format!("({})", sql));
                    }
                }
                let combined = match (op, sql_parts.is_empty()) {
                    ("$or", true) => "1=0".to_string(),
                    (_, true) => "1=1".to_string(),
                    ("$or", false) => sql_parts.join(" OR "),
                    _ => sql_parts.join(" AND "),
                };
                self.conditions.push(FilterWhereInfo { column: format!("({})", combined), operator: FilterOp::Raw, data: Value::Null });
                Ok(())
            }
            "$not" => {
                let (sql, params) = Self::generate(value, self.param_index)?;
                self.param_index += params.len();
                self.param_values.extend(params);
                if !sql.is_empty() {
                    self.conditions.push(FilterWhereInfo { column: format!("NOT ({})", sql), operator: FilterOp::Raw, data: Value::Null });
                }
                Ok(())
            }
            _ => Err(FilterError::UnknownOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::BadIdentifier(field.to_string(), "column"));
        }
        match value {
            Value::Object(obj) if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() => {
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
                }
            }
            // Implicit equality: { field: value }
            _ => self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() }),
        }
        Ok(())
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnknownOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        if condition.operator == FilterOp::Raw {
            return Ok(condition.column.clone());
        }

        let quoted_column = format!("\"{}\"", condition.column);
        let data = condition.data.clone();
        Ok(match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted_column),
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(data)),
            FilterOp::Ne if data.is_null() => format!("{} IS NOT NULL", quoted_column),
            FilterOp::Ne => format!("{} <> {}", quoted_column, self.param(data)),
            FilterOp::Gt => format!("{} > {}", quoted_column, self.param(data)),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(data)),
            FilterOp::Lt => format!("{} < {}", quoted_column, self.param(data)),
            FilterOp::Lte => format!("{} <= {}", quoted_column, self.param(data)),
            FilterOp::Like => format!("{} LIKE {}", quoted_column, self.param(data)),
            FilterOp::ILike => format!("{} ILIKE {}", quoted_column, self.param(data)),
            FilterOp::In | FilterOp::NIn => {
                let negate = condition.operator == FilterOp::NIn;
                let values = match data {
                    Value::Array(values) => values,
                    single => vec![single],
                };
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let params: Vec<String> = values.into_iter().map(|v| self.param(v)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                format!("{} {} ({})", quoted_column, keyword, params.join(", "))
            }
            FilterOp::Between => match data {
                Value::Array(values) if values.len() == 2 => {
                    let low = self.param(values[0].clone());
                    let high = self.param(values[1].clone());
                    format!("{} BETWEEN {} AND {}", quoted_column, low, high)
                }
                _ => return Err(FilterError::BadOperand("$between takes exactly two values".to_string())),
            },
            FilterOp::Null => match data {
                Value::Bool(true) => format!("{} IS NULL", quoted_column),
                Value::Bool(false) => format!("{} IS NOT NULL", quoted_column),
                _ => return Err(FilterError::BadOperand("$null takes true or false".to_string())),
            },
            FilterOp::Raw => unreachable!("raw conditions return early"),
        })
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_null() {
        let (sql, params) = FilterWhere::generate(&json!({ "title": "Picnic", "image_path": null }), 0).unwrap();
        assert_eq!(sql, "\"image_path\" IS NULL AND \"title\" = $1");
        assert_eq!(params, vec![json!("Picnic")]);
    }

    #[test]
    fn nested_logical_operators_number_params_sequentially() {
        let where_data = json!({
            "$or": [
                { "title": { "$ilike": "%spring%" } },
                { "$and": [{ "display_order": { "$gte": 2 } }, { "display_order": { "$lte": 5 } }] }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 1).unwrap();
        assert_eq!(
            sql,
            "((\"title\" ILIKE $2) OR (((\"display_order\" >= $3) AND (\"display_order\" <= $4))))"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn in_and_between() {
        let (sql, params) = FilterWhere::generate(&json!({ "id": { "$in": [1, 2, 3] } }), 0).unwrap();
        assert_eq!(sql, "\"id\" IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);

        let (sql, _) = FilterWhere::generate(&json!({ "id": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");

        let (sql, _) = FilterWhere::generate(&json!({ "rating": { "$between": [3, 5] } }), 0).unwrap();
        assert_eq!(sql, "\"rating\" BETWEEN $1 AND $2");
        assert!(FilterWhere::generate(&json!({ "rating": { "$between": [3] } }), 0).is_err());
    }

    #[test]
    fn not_operator_wraps_clause() {
        let (sql, _) = FilterWhere::generate(&json!({ "$not": { "is_read": true } }), 0).unwrap();
        assert_eq!(sql, "NOT (\"is_read\" = $1)");
    }

    #[test]
    fn rejects_injection_in_column_names() {
        assert!(FilterWhere::generate(&json!({ "title\" OR 1=1 --": "x" }), 0).is_err());
        assert!(FilterWhere::generate(&json!({ "title": { "$regex": ".*" } }), 0).is_err());
    }
}
