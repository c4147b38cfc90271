use serde_json::Value;

use super::error::FilterError;
use super::types::{is_valid_identifier, FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let parsed = match order {
            Value::String(s) => Self::parse_order_string(s),
            Value::Array(arr) => {
                // Expect array of strings like ["created_at desc", "title asc"]
                let mut out = Vec::new();
                for v in arr {
                    if let Value::String(s) = v { out.extend(Self::parse_order_string(s)); }
                }
                out
            }
            Value::Object(obj) => {
                // { "created_at": "desc", "title": "asc" }
                obj.iter()
                    .map(|(k, v)| FilterOrderInfo {
                        column: k.clone(),
                        sort: Self::direction(v.as_str().unwrap_or("asc")),
                    })
                    .collect()
            }
            _ => vec![],
        };

        for info in &parsed {
            if !is_valid_identifier(&info.column) {
                return Err(FilterError::BadIdentifier(info.column.clone(), "order column"));
            }
        }
        Ok(parsed)
    }

    fn direction(s: &str) -> SortDirection {
        if s.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc }
    }

    fn parse_order_string(s: &str) -> Vec<FilterOrderInfo> {
        // split on commas, then each token into column and direction
        s.split(',')
            .filter_map(|part| {
                let mut it = part.split_whitespace();
                let column = it.next()?;
                Some(FilterOrderInfo { column: column.to_string(), sort: Self::direction(it.next().unwrap_or("asc")) })
            })
            .collect()
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() { return String::new(); }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_all_forms() {
        let from_str = FilterOrder::validate_and_parse(&json!("event_date desc, id")).unwrap();
        assert_eq!(FilterOrder::generate(&from_str), "ORDER BY \"event_date\" DESC, \"id\" ASC");

        let from_arr = FilterOrder::validate_and_parse(&json!(["display_order asc"])).unwrap();
        assert_eq!(from_arr[0].sort, SortDirection::Asc);

        let from_obj = FilterOrder::validate_and_parse(&json!({ "submitted_at": "DESC" })).unwrap();
        assert_eq!(from_obj[0].sort, SortDirection::Desc);
    }

    #[test]
    fn rejects_expressions() {
        assert!(FilterOrder::validate_and_parse(&json!("random() desc")).is_err());
    }
}
