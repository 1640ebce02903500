use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row: column name to value, in the order the backend sent it.
/// Column sets are consistent across all rows of one result.
pub type Row = Map<String, Value>;

/// An ordered tabular result set from the backend. An empty set is valid and
/// distinct from "no result at all".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryResult(Vec<Row>);

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[Row] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column names in first-row key order. The first row defines the column
    /// order for the whole result.
    pub fn columns(&self) -> Vec<&str> {
        self.0
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Numeric reading of a cell: a JSON number, or a non-empty string that
/// parses to a finite float.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().expect("row literal").clone()
    }

    #[test]
    fn columns_follow_first_row_order() {
        let result = QueryResult::new(vec![
            row(json!({"ticker": "BIDW", "revenue_m": 2686.18})),
            row(json!({"revenue_m": 500, "ticker": "ACME"})),
        ]);
        assert_eq!(result.columns(), vec!["ticker", "revenue_m"]);
    }

    #[test]
    fn numeric_values() {
        assert_eq!(numeric_value(&json!(2686.18)), Some(2686.18));
        assert_eq!(numeric_value(&json!("42.5")), Some(42.5));
        assert_eq!(numeric_value(&json!(" 7 ")), Some(7.0));
        assert_eq!(numeric_value(&json!("")), None);
        assert_eq!(numeric_value(&json!("BIDW")), None);
        assert_eq!(numeric_value(&json!(null)), None);
        assert_eq!(numeric_value(&json!("inf")), None);
    }

    #[test]
    fn deserializes_from_wire_array() {
        let result: QueryResult =
            serde_json::from_str(r#"[{"ticker":"BIDW","revenue_m":2686.18}]"#).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.columns(), vec!["ticker", "revenue_m"]);
    }
}
