//! Builds a row-limited tabular view of a result set for the transcript.

use std::fmt;

use serde_json::Value;

use crate::format;
use crate::models::result::QueryResult;

/// Display cap for rows shown inline in the chat. A display policy only: the
/// classifier and visualization requests always see the full result.
pub const DISPLAY_ROW_LIMIT: usize = 10;

/// One rendered cell. `Null` is distinct from an empty string and from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Null,
    Text(String),
}

impl Cell {
    pub fn display(&self) -> &str {
        match self {
            Cell::Null => "NULL",
            Cell::Text(text) => text,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// A capped, formatted view of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// True row count of the underlying result, before capping.
    pub total_rows: usize,
}

impl TableView {
    /// Trailing note with the true total, present iff rows were cut off.
    pub fn truncation_note(&self) -> Option<String> {
        (self.total_rows > self.rows.len())
            .then(|| format!("Showing {} of {} rows.", self.rows.len(), self.total_rows))
    }
}

impl fmt::Display for TableView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.display().chars().count());
            }
        }

        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{:<width$}", col, width = widths[i])?;
        }
        writeln!(f)?;
        for (i, width) in widths.iter().enumerate() {
            if i > 0 {
                write!(f, "-+-")?;
            }
            write!(f, "{}", "-".repeat(*width))?;
        }
        writeln!(f)?;
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                write!(f, "{:<width$}", cell.display(), width = widths[i])?;
            }
            writeln!(f)?;
        }
        if let Some(note) = self.truncation_note() {
            writeln!(f, "{}", note)?;
        }
        Ok(())
    }
}

/// Render a result set into a [`TableView`].
///
/// Column order is the first row's key order; every row is emitted in that
/// order, with missing or null values as the NULL marker. Numbers are
/// formatted with grouping separators and at most two decimals.
pub fn render(result: &QueryResult) -> TableView {
    let rows = result.rows();
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();

    let view_rows = rows
        .iter()
        .take(DISPLAY_ROW_LIMIT)
        .map(|row| {
            columns
                .iter()
                .map(|col| match row.get(col) {
                    None | Some(Value::Null) => Cell::Null,
                    Some(Value::Number(n)) => Cell::Text(format::format_json_number(n)),
                    Some(Value::String(s)) => Cell::Text(s.clone()),
                    Some(other) => Cell::Text(other.to_string()),
                })
                .collect()
        })
        .collect();

    TableView {
        columns,
        rows: view_rows,
        total_rows: rows.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::Row;
    use serde_json::json;

    fn result(rows: Vec<serde_json::Value>) -> QueryResult {
        QueryResult::new(
            rows.into_iter()
                .map(|v| v.as_object().expect("row literal").clone())
                .collect::<Vec<Row>>(),
        )
    }

    #[test]
    fn renders_all_rows_under_the_cap_without_a_note() {
        let r = result(vec![
            json!({"ticker": "BIDW", "revenue_m": 2686.18}),
            json!({"ticker": "ACME", "revenue_m": 500}),
        ]);
        let table = render(&r);
        assert_eq!(table.columns, vec!["ticker", "revenue_m"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], Cell::Text("2,686.18".into()));
        assert_eq!(table.rows[1][1], Cell::Text("500".into()));
        assert!(table.truncation_note().is_none());
    }

    #[test]
    fn caps_at_ten_rows_and_notes_the_true_total() {
        let rows = (0..25)
            .map(|i| json!({"id": i, "amount": i * 100}))
            .collect();
        let table = render(&result(rows));
        assert_eq!(table.rows.len(), DISPLAY_ROW_LIMIT);
        assert_eq!(table.total_rows, 25);
        assert_eq!(table.truncation_note().as_deref(), Some("Showing 10 of 25 rows."));
    }

    #[test]
    fn missing_and_null_values_render_as_null_marker() {
        let r = result(vec![
            json!({"ticker": "BIDW", "eps": 0.77}),
            json!({"ticker": "ACME"}),
            json!({"ticker": "NULL_CO", "eps": null}),
        ]);
        let table = render(&r);
        assert!(table.rows[1][1].is_null());
        assert!(table.rows[2][1].is_null());
        // a null cell is not the same as an empty or zero cell
        assert_ne!(table.rows[1][1], Cell::Text(String::new()));
        assert_ne!(table.rows[1][1], Cell::Text("0".into()));
    }

    #[test]
    fn later_rows_follow_first_row_column_order() {
        let r = result(vec![
            json!({"ticker": "BIDW", "revenue_m": 10}),
            json!({"revenue_m": 20, "ticker": "ACME"}),
        ]);
        let table = render(&r);
        assert_eq!(table.rows[1][0], Cell::Text("ACME".into()));
        assert_eq!(table.rows[1][1], Cell::Text("20".into()));
    }

    #[test]
    fn empty_result_renders_an_empty_view() {
        let table = render(&QueryResult::default());
        assert!(table.columns.is_empty());
        assert!(table.rows.is_empty());
        assert_eq!(table.total_rows, 0);
    }
}
