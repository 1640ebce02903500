//! Decides whether a result set warrants offering a "visualize" action.

use crate::models::result::{numeric_value, QueryResult};

/// Column-name vocabulary suggesting a categorical label axis.
const LABEL_VOCABULARY: &[&str] = &["name", "ticker", "company", "category"];

/// Column-name vocabulary suggesting a measurable quantity.
const MEASURE_VOCABULARY: &[&str] = &[
    "value", "income", "price", "revenue", "sales", "profit", "amount", "quantity",
];

/// Pure, deterministic visualizability check over the FULL result set.
///
/// Fails closed on empty results or zero columns. Tier 1 looks for a
/// label-vocabulary column paired with a measure-vocabulary or numeric
/// column. The tier-2 fallback accepts any column with a numeric-looking
/// value anywhere in the set; it is deliberately biased toward offering
/// visualization rather than withholding it.
pub fn is_visualizable(result: &QueryResult) -> bool {
    let rows = result.rows();
    let Some(first) = rows.first() else {
        return false;
    };
    if first.is_empty() {
        return false;
    }

    let has_label_column = first.keys().any(|col| {
        let lowered = col.to_lowercase();
        LABEL_VOCABULARY.iter().any(|word| lowered.contains(word))
    });
    let has_measure_column = first.iter().any(|(col, value)| {
        let lowered = col.to_lowercase();
        MEASURE_VOCABULARY.iter().any(|word| lowered.contains(word)) || value.is_number()
    });
    if has_label_column && has_measure_column {
        return true;
    }

    first.keys().any(|col| {
        rows.iter()
            .any(|row| row.get(col).is_some_and(|value| numeric_value(value).is_some()))
    })
}
