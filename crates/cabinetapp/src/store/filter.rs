use crate::model::{Row, DELETED_AT};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    IsNull(String),
    NotNull(String),
}

impl Condition {
    pub fn column(&self) -> &str {
        match self {
            Condition::Eq(c, _) | Condition::IsNull(c) | Condition::NotNull(c) => c,
        }
    }

    fn matches(&self, row: &Row) -> bool {
        match self {
            Condition::Eq(col, expected) => row.get(col).is_some_and(|v| values_equal(v, expected)),
            Condition::IsNull(col) => row.get(col).map_or(true, Value::is_null),
            Condition::NotNull(col) => row.get(col).is_some_and(|v| !v.is_null()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Row selection shared by every backend: equality and null tests joined by
/// AND, an optional sort column and an optional row limit.
///
/// In-process backends evaluate it with [`Filter::apply`]; the REST backend
/// turns it into query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<Condition>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::IsNull(column.to_string()));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::NotNull(column.to_string()));
        self
    }

    /// Rows whose `deleted_at` is null.
    pub fn active(self) -> Self {
        self.is_null(DELETED_AT)
    }

    pub fn deleted(self) -> Self {
        self.not_null(DELETED_AT)
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    pub fn apply(&self, rows: impl IntoIterator<Item = Row>) -> Vec<Row> {
        let mut selected: Vec<Row> = rows.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(order) = &self.order {
            selected.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        if let Some(n) = self.limit {
            selected.truncate(n);
        }
        selected
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).ok()
}

/// Sort order for column values. Missing and null values sort after
/// everything else, so a descending sort puts them first, as SQL does.
/// Strings that are both RFC 3339 timestamps compare as instants.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match (x, y) {
            (Value::Number(m), Value::Number(n)) => m
                .as_f64()
                .partial_cmp(&n.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(s), Value::String(t)) => match (parse_timestamp(s), parse_timestamp(t)) {
                (Some(ds), Some(dt)) => ds.cmp(&dt),
                _ => s.cmp(t),
            },
            (Value::Bool(p), Value::Bool(q)) => p.cmp(q),
            _ => x.to_string().cmp(&y.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::into_row;
    use serde_json::json;

    fn rows() -> Vec<Row> {
        [
            json!({ "n": "a", "created_at": "2024-01-02T00:00:00+00:00", "deleted_at": null, "i": 2 }),
            json!({ "n": "b", "created_at": "2024-01-01T23:30:00-02:00", "i": 10 }),
            json!({ "n": "c", "created_at": "2024-01-01T12:00:00Z", "deleted_at": "2024-02-01T00:00:00Z", "i": 1 }),
        ]
        .into_iter()
        .map(|v| into_row(v).unwrap())
        .collect()
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r["n"].as_str().unwrap()).collect()
    }

    #[test]
    fn active_treats_missing_column_as_null() {
        let out = Filter::new().active().apply(rows());
        assert_eq!(names(&out), ["a", "b"]);
        let out = Filter::new().deleted().apply(rows());
        assert_eq!(names(&out), ["c"]);
    }

    #[test]
    fn timestamps_sort_by_instant_not_text() {
        // "b" is 2024-01-02T01:30Z once its offset is applied.
        let out = Filter::new().order_desc("created_at").apply(rows());
        assert_eq!(names(&out), ["b", "a", "c"]);
    }

    #[test]
    fn numbers_sort_numerically() {
        let out = Filter::new().order_asc("i").limit(2).apply(rows());
        assert_eq!(names(&out), ["c", "a"]);
    }

    #[test]
    fn nulls_last_ascending_first_descending() {
        let asc = Filter::new().order_asc("deleted_at").apply(rows());
        assert_eq!(names(&asc)[0], "c");
        let desc = Filter::new().order_desc("deleted_at").apply(rows());
        assert_eq!(names(&desc)[2], "c");
    }

    #[test]
    fn eq_compares_numbers_by_value() {
        let out = Filter::new().eq("i", 2.0).apply(rows());
        assert_eq!(names(&out), ["a"]);
        let out = Filter::new().eq("n", "b").eq("i", 10).apply(rows());
        assert_eq!(names(&out), ["b"]);
    }
}
