//! # Query Model
//!
//! A small relational query description understood by every [`DataStore`]
//! adapter: column filters, ordering (including dotted paths into embedded
//! rows), a row limit and to-one embeds.
//!
//! ```rust,ignore
//! let query = Query::from("supervisors")
//!     .eq("organization_id", &org_id)
//!     .embed(Embed::to_one("users", "users", "user_id", "id"))
//!     .order_by("users.raw_user_meta_data.last_name", Direction::Ascending);
//! ```
//!
//! [`DataStore`]: crate::ports::DataStore

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One record as returned by the backend.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gte,
    Lte,
    /// `value` is an array of candidates.
    In,
}

/// A predicate on a single column or dotted path.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &Row) -> bool {
        let actual = lookup_path(row, &self.column).unwrap_or(&Value::Null);
        match self.op {
            FilterOp::Eq => loosely_equal(actual, &self.value),
            FilterOp::Neq => !loosely_equal(actual, &self.value),
            FilterOp::Gte => {
                compare_values(actual, &self.value).is_some_and(|o| o != Ordering::Less)
            }
            FilterOp::Lte => {
                compare_values(actual, &self.value).is_some_and(|o| o != Ordering::Greater)
            }
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| loosely_equal(actual, c))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// A to-one relation resolved by matching `local_column` against
/// `foreign_column` of `table`. The matched row is stored under `alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub alias: String,
    pub table: String,
    pub local_column: String,
    pub foreign_column: String,
    /// Drop the parent row when no related row exists.
    pub inner: bool,
}

impl Embed {
    pub fn to_one(
        alias: impl Into<String>,
        table: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            table: table.into(),
            local_column: local_column.into(),
            foreign_column: foreign_column.into(),
            inner: false,
        }
    }

    /// Inner-join variant of [`Embed::to_one`].
    pub fn inner(mut self) -> Self {
        self.inner = true;
        self
    }
}

/// A read (or the filter part of an update/delete) against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    /// Projected columns; empty means all.
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<usize>,
    pub embeds: Vec<Embed>,
}

impl Query {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            embeds: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Eq, value))
    }

    pub fn neq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Neq, value))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Gte, value))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(column, FilterOp::Lte, value))
    }

    pub fn in_<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(Filter::new(column, FilterOp::In, Value::Array(values)))
    }

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.order.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Whether every filter accepts `row`.
    pub fn accepts(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Sort rows in place according to `order`. Missing values sort last.
    pub fn sort(&self, rows: &mut [Row]) {
        if self.order.is_empty() {
            return;
        }
        rows.sort_by(|a, b| {
            for key in &self.order {
                let left = lookup_path(a, &key.column).filter(|v| !v.is_null());
                let right = lookup_path(b, &key.column).filter(|v| !v.is_null());
                let ordering = match (left, right) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Greater,
                    (Some(_), None) => Ordering::Less,
                    (Some(l), Some(r)) => {
                        let natural = compare_values(l, r).unwrap_or(Ordering::Equal);
                        match key.direction {
                            Direction::Ascending => natural,
                            Direction::Descending => natural.reverse(),
                        }
                    }
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Keep only projected columns and embed aliases.
    pub fn project(&self, row: Row) -> Row {
        if self.columns.is_empty() {
            return row;
        }
        row.into_iter()
            .filter(|(key, _)| {
                self.columns.iter().any(|c| c == key) || self.embeds.iter().any(|e| &e.alias == key)
            })
            .collect()
    }
}

/// Resolve a dotted path such as `users.raw_user_meta_data.last_name`.
pub fn lookup_path<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = row.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Text at a dotted path. Numbers are rendered; blank strings count as
/// absent.
pub fn text_at(row: &Row, path: &str) -> Option<String> {
    match lookup_path(row, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Scalar rendering used for loose comparison of ids that may arrive as
/// either strings or numbers.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        _ => match (scalar_key(left), scalar_key(right)) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        },
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => Some(scalar_key(left)?.cmp(&scalar_key(right)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_eq_is_loose_on_ids() {
        let r = row(json!({"id": 7, "name": "x"}));
        assert!(Filter::new("id", FilterOp::Eq, "7").matches(&r));
        assert!(Filter::new("id", FilterOp::Neq, 8).matches(&r));
        assert!(!Filter::new("missing", FilterOp::Eq, "x").matches(&r));
    }

    #[test]
    fn test_range_filters_on_timestamps() {
        let r = row(json!({"meeting_date": "2024-03-05T10:00:00Z"}));
        let q = Query::from("meetings")
            .gte("meeting_date", "2024-03-04T00:00:00Z")
            .lte("meeting_date", "2024-03-11T00:00:00Z");
        assert!(q.accepts(&r));

        let late = Query::from("meetings").gte("meeting_date", "2024-04-01T00:00:00Z");
        assert!(!late.accepts(&r));
    }

    #[test]
    fn test_in_filter() {
        let r = row(json!({"status": "active"}));
        assert!(Query::from("t").in_("status", ["active", "on_leave"]).accepts(&r));
        assert!(!Query::from("t").in_("status", ["suspended"]).accepts(&r));
    }

    #[test]
    fn test_sort_by_nested_path_with_missing_last() {
        let q = Query::from("students").order_by("users.meta.last_name", Direction::Ascending);
        let mut rows = vec![
            row(json!({"id": 1, "users": {"meta": {"last_name": "Zed"}}})),
            row(json!({"id": 2})),
            row(json!({"id": 3, "users": {"meta": {"last_name": "Adams"}}})),
        ];
        q.sort(&mut rows);
        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);
    }

    #[test]
    fn test_descending_numeric_sort() {
        let q = Query::from("t").order_by("n", Direction::Descending);
        let mut rows = vec![row(json!({"n": 2})), row(json!({"n": 10})), row(json!({"n": 5}))];
        q.sort(&mut rows);
        assert_eq!(rows[0]["n"], json!(10));
        assert_eq!(rows[2]["n"], json!(2));
    }

    #[test]
    fn test_projection_keeps_embeds() {
        let q = Query::from("supervisors")
            .select(&["id"])
            .embed(Embed::to_one("users", "users", "user_id", "id"));
        let projected = q.project(row(json!({"id": 1, "user_id": "u", "users": {}})));
        assert!(projected.contains_key("id"));
        assert!(projected.contains_key("users"));
        assert!(!projected.contains_key("user_id"));
    }
}
