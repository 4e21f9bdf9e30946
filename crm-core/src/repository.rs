use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// A listing result together with its size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total_count: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            total_count: items.len(),
            items,
        }
    }
}

/// One `order_by` term: a field name, descending when written with a leading `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), descending: false }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), descending: true }
    }
}

/// Records that can be listed with a caller-chosen ordering.
pub trait Sortable {
    /// Field names accepted in `order_by`.
    const SORT_FIELDS: &'static [&'static str];

    /// Compares two records on one of [`Sortable::SORT_FIELDS`].
    fn compare_field(&self, other: &Self, field: &str) -> Ordering;

    /// Maps a sort field to its column expression in SQL.
    fn sort_column(field: &str) -> Option<&'static str>;
}

/// Parses `["name", "-email"]`, rejecting fields the record type does not expose.
pub fn parse_order_by<T: Sortable>(terms: &[String]) -> CoreResult<Vec<SortKey>> {
    let mut keys = Vec::with_capacity(terms.len());

    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }

        let (field, descending) = match term.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (term, false),
        };

        if !T::SORT_FIELDS.contains(&field) {
            return Err(CoreError::ValidationError(format!(
                "Cannot order by '{}'. Choices are: {}",
                field,
                T::SORT_FIELDS.join(", ")
            )));
        }

        keys.push(SortKey { field: field.to_string(), descending });
    }

    Ok(keys)
}

/// Splits a comma separated `order_by` query parameter.
pub fn split_order_by(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect())
        .unwrap_or_default()
}

/// Stable in-place sort; an empty key list keeps insertion order.
pub fn sort_records<T: Sortable>(records: &mut [T], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    records.sort_by(|a, b| {
        for key in keys {
            let ord = a.compare_field(b, &key.field);
            let ord = if key.descending { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

/// Builds an `ORDER BY` clause from validated keys, falling back to `default`.
pub fn order_clause<T: Sortable>(keys: &[SortKey], default: &str) -> String {
    let terms: Vec<String> = keys
        .iter()
        .filter_map(|key| {
            T::sort_column(&key.field)
                .map(|col| format!("{} {}", col, if key.descending { "DESC" } else { "ASC" }))
        })
        .collect();

    if terms.is_empty() {
        format!(" ORDER BY {}", default)
    } else {
        format!(" ORDER BY {}", terms.join(", "))
    }
}
