// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sparse time-indexed grids.
//!
//! A grid is a 2D table addressed by `(row, topic, column)`:
//!
//! ```text
//!              data columns (f64)        meta columns (String)
//!            +-------+-------+------+  +---------+---------+
//!  row ts_0  | pm25  | pm10  | ...  |  | status  | ...     |
//!  row ts_1  |       |       |      |  |         |         |
//!            +-------+-------+------+  +---------+---------+
//! ```
//!
//! Rows are unique millisecond timestamps; columns are unique keys per
//! topic. Column binding is append-only. The row mapping depends on the
//! variant:
//!
//! - [`PredefinedGrid`] -- `index = round((t - gte) / gap)`, rows ascend
//! - [`RelativeGrid`] -- insertion order, no time ordering

pub mod axis;
pub mod predefined;
pub mod relative;
pub(crate) mod wire;

pub use axis::{KeyAxis, TopicColumns};
pub use predefined::PredefinedGrid;
pub use relative::RelativeGrid;
pub use wire::CellValue;

use crate::error::{DatapointError, Result};
use std::collections::HashSet;
use std::fmt;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Column namespace. Each topic has its own keys and value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// Numeric readings (concentrations, temperatures, ...).
    Data,
    /// String labels and flags.
    Meta,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Data, Topic::Meta];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Data => "data",
            Topic::Meta => "meta",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column index, tagged with the topic it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColIdx {
    pub topic: Topic,
    pub index: usize,
}

impl ColIdx {
    pub fn new(topic: Topic, index: usize) -> Self {
        Self { topic, index }
    }
}

/// Owned cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Data(f64),
    Meta(String),
}

impl Value {
    pub fn topic(&self) -> Topic {
        match self {
            Value::Data(_) => Topic::Data,
            Value::Meta(_) => Topic::Meta,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Data(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Meta(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Meta(v.to_string())
    }
}

/// Borrowed cell value as returned by [`Grid::get`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Data(f64),
    Meta(&'a str),
}

impl<'a> ValueRef<'a> {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ValueRef::Data(v) => Some(*v),
            ValueRef::Meta(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            ValueRef::Meta(s) => Some(s),
            ValueRef::Data(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ValueRef::Data(v) => Value::Data(*v),
            ValueRef::Meta(s) => Value::Meta((*s).to_string()),
        }
    }
}

/// How confident a grid is that [`Grid::rows`] ascends in time.
///
/// Purely informational; no code path checks it at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrder {
    /// Rows always come out in ascending timestamp order.
    Ascending,
    /// Rows come out in insertion order.
    Unknown,
}

/// Row selection used by `filter`.
pub enum RowFilter<'a> {
    /// Keep rows for which the closure returns true.
    Predicate(Box<dyn Fn(Timestamp, usize) -> bool + 'a>),
    /// Keep exactly the listed `(timestamp, row_idx)` pairs.
    Allow(HashSet<(Timestamp, usize)>),
}

impl<'a> RowFilter<'a> {
    pub fn predicate(f: impl Fn(Timestamp, usize) -> bool + 'a) -> Self {
        RowFilter::Predicate(Box::new(f))
    }

    pub fn allow(pairs: impl IntoIterator<Item = (Timestamp, usize)>) -> Self {
        RowFilter::Allow(pairs.into_iter().collect())
    }

    pub fn keeps(&self, ts: Timestamp, ridx: usize) -> bool {
        match self {
            RowFilter::Predicate(f) => f(ts, ridx),
            RowFilter::Allow(set) => set.contains(&(ts, ridx)),
        }
    }
}

impl fmt::Debug for RowFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFilter::Predicate(_) => f.write_str("RowFilter::Predicate(..)"),
            RowFilter::Allow(set) => write!(f, "RowFilter::Allow({} rows)", set.len()),
        }
    }
}

/// Capability set shared by every grid variant.
///
/// Variants supply the row axis; column storage lives in [`TopicColumns`]
/// and the column half of the contract is provided here.
pub trait Grid {
    fn columns(&self) -> &TopicColumns;

    fn columns_mut(&mut self) -> &mut TopicColumns;

    /// Look up the row index of `ts` without allocating one.
    fn get_ridx(&self, ts: Timestamp) -> Result<Option<usize>>;

    /// Look up the row index of `ts`, allocating it on first sight.
    fn get_or_create_ridx(&mut self, ts: Timestamp) -> Result<usize>;

    /// Allocated rows as `(timestamp, row_idx)` in the variant's native order.
    fn rows(&self) -> Box<dyn Iterator<Item = (Timestamp, usize)> + '_>;

    /// Timestamp of an allocated row.
    fn row_at(&self, ridx: usize) -> Option<Timestamp>;

    fn capacity_of_row(&self) -> usize;

    fn time_order(&self) -> TimeOrder;

    fn row_times(&self) -> Box<dyn Iterator<Item = Timestamp> + '_> {
        Box::new(self.rows().map(|(ts, _)| ts))
    }

    fn row_indices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(self.rows().map(|(_, ridx)| ridx))
    }

    /// Reserve `count` more column slots for `topic`. Never shrinks.
    fn expand_col(&mut self, topic: Topic, count: usize) {
        self.columns_mut().expand(topic, count);
    }

    fn get_cidx(&self, topic: Topic, key: &str) -> Option<ColIdx> {
        self.columns().index_of(topic, key)
    }

    /// Bind `key` to a column of `topic`. Binding the same key twice
    /// returns the same index.
    fn get_or_create_cidx(&mut self, topic: Topic, key: &str) -> ColIdx {
        self.columns_mut().bind(topic, key)
    }

    /// Bound columns as `(key, col_idx)` in binding order.
    fn cols(&self, topic: Topic) -> Box<dyn Iterator<Item = (&str, ColIdx)> + '_> {
        self.columns().iter(topic)
    }

    fn col_keys(&self, topic: Topic) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.cols(topic).map(|(key, _)| key))
    }

    fn col_at(&self, cidx: ColIdx) -> Option<&str> {
        self.columns().key_at(cidx)
    }

    fn capacity_of_col(&self, topic: Topic) -> usize {
        self.columns().capacity(topic)
    }

    /// Cell value, or `None` when the cell was never written or deleted.
    fn get(&self, ridx: usize, cidx: ColIdx) -> Option<ValueRef<'_>> {
        self.columns().get(ridx, cidx)
    }

    fn set(&mut self, ridx: usize, cidx: ColIdx, value: Value) -> Result<()> {
        if self.row_at(ridx).is_none() {
            return Err(DatapointError::RowIndexOutOfBounds {
                ridx,
                capacity: self.capacity_of_row(),
            });
        }
        self.columns_mut().set(ridx, cidx, value)
    }

    fn del(&mut self, ridx: usize, cidx: ColIdx) {
        self.columns_mut().del(ridx, cidx);
    }

    /// Rows holding at least one value in either topic.
    fn used_of_row(&self) -> usize {
        let columns = self.columns();
        self.rows()
            .filter(|(_, ridx)| columns.row_has_value(*ridx))
            .count()
    }

    /// Columns of `topic` holding at least one value.
    fn used_of_col(&self, topic: Topic) -> usize {
        self.columns().used(topic)
    }

    /// Independent deep copy.
    fn copy(&self) -> Self
    where
        Self: Sized + Clone,
    {
        self.clone()
    }

    /// New grid holding only the selected rows, with the same column layout.
    fn filter(&self, filter: &RowFilter<'_>) -> Self
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_display() {
        assert_eq!(Topic::Data.to_string(), "data");
        assert_eq!(Topic::Meta.to_string(), "meta");
    }

    #[test]
    fn test_value_topic() {
        assert_eq!(Value::from(1.5).topic(), Topic::Data);
        assert_eq!(Value::from("ok").topic(), Topic::Meta);
    }

    #[test]
    fn test_value_ref_accessors() {
        let v = ValueRef::Data(3.0);
        assert_eq!(v.as_f64(), Some(3.0));
        assert_eq!(v.as_str(), None);
        assert_eq!(ValueRef::Meta("x").to_value(), Value::Meta("x".into()));
    }

    #[test]
    fn test_row_filter_allow_list() {
        let filter = RowFilter::allow([(1000, 0), (3000, 2)]);
        assert!(filter.keeps(1000, 0));
        assert!(!filter.keeps(1000, 1));
        assert!(filter.keeps(3000, 2));
    }

    #[test]
    fn test_row_filter_predicate() {
        let cutoff = 2000;
        let filter = RowFilter::predicate(move |ts, _| ts >= cutoff);
        assert!(!filter.keeps(1000, 0));
        assert!(filter.keeps(2000, 1));
    }
}
