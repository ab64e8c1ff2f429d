// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Irregular grid: rows are numbered in arrival order.

use super::axis::MAX_RESERVE;
use super::wire::{expect_end, read_capacity, read_count, to_u32, write_capacity};
use super::{Grid, RowFilter, TimeOrder, Timestamp, TopicColumns};
use crate::error::{DatapointError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::Cursor;

/// Grid whose row index is assigned on first sight of a timestamp.
///
/// Row iteration follows insertion order; callers that need time order
/// must sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelativeGrid {
    times: Vec<Timestamp>,
    lookup: HashMap<Timestamp, usize>,
    capacity: usize,
    columns: TopicColumns,
}

impl RelativeGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid sized for `count` rows. The count is a hint: at most
    /// [`MAX_RESERVE`] rows are allocated up front.
    pub fn with_capacity(count: usize) -> Self {
        let reserve = count.min(MAX_RESERVE);
        Self {
            times: Vec::with_capacity(reserve),
            lookup: HashMap::with_capacity(reserve),
            capacity: count,
            columns: TopicColumns::new(),
        }
    }

    /// Serialize rows and columns.
    ///
    /// ```text
    /// capacity (8) | row_count (4) | timestamp (8)[] | columns
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(12 + self.times.len() * 8);
        write_capacity(&mut buf, self.capacity)?;
        buf.write_u32::<LittleEndian>(to_u32(self.times.len())?)?;
        for ts in &self.times {
            buf.write_i64::<LittleEndian>(*ts)?;
        }
        self.columns.encode(&mut buf)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(bytes);
        let capacity = read_capacity(&mut r)?;
        let row_count = read_count(&mut r, 8)?;
        let mut grid = Self::with_capacity(row_count);
        grid.capacity = capacity;
        for _ in 0..row_count {
            let ts = r.read_i64::<LittleEndian>()?;
            if grid.lookup.contains_key(&ts) {
                return Err(DatapointError::InvalidFormat(format!(
                    "duplicate row timestamp {}",
                    ts
                )));
            }
            grid.push_row(ts);
        }

        grid.columns = TopicColumns::decode(&mut r, |ridx| ridx < row_count)?;
        expect_end(&r, "relative grid")?;
        Ok(grid)
    }

    fn push_row(&mut self, ts: Timestamp) -> usize {
        let ridx = self.times.len();
        self.times.push(ts);
        self.lookup.insert(ts, ridx);
        ridx
    }
}

impl Grid for RelativeGrid {
    fn columns(&self) -> &TopicColumns {
        &self.columns
    }

    fn columns_mut(&mut self) -> &mut TopicColumns {
        &mut self.columns
    }

    fn get_ridx(&self, ts: Timestamp) -> Result<Option<usize>> {
        Ok(self.lookup.get(&ts).copied())
    }

    fn get_or_create_ridx(&mut self, ts: Timestamp) -> Result<usize> {
        match self.lookup.get(&ts) {
            Some(ridx) => Ok(*ridx),
            None => Ok(self.push_row(ts)),
        }
    }

    fn rows(&self) -> Box<dyn Iterator<Item = (Timestamp, usize)> + '_> {
        Box::new(self.times.iter().copied().enumerate().map(|(ridx, ts)| (ts, ridx)))
    }

    fn row_at(&self, ridx: usize) -> Option<Timestamp> {
        self.times.get(ridx).copied()
    }

    fn capacity_of_row(&self) -> usize {
        self.capacity.max(self.times.len())
    }

    fn time_order(&self) -> TimeOrder {
        TimeOrder::Unknown
    }

    fn filter(&self, filter: &RowFilter<'_>) -> Self {
        let mut grid = Self::with_capacity(self.capacity);
        let mut mapping = Vec::new();
        for (ts, ridx) in self.rows() {
            if filter.keeps(ts, ridx) {
                mapping.push((ridx, grid.push_row(ts)));
            }
        }
        grid.columns = self.columns.remap_rows(&mapping);
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Topic, Value, ValueRef};

    #[test]
    fn test_rows_follow_insertion_order() {
        let mut grid = RelativeGrid::with_capacity(3);
        assert_eq!(grid.get_or_create_ridx(3_000).unwrap(), 0);
        assert_eq!(grid.get_or_create_ridx(1_000).unwrap(), 1);
        assert_eq!(grid.get_or_create_ridx(2_000).unwrap(), 2);
        let times: Vec<_> = grid.row_times().collect();
        assert_eq!(times, vec![3_000, 1_000, 2_000]);
        assert_eq!(grid.time_order(), TimeOrder::Unknown);
    }

    #[test]
    fn test_duplicate_timestamp_reuses_row() {
        let mut grid = RelativeGrid::new();
        let first = grid.get_or_create_ridx(42).unwrap();
        assert_eq!(grid.get_or_create_ridx(42).unwrap(), first);
        assert_eq!(grid.rows().count(), 1);
    }

    #[test]
    fn test_row_capacity_is_the_hint() {
        let mut grid = RelativeGrid::with_capacity(3);
        assert_eq!(grid.capacity_of_row(), 3);
        for ts in [1, 2, 3, 4, 5] {
            grid.get_or_create_ridx(ts).unwrap();
        }
        assert_eq!(grid.capacity_of_row(), 5);

        let bytes = RelativeGrid::with_capacity(3).encode().unwrap();
        let decoded = RelativeGrid::decode(&bytes).unwrap();
        assert_eq!(decoded.capacity_of_row(), 3);
        let filtered = grid.filter(&RowFilter::predicate(|ts, _| ts < 3));
        assert_eq!(filtered.capacity_of_row(), 3);
    }

    #[test]
    fn test_huge_hint_does_not_allocate() {
        let mut grid = RelativeGrid::with_capacity(usize::MAX);
        assert_eq!(grid.capacity_of_row(), usize::MAX);
        assert_eq!(grid.get_or_create_ridx(9).unwrap(), 0);
    }

    #[test]
    fn test_lookup_never_errors() {
        let grid = RelativeGrid::new();
        assert_eq!(grid.get_ridx(i64::MIN).unwrap(), None);
    }

    #[test]
    fn test_used_of_row_ignores_empty_rows() {
        let mut grid = RelativeGrid::new();
        let pm10 = grid.get_or_create_cidx(Topic::Data, "pm10");
        grid.get_or_create_ridx(1).unwrap();
        let ridx = grid.get_or_create_ridx(2).unwrap();
        assert_eq!(grid.used_of_row(), 0);
        grid.set(ridx, pm10, Value::Data(4.0)).unwrap();
        assert_eq!(grid.used_of_row(), 1);
        assert_eq!(grid.used_of_col(Topic::Data), 1);
        assert_eq!(grid.used_of_col(Topic::Meta), 0);
    }

    #[test]
    fn test_filter_reindexes_rows() {
        let mut grid = RelativeGrid::new();
        let label = grid.get_or_create_cidx(Topic::Meta, "label");
        for ts in [30, 10, 20] {
            let ridx = grid.get_or_create_ridx(ts).unwrap();
            grid.set(ridx, label, Value::Meta(format!("t{}", ts))).unwrap();
        }

        let filtered = grid.filter(&RowFilter::allow([(10, 1), (20, 2)]));
        let rows: Vec<_> = filtered.rows().collect();
        assert_eq!(rows, vec![(10, 0), (20, 1)]);
        assert_eq!(filtered.get(0, label), Some(ValueRef::Meta("t10")));
        assert_eq!(filtered.get_ridx(30).unwrap(), None);
    }

    #[test]
    fn test_copy_is_independent() {
        let mut grid = RelativeGrid::new();
        let pm25 = grid.get_or_create_cidx(Topic::Data, "pm25");
        let ridx = grid.get_or_create_ridx(5).unwrap();
        grid.set(ridx, pm25, Value::Data(1.0)).unwrap();

        let mut copy = grid.copy();
        copy.set(ridx, pm25, Value::Data(2.0)).unwrap();
        assert_eq!(grid.get(ridx, pm25), Some(ValueRef::Data(1.0)));
        assert_eq!(copy.get(ridx, pm25), Some(ValueRef::Data(2.0)));
    }

    #[test]
    fn test_encode_decode() {
        let mut grid = RelativeGrid::new();
        let pm25 = grid.get_or_create_cidx(Topic::Data, "pm25");
        grid.get_or_create_cidx(Topic::Meta, "flag");
        for ts in [900, -100, 400] {
            let ridx = grid.get_or_create_ridx(ts).unwrap();
            grid.set(ridx, pm25, Value::Data(ts as f64)).unwrap();
        }

        let decoded = RelativeGrid::decode(&grid.encode().unwrap()).unwrap();
        assert_eq!(decoded.rows().collect::<Vec<_>>(), grid.rows().collect::<Vec<_>>());
        assert_eq!(decoded.columns(), grid.columns());
    }

    #[test]
    fn test_decode_rejects_duplicate_rows() {
        let mut bytes = Vec::new();
        bytes.write_u64::<LittleEndian>(2).unwrap();
        bytes.write_u32::<LittleEndian>(2).unwrap();
        bytes.write_i64::<LittleEndian>(7).unwrap();
        bytes.write_i64::<LittleEndian>(7).unwrap();
        let err = RelativeGrid::decode(&bytes).unwrap_err();
        assert!(matches!(err, DatapointError::InvalidFormat(_)));
    }
}
