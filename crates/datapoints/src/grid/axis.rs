// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Column storage shared by both grid variants.

use super::wire::{
    read_capacity, read_count, read_index, read_str, to_u32, write_capacity, write_index,
    write_str, CellValue,
};
use super::{ColIdx, Topic, Value, ValueRef};
use crate::error::{DatapointError, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;

/// Most slots allocated up front from a sizing hint; larger hints are
/// recorded as capacity and filled on demand.
pub(crate) const MAX_RESERVE: usize = 4096;

/// One column namespace: keys bound append-only to indices, and sparse
/// cells per column keyed by row index.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAxis<T> {
    keys: Vec<String>,
    lookup: HashMap<String, usize>,
    cells: Vec<BTreeMap<usize, T>>,
    capacity: usize,
}

impl<T> Default for KeyAxis<T> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            lookup: HashMap::new(),
            cells: Vec::new(),
            capacity: 0,
        }
    }
}

impl<T: CellValue> KeyAxis<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(&mut self, count: usize) {
        let reserve = count.min(MAX_RESERVE);
        self.keys.reserve(reserve);
        self.cells.reserve(reserve);
        self.capacity = self.capacity.saturating_add(count);
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.lookup.get(key).copied()
    }

    pub fn bind(&mut self, key: &str) -> usize {
        if let Some(idx) = self.index_of(key) {
            return idx;
        }
        let idx = self.keys.len();
        self.keys.push(key.to_string());
        self.lookup.insert(key.to_string(), idx);
        self.cells.push(BTreeMap::new());
        self.capacity = self.capacity.max(self.keys.len());
        idx
    }

    pub fn key_at(&self, cidx: usize) -> Option<&str> {
        self.keys.get(cidx).map(String::as_str)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Number of bound keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, ridx: usize, cidx: usize) -> Option<&T> {
        self.cells.get(cidx)?.get(&ridx)
    }

    fn column_mut(&mut self, topic: Topic, cidx: usize) -> Result<&mut BTreeMap<usize, T>> {
        let bound = self.keys.len();
        self.cells
            .get_mut(cidx)
            .ok_or(DatapointError::ColumnIndexOutOfBounds { topic, cidx, bound })
    }

    pub fn set(&mut self, topic: Topic, ridx: usize, cidx: usize, value: T) -> Result<()> {
        self.column_mut(topic, cidx)?.insert(ridx, value);
        Ok(())
    }

    pub fn del(&mut self, ridx: usize, cidx: usize) {
        if let Some(column) = self.cells.get_mut(cidx) {
            column.remove(&ridx);
        }
    }

    /// Columns holding at least one value.
    pub fn used(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn row_has_value(&self, ridx: usize) -> bool {
        self.cells.iter().any(|c| c.contains_key(&ridx))
    }

    /// Copy of this axis with the same bindings, keeping only the rows in
    /// `mapping` and moving each from its old index to its new one.
    pub fn remap_rows(&self, mapping: &[(usize, usize)]) -> Self {
        let cells = self
            .cells
            .iter()
            .map(|column| {
                mapping
                    .iter()
                    .filter_map(|(old, new)| column.get(old).map(|v| (*new, v.clone())))
                    .collect()
            })
            .collect();
        Self {
            keys: self.keys.clone(),
            lookup: self.lookup.clone(),
            cells,
            capacity: self.capacity,
        }
    }

    /// Serialize bindings and set cells.
    ///
    /// ```text
    /// capacity (8) | key_count (4) | key[] (len-prefixed UTF-8)
    /// per column: cell_count (4) | (row_idx (8) | value)[]
    /// ```
    pub(crate) fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_capacity(buf, self.capacity)?;
        buf.write_u32::<LittleEndian>(to_u32(self.keys.len())?)?;
        for key in &self.keys {
            write_str(buf, key)?;
        }
        for column in &self.cells {
            buf.write_u32::<LittleEndian>(to_u32(column.len())?)?;
            for (ridx, value) in column {
                write_index(buf, *ridx)?;
                value.write_to(buf)?;
            }
        }
        Ok(())
    }

    /// Inverse of [`KeyAxis::encode`]. `row_ok` rejects row indices the
    /// owning grid never allocated.
    pub(crate) fn decode(
        r: &mut Cursor<&[u8]>,
        row_ok: impl Fn(usize) -> bool,
    ) -> Result<Self> {
        let capacity = read_capacity(r)?;
        let key_count = read_count(r, 4)?;
        let mut axis = Self::new();
        for _ in 0..key_count {
            let key = read_str(r)?;
            if axis.index_of(&key).is_some() {
                return Err(DatapointError::InvalidFormat(format!(
                    "duplicate column key {:?}",
                    key
                )));
            }
            axis.bind(&key);
        }
        axis.capacity = capacity.max(axis.keys.len());

        for cidx in 0..key_count {
            let cell_count = read_count(r, 8 + T::MIN_WIRE_SIZE)?;
            for _ in 0..cell_count {
                let ridx = read_index(r)?;
                if !row_ok(ridx) {
                    return Err(DatapointError::InvalidFormat(format!(
                        "cell references unallocated row {}",
                        ridx
                    )));
                }
                let value = T::read_from(r)?;
                axis.cells[cidx].insert(ridx, value);
            }
        }
        Ok(axis)
    }
}

/// Both topic namespaces of a grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicColumns {
    data: KeyAxis<f64>,
    meta: KeyAxis<String>,
}

impl TopicColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &KeyAxis<f64> {
        &self.data
    }

    pub fn meta(&self) -> &KeyAxis<String> {
        &self.meta
    }

    pub fn expand(&mut self, topic: Topic, count: usize) {
        match topic {
            Topic::Data => self.data.expand(count),
            Topic::Meta => self.meta.expand(count),
        }
    }

    pub fn index_of(&self, topic: Topic, key: &str) -> Option<ColIdx> {
        let index = match topic {
            Topic::Data => self.data.index_of(key),
            Topic::Meta => self.meta.index_of(key),
        }?;
        Some(ColIdx::new(topic, index))
    }

    pub fn bind(&mut self, topic: Topic, key: &str) -> ColIdx {
        let index = match topic {
            Topic::Data => self.data.bind(key),
            Topic::Meta => self.meta.bind(key),
        };
        ColIdx::new(topic, index)
    }

    pub fn key_at(&self, cidx: ColIdx) -> Option<&str> {
        match cidx.topic {
            Topic::Data => self.data.key_at(cidx.index),
            Topic::Meta => self.meta.key_at(cidx.index),
        }
    }

    pub fn iter(&self, topic: Topic) -> Box<dyn Iterator<Item = (&str, ColIdx)> + '_> {
        let keys = match topic {
            Topic::Data => self.data.keys(),
            Topic::Meta => self.meta.keys(),
        };
        Box::new(
            keys.iter()
                .enumerate()
                .map(move |(index, key)| (key.as_str(), ColIdx::new(topic, index))),
        )
    }

    pub fn capacity(&self, topic: Topic) -> usize {
        match topic {
            Topic::Data => self.data.capacity(),
            Topic::Meta => self.meta.capacity(),
        }
    }

    pub fn get(&self, ridx: usize, cidx: ColIdx) -> Option<ValueRef<'_>> {
        match cidx.topic {
            Topic::Data => self.data.get(ridx, cidx.index).map(|v| ValueRef::Data(*v)),
            Topic::Meta => self
                .meta
                .get(ridx, cidx.index)
                .map(|v| ValueRef::Meta(v.as_str())),
        }
    }

    pub fn set(&mut self, ridx: usize, cidx: ColIdx, value: Value) -> Result<()> {
        match (cidx.topic, value) {
            (Topic::Data, Value::Data(v)) => self.data.set(Topic::Data, ridx, cidx.index, v),
            (Topic::Meta, Value::Meta(v)) => self.meta.set(Topic::Meta, ridx, cidx.index, v),
            (expected, value) => Err(DatapointError::TopicMismatch {
                expected,
                got: value.topic(),
            }),
        }
    }

    pub fn del(&mut self, ridx: usize, cidx: ColIdx) {
        match cidx.topic {
            Topic::Data => self.data.del(ridx, cidx.index),
            Topic::Meta => self.meta.del(ridx, cidx.index),
        }
    }

    pub fn used(&self, topic: Topic) -> usize {
        match topic {
            Topic::Data => self.data.used(),
            Topic::Meta => self.meta.used(),
        }
    }

    pub fn row_has_value(&self, ridx: usize) -> bool {
        self.data.row_has_value(ridx) || self.meta.row_has_value(ridx)
    }

    pub fn remap_rows(&self, mapping: &[(usize, usize)]) -> Self {
        Self {
            data: self.data.remap_rows(mapping),
            meta: self.meta.remap_rows(mapping),
        }
    }

    pub(crate) fn encode(&self, buf: &mut Vec<u8>) -> Result<()> {
        self.data.encode(buf)?;
        self.meta.encode(buf)
    }

    pub(crate) fn decode(r: &mut Cursor<&[u8]>, row_ok: impl Fn(usize) -> bool) -> Result<Self> {
        let data = KeyAxis::decode(r, &row_ok)?;
        let meta = KeyAxis::decode(r, &row_ok)?;
        Ok(Self { data, meta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_is_idempotent() {
        let mut axis: KeyAxis<f64> = KeyAxis::new();
        let first = axis.bind("pm25");
        let second = axis.bind("pm10");
        assert_eq!(axis.bind("pm25"), first);
        assert_eq!(axis.bind("pm10"), second);
        assert_eq!(axis.len(), 2);
    }

    #[test]
    fn test_expand_never_shrinks() {
        let mut axis: KeyAxis<String> = KeyAxis::new();
        axis.expand(3);
        assert_eq!(axis.capacity(), 3);
        axis.bind("a");
        axis.expand(0);
        assert_eq!(axis.capacity(), 3);
        for key in ["b", "c", "d"] {
            axis.bind(key);
        }
        assert_eq!(axis.capacity(), 4);
    }

    #[test]
    fn test_huge_hint_only_records_capacity() {
        let mut axis: KeyAxis<f64> = KeyAxis::new();
        axis.expand(usize::MAX);
        axis.expand(10);
        assert_eq!(axis.capacity(), usize::MAX);
        assert_eq!(axis.bind("pm25"), 0);
    }

    #[test]
    fn test_saturated_capacity_survives_wire() {
        let mut columns = TopicColumns::new();
        columns.expand(Topic::Meta, usize::MAX);
        let mut buf = Vec::new();
        columns.encode(&mut buf).unwrap();
        let decoded = TopicColumns::decode(&mut Cursor::new(&buf[..]), |_| true).unwrap();
        assert_eq!(decoded.capacity(Topic::Meta), usize::MAX);
    }

    #[test]
    fn test_used_counts_columns_with_values() {
        let mut columns = TopicColumns::new();
        let pm25 = columns.bind(Topic::Data, "pm25");
        columns.bind(Topic::Data, "pm10");
        assert_eq!(columns.used(Topic::Data), 0);

        columns.set(0, pm25, Value::Data(12.0)).unwrap();
        assert_eq!(columns.used(Topic::Data), 1);
        assert!(columns.row_has_value(0));

        columns.del(0, pm25);
        assert_eq!(columns.used(Topic::Data), 0);
        assert!(!columns.row_has_value(0));
    }

    #[test]
    fn test_set_rejects_wrong_topic() {
        let mut columns = TopicColumns::new();
        let status = columns.bind(Topic::Meta, "status");
        let err = columns.set(0, status, Value::Data(1.0)).unwrap_err();
        assert!(matches!(
            err,
            DatapointError::TopicMismatch {
                expected: Topic::Meta,
                got: Topic::Data
            }
        ));
    }

    #[test]
    fn test_set_rejects_unbound_column() {
        let mut columns = TopicColumns::new();
        let err = columns
            .set(0, ColIdx::new(Topic::Data, 4), Value::Data(1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            DatapointError::ColumnIndexOutOfBounds { cidx: 4, .. }
        ));
    }

    #[test]
    fn test_remap_rows_keeps_layout() {
        let mut columns = TopicColumns::new();
        let pm25 = columns.bind(Topic::Data, "pm25");
        let status = columns.bind(Topic::Meta, "status");
        columns.set(0, pm25, Value::Data(1.0)).unwrap();
        columns.set(1, pm25, Value::Data(2.0)).unwrap();
        columns.set(2, status, Value::Meta("ok".into())).unwrap();

        let remapped = columns.remap_rows(&[(2, 0), (1, 1)]);
        assert_eq!(remapped.index_of(Topic::Data, "pm25"), Some(pm25));
        assert_eq!(remapped.get(0, status), Some(ValueRef::Meta("ok")));
        assert_eq!(remapped.get(1, pm25), Some(ValueRef::Data(2.0)));
        assert_eq!(remapped.get(0, pm25), None);
    }

    #[test]
    fn test_wire_roundtrip() {
        let mut columns = TopicColumns::new();
        columns.expand(Topic::Data, 4);
        let pm25 = columns.bind(Topic::Data, "pm25");
        let flag = columns.bind(Topic::Meta, "flag");
        columns.set(3, pm25, Value::Data(-0.5)).unwrap();
        columns.set(7, flag, Value::Meta("calibrating".into())).unwrap();

        let mut buf = Vec::new();
        columns.encode(&mut buf).unwrap();
        let decoded = TopicColumns::decode(&mut Cursor::new(&buf[..]), |r| r < 8).unwrap();
        assert_eq!(decoded, columns);
    }

    #[test]
    fn test_decode_rejects_unallocated_row() {
        let mut columns = TopicColumns::new();
        let pm25 = columns.bind(Topic::Data, "pm25");
        columns.set(9, pm25, Value::Data(1.0)).unwrap();

        let mut buf = Vec::new();
        columns.encode(&mut buf).unwrap();
        let err = TopicColumns::decode(&mut Cursor::new(&buf[..]), |r| r < 5).unwrap_err();
        assert!(matches!(err, DatapointError::InvalidFormat(_)));
    }
}
