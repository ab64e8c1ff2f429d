// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Periodic grid: rows sit on fixed `gap`-sized buckets over `[gte, lte]`.

use super::wire::{expect_end, read_count, read_index, to_u32, write_index};
use super::{Grid, RowFilter, TimeOrder, Timestamp, TopicColumns};
use crate::error::{DatapointError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeSet;
use std::io::Cursor;

/// Time range and interval of a periodic grid, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicRange {
    pub gte: Timestamp,
    pub lte: Timestamp,
    pub gap: i64,
}

impl PeriodicRange {
    pub fn new(gte: Timestamp, lte: Timestamp, gap: i64) -> Self {
        Self { gte, lte, gap }
    }

    /// Number of `gap`-sized buckets spanning `[gte, lte]`.
    pub fn bucket_count(&self) -> Result<usize> {
        if self.gap <= 0 {
            return Err(DatapointError::InvalidRange(format!(
                "gap must be positive, got {}",
                self.gap
            )));
        }
        let span = self
            .lte
            .checked_sub(self.gte)
            .filter(|span| *span >= 0)
            .ok_or_else(|| {
                DatapointError::InvalidRange(format!("lte {} before gte {}", self.lte, self.gte))
            })?;
        (span / self.gap)
            .checked_add(1)
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| DatapointError::InvalidRange(format!("span {} too large", span)))
    }
}

/// Grid whose row index is `round((t - gte) / gap)`.
///
/// Rows always iterate in ascending time.
#[derive(Debug, Clone, PartialEq)]
pub struct PredefinedGrid {
    range: PeriodicRange,
    capacity: usize,
    present: BTreeSet<usize>,
    columns: TopicColumns,
}

impl PredefinedGrid {
    pub fn new(range: PeriodicRange) -> Result<Self> {
        let capacity = range.bucket_count()?;
        Ok(Self {
            range,
            capacity,
            present: BTreeSet::new(),
            columns: TopicColumns::new(),
        })
    }

    pub fn range(&self) -> PeriodicRange {
        self.range
    }

    fn bucket_of(&self, ts: Timestamp) -> Result<usize> {
        let PeriodicRange { gte, lte, gap } = self.range;
        let out_of_range = DatapointError::RowOutOfRange {
            timestamp: ts,
            gte,
            lte,
        };
        if ts < gte || ts > lte {
            return Err(out_of_range);
        }
        // in range, so 0 <= offset <= lte - gte
        let offset = ts - gte;
        let rem = offset % gap;
        let idx = offset / gap + i64::from(rem >= gap - rem);
        match usize::try_from(idx) {
            Ok(idx) if idx < self.capacity => Ok(idx),
            _ => Err(out_of_range),
        }
    }

    fn time_of(&self, ridx: usize) -> Timestamp {
        self.range.gte + ridx as i64 * self.range.gap
    }

    /// Serialize range, allocated rows and columns.
    ///
    /// ```text
    /// gte (8) | lte (8) | gap (8) | row_count (4) | row_idx (8)[] | columns
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(28 + self.present.len() * 8);
        buf.write_i64::<LittleEndian>(self.range.gte)?;
        buf.write_i64::<LittleEndian>(self.range.lte)?;
        buf.write_i64::<LittleEndian>(self.range.gap)?;
        buf.write_u32::<LittleEndian>(to_u32(self.present.len())?)?;
        for ridx in &self.present {
            write_index(&mut buf, *ridx)?;
        }
        self.columns.encode(&mut buf)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = Cursor::new(bytes);
        let range = PeriodicRange {
            gte: r.read_i64::<LittleEndian>()?,
            lte: r.read_i64::<LittleEndian>()?,
            gap: r.read_i64::<LittleEndian>()?,
        };
        let mut grid = Self::new(range)?;

        let row_count = read_count(&mut r, 8)?;
        for _ in 0..row_count {
            let ridx = read_index(&mut r)?;
            if ridx >= grid.capacity || !grid.present.insert(ridx) {
                return Err(DatapointError::InvalidFormat(format!(
                    "bad periodic row index {}",
                    ridx
                )));
            }
        }

        let present = &grid.present;
        grid.columns = TopicColumns::decode(&mut r, |ridx| present.contains(&ridx))?;
        expect_end(&r, "predefined grid")?;
        Ok(grid)
    }
}

impl Grid for PredefinedGrid {
    fn columns(&self) -> &TopicColumns {
        &self.columns
    }

    fn columns_mut(&mut self) -> &mut TopicColumns {
        &mut self.columns
    }

    fn get_ridx(&self, ts: Timestamp) -> Result<Option<usize>> {
        let ridx = self.bucket_of(ts)?;
        Ok(self.present.contains(&ridx).then_some(ridx))
    }

    fn get_or_create_ridx(&mut self, ts: Timestamp) -> Result<usize> {
        let ridx = self.bucket_of(ts)?;
        if self.present.insert(ridx) && self.time_of(ridx) != ts {
            tracing::warn!(
                "snapped timestamp {} to bucket {} ({})",
                ts,
                ridx,
                self.time_of(ridx)
            );
        }
        Ok(ridx)
    }

    fn rows(&self) -> Box<dyn Iterator<Item = (Timestamp, usize)> + '_> {
        Box::new(self.present.iter().map(|ridx| (self.time_of(*ridx), *ridx)))
    }

    fn row_at(&self, ridx: usize) -> Option<Timestamp> {
        self.present.contains(&ridx).then(|| self.time_of(ridx))
    }

    fn capacity_of_row(&self) -> usize {
        self.capacity
    }

    fn time_order(&self) -> TimeOrder {
        TimeOrder::Ascending
    }

    fn filter(&self, filter: &RowFilter<'_>) -> Self {
        let present: BTreeSet<usize> = self
            .rows()
            .filter(|(ts, ridx)| filter.keeps(*ts, *ridx))
            .map(|(_, ridx)| ridx)
            .collect();
        let mapping: Vec<(usize, usize)> = present.iter().map(|ridx| (*ridx, *ridx)).collect();
        Self {
            range: self.range,
            capacity: self.capacity,
            columns: self.columns.remap_rows(&mapping),
            present,
        }
    }
}
