// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datapoint: a device identity wrapped around one exclusively owned grid.

use crate::device::Device;
use crate::error::Result;
use crate::grid::predefined::PeriodicRange;
use crate::grid::{Grid, PredefinedGrid, RelativeGrid, RowFilter, TimeOrder, Topic};
use std::fmt;

/// Closed set of grid variants a datapoint can be backed by.
#[derive(Debug, Clone, PartialEq)]
pub enum GridVariant {
    /// Fixed-interval rows, ascending order guaranteed.
    Predefined(PredefinedGrid),
    /// Arbitrary rows, insertion order.
    Relative(RelativeGrid),
}

impl GridVariant {
    /// Discriminator written into the binary representation.
    pub fn tag(&self) -> &'static str {
        match self {
            GridVariant::Predefined(_) => PREDEFINED_TAG,
            GridVariant::Relative(_) => RELATIVE_TAG,
        }
    }

    pub fn as_grid(&self) -> &dyn Grid {
        match self {
            GridVariant::Predefined(g) => g,
            GridVariant::Relative(g) => g,
        }
    }

    pub fn as_grid_mut(&mut self) -> &mut dyn Grid {
        match self {
            GridVariant::Predefined(g) => g,
            GridVariant::Relative(g) => g,
        }
    }

    fn filter(&self, filter: &RowFilter<'_>) -> Self {
        match self {
            GridVariant::Predefined(g) => GridVariant::Predefined(g.filter(filter)),
            GridVariant::Relative(g) => GridVariant::Relative(g.filter(filter)),
        }
    }
}

pub const PREDEFINED_TAG: &str = "predefined";
pub const RELATIVE_TAG: &str = "relative";

/// Column sizing for one topic at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSizing {
    /// Reserve this many unnamed column slots.
    Count(usize),
    /// Reserve and bind these keys, in order.
    Keys(Vec<String>),
}

impl Default for ColumnSizing {
    fn default() -> Self {
        ColumnSizing::Count(0)
    }
}

impl From<usize> for ColumnSizing {
    fn from(n: usize) -> Self {
        ColumnSizing::Count(n)
    }
}

impl From<Vec<String>> for ColumnSizing {
    fn from(keys: Vec<String>) -> Self {
        ColumnSizing::Keys(keys)
    }
}

/// Column sizing for both topics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sizing {
    pub data: ColumnSizing,
    pub meta: ColumnSizing,
}

impl Sizing {
    pub fn new(data: impl Into<ColumnSizing>, meta: impl Into<ColumnSizing>) -> Self {
        Self {
            data: data.into(),
            meta: meta.into(),
        }
    }

    fn apply(&self, grid: &mut dyn Grid) {
        for (topic, sizing) in [(Topic::Data, &self.data), (Topic::Meta, &self.meta)] {
            match sizing {
                ColumnSizing::Count(n) => grid.expand_col(topic, *n),
                ColumnSizing::Keys(keys) => {
                    grid.expand_col(topic, keys.len());
                    for key in keys {
                        grid.get_or_create_cidx(topic, key);
                    }
                }
            }
        }
    }
}

/// Sensor readings of one device.
///
/// Only grid contents change after construction; the identity is fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    device: Device,
    grid: GridVariant,
}

impl Datapoint {
    pub fn from_parts(device: Device, grid: GridVariant) -> Self {
        Self { device, grid }
    }

    /// Datapoint for readings at a known, exact interval.
    pub fn periodic(device: Device, range: PeriodicRange, sizing: &Sizing) -> Result<Self> {
        let mut grid = PredefinedGrid::new(range)?;
        sizing.apply(&mut grid);
        Ok(Self::from_parts(device, GridVariant::Predefined(grid)))
    }

    /// Datapoint for irregular readings, pre-sized for `count` points.
    pub fn unperiodic(device: Device, count: usize, sizing: &Sizing) -> Self {
        let mut grid = RelativeGrid::with_capacity(count);
        sizing.apply(&mut grid);
        Self::from_parts(device, GridVariant::Relative(grid))
    }

    /// Datapoint holding a single measurement.
    pub fn single(device: Device, sizing: &Sizing) -> Self {
        Self::unperiodic(device, 1, sizing)
    }

    pub fn empty(device: Device) -> Self {
        Self::from_parts(device, GridVariant::Relative(RelativeGrid::new()))
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn device_id(&self) -> &str {
        self.device.device_id()
    }

    pub fn device_type(&self) -> &str {
        self.device.device_type()
    }

    pub fn variant(&self) -> &GridVariant {
        &self.grid
    }

    pub fn into_parts(self) -> (Device, GridVariant) {
        (self.device, self.grid)
    }

    pub fn grid(&self) -> &dyn Grid {
        self.grid.as_grid()
    }

    pub fn grid_mut(&mut self) -> &mut dyn Grid {
        self.grid.as_grid_mut()
    }

    pub fn time_order(&self) -> TimeOrder {
        self.grid().time_order()
    }

    /// No used rows, or no used columns in either topic.
    pub fn is_empty(&self) -> bool {
        let grid = self.grid();
        grid.used_of_row() == 0
            || (grid.used_of_col(Topic::Data) == 0 && grid.used_of_col(Topic::Meta) == 0)
    }

    /// At least one used row and at least one used column in some topic.
    pub fn is_not_empty(&self) -> bool {
        let grid = self.grid();
        grid.used_of_row() != 0
            && (grid.used_of_col(Topic::Data) != 0 || grid.used_of_col(Topic::Meta) != 0)
    }

    /// Deep copy backed by the same variant.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Copy keeping only the selected rows, backed by the same variant.
    pub fn filter(&self, filter: &RowFilter<'_>) -> Self {
        Self {
            device: self.device.clone(),
            grid: self.grid.filter(filter),
        }
    }
}

impl fmt::Display for Datapoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.grid();
        write!(
            f,
            "{} [{}] rows={} data={} meta={}",
            self.device,
            self.grid.tag(),
            grid.rows().count(),
            grid.cols(Topic::Data).count(),
            grid.cols(Topic::Meta).count()
        )
    }
}
