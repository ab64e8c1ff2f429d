// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environmental sensor datapoints
//!
//! Readings of one device held in a sparse time-indexed grid, with
//! converters to and from three external representations:
//! - Binary (self-describing, base64 carried)
//! - Legacy (one JSON record per timestamp, epoch seconds)
//! - Compact (JSON column names plus positional rows, epoch milliseconds)
//!
//! # Quick Start
//!
//! ```
//! use datapoints::{Datapoint, Device, Grid, Sizing, Topic, Value};
//!
//! let device = Device::new("OZ-1", "POLLUDRONE")?;
//! let mut dp = Datapoint::unperiodic(device, 1, &Sizing::new(vec!["pm25".to_string()], 0usize));
//! let grid = dp.grid_mut();
//! let pm25 = grid.get_or_create_cidx(Topic::Data, "pm25");
//! let row = grid.get_or_create_ridx(1_700_000_000_000)?;
//! grid.set(row, pm25, Value::Data(12.5))?;
//!
//! let text = dp.to_base64()?;
//! assert_eq!(Datapoint::from_base64(&text)?, dp);
//! # Ok::<(), datapoints::DatapointError>(())
//! ```
//!
//! # Grid Variants
//!
//! | Variant | Row index | Row order | Picked by decoders when |
//! |---------|-----------|-----------|-------------------------|
//! | Predefined | `round((t - gte) / gap)` | ascending | packing ratio >= 0.7 |
//! | Relative | arrival order | insertion | sparse, irregular or single point |

pub mod codec;
pub mod datapoint;
pub mod device;
pub mod error;
pub mod grid;
pub mod inference;

pub use codec::{
    Base64Codec, BinaryCodec, Codec, Compact, CompactCodec, CompactRow, Legacy, LegacyCodec,
    LegacyPayload, LegacyRecord,
};
pub use datapoint::{ColumnSizing, Datapoint, GridVariant, Sizing};
pub use device::Device;
pub use error::{DatapointError, Result};
pub use grid::predefined::PeriodicRange;
pub use grid::{
    ColIdx, Grid, PredefinedGrid, RelativeGrid, RowFilter, TimeOrder, Timestamp, Topic, Value,
    ValueRef,
};
pub use inference::{hcf, Layout, PACKING_THRESHOLD};
