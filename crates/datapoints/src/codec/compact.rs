// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compact representation: column names once, then positional rows.
//!
//! ```json
//! { "deviceId": "OZ-1", "deviceType": "POLLUDRONE",
//!   "keys": ["pm25", "pm10"], "labels": ["status"],
//!   "data": [[1700000060000, [12.5, null], ["ok"]]] }
//! ```

use super::{newest_first, unique_in_order, Codec};
use crate::datapoint::{Datapoint, Sizing};
use crate::device::Device;
use crate::error::{DatapointError, Result};
use crate::grid::{ColIdx, Grid, Timestamp, Topic, Value, ValueRef};
use crate::inference::Layout;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// `[epoch_ms, values positional to keys, labels positional to labels]`.
pub type CompactRow = (Timestamp, Vec<Option<f64>>, Vec<Option<String>>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compact {
    pub device_id: String,
    pub device_type: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<CompactRow>,
}

/// Datapoint <-> compact payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactCodec;

impl Codec for CompactCodec {
    type Repr = Compact;

    fn encode(&self, dp: &Datapoint) -> Result<Compact> {
        let grid = dp.grid();
        let data: Vec<_> = grid.cols(Topic::Data).collect();
        let meta: Vec<_> = grid.cols(Topic::Meta).collect();

        let rows: Vec<CompactRow> = grid
            .rows()
            .map(|(ts, ridx)| {
                let values = data
                    .iter()
                    .map(|(_, cidx)| grid.get(ridx, *cidx).and_then(|v| v.as_f64()))
                    .collect();
                let labels = meta
                    .iter()
                    .map(|(_, cidx)| match grid.get(ridx, *cidx) {
                        Some(ValueRef::Meta(s)) => Some(s.to_string()),
                        _ => None,
                    })
                    .collect();
                (ts, values, labels)
            })
            .collect();

        let payload = Compact {
            device_id: dp.device_id().to_string(),
            device_type: dp.device_type().to_string(),
            keys: data.iter().map(|(k, _)| (*k).to_string()).collect(),
            labels: meta.iter().map(|(k, _)| (*k).to_string()).collect(),
            data: newest_first(rows, dp.variant(), |(ts, _, _)| *ts),
        };
        tracing::trace!("encoded {} as {} compact rows", dp.device(), payload.data.len());
        Ok(payload)
    }

    fn decode(&self, payload: &Compact) -> Result<Datapoint> {
        let device = Device::new(payload.device_id.as_str(), payload.device_type.as_str())?;

        for (row, (_, values, labels)) in payload.data.iter().enumerate() {
            check_arity(row, Topic::Data, payload.keys.len(), values.len())?;
            check_arity(row, Topic::Meta, payload.labels.len(), labels.len())?;
        }
        if payload.data.is_empty() {
            return Ok(Datapoint::empty(device));
        }

        let keys = unique_in_order(payload.keys.iter().map(String::as_str));
        let labels = unique_in_order(payload.labels.iter().map(String::as_str));
        let times: Vec<Timestamp> = payload.data.iter().map(|(ts, _, _)| *ts).collect();

        let mut dp = Layout::infer(&times).build(device, &Sizing::new(keys, labels))?;
        let grid = dp.grid_mut();
        let key_cols = first_positions(grid, Topic::Data, &payload.keys);
        let label_cols = first_positions(grid, Topic::Meta, &payload.labels);

        for (ts, values, labels) in &payload.data {
            let ridx = grid.get_or_create_ridx(*ts)?;
            for (cidx, v) in key_cols.iter().zip(values) {
                if let (Some(cidx), Some(v)) = (cidx, v) {
                    grid.set(ridx, *cidx, Value::Data(*v))?;
                }
            }
            for (cidx, v) in label_cols.iter().zip(labels) {
                if let (Some(cidx), Some(v)) = (cidx, v) {
                    grid.set(ridx, *cidx, Value::Meta(v.clone()))?;
                }
            }
        }

        tracing::trace!("decoded {} compact rows into {}", payload.data.len(), dp);
        Ok(dp)
    }
}

/// Column for each position of `names`. A repeated name maps only at its
/// first position; later positions are skipped.
fn first_positions(grid: &mut dyn Grid, topic: Topic, names: &[String]) -> Vec<Option<ColIdx>> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| seen.insert(name.as_str()).then(|| grid.get_or_create_cidx(topic, name)))
        .collect()
}

fn check_arity(row: usize, topic: Topic, expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(DatapointError::ArityMismatch {
            row,
            topic,
            expected,
            got,
        })
    }
}
