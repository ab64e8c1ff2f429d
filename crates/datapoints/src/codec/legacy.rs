// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Legacy representation: one JSON record per timestamp.
//!
//! ```json
//! [{ "deviceId": "OZ-1", "deviceType": "POLLUDRONE",
//!    "payload": { "t": 1700000060.0,
//!                 "d": { "pm25": 12.5, "t": 1700000060.0 },
//!                 "s": { "status": "ok" } } }]
//! ```
//!
//! `payload.t` is in seconds; `d.t` repeats it and is not a column.

use super::{newest_first, unique_in_order, Codec};
use crate::datapoint::{Datapoint, Sizing};
use crate::device::Device;
use crate::error::{DatapointError, Result};
use crate::grid::{Timestamp, Topic, Value, ValueRef};
use crate::inference::Layout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key inside `payload.d` that duplicates the record time.
pub const EMBEDDED_TIME_KEY: &str = "t";

/// One reading of one device at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub device_id: String,
    pub device_type: String,
    pub payload: LegacyPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyPayload {
    /// Epoch seconds.
    pub t: f64,
    #[serde(default)]
    pub d: BTreeMap<String, f64>,
    #[serde(default)]
    pub s: BTreeMap<String, String>,
}

pub type Legacy = Vec<LegacyRecord>;

/// Epoch seconds to milliseconds, rounded to the nearest millisecond.
///
/// Fails for non-finite seconds and for values outside the `i64` range.
pub fn seconds_to_millis(t: f64) -> Result<Timestamp> {
    // 2^63 is exact as f64; i64::MAX is not
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let ms = (t * 1000.0).round();
    if ms.is_finite() && (-LIMIT..LIMIT).contains(&ms) {
        Ok(ms as Timestamp)
    } else {
        Err(DatapointError::InvalidFormat(format!(
            "timestamp {} s is out of range",
            t
        )))
    }
}

pub fn millis_to_seconds(ts: Timestamp) -> f64 {
    ts as f64 / 1000.0
}

/// Datapoint <-> legacy records.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyCodec;

impl Codec for LegacyCodec {
    type Repr = Legacy;

    fn encode(&self, dp: &Datapoint) -> Result<Legacy> {
        let grid = dp.grid();
        let data: Vec<_> = grid.cols(Topic::Data).collect();
        let meta: Vec<_> = grid.cols(Topic::Meta).collect();

        let records: Vec<(Timestamp, LegacyRecord)> = grid
            .rows()
            .map(|(ts, ridx)| {
                let t = millis_to_seconds(ts);
                let mut payload = LegacyPayload {
                    t,
                    ..Default::default()
                };
                for (key, cidx) in &data {
                    if let Some(ValueRef::Data(v)) = grid.get(ridx, *cidx) {
                        payload.d.insert((*key).to_string(), v);
                    }
                }
                payload.d.insert(EMBEDDED_TIME_KEY.to_string(), t);
                for (label, cidx) in &meta {
                    if let Some(ValueRef::Meta(v)) = grid.get(ridx, *cidx) {
                        payload.s.insert((*label).to_string(), v.to_string());
                    }
                }
                let record = LegacyRecord {
                    device_id: dp.device_id().to_string(),
                    device_type: dp.device_type().to_string(),
                    payload,
                };
                (ts, record)
            })
            .collect();

        let records = newest_first(records, dp.variant(), |(ts, _)| *ts);
        tracing::trace!("encoded {} as {} legacy records", dp.device(), records.len());
        Ok(records.into_iter().map(|(_, record)| record).collect())
    }

    fn decode(&self, records: &Legacy) -> Result<Datapoint> {
        let Some(first) = records.first() else {
            return Err(DatapointError::EmptyInput("legacy"));
        };
        let device = Device::new(first.device_id.as_str(), first.device_type.as_str())?;
        if let Some(other) = records
            .iter()
            .find(|r| r.device_id != first.device_id || r.device_type != first.device_type)
        {
            tracing::warn!(
                "legacy batch mixes devices, keeping {} and ignoring {}/{}",
                device,
                other.device_type,
                other.device_id
            );
        }

        let keys = unique_in_order(
            records
                .iter()
                .flat_map(|r| r.payload.d.keys().map(String::as_str))
                .filter(|k| *k != EMBEDDED_TIME_KEY),
        );
        let labels = unique_in_order(
            records
                .iter()
                .flat_map(|r| r.payload.s.keys().map(String::as_str)),
        );
        let times: Vec<Timestamp> = records
            .iter()
            .map(|r| seconds_to_millis(r.payload.t))
            .collect::<Result<_>>()?;

        let mut dp = Layout::infer(&times).build(device, &Sizing::new(keys, labels))?;
        let grid = dp.grid_mut();
        for (record, ts) in records.iter().zip(&times) {
            let ridx = grid.get_or_create_ridx(*ts)?;
            for (key, v) in &record.payload.d {
                if key == EMBEDDED_TIME_KEY {
                    continue;
                }
                let cidx = grid.get_or_create_cidx(Topic::Data, key);
                grid.set(ridx, cidx, Value::Data(*v))?;
            }
            for (label, v) in &record.payload.s {
                let cidx = grid.get_or_create_cidx(Topic::Meta, label);
                grid.set(ridx, cidx, Value::Meta(v.clone()))?;
            }
        }

        tracing::trace!("decoded {} legacy records into {}", records.len(), dp);
        Ok(dp)
    }
}
