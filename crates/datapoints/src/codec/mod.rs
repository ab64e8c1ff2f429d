// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Converters between [`Datapoint`] and its external representations.
//!
//! | Representation | Type | Carrier |
//! |----------------|------|---------|
//! | Binary | `Vec<u8>` | base64 text |
//! | Legacy | [`Legacy`] | JSON, one record per timestamp |
//! | Compact | [`Compact`] | JSON, positional arrays |
//!
//! `decode(encode(x))` reproduces device identity and every
//! `(timestamp, topic, key) -> value` cell of `x`. Row order survives only
//! through the binary form; the JSON forms are emitted newest first.

pub mod binary;
pub mod compact;
pub mod legacy;

pub use binary::{Base64Codec, BinaryCodec};
pub use compact::{Compact, CompactCodec, CompactRow};
pub use legacy::{Legacy, LegacyCodec, LegacyPayload, LegacyRecord};

use crate::datapoint::{Datapoint, GridVariant};
use crate::error::Result;
use crate::grid::Timestamp;

/// A bidirectional converter.
pub trait Codec {
    /// External representation.
    type Repr;

    fn encode(&self, dp: &Datapoint) -> Result<Self::Repr>;

    fn decode(&self, repr: &Self::Repr) -> Result<Datapoint>;
}

/// Put rows newest first. Periodic grids iterate ascending, so reversing
/// is enough; irregular grids need an explicit sort.
pub(crate) fn newest_first<T>(
    mut rows: Vec<T>,
    variant: &GridVariant,
    ts_of: impl Fn(&T) -> Timestamp,
) -> Vec<T> {
    match variant {
        GridVariant::Predefined(_) => rows.reverse(),
        GridVariant::Relative(_) => rows.sort_by(|a, b| ts_of(b).cmp(&ts_of(a))),
    }
    rows
}

/// Keys in first-seen order without duplicates.
pub(crate) fn unique_in_order<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    keys.into_iter()
        .filter(|k| seen.insert(*k))
        .map(str::to_string)
        .collect()
}

impl Datapoint {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        BinaryCodec.encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        BinaryCodec.decode_slice(bytes)
    }

    pub fn to_base64(&self) -> Result<String> {
        Base64Codec.encode(self)
    }

    pub fn from_base64(text: &str) -> Result<Self> {
        Base64Codec.decode_str(text)
    }

    pub fn to_legacy(&self) -> Result<Legacy> {
        LegacyCodec.encode(self)
    }

    pub fn from_legacy(records: &Legacy) -> Result<Self> {
        LegacyCodec.decode(records)
    }

    pub fn to_compact(&self) -> Result<Compact> {
        CompactCodec.encode(self)
    }

    pub fn from_compact(payload: &Compact) -> Result<Self> {
        CompactCodec.decode(payload)
    }
}
