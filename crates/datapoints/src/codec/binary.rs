// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary representation and its base64 text carrier.
//!
//! # Layout
//!
//! ```text
//! section count (4) = 2
//! section 0: string list [device_id, device_type, variant_tag]
//! section 1: grid bytes (layout chosen by variant_tag)
//! ```
//!
//! All integers are little-endian. The grid section is self-describing:
//! row axis first, then the data and meta columns.

use super::Codec;
use crate::datapoint::{Datapoint, GridVariant, PREDEFINED_TAG, RELATIVE_TAG};
use crate::device::Device;
use crate::error::{DatapointError, Result};
use crate::grid::wire::{decode_sections, decode_string_list, encode_sections, encode_string_list};
use crate::grid::{PredefinedGrid, RelativeGrid};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::io;

/// Datapoint <-> raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    /// Decode from a borrowed slice.
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Datapoint> {
        decode_payload(bytes).map_err(truncation_to_format)
    }
}

impl Codec for BinaryCodec {
    type Repr = Vec<u8>;

    fn encode(&self, dp: &Datapoint) -> Result<Vec<u8>> {
        let variant = dp.variant();
        let identity = encode_string_list(&[dp.device_id(), dp.device_type(), variant.tag()])?;
        let grid = match variant {
            GridVariant::Predefined(g) => g.encode()?,
            GridVariant::Relative(g) => g.encode()?,
        };
        let bytes = encode_sections(&[&identity, &grid])?;

        tracing::trace!(
            "encoded {} [{}]: {} rows, {} bytes",
            dp.device(),
            variant.tag(),
            dp.grid().rows().count(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn decode(&self, bytes: &Vec<u8>) -> Result<Datapoint> {
        self.decode_slice(bytes)
    }
}

/// Datapoint <-> base64 text (standard alphabet, padded).
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl Base64Codec {
    pub fn decode_str(&self, text: &str) -> Result<Datapoint> {
        let bytes = STANDARD.decode(text.trim())?;
        BinaryCodec.decode_slice(&bytes)
    }
}

impl Codec for Base64Codec {
    type Repr = String;

    fn encode(&self, dp: &Datapoint) -> Result<String> {
        Ok(STANDARD.encode(BinaryCodec.encode(dp)?))
    }

    fn decode(&self, text: &String) -> Result<Datapoint> {
        self.decode_str(text)
    }
}

fn decode_payload(bytes: &[u8]) -> Result<Datapoint> {
    let sections = decode_sections(bytes)?;
    let [identity, grid] = sections.as_slice() else {
        return Err(DatapointError::InvalidFormat(format!(
            "expected 2 sections, found {}",
            sections.len()
        )));
    };

    let fields = decode_string_list(identity)?;
    let [device_id, device_type, tag] = fields.as_slice() else {
        return Err(DatapointError::InvalidFormat(format!(
            "expected 3 identity strings, found {}",
            fields.len()
        )));
    };

    let variant = match tag.as_str() {
        PREDEFINED_TAG => GridVariant::Predefined(PredefinedGrid::decode(grid)?),
        RELATIVE_TAG => GridVariant::Relative(RelativeGrid::decode(grid)?),
        other => return Err(DatapointError::UnknownVariantTag(other.to_string())),
    };
    let device = Device::new(device_id.as_str(), device_type.as_str())?;

    tracing::trace!(
        "decoded {} [{}]: {} rows, {} bytes",
        device,
        tag,
        variant.as_grid().rows().count(),
        bytes.len()
    );
    Ok(Datapoint::from_parts(device, variant))
}

/// Running off the end of the buffer is a format problem, not an I/O one.
fn truncation_to_format(err: DatapointError) -> DatapointError {
    match err {
        DatapointError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            DatapointError::InvalidFormat("unexpected end of payload".into())
        }
        other => other,
    }
}
