// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use datapoints::{Compact, Datapoint};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<Compact>(data) else {
        return;
    };
    if let Ok(dp) = Datapoint::from_compact(&payload) {
        let _ = dp.to_compact();
        let _ = dp.to_bytes();
    }
});
