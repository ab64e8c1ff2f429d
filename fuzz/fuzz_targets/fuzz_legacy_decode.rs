// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use datapoints::{Datapoint, Legacy};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(records) = serde_json::from_slice::<Legacy>(data) else {
        return;
    };
    if let Ok(dp) = Datapoint::from_legacy(&records) {
        let _ = dp.to_legacy();
        let _ = dp.to_bytes();
    }
});
