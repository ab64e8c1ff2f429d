// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use datapoints::Datapoint;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw binary payload
    if let Ok(dp) = Datapoint::from_bytes(data) {
        // Anything accepted must re-encode to a stable payload
        let bytes = dp.to_bytes().expect("re-encode");
        let again = Datapoint::from_bytes(&bytes).expect("re-decode");
        assert_eq!(again.to_bytes().expect("re-encode"), bytes);
    }

    // Same bytes through the base64 carrier
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Datapoint::from_base64(text);
    }
});
