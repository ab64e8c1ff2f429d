// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Periodicity inference for decoded payloads.
//!
//! Given the timestamps of an unordered batch of readings, decide whether
//! a periodic grid or an irregular grid should hold them:
//!
//! ```text
//! timestamps --> sort desc --> gaps --> hcf(gaps) = gap
//!                                          |
//!            ratio = count * gap / (max - min)
//!                                          |
//!            ratio < 0.7 ? Relative : Periodic [min, max] @ gap
//! ```
//!
//! Both the GCD fold and the threshold are policy, tuned so that existing
//! encoded data keeps decoding to the same variant.

use crate::datapoint::{Datapoint, Sizing};
use crate::device::Device;
use crate::error::Result;
use crate::grid::predefined::PeriodicRange;
use crate::grid::Timestamp;

/// Packing ratio below which an irregular grid is chosen (strict `<`).
pub const PACKING_THRESHOLD: f64 = 0.7;

/// Greatest common divisor folded over every number.
///
/// Empty input yields 0; a single number yields itself (absolute value).
pub fn hcf(numbers: &[i64]) -> i64 {
    let mut iter = numbers.iter().map(|n| n.unsigned_abs());
    let Some(mut a) = iter.next() else {
        return 0;
    };
    for mut b in iter {
        while b != 0 {
            (a, b) = (b, a % b);
        }
    }
    i64::try_from(a).unwrap_or(i64::MAX)
}

/// `count * gap / span`: how densely `count` points fill a periodic grid
/// of step `gap` over `span`.
pub fn packing_ratio(count: usize, gap: i64, span: i64) -> f64 {
    count as f64 * gap as f64 / span as f64
}

/// Grid shape chosen for a batch of timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No points.
    Empty,
    /// Exactly one point.
    Single,
    /// Irregular grid sized to `count` points.
    Relative { count: usize },
    /// Periodic grid over the observed span.
    Periodic(PeriodicRange),
}

impl Layout {
    /// Infer the layout for `timestamps` (any order, duplicates allowed).
    pub fn infer(timestamps: &[Timestamp]) -> Self {
        let count = timestamps.len();
        match count {
            0 => return Layout::Empty,
            1 => return Layout::Single,
            _ => {}
        }

        let mut sorted = timestamps.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let gaps: Vec<i64> = sorted
            .windows(2)
            .map(|w| w[0].saturating_sub(w[1]))
            .collect();
        let gap = hcf(&gaps);
        if gap == 0 {
            tracing::debug!("all {} timestamps identical, using relative grid", count);
            return Layout::Relative { count };
        }

        let (lte, gte) = (sorted[0], sorted[count - 1]);
        let span = lte.saturating_sub(gte);
        let ratio = packing_ratio(count, gap, span);
        if ratio < PACKING_THRESHOLD {
            tracing::debug!(
                "packing ratio {:.3} (count={}, gap={}ms, span={}ms) below {}, using relative grid",
                ratio,
                count,
                gap,
                span,
                PACKING_THRESHOLD
            );
            Layout::Relative { count }
        } else {
            tracing::debug!(
                "packing ratio {:.3} (count={}, gap={}ms, span={}ms), using periodic grid",
                ratio,
                count,
                gap,
                span
            );
            Layout::Periodic(PeriodicRange::new(gte, lte, gap))
        }
    }

    /// Build an empty datapoint of this shape with the given columns bound.
    pub fn build(&self, device: Device, sizing: &Sizing) -> Result<Datapoint> {
        match self {
            Layout::Empty => Ok(Datapoint::empty(device)),
            Layout::Single => Ok(Datapoint::single(device, sizing)),
            Layout::Relative { count } => Ok(Datapoint::unperiodic(device, *count, sizing)),
            Layout::Periodic(range) => Datapoint::periodic(device, *range, sizing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hcf_folds_all_gaps() {
        assert_eq!(hcf(&[60, 120, 60]), 60);
        assert_eq!(hcf(&[60, 90]), 30);
        assert_eq!(hcf(&[45]), 45);
        assert_eq!(hcf(&[]), 0);
        assert_eq!(hcf(&[0, 0, 0]), 0);
        assert_eq!(hcf(&[0, 40]), 40);
        assert_eq!(hcf(&[-60, 90]), 30);
    }

    #[test]
    fn test_packing_threshold_is_policy() {
        // 10 points over 1000 ms at 60 ms would leave 40% of slots empty
        let sparse = packing_ratio(10, 60, 1000);
        assert!((sparse - 0.6).abs() < 1e-12);
        assert!(sparse < PACKING_THRESHOLD);

        let dense = packing_ratio(10, 60, 600);
        assert!((dense - 1.0).abs() < 1e-12);
        assert!(dense >= PACKING_THRESHOLD);

        assert_eq!(PACKING_THRESHOLD, 0.7);
    }

    #[test]
    fn test_regular_series_is_periodic() {
        let ts: Vec<i64> = (0..10).map(|i| 1_000_000 + i * 60_000).collect();
        assert_eq!(
            Layout::infer(&ts),
            Layout::Periodic(PeriodicRange::new(1_000_000, 1_540_000, 60_000))
        );
    }

    #[test]
    fn test_unordered_input_is_sorted_first() {
        let ts = [180, 0, 120, 60];
        assert_eq!(
            Layout::infer(&ts),
            Layout::Periodic(PeriodicRange::new(0, 180, 60))
        );
    }

    #[test]
    fn test_sparse_series_is_relative() {
        // gcd 10 over a 1000 ms span: 4 * 10 / 1000 = 0.04
        let ts = [0, 10, 500, 1000];
        assert_eq!(Layout::infer(&ts), Layout::Relative { count: 4 });
    }

    #[test]
    fn test_threshold_boundary() {
        // 7 points, gap 10, span 100 -> exactly 0.7 -> periodic
        let ts = [0, 10, 20, 30, 40, 50, 100];
        assert!(matches!(Layout::infer(&ts), Layout::Periodic(_)));
        // 6 points, gap 10, span 100 -> 0.6 -> relative
        let ts = [0, 10, 20, 30, 40, 100];
        assert_eq!(Layout::infer(&ts), Layout::Relative { count: 6 });
    }

    #[test]
    fn test_identical_timestamps_fall_back() {
        assert_eq!(Layout::infer(&[5, 5, 5]), Layout::Relative { count: 3 });
    }

    #[test]
    fn test_trivial_layouts() {
        assert_eq!(Layout::infer(&[]), Layout::Empty);
        assert_eq!(Layout::infer(&[42]), Layout::Single);
    }
}
