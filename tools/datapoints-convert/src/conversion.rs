// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text <-> Datapoint conversion for the three carried formats.

use anyhow::Context;
use datapoints::{Compact, Datapoint, GridVariant, Legacy, TimeOrder, Timestamp, Topic};
use serde::{Deserialize, Serialize};
use std::fmt;

/// External text format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Base64 binary payload, one line
    Base64,
    /// JSON array of per-timestamp records
    Legacy,
    /// JSON object with keys, labels and positional rows
    Compact,
}

impl Format {
    /// Guess the format from the first significant character.
    pub fn detect(text: &str) -> Option<Self> {
        match text.trim_start().chars().next()? {
            '[' => Some(Format::Legacy),
            '{' => Some(Format::Compact),
            c if c.is_ascii_alphanumeric() || c == '+' || c == '/' => Some(Format::Base64),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Base64 => "base64",
            Format::Legacy => "legacy",
            Format::Compact => "compact",
        };
        f.write_str(name)
    }
}

pub fn read_datapoint(text: &str, format: Format) -> anyhow::Result<Datapoint> {
    let dp = match format {
        Format::Base64 => Datapoint::from_base64(text)?,
        Format::Legacy => {
            let records: Legacy =
                serde_json::from_str(text).context("input is not legacy JSON")?;
            Datapoint::from_legacy(&records)?
        }
        Format::Compact => {
            let payload: Compact =
                serde_json::from_str(text).context("input is not compact JSON")?;
            Datapoint::from_compact(&payload)?
        }
    };
    Ok(dp)
}

pub fn write_datapoint(dp: &Datapoint, format: Format, pretty: bool) -> anyhow::Result<String> {
    let text = match format {
        Format::Base64 => dp.to_base64()?,
        Format::Legacy => to_json(&dp.to_legacy()?, pretty)?,
        Format::Compact => to_json(&dp.to_compact()?, pretty)?,
    };
    Ok(text)
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Shape report printed by `inspect`.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub device: String,
    pub variant: &'static str,
    pub time_order: TimeOrder,
    pub rows: usize,
    pub used_rows: usize,
    pub data_cols: usize,
    pub used_data_cols: usize,
    pub meta_cols: usize,
    pub used_meta_cols: usize,
    pub span: Option<(Timestamp, Timestamp)>,
    pub gap: Option<i64>,
    pub empty: bool,
}

impl Summary {
    pub fn of(dp: &Datapoint) -> Self {
        let grid = dp.grid();
        let span = grid.row_times().fold(None, |acc, ts| match acc {
            None => Some((ts, ts)),
            Some((lo, hi)) => Some((ts.min(lo), ts.max(hi))),
        });
        let gap = match dp.variant() {
            GridVariant::Predefined(g) => Some(g.range().gap),
            GridVariant::Relative(_) => None,
        };
        Self {
            device: dp.device().to_string(),
            variant: dp.variant().tag(),
            time_order: dp.time_order(),
            rows: grid.rows().count(),
            used_rows: grid.used_of_row(),
            data_cols: grid.cols(Topic::Data).count(),
            used_data_cols: grid.used_of_col(Topic::Data),
            meta_cols: grid.cols(Topic::Meta).count(),
            used_meta_cols: grid.used_of_col(Topic::Meta),
            span,
            gap,
            empty: dp.is_empty(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "device:     {}", self.device)?;
        writeln!(f, "variant:    {}", self.variant)?;
        writeln!(f, "time order: {:?}", self.time_order)?;
        writeln!(f, "rows:       {} ({} used)", self.rows, self.used_rows)?;
        writeln!(
            f,
            "data cols:  {} ({} used)",
            self.data_cols, self.used_data_cols
        )?;
        writeln!(
            f,
            "meta cols:  {} ({} used)",
            self.meta_cols, self.used_meta_cols
        )?;
        if let Some((first, last)) = self.span {
            writeln!(f, "span:       {} .. {} ms", first, last)?;
        }
        if let Some(gap) = self.gap {
            writeln!(f, "gap:        {} ms", gap)?;
        }
        write!(f, "empty:      {}", self.empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = r#"[
        {"deviceId":"OZ-1","deviceType":"POLLUDRONE",
         "payload":{"t":120.0,"d":{"pm25":3.0,"t":120.0},"s":{"status":"ok"}}},
        {"deviceId":"OZ-1","deviceType":"POLLUDRONE",
         "payload":{"t":60.0,"d":{"pm25":2.0,"t":60.0},"s":{}}},
        {"deviceId":"OZ-1","deviceType":"POLLUDRONE",
         "payload":{"t":0.0,"d":{"pm25":1.0,"t":0.0},"s":{}}}
    ]"#;

    #[test]
    fn test_detect_format() {
        assert_eq!(Format::detect("  [{}]"), Some(Format::Legacy));
        assert_eq!(Format::detect("\n{\"keys\":[]}"), Some(Format::Compact));
        assert_eq!(Format::detect("AAAAAg=="), Some(Format::Base64));
        assert_eq!(Format::detect(""), None);
        assert_eq!(Format::detect("#"), None);
    }

    #[test]
    fn test_legacy_to_compact_to_base64() {
        let dp = read_datapoint(LEGACY, Format::Legacy).unwrap();
        let compact = write_datapoint(&dp, Format::Compact, false).unwrap();
        assert!(compact.contains("\"keys\":[\"pm25\"]"));

        let dp2 = read_datapoint(&compact, Format::Compact).unwrap();
        let b64 = write_datapoint(&dp2, Format::Base64, false).unwrap();
        let dp3 = read_datapoint(&b64, Format::Base64).unwrap();
        assert_eq!(dp3, dp2);
    }

    #[test]
    fn test_pretty_output_is_multiline() {
        let dp = read_datapoint(LEGACY, Format::Legacy).unwrap();
        let pretty = write_datapoint(&dp, Format::Legacy, true).unwrap();
        let compact = write_datapoint(&dp, Format::Legacy, false).unwrap();
        assert!(pretty.lines().count() > 1);
        assert_eq!(compact.lines().count(), 1);
    }

    #[test]
    fn test_wrong_format_reports_context() {
        let err = read_datapoint(LEGACY, Format::Compact).unwrap_err();
        assert!(err.to_string().contains("compact JSON"));
    }

    #[test]
    fn test_summary() {
        let dp = read_datapoint(LEGACY, Format::Legacy).unwrap();
        let summary = Summary::of(&dp);
        assert_eq!(summary.device, "POLLUDRONE/OZ-1");
        assert_eq!(summary.variant, "predefined");
        assert_eq!(summary.time_order, TimeOrder::Ascending);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.used_meta_cols, 1);
        assert_eq!(summary.span, Some((0, 120_000)));
        assert_eq!(summary.gap, Some(60_000));
        assert!(!summary.empty);
        assert!(summary.to_string().contains("gap:        60000 ms"));
    }
}
