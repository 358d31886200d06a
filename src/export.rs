//! CSV export of the segment table.

use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::segments::Segment;

/// One CSV row. An undefined gradient is written as an empty cell.
#[derive(Debug, Serialize)]
struct SegmentRow<'a> {
    #[serde(rename = "name-from")]
    name_from: &'a str,
    #[serde(rename = "name-to")]
    name_to: &'a str,
    distance_km: f64,
    gain_m: f64,
    loss_m: f64,
    gradient_pct: Option<f64>,
}

impl<'a> From<&'a Segment> for SegmentRow<'a> {
    fn from(s: &'a Segment) -> Self {
        Self {
            name_from: &s.from,
            name_to: &s.to,
            distance_km: round(s.distance / 1000.0, 3),
            gain_m: round(s.elevation_gain, 1),
            loss_m: round(s.elevation_loss, 1),
            gradient_pct: s.average_gradient.map(|g| round(g, 1)),
        }
    }
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Write the segments, followed by the whole-track row if given.
pub fn write_segments_csv<W: Write>(
    writer: W,
    segments: &[Segment],
    whole_track: Option<&Segment>,
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for segment in segments.iter().chain(whole_track) {
        wtr.serialize(SegmentRow::from(segment))?;
    }
    // Header only, for an empty table
    if segments.is_empty() && whole_track.is_none() {
        wtr.write_record(["name-from", "name-to", "distance_km", "gain_m", "loss_m", "gradient_pct"])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn segments_to_csv(segments: &[Segment], whole_track: Option<&Segment>) -> Result<String> {
    let mut buf = Vec::new();
    write_segments_csv(&mut buf, segments, whole_track)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
