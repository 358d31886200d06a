//! GPX 1.1 file loading.
//!
//! Wraps the `gpx` crate and flattens every track and track segment
//! into one ordered point list, which is what the analysis engine
//! consumes. Waypoints are kept separately so the session can turn
//! them into initial markers.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::error::{EngineError, Result};
use crate::geomath::LatLon;

/// Name given to waypoints without a `<name>` element.
pub const DEFAULT_WAYPOINT_NAME: &str = "Waypoint";

/// A raw sample as recorded in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
}

impl RawPoint {
    pub fn new(lat: f64, lon: f64, ele: Option<f64>) -> Self {
        Self { lat, lon, ele, time: None }
    }

    pub fn coord(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// A single named point of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ele: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Waypoint {
    pub fn coord(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Everything the engine needs from a GPX file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpxData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub points: Vec<RawPoint>,
    pub waypoints: Vec<Waypoint>,
}

/// Parse a GPX file from any reader.
pub fn parse<R: Read>(reader: R) -> Result<GpxData> {
    let gpx = gpx::read(reader).map_err(|e| EngineError::GpxParse(e.to_string()))?;

    let name = gpx.tracks.iter().find_map(|t| t.name.clone());

    let points: Vec<RawPoint> = gpx
        .tracks
        .iter()
        .flat_map(|t| t.segments.iter())
        .flat_map(|seg| seg.points.iter())
        .map(|wp| RawPoint {
            lat: wp.point().y(),
            lon: wp.point().x(),
            ele: wp.elevation.filter(|e| e.is_finite()),
            time: wp.time.as_ref().and_then(to_utc),
        })
        .collect();

    let waypoints: Vec<Waypoint> = gpx
        .waypoints
        .iter()
        .map(|wp| Waypoint {
            name: wp
                .name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WAYPOINT_NAME.to_string()),
            lat: wp.point().y(),
            lon: wp.point().x(),
            ele: wp.elevation.filter(|e| e.is_finite()),
            description: wp.description.clone(),
        })
        .collect();

    debug!(
        "parsed GPX: {} track points, {} waypoints",
        points.len(),
        waypoints.len()
    );

    Ok(GpxData {
        name,
        points,
        waypoints,
    })
}

/// Parse GPX from a byte slice. Convenience wrapper for JNI.
pub fn parse_bytes(data: &[u8]) -> Result<GpxData> {
    parse(data)
}

fn to_utc(time: &gpx::Time) -> Option<DateTime<Utc>> {
    let text = time.format().ok()?;
    DateTime::parse_from_rfc3339(&text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
