//! Great-circle primitives.
//!
//! All coordinates use WGS84 (lat/lon in degrees). Every distance in
//! the engine is built from [`haversine`], so the Earth radius chosen
//! here is the only one in the crate.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Earth radius in meters (WGS84 mean).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic coordinate without elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Fails with `InvalidCoordinate` outside lat [-90, 90], lon [-180, 180].
    pub fn validate(&self) -> Result<()> {
        let lat_ok = (-90.0..=90.0).contains(&self.lat);
        let lon_ok = (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(EngineError::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

/// Haversine distance in meters between two validated coordinates.
pub fn distance(a: LatLon, b: LatLon) -> Result<f64> {
    a.validate()?;
    b.validate()?;
    Ok(haversine(a, b))
}

/// Haversine distance without domain checks. Callers guarantee the
/// inputs came from an already validated track.
pub(crate) fn haversine(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1 for antipodal points.
    2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
}

/// Running sum of consecutive distances. First element is 0 and the
/// output has the same length as the input.
pub fn cumulative_distances(points: &[LatLon]) -> Result<Vec<f64>> {
    if points.is_empty() {
        return Err(EngineError::EmptyTrack(0));
    }
    for p in points {
        p.validate()?;
    }

    let mut out = Vec::with_capacity(points.len());
    let mut total = 0.0;
    out.push(total);
    for w in points.windows(2) {
        total += haversine(w[0], w[1]);
        out.push(total);
    }
    Ok(out)
}

/// Initial bearing from `a` to `b` in degrees [0, 360).
pub fn bearing(a: LatLon, b: LatLon) -> Result<f64> {
    a.validate()?;
    b.validate()?;
    if a == b {
        return Err(EngineError::DegenerateSegment);
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    Ok(if bearing >= 360.0 { 0.0 } else { bearing })
}
