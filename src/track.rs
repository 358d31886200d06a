//! Track construction and nearest-point projection.
//!
//! A [`Track`] pins every raw sample to a position on a 1-D distance
//! axis. Once a coordinate has been projected onto that axis, all
//! segment math downstream is plain arithmetic over cumulative
//! distances.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::geomath::{self, haversine, LatLon};
use crate::gpx::RawPoint;

/// Offsets closer than this count as equidistant.
const TIE_TOLERANCE_M: f64 = 1e-6;

/// A loaded sample with its derived along-track distance.
#[derive(Debug, Clone, Serialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Meters from the first point.
    pub cumulative_distance: f64,
    pub sequence_index: usize,
}

impl TrackPoint {
    pub fn coord(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

/// An immutable ordered point sequence with at least two points.
#[derive(Debug, Clone)]
pub struct Track {
    points: Vec<TrackPoint>,
}

/// Result of projecting a coordinate onto the track.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Projection {
    /// Distance along the track from the start to the projected point, in meters.
    pub projected_distance: f64,
    /// Distance from the query coordinate to the projected point, in meters.
    pub offset: f64,
    /// Index of the track segment start point (0-based).
    pub segment_index: usize,
    /// Nearest point on the track.
    pub point: LatLon,
}

/// Position of a distance on the track: the segment it falls in and
/// the fraction along that segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Location {
    pub index: usize,
    pub t: f64,
}

impl Track {
    /// Build a track from raw samples. Needs at least 2 points, all
    /// with in-range coordinates.
    pub fn new(raw: &[RawPoint]) -> Result<Self> {
        if raw.len() < 2 {
            return Err(EngineError::EmptyTrack(raw.len()));
        }

        let coords: Vec<LatLon> = raw.iter().map(RawPoint::coord).collect();
        let cumulative = geomath::cumulative_distances(&coords)?;

        let points = raw
            .iter()
            .zip(cumulative)
            .enumerate()
            .map(|(i, (p, cumulative_distance))| TrackPoint {
                latitude: p.lat,
                longitude: p.lon,
                // Non-finite readings would poison every sum downstream.
                elevation: p.ele.filter(|e| e.is_finite()),
                timestamp: p.time,
                cumulative_distance,
                sequence_index: i,
            })
            .collect();

        Ok(Self { points })
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total length in meters.
    pub fn total_distance(&self) -> f64 {
        self.points
            .last()
            .map(|p| p.cumulative_distance)
            .unwrap_or(0.0)
    }

    pub fn elevations(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.elevation).collect()
    }

    /// Project a coordinate onto the nearest segment of the track.
    ///
    /// Segments are treated as planar chords scaled by latitude cosine,
    /// which is accurate enough for the point spacing of recorded tracks.
    /// When two segments are equally close the earlier one wins.
    pub fn project(&self, position: LatLon) -> Result<Projection> {
        if self.points.len() < 2 {
            return Err(EngineError::EmptyTrack(self.points.len()));
        }
        position.validate()?;

        let mut best: Option<Projection> = None;

        for (i, segment) in self.points.windows(2).enumerate() {
            let a = &segment[0];
            let b = &segment[1];

            let t = segment_parameter(position, a.coord(), b.coord());
            let (point, along) = if t <= 0.0 {
                (a.coord(), a.cumulative_distance)
            } else if t >= 1.0 {
                (b.coord(), b.cumulative_distance)
            } else {
                let seg_len = b.cumulative_distance - a.cumulative_distance;
                (
                    lerp_coord(a.coord(), b.coord(), t),
                    a.cumulative_distance + t * seg_len,
                )
            };
            let offset = haversine(position, point);

            let is_better = match &best {
                Some(prev) => offset < prev.offset - TIE_TOLERANCE_M,
                None => true,
            };

            if is_better {
                best = Some(Projection {
                    projected_distance: along,
                    offset,
                    segment_index: i,
                    point,
                });
            }
        }

        best.ok_or(EngineError::EmptyTrack(self.points.len()))
    }

    /// Find the segment containing `distance`, clamped to the track.
    pub(crate) fn locate(&self, distance: f64) -> Location {
        let last = self.points.len() - 1;
        let d = distance.clamp(0.0, self.total_distance());

        // First vertex strictly beyond d; the segment starts one before it.
        let upper = self
            .points
            .partition_point(|p| p.cumulative_distance <= d);
        if upper > last {
            return Location { index: last - 1, t: 1.0 };
        }
        let index = upper.saturating_sub(1);
        let a = &self.points[index];
        let b = &self.points[index + 1];
        let span = b.cumulative_distance - a.cumulative_distance;
        let t = if span > 0.0 {
            (d - a.cumulative_distance) / span
        } else {
            0.0
        };
        Location { index, t }
    }

    /// Coordinate at a distance along the track.
    pub fn coord_at(&self, distance: f64) -> LatLon {
        let loc = self.locate(distance);
        let a = self.points[loc.index].coord();
        let b = self.points[loc.index + 1].coord();
        lerp_coord(a, b, loc.t)
    }
}

/// Clamped parameter of the point on segment A-B nearest to P.
///
/// Uses a planar approximation scaled by latitude cosine, which is
/// accurate enough for short segments (< 10 km).
fn segment_parameter(p: LatLon, a: LatLon, b: LatLon) -> f64 {
    let cos_lat = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lon - a.lon) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lon - a.lon) * cos_lat;
    let py = p.lat - a.lat;

    let seg_len_sq = dx * dx + dy * dy;

    if seg_len_sq < 1e-20 {
        // Degenerate segment, snap to its start
        return 0.0;
    }

    ((px * dx + py * dy) / seg_len_sq).clamp(0.0, 1.0)
}

pub(crate) fn lerp_coord(a: LatLon, b: LatLon, t: f64) -> LatLon {
    LatLon::new(a.lat + t * (b.lat - a.lat), a.lon + t * (b.lon - a.lon))
}
