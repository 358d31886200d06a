//! Markers and per-segment statistics.
//!
//! Every marker is snapped onto the track when it is created, so a
//! segment is just an interval on the distance axis. The marker list
//! is kept in non-decreasing projected order; markers at the same
//! distance keep the order the user gave them.

use serde::Serialize;

use crate::elevation::ElevationProfile;
use crate::error::{EngineError, Result};
use crate::geomath::LatLon;
use crate::track::Track;

pub const START_NAME: &str = "Start";
pub const FINISH_NAME: &str = "Finish";

/// A named point pinned to a position along the track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub name: String,
    /// The coordinate as given.
    pub latitude: f64,
    pub longitude: f64,
    /// Where the coordinate lands on the track.
    pub snapped_latitude: f64,
    pub snapped_longitude: f64,
    /// Along-track distance of the snapped position, in meters.
    pub projected_distance: f64,
    /// Distance from the given coordinate to the track, in meters.
    pub offset: f64,
    /// Rank among the markers.
    pub order: usize,
}

impl Marker {
    /// Snap a coordinate onto the track and create a marker for it.
    pub fn snap(track: &Track, name: &str, coord: LatLon) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidMarker("marker name is empty".into()));
        }
        let projection = track.project(coord)?;
        Ok(Self {
            name: name.to_string(),
            latitude: coord.lat,
            longitude: coord.lon,
            snapped_latitude: projection.point.lat,
            snapped_longitude: projection.point.lon,
            projected_distance: projection.projected_distance,
            offset: projection.offset,
            order: 0,
        })
    }

    /// A marker placed directly at a distance, with no source coordinate.
    pub fn at_distance(track: &Track, name: &str, distance: f64) -> Self {
        let coord = track.coord_at(distance);
        Self {
            name: name.to_string(),
            latitude: coord.lat,
            longitude: coord.lon,
            snapped_latitude: coord.lat,
            snapped_longitude: coord.lon,
            projected_distance: distance,
            offset: 0.0,
            order: 0,
        }
    }
}

/// Statistics for the stretch between two consecutive markers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub from: String,
    pub to: String,
    pub start_distance: f64,
    pub end_distance: f64,
    pub distance: f64,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
    /// Gain over distance in percent; `None` for a zero-length segment.
    pub average_gradient: Option<f64>,
}

/// Ordered marker list. Every mutation is checked against a copy and
/// only swapped in when the new order is valid.
#[derive(Debug, Clone, Default)]
pub struct MarkerList {
    markers: Vec<Marker>,
}

impl MarkerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    /// Insert at the position matching the marker's projected distance,
    /// after any marker already at the same distance. Returns the index.
    pub fn insert_sorted(&mut self, marker: Marker) -> usize {
        let position = self
            .markers
            .partition_point(|m| m.projected_distance <= marker.projected_distance);
        self.markers.insert(position, marker);
        renumber(&mut self.markers);
        position
    }

    /// Insert at an explicit position. Fails with `NonMonotonicMarkers`
    /// and leaves the list untouched if that breaks the ordering.
    pub fn insert_at(&mut self, position: usize, marker: Marker) -> Result<usize> {
        if position > self.markers.len() {
            return Err(EngineError::InvalidMarker(format!(
                "position {position} is past the end of {} markers",
                self.markers.len()
            )));
        }
        let mut next = self.markers.clone();
        next.insert(position, marker);
        self.commit(next)?;
        Ok(position)
    }

    /// Append at the end, subject to the same ordering check.
    pub fn push(&mut self, marker: Marker) -> Result<usize> {
        self.insert_at(self.markers.len(), marker)
    }

    pub fn remove(&mut self, index: usize) -> Option<Marker> {
        if index >= self.markers.len() {
            return None;
        }
        let removed = self.markers.remove(index);
        renumber(&mut self.markers);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Swap with the previous marker. `Ok(false)` when there is nothing
    /// to swap with; only markers sharing a distance can trade places.
    pub fn move_up(&mut self, index: usize) -> Result<bool> {
        if index == 0 || index >= self.markers.len() {
            return Ok(false);
        }
        let mut next = self.markers.clone();
        next.swap(index - 1, index);
        self.commit(next)?;
        Ok(true)
    }

    /// Swap with the next marker.
    pub fn move_down(&mut self, index: usize) -> Result<bool> {
        if index + 1 >= self.markers.len() {
            return Ok(false);
        }
        self.move_up(index + 1)
    }

    fn commit(&mut self, mut next: Vec<Marker>) -> Result<()> {
        check_order(&next)?;
        renumber(&mut next);
        self.markers = next;
        Ok(())
    }
}

fn renumber(markers: &mut [Marker]) {
    for (i, m) in markers.iter_mut().enumerate() {
        m.order = i;
    }
}

fn check_order(markers: &[Marker]) -> Result<()> {
    for w in markers.windows(2) {
        if w[1].projected_distance < w[0].projected_distance {
            return Err(EngineError::NonMonotonicMarkers {
                name: w[1].name.clone(),
                distance_m: w[1].projected_distance,
                previous_m: w[0].projected_distance,
            });
        }
    }
    Ok(())
}

/// Statistics between two markers. Gain and loss are accumulated from
/// scratch over this stretch alone.
pub fn segment_between(
    track: &Track,
    profile: &ElevationProfile,
    from: &Marker,
    to: &Marker,
    threshold: f64,
) -> Result<Segment> {
    let distance = to.projected_distance - from.projected_distance;
    if distance < 0.0 {
        return Err(EngineError::NonMonotonicMarkers {
            name: to.name.clone(),
            distance_m: to.projected_distance,
            previous_m: from.projected_distance,
        });
    }

    let gl = profile.gain_loss_between(
        track,
        from.projected_distance,
        to.projected_distance,
        threshold,
    );
    let average_gradient = (distance > 0.0).then(|| gl.gain / distance * 100.0);

    Ok(Segment {
        from: from.name.clone(),
        to: to.name.clone(),
        start_distance: from.projected_distance,
        end_distance: to.projected_distance,
        distance,
        elevation_gain: gl.gain,
        elevation_loss: gl.loss,
        average_gradient,
    })
}

/// One segment per consecutive marker pair.
pub fn analyze(
    track: &Track,
    profile: &ElevationProfile,
    markers: &[Marker],
    threshold: f64,
) -> Result<Vec<Segment>> {
    markers
        .windows(2)
        .map(|w| segment_between(track, profile, &w[0], &w[1], threshold))
        .collect()
}

/// The whole track as a single segment between synthetic start and
/// finish markers.
pub fn whole_track(track: &Track, profile: &ElevationProfile, threshold: f64) -> Result<Segment> {
    let start = Marker::at_distance(track, START_NAME, 0.0);
    let finish = Marker::at_distance(track, FINISH_NAME, track.total_distance());
    segment_between(track, profile, &start, &finish, threshold)
}
