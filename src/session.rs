//! Analysis session: one track, its markers and the configuration.
//!
//! The host keeps one `Session` per loaded file and passes it to every
//! query. Loading another file means building a new session; nothing
//! here is global. Marker mutations go through [`MarkerList`], which
//! validates a copy before replacing the live list, so a failed call
//! never leaves a half-applied change behind.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::direction::{DirectionSample, DirectionSampler};
use crate::elevation::{ElevationProfile, ElevationStats, ProfileSample};
use crate::error::{EngineError, Result};
use crate::export;
use crate::geomath::LatLon;
use crate::gpx::{self, RawPoint, Waypoint};
use crate::segments::{self, Marker, MarkerList, Segment, FINISH_NAME, START_NAME};
use crate::track::Track;

pub struct Session {
    name: Option<String>,
    config: AnalysisConfig,
    track: Track,
    profile: ElevationProfile,
    markers: MarkerList,
}

/// Everything the presentation layer draws, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub total_distance: f64,
    pub point_count: usize,
    /// `None` when no point carries an elevation.
    pub elevation: Option<ElevationStats>,
    pub markers: Vec<Marker>,
    pub segments: Vec<Segment>,
    pub whole_track: Segment,
    pub profile: Vec<ProfileSample>,
    pub directions: Vec<DirectionSample>,
}

/// A marker as sent by the host: a name and a coordinate.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerRequest {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Session {
    pub fn new(points: &[RawPoint], config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let track = Track::new(points)?;
        let profile = ElevationProfile::new(&track, config.smoothing_window);

        info!(
            "session loaded: {} points, {:.0} m",
            track.len(),
            track.total_distance()
        );

        Ok(Self {
            name: None,
            config,
            track,
            profile,
            markers: MarkerList::new(),
        })
    }

    /// Load a GPX file and register its waypoints as markers.
    pub fn from_gpx(data: &[u8], config: AnalysisConfig) -> Result<Self> {
        let gpx = gpx::parse_bytes(data)?;
        let mut session = Self::new(&gpx.points, config)?;
        session.name = gpx.name;
        session.import_waypoints(&gpx.waypoints)?;
        Ok(session)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn profile(&self) -> &ElevationProfile {
        &self.profile
    }

    pub fn markers(&self) -> &[Marker] {
        self.markers.as_slice()
    }

    /// Replace the markers with Start, every waypoint in track order, and
    /// Finish. On error the existing markers are kept.
    pub fn import_waypoints(&mut self, waypoints: &[Waypoint]) -> Result<()> {
        let mut list = MarkerList::new();
        list.insert_sorted(Marker::at_distance(&self.track, START_NAME, 0.0));
        for wp in waypoints {
            list.insert_sorted(Marker::snap(&self.track, &wp.name, wp.coord())?);
        }
        list.push(Marker::at_distance(
            &self.track,
            FINISH_NAME,
            self.track.total_distance(),
        ))?;

        info!("imported {} waypoints as markers", waypoints.len());
        self.markers = list;
        Ok(())
    }

    /// Snap a coordinate and insert it where it falls along the track.
    pub fn add_marker(&mut self, name: &str, coord: LatLon) -> Result<usize> {
        let marker = Marker::snap(&self.track, name, coord)?;
        Ok(self.markers.insert_sorted(marker))
    }

    /// Snap a coordinate and insert it at a position chosen by the user.
    pub fn insert_marker(&mut self, position: usize, name: &str, coord: LatLon) -> Result<usize> {
        let marker = Marker::snap(&self.track, name, coord)?;
        self.markers.insert_at(position, marker).map_err(|e| {
            warn!("rejected marker '{name}' at position {position}: {e}");
            e
        })
    }

    /// Snap a coordinate and append it after the last marker.
    pub fn push_marker(&mut self, name: &str, coord: LatLon) -> Result<usize> {
        self.insert_marker(self.markers.len(), name, coord)
    }

    pub fn remove_marker(&mut self, index: usize) -> Option<Marker> {
        self.markers.remove(index)
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    pub fn move_marker_up(&mut self, index: usize) -> Result<bool> {
        self.markers.move_up(index)
    }

    pub fn move_marker_down(&mut self, index: usize) -> Result<bool> {
        self.markers.move_down(index)
    }

    pub fn elevation_stats(&self) -> Result<ElevationStats> {
        self.profile.stats(self.config.elevation_threshold_meters)
    }

    pub fn segments(&self) -> Result<Vec<Segment>> {
        segments::analyze(
            &self.track,
            &self.profile,
            self.markers.as_slice(),
            self.config.elevation_threshold_meters,
        )
    }

    /// Statistics between any two markers by index, not only
    /// neighbours. `None` if either index is out of range.
    pub fn segment(&self, start: usize, end: usize) -> Result<Option<Segment>> {
        let (Some(from), Some(to)) = (self.markers.get(start), self.markers.get(end)) else {
            return Ok(None);
        };
        segments::segment_between(
            &self.track,
            &self.profile,
            from,
            to,
            self.config.elevation_threshold_meters,
        )
        .map(Some)
    }

    /// Chart samples between two markers by index.
    pub fn segment_profile(&self, start: usize, end: usize) -> Option<Vec<ProfileSample>> {
        let from = self.markers.get(start)?;
        let to = self.markers.get(end)?;
        Some(
            self.profile
                .samples_between(&self.track, from.projected_distance, to.projected_distance),
        )
    }

    pub fn whole_track(&self) -> Result<Segment> {
        segments::whole_track(&self.track, &self.profile, self.config.elevation_threshold_meters)
    }

    pub fn profile_samples(&self) -> Vec<ProfileSample> {
        self.profile.samples(&self.track)
    }

    pub fn directions(&self) -> DirectionSampler<'_> {
        DirectionSampler::new(&self.track, self.config.direction_sample_interval_meters)
    }

    pub fn report(&self) -> Result<AnalysisReport> {
        let elevation = match self.elevation_stats() {
            Ok(stats) => Some(stats),
            Err(EngineError::NoElevationData) => {
                warn!("track has no elevation data");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(AnalysisReport {
            name: self.name.clone(),
            total_distance: self.track.total_distance(),
            point_count: self.track.len(),
            elevation,
            markers: self.markers().to_vec(),
            segments: self.segments()?,
            whole_track: self.whole_track()?,
            profile: self.profile_samples(),
            directions: self.directions().iter().collect(),
        })
    }

    /// Segment table plus the whole-track row as CSV.
    pub fn segments_csv(&self) -> Result<String> {
        export::segments_to_csv(&self.segments()?, Some(&self.whole_track()?))
    }
}

/// Build a session from a host request. An empty marker list means
/// "use the file's waypoints".
pub fn session_from_request(gpx_data: &[u8], config_json: &str, markers_json: &str) -> Result<Session> {
    let config = AnalysisConfig::from_json(config_json)?;
    let requests: Vec<MarkerRequest> = if markers_json.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(markers_json)?
    };

    let mut session = Session::from_gpx(gpx_data, config)?;
    if !requests.is_empty() {
        session.clear_markers();
        for r in &requests {
            session.push_marker(&r.name, LatLon::new(r.lat, r.lon))?;
        }
    }
    Ok(session)
}

/// Analyze a GPX file and return the report as a JSON string.
pub fn analyze_to_json(gpx_data: &[u8], config_json: &str, markers_json: &str) -> Result<String> {
    let session = session_from_request(gpx_data, config_json, markers_json)?;
    Ok(serde_json::to_string(&session.report()?)?)
}

/// Analyze a GPX file and return the segment table as CSV.
pub fn export_csv(gpx_data: &[u8], config_json: &str, markers_json: &str) -> Result<String> {
    session_from_request(gpx_data, config_json, markers_json)?.segments_csv()
}
