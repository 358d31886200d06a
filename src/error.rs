//! Error type shared by every engine operation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid coordinate: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },
    #[error("track needs at least 2 points, got {0}")]
    EmptyTrack(usize),
    #[error("zero-length segment has no bearing")]
    DegenerateSegment,
    #[error("no point on the track carries an elevation")]
    NoElevationData,
    #[error("marker '{name}' at {distance_m:.1} m comes before the previous marker at {previous_m:.1} m")]
    NonMonotonicMarkers {
        name: String,
        distance_m: f64,
        previous_m: f64,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid marker: {0}")]
    InvalidMarker(String),
    #[error("GPX parse error: {0}")]
    GpxParse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_offending_marker() {
        let err = EngineError::NonMonotonicMarkers {
            name: "Aid 2".into(),
            distance_m: 1000.0,
            previous_m: 2500.0,
        };
        let text = err.to_string();
        assert!(text.contains("Aid 2"));
        assert!(text.contains("1000.0"));
    }

    #[test]
    fn display_empty_track_count() {
        assert_eq!(
            EngineError::EmptyTrack(1).to_string(),
            "track needs at least 2 points, got 1"
        );
    }
}
