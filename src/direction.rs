//! Direction-of-travel samples for map arrows.
//!
//! Samples are taken every `interval` meters from the start. The
//! bearing at each sample looks a short distance ahead along the
//! track; where that gives no direction (duplicate points) it falls
//! back to the nearest pair of distinct raw points.

use log::debug;
use serde::Serialize;

use crate::geomath::{self, LatLon};
use crate::track::Track;

/// How far ahead of a sample the bearing is measured, in meters.
pub const LOOKAHEAD_M: f64 = 10.0;

/// Upper bound on the samples one sequence yields.
pub const MAX_DIRECTION_SAMPLES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DirectionSample {
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Compass bearing in degrees [0, 360).
    pub bearing: f64,
}

/// A restartable description of the sample sequence. Each call to
/// [`DirectionSampler::iter`] starts again from distance 0.
#[derive(Debug, Clone, Copy)]
pub struct DirectionSampler<'a> {
    track: &'a Track,
    interval: f64,
}

impl<'a> DirectionSampler<'a> {
    pub fn new(track: &'a Track, interval: f64) -> Self {
        Self { track, interval }
    }

    /// Number of samples the sequence yields. Tracks shorter than one
    /// interval yield none, and no sequence exceeds
    /// [`MAX_DIRECTION_SAMPLES`].
    pub fn len(&self) -> usize {
        let total = self.track.total_distance();
        if self.interval.is_nan() || self.interval <= 0.0 || total < self.interval {
            return 0;
        }
        // Sample distances k * interval for every k with k * interval < total.
        let count = (total / self.interval).ceil();
        if count >= MAX_DIRECTION_SAMPLES as f64 {
            debug!("{count} direction samples requested, capping at {MAX_DIRECTION_SAMPLES}");
            return MAX_DIRECTION_SAMPLES;
        }
        count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> DirectionIter<'a> {
        DirectionIter {
            track: self.track,
            interval: self.interval,
            next: 0,
            count: self.len(),
        }
    }
}

impl<'a> IntoIterator for &DirectionSampler<'a> {
    type Item = DirectionSample;
    type IntoIter = DirectionIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct DirectionIter<'a> {
    track: &'a Track,
    interval: f64,
    next: usize,
    count: usize,
}

impl Iterator for DirectionIter<'_> {
    type Item = DirectionSample;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.count {
            let distance = self.next as f64 * self.interval;
            self.next += 1;
            if let Some(sample) = sample_at(self.track, distance) {
                return Some(sample);
            }
            debug!("no bearing at {distance:.0} m, skipping sample");
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.count - self.next))
    }
}

fn sample_at(track: &Track, distance: f64) -> Option<DirectionSample> {
    let here = track.coord_at(distance);
    let ahead_distance = (distance + LOOKAHEAD_M).min(track.total_distance());
    let ahead = track.coord_at(ahead_distance);

    let bearing = geomath::bearing(here, ahead)
        .ok()
        .or_else(|| fallback_bearing(track, distance))?;

    Some(DirectionSample {
        distance,
        latitude: here.lat,
        longitude: here.lon,
        bearing,
    })
}

/// Bearing of the first distinct pair of raw points at or after the
/// segment containing `distance`, searching backwards if none follows.
fn fallback_bearing(track: &Track, distance: f64) -> Option<f64> {
    let points = track.points();
    let index = track.locate(distance).index;
    let pair_bearing = |i: usize| -> Option<f64> {
        let a: LatLon = points[i].coord();
        let b: LatLon = points[i + 1].coord();
        geomath::bearing(a, b).ok()
    };

    (index..points.len() - 1)
        .find_map(pair_bearing)
        .or_else(|| (0..index).rev().find_map(pair_bearing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::tests::raw;

    /// ~11.1 km due east along the equator.
    fn eastward() -> Track {
        Track::new(&[raw(0.0, 0.0), raw(0.0, 0.05), raw(0.0, 0.1)]).unwrap()
    }

    #[test]
    fn samples_at_fixed_interval() {
        let track = eastward();
        let sampler = DirectionSampler::new(&track, 2000.0);
        let samples: Vec<_> = sampler.iter().collect();

        assert_eq!(samples.len(), 6);
        assert_eq!(samples[0].distance, 0.0);
        assert_eq!(samples[1].distance, 2000.0);
        assert!(samples.iter().all(|s| s.distance < track.total_distance()));
        for s in &samples {
            assert!((s.bearing - 90.0).abs() < 0.1, "Expected ~90, got {}", s.bearing);
        }
    }

    #[test]
    fn sampler_is_restartable() {
        let track = eastward();
        let sampler = DirectionSampler::new(&track, 3000.0);
        let first: Vec<_> = sampler.iter().collect();
        let second: Vec<_> = (&sampler).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), sampler.len());
    }

    #[test]
    fn short_track_is_empty() {
        let track = Track::new(&[raw(0.0, 0.0), raw(0.0, 0.001)]).unwrap();
        let sampler = DirectionSampler::new(&track, 2000.0);
        assert!(sampler.is_empty());
        assert_eq!(sampler.iter().count(), 0);
    }

    #[test]
    fn tiny_interval_stays_bounded() {
        let track = eastward();
        let sampler = DirectionSampler::new(&track, 1e-9);

        assert_eq!(sampler.len(), MAX_DIRECTION_SAMPLES);
        let samples: Vec<_> = sampler.iter().collect();
        assert!(samples.len() <= MAX_DIRECTION_SAMPLES);
        assert!(samples.last().unwrap().distance < 1e-4);
    }

    #[test]
    fn follows_turns() {
        // East ~5.5 km then north ~5.5 km
        let track = Track::new(&[raw(0.0, 0.0), raw(0.0, 0.05), raw(0.05, 0.05)]).unwrap();
        let samples: Vec<_> = DirectionSampler::new(&track, 1000.0).iter().collect();

        assert!((samples[0].bearing - 90.0).abs() < 0.5);
        let last = samples.last().unwrap();
        assert!(last.bearing < 0.5 || last.bearing > 359.5, "got {}", last.bearing);
    }

    #[test]
    fn fallback_uses_raw_points() {
        let track = Track::new(&[raw(0.0, 0.0), raw(0.0, 0.01), raw(0.0, 0.01)]).unwrap();
        let b = fallback_bearing(&track, track.total_distance()).unwrap();
        assert!((b - 90.0).abs() < 0.1);
    }
}
