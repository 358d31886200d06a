//! Elevation smoothing and gain/loss accumulation.
//!
//! Raw GPS elevation is noisy, so the track is first smoothed with a
//! centered moving average and gain/loss is then accumulated with a
//! threshold gate: small oscillations never reach the threshold and
//! are not counted as both climb and descent.

use log::debug;
use serde::Serialize;

use crate::error::{EngineError, Result};
use crate::track::Track;

/// Accumulated climb and descent, both as positive meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GainLoss {
    pub gain: f64,
    pub loss: f64,
}

/// Whole-track elevation summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationStats {
    pub total_gain: f64,
    pub total_loss: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
}

/// One point of the elevation chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSample {
    pub distance: f64,
    pub elevation: Option<f64>,
}

/// Centered moving average with window `window`.
///
/// Near either end the window shrinks symmetrically, so the first and
/// last values are never averaged with padding. Absent values are left
/// out of each average; a window with no values at all stays absent.
pub fn smooth(elevations: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = elevations.len();
    let half = window / 2;

    (0..n)
        .map(|i| {
            let h = half.min(i).min(n - 1 - i);
            let (sum, count) = elevations[i - h..=i + h]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(sum, count), e| (sum + e, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

/// Threshold-gated gain/loss over a series.
///
/// Consecutive differences are added to an open delta; once its
/// magnitude reaches `threshold` it is committed to gain or loss and
/// reset. Whatever remains open at the end of the series is dropped.
pub fn accumulate(series: &[f64], threshold: f64) -> GainLoss {
    let mut result = GainLoss::default();
    let mut open = 0.0;

    for w in series.windows(2) {
        open += w[1] - w[0];
        if open.abs() >= threshold {
            if open > 0.0 {
                result.gain += open;
            } else if open < 0.0 {
                result.loss -= open;
            }
            open = 0.0;
        }
    }

    result
}

/// The smoothed elevation series of a track, aligned point for point.
#[derive(Debug, Clone)]
pub struct ElevationProfile {
    smoothed: Vec<Option<f64>>,
}

impl ElevationProfile {
    pub fn new(track: &Track, window: usize) -> Self {
        Self {
            smoothed: smooth(&track.elevations(), window),
        }
    }

    pub fn smoothed(&self) -> &[Option<f64>] {
        &self.smoothed
    }

    /// Gain/loss over the whole track plus the smoothed min/max.
    pub fn stats(&self, threshold: f64) -> Result<ElevationStats> {
        let present: Vec<f64> = self.smoothed.iter().flatten().copied().collect();
        if present.is_empty() {
            return Err(EngineError::NoElevationData);
        }

        let GainLoss { gain, loss } = accumulate(&present, threshold);
        let min_elevation = present.iter().copied().fold(f64::INFINITY, f64::min);
        let max_elevation = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        debug!(
            "elevation stats: +{gain:.1} m / -{loss:.1} m over {} samples",
            present.len()
        );

        Ok(ElevationStats {
            total_gain: gain,
            total_loss: loss,
            min_elevation,
            max_elevation,
        })
    }

    /// Smoothed elevation at a distance along the track, interpolated
    /// between the neighbouring points.
    pub fn elevation_at(&self, track: &Track, distance: f64) -> Option<f64> {
        let loc = track.locate(distance);
        match (self.smoothed[loc.index], self.smoothed[loc.index + 1]) {
            (Some(a), Some(b)) => Some(a + loc.t * (b - a)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// The smoothed series between two distances: the interpolated
    /// value at `start`, every point strictly inside, then the value at
    /// `end`. Absent values are skipped.
    pub fn series_between(&self, track: &Track, start: f64, end: f64) -> Vec<f64> {
        let mut series = Vec::new();
        series.extend(self.elevation_at(track, start));
        series.extend(
            track
                .points()
                .iter()
                .zip(&self.smoothed)
                .filter(|(p, _)| p.cumulative_distance > start && p.cumulative_distance < end)
                .filter_map(|(_, e)| *e),
        );
        series.extend(self.elevation_at(track, end));
        series
    }

    /// Gain/loss between two distances, with a fresh open delta.
    pub fn gain_loss_between(&self, track: &Track, start: f64, end: f64, threshold: f64) -> GainLoss {
        accumulate(&self.series_between(track, start, end), threshold)
    }

    /// Chart samples between two distances: the interpolated point at
    /// `start`, every track point strictly inside, then `end`.
    pub fn samples_between(&self, track: &Track, start: f64, end: f64) -> Vec<ProfileSample> {
        let mut samples = vec![ProfileSample {
            distance: start,
            elevation: self.elevation_at(track, start),
        }];
        samples.extend(
            track
                .points()
                .iter()
                .zip(&self.smoothed)
                .filter(|(p, _)| p.cumulative_distance > start && p.cumulative_distance < end)
                .map(|(p, e)| ProfileSample {
                    distance: p.cumulative_distance,
                    elevation: *e,
                }),
        );
        if end > start {
            samples.push(ProfileSample {
                distance: end,
                elevation: self.elevation_at(track, end),
            });
        }
        samples
    }

    /// Smoothed elevation against cumulative distance, for charting.
    pub fn samples(&self, track: &Track) -> Vec<ProfileSample> {
        track
            .points()
            .iter()
            .zip(&self.smoothed)
            .map(|(p, e)| ProfileSample {
                distance: p.cumulative_distance,
                elevation: *e,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::tests::{raw, raw_ele};

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn smooth_preserves_length() {
        let input = some(&[1.0, 5.0, 2.0, 8.0, 3.0, 9.0, 4.0]);
        for window in [1, 3, 5, 7, 9] {
            assert_eq!(smooth(&input, window).len(), input.len());
        }
    }

    #[test]
    fn smooth_window_one_is_identity() {
        let input = vec![Some(1.0), None, Some(5.5), Some(-2.0)];
        assert_eq!(smooth(&input, 1), input);
    }

    #[test]
    fn smooth_shrinks_window_at_edges() {
        let input = some(&[0.0, 10.0, 20.0, 30.0, 40.0]);
        let out = smooth(&input, 5);

        // Endpoints keep their own value, index 1 averages 0..=2
        assert_eq!(out[0], Some(0.0));
        assert_eq!(out[1], Some(10.0));
        assert_eq!(out[2], Some(20.0));
        assert_eq!(out[4], Some(40.0));
    }

    #[test]
    fn smooth_averages_spike() {
        let out = smooth(&some(&[10.0, 10.0, 40.0, 10.0, 10.0]), 3);
        assert_eq!(out[2], Some(20.0));
        assert_eq!(out[1], Some(20.0));
    }

    #[test]
    fn smooth_skips_absent_values() {
        let input = vec![Some(10.0), None, Some(20.0)];
        let out = smooth(&input, 3);
        assert_eq!(out[1], Some(15.0));

        let gap = vec![Some(1.0), None, None, None, Some(2.0)];
        assert_eq!(smooth(&gap, 3)[2], None);
    }

    #[test]
    fn accumulate_monotonic_rise() {
        let threshold = 3.0;
        let series: Vec<f64> = (0..=100).map(|i| i as f64 * 0.7).collect();
        let rise = series[100] - series[0];

        let result = accumulate(&series, threshold);
        assert!(result.gain <= rise + 1e-9);
        assert!(rise - result.gain < threshold, "gain {} rise {}", result.gain, rise);
        assert_eq!(result.loss, 0.0);
    }

    #[test]
    fn accumulate_ignores_sub_threshold_oscillation() {
        let threshold = 3.0;
        let step = threshold - 0.01;
        let series: Vec<f64> = (0..50)
            .map(|i| if i % 2 == 0 { 100.0 } else { 100.0 + step })
            .collect();

        let result = accumulate(&series, threshold);
        assert_eq!(result.gain, 0.0);
        assert_eq!(result.loss, 0.0);
    }

    #[test]
    fn accumulate_commits_at_threshold() {
        let result = accumulate(&[0.0, 3.0, 0.0], 3.0);
        assert_eq!(result.gain, 3.0);
        assert_eq!(result.loss, 3.0);
    }

    #[test]
    fn accumulate_drops_trailing_residual() {
        let result = accumulate(&[0.0, 5.0, 7.0], 3.0);
        assert_eq!(result.gain, 5.0);
    }

    #[test]
    fn accumulate_zero_threshold_counts_every_step() {
        let result = accumulate(&[0.0, 1.0, 0.5, 2.0], 0.0);
        assert!((result.gain - 2.5).abs() < 1e-12);
        assert!((result.loss - 0.5).abs() < 1e-12);
    }

    #[test]
    fn accumulate_short_series() {
        assert_eq!(accumulate(&[], 3.0), GainLoss::default());
        assert_eq!(accumulate(&[42.0], 3.0), GainLoss::default());
    }

    #[test]
    fn stats_over_track() {
        let track = Track::new(&[
            raw_ele(0.0, 0.0, 100.0),
            raw_ele(0.0, 0.001, 110.0),
            raw_ele(0.0, 0.002, 120.0),
            raw_ele(0.0, 0.003, 105.0),
        ])
        .unwrap();
        let profile = ElevationProfile::new(&track, 1);
        let stats = profile.stats(3.0).unwrap();

        assert_eq!(stats.total_gain, 20.0);
        assert_eq!(stats.total_loss, 15.0);
        assert_eq!(stats.min_elevation, 100.0);
        assert_eq!(stats.max_elevation, 120.0);
    }

    #[test]
    fn stats_survive_nan_sample() {
        let track = Track::new(&[
            raw_ele(0.0, 0.000, 100.0),
            raw_ele(0.0, 0.001, f64::NAN),
            raw_ele(0.0, 0.002, 200.0),
            raw_ele(0.0, 0.003, 300.0),
            raw_ele(0.0, 0.004, 400.0),
        ])
        .unwrap();
        let profile = ElevationProfile::new(&track, 1);
        let stats = profile.stats(3.0).unwrap();

        assert_eq!(stats.total_gain, 300.0);
        assert_eq!(stats.total_loss, 0.0);
        let gl = profile.gain_loss_between(&track, 0.0, track.total_distance(), 3.0);
        assert_eq!(gl.gain, 300.0);
    }

    #[test]
    fn stats_without_elevation_fails() {
        let track = Track::new(&[raw(0.0, 0.0), raw(0.0, 0.001)]).unwrap();
        let profile = ElevationProfile::new(&track, 5);
        assert!(matches!(profile.stats(3.0), Err(EngineError::NoElevationData)));
    }

    #[test]
    fn elevation_at_interpolates() {
        let track = Track::new(&[raw_ele(0.0, 0.0, 100.0), raw_ele(0.0, 0.01, 200.0)]).unwrap();
        let profile = ElevationProfile::new(&track, 1);
        let mid = profile.elevation_at(&track, track.total_distance() / 2.0).unwrap();
        assert!((mid - 150.0).abs() < 1e-6);
    }

    #[test]
    fn series_between_includes_interior_points() {
        let track = Track::new(&[
            raw_ele(0.0, 0.0, 0.0),
            raw_ele(0.0, 0.01, 10.0),
            raw_ele(0.0, 0.02, 20.0),
            raw_ele(0.0, 0.03, 30.0),
        ])
        .unwrap();
        let profile = ElevationProfile::new(&track, 1);
        let d = track.points()[1].cumulative_distance;

        let series = profile.series_between(&track, d / 2.0, 2.5 * d);
        assert_eq!(series.len(), 4);
        assert!((series[0] - 5.0).abs() < 1e-6);
        assert_eq!(series[1], 10.0);
        assert_eq!(series[2], 20.0);
        assert!((series[3] - 25.0).abs() < 1e-6);
    }

    #[test]
    fn samples_between_slices_the_chart() {
        let track = Track::new(&[
            raw_ele(0.0, 0.00, 0.0),
            raw_ele(0.0, 0.01, 10.0),
            raw_ele(0.0, 0.02, 20.0),
            raw_ele(0.0, 0.03, 30.0),
        ])
        .unwrap();
        let profile = ElevationProfile::new(&track, 1);
        let d = track.points()[1].cumulative_distance;
        let end = track.points()[2].cumulative_distance;

        let slice = profile.samples_between(&track, d / 2.0, end);
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].distance, d / 2.0);
        assert!((slice[0].elevation.unwrap() - 5.0).abs() < 1e-6);
        assert_eq!(slice[1].elevation, Some(10.0));
        assert_eq!(slice[2].distance, end);
        assert_eq!(slice[2].elevation, Some(20.0));

        let point = profile.samples_between(&track, d, d);
        assert_eq!(point.len(), 1);
        assert_eq!(point[0].elevation, Some(10.0));
    }

    #[test]
    fn samples_align_with_distance() {
        let track = Track::new(&[raw_ele(0.0, 0.0, 5.0), raw(0.0, 0.01)]).unwrap();
        let samples = ElevationProfile::new(&track, 1).samples(&track);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].distance, 0.0);
        assert_eq!(samples[1].elevation, None);
    }
}
