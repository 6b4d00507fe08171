/*
    tapeflux

    Copyright 2024 The tapeflux Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/flux/flux_revolution.rs

    A single revolution of a flux capture.
*/

use crate::{
    flux::{histogram::FluxHistogram, FluxQuality, FluxStats, FluxTransition},
    util::round_to,
    DecodeError,
};
use std::cell::OnceCell;

/// The relative deviation from the running mean that ends sync pulse estimation.
pub const SYNC_DEVIATION: f64 = 0.15;

/// A struct representing one revolution of a flux capture.
///
/// Flux intervals are in capture time units. The sync pulse length (the nominal MFM bit cell
/// duration) is estimated on first use and cached for the life of the revolution, so that every
/// operation on the revolution uses the same estimate.
#[derive(Clone, Debug, Default)]
pub struct FluxRevolution {
    flux_deltas: Vec<f64>,
    sync_pulse_length: OnceCell<Option<f64>>,
}

impl From<Vec<f64>> for FluxRevolution {
    fn from(flux_deltas: Vec<f64>) -> Self {
        FluxRevolution {
            flux_deltas,
            sync_pulse_length: OnceCell::new(),
        }
    }
}

impl FluxRevolution {
    /// Create a new `FluxRevolution` from a list of flux intervals.
    pub fn from_f64(deltas: &[f64]) -> Self {
        FluxRevolution::from(deltas.to_vec())
    }

    /// Create a new `FluxRevolution` from a list of integer flux intervals.
    pub fn from_u32(deltas: &[u32]) -> Self {
        FluxRevolution::from(deltas.iter().map(|d| *d as f64).collect::<Vec<_>>())
    }

    pub fn flux_deltas(&self) -> &[f64] {
        &self.flux_deltas
    }

    #[inline]
    pub fn delta(&self, idx: usize) -> Option<f64> {
        self.flux_deltas.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.flux_deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flux_deltas.is_empty()
    }

    /// The total duration of the revolution.
    pub fn index_time(&self) -> f64 {
        self.flux_deltas.iter().sum()
    }

    /// Return the sync pulse length of the revolution, estimating it on first call.
    ///
    /// A track begins with a run of identical bit cells. The estimate is the running mean of the
    /// leading intervals, ending at the first interval (after the second) that deviates from the
    /// mean by more than 15%; that interval is included in the mean.
    pub fn sync_pulse_length(&self) -> Result<f64, DecodeError> {
        self.sync_pulse_length
            .get_or_init(|| {
                let estimate = Self::estimate_sync_pulse_length(&self.flux_deltas);
                match estimate {
                    Some(sync) => log::debug!(
                        "FluxRevolution::sync_pulse_length(): Sync pulse length = {}",
                        sync
                    ),
                    None => log::error!("FluxRevolution::sync_pulse_length(): Sync pulse length not estimated"),
                }
                estimate
            })
            .ok_or(DecodeError::SyncNotEstimated)
    }

    fn estimate_sync_pulse_length(deltas: &[f64]) -> Option<f64> {
        if deltas.len() < 3 {
            return None;
        }

        let mut sum = 0.0;
        let mut mean = 0.0;
        for (i, flux) in deltas.iter().enumerate() {
            sum += flux;
            mean = sum / (i + 1) as f64;
            if i > 1 && ((flux / mean) - 1.0).abs() > SYNC_DEVIATION {
                break;
            }
        }

        if mean.is_finite() && mean > 0.0 {
            Some(round_to(mean, 2))
        }
        else {
            None
        }
    }

    /// Classify a flux interval for the address mark search.
    /// The interval is rounded to one decimal place first.
    pub fn classify(&self, delta: f64) -> Result<FluxTransition, DecodeError> {
        let sync = self.sync_pulse_length()?;
        let flux = round_to(delta, 1);

        Ok(if flux >= sync * 1.75 && flux <= sync * 2.25 {
            FluxTransition::Long
        }
        else if flux >= sync * 1.25 && flux < sync * 1.75 {
            FluxTransition::Medium
        }
        else if flux >= sync * 0.75 && flux < sync * 1.25 {
            FluxTransition::Short
        }
        else {
            FluxTransition::Other
        })
    }

    /// Grade the timing of a flux interval for diagnostic display.
    pub fn quality(&self, delta: f64) -> Result<FluxQuality, DecodeError> {
        let sync = self.sync_pulse_length()?;

        Ok(if delta > sync * 2.25 {
            FluxQuality::TooLong
        }
        else if delta > sync * 1.9 {
            FluxQuality::MarkLong
        }
        else if delta < sync * 0.75 {
            FluxQuality::TooShort
        }
        else {
            FluxQuality::Nominal
        })
    }

    /// Collect classification and timing statistics over the revolution.
    pub fn stats(&self) -> Result<FluxStats, DecodeError> {
        let mut stats = FluxStats {
            shortest_flux: f64::MAX,
            ..FluxStats::default()
        };

        for delta in &self.flux_deltas {
            stats.total += 1;
            match self.classify(*delta)? {
                FluxTransition::Short => stats.short += 1,
                FluxTransition::Medium => stats.medium += 1,
                FluxTransition::Long => stats.long += 1,
                FluxTransition::Other => stats.other += 1,
            }
            match self.quality(*delta)? {
                FluxQuality::TooShort => stats.too_short += 1,
                FluxQuality::TooLong => stats.too_long += 1,
                FluxQuality::MarkLong => stats.mark_long += 1,
                FluxQuality::Nominal => {}
            }
            stats.shortest_flux = stats.shortest_flux.min(*delta);
            stats.longest_flux = stats.longest_flux.max(*delta);
        }

        if stats.total == 0 {
            stats.shortest_flux = 0.0;
        }
        Ok(stats)
    }

    /// Produce a [FluxHistogram] over a fraction of the flux deltas in the revolution.
    pub fn histogram(&self, fraction: f64) -> Option<FluxHistogram> {
        FluxHistogram::new(&self.flux_deltas, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_pulse_length_convergence() {
        let mut deltas = vec![100.0; 95];
        deltas.extend([150.0, 100.0, 200.0, 100.0]);
        let rev = FluxRevolution::from(deltas);
        // The deviating interval is part of the mean: (95 * 100 + 150) / 96
        assert_eq!(rev.sync_pulse_length().unwrap(), 100.52);
    }

    #[test]
    fn test_sync_pulse_length_ignores_early_deviation() {
        // The first two intervals are never tested against the mean.
        let rev = FluxRevolution::from_u32(&[60, 140, 100, 100, 100, 200]);
        assert_eq!(rev.sync_pulse_length().unwrap(), 116.67);
    }

    #[test]
    fn test_sync_pulse_length_whole_revolution() {
        let rev = FluxRevolution::from_f64(&[100.0, 101.0, 99.0, 100.0]);
        assert_eq!(rev.sync_pulse_length().unwrap(), 100.0);
    }

    #[test]
    fn test_sync_pulse_length_not_estimated() {
        assert!(matches!(
            FluxRevolution::from_f64(&[100.0, 100.0]).sync_pulse_length(),
            Err(DecodeError::SyncNotEstimated)
        ));
        assert!(matches!(
            FluxRevolution::from_f64(&[0.0, 0.0, 0.0]).sync_pulse_length(),
            Err(DecodeError::SyncNotEstimated)
        ));
    }

    #[test]
    fn test_classify() {
        let rev = FluxRevolution::from_f64(&[100.0; 10]);
        assert_eq!(rev.classify(74.9).unwrap(), FluxTransition::Other);
        assert_eq!(rev.classify(75.0).unwrap(), FluxTransition::Short);
        assert_eq!(rev.classify(124.9).unwrap(), FluxTransition::Short);
        assert_eq!(rev.classify(125.0).unwrap(), FluxTransition::Medium);
        assert_eq!(rev.classify(174.9).unwrap(), FluxTransition::Medium);
        assert_eq!(rev.classify(175.0).unwrap(), FluxTransition::Long);
        assert_eq!(rev.classify(225.0).unwrap(), FluxTransition::Long);
        assert_eq!(rev.classify(225.1).unwrap(), FluxTransition::Other);
        // Rounded to one decimal place before classification
        assert_eq!(rev.classify(174.96).unwrap(), FluxTransition::Long);
    }

    #[test]
    fn test_quality() {
        let rev = FluxRevolution::from_f64(&[100.0; 10]);
        assert_eq!(rev.quality(100.0).unwrap(), FluxQuality::Nominal);
        assert_eq!(rev.quality(200.0).unwrap(), FluxQuality::MarkLong);
        assert_eq!(rev.quality(230.0).unwrap(), FluxQuality::TooLong);
        assert_eq!(rev.quality(70.0).unwrap(), FluxQuality::TooShort);
    }

    #[test]
    fn test_stats() {
        let mut deltas = vec![100.0; 10];
        deltas.extend([150.0, 200.0, 300.0]);
        let rev = FluxRevolution::from(deltas);
        let stats = rev.stats().unwrap();
        assert_eq!(stats.total, 13);
        assert_eq!(stats.short, 10);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.long, 1);
        assert_eq!(stats.other, 1);
        assert_eq!(stats.too_long, 1);
        assert_eq!(stats.mark_long, 1);
        assert_eq!(stats.longest_flux, 300.0);
    }
}
