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
*/

//! This module defines a [FluxHistogram] structure which summarizes the flux
//! timings of a revolution. MFM tracks show three peaks, at two, three and four
//! half bit cells; the first peak gives an independent estimate of the sync
//! pulse length for diagnostics.

use histogram::{Bucket, Histogram};

/// Flux intervals are binned in tenths of a capture time unit.
const DELTA_SCALE: f64 = 10.0;
/// A peak must hold at least this fraction of all binned intervals.
const PEAK_THRESHOLD: f64 = 0.005;

/// A local maximum of the timing histogram.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FluxPeak {
    /// The number of intervals in the peak's bucket.
    pub count: u64,
    /// The middle of the peak's bucket, in capture time units.
    pub center: f64,
}

pub struct FluxHistogram {
    peaks: Vec<FluxPeak>,
    total_time: f64,
}

impl FluxHistogram {
    /// Produce a [FluxHistogram] over a fraction of the flux deltas in the revolution.
    /// Returns `None` if the histogram could not be allocated.
    /// # Arguments
    /// * `deltas` - A slice of flux intervals
    /// * `fraction` - The fraction of the deltas to use in the histogram
    pub fn new(deltas: &[f64], fraction: f64) -> Option<Self> {
        // Max value power of 2^16 covers intervals up to 6553.6 time units.
        // Grouping power of 3 produces sharp spikes without false maxima.
        let mut histogram = match Histogram::new(3, 16) {
            Ok(histogram) => histogram,
            Err(e) => {
                log::error!("FluxHistogram::new(): Couldn't create histogram: {}", e);
                return None;
            }
        };

        let take_count = (deltas.len() as f64 * fraction).round() as usize;
        log::debug!("FluxHistogram::new(): Taking {} flux deltas", take_count);
        let mut total_time = 0.0;
        for delta in deltas.iter().take(take_count) {
            total_time += delta;
            _ = histogram.increment((delta * DELTA_SCALE).round() as u64);
        }

        let buckets: Vec<Bucket> = (&histogram).into_iter().collect();
        let peaks = Self::find_peaks(&buckets, take_count);
        log::debug!("FluxHistogram::new(): Found {} peaks", peaks.len());

        Some(FluxHistogram { peaks, total_time })
    }

    /// A bucket is a peak if it is no lower than the bucket before it, higher than the bucket
    /// after it, and clears the count threshold.
    fn find_peaks(buckets: &[Bucket], total: usize) -> Vec<FluxPeak> {
        let threshold = (total as f64 * PEAK_THRESHOLD).round() as u64;
        buckets
            .windows(3)
            .filter_map(|w| {
                let (count, before, after) = (w[1].count(), w[0].count(), w[2].count());
                (count >= before && count > after && count >= threshold).then(|| FluxPeak {
                    count,
                    center: ((w[1].start() + w[1].end()) / 2) as f64 / DELTA_SCALE,
                })
            })
            .collect()
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// The peaks in order of increasing flux time.
    pub fn peaks(&self) -> &[FluxPeak] {
        &self.peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mfm_like() -> Vec<f64> {
        let mut deltas = Vec::new();
        for i in 0..3000 {
            deltas.push(match i % 6 {
                0 | 1 | 2 => 100.0,
                3 | 4 => 150.0,
                _ => 200.0,
            });
        }
        deltas
    }

    #[test]
    fn test_three_peaks() {
        let histogram = FluxHistogram::new(&mfm_like(), 1.0).unwrap();
        let peaks = histogram.peaks();
        let counts: Vec<u64> = peaks.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![1500, 1000, 500]);

        // Bucket centers land within an eighth of the nominal interval.
        for (peak, nominal) in peaks.iter().zip([100.0, 150.0, 200.0]) {
            assert!((peak.center - nominal).abs() < nominal / 8.0, "peak {:?}", peak);
        }
    }

    #[test]
    fn test_sparse_bucket_is_not_a_peak() {
        let mut deltas = mfm_like();
        // 5 of 3005 intervals is under the 0.5% threshold.
        deltas.extend([400.0; 5]);
        let histogram = FluxHistogram::new(&deltas, 1.0).unwrap();
        assert_eq!(histogram.peaks().len(), 3);
    }

    #[test]
    fn test_fraction() {
        let histogram = FluxHistogram::new(&mfm_like(), 0.5).unwrap();
        // 250 cycles of 3 x 100 + 2 x 150 + 200
        assert_eq!(histogram.total_time(), 200_000.0);
    }

    #[test]
    fn test_empty() {
        let histogram = FluxHistogram::new(&[], 1.0).unwrap();
        assert!(histogram.peaks().is_empty());
        assert_eq!(histogram.total_time(), 0.0);
    }
}
