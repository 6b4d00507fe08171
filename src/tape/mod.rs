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

    src/tape/mod.rs

    Decoding of tape file recordings.
*/

//! The tape decoder reads a BK-0010 style tape file from a recording of its
//! signal. The recording is reduced to a sequence of impulses (half-cycles of
//! one polarity). A pilot tone of uniform short impulses calibrates the
//! threshold separating "0" from "1" impulses, after which markers delimit a
//! 20-byte header, the file body, a 16-bit checksum and a trailer.

pub mod decoder;
pub mod impulse;
pub mod marker;

use crate::{types::TapeFile, util::round_to, DecodeError};

pub use decoder::{ByteReader, TapeDecoder, TapeState};
pub use impulse::{Impulse, Impulses};
pub use marker::{MarkerFault, MarkerReader, MarkerSpec};

/// Impulses longer than `length_of_0 * CUTOFF_COEFF` encode "1"s; shorter ones encode "0"s.
pub const CUTOFF_COEFF: f64 = 1.6;
/// No bit impulse should be this long, in multiples of the length of "0".
pub const BIT_TOO_LONG: f64 = 2.8;
/// An impulse this many times longer than the pilot average ends the pilot.
pub const PILOT_END_COEFF: f64 = 3.5;
/// The minimum number of pilot impulses averaged before the end of the pilot is accepted.
pub const PILOT_MIN_IMPULSES: usize = 200;

/// The bit decision parameters derived from the pilot tone. Fixed for the rest of a read.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Calibration {
    /// The average length of a "0" impulse, rounded to two decimal places.
    pub length_of_0: f64,
    /// Impulses longer than this decode as "1".
    pub cutoff: usize,
}

impl Calibration {
    pub fn from_average(average: f64) -> Self {
        let length_of_0 = round_to(average, 2);
        Calibration {
            length_of_0,
            cutoff: (length_of_0 * CUTOFF_COEFF).round() as usize,
        }
    }

    /// Decode an impulse length into a bit.
    #[inline]
    pub fn bit(&self, len: usize) -> bool {
        len > self.cutoff
    }

    /// Impulses longer than this are a format error.
    #[inline]
    pub fn too_long_limit(&self) -> f64 {
        self.length_of_0 * BIT_TOO_LONG
    }
}

/// Accumulates pilot impulses until the pilot's terminating long impulse arrives.
#[derive(Clone, Debug, Default)]
pub struct PilotDetector {
    count: usize,
    total: usize,
}

impl PilotDetector {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Consume one impulse. Returns the calibration once the end of the pilot is detected.
    pub fn push(&mut self, len: usize) -> Option<Calibration> {
        if self.count >= PILOT_MIN_IMPULSES {
            let average = self.total as f64 / self.count as f64;
            if len as f64 > average * PILOT_END_COEFF {
                return Some(Calibration::from_average(average));
            }
        }
        self.total += len;
        self.count += 1;
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct TapeReaderOptions {
    /// Measure runs of non-positive samples instead of positive ones.
    pub invert_waveform: bool,
    /// Diagnostic verbosity. Higher levels emit per-impulse trace records.
    pub debug: u32,
    /// Body byte indices whose impulse positions are logged.
    pub trace_bytes: Vec<usize>,
}

/// Reads tape files from recordings.
#[derive(Clone, Debug, Default)]
pub struct TapeReader {
    options: TapeReaderOptions,
}

impl TapeReader {
    pub fn new(options: TapeReaderOptions) -> Self {
        TapeReader { options }
    }

    pub fn options(&self) -> &TapeReaderOptions {
        &self.options
    }

    /// Decode a tape file from signed 16-bit mono samples.
    pub fn read_samples<I>(&self, samples: I) -> Result<TapeFile, DecodeError>
    where
        I: IntoIterator<Item = i16>,
    {
        let impulses = Impulses::new(samples.into_iter(), self.options.invert_waveform);
        self.decode_impulses(impulses)
    }

    /// Decode a tape file from a sequence of impulse lengths in samples.
    pub fn read_impulses<I>(&self, lengths: I) -> Result<TapeFile, DecodeError>
    where
        I: IntoIterator<Item = usize>,
    {
        self.decode_impulses(
            lengths
                .into_iter()
                .enumerate()
                .map(|(pos, len)| Impulse { len, pos }),
        )
    }

    /// Decode a tape file from a sequence of impulses. Impulses after the end of the file are not
    /// consumed.
    pub fn decode_impulses<I>(&self, impulses: I) -> Result<TapeFile, DecodeError>
    where
        I: IntoIterator<Item = Impulse>,
    {
        let mut decoder = TapeDecoder::new(self.options.clone());
        for impulse in impulses {
            if decoder.process_impulse(impulse)? {
                break;
            }
        }

        let file = decoder.finish()?;
        log::info!(
            "TapeReader::decode_impulses(): Read complete. {} Validating checksum: {}",
            file,
            if file.checksum_valid() { "success" } else { "failed" }
        );
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_rounding() {
        let cal = Calibration::from_average(10.0);
        assert_eq!(cal.length_of_0, 10.0);
        assert_eq!(cal.cutoff, 16);
        assert!(!cal.bit(16));
        assert!(cal.bit(17));

        let cal = Calibration::from_average(31.0 / 3.0);
        assert_eq!(cal.length_of_0, 10.33);
        assert_eq!(cal.cutoff, 17);
    }

    #[test]
    fn test_pilot_minimum() {
        let mut pilot = PilotDetector::default();
        for _ in 0..199 {
            assert!(pilot.push(10).is_none());
        }
        // Only 199 impulses averaged: a long impulse is taken as part of the pilot.
        assert!(pilot.push(40).is_none());

        let mut pilot = PilotDetector::default();
        for _ in 0..PILOT_MIN_IMPULSES {
            assert!(pilot.push(10).is_none());
        }
        assert_eq!(pilot.push(40), Some(Calibration::from_average(10.0)));
    }

    #[test]
    fn test_pilot_end_threshold() {
        let mut pilot = PilotDetector::default();
        for _ in 0..300 {
            pilot.push(10);
        }
        // 35 is exactly 3.5 times the average and does not end the pilot.
        assert!(pilot.push(35).is_none());
        assert!(pilot.push(40).is_some());
    }
}
