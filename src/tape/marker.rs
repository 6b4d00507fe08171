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

    src/tape/marker.rs

    Block marker detection.

    A marker is a lead impulse, further impulses up to a total of `impulses`,
    a long final impulse, and a "1"/"0" sync pair. It delimits the header,
    body and trailer of a tape file.
*/

use crate::tape::Calibration;
use std::fmt::{self, Display, Formatter};

/// The minimum length of a marker's final impulse, in multiples of the length of "0".
pub const MARKER_FINAL_COEFF: f64 = 3.5;

/// Describes the shape of a marker.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MarkerSpec {
    /// The number of impulses preceding the final impulse, including the lead impulse.
    pub impulses: usize,
    /// The minimum length of the lead impulse in "0" impulses, if checked.
    pub lead: Option<f64>,
    /// If true, violations are logged instead of raised.
    pub lenient: bool,
}

impl MarkerSpec {
    /// The marker preceding the header and the body segments.
    pub const BLOCK: MarkerSpec = MarkerSpec {
        impulses: 8,
        lead: None,
        lenient: false,
    };
    /// The marker ending a file. Its lead is at least as long as nine "0" impulses.
    pub const TRAILER: MarkerSpec = MarkerSpec {
        impulses: 256,
        lead: Some(9.0),
        lenient: true,
    };

    /// The total number of impulses a marker of this shape consumes.
    pub fn total_impulses(&self) -> usize {
        self.impulses + 3
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkerFault {
    LeadTooShort,
    FinalImpulseMissing,
    SyncOneMissing,
    SyncZeroMissing,
}

impl Display for MarkerFault {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            MarkerFault::LeadTooShort => write!(f, "lead impulse too short"),
            MarkerFault::FinalImpulseMissing => write!(f, "marker final impulse not found"),
            MarkerFault::SyncOneMissing => write!(f, "sync '1' after marker not found"),
            MarkerFault::SyncZeroMissing => write!(f, "sync '0' after marker not found"),
        }
    }
}

/// Tracks progress through a single marker.
#[derive(Clone, Debug)]
pub struct MarkerReader {
    spec: MarkerSpec,
    counter: usize,
}

impl MarkerReader {
    pub fn new(spec: MarkerSpec) -> Self {
        MarkerReader { spec, counter: 0 }
    }

    pub fn spec(&self) -> &MarkerSpec {
        &self.spec
    }

    /// The index of the next impulse within the marker.
    pub fn counter(&self) -> usize {
        self.counter
    }

    /// Consume one impulse of the marker. Returns `Ok(true)` when the marker's final sync "0"
    /// has been consumed.
    pub fn step(&mut self, len: usize, cal: &Calibration) -> Result<bool, MarkerFault> {
        let marker_len = self.spec.impulses;
        let length = len as f64;

        let fault = match self.counter {
            0 => match self.spec.lead {
                Some(lead) if length < (lead - 0.5) * cal.length_of_0 => Some(MarkerFault::LeadTooShort),
                _ => None,
            },
            c if c == marker_len && length < cal.length_of_0 * MARKER_FINAL_COEFF => {
                Some(MarkerFault::FinalImpulseMissing)
            }
            c if c == marker_len + 1 && len < cal.cutoff => Some(MarkerFault::SyncOneMissing),
            c if c == marker_len + 2 && len > cal.cutoff => Some(MarkerFault::SyncZeroMissing),
            _ => None,
        };

        if let Some(fault) = fault {
            if self.spec.lenient {
                log::debug!(
                    "MarkerReader::step(): Ignoring {} at marker impulse #{}, length {}",
                    fault,
                    self.counter,
                    len
                );
            }
            else {
                return Err(fault);
            }
        }

        if self.counter == marker_len + 2 {
            return Ok(true);
        }
        self.counter += 1;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cal() -> Calibration {
        Calibration::from_average(10.0)
    }

    fn run(reader: &mut MarkerReader, impulses: &[usize]) -> Result<Vec<bool>, (usize, MarkerFault)> {
        let cal = cal();
        impulses
            .iter()
            .enumerate()
            .map(|(i, len)| reader.step(*len, &cal).map_err(|f| (i, f)))
            .collect()
    }

    fn block_marker() -> Vec<usize> {
        let mut m = vec![40];
        m.extend(std::iter::repeat(10).take(7));
        m.extend([40, 20, 10]);
        m
    }

    #[test]
    fn test_block_marker() {
        let mut reader = MarkerReader::new(MarkerSpec::BLOCK);
        let done = run(&mut reader, &block_marker()).unwrap();
        assert_eq!(done.len(), MarkerSpec::BLOCK.total_impulses());
        assert!(done[..done.len() - 1].iter().all(|d| !d));
        assert_eq!(done.last(), Some(&true));
    }

    #[test]
    fn test_final_impulse_missing() {
        let mut impulses = block_marker();
        impulses[8] = 30;
        let mut reader = MarkerReader::new(MarkerSpec::BLOCK);
        assert_eq!(
            run(&mut reader, &impulses),
            Err((8, MarkerFault::FinalImpulseMissing))
        );
    }

    #[test]
    fn test_sync_pair_violations() {
        let mut impulses = block_marker();
        impulses[9] = 10;
        let mut reader = MarkerReader::new(MarkerSpec::BLOCK);
        assert_eq!(run(&mut reader, &impulses), Err((9, MarkerFault::SyncOneMissing)));

        let mut impulses = block_marker();
        impulses[10] = 20;
        let mut reader = MarkerReader::new(MarkerSpec::BLOCK);
        assert_eq!(run(&mut reader, &impulses), Err((10, MarkerFault::SyncZeroMissing)));
    }

    #[test]
    fn test_lead_too_short() {
        let spec = MarkerSpec {
            lenient: false,
            ..MarkerSpec::TRAILER
        };
        let mut reader = MarkerReader::new(spec);
        assert_eq!(reader.step(80, &cal()), Err(MarkerFault::LeadTooShort));

        let mut reader = MarkerReader::new(spec);
        assert_eq!(reader.step(85, &cal()), Ok(false));
    }

    #[test]
    fn test_lenient_trailer() {
        // A trailer with every landmark malformed still completes after its impulse count.
        let mut reader = MarkerReader::new(MarkerSpec::TRAILER);
        let cal = cal();
        let total = MarkerSpec::TRAILER.total_impulses();
        for i in 0..total - 1 {
            assert_eq!(reader.step(10, &cal), Ok(false), "impulse {}", i);
        }
        assert_eq!(reader.step(40, &cal), Ok(true));
    }
}
