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

    src/tape/impulse.rs

    Polarity-aware impulse extraction from PCM samples.
*/

/// One half-cycle of the tape signal: a run of samples of the measured polarity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Impulse {
    /// The length of the run in samples.
    pub len: usize,
    /// The position of the impulse in the input. For impulses extracted from samples this is the
    /// 1-based index of the sample that terminated the run; for impulse lengths supplied directly
    /// it is the ordinal of the impulse.
    pub pos: usize,
}

/// An iterator adaptor producing [Impulse]s from a stream of signed 16-bit samples.
///
/// Only runs of samples where `(sample > 0) XOR invert` holds are measured. An impulse is
/// produced when the first sample of the opposite polarity arrives, so a run still open when
/// the samples are exhausted is discarded.
pub struct Impulses<I> {
    samples: I,
    invert: bool,
    pos: usize,
}

impl<I> Impulses<I>
where
    I: Iterator<Item = i16>,
{
    pub fn new(samples: I, invert: bool) -> Self {
        Impulses { samples, invert, pos: 0 }
    }

    /// The number of samples consumed so far.
    pub fn sample_pos(&self) -> usize {
        self.pos
    }
}

impl<I> Iterator for Impulses<I>
where
    I: Iterator<Item = i16>,
{
    type Item = Impulse;

    fn next(&mut self) -> Option<Impulse> {
        let mut len = 0;
        loop {
            let sample = self.samples.next()?;
            self.pos += 1;
            if (sample > 0) ^ self.invert {
                len += 1;
            }
            else if len != 0 {
                return Some(Impulse { len, pos: self.pos });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(samples: &[i16], invert: bool) -> Vec<usize> {
        Impulses::new(samples.iter().copied(), invert).map(|i| i.len).collect()
    }

    #[test]
    fn test_positive_runs() {
        let samples = [5, 6, 7, -1, -2, 3, 0, 9, 9, -4];
        assert_eq!(lengths(&samples, false), vec![3, 1, 2]);
    }

    #[test]
    fn test_inverted_runs() {
        // Zero counts as non-positive, so it belongs to the measured polarity when inverted.
        let samples = [5, -1, -2, 0, 3, -7, 4];
        assert_eq!(lengths(&samples, true), vec![3, 1]);
    }

    #[test]
    fn test_unterminated_run_discarded() {
        let samples = [1, 1, -1, 1, 1, 1];
        assert_eq!(lengths(&samples, false), vec![2]);
    }

    #[test]
    fn test_impulse_positions() {
        let samples = [-1, 1, 1, -1, 1, -1];
        let impulses: Vec<Impulse> = Impulses::new(samples.iter().copied(), false).collect();
        assert_eq!(impulses, vec![Impulse { len: 2, pos: 4 }, Impulse { len: 1, pos: 6 }]);
    }
}
