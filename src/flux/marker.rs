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

    src/flux/marker.rs

    Address mark search over a classified flux stream.
*/

use crate::{
    flux::{flux_revolution::FluxRevolution, FluxTransition},
    DecodeError,
};

/// The number of flux intervals covered by an address mark.
pub const MARK_LEN: usize = 15;

use crate::flux::FluxTransition::{Long as L, Medium as M, Short as S};

/// The flux intervals of three 0xA1 sync bytes with missing clocks, ending with the first
/// interval of the following mark byte.
pub const ADDRESS_MARK_PATTERN: [FluxTransition; MARK_LEN] = [L, M, L, M, S, L, M, L, M, S, L, M, L, M, S];

/// The intervals of a single sync byte with a missing clock, minus its final interval.
const MARK_WORD: [FluxTransition; 4] = [L, M, L, M];

/// A fixed-size ring buffer holding the classification of the last [MARK_LEN] flux intervals.
#[derive(Clone, Debug)]
pub struct SymbolRing {
    symbols: [FluxTransition; MARK_LEN],
    head: usize,
}

impl Default for SymbolRing {
    fn default() -> Self {
        SymbolRing {
            symbols: [FluxTransition::Other; MARK_LEN],
            head: 0,
        }
    }
}

impl SymbolRing {
    /// Push a symbol, evicting the oldest.
    pub fn push(&mut self, symbol: FluxTransition) {
        self.symbols[self.head] = symbol;
        self.head = (self.head + 1) % MARK_LEN;
    }

    /// Iterate over the symbols from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = FluxTransition> + '_ {
        (0..MARK_LEN).map(move |i| self.symbols[(self.head + i) % MARK_LEN])
    }

    /// Returns true if the window equals `pattern`.
    pub fn matches(&self, pattern: &[FluxTransition; MARK_LEN]) -> bool {
        self.iter().eq(pattern.iter().copied())
    }

    /// Returns true if the newest symbols equal `pattern`.
    pub fn ends_with(&self, pattern: &[FluxTransition]) -> bool {
        pattern.len() <= MARK_LEN && self.iter().skip(MARK_LEN - pattern.len()).eq(pattern.iter().copied())
    }
}

/// Search `revolution` for an address mark, starting at flux index `ptr`.
///
/// On a match, returns the index of the flux interval immediately preceding the mark's first
/// interval; MFM decoding starts there. Returns `None` when the revolution is exhausted.
pub fn find_marker(revolution: &FluxRevolution, ptr: usize, debug: u32) -> Result<Option<usize>, DecodeError> {
    let mut ring = SymbolRing::default();

    for (idx, delta) in revolution.flux_deltas().iter().enumerate().skip(ptr) {
        ring.push(revolution.classify(*delta)?);

        if debug >= 15 && ring.ends_with(&MARK_WORD) {
            log::trace!("find_marker(): Magic word found @ {}", idx.saturating_sub(4));
        }

        if ring.matches(&ADDRESS_MARK_PATTERN) {
            match idx.checked_sub(MARK_LEN) {
                Some(start) => {
                    log::debug!("find_marker(): Magic sequence found @ {}", start);
                    return Ok(Some(start));
                }
                None => {
                    log::warn!("find_marker(): Magic sequence at start of revolution has no lead-in, skipping");
                }
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN_DELTAS: [f64; MARK_LEN] = [
        200.0, 150.0, 200.0, 150.0, 100.0, 200.0, 150.0, 200.0, 150.0, 100.0, 200.0, 150.0, 200.0, 150.0, 100.0,
    ];

    #[test]
    fn test_ring_order() {
        let mut ring = SymbolRing::default();
        for symbol in ADDRESS_MARK_PATTERN {
            ring.push(symbol);
        }
        assert!(ring.matches(&ADDRESS_MARK_PATTERN));
        assert!(!ring.ends_with(&MARK_WORD));

        ring.push(S);
        assert!(!ring.matches(&ADDRESS_MARK_PATTERN));
    }

    #[test]
    fn test_empty_ring_never_matches() {
        let ring = SymbolRing::default();
        assert!(!ring.matches(&ADDRESS_MARK_PATTERN));
    }

    #[test]
    fn test_find_marker() {
        let mut deltas = vec![100.0; 20];
        deltas.push(150.0);
        deltas.extend(PATTERN_DELTAS);
        deltas.extend([100.0; 10]);
        let rev = FluxRevolution::from(deltas);

        // The pattern occupies indices 21..=35, so decoding starts at 20.
        assert_eq!(find_marker(&rev, 0, 0).unwrap(), Some(20));
        assert_eq!(find_marker(&rev, 10, 0).unwrap(), Some(20));
        // Starting inside the pattern misses it.
        assert_eq!(find_marker(&rev, 22, 0).unwrap(), None);
    }

    #[test]
    fn test_find_marker_tolerance() {
        let mut deltas = vec![100.0; 20];
        deltas.extend(PATTERN_DELTAS.iter().map(|d| d * 1.1));
        deltas.extend([100.0; 10]);
        let rev = FluxRevolution::from(deltas);
        assert_eq!(find_marker(&rev, 0, 20).unwrap(), Some(19));

        let mut deltas = vec![100.0; 20];
        let mut pattern = PATTERN_DELTAS;
        pattern[7] = 240.0;
        deltas.extend(pattern);
        let rev = FluxRevolution::from(deltas);
        assert_eq!(find_marker(&rev, 0, 0).unwrap(), None);
    }
}
