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

//! Primitives for decoding MFM floppy tracks captured as flux transition
//! intervals: a [FluxRevolution] holding one revolution's intervals and its
//! estimated sync pulse length, the address mark search, and the MFM
//! bitstream decoder.

use std::{
    fmt,
    fmt::{Display, Formatter},
};

pub mod flux_revolution;
pub mod histogram;
pub mod marker;
pub mod mfm;

pub use flux_revolution::FluxRevolution;
pub use histogram::{FluxHistogram, FluxPeak};
pub use marker::{find_marker, SymbolRing, ADDRESS_MARK_PATTERN};
pub use mfm::{read_mfm, MfmBitstream, MfmByte};

/// Flux intervals more than this many sync pulse lengths long are a timing violation.
pub const FLUX_TOO_LONG: f64 = 2.8;

/// Classification of a flux interval relative to the sync pulse length of its revolution.
/// In MFM a flux interval spans two, three or four half bit cells.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FluxTransition {
    /// [0.75, 1.25) sync pulse lengths.
    Short,
    /// [1.25, 1.75) sync pulse lengths.
    Medium,
    /// [1.75, 2.25] sync pulse lengths.
    Long,
    /// Out of tolerance.
    Other,
}

impl Display for FluxTransition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FluxTransition::Short => write!(f, "S"),
            FluxTransition::Medium => write!(f, "M"),
            FluxTransition::Long => write!(f, "L"),
            FluxTransition::Other => write!(f, "X"),
        }
    }
}

/// Diagnostic timing quality of a flux interval.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FluxQuality {
    Nominal,
    /// Longer than 1.9 sync pulse lengths: the long interval of an address mark.
    MarkLong,
    /// Longer than 2.25 sync pulse lengths.
    TooLong,
    /// Shorter than 0.75 sync pulse lengths.
    TooShort,
}

#[derive(Default)]
pub struct FluxStats {
    pub total: u32,
    pub short: u32,
    pub medium: u32,
    pub long: u32,
    pub other: u32,
    pub too_short: u32,
    pub too_long: u32,
    pub mark_long: u32,

    pub shortest_flux: f64,
    pub longest_flux:  f64,
}

impl Display for FluxStats {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Total: {} S: {} M: {} L: {} X: {} Shortest: {} Longest: {} Too Short: {} Too Long: {} Mark: {}",
            self.total,
            self.short,
            self.medium,
            self.long,
            self.other,
            self.shortest_flux,
            self.longest_flux,
            self.too_short,
            self.too_long,
            self.mark_long
        )
    }
}
