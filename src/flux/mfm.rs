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

    src/flux/mfm.rs

    Decoding of flux intervals into an MFM data bitstream.
*/

use crate::{
    flux::{flux_revolution::FluxRevolution, FLUX_TOO_LONG},
    types::SectorRead,
    util::round_to,
    DecodeError,
};
use bit_vec::BitVec;
use std::fmt::{self, Display, Formatter};

/// A byte decoded from an MFM bitstream, with a mask of the bits whose clock was missing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MfmByte {
    pub value: u8,
    pub missing_clock: u8,
}

impl MfmByte {
    /// The 0xA1 sync byte, written with a missing clock between bits 3 and 2.
    pub const SYNC_A1: MfmByte = MfmByte::marked(0xA1, 0x04);
    /// The sector ID address mark.
    pub const IDAM: MfmByte = MfmByte::new(0xFE);
    /// The sector data address mark.
    pub const DAM: MfmByte = MfmByte::new(0xFB);

    pub const fn new(value: u8) -> Self {
        MfmByte { value, missing_clock: 0 }
    }

    pub const fn marked(value: u8, missing_clock: u8) -> Self {
        MfmByte { value, missing_clock }
    }

    pub fn has_missing_clock(&self) -> bool {
        self.missing_clock != 0
    }
}

impl Display for MfmByte {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for bit in (0..8).rev() {
            let c = if self.missing_clock & (1 << bit) != 0 {
                'o'
            }
            else if self.value & (1 << bit) != 0 {
                '1'
            }
            else {
                '0'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// The data bits decoded from a run of flux intervals.
///
/// Every decoded symbol is one data bit. A data "0" bit whose clock transition was omitted is
/// flagged in a parallel error mask. The first symbol decoded at an address mark belongs to the
/// interval preceding the mark and is not part of any byte.
#[derive(Clone, Debug, Default)]
pub struct MfmBitstream {
    bits: BitVec,
    missing_clock: BitVec,
}

impl MfmBitstream {
    pub fn with_capacity(symbols: usize) -> Self {
        MfmBitstream {
            bits: BitVec::with_capacity(symbols),
            missing_clock: BitVec::with_capacity(symbols),
        }
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
        self.missing_clock.push(false);
    }

    /// Push a "0" data bit whose clock transition is missing.
    pub fn push_missing_clock(&mut self) {
        self.bits.push(false);
        self.missing_clock.push(true);
    }

    /// The number of decoded symbols.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Assemble the symbols following the leading pad symbol into bytes, most significant bit
    /// first. A trailing partial byte is ignored.
    pub fn bytes(&self) -> Vec<MfmByte> {
        let mut bytes = Vec::with_capacity(self.bits.len() / 8);
        let mut idx = 1;
        while idx + 8 <= self.bits.len() {
            let mut byte = MfmByte::default();
            for i in idx..idx + 8 {
                byte.value = (byte.value << 1) | self.bits[i] as u8;
                byte.missing_clock = (byte.missing_clock << 1) | self.missing_clock[i] as u8;
            }
            bytes.push(byte);
            idx += 8;
        }
        bytes
    }
}

impl Display for MfmBitstream {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (bit, missing) in self.bits.iter().zip(self.missing_clock.iter()) {
            let c = match (bit, missing) {
                (_, true) => 'o',
                (true, false) => '1',
                (false, false) => '0',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Decode flux intervals starting at `ptr` into an MFM bitstream of `len` bytes plus the leading
/// pad symbol.
///
/// Intervals are rounded to one decimal place and measured against the sync pulse length `S` of
/// the revolution. An interval is consumed cell by cell: over 1.75 S it is a "0" followed by a
/// "0" with a missing clock; over S it yields a "0" and S is deducted from it; over 0.75 S it is a
/// "0"; under 0.25 S it is the remainder of the previous interval; otherwise it is a "1", and half
/// of S is deducted from the next interval.
///
/// Returns the decoded bitstream with the index of the next unconsumed interval, or `None` if the
/// revolution ended first.
pub fn read_mfm(
    revolution: &FluxRevolution,
    ptr: usize,
    len: usize,
    debug: u32,
) -> Result<Option<SectorRead<MfmBitstream>>, DecodeError> {
    let sync = revolution.sync_pulse_length()?;
    let limit = sync * FLUX_TOO_LONG;
    let target = len * 8 + 1;

    if debug >= 15 {
        log::trace!("read_mfm(): Sync pulse length = {} reading {} symbols @ {}", sync, target, ptr);
    }

    let mut bitstream = MfmBitstream::with_capacity(target + 1);
    let mut ptr = ptr;

    macro_rules! next_flux {
        () => {
            match revolution.delta(ptr) {
                Some(delta) => {
                    ptr += 1;
                    if debug >= 30 {
                        log::trace!("read_mfm():      Next flux read: {}", delta);
                    }
                    delta
                }
                None => {
                    log::debug!(
                        "read_mfm(): End of revolution after {} of {} symbols",
                        bitstream.len(),
                        target
                    );
                    return Ok(None);
                }
            }
        };
    }

    let mut flux = next_flux!();
    loop {
        let current = round_to(flux, 1);
        if debug >= 20 {
            log::trace!("read_mfm(): Current flux length: {}", current);
        }

        if current > limit {
            log::error!(
                "read_mfm(): Flux WAY too long ({}) @ {}, limit {:.2}",
                current,
                ptr - 1,
                limit
            );
            return Err(DecodeError::FluxTooLong {
                pos: ptr - 1,
                len: current,
                limit,
            });
        }

        if current > sync * 1.75 {
            // Address mark sync: a "0" followed by a "0" with no clock.
            bitstream.push(false);
            bitstream.push_missing_clock();
            flux = next_flux!();
        }
        else if current > sync {
            bitstream.push(false);
            flux = current - sync;
        }
        else if current > sync * 0.75 {
            bitstream.push(false);
            flux = next_flux!();
        }
        else if current < sync * 0.25 {
            flux = next_flux!();
        }
        else {
            bitstream.push(true);
            flux = next_flux!() - sync / 2.0;
        }

        if bitstream.len() >= target {
            break;
        }
    }

    if debug >= 20 {
        log::trace!("read_mfm(): Bitstream: {}", bitstream);
    }

    Ok(Some(SectorRead { ptr, value: bitstream }))
}
