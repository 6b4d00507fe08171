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

    tests/common/mod.rs

    Common support routines for tests: synthetic tape recordings and MFM flux tracks.
*/
#![allow(dead_code)]

use tapeflux::util::{adc_checksum, crc_ccitt_marked, DAM_PREFIX, IDAM_PREFIX};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The length of a "0" impulse in synthetic recordings, in samples.
pub const ZERO: usize = 10;
/// The length of a "1" impulse in synthetic recordings, in samples.
pub const ONE: usize = 20;
/// The samples of opposite polarity separating impulses in rendered recordings.
pub const GAP: usize = 5;

fn block_marker() -> Vec<usize> {
    let mut m = vec![4 * ZERO];
    m.extend(std::iter::repeat(ZERO).take(7));
    m.extend([4 * ZERO, ONE, ZERO]);
    m
}

fn trailer_marker() -> Vec<usize> {
    let mut m = vec![9 * ZERO];
    m.extend(std::iter::repeat(ZERO).take(255));
    m.extend([4 * ZERO, ONE, ZERO]);
    m
}

fn byte_impulses(byte: u8) -> Vec<usize> {
    let mut out = Vec::with_capacity(16);
    for i in 0..8 {
        out.push(if byte & (1 << i) != 0 { ONE } else { ZERO });
        out.push(ZERO);
    }
    out
}

/// Encode a tape file as impulse lengths: pilot, header, body, checksum and trailer.
/// If `checksum` is `None` the correct checksum of `body` is recorded.
pub fn tape_impulses(start_address: u16, name: &[u8; 16], body: &[u8], checksum: Option<u16>) -> Vec<usize> {
    let mut out = vec![ZERO; 400];
    out.extend([4 * ZERO, ONE, ZERO]);

    out.extend(block_marker());
    let mut header = Vec::new();
    header.extend(start_address.to_le_bytes());
    header.extend((body.len() as u16).to_le_bytes());
    header.extend(name);
    for byte in header {
        out.extend(byte_impulses(byte));
    }

    out.extend(block_marker());
    for byte in body {
        out.extend(byte_impulses(*byte));
    }

    let checksum = checksum.unwrap_or_else(|| adc_checksum(body));
    for byte in checksum.to_le_bytes() {
        out.extend(byte_impulses(byte));
    }

    out.extend(trailer_marker());
    out
}

/// Render impulse lengths as samples: each impulse is a positive run followed by a short
/// negative run. If `invert` is set the waveform is negated.
pub fn render_samples(impulses: &[usize], invert: bool) -> Vec<i16> {
    let level: i16 = if invert { -1000 } else { 1000 };
    let mut samples = Vec::new();
    for len in impulses {
        samples.extend(std::iter::repeat(level).take(*len));
        samples.extend(std::iter::repeat(-level).take(GAP));
    }
    samples
}

/// A sector to be written to a synthetic MFM track.
#[derive(Clone, Debug)]
pub struct TestSector {
    pub track: u8,
    pub side: u8,
    pub sector: u8,
    pub size_code: u8,
    pub payload: Vec<u8>,
    pub corrupt_id_crc: bool,
    pub corrupt_data_crc: bool,
}

impl TestSector {
    pub fn new(track: u8, side: u8, sector: u8, size_code: u8) -> Self {
        let size = 128usize << size_code;
        TestSector {
            track,
            side,
            sector,
            size_code,
            payload: (0..size).map(|i| (i * 7 + sector as usize * 13) as u8).collect(),
            corrupt_id_crc: false,
            corrupt_data_crc: false,
        }
    }
}

/// Lay out sectors as (byte, is_sync) pairs in the order they are recorded.
pub fn track_bytes(sectors: &[TestSector]) -> Vec<(u8, bool)> {
    let mut out = Vec::new();
    let plain = |out: &mut Vec<(u8, bool)>, bytes: &[u8]| out.extend(bytes.iter().map(|b| (*b, false)));

    for s in sectors {
        plain(&mut out, &[0x00; 12]);
        out.extend([(0xA1, true); 3]);
        let id = [s.track, s.side, s.sector, s.size_code];
        let mut id_crc = crc_ccitt_marked(&IDAM_PREFIX, &id);
        if s.corrupt_id_crc {
            id_crc ^= 0xFFFF;
        }
        plain(&mut out, &[0xFE]);
        plain(&mut out, &id);
        plain(&mut out, &id_crc.to_be_bytes());

        plain(&mut out, &[0x4E; 22]);
        plain(&mut out, &[0x00; 12]);
        out.extend([(0xA1, true); 3]);
        let mut data_crc = crc_ccitt_marked(&DAM_PREFIX, &s.payload);
        if s.corrupt_data_crc {
            data_crc ^= 0xFFFF;
        }
        plain(&mut out, &[0xFB]);
        plain(&mut out, &s.payload);
        plain(&mut out, &data_crc.to_be_bytes());
        plain(&mut out, &[0x4E; 40]);
    }
    out
}

/// MFM encode bytes into flux intervals with a bit cell of 50 time units. Sync bytes are written
/// as 0xA1 with a missing clock.
pub fn mfm_flux(bytes: &[(u8, bool)]) -> Vec<f64> {
    let mut cells = Vec::new();
    let mut prev = false;
    for (byte, sync) in bytes {
        if *sync {
            cells.extend((0..16).rev().map(|i| 0x4489u16 & (1 << i) != 0));
            prev = true;
            continue;
        }
        for i in (0..8).rev() {
            let bit = byte & (1 << i) != 0;
            cells.push(!prev && !bit);
            cells.push(bit);
            prev = bit;
        }
    }
    let ones: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|(_, c)| **c)
        .map(|(i, _)| i)
        .collect();
    ones.windows(2).map(|w| (w[1] - w[0]) as f64 * 50.0).collect()
}

/// A small deterministic generator for reproducible timing jitter.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    /// A uniform value in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Scale each flux interval by a random factor in `1 ± amount`.
pub fn jitter_flux(deltas: &[f64], amount: f64, seed: u64) -> Vec<f64> {
    let mut lcg = Lcg::new(seed);
    deltas
        .iter()
        .map(|d| d * (1.0 + amount * (2.0 * lcg.unit() - 1.0)))
        .collect()
}

/// Move each impulse length by a random whole number of samples in `-spread..=spread`.
pub fn jitter_impulses(impulses: &[usize], spread: usize, seed: u64) -> Vec<usize> {
    let mut lcg = Lcg::new(seed);
    impulses
        .iter()
        .map(|len| len + (lcg.unit() * (2 * spread + 1) as f64) as usize - spread)
        .collect()
}
