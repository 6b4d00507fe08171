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

//! # tapeflux
//!
//! tapeflux recovers data from physically recorded analog signals of two
//! legacy storage media:
//!
//! * Cassette tape recordings of BK-0010 style program files, supplied as a
//!   sequence of signed 16-bit PCM samples. See [`tape::TapeReader`].
//! * MFM floppy disk tracks captured as flux transition intervals, one
//!   sequence per disk revolution. See [`track::MfmTrack`].
//!
//! Neither medium provides ground truth: every recovered record is validated
//! only by the checksum carried in the signal itself. Checksum and structural
//! mismatches are reported on the recovered records. Conditions that make a
//! capture undecodable (no pilot tone, no sync pulse length, a malformed
//! pulse) abort the decode run with a [`DecodeError`].

pub mod flux;
pub mod tape;
pub mod track;
pub mod types;
pub mod util;

use thiserror::Error;

use crate::tape::{MarkerFault, TapeState};

/// The revolution of a flux capture analyzed by default. Revolution 0 tends to be incomplete.
pub const DEFAULT_REVOLUTION: usize = 1;
/// The number of sectors expected on a track by default.
pub const DEFAULT_SECTOR_COUNT: usize = 10;
/// The number of the first sector on a BK-0010 formatted track.
pub const DEFAULT_FIRST_SECTOR: u8 = 1;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No pilot tone was found in {impulses} impulses")]
    PilotNotFound { impulses: usize },
    #[error("The sync pulse length of the revolution could not be estimated")]
    SyncNotEstimated,
    #[error("Revolution {0} is not present in the track")]
    NoRevolution(usize),
    #[error("Block marker violation at impulse #{pos}: {fault}")]
    MarkerViolation { pos: usize, fault: MarkerFault },
    #[error("Bit impulse WAY too long ({len}) at impulse #{pos}, limit {limit:.2}")]
    ImpulseTooLong { pos: usize, len: usize, limit: f64 },
    #[error("Sync bit too long ({len}) at impulse #{pos}")]
    SyncBitTooLong { pos: usize, len: usize },
    #[error("Flux transition too long ({len}) at flux #{pos}, limit {limit:.2}")]
    FluxTooLong { pos: usize, len: f64, limit: f64 },
    #[error("Input ended while in state {state}")]
    Truncated { state: TapeState },
    #[error("The tape file header could not be parsed: {0}")]
    HeaderParse(String),
    #[error("Malformed track file: {0}")]
    TrackFormat(String),
    #[error("An IO error occurred reading or writing a track file: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Returns true if the error aborts the decode run it was raised in.
    /// Checksum and structural mismatches are never raised as errors, so every
    /// decoding error is fatal to its run. Persistence errors are not decoding errors.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::TrackFormat(_) | DecodeError::Io(_))
    }
}

/// Map an integer debug verbosity onto a [log::LevelFilter].
/// The debug level never changes decoder behavior.
pub fn log_level(debug: u32) -> log::LevelFilter {
    match debug {
        0 => log::LevelFilter::Info,
        1..=9 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

pub use crate::{
    flux::{flux_revolution::FluxRevolution, FluxTransition},
    tape::{TapeReader, TapeReaderOptions},
    track::MfmTrack,
    types::{DiskSector, ReadTrackResult, SectorHeader, TapeFile, TapeHeader, TrackConsistency},
};

pub mod prelude {
    pub use crate::{
        flux::{flux_revolution::FluxRevolution, FluxTransition},
        tape::{Impulse, TapeReader, TapeReaderOptions},
        track::{trk, MfmTrack},
        types::{DiskSector, ReadTrackResult, SectorHeader, TapeFile, TapeHeader, TrackConsistency},
        util::{adc_checksum, crc_ccitt},
        DecodeError,
    };
}
