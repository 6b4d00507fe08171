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

    src/tape/decoder.rs

    The tape file decoding state machine.
*/

use crate::{
    tape::{
        marker::{MarkerReader, MarkerSpec},
        Calibration,
        Impulse,
        PilotDetector,
        TapeReaderOptions,
    },
    types::{TapeFile, TapeHeader, TAPE_HEADER_LEN},
    util::{bytes_to_word, octal, octal_byte},
    DecodeError,
};
use std::fmt::{self, Display, Formatter};

/// The number of bytes in the checksum segment.
pub const CHECKSUM_LEN: usize = 2;

/// The externally visible state of a [TapeDecoder]. States are passed through in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TapeState {
    FindPilot,
    PilotFound,
    PilotFound2,
    HeaderMarker,
    ReadHeader,
    BodyMarker,
    ReadData,
    Checksum,
    EndTrailer,
    Done,
}

impl Display for TapeState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let name = match self {
            TapeState::FindPilot => "find_pilot",
            TapeState::PilotFound => "pilot_found",
            TapeState::PilotFound2 => "pilot_found2",
            TapeState::HeaderMarker => "header_marker",
            TapeState::ReadHeader => "read_header",
            TapeState::BodyMarker => "body_marker",
            TapeState::ReadData => "read_data",
            TapeState::Checksum => "cksum",
            TapeState::EndTrailer => "end_trailer",
            TapeState::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Assembles bytes from alternating data and sync impulses.
///
/// Each data impulse contributes one bit, least significant bit first. Every data impulse is
/// followed by a sync impulse which must decode as "0". The segment completes on the sync
/// impulse following the last bit of the last byte.
#[derive(Clone, Debug)]
pub struct ByteReader {
    bytes: Vec<u8>,
    expected: usize,
    byte: u8,
    bit_ct: u8,
    data_phase: bool,
}

impl ByteReader {
    pub fn new(expected: usize) -> Self {
        ByteReader {
            bytes: Vec::with_capacity(expected),
            expected,
            byte: 0,
            bit_ct: 0,
            data_phase: true,
        }
    }

    /// The number of bytes still to be read.
    pub fn remaining(&self) -> usize {
        self.expected.saturating_sub(self.bytes.len())
    }

    /// The number of complete bytes read so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_data_phase(&self) -> bool {
        self.data_phase
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Consume one impulse. Returns `Ok(true)` once the segment is complete.
    pub fn read_bit(&mut self, impulse: Impulse, cal: &Calibration) -> Result<bool, DecodeError> {
        if impulse.len as f64 > cal.too_long_limit() {
            log::error!(
                "ByteReader::read_bit(): Bit WAY too long ({}) @ {}, byte #{}",
                impulse.len,
                impulse.pos,
                self.bytes.len()
            );
            return Err(DecodeError::ImpulseTooLong {
                pos: impulse.pos,
                len: impulse.len,
                limit: cal.too_long_limit(),
            });
        }

        let bit = cal.bit(impulse.len);
        if self.data_phase {
            self.byte = (self.byte >> 1) | if bit { 0x80 } else { 0 };
            self.bit_ct += 1;
            if self.bit_ct == 8 {
                self.bytes.push(self.byte);
                self.bit_ct = 0;
                self.byte = 0;
            }
        }
        else {
            if bit {
                log::error!(
                    "ByteReader::read_bit(): Sync bit too long ({}) @ {}, byte #{}",
                    impulse.len,
                    impulse.pos,
                    self.bytes.len()
                );
                return Err(DecodeError::SyncBitTooLong {
                    pos: impulse.pos,
                    len: impulse.len,
                });
            }
            if self.remaining() == 0 {
                return Ok(true);
            }
        }

        self.data_phase = !self.data_phase;
        Ok(false)
    }
}

/// Per-phase decoder state. Each variant carries only what its phase needs.
#[derive(Clone, Debug, Default)]
enum Phase {
    #[default]
    FindPilot,
    PilotFound,
    PilotFound2,
    HeaderMarker(MarkerReader),
    ReadHeader(ByteReader),
    BodyMarker(MarkerReader, TapeHeader),
    ReadData(ByteReader, TapeHeader),
    Checksum(ByteReader, TapeHeader, Vec<u8>),
    EndTrailer(MarkerReader, TapeFile),
    Done(TapeFile),
}

impl Phase {
    fn state(&self) -> TapeState {
        match self {
            Phase::FindPilot => TapeState::FindPilot,
            Phase::PilotFound => TapeState::PilotFound,
            Phase::PilotFound2 => TapeState::PilotFound2,
            Phase::HeaderMarker(_) => TapeState::HeaderMarker,
            Phase::ReadHeader(_) => TapeState::ReadHeader,
            Phase::BodyMarker(..) => TapeState::BodyMarker,
            Phase::ReadData(..) => TapeState::ReadData,
            Phase::Checksum(..) => TapeState::Checksum,
            Phase::EndTrailer(..) => TapeState::EndTrailer,
            Phase::Done(_) => TapeState::Done,
        }
    }
}

/// Decodes one tape file from a stream of impulses.
///
/// A decoder is owned by a single read. Feed impulses in order to [TapeDecoder::process_impulse]
/// until it returns `true` or the input ends, then call [TapeDecoder::finish].
pub struct TapeDecoder {
    options: TapeReaderOptions,
    pilot: PilotDetector,
    calibration: Option<Calibration>,
    phase: Phase,
}

impl TapeDecoder {
    pub fn new(options: TapeReaderOptions) -> Self {
        TapeDecoder {
            options,
            pilot: PilotDetector::default(),
            calibration: None,
            phase: Phase::FindPilot,
        }
    }

    pub fn state(&self) -> TapeState {
        self.phase.state()
    }

    /// The calibration derived from the pilot tone, once found.
    pub fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    #[inline]
    fn verbose(&self, level: u32) -> bool {
        self.options.debug >= level
    }

    fn marker_step(
        &self,
        reader: &mut MarkerReader,
        impulse: Impulse,
        cal: &Calibration,
    ) -> Result<bool, DecodeError> {
        if self.verbose(15) {
            log::trace!(
                "TapeDecoder::marker_step(): Marker impulse #{} @ {}, length {}, expecting {} impulses",
                reader.counter(),
                impulse.pos,
                impulse.len,
                reader.spec().impulses
            );
        }
        reader.step(impulse.len, cal).map_err(|fault| {
            log::error!("TapeDecoder::marker_step(): {} @ {}", fault, impulse.pos);
            DecodeError::MarkerViolation { pos: impulse.pos, fault }
        })
    }

    /// Process one impulse. Returns `Ok(true)` once the file, including its trailer, has been
    /// read; further impulses are ignored.
    pub fn process_impulse(&mut self, impulse: Impulse) -> Result<bool, DecodeError> {
        let cal = match self.calibration {
            Some(cal) => cal,
            None => {
                if self.verbose(20) {
                    log::trace!("TapeDecoder::process_impulse(): -pilot- impulse length --> {}", impulse.len);
                }
                if let Some(cal) = self.pilot.push(impulse.len) {
                    log::debug!(
                        "TapeDecoder::process_impulse(): Pilot sequence found. Impulses: {} trailer: {} '0' length: {} cutoff: {}",
                        self.pilot.count(),
                        impulse.len,
                        cal.length_of_0,
                        cal.cutoff
                    );
                    self.calibration = Some(cal);
                    self.phase = Phase::PilotFound;
                }
                else if self.verbose(40) {
                    log::trace!(
                        "TapeDecoder::process_impulse(): Pilot impulse #{}, length: {}, total: {}",
                        self.pilot.count(),
                        impulse.len,
                        self.pilot.total()
                    );
                }
                return Ok(false);
            }
        };

        let phase = std::mem::take(&mut self.phase);
        let (next, done) = match phase {
            Phase::FindPilot => (Phase::PilotFound, false),
            Phase::PilotFound => {
                log::debug!(
                    "TapeDecoder::process_impulse(): Sync '1' after pilot: {}",
                    if cal.bit(impulse.len) { "success" } else { "failed" }
                );
                (Phase::PilotFound2, false)
            }
            Phase::PilotFound2 => {
                log::debug!(
                    "TapeDecoder::process_impulse(): Sync '0' after pilot: {}",
                    if impulse.len < cal.cutoff { "success" } else { "failed" }
                );
                (Phase::HeaderMarker(MarkerReader::new(MarkerSpec::BLOCK)), false)
            }
            Phase::HeaderMarker(mut marker) => {
                if self.marker_step(&mut marker, impulse, &cal)? {
                    log::debug!("TapeDecoder::process_impulse(): Reading file header...");
                    (Phase::ReadHeader(ByteReader::new(TAPE_HEADER_LEN)), false)
                }
                else {
                    (Phase::HeaderMarker(marker), false)
                }
            }
            Phase::ReadHeader(mut reader) => {
                if reader.read_bit(impulse, &cal)? {
                    let bytes = reader.into_bytes();
                    if self.verbose(10) {
                        log::trace!("TapeDecoder::process_impulse(): Raw header: {}", octal_bytes(&bytes));
                    }
                    let header = TapeHeader::from_bytes(&bytes)?;
                    log::debug!(
                        "TapeDecoder::process_impulse(): Header read. Start address: {} length: {} name: [{}]",
                        octal(header.start_address),
                        octal(header.length),
                        String::from_utf8_lossy(&header.name)
                    );
                    (Phase::BodyMarker(MarkerReader::new(MarkerSpec::BLOCK), header), false)
                }
                else {
                    (Phase::ReadHeader(reader), false)
                }
            }
            Phase::BodyMarker(mut marker, header) => {
                if self.marker_step(&mut marker, impulse, &cal)? {
                    if header.length == 0 {
                        log::debug!("TapeDecoder::process_impulse(): Empty file body. Reading checksum...");
                        (Phase::Checksum(ByteReader::new(CHECKSUM_LEN), header, Vec::new()), false)
                    }
                    else {
                        log::debug!("TapeDecoder::process_impulse(): Reading file body...");
                        let reader = ByteReader::new(header.length as usize);
                        (Phase::ReadData(reader, header), false)
                    }
                }
                else {
                    (Phase::BodyMarker(marker, header), false)
                }
            }
            Phase::ReadData(mut reader, header) => {
                if self.verbose(20) {
                    log::trace!(
                        "TapeDecoder::process_impulse(): -data- {} impulse length --> {}",
                        if reader.is_data_phase() { "data" } else { "sync" },
                        impulse.len
                    );
                }
                if self.options.trace_bytes.contains(&reader.len()) {
                    log::debug!(
                        "TapeDecoder::process_impulse(): Body byte #{} impulse @ sample {}",
                        reader.len(),
                        impulse.pos
                    );
                }
                let before = reader.len();
                let complete = reader.read_bit(impulse, &cal)?;
                if self.verbose(10) && reader.len() > before {
                    log::trace!(
                        "TapeDecoder::process_impulse(): byte {} of {} read",
                        octal(reader.len() as u16),
                        octal(header.length)
                    );
                }
                if complete {
                    log::debug!("TapeDecoder::process_impulse(): Reading checksum...");
                    let body = reader.into_bytes();
                    (Phase::Checksum(ByteReader::new(CHECKSUM_LEN), header, body), false)
                }
                else {
                    (Phase::ReadData(reader, header), false)
                }
            }
            Phase::Checksum(mut reader, header, body) => {
                if self.verbose(20) {
                    log::trace!(
                        "TapeDecoder::process_impulse(): -checksum- {} impulse length --> {}",
                        if reader.is_data_phase() { "data" } else { "sync" },
                        impulse.len
                    );
                }
                if reader.read_bit(impulse, &cal)? {
                    let bytes = reader.into_bytes();
                    let checksum = bytes_to_word(bytes[0], bytes[1]);
                    let file = TapeFile::from_parts(&header, body, checksum);
                    log::debug!(
                        "TapeDecoder::process_impulse(): Checksum read. File checksum: {} computed checksum: {}",
                        octal(file.checksum),
                        octal(file.computed_checksum())
                    );
                    (Phase::EndTrailer(MarkerReader::new(MarkerSpec::TRAILER), file), false)
                }
                else {
                    (Phase::Checksum(reader, header, body), false)
                }
            }
            Phase::EndTrailer(mut marker, file) => {
                if self.marker_step(&mut marker, impulse, &cal)? {
                    log::debug!("TapeDecoder::process_impulse(): Read completed successfully.");
                    (Phase::Done(file), true)
                }
                else {
                    (Phase::EndTrailer(marker, file), false)
                }
            }
            Phase::Done(file) => (Phase::Done(file), true),
        };

        self.phase = next;
        Ok(done)
    }

    /// Complete the read after the input has ended or [TapeDecoder::process_impulse] has
    /// returned `true`.
    ///
    /// Input ending inside the trailing marker is accepted, as the trailer is not validated.
    pub fn finish(self) -> Result<TapeFile, DecodeError> {
        match self.phase {
            Phase::Done(file) => Ok(file),
            Phase::EndTrailer(marker, file) => {
                log::warn!(
                    "TapeDecoder::finish(): Input ended within the trailing marker at impulse #{}",
                    marker.counter()
                );
                Ok(file)
            }
            Phase::FindPilot => {
                log::error!(
                    "TapeDecoder::finish(): No pilot sequence found in {} impulses",
                    self.pilot.count()
                );
                Err(DecodeError::PilotNotFound {
                    impulses: self.pilot.count(),
                })
            }
            phase => {
                log::error!("TapeDecoder::finish(): Input ended in state {}", phase.state());
                Err(DecodeError::Truncated { state: phase.state() })
            }
        }
    }
}

/// Format the bytes of a segment as octal for diagnostics.
pub(crate) fn octal_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| octal_byte(*b)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cal() -> Calibration {
        Calibration::from_average(10.0)
    }

    fn byte_impulses(byte: u8) -> Vec<usize> {
        let mut v = Vec::new();
        for bit in 0..8 {
            v.push(if byte & (1 << bit) != 0 { 20 } else { 10 });
            v.push(10);
        }
        v
    }

    fn feed(reader: &mut ByteReader, impulses: &[usize]) -> Result<Vec<bool>, DecodeError> {
        let cal = cal();
        impulses
            .iter()
            .enumerate()
            .map(|(pos, len)| reader.read_bit(Impulse { len: *len, pos }, &cal))
            .collect()
    }

    #[test]
    fn test_byte_reader_lsb_first() {
        let mut reader = ByteReader::new(1);
        let done = feed(&mut reader, &byte_impulses(0xA5)).unwrap();
        assert_eq!(done.len(), 16);
        assert!(done[..15].iter().all(|d| !d));
        assert!(done[15]);
        assert_eq!(reader.into_bytes(), vec![0xA5]);
    }

    #[test]
    fn test_byte_reader_two_bytes() {
        let mut impulses = byte_impulses(0x01);
        impulses.extend(byte_impulses(0x80));
        let mut reader = ByteReader::new(2);
        let done = feed(&mut reader, &impulses).unwrap();
        assert_eq!(done.iter().filter(|d| **d).count(), 1);
        assert_eq!(reader.into_bytes(), vec![0x01, 0x80]);
    }

    #[test]
    fn test_sync_bit_too_long() {
        let mut reader = ByteReader::new(1);
        let err = feed(&mut reader, &[10, 20]).unwrap_err();
        assert!(matches!(err, DecodeError::SyncBitTooLong { pos: 1, len: 20 }));
    }

    #[test]
    fn test_impulse_too_long() {
        // 2.8 x 10.0 = 28.0 is the limit, in either phase.
        let mut reader = ByteReader::new(1);
        assert!(feed(&mut reader, &[28, 10]).is_ok());
        let err = feed(&mut reader, &[29]).unwrap_err();
        assert!(matches!(err, DecodeError::ImpulseTooLong { len: 29, .. }));
    }

    #[test]
    fn test_finish_without_pilot() {
        let mut decoder = TapeDecoder::new(TapeReaderOptions::default());
        for pos in 0..100 {
            assert!(!decoder.process_impulse(Impulse { len: 10, pos }).unwrap());
        }
        assert_eq!(decoder.state(), TapeState::FindPilot);
        assert!(matches!(decoder.finish(), Err(DecodeError::PilotNotFound { impulses: 100 })));
    }

    #[test]
    fn test_truncated_after_pilot() {
        let mut decoder = TapeDecoder::new(TapeReaderOptions::default());
        for pos in 0..250 {
            decoder.process_impulse(Impulse { len: 12, pos }).unwrap();
        }
        decoder.process_impulse(Impulse { len: 48, pos: 250 }).unwrap();
        assert_eq!(decoder.state(), TapeState::PilotFound);

        let cal = decoder.calibration().unwrap();
        assert_eq!(cal.length_of_0, 12.0);
        assert_eq!(cal.cutoff, 19);

        // The sync pair after the pilot is not validated.
        decoder.process_impulse(Impulse { len: 5, pos: 251 }).unwrap();
        decoder.process_impulse(Impulse { len: 50, pos: 252 }).unwrap();
        assert_eq!(decoder.state(), TapeState::HeaderMarker);
        assert!(matches!(
            decoder.finish(),
            Err(DecodeError::Truncated {
                state: TapeState::HeaderMarker
            })
        ));
    }

    #[test]
    fn test_octal_bytes() {
        assert_eq!(octal_bytes(&[0, 8, 255]), "000 010 377");
    }
}
