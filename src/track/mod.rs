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

    src/track/mod.rs

    Defines MfmTrack, a flux capture of one MFM floppy track.
*/

//! An [MfmTrack] holds the revolutions of one captured floppy track and reads
//! sectors from the revolution selected for analysis.
//!
//! A sector consists of an ID field (three 0xA1 sync bytes, the 0xFE ID mark,
//! track, side, sector number, size code and a CRC) followed by a data field
//! (three sync bytes, the 0xFB data mark, the payload and a CRC). Both fields
//! are located by their address mark and decoded flux by flux.

pub mod trk;

use crate::{
    flux::{find_marker, read_mfm, FluxRevolution, MfmBitstream, MfmByte},
    types::{sector_size, DiskSector, ReadTrackResult, SectorData, SectorHeader, SectorRead, TrackConsistency},
    util::{bytes_to_word, crc_ccitt_marked, DAM_PREFIX},
    DecodeError,
    DEFAULT_REVOLUTION,
    DEFAULT_SECTOR_COUNT,
};

/// The number of bytes in a sector ID field: marks, four ID bytes, and the CRC.
pub const SECTOR_ID_LEN: usize = 4 + 4 + 2;
/// The payload size assumed when a sector ID carries an unknown size code.
pub const FALLBACK_SECTOR_SIZE: usize = 512;

const ADDRESS_MARKS: [MfmByte; 3] = [MfmByte::SYNC_A1, MfmByte::SYNC_A1, MfmByte::SYNC_A1];

#[derive(Clone, Debug)]
pub struct MfmTrack {
    revolutions: Vec<FluxRevolution>,
    /// The revolution sectors are read from. Revolution 0 tends to be incomplete.
    pub revolution_to_analyze: usize,
    /// The number of sectors [MfmTrack::read_track] attempts to read.
    pub sector_count: usize,
    /// Diagnostic verbosity. Higher levels emit per-flux trace records.
    pub debug: u32,
    track_no: Option<u8>,
    side: Option<u8>,
    consistency: TrackConsistency,
}

impl Default for MfmTrack {
    fn default() -> Self {
        MfmTrack {
            revolutions: Vec::new(),
            revolution_to_analyze: DEFAULT_REVOLUTION,
            sector_count: DEFAULT_SECTOR_COUNT,
            debug: 0,
            track_no: None,
            side: None,
            consistency: TrackConsistency::empty(),
        }
    }
}

impl MfmTrack {
    pub fn new(debug: u32) -> Self {
        MfmTrack {
            debug,
            ..MfmTrack::default()
        }
    }

    pub fn from_revolutions(revolutions: Vec<FluxRevolution>, debug: u32) -> Self {
        MfmTrack {
            revolutions,
            debug,
            ..MfmTrack::default()
        }
    }

    pub fn add_revolution(&mut self, deltas: &[f64]) -> &mut FluxRevolution {
        self.revolutions.push(FluxRevolution::from_f64(deltas));
        let last = self.revolutions.len() - 1;
        &mut self.revolutions[last]
    }

    /// Set the revolution at `index`, padding any gap before it with empty revolutions.
    pub fn set_revolution(&mut self, index: usize, revolution: FluxRevolution) {
        if index >= self.revolutions.len() {
            self.revolutions.resize_with(index + 1, FluxRevolution::default);
        }
        self.revolutions[index] = revolution;
    }

    pub fn revolution_ct(&self) -> usize {
        self.revolutions.len()
    }

    pub fn revolution(&self, index: usize) -> Option<&FluxRevolution> {
        self.revolutions.get(index)
    }

    pub fn revolution_iter(&self) -> impl Iterator<Item = &FluxRevolution> {
        self.revolutions.iter()
    }

    /// The track number established by the first valid sector ID read.
    pub fn track_no(&self) -> Option<u8> {
        self.track_no
    }

    /// The side established by the first valid sector ID read.
    pub fn side(&self) -> Option<u8> {
        self.side
    }

    pub fn set_track_no(&mut self, track_no: Option<u8>) {
        self.track_no = track_no;
    }

    pub fn set_side(&mut self, side: Option<u8>) {
        self.side = side;
    }

    /// Anomalies accumulated since the last call to [MfmTrack::read_track] or
    /// [MfmTrack::scan_track].
    pub fn consistency(&self) -> TrackConsistency {
        self.consistency
    }

    /// Return the revolution selected for analysis.
    pub fn analyzed(&self) -> Result<&FluxRevolution, DecodeError> {
        match self.revolutions.get(self.revolution_to_analyze) {
            Some(revolution) if !revolution.is_empty() => Ok(revolution),
            _ => Err(DecodeError::NoRevolution(self.revolution_to_analyze)),
        }
    }

    /// Return the sync pulse length of the revolution selected for analysis.
    pub fn sync_pulse_length(&self) -> Result<f64, DecodeError> {
        self.analyzed()?.sync_pulse_length()
    }

    /// Find the next address mark at or after flux index `ptr`.
    pub fn find_marker(&self, ptr: usize) -> Result<Option<usize>, DecodeError> {
        find_marker(self.analyzed()?, ptr, self.debug)
    }

    /// Decode `len` bytes of MFM data starting at flux index `ptr`.
    pub fn read_mfm(&self, ptr: usize, len: usize) -> Result<Option<SectorRead<MfmBitstream>>, DecodeError> {
        read_mfm(self.analyzed()?, ptr, len, self.debug)
    }

    /// Locate the next address mark at or after `ptr` and decode `len` bytes from it.
    /// Returns the marker position along with the read.
    fn read_field(&self, ptr: usize, len: usize) -> Result<Option<(usize, SectorRead<Vec<MfmByte>>)>, DecodeError> {
        let marker = match self.find_marker(ptr)? {
            Some(marker) => marker,
            None => return Ok(None),
        };
        let read = match self.read_mfm(marker, len)? {
            Some(read) => read,
            None => return Ok(None),
        };
        Ok(Some((
            marker,
            SectorRead {
                ptr: read.ptr,
                value: read.value.bytes(),
            },
        )))
    }

    /// Compare the leading bytes of a field with its expected address marks, logging mismatches.
    fn expect_marks(&self, bytes: &[MfmByte], mark: MfmByte) -> bool {
        for (i, expected) in ADDRESS_MARKS.iter().chain(std::iter::once(&mark)).enumerate() {
            match bytes.get(i) {
                Some(actual) if actual == expected => {}
                actual => {
                    log::debug!(
                        "MfmTrack::expect_marks(): Byte #{}: Expected {}, got {}",
                        i + 1,
                        expected,
                        actual.map(|b| b.to_string()).unwrap_or_default()
                    );
                    return false;
                }
            }
        }
        true
    }

    /// Read the next sector ID field at or after flux index `ptr`.
    ///
    /// Returns `None` at the end of the track. A header whose address marks could not be decoded
    /// is returned with `marks_valid` false. When the header's CRC is valid, its track and side
    /// are reconciled with the track's: the first valid header sets them, and later conflicts are
    /// logged and flagged.
    pub fn read_sector_header(&mut self, ptr: usize) -> Result<Option<SectorRead<SectorHeader>>, DecodeError> {
        log::trace!("MfmTrack::read_sector_header(): Reading sector header @ {}", ptr);
        let (_, read) = match self.read_field(ptr, SECTOR_ID_LEN)? {
            Some(field) => field,
            None => return Ok(None),
        };

        let bytes = read.value;
        let marks_valid = self.expect_marks(&bytes, MfmByte::IDAM);
        let byte = |i: usize| bytes.get(i).map_or(0, |b| b.value);
        let header = SectorHeader {
            track: byte(4),
            side: byte(5),
            sector: byte(6),
            size_code: byte(7),
            read_crc: bytes_to_word(byte(9), byte(8)),
            marks_valid,
        };

        if !marks_valid {
            self.consistency |= TrackConsistency::BAD_ADDRESS_MARK;
            return Ok(Some(SectorRead {
                ptr: read.ptr,
                value: header,
            }));
        }

        log::debug!(
            "MfmTrack::read_sector_header(): Sector header: track: {} side: {} sector: {} size: {} read crc: {:04X} computed crc: {:04X} ({})",
            header.track,
            header.side,
            header.sector,
            header.size_code,
            header.read_crc,
            header.calculated_crc(),
            if header.crc_valid() { "success" } else { "failed" }
        );

        if header.crc_valid() {
            self.reconcile(&header);
        }
        else {
            self.consistency |= TrackConsistency::BAD_ADDRESS_CRC;
        }

        Ok(Some(SectorRead {
            ptr: read.ptr,
            value: header,
        }))
    }

    fn reconcile(&mut self, header: &SectorHeader) {
        match self.track_no {
            None => self.track_no = Some(header.track),
            Some(track_no) if track_no != header.track => {
                log::warn!(
                    "MfmTrack::reconcile(): Track number mismatch: existing {}, read {}",
                    track_no,
                    header.track
                );
                self.consistency |= TrackConsistency::TRACK_MISMATCH;
            }
            _ => {}
        }

        match self.side {
            None => self.side = Some(header.side),
            Some(side) if side != header.side => {
                log::warn!("MfmTrack::reconcile(): Side mismatch: existing {}, read {}", side, header.side);
                self.consistency |= TrackConsistency::SIDE_MISMATCH;
            }
            _ => {}
        }
    }

    /// Read the next sector data field at or after flux index `ptr`, with a payload size given by
    /// `size_code`.
    ///
    /// Returns `None` at the end of the track. If the field does not start with the data address
    /// mark, the returned position is that of the mark found, so that a following header read
    /// starts there. A payload failing its CRC is discarded.
    pub fn read_sector_data(
        &mut self,
        ptr: usize,
        size_code: u8,
    ) -> Result<Option<SectorRead<SectorData>>, DecodeError> {
        log::trace!("MfmTrack::read_sector_data(): Reading sector data @ {}", ptr);
        let size = match sector_size(size_code) {
            Some(size) => size,
            None => {
                log::warn!(
                    "MfmTrack::read_sector_data(): Invalid size code {}, assuming {} bytes",
                    size_code,
                    FALLBACK_SECTOR_SIZE
                );
                self.consistency |= TrackConsistency::BAD_SIZE_CODE;
                FALLBACK_SECTOR_SIZE
            }
        };

        let (marker, read) = match self.read_field(ptr, 4 + size + 2)? {
            Some(field) => field,
            None => return Ok(None),
        };

        let bytes = read.value;
        if !self.expect_marks(&bytes, MfmByte::DAM) {
            self.consistency |= TrackConsistency::NO_DAM;
            return Ok(Some(SectorRead {
                ptr: marker,
                value: SectorData::default(),
            }));
        }

        let payload: Vec<u8> = bytes.iter().skip(4).take(size).map(|b| b.value).collect();
        let byte = |i: usize| bytes.get(i).map_or(0, |b| b.value);
        let read_crc = bytes_to_word(byte(4 + size + 1), byte(4 + size));
        let calculated_crc = crc_ccitt_marked(&DAM_PREFIX, &payload);
        let crc_valid = read_crc == calculated_crc;

        log::debug!(
            "MfmTrack::read_sector_data(): Sector data: read crc: {:04X} computed crc: {:04X} ({})",
            read_crc,
            calculated_crc,
            if crc_valid { "success" } else { "failed" }
        );
        if !crc_valid {
            self.consistency |= TrackConsistency::BAD_DATA_CRC;
        }

        Ok(Some(SectorRead {
            ptr: read.ptr,
            value: SectorData {
                mark_valid: true,
                data: crc_valid.then_some(payload),
                read_crc,
                calculated_crc,
            },
        }))
    }

    /// Read up to `sector_count` sectors from the track.
    ///
    /// Only sectors with a valid ID field are recorded. A sector whose data field is missing or
    /// fails its CRC is recorded without a payload. Reading stops early at the end of the track.
    pub fn read_track(&mut self) -> Result<ReadTrackResult, DecodeError> {
        self.consistency = TrackConsistency::empty();
        let mut result = ReadTrackResult::default();
        let mut ptr = 0;

        for _ in 0..self.sector_count {
            let header = match self.read_sector_header(ptr)? {
                Some(read) => {
                    ptr = read.ptr;
                    read.value
                }
                None => break,
            };
            result.headers.push(header.clone());
            if !header.marks_valid {
                continue;
            }

            let data = match self.read_sector_data(ptr, header.size_code)? {
                Some(read) => {
                    ptr = read.ptr;
                    read.value
                }
                None => break,
            };

            if header.crc_valid() {
                let sector = DiskSector {
                    number: header.sector,
                    size_code: header.size_code,
                    data: data.data,
                    read_crc: data.read_crc,
                };
                if sector.data.is_some() {
                    result.sectors_read += 1;
                }
                if result.sectors.insert(header.sector, sector).is_some() {
                    log::warn!(
                        "MfmTrack::read_track(): Sector {} was read more than once",
                        header.sector
                    );
                }
            }
        }

        log::debug!("MfmTrack::read_track(): Total sectors read: {}", result.sectors_read);
        result.consistency = self.consistency;
        Ok(result)
    }

    /// Read only the sector ID fields of the track, until its end.
    /// Fields not starting with an ID address mark, such as data fields, are skipped.
    pub fn scan_track(&mut self) -> Result<Vec<SectorHeader>, DecodeError> {
        self.consistency = TrackConsistency::empty();
        let mut headers = Vec::new();
        let mut ptr = 0;

        while let Some(read) = self.read_sector_header(ptr)? {
            if read.value.marks_valid {
                log::debug!("MfmTrack::scan_track(): {}", read.value);
                headers.push(read.value);
            }
            if read.ptr <= ptr {
                break;
            }
            ptr = read.ptr;
        }

        // Every data field was read as an ID field.
        self.consistency.remove(TrackConsistency::BAD_ADDRESS_MARK);
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let track = MfmTrack::default();
        assert_eq!(track.revolution_to_analyze, 1);
        assert_eq!(track.sector_count, 10);
        assert_eq!(track.track_no(), None);
        assert_eq!(track.side(), None);
    }

    #[test]
    fn test_missing_revolution() {
        let mut track = MfmTrack::new(0);
        track.add_revolution(&[100.0; 50]);
        assert!(matches!(track.read_track(), Err(DecodeError::NoRevolution(1))));

        track.revolution_to_analyze = 0;
        let result = track.read_track().unwrap();
        assert!(result.not_found());
        assert!(result.sectors.is_empty());
    }

    #[test]
    fn test_set_revolution_fills_gaps() {
        let mut track = MfmTrack::default();
        track.set_revolution(2, FluxRevolution::from_f64(&[100.0; 10]));
        assert_eq!(track.revolution_ct(), 3);
        assert!(track.revolution(1).is_some_and(|r| r.is_empty()));
        assert!(matches!(track.analyzed(), Err(DecodeError::NoRevolution(1))));
    }

    #[test]
    fn test_reconcile() {
        let mut track = MfmTrack::default();
        let mut header = SectorHeader {
            track: 3,
            side: 1,
            ..SectorHeader::default()
        };
        track.reconcile(&header);
        assert_eq!(track.track_no(), Some(3));
        assert_eq!(track.side(), Some(1));
        assert!(track.consistency().is_empty());

        header.track = 4;
        track.reconcile(&header);
        assert_eq!(track.track_no(), Some(3));
        assert!(track.consistency().contains(TrackConsistency::TRACK_MISMATCH));
        assert!(!track.consistency().contains(TrackConsistency::SIDE_MISMATCH));
    }
}
