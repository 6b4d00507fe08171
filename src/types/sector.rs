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

    src/types/sector.rs

    Sector records recovered by the MFM track decoder.
*/

use crate::util::{crc_ccitt_marked, DAM_PREFIX, IDAM_PREFIX};
use std::fmt::{self, Display, Formatter};

/// Return the payload size in bytes for a sector size code, or `None` if the code is not one
/// of the sizes used by the floppy format (1, 2 or 3).
pub fn sector_size(size_code: u8) -> Option<usize> {
    match size_code {
        1..=3 => Some(128 << size_code),
        _ => None,
    }
}

/// The result of a read at a flux position: the decoded value and the flux index at which the
/// next read should begin.
#[derive(Clone, Debug)]
pub struct SectorRead<T> {
    pub ptr: usize,
    pub value: T,
}

/// A sector ID field decoded from a track.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectorHeader {
    pub track: u8,
    pub side: u8,
    pub sector: u8,
    pub size_code: u8,
    /// The CRC as read from the track.
    pub read_crc: u16,
    /// Whether the sync bytes and ID mark were decoded as expected.
    /// If false, the remaining fields are unreliable.
    pub marks_valid: bool,
}

impl SectorHeader {
    /// Calculate the CRC of this header over the ID address mark and the four ID bytes.
    pub fn calculated_crc(&self) -> u16 {
        crc_ccitt_marked(&IDAM_PREFIX, &[self.track, self.side, self.sector, self.size_code])
    }

    pub fn crc_valid(&self) -> bool {
        self.read_crc == self.calculated_crc()
    }

    /// A header is valid if its address mark was recognized and its CRC matches.
    pub fn is_valid(&self) -> bool {
        self.marks_valid && self.crc_valid()
    }

    /// Return the payload size indicated by the size code, if legal.
    pub fn size(&self) -> Option<usize> {
        sector_size(self.size_code)
    }
}

impl Display for SectorHeader {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "[t:{} s:{} id:{} n:{}] crc: {:04X} ({})",
            self.track,
            self.side,
            self.sector,
            self.size_code,
            self.read_crc,
            if self.is_valid() { "valid" } else { "bad" }
        )
    }
}

/// A sector data field decoded from a track.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SectorData {
    /// Whether the sync bytes and data mark were decoded as expected.
    pub mark_valid: bool,
    /// The payload, or `None` if the data mark or the CRC did not match.
    pub data: Option<Vec<u8>>,
    pub read_crc: u16,
    pub calculated_crc: u16,
}

impl SectorData {
    pub fn crc_valid(&self) -> bool {
        self.mark_valid && self.read_crc == self.calculated_crc
    }
}

/// A sector recovered from a track: its ID and, if it passed its CRC, its payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiskSector {
    /// The sector number as recorded in the sector ID field.
    pub number: u8,
    pub size_code: u8,
    /// The payload. `None` if the data field failed its CRC or could not be found.
    pub data: Option<Vec<u8>>,
    /// The data CRC as read from the track.
    pub read_crc: u16,
}

impl DiskSector {
    pub fn new(number: u8, size_code: u8) -> Self {
        DiskSector {
            number,
            size_code,
            data: None,
            read_crc: 0,
        }
    }

    /// Return the payload size the size code calls for.
    pub fn expected_size(&self) -> Option<usize> {
        sector_size(self.size_code)
    }

    /// A sector is valid if it carries a payload of the size its size code calls for, and the
    /// CRC over the data address mark and payload matches the CRC read from the track.
    pub fn is_valid(&self) -> bool {
        match (&self.data, self.expected_size()) {
            (Some(data), Some(size)) => data.len() == size && crc_ccitt_marked(&DAM_PREFIX, data) == self.read_crc,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_size() {
        assert_eq!(sector_size(0), None);
        assert_eq!(sector_size(1), Some(256));
        assert_eq!(sector_size(2), Some(512));
        assert_eq!(sector_size(3), Some(1024));
        assert_eq!(sector_size(4), None);
    }

    #[test]
    fn test_header_crc() {
        let mut header = SectorHeader {
            track: 5,
            side: 0,
            sector: 3,
            size_code: 2,
            read_crc: 0,
            marks_valid: true,
        };
        header.read_crc = header.calculated_crc();
        assert!(header.is_valid());

        header.marks_valid = false;
        assert!(header.crc_valid());
        assert!(!header.is_valid());
    }

    #[test]
    fn test_sector_validity() {
        let data = vec![0xE5u8; 512];
        let mut sector = DiskSector::new(1, 2);
        assert!(!sector.is_valid());

        sector.read_crc = crc_ccitt_marked(&DAM_PREFIX, &data);
        sector.data = Some(data.clone());
        assert!(sector.is_valid());

        // Size code disagrees with payload length
        sector.size_code = 1;
        assert!(!sector.is_valid());

        sector.size_code = 2;
        sector.read_crc ^= 0x0100;
        assert!(!sector.is_valid());
    }
}
