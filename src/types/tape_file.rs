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

    src/types/tape_file.rs

    The tape file record recovered by the tape decoder.
*/

use crate::{
    util::{adc_checksum, octal},
    DecodeError,
};
use binrw::{binrw, BinRead};
use std::{
    fmt::{self, Display, Formatter},
    io::Cursor,
};

/// The length in bytes of the header segment of a tape file.
pub const TAPE_HEADER_LEN: usize = 20;

/// The header segment of a tape file, as recorded on tape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[binrw]
#[brw(little)]
pub struct TapeHeader {
    pub start_address: u16,
    pub length: u16,
    pub name: [u8; 16],
}

impl TapeHeader {
    /// Parse a header from the raw bytes of the header segment.
    pub fn from_bytes(bytes: &[u8]) -> Result<TapeHeader, DecodeError> {
        TapeHeader::read(&mut Cursor::new(bytes)).map_err(|e| DecodeError::HeaderParse(e.to_string()))
    }
}

/// A program file recovered from tape.
///
/// The stored checksum is kept exactly as read from the signal. Whether it matches the
/// body is derived on request by [TapeFile::checksum_valid].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TapeFile {
    /// The load address of the file.
    pub start_address: u16,
    /// The length of the body in bytes.
    pub length: u16,
    /// The raw 16-byte name field.
    pub name: [u8; 16],
    /// The body of the file. Always `length` bytes long.
    pub body: Vec<u8>,
    /// The checksum as read from the tape.
    pub checksum: u16,
}

impl TapeFile {
    pub fn from_parts(header: &TapeHeader, body: Vec<u8>, checksum: u16) -> Self {
        TapeFile {
            start_address: header.start_address,
            length: header.length,
            name: header.name,
            body,
            checksum,
        }
    }

    pub fn header(&self) -> TapeHeader {
        TapeHeader {
            start_address: self.start_address,
            length: self.length,
            name: self.name,
        }
    }

    /// Return the file name with trailing padding removed. Bytes outside of ASCII are replaced.
    pub fn name_str(&self) -> String {
        let end = self
            .name
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |p| p + 1);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Calculate the additive checksum of the body.
    pub fn computed_checksum(&self) -> u16 {
        adc_checksum(&self.body)
    }

    /// Returns true if the checksum read from tape matches the body.
    pub fn checksum_valid(&self) -> bool {
        self.checksum == self.computed_checksum()
    }
}

impl Display for TapeFile {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "[{:16}] start: {} length: {} checksum: {} ({})",
            self.name_str(),
            octal(self.start_address),
            octal(self.length),
            octal(self.checksum),
            if self.checksum_valid() { "valid" } else { "invalid" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_from_bytes() {
        let mut bytes = vec![0x00, 0x02, 0x05, 0x00];
        bytes.extend_from_slice(b"HELLO           ");
        let header = TapeHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.start_address, 0o1000);
        assert_eq!(header.length, 5);
        assert_eq!(&header.name, b"HELLO           ");
    }

    #[test]
    fn test_header_too_short() {
        assert!(TapeHeader::from_bytes(&[0x00, 0x02, 0x05]).is_err());
    }

    #[test]
    fn test_name_str_trims_padding() {
        let mut file = TapeFile::default();
        file.name[..4].copy_from_slice(b"GAME");
        file.name[4..].fill(b' ');
        assert_eq!(file.name_str(), "GAME");
    }

    #[test]
    fn test_checksum_valid() {
        let header = TapeHeader {
            start_address: 0o1000,
            length: 3,
            name: [b' '; 16],
        };
        let file = TapeFile::from_parts(&header, vec![1, 2, 3], 6);
        assert!(file.checksum_valid());
        let bad = TapeFile { checksum: 7, ..file };
        assert!(!bad.checksum_valid());
        assert_eq!(bad.body, vec![1, 2, 3]);
    }
}
