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

    structs.rs

    Defines result structs
*/

use crate::types::{DiskSector, SectorHeader, TrackConsistency};
use std::collections::BTreeMap;

/// A `ReadTrackResult` structure contains the results of a read track operation.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadTrackResult {
    /// Sectors whose ID field passed its CRC, keyed by sector number. A sector whose data field
    /// failed its CRC is present with a `data` of `None`.
    pub sectors: BTreeMap<u8, DiskSector>,
    /// Every sector ID field encountered, in track order, including invalid ones.
    pub headers: Vec<SectorHeader>,
    /// Recoverable anomalies encountered reading the track.
    pub consistency: TrackConsistency,
    /// The number of sectors recovered with a valid payload.
    pub sectors_read: u16,
}

impl ReadTrackResult {
    /// Returns true if no sector ID was found on the track.
    pub fn not_found(&self) -> bool {
        self.headers.is_empty()
    }

    /// Return the payload of the sector with the given number, if it was recovered.
    pub fn sector_data(&self, number: u8) -> Option<&[u8]> {
        self.sectors.get(&number).and_then(|s| s.data.as_deref())
    }

    /// Return the sector numbers among the `count` numbers starting at `first` that were not
    /// recovered with a payload. BK-0010 formatted disks number their sectors from 1.
    pub fn missing(&self, first: u8, count: usize) -> Vec<u8> {
        (first..=u8::MAX)
            .take(count)
            .filter(|n| self.sector_data(*n).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(numbers: &[u8]) -> ReadTrackResult {
        let mut result = ReadTrackResult::default();
        for n in numbers {
            let mut sector = DiskSector::new(*n, 1);
            sector.data = Some(vec![0; 256]);
            result.sectors.insert(*n, sector);
        }
        result
    }

    #[test]
    fn test_missing_from_first_sector() {
        let result = result_with(&[0, 2]);
        assert_eq!(result.missing(0, 4), vec![1, 3]);
        // Sector 0 is outside a track numbered from 1.
        assert_eq!(result.missing(1, 4), vec![1, 3, 4]);
    }

    #[test]
    fn test_missing_ignores_sectors_without_payload() {
        let mut result = result_with(&[1]);
        result.sectors.insert(2, DiskSector::new(2, 1));
        assert_eq!(result.missing(1, 2), vec![2]);
    }

    #[test]
    fn test_missing_stops_at_last_number() {
        let result = result_with(&[254]);
        assert_eq!(result.missing(254, 10), vec![255]);
    }
}
