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

    src/util.rs

    Checksum algorithms and small numeric helpers.
*/

/// Seed value of the CRC-CCITT register.
pub const CRC_CCITT_SEED: u16 = 0xFFFF;
/// Generator polynomial of CRC-CCITT.
pub const CRC_CCITT_POLY: u16 = 0x1021;

/// The address mark prefix of a sector ID field: three sync bytes and the ID mark.
pub const IDAM_PREFIX: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xFE];
/// The address mark prefix of a sector data field: three sync bytes and the data mark.
pub const DAM_PREFIX: [u8; 4] = [0xA1, 0xA1, 0xA1, 0xFB];

/// Fold a carry out of bit 16 back into bit 0 (end-around carry).
#[inline]
pub fn adc(value: u32) -> u32 {
    if value > 0xFFFF {
        value - 0x1_0000 + 1
    }
    else {
        value
    }
}

/// Calculate the 16-bit additive checksum with end-around carry used by tape files.
pub fn adc_checksum(data: &[u8]) -> u16 {
    data.iter().fold(0u32, |sum, &byte| adc(sum + byte as u32)) as u16
}

/// Calculate CRC-CCITT (polynomial 0x1021) over `data`.
/// If `start` is `None` the register is seeded with 0xFFFF, otherwise the calculation continues
/// from the provided CRC value.
pub fn crc_ccitt(data: &[u8], start: Option<u16>) -> u16 {
    let mut crc = start.unwrap_or(CRC_CCITT_SEED);
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC_CCITT_POLY
            }
            else {
                crc << 1
            };
        }
    }
    crc
}

/// Calculate CRC-CCITT over an address mark prefix followed by `data`.
/// The prefix is covered by the CRC on disk but is not part of the returned payload.
pub fn crc_ccitt_marked(prefix: &[u8; 4], data: &[u8]) -> u16 {
    crc_ccitt(data, Some(crc_ccitt(prefix, None)))
}

/// Assemble a 16-bit word from its low and high bytes.
#[inline]
pub fn bytes_to_word(low: u8, high: u8) -> u16 {
    ((high as u16) << 8) | low as u16
}

/// Round `value` to `places` decimal places, halfway cases away from zero.
#[inline]
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Format a word as six octal digits, the customary notation for BK-0010 addresses.
pub fn octal(word: u16) -> String {
    format!("{:06o}", word)
}

/// Format a byte as three octal digits.
pub fn octal_byte(byte: u8) -> String {
    format!("{:03o}", byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adc_checksum_zero() {
        assert_eq!(adc_checksum(&[]), 0);
        assert_eq!(adc_checksum(&[0u8; 1000]), 0);
    }

    #[test]
    fn test_adc_checksum_end_around_carry() {
        // 0xFF * 258 = 0x1_00FE; exceeding 0xFFFF once wraps and adds the carry back in.
        let data = vec![0xFFu8; 258];
        let mut expected: u32 = 0;
        for _ in 0..258 {
            expected += 0xFF;
            if expected > 0xFFFF {
                expected = expected - 0x1_0000 + 1;
            }
        }
        assert_eq!(adc_checksum(&data), expected as u16);
        assert_eq!(adc_checksum(&data), 0x00FF);
    }

    #[test]
    fn test_adc_checksum_split_invariance() {
        let data: Vec<u8> = (0..2000u32).map(|i| (i * 37 + 11) as u8).collect();
        let whole = adc_checksum(&data);
        for split in [0, 1, 255, 256, 1000, 1999, 2000] {
            let (a, b) = data.split_at(split);
            let combined = adc(adc_checksum(a) as u32 + adc_checksum(b) as u32) as u16;
            assert_eq!(combined, whole, "split at {}", split);
        }
    }

    #[test]
    fn test_crc_ccitt_seed() {
        assert_eq!(crc_ccitt(&[], None), 0xFFFF);
    }

    #[test]
    fn test_crc_ccitt_check_value() {
        // Standard check value for CRC-16/IBM-3740.
        assert_eq!(crc_ccitt(b"123456789", None), 0x29B1);
    }

    #[test]
    fn test_crc_ccitt_sync_bytes() {
        // The well known CRC state after the three 0xA1 sync bytes of an MFM address mark.
        assert_eq!(crc_ccitt(&[0xA1, 0xA1, 0xA1], None), 0xCDB4);
    }

    #[test]
    fn test_crc_ccitt_marked_matches_concatenation() {
        let payload = [0x05u8, 0x00, 0x03, 0x02];
        let mut whole = IDAM_PREFIX.to_vec();
        whole.extend_from_slice(&payload);
        assert_eq!(crc_ccitt_marked(&IDAM_PREFIX, &payload), crc_ccitt(&whole, None));
    }

    #[test]
    fn test_crc_ccitt_single_bit_flips() {
        let data: Vec<u8> = (0..64u8).collect();
        let base = crc_ccitt(&data, None);
        let mut seen = std::collections::HashSet::new();
        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data.clone();
                flipped[byte] ^= 1 << bit;
                let crc = crc_ccitt(&flipped, None);
                assert_ne!(crc, base);
                assert!(seen.insert(crc), "collision flipping byte {} bit {}", byte, bit);
            }
        }
    }

    #[test]
    fn test_bytes_to_word() {
        assert_eq!(bytes_to_word(0x34, 0x12), 0x1234);
    }

    #[test]
    fn test_octal() {
        assert_eq!(octal(0o1000), "001000");
        assert_eq!(octal_byte(0xFF), "377");
    }
}
