/*
    tftool

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

//! Octal listings of recovered data, in the word-oriented layout of the BK-0010 monitor.

use std::io::Write;

use tapeflux::{
    types::{DiskSector, TapeFile},
    util::{bytes_to_word, octal, octal_byte},
};

const BYTES_PER_LINE: usize = 8;
const DATA_COLUMN_WIDTH: usize = 28;

fn display_char(byte: u8) -> char {
    if byte < 32 || byte > 126 {
        '.'
    }
    else {
        byte as char
    }
}

fn write_line<W: Write>(out: &mut W, address: u16, data: &str, chars: &str) -> std::io::Result<()> {
    writeln!(
        out,
        "{}: {:<width$} {}",
        octal(address),
        data,
        chars,
        width = DATA_COLUMN_WIDTH
    )
}

/// Write an octal listing of `data` as loaded at `address`.
///
/// Bytes are paired into little-endian words. If `address` is odd the first byte is listed alone
/// in the high half of the word at `address - 1`. A trailing unpaired byte is listed as a byte.
pub(crate) fn dump_octal<W: Write>(data: &[u8], address: u16, out: &mut W) -> std::io::Result<()> {
    let mut line_address = address;
    let mut data_str = String::new();
    let mut char_str = String::new();
    let mut low: Option<u8> = None;
    let mut line_ct = 0;
    let mut rest = data;

    if address % 2 == 1 {
        if let Some((first, tail)) = data.split_first() {
            line_address = address - 1;
            data_str.push_str(&format!("   {} ", octal_byte(*first)));
            char_str.push(' ');
            char_str.push(display_char(*first));
            line_ct = 2;
            rest = tail;
        }
    }

    for &byte in rest {
        char_str.push(display_char(byte));
        match low.take() {
            None => low = Some(byte),
            Some(low_byte) => {
                data_str.push_str(&octal(bytes_to_word(low_byte, byte)));
                data_str.push(' ');
            }
        }

        line_ct += 1;
        if line_ct == BYTES_PER_LINE {
            write_line(out, line_address, &data_str, &char_str)?;
            data_str.clear();
            char_str.clear();
            line_address = line_address.wrapping_add(BYTES_PER_LINE as u16);
            line_ct = 0;
        }
    }

    if let Some(low_byte) = low {
        data_str.push_str(&octal_byte(low_byte));
    }
    if !data_str.is_empty() {
        write_line(out, line_address, &data_str, &char_str)?;
    }
    Ok(())
}

/// Write the header fields of a tape file followed by an octal listing of its body.
pub(crate) fn dump_tape_file<W: Write>(file: &TapeFile, out: &mut W) -> std::io::Result<()> {
    writeln!(out, "File name:     [{}]", String::from_utf8_lossy(&file.name))?;
    writeln!(out, "Start address: {}", octal(file.start_address))?;
    writeln!(out, "Data length:   {}", octal(file.length))?;
    dump_octal(&file.body, file.start_address, out)
}

/// Write a one-line summary of a sector followed by an octal listing of its data.
pub(crate) fn dump_sector<W: Write>(sector: &DiskSector, out: &mut W) -> std::io::Result<()> {
    match &sector.data {
        Some(data) => {
            writeln!(
                out,
                "Sector {:2}: {} bytes, CRC {:04X} {}",
                sector.number,
                data.len(),
                sector.read_crc,
                if sector.is_valid() { "ok" } else { "BAD" }
            )?;
            dump_octal(data, 0, out)
        }
        None => writeln!(out, "Sector {:2}: no valid data", sector.number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump_to_string(data: &[u8], address: u16) -> String {
        let mut out = Vec::new();
        dump_octal(data, address, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_dump_full_line() {
        let text = dump_to_string(b"ABCDEFGH", 0o1000);
        assert_eq!(text, "001000: 041101 042103 043105 044107  ABCDEFGH\n");
    }

    #[test]
    fn test_dump_trailing_byte() {
        let text = dump_to_string(&[0x01, 0x00, 0x41], 0);
        assert_eq!(text, format!("000000: {:<28} ..A\n", "000001 101"));
    }

    #[test]
    fn test_dump_odd_address() {
        let text = dump_to_string(&[0x41, 0x42, 0x43], 0o1001);
        assert_eq!(text, format!("001000: {:<28}  ABC\n", "   101 041502 "));
    }

    #[test]
    fn test_dump_wraps_lines() {
        let data: Vec<u8> = (0..10).map(|i| b'a' + i).collect();
        let text = dump_to_string(&data, 0o2000);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("002000: "));
        assert!(lines[1].starts_with("002010: 065151 "));
        assert!(lines[1].ends_with(" ij"));
    }
}
