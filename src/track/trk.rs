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

    src/track/trk.rs

    Plain-text persistence of flux captures.

    A .trk file lists each revolution under a "-----[n]" line, one flux
    interval per line followed by a comment with its index, and ends with
    "=====END".
*/

use crate::{flux::FluxRevolution, track::MfmTrack, DecodeError};
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const REVOLUTION_REX: &str = r"^-----\[(\d+)\]$";
const FLUX_REX: &str = r"^\s*([0-9]+(?:\.[0-9]+)?)(\s*#.*)?$";
const END_MARKER: &str = "=====END";

/// Return the single character code used for a side in track file names.
pub fn side_code(side: Option<u8>) -> char {
    match side {
        Some(0) => 'U',
        Some(1) => 'D',
        _ => '_',
    }
}

/// Build the file name of a track capture: `stem.TT.S.trk`.
/// An unknown track number is written as 00.
pub fn trk_file_name(stem: &str, track_no: Option<u8>, side: Option<u8>) -> String {
    format!("{}.{:02}.{}.trk", stem, track_no.unwrap_or(0), side_code(side))
}

/// Write the revolutions of `track` in track file format.
///
/// Flux values are written in their shortest exact decimal form, so that a loaded track is
/// identical to the saved one.
pub fn save_trk<W: Write>(track: &MfmTrack, writer: &mut W) -> Result<(), DecodeError> {
    for (rev_no, revolution) in track.revolution_iter().enumerate() {
        writeln!(writer, "-----[{}]", rev_no)?;
        for (idx, flux) in revolution.flux_deltas().iter().enumerate() {
            writeln!(writer, "{:>4} # {:05}", flux, idx)?;
        }
    }
    writeln!(writer, "{}", END_MARKER)?;
    Ok(())
}

/// Read a track in track file format. Revolutions missing from the listing are left empty.
pub fn load_trk<R: BufRead>(reader: R, debug: u32) -> Result<MfmTrack, DecodeError> {
    let revolution_rex = Regex::new(REVOLUTION_REX).map_err(|e| DecodeError::TrackFormat(e.to_string()))?;
    let flux_rex = Regex::new(FLUX_REX).map_err(|e| DecodeError::TrackFormat(e.to_string()))?;

    let mut track = MfmTrack::new(debug);
    let mut current: Option<(usize, Vec<f64>)> = None;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();

        if let Some(caps) = revolution_rex.captures(line) {
            if let Some((idx, deltas)) = current.take() {
                track.set_revolution(idx, FluxRevolution::from(deltas));
            }
            let idx = caps[1]
                .parse::<usize>()
                .map_err(|e| DecodeError::TrackFormat(format!("line {}: {}", line_no + 1, e)))?;
            current = Some((idx, Vec::new()));
        }
        else if let Some(caps) = flux_rex.captures(line) {
            let flux = caps[1]
                .parse::<f64>()
                .map_err(|e| DecodeError::TrackFormat(format!("line {}: {}", line_no + 1, e)))?;
            match current.as_mut() {
                Some((_, deltas)) => deltas.push(flux),
                None => {
                    return Err(DecodeError::TrackFormat(format!(
                        "line {}: flux value outside of a revolution",
                        line_no + 1
                    )))
                }
            }
        }
        else if line == END_MARKER {
            break;
        }
        else if !line.trim().is_empty() {
            return Err(DecodeError::TrackFormat(format!(
                "line {}: unrecognized line: {}",
                line_no + 1,
                line
            )));
        }
    }

    if let Some((idx, deltas)) = current.take() {
        track.set_revolution(idx, FluxRevolution::from(deltas));
    }

    log::debug!("load_trk(): Loaded {} revolutions", track.revolution_ct());
    Ok(track)
}

/// Save `track` next to `source`, in a file named after it with [trk_file_name].
/// Returns the path written.
pub fn save_trk_file(track: &MfmTrack, source: &Path) -> Result<PathBuf, DecodeError> {
    let stem = source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let path = dir.join(trk_file_name(&stem, track.track_no(), track.side()));

    let mut writer = BufWriter::new(File::create(&path)?);
    save_trk(track, &mut writer)?;
    writer.flush()?;
    log::debug!("save_trk_file(): Saved track to {}", path.display());
    Ok(path)
}

/// Load a track from a track file.
pub fn load_trk_file(path: &Path, debug: u32) -> Result<MfmTrack, DecodeError> {
    load_trk(BufReader::new(File::open(path)?), debug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_file_name() {
        assert_eq!(trk_file_name("disk", Some(5), Some(0)), "disk.05.U.trk");
        assert_eq!(trk_file_name("disk", Some(79), Some(1)), "disk.79.D.trk");
        assert_eq!(trk_file_name("disk", None, None), "disk.00._.trk");
    }

    #[test]
    fn test_save_format() {
        let mut track = MfmTrack::default();
        track.add_revolution(&[100.0, 150.5]);
        let mut out = Vec::new();
        save_trk(&track, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "-----[0]\n 100 # 00000\n150.5 # 00001\n=====END\n"
        );
    }

    #[test]
    fn test_load() {
        let text = "-----[0]\n  98 # 00000\n 102 # 00001\n-----[2]\n99.25\n=====END\n";
        let track = load_trk(Cursor::new(text), 0).unwrap();
        assert_eq!(track.revolution_ct(), 3);
        assert_eq!(track.revolution(0).unwrap().flux_deltas(), &[98.0, 102.0]);
        assert!(track.revolution(1).unwrap().is_empty());
        assert_eq!(track.revolution(2).unwrap().flux_deltas(), &[99.25]);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            load_trk(Cursor::new("-----[0]\nabc\n"), 0),
            Err(DecodeError::TrackFormat(_))
        ));
        assert!(matches!(
            load_trk(Cursor::new("100 # 00000\n"), 0),
            Err(DecodeError::TrackFormat(_))
        ));
    }
}
