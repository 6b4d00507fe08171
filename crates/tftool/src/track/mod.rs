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
pub(crate) mod args;

use anyhow::{Context, Error};
use std::io::{BufWriter, Write};

use crate::{args::GlobalOptions, dump::dump_sector, wav::export_revolutions};
use tapeflux::track::trk::{load_trk_file, save_trk_file, side_code};

pub(crate) fn run(global: &GlobalOptions, params: &args::TrackParams) -> Result<(), Error> {
    let mut track = load_trk_file(&params.in_file, params.debug)
        .with_context(|| format!("Couldn't load track file {}", params.in_file.display()))?;

    track.revolution_to_analyze = params.revolution;
    track.sector_count = params.sectors;

    if !global.silent {
        println!(
            "Loaded {} revolution(s) from {}",
            track.revolution_ct(),
            params.in_file.display()
        );
        println!(
            "Sync pulse length of revolution {}: {:.2}",
            params.revolution,
            track.sync_pulse_length()?
        );
    }

    if let Some(base) = &params.wav {
        let paths = export_revolutions(track.revolution_iter(), base)?;
        if !global.silent {
            for path in paths {
                println!("Exported {}", path.display());
            }
        }
    }

    let mut buf = BufWriter::new(std::io::stdout());

    if params.scan {
        let headers = track.scan_track()?;
        writeln!(buf, "Found {} sector IDs:", headers.len())?;
        for header in headers {
            writeln!(buf, "  {}", header)?;
        }
        buf.flush()?;
        return Ok(());
    }

    let result = track.read_track()?;

    writeln!(
        buf,
        "Track {} side {}: {} of {} sectors read",
        track.track_no().map_or("??".to_string(), |t| format!("{:02}", t)),
        side_code(track.side()),
        result.sectors_read,
        params.sectors
    )?;
    if !result.consistency.is_empty() {
        writeln!(buf, "Consistency: {:?}", result.consistency)?;
    }
    let missing = result.missing(params.first_sector, params.sectors);
    if !missing.is_empty() {
        writeln!(buf, "Missing sectors: {:?}", missing)?;
    }

    if !global.silent {
        for sector in result.sectors.values() {
            dump_sector(sector, &mut buf)?;
        }
    }
    buf.flush()?;

    if params.save_trk {
        let path = save_trk_file(&track, &params.in_file)?;
        if !global.silent {
            println!("Saved track to {}", path.display());
        }
    }

    Ok(())
}
