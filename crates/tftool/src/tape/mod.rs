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

use crate::{args::GlobalOptions, dump::dump_tape_file, wav::read_wav_samples};
use tapeflux::{TapeReader, TapeReaderOptions};

pub(crate) fn run(global: &GlobalOptions, params: &args::TapeParams) -> Result<(), Error> {
    let samples = read_wav_samples(&params.in_file)
        .with_context(|| format!("Couldn't read recording {}", params.in_file.display()))?;

    if !global.silent {
        println!("Read {} samples from {}", samples.len(), params.in_file.display());
    }

    let reader = TapeReader::new(TapeReaderOptions {
        invert_waveform: params.invert,
        debug: params.debug,
        trace_bytes: params.trace_bytes.clone(),
    });

    let file = reader.read_samples(samples)?;

    let mut buf = BufWriter::new(std::io::stdout());
    if !global.silent {
        dump_tape_file(&file, &mut buf)?;
    }
    writeln!(
        buf,
        "Checksum:      {} ({})",
        tapeflux::util::octal(file.checksum),
        if file.checksum_valid() {
            "valid".to_string()
        }
        else {
            format!("invalid, computed {}", tapeflux::util::octal(file.computed_checksum()))
        }
    )?;
    buf.flush()?;

    if let Some(out_file) = &params.out_file {
        std::fs::write(out_file, &file.body)
            .with_context(|| format!("Couldn't write file body to {}", out_file.display()))?;
        if !global.silent {
            println!("Wrote {} bytes to {}", file.body.len(), out_file.display());
        }
    }

    Ok(())
}
