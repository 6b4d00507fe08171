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

use crate::args::GlobalOptions;
use tapeflux::track::trk::load_trk_file;

pub(crate) fn run(global: &GlobalOptions, params: &args::AnalyzeParams) -> Result<(), Error> {
    let track = load_trk_file(&params.in_file, params.debug)
        .with_context(|| format!("Couldn't load track file {}", params.in_file.display()))?;

    if !global.silent {
        println!("{} revolution(s) in {}", track.revolution_ct(), params.in_file.display());
        println!("{}", "-".repeat(79));
    }

    for (rev_no, revolution) in track.revolution_iter().enumerate() {
        println!(
            "Revolution {}: {} transitions, index time {:.1}",
            rev_no,
            revolution.len(),
            revolution.index_time()
        );

        // A revolution without a usable sync length is reported but does not stop the listing.
        match revolution.stats() {
            Ok(stats) => {
                if let Ok(sync) = revolution.sync_pulse_length() {
                    println!("  Sync pulse length: {:.2}", sync);
                }
                println!("  {}", stats);
            }
            Err(e) => {
                println!("  {}", e);
                continue;
            }
        }

        if let Some(histogram) = revolution.histogram(params.fraction) {
            for peak in histogram.peaks() {
                println!("  Peak at {:.1}: {} transitions", peak.center, peak.count);
            }
            // The shortest interval class is only meaningful next to at least one other.
            match histogram.peaks() {
                [base, _, ..] => println!("  Base transition time: {:.1}", base.center),
                _ => log::warn!("run(): Not enough histogram peaks for a base transition time"),
            }
        }
    }

    Ok(())
}
