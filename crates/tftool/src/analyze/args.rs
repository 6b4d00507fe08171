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
use crate::args::*;
use bpaf::{construct, long, Parser};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub(crate) struct AnalyzeParams {
    pub(crate) in_file: PathBuf,
    pub(crate) debug: u32,
    pub(crate) fraction: f64,
}

fn fraction_parser() -> impl Parser<f64> {
    long("fraction")
        .argument::<f64>("FRACTION")
        .help("The fraction of each revolution to build the timing histogram from")
        .fallback(1.0)
        .guard(|&f| f > 0.0 && f <= 1.0, "Fraction must be greater than 0 and at most 1")
}

pub(crate) fn analyze_parser() -> impl Parser<AnalyzeParams> {
    let in_file = in_file_parser();
    let debug = debug_parser();
    let fraction = fraction_parser();

    construct!(AnalyzeParams {
        in_file,
        debug,
        fraction
    })
}
