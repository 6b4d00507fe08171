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
pub(crate) struct TapeParams {
    pub(crate) in_file: PathBuf,
    pub(crate) invert: bool,
    pub(crate) debug: u32,
    pub(crate) trace_bytes: Vec<usize>,
    pub(crate) out_file: Option<PathBuf>,
}

fn invert_parser() -> impl Parser<bool> {
    long("invert")
        .help("Measure the negative half-waves of the recording")
        .switch()
}

fn trace_byte_parser() -> impl Parser<Vec<usize>> {
    long("trace-byte")
        .argument::<usize>("INDEX")
        .help("Log the impulse position of the given body byte. May be repeated")
        .many()
}

fn out_file_parser() -> impl Parser<PathBuf> {
    long("out_file")
        .short('o')
        .argument::<PathBuf>("OUT_FILE")
        .help("Write the recovered file body to the given path")
}

pub(crate) fn tape_parser() -> impl Parser<TapeParams> {
    let in_file = in_file_parser();
    let invert = invert_parser();
    let debug = debug_parser();
    let trace_bytes = trace_byte_parser();
    let out_file = out_file_parser().optional();

    construct!(TapeParams {
        in_file,
        invert,
        debug,
        trace_bytes,
        out_file
    })
}
