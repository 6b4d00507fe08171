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
use bpaf::*;
use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use crate::{
    analyze::args::{analyze_parser, AnalyzeParams},
    tape::args::{tape_parser, TapeParams},
    track::args::{track_parser, TrackParams},
};

#[derive(Clone, Debug)]
pub enum Command {
    Version,
    Tape(TapeParams),
    Track(TrackParams),
    Analyze(AnalyzeParams),
}

impl Command {
    /// The diagnostic verbosity requested for the command.
    pub fn debug(&self) -> u32 {
        match self {
            Command::Version => 0,
            Command::Tape(params) => params.debug,
            Command::Track(params) => params.debug,
            Command::Analyze(params) => params.debug,
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Command::Version => write!(f, "version"),
            Command::Tape(_) => write!(f, "tape"),
            Command::Track(_) => write!(f, "track"),
            Command::Analyze(_) => write!(f, "analyze"),
        }
    }
}

#[derive(Debug)]
pub struct AppParams {
    pub global: GlobalOptions,
    pub command: Command,
}

#[derive(Debug)]
pub struct GlobalOptions {
    pub silent: bool,
}

pub fn global_options_parser() -> impl Parser<GlobalOptions> {
    let silent = long("silent")
        .help("Suppress all output except required output")
        .switch();

    construct!(GlobalOptions { silent })
}

pub(crate) fn in_file_parser() -> impl Parser<PathBuf> {
    long("in_file")
        .short('i')
        .argument::<PathBuf>("IN_FILE")
        .help("Path to input file")
}

pub(crate) fn debug_parser() -> impl Parser<u32> {
    long("debug")
        .short('d')
        .argument::<u32>("LEVEL")
        .help("Diagnostic verbosity. 0 is quiet, 10 and above enables per-pulse tracing")
        .fallback(0)
}

pub(crate) fn command_parser() -> impl Parser<AppParams> {
    let global = global_options_parser();

    let version = pure(Command::Version)
        .to_options()
        .command("version")
        .help("Display version information and exit");

    let tape = construct!(Command::Tape(tape_parser()))
        .to_options()
        .command("tape")
        .help("Recover a tape file from a WAV recording");
    let track = construct!(Command::Track(track_parser()))
        .to_options()
        .command("track")
        .help("Read the sectors of an MFM track file");
    let analyze = construct!(Command::Analyze(analyze_parser()))
        .to_options()
        .command("analyze")
        .help("Display flux timing statistics of an MFM track file");

    let command = construct!([version, tape, track, analyze]);

    construct!(AppParams { global, command })
}
