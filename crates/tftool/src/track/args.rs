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
pub(crate) struct TrackParams {
    pub(crate) in_file: PathBuf,
    pub(crate) revolution: usize,
    pub(crate) sectors: usize,
    pub(crate) first_sector: u8,
    pub(crate) debug: u32,
    pub(crate) scan: bool,
    pub(crate) save_trk: bool,
    pub(crate) wav: Option<PathBuf>,
}

fn revolution_parser() -> impl Parser<usize> {
    long("revolution")
        .short('r')
        .argument::<usize>("REVOLUTION")
        .help("The revolution to read sectors from")
        .fallback(tapeflux::DEFAULT_REVOLUTION)
}

fn sectors_parser() -> impl Parser<usize> {
    long("sectors")
        .short('s')
        .argument::<usize>("COUNT")
        .help("The number of sectors expected on the track")
        .fallback(tapeflux::DEFAULT_SECTOR_COUNT)
        .guard(|&count| count > 0, "Sector count must be at least 1")
}

fn first_sector_parser() -> impl Parser<u8> {
    long("first-sector")
        .argument::<u8>("NUMBER")
        .help("The number of the first sector on the track, used to report missing sectors")
        .fallback(tapeflux::DEFAULT_FIRST_SECTOR)
}

fn scan_parser() -> impl Parser<bool> {
    long("scan")
        .help("List every sector ID on the revolution instead of reading sectors")
        .switch()
}

fn save_trk_parser() -> impl Parser<bool> {
    long("save-trk")
        .help("Save the track next to the input file, named after its track and side")
        .switch()
}

fn wav_parser() -> impl Parser<PathBuf> {
    long("wav")
        .argument::<PathBuf>("BASE_PATH")
        .help("Export each revolution as a square wave to BASE_PATH.<revolution>.wav")
}

pub(crate) fn track_parser() -> impl Parser<TrackParams> {
    let in_file = in_file_parser();
    let revolution = revolution_parser();
    let sectors = sectors_parser();
    let first_sector = first_sector_parser();
    let debug = debug_parser();
    let scan = scan_parser();
    let save_trk = save_trk_parser();
    let wav = wav_parser().optional();

    construct!(TrackParams {
        in_file,
        revolution,
        sectors,
        first_sector,
        debug,
        scan,
        save_trk,
        wav
    })
}
