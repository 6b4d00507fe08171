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

//! WAV input and output.

use anyhow::{bail, Error};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use tapeflux::FluxRevolution;

/// The sample rate of exported flux waveforms.
pub(crate) const EXPORT_SAMPLE_RATE: u32 = 22050;
/// The amplitude of exported flux waveforms.
pub(crate) const EXPORT_AMPLITUDE: i16 = 30000;
/// Flux intervals are divided by this to get a sample count.
const EXPORT_TIME_DIVISOR: f64 = 10.0;

/// Read the first channel of a 16-bit integer PCM WAV file.
pub(crate) fn read_wav_samples(path: &Path) -> Result<Vec<i16>, Error> {
    let reader = hound::WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!(
            "Unsupported WAV format: {} bit {:?}. Expected 16 bit integer PCM",
            spec.bits_per_sample,
            spec.sample_format
        );
    }
    log::debug!(
        "read_wav_samples(): {} channel(s) at {} Hz",
        spec.channels,
        spec.sample_rate
    );

    let channels = spec.channels.max(1) as usize;
    let samples = reader.into_samples::<i16>().collect::<Result<Vec<i16>, _>>()?;

    if channels > 1 {
        Ok(samples.into_iter().step_by(channels).collect())
    }
    else {
        Ok(samples)
    }
}

/// Render a revolution as a square wave which alternates polarity at each flux transition.
pub(crate) fn square_wave(revolution: &FluxRevolution) -> Vec<i16> {
    let mut samples = Vec::new();
    for (i, delta) in revolution.flux_deltas().iter().enumerate() {
        let len = ((delta / EXPORT_TIME_DIVISOR) as usize).max(1);
        let level = if i % 2 == 0 { EXPORT_AMPLITUDE } else { -EXPORT_AMPLITUDE };
        samples.extend(std::iter::repeat(level).take(len));
    }
    samples
}

/// Write `samples` to a mono 16-bit WAV file.
pub(crate) fn write_wav_samples(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Export each revolution as a square wave, to `{base}.{revolution}.wav`.
/// Returns the paths written.
pub(crate) fn export_revolutions<'a, I>(revolutions: I, base: &Path) -> Result<Vec<PathBuf>, Error>
where
    I: IntoIterator<Item = &'a FluxRevolution>,
{
    let mut paths = Vec::new();
    for (rev_no, revolution) in revolutions.into_iter().enumerate() {
        let path = PathBuf::from(format!("{}.{}.wav", base.display(), rev_no));
        write_wav_samples(&path, &square_wave(revolution), EXPORT_SAMPLE_RATE)?;
        log::debug!("export_revolutions(): Wrote revolution {} to {}", rev_no, path.display());
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_wave() {
        let rev = FluxRevolution::from_f64(&[30.0, 25.0, 5.0]);
        let samples = square_wave(&rev);
        assert_eq!(samples.len(), 3 + 2 + 1);
        assert_eq!(&samples[..3], &[EXPORT_AMPLITUDE; 3]);
        assert_eq!(&samples[3..5], &[-EXPORT_AMPLITUDE; 2]);
        assert_eq!(samples[5], EXPORT_AMPLITUDE);
    }

    #[test]
    fn test_wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wave.wav");
        let samples: Vec<i16> = vec![0, 1000, -1000, i16::MAX, i16::MIN];
        write_wav_samples(&path, &samples, 44100).unwrap();
        assert_eq!(read_wav_samples(&path).unwrap(), samples);
    }

    #[test]
    fn test_export_revolutions() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("disk.trk");
        let revs = vec![
            FluxRevolution::from_f64(&[100.0, 200.0]),
            FluxRevolution::from_f64(&[150.0]),
        ];
        let paths = export_revolutions(&revs, &base).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[1].to_string_lossy().ends_with("disk.trk.1.wav"));
        assert_eq!(read_wav_samples(&paths[0]).unwrap().len(), 30);
        assert_eq!(read_wav_samples(&paths[1]).unwrap().len(), 15);
    }
}
