use std::path::Path;

use hound::{WavSpec, WavWriter};

use crate::error::Result;

/// Write mono 32-bit float samples
pub fn save_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;

    for &sample in samples {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Write mono 16-bit integer readings, as the board's converter would see them
pub fn save_wav_raw<P: AsRef<Path>>(path: P, readings: &[i16], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &reading in readings {
        writer.write_sample(reading)?;
    }
    writer.finalize()?;
    Ok(())
}
