use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hound::WavReader;

use crate::config::ConversionConfig;
use crate::error::{DspError, Result};
use crate::processing::Sample;

/// Supplies converter readings in chunks, oldest first
pub trait SampleSource: Send {
    /// Next chunk, or `None` once the source is exhausted
    fn next_chunk(&mut self) -> Result<Option<Vec<Sample>>>;

    /// Sample rate recorded in the source, if it carries one
    fn sample_rate(&self) -> Option<u32>;
}

/// Mono WAV recording
///
/// Integer recordings are taken as raw converter readings and calibrated
/// through the conversion. Float recordings are taken as volts and
/// re-quantised for the raw form.
pub struct WavFileSource {
    samples: Vec<Sample>,
    position: usize,
    chunk_size: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn new<P: AsRef<Path>>(
        path: P,
        chunk_size: usize,
        conversion: &ConversionConfig,
    ) -> Result<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(DspError::Config(format!(
                "expected a mono WAV file, got {} channels",
                spec.channels
            )));
        }

        let samples = Self::read_samples(reader, &spec, conversion)?;
        log::info!(
            "Loaded {} samples at {} Hz from {}",
            samples.len(),
            spec.sample_rate,
            path.as_ref().display()
        );

        Ok(Self {
            samples,
            position: 0,
            chunk_size: chunk_size.max(1),
            sample_rate: spec.sample_rate,
        })
    }

    fn read_samples(
        mut reader: WavReader<BufReader<File>>,
        spec: &hound::WavSpec,
        conversion: &ConversionConfig,
    ) -> Result<Vec<Sample>> {
        let samples = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| Sample::from_volts(v, conversion)))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => reader
                .samples::<i32>()
                .map(|s| s.map(|v| Sample::from_raw(v, conversion)))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };
        Ok(samples)
    }
}

impl SampleSource for WavFileSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<Sample>>> {
        if self.position >= self.samples.len() {
            return Ok(None);
        }

        let end = (self.position + self.chunk_size).min(self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(Some(chunk))
    }

    fn sample_rate(&self) -> Option<u32> {
        Some(self.sample_rate)
    }
}

/// Line-oriented text readings, as logged from the board's serial output
///
/// Each non-empty line holds either a voltage, or a voltage and a raw reading
/// separated by a comma or whitespace. Lines starting with `#` are skipped.
pub struct TextSource<R> {
    reader: R,
    chunk_size: usize,
    conversion: ConversionConfig,
    line_number: usize,
    line: String,
}

impl TextSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(
        path: P,
        chunk_size: usize,
        conversion: ConversionConfig,
    ) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file), chunk_size, conversion))
    }
}

impl<R: BufRead + Send> TextSource<R> {
    pub fn new(reader: R, chunk_size: usize, conversion: ConversionConfig) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            conversion,
            line_number: 0,
            line: String::new(),
        }
    }

    fn parse_line(&self, line: &str) -> Result<Sample> {
        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());
        let parse_err = |field: &str| {
            DspError::Parse(format!("line {}: invalid reading '{}'", self.line_number, field))
        };

        let volts_field = fields.next().unwrap_or_default();
        let volts: f32 = volts_field.parse().map_err(|_| parse_err(volts_field))?;
        let sample = match fields.next() {
            Some(raw_field) => Sample {
                volts,
                raw: raw_field.parse().map_err(|_| parse_err(raw_field))?,
            },
            None => Sample::from_volts(volts, &self.conversion),
        };
        if let Some(extra) = fields.next() {
            return Err(parse_err(extra));
        }
        Ok(sample)
    }
}

impl<R: BufRead + Send> SampleSource for TextSource<R> {
    fn next_chunk(&mut self) -> Result<Option<Vec<Sample>>> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        while chunk.len() < self.chunk_size {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                break;
            }
            self.line_number += 1;
            let trimmed = self.line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            chunk.push(self.parse_line(trimmed)?);
        }
        Ok((!chunk.is_empty()).then_some(chunk))
    }

    fn sample_rate(&self) -> Option<u32> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_text_source_chunks() {
        let text = "# volts\n0.5\n\n1.5, 3\n2.0 4\n-1.0\n";
        let conversion = ConversionConfig {
            volts_per_lsb: 0.5,
            ..ConversionConfig::default()
        };
        let mut source = TextSource::new(Cursor::new(text), 3, conversion);

        let first = source.next_chunk().unwrap().unwrap();
        assert_eq!(
            first,
            vec![
                Sample { volts: 0.5, raw: 1 },
                Sample { volts: 1.5, raw: 3 },
                Sample { volts: 2.0, raw: 4 },
            ]
        );
        let second = source.next_chunk().unwrap().unwrap();
        assert_eq!(second, vec![Sample { volts: -1.0, raw: -2 }]);
        assert!(source.next_chunk().unwrap().is_none());
        assert_eq!(source.sample_rate(), None);
    }

    #[test]
    fn test_text_source_rejects_garbage() {
        let mut source = TextSource::new(Cursor::new("1.0\nabc\n"), 8, ConversionConfig::default());
        let err = source.next_chunk().unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);

        let mut source = TextSource::new(Cursor::new("1.0 2 3\n"), 8, ConversionConfig::default());
        assert!(source.next_chunk().is_err());
    }

    #[test]
    fn test_wav_source_int_readings() {
        let path = std::env::temp_dir().join("dsmv_dsp_source_test.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for v in [0i16, 100, -100, 2048, 7] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let conversion = ConversionConfig {
            volts_per_lsb: 0.25,
            ..ConversionConfig::default()
        };
        let mut source = WavFileSource::new(&path, 4, &conversion).unwrap();
        assert_eq!(source.sample_rate(), Some(8000));
        let first = source.next_chunk().unwrap().unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(first[1], Sample { volts: 25.0, raw: 100 });
        assert_eq!(first[3], Sample { volts: 512.0, raw: 2048 });
        assert_eq!(source.next_chunk().unwrap().unwrap().len(), 1);
        assert!(source.next_chunk().unwrap().is_none());

        std::fs::remove_file(&path).ok();
    }
}
