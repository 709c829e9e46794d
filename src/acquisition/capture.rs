use std::thread::{self, JoinHandle};

use audio_thread_priority::RtPriorityHandle;
use crossbeam_channel::{Receiver, Sender};

use crate::error::{DspError, Result};
use crate::processing::Sample;

use super::SampleSource;

/// Chunks kept in flight between the reader thread and the processing loop
pub const CHANNEL_CAPACITY: usize = 10;

/// Reader thread pulling chunks from a [`SampleSource`] into a bounded channel
///
/// Stands in for the sample interrupt: the processing loop receives chunks in
/// acquisition order and the channel closes when the source is exhausted.
pub struct Acquisition {
    rx: Receiver<Vec<Sample>>,
    handle: Option<JoinHandle<Result<u64>>>,
}

impl Acquisition {
    /// Spawn the reader thread
    ///
    /// `chunk_frames` and `sample_rate` size the real-time priority request.
    pub fn start(
        mut source: Box<dyn SampleSource>,
        chunk_frames: u32,
        sample_rate: u32,
    ) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let handle = thread::Builder::new()
            .name("acquisition".into())
            .spawn(move || {
                let _rt_handle = promote_to_real_time(chunk_frames, sample_rate);
                pump(source.as_mut(), &tx)
            })?;
        Ok(Self {
            rx,
            handle: Some(handle),
        })
    }

    pub fn receiver(&self) -> &Receiver<Vec<Sample>> {
        &self.rx
    }

    /// Wait for the reader thread and return the number of samples it sent
    pub fn join(mut self) -> Result<u64> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| DspError::Acquisition("reader thread panicked".into()))?,
            None => Ok(0),
        }
    }
}

fn pump(source: &mut dyn SampleSource, tx: &Sender<Vec<Sample>>) -> Result<u64> {
    let mut sent = 0u64;
    while let Some(chunk) = source.next_chunk()? {
        let len = chunk.len() as u64;
        if tx.send(chunk).is_err() {
            log::warn!("Sample receiver dropped");
            break;
        }
        sent += len;
    }
    log::debug!("Acquisition finished after {} samples", sent);
    Ok(sent)
}

/// Attempt to promote the calling thread to real-time priority
pub fn promote_to_real_time(buffer_frames: u32, sample_rate: u32) -> Option<RtPriorityHandle> {
    match audio_thread_priority::promote_current_thread_to_real_time(buffer_frames, sample_rate) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Could not set real-time priority: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::TextSource;
    use crate::config::ConversionConfig;
    use std::io::Cursor;

    #[test]
    fn test_delivers_chunks_in_order() {
        let text: String = (0..25).map(|i| format!("{}\n", i)).collect();
        let source = TextSource::new(Cursor::new(text), 10, ConversionConfig::default());
        let acquisition = Acquisition::start(Box::new(source), 10, 8000).unwrap();

        let received: Vec<f32> = acquisition
            .receiver()
            .iter()
            .flat_map(|chunk| chunk.into_iter().map(|s| s.volts))
            .collect();
        assert_eq!(received, (0..25).map(|i| i as f32).collect::<Vec<_>>());
        assert_eq!(acquisition.join().unwrap(), 25);
    }

    #[test]
    fn test_source_error_surfaces_on_join() {
        let source = TextSource::new(Cursor::new("1\n2\nbad\n"), 2, ConversionConfig::default());
        let acquisition = Acquisition::start(Box::new(source), 2, 8000).unwrap();
        let chunks: Vec<_> = acquisition.receiver().iter().collect();
        assert_eq!(chunks.len(), 1);
        assert!(acquisition.join().is_err());
    }
}
