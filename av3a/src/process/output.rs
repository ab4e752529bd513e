use anyhow::{Result, ensure};
use log::debug;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::structs::format::{FrameMetadata, StreamFormat};

/// Receives the output of an [`Extractor`](crate::process::extract::Extractor).
///
/// For every frame the extractor first writes the frame bytes through
/// [`sample_data`](FrameSink::sample_data), possibly in several pieces, then
/// calls [`sample_metadata`](FrameSink::sample_metadata) once. The
/// [`format`](FrameSink::format) announcement precedes the first frame and is
/// made once per session.
pub trait FrameSink {
    fn format(&mut self, format: &StreamFormat) -> Result<()>;

    fn sample_data(&mut self, data: &[u8]) -> Result<()>;

    fn sample_metadata(&mut self, metadata: &FrameMetadata) -> Result<()>;
}

/// A single complete frame, header included.
#[derive(Debug, Clone)]
pub struct Frame {
    pub metadata: FrameMetadata,
    pub data: Arc<[u8]>,
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Frame {
    pub fn timestamp_us(&self) -> Option<i64> {
        self.metadata.timestamp_us
    }
}

/// Sink that assembles frames in memory.
///
/// # Example
///
/// ```rust,no_run
/// use av3a::process::EXAMPLE_HEADER;
/// use av3a::process::extract::Extractor;
/// use av3a::process::output::FrameCollector;
///
/// let mut frame = EXAMPLE_HEADER.to_vec();
/// frame.resize(64, 0);
///
/// let mut extractor = Extractor::default();
/// let mut collector = FrameCollector::default();
/// extractor.consume(&frame, &mut collector)?;
///
/// for frame in collector.drain() {
///     println!("{} bytes at {:?}", frame.as_ref().len(), frame.timestamp_us());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct FrameCollector {
    format: Option<StreamFormat>,
    announcements: usize,
    pending: Vec<u8>,
    frames: VecDeque<Frame>,
}

impl FrameCollector {
    pub fn stream_format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    /// Number of format announcements received.
    pub fn announcements(&self) -> usize {
        self.announcements
    }

    /// Bytes of the frame currently being written.
    pub fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Frame> + '_ {
        self.frames.drain(..)
    }
}

impl FrameSink for FrameCollector {
    fn format(&mut self, format: &StreamFormat) -> Result<()> {
        self.format = Some(format.clone());
        self.announcements += 1;

        Ok(())
    }

    fn sample_data(&mut self, data: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(data);
        Ok(())
    }

    fn sample_metadata(&mut self, metadata: &FrameMetadata) -> Result<()> {
        ensure!(
            self.pending.len() >= metadata.size,
            "Frame size mismatch: {} bytes written, metadata declares {}",
            self.pending.len(),
            metadata.size
        );

        // Bytes ahead of the frame belong to one abandoned by a seek.
        let stale = self.pending.len() - metadata.size;
        if stale > 0 {
            debug!("Dropping {stale} bytes of an interrupted frame");
            self.pending.drain(..stale);
        }

        let data: Arc<[u8]> = std::mem::take(&mut self.pending).into();
        self.frames.push_back(Frame {
            metadata: *metadata,
            data,
        });

        Ok(())
    }
}
