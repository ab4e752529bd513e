use anyhow::Result;
use log::{debug, info, trace, warn};

use crate::process::output::FrameSink;
use crate::structs::format::{FrameMetadata, StreamFormat};
use crate::structs::header::{FrameHeader, HEADER_SIZE, is_sync_lead, is_sync_tail};
use crate::utils::errors::ExtractError;

/// Session parameters that do not come from the bitstream.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Track identifier carried by the format announcement.
    pub format_id: Option<String>,
    pub language: Option<String>,
    pub role_flags: u32,
    /// Optional cap on frame size. Headers implying larger frames are treated
    /// as false sync matches; `None` accepts every size a valid header yields.
    pub max_frame_size: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            format_id: None,
            language: None,
            role_flags: 0,
            max_frame_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorState {
    #[default]
    Searching,
    ReadingHeader,
    ReadingFrame,
}

/// Extracts frames from a chunked elementary stream.
///
/// Frame boundary detection by searching for the two-byte sync marker
/// (`0xFF` followed by a byte whose high nibble is `0xF`). Each candidate is
/// confirmed by parsing its 9-byte header; the header determines the frame
/// size, and the frame is then forwarded to a [`FrameSink`] byte for byte.
///
/// Input may be split anywhere, including inside the sync marker. All parse
/// state lives in the extractor, so [`consume`](Extractor::consume) returns as
/// soon as a chunk is exhausted and resumes with the next one.
///
/// # Example
///
/// ```rust,no_run
/// use av3a::process::EXAMPLE_HEADER;
/// use av3a::process::extract::Extractor;
/// use av3a::process::output::FrameCollector;
///
/// let mut stream = EXAMPLE_HEADER.to_vec();
/// stream.resize(64, 0);
///
/// let mut extractor = Extractor::default();
/// let mut collector = FrameCollector::default();
///
/// extractor.packet_started(0);
/// for chunk in stream.chunks(5) {
///     extractor.consume(chunk, &mut collector)?;
/// }
///
/// assert_eq!(collector.frames().count(), 1);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Extractor {
    config: ExtractorConfig,
    state: ExtractorState,
    last_byte_was_sync_lead: bool,
    bytes_read: usize,
    header: [u8; HEADER_SIZE],
    frame_size: usize,
    frame_duration_us: i64,
    time_us: Option<i64>,
    pending_time_us: Option<i64>,
    format: Option<StreamFormat>,
    frames_emitted: usize,
    headers_rejected: usize,
    format_changes: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            state: ExtractorState::Searching,
            last_byte_was_sync_lead: false,
            bytes_read: 0,
            header: [0; HEADER_SIZE],
            frame_size: 0,
            frame_duration_us: 0,
            time_us: None,
            pending_time_us: None,
            format: None,
            frames_emitted: 0,
            headers_rejected: 0,
            format_changes: 0,
        }
    }

    /// Feeds the next chunk of the stream.
    ///
    /// Every complete frame found is written to `sink`. Malformed or false
    /// sync candidates are skipped silently; only errors raised by the sink
    /// are returned. A sink error abandons the frame in progress, and the
    /// next call resumes searching for a sync marker.
    pub fn consume(&mut self, data: &[u8], sink: &mut dyn FrameSink) -> Result<()> {
        let mut data = data;

        while !data.is_empty() {
            let used = match self.state {
                ExtractorState::Searching => self.find_sync(data),
                ExtractorState::ReadingHeader => self.read_header(data, sink)?,
                ExtractorState::ReadingFrame => self.read_frame(data, sink)?,
            };

            data = &data[used..];
        }

        Ok(())
    }

    /// Sets the presentation time of the next frame that begins after this
    /// call. Later frames are timed from it.
    pub fn packet_started(&mut self, time_us: i64) {
        self.pending_time_us = Some(time_us);
    }

    /// Discards any partial frame and forgets the running timestamp.
    ///
    /// The announced stream format stays valid; it is not announced again.
    pub fn seek(&mut self) {
        self.state = ExtractorState::Searching;
        self.bytes_read = 0;
        self.frame_size = 0;
        self.last_byte_was_sync_lead = false;
        self.time_us = None;
        self.pending_time_us = None;
    }

    pub fn state(&self) -> ExtractorState {
        self.state
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The format announced to the sink, once a valid header has been seen.
    pub fn stream_format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    pub fn frames_emitted(&self) -> usize {
        self.frames_emitted
    }

    /// Sync candidates whose header failed to parse.
    pub fn headers_rejected(&self) -> usize {
        self.headers_rejected
    }

    /// Accepted headers that disagreed with the announced format.
    pub fn format_changes(&self) -> usize {
        self.format_changes
    }

    fn find_sync(&mut self, data: &[u8]) -> usize {
        for (i, &byte) in data.iter().enumerate() {
            let found = self.last_byte_was_sync_lead && is_sync_tail(byte);
            self.last_byte_was_sync_lead = is_sync_lead(byte);

            if found {
                self.last_byte_was_sync_lead = false;
                self.header[0] = 0xFF;
                self.header[1] = byte;
                self.bytes_read = 2;
                self.state = ExtractorState::ReadingHeader;

                return i + 1;
            }
        }

        data.len()
    }

    fn accumulate_header(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(HEADER_SIZE - self.bytes_read);
        self.header[self.bytes_read..self.bytes_read + n].copy_from_slice(&data[..n]);
        self.bytes_read += n;

        n
    }

    fn read_header(&mut self, data: &[u8], sink: &mut dyn FrameSink) -> Result<usize> {
        let used = self.accumulate_header(data);
        if self.bytes_read < HEADER_SIZE {
            return Ok(used);
        }

        match self.parse_header() {
            Ok((header, frame_size)) => self.start_frame(&header, frame_size, sink)?,
            Err(e) => {
                self.headers_rejected += 1;
                debug!("Skipping sync candidate: {e}");
                self.rescan_header();
            }
        }

        Ok(used)
    }

    fn parse_header(&self) -> Result<(FrameHeader, usize), ExtractError> {
        let header = FrameHeader::from_bytes(&self.header)?;
        let size = header.frame_size();

        if size < HEADER_SIZE as u64 {
            return Err(ExtractError::FrameTooSmall(size as usize));
        }

        if let Some(max) = self.config.max_frame_size {
            if size > max as u64 {
                return Err(ExtractError::FrameTooLarge { size, max });
            }
        }

        Ok((header, size as usize))
    }

    /// Searches the bytes after a rejected sync lead, so a marker starting
    /// inside the rejected header is still found.
    fn rescan_header(&mut self) {
        let candidate = self.header;

        self.state = ExtractorState::Searching;
        self.bytes_read = 0;
        self.last_byte_was_sync_lead = false;

        let mut rest = &candidate[1..];
        while !rest.is_empty() {
            let used = match self.state {
                ExtractorState::Searching => self.find_sync(rest),
                _ => self.accumulate_header(rest),
            };

            rest = &rest[used..];
        }
    }

    fn start_frame(
        &mut self,
        header: &FrameHeader,
        frame_size: usize,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        if let Some(time_us) = self.pending_time_us.take() {
            self.time_us = Some(time_us);
        }

        self.frame_size = frame_size;
        self.frame_duration_us = header.frame_duration_us() as i64;
        self.bytes_read = HEADER_SIZE;
        self.state = ExtractorState::ReadingFrame;

        trace!(
            "Frame of {frame_size} bytes, {} us, at {:?}",
            self.frame_duration_us, self.time_us
        );

        if let Err(e) = self.announce_and_forward_header(header, sink) {
            self.abandon_frame();
            return Err(e);
        }

        if self.bytes_read == self.frame_size {
            self.finish_frame(sink)?;
        }

        Ok(())
    }

    fn announce_and_forward_header(
        &mut self,
        header: &FrameHeader,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        match self.format.as_ref().map(|format| format.differs_from(header)) {
            None => {
                let format = StreamFormat::from_header(header, &self.config);
                info!("Stream format: {format}");

                sink.format(&format)?;
                self.format = Some(format);
            }
            Some(true) => {
                self.format_changes += 1;

                if self.format_changes == 1 {
                    warn!(
                        "Stream parameters changed to {} Hz, {} channels, {} bps; keeping the announced format",
                        header.sampling_rate, header.channel_count, header.total_bitrate
                    );
                } else {
                    debug!("Stream parameters changed again ({} times)", self.format_changes);
                }
            }
            Some(false) => {}
        }

        sink.sample_data(&self.header)
    }

    fn read_frame(&mut self, data: &[u8], sink: &mut dyn FrameSink) -> Result<usize> {
        let n = data.len().min(self.frame_size - self.bytes_read);
        self.bytes_read += n;

        if let Err(e) = sink.sample_data(&data[..n]) {
            self.abandon_frame();
            return Err(e);
        }

        if self.bytes_read == self.frame_size {
            self.finish_frame(sink)?;
        }

        Ok(n)
    }

    /// Drops the frame in progress after a sink failure; its bytes were not
    /// all delivered, so no metadata is emitted for it.
    fn abandon_frame(&mut self) {
        debug!("Abandoning frame of {} bytes after a sink error", self.frame_size);

        self.state = ExtractorState::Searching;
        self.bytes_read = 0;
        self.frame_size = 0;
        self.last_byte_was_sync_lead = false;
    }

    fn finish_frame(&mut self, sink: &mut dyn FrameSink) -> Result<()> {
        let metadata = FrameMetadata {
            timestamp_us: self.time_us,
            duration_us: self.frame_duration_us,
            key_frame: true,
            size: self.frame_size,
            offset: 0,
        };

        self.time_us = self.time_us.map(|time_us| time_us + self.frame_duration_us);
        self.frames_emitted += 1;
        self.state = ExtractorState::Searching;
        self.bytes_read = 0;
        self.last_byte_was_sync_lead = false;

        sink.sample_metadata(&metadata)
    }
}
