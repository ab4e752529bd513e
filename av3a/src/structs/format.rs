//! Records delivered to a frame sink.

use std::fmt::{Display, Formatter};

use crate::process::extract::ExtractorConfig;
use crate::structs::header::FrameHeader;

pub const SAMPLE_MIME_TYPE: &str = "audio/av3a";

/// Largest single frame announced to downstream buffers.
pub const MAX_INPUT_SIZE: usize = 4096 * 64;

/// Stream parameters, announced once per session from the first valid header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub id: Option<String>,
    pub sample_mime_type: &'static str,
    pub channel_count: u32,
    pub sample_rate: u32,
    pub language: Option<String>,
    pub role_flags: u32,
    pub peak_bitrate: u64,
    pub average_bitrate: u64,
    pub max_input_size: usize,
}

impl StreamFormat {
    pub fn from_header(header: &FrameHeader, config: &ExtractorConfig) -> Self {
        Self {
            id: config.format_id.clone(),
            sample_mime_type: SAMPLE_MIME_TYPE,
            channel_count: header.channel_count,
            sample_rate: header.sampling_rate,
            language: config.language.clone(),
            role_flags: config.role_flags,
            peak_bitrate: header.total_bitrate,
            average_bitrate: header.total_bitrate,
            max_input_size: MAX_INPUT_SIZE,
        }
    }

    /// Whether `header` describes different stream parameters.
    pub fn differs_from(&self, header: &FrameHeader) -> bool {
        self.channel_count != header.channel_count
            || self.sample_rate != header.sampling_rate
            || self.average_bitrate != header.total_bitrate
    }
}

impl Display for StreamFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {} Hz, {} channels, {} kbps",
            self.sample_mime_type,
            self.sample_rate,
            self.channel_count,
            self.average_bitrate / 1000
        )?;

        if let Some(language) = &self.language {
            write!(f, ", language {language}")?;
        }

        Ok(())
    }
}

/// Per-frame metadata, delivered after the frame's payload bytes.
///
/// Frames carry no side data and no decode-time offset: `offset` is always
/// zero and every frame is a key frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Presentation time in microseconds, `None` until the driver supplies one.
    pub timestamp_us: Option<i64>,
    pub duration_us: i64,
    pub key_frame: bool,
    pub size: usize,
    pub offset: usize,
}
