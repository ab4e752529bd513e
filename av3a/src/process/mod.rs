/// Frame synchronisation over arbitrarily chunked input.
///
/// Provides the [`Extractor`](extract::Extractor), which finds sync markers,
/// parses each frame header and forwards complete frames to a sink.
pub mod extract;

/// Output side of the extractor.
///
/// Provides the [`FrameSink`](output::FrameSink) trait and the in-memory
/// [`FrameCollector`](output::FrameCollector).
pub mod output;

#[cfg(test)]
pub(crate) mod fixtures;

/// Header of a channel-based stereo frame: 48 kHz, 24 kbps, 64 bytes per frame.
pub const EXAMPLE_HEADER: [u8; 9] = [0xFF, 0xF2, 0x00, 0x40, 0x00, 0x50, 0x00, 0x00, 0x00];
