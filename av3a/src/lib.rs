#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Frame extractor for AVS3 audio (AV3A) elementary streams. The stream is a
//! plain concatenation of frames with no container framing; each frame starts
//! with a sync marker and a short header that determines its length.
//!
//! ### Frame Header
//!
//! **Sync**: `0xFFF` over 12 bits, followed by the audio codec id (always 2).
//! **Coding profile**: channel-based, object-based (with or without a channel
//! sound bed) or higher order ambisonics.
//!
//! The profile decides which channel configuration and bitrate tables apply.
//! Frame size in bytes follows from the total bitrate and the sampling rate,
//! with 1024 samples per frame.
//!
//! ## Quick Start
//!
//! 1. Feed chunks of the stream to [`process::extract::Extractor`]
//! 2. Receive frames through a [`process::output::FrameSink`], or collect them
//!    with [`process::output::FrameCollector`]
//!
//! ```rust,no_run
//! use av3a::process::{EXAMPLE_HEADER, extract::Extractor, output::FrameCollector};
//!
//! let mut extractor = Extractor::default();
//! let mut collector = FrameCollector::default();
//!
//! let mut data = EXAMPLE_HEADER.to_vec();
//! data.resize(64, 0);
//!
//! extractor.packet_started(0);
//! extractor.consume(&data, &mut collector)?;
//!
//! if let Some(format) = collector.stream_format() {
//!     println!("{format}");
//! }
//!
//! for frame in collector.drain() {
//!     println!("{} bytes at {:?} us", frame.as_ref().len(), frame.timestamp_us());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Streaming frame extraction.
///
/// 1. **Frame Extraction** ([`process::extract`]): Sync search, header
///    validation and frame assembly across chunk boundaries.
///
/// 2. **Output** ([`process::output`]): Sink interface receiving the stream
///    format, frame bytes and frame metadata.
pub mod process;

/// Data structures describing AV3A streams.
///
/// - **Channel Configurations** ([`structs::channel`]): Layouts and bitrate tables
/// - **Frame Headers** ([`structs::header`]): Header parsing and frame sizing
/// - **Formats** ([`structs::format`]): Stream format and per-frame metadata
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
