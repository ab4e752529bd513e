//! Utility functions and supporting infrastructure.
//!
//! Provides bounded bitstream reading and the error types shared by the
//! header parser and the frame extractor.

pub mod bitstream_io;
pub mod errors;
