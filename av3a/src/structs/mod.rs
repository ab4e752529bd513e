//! Data structures representing format components.
//!
//! Contains the static channel and sampling-rate tables, the decoded frame
//! header, and the records handed to a [`FrameSink`](crate::process::output::FrameSink).

pub mod channel;
pub mod format;
pub mod header;
