use crate::structs::channel::ChannelConfig;

#[derive(thiserror::Error, Debug)]
pub enum ReaderError {
    #[error("Start offset {start} is outside the {len}-byte buffer")]
    StartOutOfRange { start: usize, len: usize },

    #[error("get_n({requested}): out of bounds, only {available} bits remain")]
    Overrun { requested: u32, available: u64 },

    #[error("get_n({0}): reads are limited to 32 bits")]
    WidthTooLarge(u32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("audio_codec_id must be 2. Read {0}")]
    CodecIdMismatch(u8),

    #[error("Headers carrying ancillary data are not supported")]
    AncillaryDataUnsupported,

    #[error("Invalid coding_profile. Read {0}")]
    InvalidCodingProfile(u8),

    #[error("Invalid soundbed_type. Read {0}")]
    InvalidSoundBedType(u8),

    #[error("channel_number_index {0} is not a channel-based configuration")]
    ChannelConfigOutOfRange(u8),

    #[error("Invalid sampling_frequency_index. Read {0}")]
    InvalidSamplingFrequency(u8),

    #[error("bitrate_index {index} is outside the {config} bitrate table")]
    BitrateIndexOutOfRange { config: ChannelConfig, index: u8 },

    /// Orders above 3 have no dedicated table. The header is rejected rather
    /// than sized from the mono table.
    #[error("No bitrate table for ambisonics order {0}")]
    UnsupportedAmbisonicsOrder(u8),

    #[error("Truncated header: {0}")]
    Reader(#[from] ReaderError),
}

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Frame size {0} is shorter than the 9-byte header")]
    FrameTooSmall(usize),

    #[error("Frame size {size} exceeds the {max}-byte limit")]
    FrameTooLarge { size: u64, max: usize },

    #[error("Rejected header: {0}")]
    Header(#[from] HeaderError),
}
