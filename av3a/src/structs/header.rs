//! Frame header parsing.
//!
//! ## Layout
//!
//! Every frame starts with a bit-packed header beginning with the sync marker
//! (twelve one-bits). The fields following the sampling frequency depend on
//! the coding profile:
//!
//! - **Channel-based**: a channel configuration index and a bitrate index.
//! - **Object-based**: a sound-bed type, then either object channels alone or
//!   a channel bed plus object channels, each with its own bitrate index.
//! - **Higher-order ambisonics**: the ambisonics order and a bitrate index.
//!
//! The longest layout (channel bed plus objects) is 69 bits, so a fixed
//! [`HEADER_SIZE`] of 9 bytes always holds a complete header.
//!
//! Channel count and total bitrate are not coded directly. They are derived
//! from the static tables in [`crate::structs::channel`].

use log::trace;

use crate::structs::channel::{ChannelConfig, sampling_rate};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::HeaderError;

/// Bytes buffered before a header is parsed.
pub const HEADER_SIZE: usize = 9;

/// Value of `audio_codec_id` for this format.
pub const AUDIO_CODEC_ID: u8 = 2;

/// Samples per frame.
pub const FRAME_LENGTH: u32 = 1024;

pub const CODING_PROFILE_CHANNEL: u8 = 0;
pub const CODING_PROFILE_OBJECT: u8 = 1;
pub const CODING_PROFILE_HOA: u8 = 2;

const MICROS_PER_SECOND: u64 = 1_000_000;

/// First byte of the sync marker.
#[inline(always)]
pub const fn is_sync_lead(byte: u8) -> bool {
    byte == 0xFF
}

/// Second byte of the sync marker: high nibble all ones.
#[inline(always)]
pub const fn is_sync_tail(byte: u8) -> bool {
    byte & 0xF0 == 0xF0
}

/// Profile-specific header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodingProfile {
    ChannelBased {
        channel_number_index: u8,
        bitrate_index: u8,
    },
    ObjectBased(SoundBed),
    Ambisonics {
        /// Stored in the bitstream as `order - 1`.
        order: u8,
        bitrate_index: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundBed {
    /// `soundbed_type == 0`
    ObjectsOnly {
        object_channels: u8,
        bitrate_index_per_channel: u8,
    },
    /// `soundbed_type == 1`
    ChannelsAndObjects {
        channel_number_index: u8,
        bitrate_index: u8,
        object_channels: u8,
        bitrate_index_per_channel: u8,
    },
}

impl SoundBed {
    fn read(reader: &mut BsIoSliceReader) -> Result<Self, HeaderError> {
        let soundbed_type = reader.get_n(2)? as u8;

        let bed = match soundbed_type {
            0 => Self::ObjectsOnly {
                object_channels: reader.get_n(7)? as u8 + 1,
                bitrate_index_per_channel: reader.get_n(4)? as u8,
            },
            1 => Self::ChannelsAndObjects {
                channel_number_index: reader.get_n(7)? as u8,
                bitrate_index: reader.get_n(4)? as u8,
                object_channels: reader.get_n(7)? as u8 + 1,
                bitrate_index_per_channel: reader.get_n(4)? as u8,
            },
            other => return Err(HeaderError::InvalidSoundBedType(other)),
        };

        Ok(bed)
    }
}

impl CodingProfile {
    /// The table entry the profile resolves to, if any.
    pub fn channel_config(&self) -> Option<ChannelConfig> {
        match self {
            Self::ChannelBased {
                channel_number_index,
                ..
            }
            | Self::ObjectBased(SoundBed::ChannelsAndObjects {
                channel_number_index,
                ..
            }) => ChannelConfig::from_index(*channel_number_index),
            Self::ObjectBased(SoundBed::ObjectsOnly { .. }) => None,
            Self::Ambisonics { order, .. } => ChannelConfig::from_ambisonics_order(*order),
        }
    }

    /// Derives `(channel_count, total_bitrate)` from the static tables.
    pub fn resolve(&self) -> Result<(u32, u64), HeaderError> {
        match *self {
            Self::ChannelBased {
                channel_number_index,
                bitrate_index,
            } => {
                if channel_number_index > ChannelConfig::LAST_CHANNEL_BASED.index() {
                    return Err(HeaderError::ChannelConfigOutOfRange(channel_number_index));
                }

                let config = channel_config(channel_number_index)?;
                let bitrate = table_bitrate(config, bitrate_index)?;

                Ok((config.channel_count(), bitrate))
            }
            Self::ObjectBased(SoundBed::ObjectsOnly {
                object_channels,
                bitrate_index_per_channel,
            }) => {
                let per_channel = table_bitrate(ChannelConfig::Mono, bitrate_index_per_channel)?;

                Ok((object_channels as u32, object_channels as u64 * per_channel))
            }
            Self::ObjectBased(SoundBed::ChannelsAndObjects {
                channel_number_index,
                bitrate_index,
                object_channels,
                bitrate_index_per_channel,
            }) => {
                let config = channel_config(channel_number_index)?;
                let bed = table_bitrate(config, bitrate_index)?;
                let per_channel = table_bitrate(ChannelConfig::Mono, bitrate_index_per_channel)?;

                Ok((
                    config.channel_count() + object_channels as u32,
                    bed * object_channels as u64 * per_channel,
                ))
            }
            Self::Ambisonics {
                order,
                bitrate_index,
            } => {
                let config = ChannelConfig::from_ambisonics_order(order)
                    .ok_or(HeaderError::UnsupportedAmbisonicsOrder(order))?;
                let channels = (order as u32 + 1) * (order as u32 + 1);

                Ok((channels, table_bitrate(config, bitrate_index)?))
            }
        }
    }
}

fn channel_config(index: u8) -> Result<ChannelConfig, HeaderError> {
    ChannelConfig::from_index(index).ok_or(HeaderError::ChannelConfigOutOfRange(index))
}

fn table_bitrate(config: ChannelConfig, index: u8) -> Result<u64, HeaderError> {
    config
        .bitrate(index)
        .map(u64::from)
        .ok_or(HeaderError::BitrateIndexOutOfRange { config, index })
}

/// A fully resolved frame header.
///
/// Only produced when every field and every derived quantity is valid, so
/// `sampling_rate`, `total_bitrate` and `channel_count` are always positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub audio_codec_id: u8,
    pub nn_type: u8,
    pub coding_profile: CodingProfile,
    pub sampling_frequency_index: u8,
    pub resolution: u8,

    pub sampling_rate: u32,
    pub total_bitrate: u64,
    pub channel_count: u32,
    pub frame_length: u32,
}

impl FrameHeader {
    pub fn from_bytes(buf: &[u8]) -> Result<Self, HeaderError> {
        let reader = &mut BsIoSliceReader::from_slice(buf)?;
        Self::read(reader)
    }

    /// Reads a header starting at the reader's current position.
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self, HeaderError> {
        reader.skip_n(12)?; // sync_word

        let audio_codec_id = reader.get_n(4)? as u8;
        if audio_codec_id != AUDIO_CODEC_ID {
            return Err(HeaderError::CodecIdMismatch(audio_codec_id));
        }

        if reader.get()? {
            return Err(HeaderError::AncillaryDataUnsupported);
        }

        let nn_type = reader.get_n(3)? as u8;
        let coding_profile_id = reader.get_n(3)? as u8;
        let sampling_frequency_index = reader.get_n(4)? as u8;

        reader.skip_n(8)?; // crc

        let mut coding_profile = match coding_profile_id {
            CODING_PROFILE_CHANNEL => CodingProfile::ChannelBased {
                channel_number_index: reader.get_n(7)? as u8,
                bitrate_index: 0,
            },
            CODING_PROFILE_OBJECT => CodingProfile::ObjectBased(SoundBed::read(reader)?),
            CODING_PROFILE_HOA => CodingProfile::Ambisonics {
                order: reader.get_n(4)? as u8 + 1,
                bitrate_index: 0,
            },
            other => return Err(HeaderError::InvalidCodingProfile(other)),
        };

        let resolution = reader.get_n(2)? as u8;

        match &mut coding_profile {
            CodingProfile::ChannelBased { bitrate_index, .. }
            | CodingProfile::Ambisonics { bitrate_index, .. } => {
                *bitrate_index = reader.get_n(4)? as u8;
            }
            CodingProfile::ObjectBased(_) => {}
        }

        reader.skip_n(8)?; // crc

        let sampling_rate = sampling_rate(sampling_frequency_index).ok_or(
            HeaderError::InvalidSamplingFrequency(sampling_frequency_index),
        )?;
        let (channel_count, total_bitrate) = coding_profile.resolve()?;

        let header = Self {
            audio_codec_id,
            nn_type,
            coding_profile,
            sampling_frequency_index,
            resolution,
            sampling_rate,
            total_bitrate,
            channel_count,
            frame_length: FRAME_LENGTH,
        };

        trace!(
            "Frame header: {:?}, {} Hz, {} channels, {} bps",
            header.coding_profile,
            header.sampling_rate,
            header.channel_count,
            header.total_bitrate
        );

        Ok(header)
    }

    /// Bytes in the frame, header included:
    /// `ceil(total_bitrate / sampling_rate * frame_length / 8)`.
    pub fn frame_size(&self) -> u64 {
        (self.total_bitrate * self.frame_length as u64).div_ceil(self.sampling_rate as u64 * 8)
    }

    /// `1_000_000 * frame_size / sampling_rate`, in microseconds.
    pub fn frame_duration_us(&self) -> u64 {
        MICROS_PER_SECOND * self.frame_size() / self.sampling_rate as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::fixtures::{Layout, header, header_with};
    use crate::process::EXAMPLE_HEADER;

    #[test]
    fn channel_based_stereo() -> Result<(), HeaderError> {
        let bytes = header(
            Layout::Channel {
                channel_number_index: 1,
                bitrate_index: 0,
            },
            2,
        );
        assert_eq!(bytes, EXAMPLE_HEADER);

        let h = FrameHeader::from_bytes(&bytes)?;
        assert_eq!(h.channel_count, 2);
        assert_eq!(h.total_bitrate, 24000);
        assert_eq!(h.sampling_rate, 48000);
        assert_eq!(h.frame_length, 1024);
        assert_eq!(h.frame_size(), 64);
        assert_eq!(h.frame_duration_us(), 1333);
        assert_eq!(h.coding_profile.channel_config(), Some(ChannelConfig::Stereo));

        Ok(())
    }

    #[test]
    fn channel_based_rounds_frame_size_up() -> Result<(), HeaderError> {
        // 5.1 @ 192 kbps, 44.1 kHz: 192000 * 1024 / (44100 * 8) = 557.27
        let h = FrameHeader::from_bytes(&header(
            Layout::Channel {
                channel_number_index: 2,
                bitrate_index: 0,
            },
            3,
        ))?;
        assert_eq!(h.channel_count, 6);
        assert_eq!(h.total_bitrate, 192000);
        assert_eq!(h.frame_size(), 558);

        Ok(())
    }

    #[test]
    fn objects_only() -> Result<(), HeaderError> {
        let h = FrameHeader::from_bytes(&header(
            Layout::Objects {
                object_channels: 4,
                bitrate_index_per_channel: 2,
            },
            2,
        ))?;
        assert_eq!(h.channel_count, 4);
        assert_eq!(h.total_bitrate, 4 * 44000);
        // 176000 * 1024 / 384000 = 469.33
        assert_eq!(h.frame_size(), 470);
        assert_eq!(h.coding_profile.channel_config(), None);

        Ok(())
    }

    #[test]
    fn channel_bed_and_objects() -> Result<(), HeaderError> {
        let h = FrameHeader::from_bytes(&header(
            Layout::BedAndObjects {
                channel_number_index: 1,
                bitrate_index: 0,
                object_channels: 2,
                bitrate_index_per_channel: 0,
            },
            2,
        ))?;
        assert_eq!(h.channel_count, 4);
        assert_eq!(h.total_bitrate, 24000 * 2 * 16000);
        assert_eq!(h.frame_size(), 2_048_000);

        Ok(())
    }

    #[test]
    fn ambisonics() -> Result<(), HeaderError> {
        let h = FrameHeader::from_bytes(&header(
            Layout::Hoa {
                order: 2,
                bitrate_index: 1,
            },
            2,
        ))?;
        assert_eq!(h.channel_count, 9);
        assert_eq!(h.total_bitrate, 256000);
        assert_eq!(h.frame_size(), 683);
        assert_eq!(
            h.coding_profile,
            CodingProfile::Ambisonics {
                order: 2,
                bitrate_index: 1
            }
        );

        Ok(())
    }

    #[test]
    fn every_layout_fits_the_fixed_header() -> Result<(), HeaderError> {
        let layouts = [
            (
                Layout::Channel {
                    channel_number_index: 10,
                    bitrate_index: 4,
                },
                56,
            ),
            (
                Layout::Objects {
                    object_channels: 128,
                    bitrate_index_per_channel: 11,
                },
                58,
            ),
            (
                Layout::BedAndObjects {
                    channel_number_index: 3,
                    bitrate_index: 7,
                    object_channels: 1,
                    bitrate_index_per_channel: 0,
                },
                69,
            ),
            (
                Layout::Hoa {
                    order: 3,
                    bitrate_index: 5,
                },
                53,
            ),
        ];

        for (layout, bits) in layouts {
            let bytes = header(layout, 0);
            let reader = &mut BsIoSliceReader::from_slice(&bytes)?;
            FrameHeader::read(reader)?;
            assert_eq!(reader.position(), bits);
            assert!(reader.position() <= (HEADER_SIZE * 8) as u64);
        }

        Ok(())
    }

    #[test]
    fn rejects_wrong_codec_id() {
        let bytes = header_with(
            3,
            false,
            2,
            Layout::Channel {
                channel_number_index: 1,
                bitrate_index: 0,
            },
        );
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(HeaderError::CodecIdMismatch(3))
        ));
    }

    #[test]
    fn rejects_ancillary_data() {
        let bytes = header_with(
            AUDIO_CODEC_ID,
            true,
            2,
            Layout::Channel {
                channel_number_index: 1,
                bitrate_index: 0,
            },
        );
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(HeaderError::AncillaryDataUnsupported)
        ));
    }

    #[test]
    fn rejects_unknown_sound_bed_type() {
        let bytes = header(Layout::SoundBedType(2), 2);
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(HeaderError::InvalidSoundBedType(2))
        ));
    }

    #[test]
    fn rejects_unknown_coding_profile() {
        let bytes = header(Layout::CodingProfile(5), 2);
        assert!(matches!(
            FrameHeader::from_bytes(&bytes),
            Err(HeaderError::InvalidCodingProfile(5))
        ));
    }

    #[test]
    fn rejects_out_of_range_indexes() {
        let hoa_config = header(
            Layout::Channel {
                channel_number_index: 11,
                bitrate_index: 0,
            },
            2,
        );
        assert!(matches!(
            FrameHeader::from_bytes(&hoa_config),
            Err(HeaderError::ChannelConfigOutOfRange(11))
        ));

        let no_rate = header(
            Layout::Channel {
                channel_number_index: 1,
                bitrate_index: 0,
            },
            9,
        );
        assert!(matches!(
            FrameHeader::from_bytes(&no_rate),
            Err(HeaderError::InvalidSamplingFrequency(9))
        ));

        let no_bitrate = header(
            Layout::Channel {
                channel_number_index: 1,
                bitrate_index: 11,
            },
            2,
        );
        assert!(matches!(
            FrameHeader::from_bytes(&no_bitrate),
            Err(HeaderError::BitrateIndexOutOfRange {
                config: ChannelConfig::Stereo,
                index: 11
            })
        ));

        let empty_table = header(
            Layout::Channel {
                channel_number_index: 5,
                bitrate_index: 0,
            },
            2,
        );
        assert!(matches!(
            FrameHeader::from_bytes(&empty_table),
            Err(HeaderError::BitrateIndexOutOfRange {
                config: ChannelConfig::Mc22_2,
                index: 0
            })
        ));

        let high_order = header(
            Layout::Hoa {
                order: 4,
                bitrate_index: 0,
            },
            2,
        );
        assert!(matches!(
            FrameHeader::from_bytes(&high_order),
            Err(HeaderError::UnsupportedAmbisonicsOrder(4))
        ));
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert!(matches!(
            FrameHeader::from_bytes(&EXAMPLE_HEADER[..5]),
            Err(HeaderError::Reader(_))
        ));
    }
}
