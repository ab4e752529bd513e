//! Synthetic headers and frames for tests.

use std::io;

use bitstream_io::{BigEndian, BitWrite, BitWriter};

use crate::structs::header::{
    AUDIO_CODEC_ID, CODING_PROFILE_CHANNEL, CODING_PROFILE_HOA, CODING_PROFILE_OBJECT,
    FrameHeader, HEADER_SIZE,
};

const RESOLUTION: u32 = 1;

/// Profile-specific fields to encode. Channel counts are given as actual
/// counts and orders as actual orders.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Layout {
    Channel {
        channel_number_index: u8,
        bitrate_index: u8,
    },
    Objects {
        object_channels: u8,
        bitrate_index_per_channel: u8,
    },
    BedAndObjects {
        channel_number_index: u8,
        bitrate_index: u8,
        object_channels: u8,
        bitrate_index_per_channel: u8,
    },
    Hoa {
        order: u8,
        bitrate_index: u8,
    },
    /// Object-based header with the given `soundbed_type` and nothing after it.
    SoundBedType(u8),
    /// Arbitrary `coding_profile` with no profile fields.
    CodingProfile(u8),
}

pub(crate) const STEREO: Layout = Layout::Channel {
    channel_number_index: 1,
    bitrate_index: 0,
};

pub(crate) const SURROUND: Layout = Layout::Channel {
    channel_number_index: 2,
    bitrate_index: 0,
};

pub(crate) fn header(layout: Layout, sampling_frequency_index: u8) -> [u8; HEADER_SIZE] {
    header_with(AUDIO_CODEC_ID, false, sampling_frequency_index, layout)
}

pub(crate) fn header_with(
    audio_codec_id: u8,
    anc_data: bool,
    sampling_frequency_index: u8,
    layout: Layout,
) -> [u8; HEADER_SIZE] {
    let mut writer = BitWriter::endian(Vec::new(), BigEndian);
    write_header(
        &mut writer,
        audio_codec_id,
        anc_data,
        sampling_frequency_index,
        layout,
    )
    .unwrap();
    writer.byte_align().unwrap();

    let mut bytes = writer.into_writer();
    assert!(bytes.len() <= HEADER_SIZE);
    bytes.resize(HEADER_SIZE, 0);

    bytes.try_into().unwrap()
}

fn write_header<W: BitWrite>(
    w: &mut W,
    audio_codec_id: u8,
    anc_data: bool,
    sampling_frequency_index: u8,
    layout: Layout,
) -> io::Result<()> {
    let coding_profile = match layout {
        Layout::Channel { .. } => CODING_PROFILE_CHANNEL,
        Layout::Objects { .. } | Layout::BedAndObjects { .. } | Layout::SoundBedType(_) => {
            CODING_PROFILE_OBJECT
        }
        Layout::Hoa { .. } => CODING_PROFILE_HOA,
        Layout::CodingProfile(profile) => profile,
    };

    w.write_unsigned_var::<u32>(12, 0xFFF)?; // sync_word
    w.write_unsigned_var::<u32>(4, audio_codec_id as u32)?;
    w.write_bit(anc_data)?;
    w.write_unsigned_var::<u32>(3, 0)?; // nn_type
    w.write_unsigned_var::<u32>(3, coding_profile as u32)?;
    w.write_unsigned_var::<u32>(4, sampling_frequency_index as u32)?;
    w.write_unsigned_var::<u32>(8, 0)?; // crc

    match layout {
        Layout::Channel {
            channel_number_index,
            bitrate_index,
        } => {
            w.write_unsigned_var::<u32>(7, channel_number_index as u32)?;
            w.write_unsigned_var::<u32>(2, RESOLUTION)?;
            w.write_unsigned_var::<u32>(4, bitrate_index as u32)?;
        }
        Layout::Objects {
            object_channels,
            bitrate_index_per_channel,
        } => {
            w.write_unsigned_var::<u32>(2, 0)?;
            w.write_unsigned_var::<u32>(7, object_channels as u32 - 1)?;
            w.write_unsigned_var::<u32>(4, bitrate_index_per_channel as u32)?;
            w.write_unsigned_var::<u32>(2, RESOLUTION)?;
        }
        Layout::BedAndObjects {
            channel_number_index,
            bitrate_index,
            object_channels,
            bitrate_index_per_channel,
        } => {
            w.write_unsigned_var::<u32>(2, 1)?;
            w.write_unsigned_var::<u32>(7, channel_number_index as u32)?;
            w.write_unsigned_var::<u32>(4, bitrate_index as u32)?;
            w.write_unsigned_var::<u32>(7, object_channels as u32 - 1)?;
            w.write_unsigned_var::<u32>(4, bitrate_index_per_channel as u32)?;
            w.write_unsigned_var::<u32>(2, RESOLUTION)?;
        }
        Layout::Hoa {
            order,
            bitrate_index,
        } => {
            w.write_unsigned_var::<u32>(4, order as u32 - 1)?;
            w.write_unsigned_var::<u32>(2, RESOLUTION)?;
            w.write_unsigned_var::<u32>(4, bitrate_index as u32)?;
        }
        Layout::SoundBedType(soundbed_type) => {
            w.write_unsigned_var::<u32>(2, soundbed_type as u32)?;
        }
        Layout::CodingProfile(_) => {}
    }

    w.write_unsigned_var::<u32>(8, 0) // crc
}

/// A complete frame: the header followed by payload bytes that never form a
/// sync marker.
pub(crate) fn frame(layout: Layout, sampling_frequency_index: u8) -> Vec<u8> {
    let header = header(layout, sampling_frequency_index);
    let size = FrameHeader::from_bytes(&header).unwrap().frame_size() as usize;

    let mut data = header.to_vec();
    data.extend((HEADER_SIZE..size).map(|i| (i % 0x70) as u8 + 1));
    data
}

/// 64-byte stereo frame at 48 kHz.
pub(crate) fn stereo_frame() -> Vec<u8> {
    frame(STEREO, 2)
}
