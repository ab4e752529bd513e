//! Channel configurations and rate tables.
//!
//! Every table index coming from a header is bounds-checked through
//! [`sampling_rate`] and [`ChannelConfig::bitrate`]; out-of-range indexes
//! yield `None` instead of a fallback value.

use std::fmt::{Display, Formatter};

/// Sampling rates indexed by `sampling_frequency_index`.
pub const SAMPLING_FREQUENCY_TABLE: [u32; 9] = [
    192000, 96000, 48000, 44100, 32000, 24000, 22050, 16000, 8000,
];

pub fn sampling_rate(index: u8) -> Option<u32> {
    SAMPLING_FREQUENCY_TABLE.get(index as usize).copied()
}

/// Channel configurations carried by `channel_number_index`.
///
/// The ambisonics entries are never signalled directly; they are selected
/// from the ambisonics order of a higher-order-ambisonics header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChannelConfig {
    Mono = 0,
    Stereo,
    Mc5_1,
    Mc7_1,
    Mc10_2,
    Mc22_2,
    Mc4_0,
    Mc5_1_2,
    Mc5_1_4,
    Mc7_1_2,
    Mc7_1_4,
    HoaOrder1,
    HoaOrder2,
    HoaOrder3,
}

impl ChannelConfig {
    pub const ALL: [ChannelConfig; 14] = [
        Self::Mono,
        Self::Stereo,
        Self::Mc5_1,
        Self::Mc7_1,
        Self::Mc10_2,
        Self::Mc22_2,
        Self::Mc4_0,
        Self::Mc5_1_2,
        Self::Mc5_1_4,
        Self::Mc7_1_2,
        Self::Mc7_1_4,
        Self::HoaOrder1,
        Self::HoaOrder2,
        Self::HoaOrder3,
    ];

    /// Highest configuration a channel-based header may signal.
    pub const LAST_CHANNEL_BASED: ChannelConfig = Self::Mc7_1_4;

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Loudspeaker channels; zero for the ambisonics entries, whose channel
    /// count follows from the order instead.
    pub const fn channel_count(self) -> u32 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Mc5_1 => 6,
            Self::Mc7_1 => 8,
            Self::Mc10_2 => 12,
            Self::Mc22_2 => 24,
            Self::Mc4_0 => 4,
            Self::Mc5_1_2 => 8,
            Self::Mc5_1_4 => 10,
            Self::Mc7_1_2 => 10,
            Self::Mc7_1_4 => 12,
            Self::HoaOrder1 | Self::HoaOrder2 | Self::HoaOrder3 => 0,
        }
    }

    /// Total bitrates in bits per second, indexed by `bitrate_index`.
    pub const fn bitrates(self) -> &'static [u32] {
        match self {
            Self::Mono => &[
                16000, 32000, 44000, 56000, 64000, 72000, 80000, 96000, 128000, 144000, 164000,
                192000,
            ],
            Self::Stereo => &[
                24000, 32000, 48000, 64000, 80000, 96000, 128000, 144000, 192000, 256000, 320000,
            ],
            Self::Mc5_1 => &[
                192000, 256000, 320000, 384000, 448000, 512000, 640000, 720000, 144000, 96000,
                128000, 160000,
            ],
            Self::Mc7_1 => &[
                192000, 480000, 256000, 384000, 576000, 640000, 128000, 160000,
            ],
            Self::Mc10_2 | Self::Mc22_2 => &[],
            Self::Mc4_0 => &[48000, 96000, 128000, 192000, 256000],
            Self::Mc5_1_2 => &[152000, 320000, 480000, 576000],
            Self::Mc5_1_4 => &[176000, 384000, 576000, 704000, 256000, 448000],
            Self::Mc7_1_2 => &[216000, 480000, 576000, 384000, 768000],
            Self::Mc7_1_4 => &[240000, 608000, 384000, 512000, 832000],
            Self::HoaOrder1 => &[48000, 96000, 128000, 192000, 256000],
            Self::HoaOrder2 => &[192000, 256000, 320000, 384000, 480000, 512000, 640000],
            Self::HoaOrder3 => &[256000, 320000, 384000, 512000, 640000, 896000],
        }
    }

    pub fn bitrate(self, index: u8) -> Option<u32> {
        self.bitrates().get(index as usize).copied()
    }

    pub fn from_ambisonics_order(order: u8) -> Option<Self> {
        match order {
            1 => Some(Self::HoaOrder1),
            2 => Some(Self::HoaOrder2),
            3 => Some(Self::HoaOrder3),
            _ => None,
        }
    }
}

impl Display for ChannelConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mono => "mono",
            Self::Stereo => "stereo",
            Self::Mc5_1 => "5.1",
            Self::Mc7_1 => "7.1",
            Self::Mc10_2 => "10.2",
            Self::Mc22_2 => "22.2",
            Self::Mc4_0 => "4.0",
            Self::Mc5_1_2 => "5.1.2",
            Self::Mc5_1_4 => "5.1.4",
            Self::Mc7_1_2 => "7.1.2",
            Self::Mc7_1_4 => "7.1.4",
            Self::HoaOrder1 => "HOA order 1",
            Self::HoaOrder2 => "HOA order 2",
            Self::HoaOrder3 => "HOA order 3",
        };

        f.write_str(name)
    }
}

#[test]
fn config_indexes_are_stable() {
    for (i, config) in ChannelConfig::ALL.iter().enumerate() {
        assert_eq!(config.index() as usize, i);
        assert_eq!(ChannelConfig::from_index(i as u8), Some(*config));
    }
    assert_eq!(ChannelConfig::from_index(14), None);
    assert_eq!(ChannelConfig::LAST_CHANNEL_BASED.index(), 10);
}

#[test]
fn table_lookups_are_bounded() {
    assert_eq!(sampling_rate(2), Some(48000));
    assert_eq!(sampling_rate(8), Some(8000));
    assert_eq!(sampling_rate(9), None);

    assert_eq!(ChannelConfig::Stereo.bitrate(0), Some(24000));
    assert_eq!(ChannelConfig::Stereo.bitrate(10), Some(320000));
    assert_eq!(ChannelConfig::Stereo.bitrate(11), None);
    assert_eq!(ChannelConfig::Mc22_2.bitrate(0), None);
    assert_eq!(ChannelConfig::Mono.bitrates().len(), 12);
}

#[test]
fn ambisonics_orders_map_to_dedicated_configs() {
    assert_eq!(
        ChannelConfig::from_ambisonics_order(2),
        Some(ChannelConfig::HoaOrder2)
    );
    assert_eq!(ChannelConfig::from_ambisonics_order(4), None);
    assert_eq!(format!("{}", ChannelConfig::Mc7_1_4), "7.1.4");
}
