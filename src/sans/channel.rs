//! Channel descriptors, embedded in the file header and in overflow groups.

use zerocopy::{
    FromBytes,
    byteorder::little_endian::{F32, U16, U32},
};

use super::header::text;

/// Size of a single channel descriptor.
pub const CHANNEL_INFO_SIZE: usize = 128;

/// Number of channel descriptors embedded in the file header.
pub const EMBEDDED_CHANNELS: usize = 6;

/// Number of channel descriptors in each overflow group following the file
/// header.
pub const CHANNEL_GROUP: usize = 8;

/// Size of an overflow group of channel descriptors.
pub const CHANNEL_GROUP_SIZE: usize = CHANNEL_GROUP * CHANNEL_INFO_SIZE;

/// Number of overflow groups following the file header of a document with
/// `total` channels.
pub fn overflow_groups(total: usize) -> usize {
    total.saturating_sub(EMBEDDED_CHANNELS).div_ceil(CHANNEL_GROUP)
}

#[repr(C, packed)]
#[derive(FromBytes)]
pub(crate) struct RawChannelInfo {
    type_of_channel: u8,
    sub_channel_number: u8,
    correction_flags: U16,
    uni_polar: U16,
    bytes_per_sample: U16,
    _reserved: U32,
    channel_name: [u8; 16],
    volt_scale: F32,
    frequency: F32,
    horiz_beam_angle: F32,
    tilt_angle: F32,
    beam_width: F32,
    offset_x: F32,
    offset_y: F32,
    offset_z: F32,
    offset_yaw: F32,
    offset_pitch: F32,
    offset_roll: F32,
    beams_per_array: U16,
    sample_format: u8,
    _reserved_area: [u8; 53],
}

const _: () = assert!(size_of::<RawChannelInfo>() == CHANNEL_INFO_SIZE);

/// Mounting offsets of a sensor relative to the vessel reference point.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Offsets {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Static metadata describing one logical sonar or bathymetry channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub type_of_channel: u8,
    /// Index used by records to refer to this channel.
    pub sub_channel: u8,
    pub correction_flags: u16,
    pub uni_polar: u16,
    /// Width of one stored sample.
    pub bytes_per_sample: u16,
    pub volt_scale: f32,
    pub frequency: f32,
    pub horizontal_beam_angle: f32,
    pub tilt_angle: f32,
    pub beam_width: f32,
    pub offsets: Offsets,
    pub beams_per_array: u16,
    pub sample_format: u8,
    name: [u8; 16],
}

impl ChannelInfo {
    /// The channel name, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        text(&self.name)
    }

    /// The kind of channel, if known.
    pub fn kind(&self) -> Option<ChannelKind> {
        match self.type_of_channel {
            0 => Some(ChannelKind::Subbottom),
            1 => Some(ChannelKind::Port),
            2 => Some(ChannelKind::Starboard),
            3 => Some(ChannelKind::Bathymetry),
            _ => None,
        }
    }
}

impl ChannelInfo {
    pub(crate) fn from_raw(c: RawChannelInfo) -> Self {
        Self {
            type_of_channel: c.type_of_channel,
            sub_channel: c.sub_channel_number,
            correction_flags: c.correction_flags.get(),
            uni_polar: c.uni_polar.get(),
            bytes_per_sample: c.bytes_per_sample.get(),
            volt_scale: c.volt_scale.get(),
            frequency: c.frequency.get(),
            horizontal_beam_angle: c.horiz_beam_angle.get(),
            tilt_angle: c.tilt_angle.get(),
            beam_width: c.beam_width.get(),
            offsets: Offsets {
                x: c.offset_x.get(),
                y: c.offset_y.get(),
                z: c.offset_z.get(),
                yaw: c.offset_yaw.get(),
                pitch: c.offset_pitch.get(),
                roll: c.offset_roll.get(),
            },
            beams_per_array: c.beams_per_array.get(),
            sample_format: c.sample_format,
            name: c.channel_name,
        }
    }
}

/// Kind of data recorded by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Subbottom,
    Port,
    Starboard,
    Bathymetry,
}
