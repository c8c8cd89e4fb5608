//! States processing the file header, channel descriptors, and record headers.

use either::Either::{self, Left, Right};
use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::little_endian::{F32, I32, U16, U32},
};

use super::{
    channel::{
        CHANNEL_GROUP, CHANNEL_GROUP_SIZE, ChannelInfo, EMBEDDED_CHANNELS, Offsets,
        RawChannelInfo,
    },
    record::{self, Decoded, PayloadError},
    time::EpochBuilder,
};

/// File format marker of an XTF document.
pub const FILE_FORMAT: u8 = 123;

/// Size of the file header, including embedded channel descriptors.
pub const FILE_HEADER_SIZE: usize = 1024;

/// Marker opening every record header.
pub const PACKET_MAGIC: u16 = 0xFACE;

/// Size of a record header.
pub const PACKET_HEADER_SIZE: usize = 14;

/// An error advancing over a file header.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Incorrect file format marker.
    #[error("Incorrect file format marker ({0}).")]
    NotXtfData(u8),
}

/// State token to decode a file header.
#[derive(Debug)]
pub struct Document;

impl Document {
    /// Transition to another state by decoding a file header.
    ///
    /// Returns the file header, and a successor state token. Documents with
    /// more channels than fit in the file header continue with a table of
    /// overflow channel descriptors.
    pub fn advance(
        r: [u8; FILE_HEADER_SIZE],
    ) -> Result<(FileHeader, Either<ChannelTable, RecordHeader>), DocumentError> {
        let raw: RawFileHeader = zerocopy::transmute!(r);

        if raw.file_format != FILE_FORMAT {
            Err(DocumentError::NotXtfData(raw.file_format))?;
        }

        let header = FileHeader::from_raw(raw);

        let remaining = header.total_channels().saturating_sub(EMBEDDED_CHANNELS);

        let successor = if remaining != 0 {
            Left(ChannelTable { remaining })
        } else {
            Right(RecordHeader(()))
        };

        Ok((header, successor))
    }
}

/// State token to decode a group of overflow channel descriptors.
#[derive(Debug)]
pub struct ChannelTable {
    pub(super) remaining: usize,
}

impl ChannelTable {
    /// Number of channel descriptors not yet decoded.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Transition to another state by decoding a group of channel
    /// descriptors.
    ///
    /// Returns the descriptors in use, and a successor state token. Padding
    /// entries at the end of the final group are discarded.
    pub fn advance(
        self,
        r: [u8; CHANNEL_GROUP_SIZE],
    ) -> (
        impl Iterator<Item = ChannelInfo>,
        Either<ChannelTable, RecordHeader>,
    ) {
        let group: [RawChannelInfo; CHANNEL_GROUP] = zerocopy::transmute!(r);

        let taken = self.remaining.min(CHANNEL_GROUP);
        let remaining = self.remaining - taken;

        let successor = if remaining != 0 {
            Left(ChannelTable { remaining })
        } else {
            Right(RecordHeader(()))
        };

        (group.into_iter().take(taken).map(ChannelInfo::from_raw), successor)
    }
}

/// An error advancing over a record header.
#[derive(Debug, Error)]
pub enum RecordHeaderError {
    /// Incorrect record marker; record boundaries are lost.
    #[error("Incorrect record marker ({0:#06X}).")]
    Framing(u16),
    /// Record length shorter than its own header.
    #[error("Record length ({0}) shorter than its header.")]
    Length(u32),
}

/// State token to decode a record header.
#[derive(Debug)]
pub struct RecordHeader(pub(super) ());

impl RecordHeader {
    /// Transition to another state by decoding a record header.
    ///
    /// Returns the record header, and a successor state token expecting the
    /// payload.
    pub fn advance(
        self,
        r: [u8; PACKET_HEADER_SIZE],
    ) -> Result<(PacketHeader, Payload), RecordHeaderError> {
        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct RawPacketHeader {
            magic_number: U16,
            header_type: u8,
            sub_channel_number: u8,
            num_chans_to_follow: U16,
            _reserved: [u8; 4],
            num_bytes_this_record: U32,
        }

        let RawPacketHeader {
            magic_number,
            header_type,
            sub_channel_number,
            num_chans_to_follow,
            num_bytes_this_record,
            ..
        } = zerocopy::transmute!(r);

        if magic_number.get() != PACKET_MAGIC {
            Err(RecordHeaderError::Framing(magic_number.get()))?;
        }

        let length = num_bytes_this_record.get();

        let size = (length as usize)
            .checked_sub(PACKET_HEADER_SIZE)
            .ok_or(RecordHeaderError::Length(length))?;

        let header = PacketHeader {
            header_type,
            sub_channel: sub_channel_number,
            channels_to_follow: num_chans_to_follow.get(),
            length,
        };

        Ok((header, Payload { header, size }))
    }
}

/// State token to decode a record payload.
#[derive(Debug)]
pub struct Payload {
    header: PacketHeader,
    size: usize,
}

impl Payload {
    /// Number of payload bytes expected by [`Payload::advance`].
    pub fn size(&self) -> usize {
        self.size
    }

    /// Transition to another state by decoding a record payload.
    ///
    /// **This method expects exactly [`Payload::size`] bytes.**
    ///
    /// Returns the decoded record, and a successor state token.
    pub fn advance(
        self,
        r: &[u8],
        e: &impl EpochBuilder,
    ) -> (Result<Decoded, PayloadError>, RecordHeader) {
        (record::decode(&self.header, r, e), RecordHeader(()))
    }
}

/// Framing information at the start of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Record type tag.
    pub header_type: u8,
    pub sub_channel: u8,
    /// For multibeam records, the number of beam entries in the payload.
    pub channels_to_follow: u16,
    /// Length of the record, including this header.
    pub length: u32,
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawFileHeader {
    file_format: u8,
    system_type: u8,
    recording_program_name: [u8; 8],
    recording_program_version: [u8; 8],
    sonar_name: [u8; 16],
    sonar_type: U16,
    note_string: [u8; 64],
    this_file_name: [u8; 64],
    nav_units: U16,
    number_of_sonar_channels: U16,
    number_of_bathymetry_channels: U16,
    number_of_snippet_channels: u8,
    number_of_forward_look_arrays: u8,
    number_of_echo_strength_channels: U16,
    number_of_interferometry_channels: u8,
    _reserved1: u8,
    _reserved2: U16,
    reference_point_height: F32,
    projection_type: [u8; 12],
    spheroid_type: [u8; 10],
    navigation_latency: I32,
    origin_y: F32,
    origin_x: F32,
    nav_offset_y: F32,
    nav_offset_x: F32,
    nav_offset_z: F32,
    nav_offset_yaw: F32,
    mru_offset_y: F32,
    mru_offset_x: F32,
    mru_offset_z: F32,
    mru_offset_yaw: F32,
    mru_offset_pitch: F32,
    mru_offset_roll: F32,
    channels: [RawChannelInfo; EMBEDDED_CHANNELS],
}

const _: () = assert!(size_of::<RawFileHeader>() == FILE_HEADER_SIZE);

/// Document-wide metadata stored at the start of every document.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub file_format: u8,
    pub system_type: u8,
    pub sonar_type: u16,
    pub nav_units: u16,
    pub sonar_channels: u16,
    pub bathymetry_channels: u16,
    pub snippet_channels: u8,
    pub forward_look_arrays: u8,
    pub echo_strength_channels: u16,
    pub interferometry_channels: u8,
    pub reference_point_height: f32,
    /// Navigation latency in milliseconds.
    pub navigation_latency: i32,
    pub origin_x: f32,
    pub origin_y: f32,
    /// Navigation antenna offsets. Pitch and roll are not recorded.
    pub nav_offsets: Offsets,
    /// Motion reference unit offsets.
    pub mru_offsets: Offsets,
    recording_program_name: [u8; 8],
    recording_program_version: [u8; 8],
    sonar_name: [u8; 16],
    note: [u8; 64],
    file_name: [u8; 64],
    projection_type: [u8; 12],
    spheroid_type: [u8; 10],
    channels: [ChannelInfo; EMBEDDED_CHANNELS],
}

impl FileHeader {
    /// Total number of channels described by the document.
    ///
    /// Forward-look arrays are not counted.
    pub fn total_channels(&self) -> usize {
        usize::from(self.sonar_channels)
            + usize::from(self.bathymetry_channels)
            + usize::from(self.snippet_channels)
            + usize::from(self.echo_strength_channels)
            + usize::from(self.interferometry_channels)
    }

    /// Channel descriptors stored in the file header.
    ///
    /// Holds the first `min(6, total_channels())` descriptors. Any others
    /// follow the file header in overflow groups.
    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels[..self.total_channels().min(EMBEDDED_CHANNELS)]
    }

    pub fn recording_program_name(&self) -> Option<&str> {
        text(&self.recording_program_name)
    }

    pub fn recording_program_version(&self) -> Option<&str> {
        text(&self.recording_program_version)
    }

    pub fn sonar_name(&self) -> Option<&str> {
        text(&self.sonar_name)
    }

    pub fn note(&self) -> Option<&str> {
        text(&self.note)
    }

    /// The name of the file when it was recorded.
    pub fn file_name(&self) -> Option<&str> {
        text(&self.file_name)
    }

    pub fn projection_type(&self) -> Option<&str> {
        text(&self.projection_type)
    }

    pub fn spheroid_type(&self) -> Option<&str> {
        text(&self.spheroid_type)
    }
}

impl FileHeader {
    fn from_raw(h: RawFileHeader) -> Self {
        Self {
            file_format: h.file_format,
            system_type: h.system_type,
            sonar_type: h.sonar_type.get(),
            nav_units: h.nav_units.get(),
            sonar_channels: h.number_of_sonar_channels.get(),
            bathymetry_channels: h.number_of_bathymetry_channels.get(),
            snippet_channels: h.number_of_snippet_channels,
            forward_look_arrays: h.number_of_forward_look_arrays,
            echo_strength_channels: h.number_of_echo_strength_channels.get(),
            interferometry_channels: h.number_of_interferometry_channels,
            reference_point_height: h.reference_point_height.get(),
            navigation_latency: h.navigation_latency.get(),
            origin_x: h.origin_x.get(),
            origin_y: h.origin_y.get(),
            nav_offsets: Offsets {
                x: h.nav_offset_x.get(),
                y: h.nav_offset_y.get(),
                z: h.nav_offset_z.get(),
                yaw: h.nav_offset_yaw.get(),
                ..Default::default()
            },
            mru_offsets: Offsets {
                x: h.mru_offset_x.get(),
                y: h.mru_offset_y.get(),
                z: h.mru_offset_z.get(),
                yaw: h.mru_offset_yaw.get(),
                pitch: h.mru_offset_pitch.get(),
                roll: h.mru_offset_roll.get(),
            },
            recording_program_name: h.recording_program_name,
            recording_program_version: h.recording_program_version,
            sonar_name: h.sonar_name,
            note: h.note_string,
            file_name: h.this_file_name,
            projection_type: h.projection_type,
            spheroid_type: h.spheroid_type,
            channels: h.channels.map(ChannelInfo::from_raw),
        }
    }
}

/// Read a NUL-padded text field.
pub(crate) fn text(r: &[u8]) -> Option<&str> {
    let end = r.iter().position(|b| *b == 0).unwrap_or(r.len());

    core::str::from_utf8(&r[..end]).ok()
}
