//! Section machine processing R2Sonic bathymetry packets embedded by QINSy.
//!
//! Unlike the records carrying them, these packets are big-endian. A packet
//! opens with a 12-byte header holding its name and size, followed by
//! sections. Each section opens with a two-character tag and its size, which
//! counts the opening itself.
//!
//! Beams are allocated by the `H0` section and populated by the sections
//! after it. They are only complete once the whole packet has been read.

use alloc::vec::Vec;
use core::fmt;

use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::big_endian::{F32, U16, U32},
};

use super::{beams::Beams, sample::Ping};

/// Name of a bathymetry packet.
pub const PACKET_NAME: [u8; 4] = *b"BTH0";

const PACKET_HEADER_SIZE: usize = 12;

const SECTION_HEADER_SIZE: usize = 4;

/// A two-character section tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag(pub [u8; 2]);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", char::from(b))?;
            } else {
                write!(f, "\\x{b:02X}")?;
            }
        }

        Ok(())
    }
}

/// Sections of a bathymetry packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Main header, allocating beams.
    H0,
    /// Across-track angles, equally spaced.
    A0,
    /// Across-track angles, stepped per beam.
    A2,
    /// Intensities.
    I1,
    /// Ranges, as two-way travel times.
    R0,
    /// Quality flags.
    Q0,
    /// Depth gate settings.
    G0,
    /// Depth gates per beam.
    G1,
    Unknown(Tag),
}

impl From<Tag> for Section {
    fn from(tag: Tag) -> Self {
        match &tag.0 {
            b"H0" => Self::H0,
            b"A0" => Self::A0,
            b"A2" => Self::A2,
            b"I1" => Self::I1,
            b"R0" => Self::R0,
            b"Q0" => Self::Q0,
            b"G0" => Self::G0,
            b"G1" => Self::G1,
            _ => Self::Unknown(tag),
        }
    }
}

/// An error decoding a bathymetry packet. No beams are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedPacket {
    /// Payload too short for a packet header.
    #[error("Payload too short for a bathymetry packet header.")]
    Header,
    /// Incorrect packet name.
    #[error("Incorrect bathymetry packet name ({0:?}).")]
    Name([u8; 4]),
    /// Section header runs past the end of the payload.
    #[error("Section header at offset {0} runs past the end of the payload.")]
    SectionHeader(usize),
    /// Section size shorter than its header, which would stall decoding.
    #[error("{tag} section size ({size}) shorter than its header.")]
    SectionSize { tag: Tag, size: u16 },
    /// Section, or a beam array inside it, runs past the end of the section.
    #[error("{0} section truncated.")]
    SectionBody(Tag),
}

/// Beams assembled from a bathymetry packet.
#[derive(Debug, Clone, PartialEq)]
pub struct Swath {
    /// Completed beams in ascending order, or why the packet yielded none.
    pub pings: Result<Vec<Ping>, MalformedPacket>,
    /// Tags of sections skipped as unknown, in order of appearance. Includes
    /// those read before a packet was found to be malformed.
    pub unknown_sections: Vec<Tag>,
}

/// Decode a bathymetry packet from the front of a slice.
pub fn decode(r: &[u8]) -> Swath {
    let mut unknown_sections = Vec::new();
    let pings = sections(r, &mut unknown_sections);

    Swath {
        pings,
        unknown_sections,
    }
}

fn sections(r: &[u8], unknown_sections: &mut Vec<Tag>) -> Result<Vec<Ping>, MalformedPacket> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawPacketHeader {
        packet_name: [u8; 4],
        packet_size: U32,
        data_stream_id: U32,
    }

    const _: () = assert!(size_of::<RawPacketHeader>() == PACKET_HEADER_SIZE);

    let (
        RawPacketHeader {
            packet_name,
            packet_size,
            ..
        },
        _,
    ) = RawPacketHeader::read_from_prefix(r).map_err(|_| MalformedPacket::Header)?;

    if packet_name != PACKET_NAME {
        Err(MalformedPacket::Name(packet_name))?;
    }

    let end = packet_size.get() as usize;

    let mut beams = Beams::default();

    let mut i = PACKET_HEADER_SIZE;

    while i < end {
        let (tag, size) = section_header(r, i)?;

        let body = r
            .get(i + SECTION_HEADER_SIZE..i + size)
            .ok_or(MalformedPacket::SectionBody(tag))?;

        match Section::from(tag) {
            Section::H0 => h0(body, &mut beams)?,
            // Sections before the main header have no beams to populate.
            Section::A0 | Section::A2 | Section::I1 | Section::R0 | Section::Q0
                if beams.is_empty() =>
            {
                log::trace!("Skipping {tag} section without beams.");
            }
            Section::A0 => a0(body, &mut beams)?,
            Section::A2 => a2(body, &mut beams)?,
            Section::I1 => i1(body, &mut beams)?,
            Section::R0 => r0(body, &mut beams)?,
            Section::Q0 => q0(&mut beams),
            Section::G0 | Section::G1 => {}
            Section::Unknown(tag) => unknown_sections.push(tag),
        }

        i += size;
    }

    Ok(beams.into_pings().collect())
}

/// Decode the section header at offset `i`, returning its tag and size.
fn section_header(r: &[u8], i: usize) -> Result<(Tag, usize), MalformedPacket> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawSectionHeader {
        section_name: [u8; 2],
        section_size: U16,
    }

    let (
        RawSectionHeader {
            section_name,
            section_size,
        },
        _,
    ) = RawSectionHeader::read_from_prefix(r.get(i..).unwrap_or_default())
        .map_err(|_| MalformedPacket::SectionHeader(i))?;

    let tag = Tag(section_name);
    let size = section_size.get();

    if usize::from(size) < SECTION_HEADER_SIZE {
        Err(MalformedPacket::SectionSize { tag, size })?;
    }

    Ok((tag, size.into()))
}

fn h0(r: &[u8], beams: &mut Beams) -> Result<(), MalformedPacket> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawH0 {
        model_number: [u8; 12],
        serial_number: [u8; 12],
        time_seconds: U32,
        time_nanoseconds: U32,
        ping_number: U32,
        ping_period: F32,
        sound_speed: F32,
        frequency: F32,
        tx_power: F32,
        tx_pulse_width: F32,
        tx_beamwidth_vert: F32,
        tx_beamwidth_horiz: F32,
        tx_steering_vert: F32,
        tx_steering_horiz: F32,
        tx_misc_info: U32,
        rx_bandwidth: F32,
        rx_sample_rate: F32,
        rx_range: F32,
        rx_gain: F32,
        rx_spreading: F32,
        rx_absorption: F32,
        rx_mount_tilt: F32,
        rx_misc_info: U32,
        _reserved: U16,
        points: U16,
    }

    const _: () = assert!(size_of::<RawH0>() == 112);

    let (h, _) = read::<RawH0>(r, Tag(*b"H0"))?;

    let timestamp = u64::from(h.time_seconds.get()) * 1_000_000
        + u64::from(h.time_nanoseconds.get()) / 1000;

    beams.reset(h.points.get().into(), timestamp);

    Ok(())
}

fn a0(r: &[u8], beams: &mut Beams) -> Result<(), MalformedPacket> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawA0 {
        angle_first: F32,
        angle_last: F32,
        more_info: [F32; 6],
    }

    let (a, _) = read::<RawA0>(r, Tag(*b"A0"))?;

    let first = f64::from(a.angle_first.get());
    let last = f64::from(a.angle_last.get());

    let step = (first - last) / beams.len() as f64;

    for (i, b) in beams.iter_mut().enumerate() {
        b.across_track_angle = Some(first + i as f64 * step);
    }

    Ok(())
}

fn a2(r: &[u8], beams: &mut Beams) -> Result<(), MalformedPacket> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawA2 {
        angle_first: F32,
        scaling_factor: F32,
        more_info: [F32; 6],
    }

    let tag = Tag(*b"A2");
    let (a, rest) = read::<RawA2>(r, tag)?;
    let steps = words(rest, beams.len(), tag)?;

    let first = f64::from(a.angle_first.get());
    let scale = f64::from(a.scaling_factor.get());

    // At most 65535 steps of 65535 each.
    let mut sum = 0u32;

    for (b, step) in beams.iter_mut().zip(steps) {
        sum += u32::from(step.get());
        b.across_track_angle = Some((first + f64::from(sum) * scale).to_degrees());
    }

    Ok(())
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawScaled {
    scaling_factor: F32,
}

fn i1(r: &[u8], beams: &mut Beams) -> Result<(), MalformedPacket> {
    let tag = Tag(*b"I1");
    let (s, rest) = read::<RawScaled>(r, tag)?;
    let intensities = words(rest, beams.len(), tag)?;

    let scale = f64::from(s.scaling_factor.get());

    for (b, intensity) in beams.iter_mut().zip(intensities) {
        let micropascals = f64::from(intensity.get()) * scale;
        b.intensity = Some(20.0 * libm::log10(micropascals * 1_000_000.0 / 0.000_02));
    }

    Ok(())
}

fn r0(r: &[u8], beams: &mut Beams) -> Result<(), MalformedPacket> {
    let tag = Tag(*b"R0");
    let (s, rest) = read::<RawScaled>(r, tag)?;
    let ranges = words(rest, beams.len(), tag)?;

    let scale = f64::from(s.scaling_factor.get());

    for (b, range) in beams.iter_mut().zip(ranges) {
        b.two_way_travel_time = Some(scale * f64::from(range.get()));
    }

    Ok(())
}

// TODO: decode the packed 4-bit quality flags once their layout is confirmed
// against recorded data.
fn q0(beams: &mut Beams) {
    for b in beams.iter_mut() {
        b.quality = Some(0);
    }
}

fn read<T: FromBytes>(r: &[u8], tag: Tag) -> Result<(T, &[u8]), MalformedPacket> {
    T::read_from_prefix(r).map_err(|_| MalformedPacket::SectionBody(tag))
}

/// Read an array of `n` big-endian words.
fn words(r: &[u8], n: usize, tag: Tag) -> Result<&[U16], MalformedPacket> {
    let (words, _) = <[U16]>::ref_from_prefix_with_elems(r, n)
        .map_err(|_| MalformedPacket::SectionBody(tag))?;

    Ok(words)
}
