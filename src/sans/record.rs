//! Decoding of record payloads.

use alloc::vec::Vec;

use thiserror::Error;
use zerocopy::{
    FromBytes, Immutable, KnownLayout,
    byteorder::little_endian::{F32, F64, I16, I32, U16, U32},
};

use super::{
    header::PacketHeader,
    r2sonic::{self, Swath},
    sample::{Attitude, Ping, Position, normalize_angle},
    time::{CivilTime, EpochBuilder},
};

/// A record type decoded into samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// Vessel attitude (`XTF_HEADER_ATTITUDE`).
    Attitude,
    /// QPS multibeam beams (`XTF_HEADER_Q_MULTIBEAM`).
    QpsMultibeam,
    /// Navigation with microsecond timestamps (`XTF_HEADER_NAVIGATION`).
    Navigation,
    /// R2Sonic bathymetry embedded by QINSy (`XTF_HEADER_QINSY_R2SONIC_BATHY`).
    QinsyR2SonicBathy,
    /// Position with tenth-of-millisecond timestamps (`XTF_HEADER_POSITION`).
    Position,
    /// Raw navigation (`XTF_HEADER_POS_RAW_NAVIGATION`), laid out as
    /// [`RecordType::Navigation`].
    PosRawNavigation,
}

impl RecordType {
    /// Identify a record type tag, if decoded by this crate.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            3 => Some(Self::Attitude),
            28 => Some(Self::QpsMultibeam),
            42 => Some(Self::Navigation),
            65 => Some(Self::QinsyR2SonicBathy),
            100 => Some(Self::Position),
            107 => Some(Self::PosRawNavigation),
            _ => None,
        }
    }

    /// The record type tag.
    pub fn tag(self) -> u8 {
        match self {
            Self::Attitude => 3,
            Self::QpsMultibeam => 28,
            Self::Navigation => 42,
            Self::QinsyR2SonicBathy => 65,
            Self::Position => 100,
            Self::PosRawNavigation => 107,
        }
    }
}

/// The documented name of a record type tag, whether or not it is decoded.
pub fn name(tag: u8) -> Option<&'static str> {
    Some(match tag {
        0 => "XTF_HEADER_SONAR",
        1 => "XTF_HEADER_NOTES",
        2 => "XTF_HEADER_BATHY",
        3 => "XTF_HEADER_ATTITUDE",
        4 => "XTF_HEADER_FORWARD",
        5 => "XTF_HEADER_ELAC",
        6 => "XTF_HEADER_RAW_SERIAL",
        7 => "XTF_HEADER_EMBED_HEAD",
        8 => "XTF_HEADER_HIDDEN_SONAR",
        9 => "XTF_HEADER_SEAVIEW_PROCESSED_BATHY",
        10 => "XTF_HEADER_SEAVIEW_DEPTHS",
        11 => "XTF_HEADER_RSVD_HIGHSPEED_SENSOR",
        12 => "XTF_HEADER_ECHOSTRENGTH",
        13 => "XTF_HEADER_GEOREC",
        14 => "XTF_HEADER_KLEIN_RAW_BATHY",
        15 => "XTF_HEADER_HIGHSPEED_SENSOR2",
        16 => "XTF_HEADER_ELAC_XSE",
        17 => "XTF_HEADER_BATHY_XYZA",
        18 => "XTF_HEADER_K5000_BATHY_IQ",
        19 => "XTF_HEADER_BATHY_SNIPPET",
        20 => "XTF_HEADER_GPS",
        21 => "XTF_HEADER_STAT",
        22 => "XTF_HEADER_SINGLEBEAM",
        23 => "XTF_HEADER_GYRO",
        24 => "XTF_HEADER_TRACKPOINT",
        25 => "XTF_HEADER_MULTIBEAM",
        26 => "XTF_HEADER_Q_SINGLEBEAM",
        27 => "XTF_HEADER_Q_MULTITX",
        28 => "XTF_HEADER_Q_MULTIBEAM",
        42 => "XTF_HEADER_NAVIGATION",
        50 => "XTF_HEADER_TIME",
        60 => "XTF_HEADER_BENTHOS_CAATI_SARA",
        61 => "XTF_HEADER_7125",
        62 => "XTF_HEADER_7125_SNIPPET",
        65 => "XTF_HEADER_QINSY_R2SONIC_BATHY",
        66 => "XTF_HEADER_QINSY_R2SONIC_FTS",
        68 => "XTF_HEADER_R2SONIC_BATHY",
        69 => "XTF_HEADER_R2SONIC_FTS",
        70 => "XTF_HEADER_CODA_ECHOSCOPE_DATA",
        71 => "XTF_HEADER_CODA_ECHOSCOPE_CONFIG",
        72 => "XTF_HEADER_CODA_ECHOSCOPE_IMAGE",
        73 => "XTF_HEADER_EDGETECH_4600",
        78 => "XTF_HEADER_RESON_7018_WATERCOLUMN",
        100 => "XTF_HEADER_POSITION",
        102 => "XTF_HEADER_BATHY_PROC",
        103 => "XTF_HEADER_ATTITUDE_PROC",
        104 => "XTF_HEADER_SINGLEBEAM_PROC",
        105 => "XTF_HEADER_AUX_PROC",
        106 => "XTF_HEADER_KLEIN3000_DATA_PAGE",
        107 => "XTF_HEADER_POS_RAW_NAVIGATION",
        108 => "XTF_HEADER_KLEINV4_DATA_PAGE",
        200 => "XTF_HEADER_USERDEFINED",
        _ => return None,
    })
}

/// An error decoding a record payload. The record is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// Payload shorter than the layout of its record type.
    #[error("Payload too short ({found} of {expected} bytes).")]
    Short { expected: usize, found: usize },
    /// Timestamp outside the range of the epoch builder.
    #[error("Timestamp cannot be represented.")]
    Timestamp,
}

/// The content of a decoded record.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Attitude(Attitude),
    Position(Position),
    /// Beams of a QPS multibeam record.
    Multibeam { header: PingHeader, pings: Vec<Ping> },
    /// A QINSy R2Sonic bathymetry record. Malformed packets yield no beams.
    Bathymetry { header: PingHeader, swath: Swath },
    /// A record type not decoded by this crate.
    Unknown(u8),
}

/// Size of the ping header opening sonar and bathymetry payloads.
pub const PING_HEADER_SIZE: usize = 242;

/// Size of a QPS multibeam beam entry.
pub const MULTIBEAM_ENTRY_SIZE: usize = 64;

/// Decode a record payload.
pub fn decode(
    h: &PacketHeader,
    r: &[u8],
    e: &impl EpochBuilder,
) -> Result<Decoded, PayloadError> {
    let Some(record_type) = RecordType::from_tag(h.header_type) else {
        return Ok(Decoded::Unknown(h.header_type));
    };

    Ok(match record_type {
        RecordType::Attitude => Decoded::Attitude(attitude(r, e)?),
        RecordType::Position => Decoded::Position(position(r, e)?),
        RecordType::Navigation | RecordType::PosRawNavigation => {
            Decoded::Position(navigation(r, e)?)
        }
        RecordType::QpsMultibeam => {
            let (header, pings) = multibeam(h, r, e)?;
            Decoded::Multibeam { header, pings }
        }
        RecordType::QinsyR2SonicBathy => {
            let (raw, rest) = read::<RawPingHeader>(r)?;
            let header = PingHeader::from_raw(&raw, e);
            Decoded::Bathymetry {
                header,
                swath: r2sonic::decode(rest),
            }
        }
    })
}

fn attitude(r: &[u8], e: &impl EpochBuilder) -> Result<Attitude, PayloadError> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawAttitude {
        _reserved: [u8; 8],
        epoch_microseconds: U32,
        source_epoch: U32,
        pitch: F32,
        roll: F32,
        heave: F32,
        yaw: F32,
        time_tag: U32,
        heading: F32,
        year: U16,
        month: u8,
        day: u8,
        hour: u8,
        minutes: u8,
        seconds: u8,
        milliseconds: U16,
        _reserved3: u8,
    }

    const _: () = assert!(size_of::<RawAttitude>() == 50);

    let (a, _) = read::<RawAttitude>(r)?;

    let time = CivilTime::from_record(
        a.year.get(),
        a.month,
        [a.day, a.hour, a.minutes, a.seconds],
        a.milliseconds.get().into(),
        1000,
    );

    Ok(Attitude {
        timestamp: epoch(e, time)?,
        heading: a.heading.get().into(),
        pitch: normalize_angle(a.pitch.get()),
        roll: normalize_angle(a.roll.get()),
    })
}

fn position(r: &[u8], e: &impl EpochBuilder) -> Result<Position, PayloadError> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawPosition {
        year: U16,
        month: u8,
        day: u8,
        hour: u8,
        minutes: u8,
        seconds: u8,
        tenths_of_milliseconds: U16,
        raw_y_coordinate: F64,
        raw_x_coordinate: F64,
        raw_altitude: F64,
        pitch: F32,
        roll: F32,
        heave: F32,
        heading: F32,
        _reserved: u8,
    }

    const _: () = assert!(size_of::<RawPosition>() == 50);

    let (p, _) = read::<RawPosition>(r)?;

    let time = CivilTime::from_record(
        p.year.get(),
        p.month,
        [p.day, p.hour, p.minutes, p.seconds],
        u32::from(p.tenths_of_milliseconds.get()) * 100,
        1,
    );

    Ok(Position {
        timestamp: epoch(e, time)?,
        x: p.raw_x_coordinate.get(),
        y: p.raw_y_coordinate.get(),
        z: p.raw_altitude.get(),
    })
}

fn navigation(r: &[u8], e: &impl EpochBuilder) -> Result<Position, PayloadError> {
    #[repr(C, packed)]
    #[derive(FromBytes)]
    struct RawNavigation {
        year: U16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        microseconds: U32,
        source_epoch: U32,
        time_tag: U32,
        raw_y_coordinate: F64,
        raw_x_coordinate: F64,
        raw_altitude: F64,
        time_flag: u8,
        _reserved: [u8; 6],
    }

    const _: () = assert!(size_of::<RawNavigation>() == 50);

    let (p, _) = read::<RawNavigation>(r)?;

    let time = CivilTime::from_record(
        p.year.get(),
        p.month,
        [p.day, p.hour, p.minute, p.second],
        p.microseconds.get(),
        1,
    );

    Ok(Position {
        timestamp: epoch(e, time)?,
        x: p.raw_x_coordinate.get(),
        y: p.raw_y_coordinate.get(),
        z: p.raw_altitude.get(),
    })
}

#[repr(C, packed)]
#[derive(FromBytes, KnownLayout, Immutable)]
struct RawMultibeamEntry {
    id: I32,
    intensity: F64,
    quality: I32,
    two_way_travel_time: F64,
    delta_time: F64,
    beam_angle: F64,
    tilt_angle: F64,
    _reserved: [u8; 16],
}

const _: () = assert!(size_of::<RawMultibeamEntry>() == MULTIBEAM_ENTRY_SIZE);

fn multibeam(
    h: &PacketHeader,
    r: &[u8],
    e: &impl EpochBuilder,
) -> Result<(PingHeader, Vec<Ping>), PayloadError> {
    let count = usize::from(h.channels_to_follow);

    let (raw, rest) = read::<RawPingHeader>(r)?;

    let (entries, _) = <[RawMultibeamEntry]>::ref_from_prefix_with_elems(rest, count).map_err(
        |_| PayloadError::Short {
            expected: PING_HEADER_SIZE + count * MULTIBEAM_ENTRY_SIZE,
            found: r.len(),
        },
    )?;

    let header = PingHeader::from_raw(&raw, e);
    let base = header.timestamp.ok_or(PayloadError::Timestamp)?;

    let pings = entries
        .iter()
        .map(|b| {
            // Offsets are whole microseconds, truncated toward zero.
            let delta = (b.delta_time.get() * 1_000_000.0) as i64;

            Ping {
                timestamp: base.saturating_add_signed(delta),
                beam_id: b.id.get(),
                across_track_angle: b.beam_angle.get(),
                along_track_angle: b.tilt_angle.get(),
                two_way_travel_time: b.two_way_travel_time.get(),
                quality: b.quality.get(),
                intensity: b.intensity.get(),
            }
        })
        .collect();

    Ok((header, pings))
}

#[repr(C, packed)]
#[derive(FromBytes)]
struct RawPingHeader {
    year: U16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    h_seconds: u8,
    julian_day: U16,
    event_number: U32,
    ping_number: U32,
    sound_velocity: F32,
    ocean_tide: F32,
    _reserved2: U32,
    conductivity_freq: F32,
    temperature_freq: F32,
    pressure_freq: F32,
    pressure_temp: F32,
    conductivity: F32,
    water_temperature: F32,
    pressure: F32,
    computed_sound_velocity: F32,
    mag_x: F32,
    mag_y: F32,
    mag_z: F32,
    aux_val: [F32; 6],
    speed_log: F32,
    turbidity: F32,
    ship_speed: F32,
    ship_gyro: F32,
    ship_y_coordinate: F64,
    ship_x_coordinate: F64,
    ship_altitude: U16,
    ship_depth: U16,
    fix_time: [u8; 4],
    sensor_speed: F32,
    kp: F32,
    sensor_y_coordinate: F64,
    sensor_x_coordinate: F64,
    sonar_status: U16,
    range_to_fish: U16,
    bearing_to_fish: U16,
    cable_out: U16,
    layback: F32,
    cable_tension: F32,
    sensor_depth: F32,
    sensor_primary_altitude: F32,
    sensor_aux_altitude: F32,
    sensor_pitch: F32,
    sensor_roll: F32,
    sensor_heading: F32,
    heave: F32,
    yaw: F32,
    attitude_time_tag: U32,
    dot: F32,
    nav_fix_milliseconds: U32,
    computer_clock: [u8; 4],
    fish_position_delta_x: I16,
    fish_position_delta_y: I16,
    fish_position_error_code: u8,
    optional_offset: U32,
    cable_out_hundredths: u8,
    _reserved_space: [u8; 6],
}

const _: () = assert!(size_of::<RawPingHeader>() == PING_HEADER_SIZE);

/// Navigation and sensor state at the time of a ping.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PingHeader {
    /// Time of the ping, if representable.
    pub timestamp: Option<u64>,
    pub event_number: u32,
    pub ping_number: u32,
    /// Sound velocity in metres per second.
    pub sound_velocity: f32,
    pub ocean_tide: f32,
    pub ship_x: f64,
    pub ship_y: f64,
    pub ship_speed: f32,
    pub ship_gyro: f32,
    pub sensor_x: f64,
    pub sensor_y: f64,
    pub sensor_depth: f32,
    pub sensor_primary_altitude: f32,
    pub sensor_heading: f32,
    pub sensor_pitch: f32,
    pub sensor_roll: f32,
    pub heave: f32,
}

impl PingHeader {
    fn from_raw(p: &RawPingHeader, e: &impl EpochBuilder) -> Self {
        let time = CivilTime::from_record(
            p.year.get(),
            p.month,
            [p.day, p.hour, p.minute, p.second],
            u32::from(p.h_seconds) * 10,
            1000,
        );

        Self {
            timestamp: time.and_then(|t| e.epoch_micros(&t)),
            event_number: p.event_number.get(),
            ping_number: p.ping_number.get(),
            sound_velocity: p.sound_velocity.get(),
            ocean_tide: p.ocean_tide.get(),
            ship_x: p.ship_x_coordinate.get(),
            ship_y: p.ship_y_coordinate.get(),
            ship_speed: p.ship_speed.get(),
            ship_gyro: p.ship_gyro.get(),
            sensor_x: p.sensor_x_coordinate.get(),
            sensor_y: p.sensor_y_coordinate.get(),
            sensor_depth: p.sensor_depth.get(),
            sensor_primary_altitude: p.sensor_primary_altitude.get(),
            sensor_heading: p.sensor_heading.get(),
            sensor_pitch: p.sensor_pitch.get(),
            sensor_roll: p.sensor_roll.get(),
            heave: p.heave.get(),
        }
    }
}

/// Read a fixed layout from the front of a payload.
fn read<T: FromBytes>(r: &[u8]) -> Result<(T, &[u8]), PayloadError> {
    T::read_from_prefix(r).map_err(|_| PayloadError::Short {
        expected: size_of::<T>(),
        found: r.len(),
    })
}

fn epoch(e: &impl EpochBuilder, t: Option<CivilTime>) -> Result<u64, PayloadError> {
    t.and_then(|t| e.epoch_micros(&t))
        .ok_or(PayloadError::Timestamp)
}
