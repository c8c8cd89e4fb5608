//! Samples extracted from records.
//!
//! All timestamps are microseconds since the epoch chosen by the
//! [`EpochBuilder`](super::time::EpochBuilder) in use, and all angles are in
//! degrees.

/// Vessel attitude.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Attitude {
    pub timestamp: u64,
    pub heading: f64,
    /// Pitch in `[0, 360)`.
    pub pitch: f64,
    /// Roll in `[0, 360)`.
    pub roll: f64,
}

/// Raw vessel position, in the coordinate system of the navigation source.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Position {
    pub timestamp: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A single beam of a multibeam ping.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Ping {
    pub timestamp: u64,
    pub beam_id: i32,
    pub across_track_angle: f64,
    pub along_track_angle: f64,
    /// Two-way travel time in seconds.
    pub two_way_travel_time: f64,
    pub quality: i32,
    pub intensity: f64,
}

/// Any sample extracted from a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Attitude(Attitude),
    Position(Position),
    Ping(Ping),
}

/// Map a raw angle into `[0, 360)`, given that it lies in `[-360, 360)`.
pub(crate) fn normalize_angle(raw: f32) -> f64 {
    let raw = f64::from(raw);

    if raw < 0.0 { raw + 360.0 } else { raw }
}
