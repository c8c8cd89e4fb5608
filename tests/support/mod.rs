//! Builders for synthetic documents, and receivers recording what decoders
//! publish.

#![allow(dead_code)]

use std::cell::RefCell;

use leadline::{
    avec::{FromSamples, Issue},
    sans::{
        channel::ChannelInfo,
        header::FileHeader,
        sample::{Attitude, Ping, Position},
        time::{CivilTime, EpochBuilder},
    },
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Channel counts stored in a file header.
#[derive(Debug, Default, Clone, Copy)]
pub struct Counts {
    pub sonar: u16,
    pub bathymetry: u16,
    pub snippet: u8,
    pub forward_look: u8,
    pub echo_strength: u16,
    pub interferometry: u8,
}

impl Counts {
    pub fn bathymetry(n: u16) -> Self {
        Self {
            bathymetry: n,
            ..Default::default()
        }
    }

    pub fn total(&self) -> usize {
        usize::from(self.sonar)
            + usize::from(self.bathymetry)
            + usize::from(self.snippet)
            + usize::from(self.echo_strength)
            + usize::from(self.interferometry)
    }
}

/// A 1024-byte file header. Embedded channels are numbered from zero.
pub fn file_header(c: Counts) -> Vec<u8> {
    let mut r = vec![0; 1024];

    r[0] = 123;
    r[2..9].copy_from_slice(b"Survey1");
    r[18..25].copy_from_slice(b"R2S2026");
    r[166..168].copy_from_slice(&c.sonar.to_le_bytes());
    r[168..170].copy_from_slice(&c.bathymetry.to_le_bytes());
    r[170] = c.snippet;
    r[171] = c.forward_look;
    r[172..174].copy_from_slice(&c.echo_strength.to_le_bytes());
    r[174] = c.interferometry;

    for i in 0..c.total().min(6) {
        let o = 256 + i * 128;
        r[o..o + 128].copy_from_slice(&channel(i as u8));
    }

    r
}

/// A 128-byte channel descriptor.
pub fn channel(sub_channel: u8) -> [u8; 128] {
    let mut r = [0; 128];

    r[0] = 3;
    r[1] = sub_channel;
    r[6..8].copy_from_slice(&2u16.to_le_bytes());

    let name = format!("Beam{sub_channel}");
    r[12..12 + name.len()].copy_from_slice(name.as_bytes());

    r
}

/// Overflow groups holding channels numbered from six, padded to whole groups.
pub fn channel_groups(remaining: usize) -> Vec<u8> {
    let mut r = Vec::new();

    for i in 0..remaining.div_ceil(8) * 8 {
        if i < remaining {
            r.extend_from_slice(&channel((6 + i) as u8));
        } else {
            r.extend_from_slice(&[0xEE; 128]);
        }
    }

    r
}

/// A record with a 14-byte header.
pub fn record(header_type: u8, channels_to_follow: u16, payload: &[u8]) -> Vec<u8> {
    let mut r = Vec::with_capacity(14 + payload.len());

    r.extend_from_slice(&0xFACEu16.to_le_bytes());
    r.push(header_type);
    r.push(0);
    r.extend_from_slice(&channels_to_follow.to_le_bytes());
    r.extend_from_slice(&[0; 4]);
    r.extend_from_slice(&(14 + payload.len() as u32).to_le_bytes());
    r.extend_from_slice(payload);

    r
}

/// Date and time as stored in records, with a one-based month.
#[derive(Debug, Clone, Copy)]
pub struct Stamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Stamp {
    /// 2024-03-15 12:30:45.
    pub const SURVEY: Self = Self {
        year: 2024,
        month: 3,
        day: 15,
        hour: 12,
        minute: 30,
        second: 45,
    };

    fn write(&self, r: &mut [u8]) {
        r[0..2].copy_from_slice(&self.year.to_le_bytes());
        r[2] = self.month;
        r[3] = self.day;
        r[4] = self.hour;
        r[5] = self.minute;
        r[6] = self.second;
    }

    /// Microseconds since the Unix epoch of the whole second.
    pub fn micros(&self) -> u64 {
        chrono::NaiveDate::from_ymd_opt(self.year.into(), self.month.into(), self.day.into())
            .unwrap()
            .and_hms_opt(self.hour.into(), self.minute.into(), self.second.into())
            .unwrap()
            .and_utc()
            .timestamp_micros() as u64
    }
}

/// A 50-byte attitude payload.
pub fn attitude(t: Stamp, milliseconds: u16, pitch: f32, roll: f32, heading: f32) -> Vec<u8> {
    let mut r = vec![0; 50];

    r[16..20].copy_from_slice(&pitch.to_le_bytes());
    r[20..24].copy_from_slice(&roll.to_le_bytes());
    r[36..40].copy_from_slice(&heading.to_le_bytes());
    t.write(&mut r[40..47]);
    r[47..49].copy_from_slice(&milliseconds.to_le_bytes());

    r
}

/// A 50-byte position payload, with tenths of milliseconds.
pub fn position(t: Stamp, tenths: u16, [x, y, z]: [f64; 3]) -> Vec<u8> {
    let mut r = vec![0; 50];

    t.write(&mut r[0..7]);
    r[7..9].copy_from_slice(&tenths.to_le_bytes());
    r[9..17].copy_from_slice(&y.to_le_bytes());
    r[17..25].copy_from_slice(&x.to_le_bytes());
    r[25..33].copy_from_slice(&z.to_le_bytes());

    r
}

/// A 50-byte navigation payload, with microseconds.
pub fn navigation(t: Stamp, microseconds: u32, [x, y, z]: [f64; 3]) -> Vec<u8> {
    let mut r = vec![0; 50];

    t.write(&mut r[0..7]);
    r[7..11].copy_from_slice(&microseconds.to_le_bytes());
    r[19..27].copy_from_slice(&y.to_le_bytes());
    r[27..35].copy_from_slice(&x.to_le_bytes());
    r[35..43].copy_from_slice(&z.to_le_bytes());

    r
}

/// A 242-byte ping header, with hundredths of seconds.
pub fn ping_header(t: Stamp, hundredths: u8, sound_velocity: f32) -> Vec<u8> {
    let mut r = vec![0; 242];

    t.write(&mut r[0..7]);
    r[7] = hundredths;
    r[14..18].copy_from_slice(&7u32.to_le_bytes());
    r[18..22].copy_from_slice(&sound_velocity.to_le_bytes());

    r
}

/// A 64-byte multibeam entry.
pub fn multibeam_entry(id: i32, delta_time: f64, angle: f64, travel_time: f64) -> [u8; 64] {
    let mut r = [0; 64];

    r[0..4].copy_from_slice(&id.to_le_bytes());
    r[4..12].copy_from_slice(&(id as f64 * 2.0).to_le_bytes());
    r[12..16].copy_from_slice(&(id * 10).to_le_bytes());
    r[16..24].copy_from_slice(&travel_time.to_le_bytes());
    r[24..32].copy_from_slice(&delta_time.to_le_bytes());
    r[32..40].copy_from_slice(&angle.to_le_bytes());
    r[40..48].copy_from_slice(&(-angle).to_le_bytes());

    r
}

/// A big-endian bathymetry packet holding sections.
pub fn bth0(sections: &[Vec<u8>]) -> Vec<u8> {
    packet(b"BTH0", sections)
}

pub fn packet(name: &[u8; 4], sections: &[Vec<u8>]) -> Vec<u8> {
    let body = sections.concat();

    let mut r = Vec::new();
    r.extend_from_slice(name);
    r.extend_from_slice(&(12 + body.len() as u32).to_be_bytes());
    r.extend_from_slice(&1u32.to_be_bytes());
    r.extend_from_slice(&body);

    r
}

/// A bathymetry packet section, sized to include its own header.
pub fn section(tag: &[u8; 2], body: &[u8]) -> Vec<u8> {
    let mut r = Vec::new();
    r.extend_from_slice(tag);
    r.extend_from_slice(&(4 + body.len() as u16).to_be_bytes());
    r.extend_from_slice(body);

    r
}

pub fn h0(seconds: u32, nanoseconds: u32, points: u16) -> Vec<u8> {
    let mut r = vec![0; 112];

    r[0..6].copy_from_slice(b"2026SS");
    r[24..28].copy_from_slice(&seconds.to_be_bytes());
    r[28..32].copy_from_slice(&nanoseconds.to_be_bytes());
    r[40..44].copy_from_slice(&1500f32.to_be_bytes());
    r[110..112].copy_from_slice(&points.to_be_bytes());

    section(b"H0", &r)
}

pub fn a0(first: f32, last: f32) -> Vec<u8> {
    let mut r = vec![0; 32];

    r[0..4].copy_from_slice(&first.to_be_bytes());
    r[4..8].copy_from_slice(&last.to_be_bytes());

    section(b"A0", &r)
}

pub fn a2(first: f32, scale: f32, steps: &[u16]) -> Vec<u8> {
    let mut r = vec![0; 32];

    r[0..4].copy_from_slice(&first.to_be_bytes());
    r[4..8].copy_from_slice(&scale.to_be_bytes());
    r.extend(steps.iter().flat_map(|s| s.to_be_bytes()));

    section(b"A2", &r)
}

/// A section holding a scaling factor and one word per beam.
pub fn scaled(tag: &[u8; 2], scale: f32, words: &[u16]) -> Vec<u8> {
    let mut r = scale.to_be_bytes().to_vec();
    r.extend(words.iter().flat_map(|w| w.to_be_bytes()));

    section(tag, &r)
}

/// Something published by a decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    FileHeader,
    Channel(u8),
    RecordType(u8),
    SwathStart(f32),
    Attitude(Attitude),
    Position(Position),
    Ping(Ping),
    Issue(Issue),
}

/// A receiver recording everything published, in order.
#[derive(Debug, Default)]
pub struct Recorder(pub Vec<Event>);

impl Recorder {
    pub fn channels(&self) -> Vec<u8> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Event::Channel(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn record_types(&self) -> Vec<u8> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Event::RecordType(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn attitudes(&self) -> Vec<Attitude> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Event::Attitude(a) => Some(*a),
                _ => None,
            })
            .collect()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Event::Position(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn pings(&self) -> Vec<Ping> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Event::Ping(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Event::Issue(i) => Some(i.clone()),
                _ => None,
            })
            .collect()
    }
}

impl FromSamples for Recorder {
    fn add_file_header(&mut self, _: &FileHeader) {
        self.0.push(Event::FileHeader);
    }
    fn add_channel(&mut self, channel: &ChannelInfo) {
        self.0.push(Event::Channel(channel.sub_channel));
    }
    fn add_record_type(&mut self, tag: u8) {
        self.0.push(Event::RecordType(tag));
    }
    fn add_swath_start(&mut self, sound_velocity: f32) {
        self.0.push(Event::SwathStart(sound_velocity));
    }
    fn add_attitude(&mut self, attitude: Attitude) {
        self.0.push(Event::Attitude(attitude));
    }
    fn add_position(&mut self, position: Position) {
        self.0.push(Event::Position(position));
    }
    fn add_ping(&mut self, ping: Ping) {
        self.0.push(Event::Ping(ping));
    }
    fn add_issue(&mut self, issue: &Issue) {
        self.0.push(Event::Issue(issue.clone()));
    }
}

/// An epoch builder recording every timestamp passed to it, and answering
/// with a count of calls.
#[derive(Debug, Default)]
pub struct Clock(pub RefCell<Vec<CivilTime>>);

impl EpochBuilder for Clock {
    fn epoch_micros(&self, t: &CivilTime) -> Option<u64> {
        let mut calls = self.0.borrow_mut();
        calls.push(*t);
        Some(calls.len() as u64 * 1_000_000)
    }
}

/// A document with a file header, any overflow channel groups it needs, then
/// records.
pub fn document(counts: Counts, records: &[Vec<u8>]) -> Vec<u8> {
    [
        file_header(counts),
        channel_groups(counts.total().saturating_sub(6)),
        records.concat(),
    ]
    .concat()
}

/// A QINSy bathymetry record carrying a packet.
pub fn bathymetry_record(packet: Vec<u8>) -> Vec<u8> {
    record(65, 0, &[ping_header(Stamp::SURVEY, 0, 1480.0), packet].concat())
}
