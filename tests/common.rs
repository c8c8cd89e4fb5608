#![cfg(feature = "std")]

use std::path::Path;

use csv::ReaderBuilder;
use leadline::{
    avec::{FromSamples, Issue},
    sans::{
        channel::ChannelInfo,
        header::FileHeader,
        sample::{Attitude, Ping, Position},
    },
};

#[test]
fn decode_slice_survey() {
    const PATH: &str = "fixtures/survey.xtf";
    let data = std::fs::read(PATH).unwrap();
    let mut validator = Validator::new(PATH);
    let header = leadline::avec::decode_slice(&data, &mut validator).unwrap();
    validator.finish(&header);
}

#[test]
fn decode_reader_survey() {
    const PATH: &str = "fixtures/survey.xtf";
    let mut file = std::fs::File::open(PATH).unwrap();
    let mut validator = Validator::new(PATH);
    let header = leadline::avec::decode_reader(&mut file, &mut validator).unwrap();
    validator.finish(&header);
}

struct Validator(Vec<Vec<String>>);

impl Validator {
    fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().with_extension("csv");

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_path(path)
            .unwrap();

        let expected: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
            .collect();

        Self(expected)
    }

    fn validate(&mut self, found: &[String]) {
        assert!(!self.0.is_empty(), "unexpected {found:?}");
        assert_eq!(self.0.remove(0), found);
    }

    fn finish(self, header: &FileHeader) {
        assert!(self.0.is_empty(), "missing {:?}", self.0);

        assert_eq!(header.total_channels(), 7);
        assert_eq!(header.sonar_name(), Some("R2Sonic 2024"));
        assert_eq!(header.note(), Some("Harbour survey line"));
        assert_eq!(header.file_name(), Some("line-0012.xtf"));
        assert_eq!(header.recording_program_version(), Some("9.12"));
    }
}

impl FromSamples for Validator {
    fn add_channel(&mut self, channel: &ChannelInfo) {
        self.validate(&["channel".into(), channel.sub_channel.to_string()]);
    }
    fn add_record_type(&mut self, tag: u8) {
        self.validate(&["record".into(), tag.to_string()]);
    }
    fn add_swath_start(&mut self, sound_velocity: f32) {
        self.validate(&["swath".into(), sound_velocity.to_string()]);
    }
    fn add_attitude(&mut self, a: Attitude) {
        self.validate(&[
            "attitude".into(),
            a.timestamp.to_string(),
            a.heading.to_string(),
            a.pitch.to_string(),
            a.roll.to_string(),
        ]);
    }
    fn add_position(&mut self, p: Position) {
        self.validate(&[
            "position".into(),
            p.timestamp.to_string(),
            p.x.to_string(),
            p.y.to_string(),
            p.z.to_string(),
        ]);
    }
    fn add_ping(&mut self, p: Ping) {
        self.validate(&[
            "ping".into(),
            p.timestamp.to_string(),
            p.beam_id.to_string(),
            p.across_track_angle.to_string(),
            p.along_track_angle.to_string(),
            p.two_way_travel_time.to_string(),
            p.quality.to_string(),
            p.intensity.to_string(),
        ]);
    }
    fn add_issue(&mut self, issue: &Issue) {
        self.validate(&["issue".into(), issue.to_string()]);
    }
}
