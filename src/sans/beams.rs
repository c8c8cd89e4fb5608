//! Accumulation of beams assembled from several sections.

use alloc::vec::Vec;

use super::sample::Ping;

/// Fields of one beam, each populated once the section owning it arrives.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct BeamSample {
    pub across_track_angle: Option<f64>,
    /// Not populated by any section currently decoded.
    pub along_track_angle: Option<f64>,
    pub two_way_travel_time: Option<f64>,
    pub quality: Option<i32>,
    pub intensity: Option<f64>,
}

/// In-progress beams of a single ping, indexed by beam number.
#[derive(Debug, Default)]
pub struct Beams {
    timestamp: u64,
    samples: Vec<BeamSample>,
}

impl Beams {
    /// Discard all beams, then allocate `count` empty beams for a ping at
    /// `timestamp`.
    pub fn reset(&mut self, count: usize, timestamp: u64) {
        self.timestamp = timestamp;
        self.samples.clear();
        self.samples.resize(count, BeamSample::default());
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate over beams in ascending order.
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, BeamSample> {
        self.samples.iter_mut()
    }

    /// Complete all beams in ascending order.
    ///
    /// Fields never populated are published as zero.
    pub fn into_pings(self) -> impl Iterator<Item = Ping> {
        let timestamp = self.timestamp;

        self.samples.into_iter().enumerate().map(move |(i, b)| Ping {
            timestamp,
            beam_id: i as i32,
            across_track_angle: b.across_track_angle.unwrap_or_default(),
            along_track_angle: b.along_track_angle.unwrap_or_default(),
            two_way_travel_time: b.two_way_travel_time.unwrap_or_default(),
            quality: b.quality.unwrap_or_default(),
            intensity: b.intensity.unwrap_or_default(),
        })
    }
}
