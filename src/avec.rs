//! Convenience interfaces for common decoding patterns.
//!
//! The functions in this module are suited to decoding documents from files
//! and data slices, publishing to the [`FromSamples`] trait.
//!
//! Structural failures, such as a bad file format or record marker, end
//! decoding and are returned as errors. Anomalies in the content of a single
//! record are published as an [`Issue`] and decoding continues.

#[cfg(feature = "std")]
pub mod reader;
pub mod slice;

#[cfg(feature = "std")]
pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

use alloc::vec::Vec;

use log::{debug, trace, warn};
use thiserror::Error;

use crate::sans::{
    channel::ChannelInfo,
    header::{FileHeader, PacketHeader},
    r2sonic::{MalformedPacket, Tag},
    record::{self, Decoded, PayloadError},
    sample::{Attitude, Ping, Position, Sample},
};

/// Receive samples decoded from a document.
///
/// Samples are published in document order. The default implementation of
/// each method ignores received values.
#[allow(unused_variables)]
pub trait FromSamples {
    /// Add the file header of the document.
    fn add_file_header(&mut self, header: &FileHeader) {}
    /// Add a channel descriptor, in table order.
    fn add_channel(&mut self, channel: &ChannelInfo) {}
    /// Add the type tag of a record, whether or not it is decoded.
    fn add_record_type(&mut self, tag: u8) {}
    /// Add the start of a swath, ahead of its beams.
    fn add_swath_start(&mut self, sound_velocity: f32) {}

    fn add_attitude(&mut self, attitude: Attitude) {}
    fn add_position(&mut self, position: Position) {}
    fn add_ping(&mut self, ping: Ping) {}

    /// Add an anomaly that was recovered from.
    fn add_issue(&mut self, issue: &Issue) {}
}

impl FromSamples for Vec<Sample> {
    fn add_attitude(&mut self, attitude: Attitude) {
        self.push(Sample::Attitude(attitude));
    }
    fn add_position(&mut self, position: Position) {
        self.push(Sample::Position(position));
    }
    fn add_ping(&mut self, ping: Ping) {
        self.push(Sample::Ping(ping));
    }
}

/// An anomaly skipped over while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Issue {
    /// A record type not decoded by this crate.
    #[error("Skipped record of type {0} ({name}).", name = record_name(.0))]
    UnknownRecord(u8),
    /// A bathymetry section not decoded by this crate.
    #[error("Skipped unknown bathymetry section ({0}).")]
    UnknownSection(Tag),
    /// A record whose payload could not be decoded.
    #[error("Dropped record of type {record_type}: {error}")]
    Payload {
        record_type: u8,
        error: PayloadError,
    },
    /// A bathymetry packet whose beams could not be assembled.
    #[error("Dropped bathymetry packet: {0}")]
    Malformed(MalformedPacket),
    /// A record cut short by the end of the document. Decoding stops here.
    #[error("Record truncated ({found} of {expected} bytes).")]
    TruncatedRecord { expected: usize, found: usize },
}

fn record_name(tag: &u8) -> &'static str {
    record::name(*tag).unwrap_or("undocumented")
}

fn report(o: &mut impl FromSamples, issue: Issue) {
    warn!("{issue}");
    o.add_issue(&issue);
}

fn publish_file_header(h: &FileHeader, o: &mut impl FromSamples) {
    debug!(
        "File header: sonar {:?}, {} channels.",
        h.sonar_name().unwrap_or_default(),
        h.total_channels()
    );

    o.add_file_header(h);

    for c in h.channels() {
        publish_channel(c, o);
    }
}

fn publish_channel(c: &ChannelInfo, o: &mut impl FromSamples) {
    debug!(
        "Channel {}: {:?}, type {}.",
        c.sub_channel,
        c.name().unwrap_or_default(),
        c.type_of_channel
    );

    o.add_channel(c);
}

/// Publish the content of a record.
fn publish(h: &PacketHeader, decoded: Result<Decoded, PayloadError>, o: &mut impl FromSamples) {
    trace!("Record of type {} ({} bytes).", h.header_type, h.length);

    match decoded {
        Ok(Decoded::Attitude(a)) => o.add_attitude(a),
        Ok(Decoded::Position(p)) => o.add_position(p),
        Ok(Decoded::Multibeam { header, pings }) => {
            o.add_swath_start(header.sound_velocity);

            for p in pings {
                o.add_ping(p);
            }
        }
        Ok(Decoded::Bathymetry { header, swath }) => {
            o.add_swath_start(header.sound_velocity);

            for tag in swath.unknown_sections {
                report(o, Issue::UnknownSection(tag));
            }

            match swath.pings {
                Ok(pings) => {
                    for p in pings {
                        o.add_ping(p);
                    }
                }
                Err(err) => report(o, Issue::Malformed(err)),
            }
        }
        Ok(Decoded::Unknown(tag)) => report(o, Issue::UnknownRecord(tag)),
        Err(error) => report(
            o,
            Issue::Payload {
                record_type: h.header_type,
                error,
            },
        ),
    }
}
