//! Reader-based decoder implementation.
//!
//! _Requires Cargo feature `std`._

use std::{
    io::{ErrorKind, Read},
    vec::Vec,
};

use either::Either::{Left, Right};
use thiserror::Error;

use crate::sans::{
    Decoder,
    channel::CHANNEL_GROUP_SIZE,
    header::{
        DocumentError, FILE_HEADER_SIZE, FileHeader, PACKET_HEADER_SIZE, RecordHeaderError,
    },
    time::{EpochBuilder, Utc},
};

use super::{FromSamples, Issue, publish, publish_channel, publish_file_header, report};

extern crate std;

/// Errors occurring while decoding from a reader.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the supplied reader.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] DocumentError),
    /// Incorrect record header. Record boundaries are lost.
    #[error("Incorrect record header: {0}")]
    Record(#[from] RecordHeaderError),
    /// The document ended inside the table of channel descriptors.
    #[error("Channel descriptor group truncated ({found} of {expected} bytes).")]
    TruncatedChannelTable { expected: usize, found: usize },
}

/// Decode a document from a reader, publishing to a receiver.
///
/// Timestamps are interpreted as UTC. Returns the file header once the reader
/// is exhausted.
///
/// This method is also re-exported as `leadline::avec::decode_reader`.
///
/// _Requires Cargo feature `std`._
pub fn decode(r: &mut impl Read, o: &mut impl FromSamples) -> Result<FileHeader, Error> {
    decode_with(r, o, &Utc)
}

/// Decode a document from a reader, converting timestamps with an epoch
/// builder.
///
/// _Requires Cargo feature `std`._
pub fn decode_with(
    r: &mut impl Read,
    o: &mut impl FromSamples,
    e: &impl EpochBuilder,
) -> Result<FileHeader, Error> {
    let mut file_header = [0; FILE_HEADER_SIZE];
    r.read_exact(&mut file_header)?;

    let (header, successor) = Decoder::advance(file_header)?;

    publish_file_header(&header, o);

    let mut record_header = match successor {
        Left(mut state) => loop {
            let mut group = [0; CHANNEL_GROUP_SIZE];
            let found = fill(r, &mut group)?;

            if found != CHANNEL_GROUP_SIZE {
                Err(Error::TruncatedChannelTable {
                    expected: CHANNEL_GROUP_SIZE,
                    found,
                })?;
            }

            let (channels, successor) = state.advance(group);

            for c in channels {
                publish_channel(&c, o);
            }

            state = match successor {
                Left(state) => state,
                Right(state) => break state,
            };
        },
        Right(state) => state,
    };

    // Payload buffer, reused between records.
    let mut buf = Vec::new();

    loop {
        let mut packet_header = [0; PACKET_HEADER_SIZE];

        match fill(r, &mut packet_header)? {
            0 => break,
            PACKET_HEADER_SIZE => {}
            found => {
                report(
                    o,
                    Issue::TruncatedRecord {
                        expected: PACKET_HEADER_SIZE,
                        found,
                    },
                );
                break;
            }
        }

        let (h, payload) = record_header.advance(packet_header)?;

        o.add_record_type(h.header_type);

        buf.clear();
        (&mut *r).take(payload.size() as u64).read_to_end(&mut buf)?;

        if buf.len() != payload.size() {
            report(
                o,
                Issue::TruncatedRecord {
                    expected: h.length as usize,
                    found: PACKET_HEADER_SIZE + buf.len(),
                },
            );
            break;
        }

        let (decoded, successor) = payload.advance(&buf, e);

        publish(&h, decoded, o);

        record_header = successor;
    }

    Ok(header)
}

/// Read until a buffer is full or the reader is exhausted, returning the
/// number of bytes read.
fn fill(r: &mut impl Read, buf: &mut [u8]) -> Result<usize, Error> {
    let mut n = 0;

    while n < buf.len() {
        match r.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n += k,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => Err(err)?,
        }
    }

    Ok(n)
}
