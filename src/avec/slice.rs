//! Slice-based decoder implementation.

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

/// Errors occurring while decoding from a slice.
#[derive(Debug, Error)]
pub enum Error {
    /// Unexpectedly reached the end of the slice.
    #[error("Unexpectedly reached the end of the slice.")]
    EndOfSlice,
    /// Incorrect file header.
    #[error("Incorrect file header: {0}")]
    Header(#[from] DocumentError),
    /// Incorrect record header. Record boundaries are lost.
    #[error("Incorrect record header: {0}")]
    Record(#[from] RecordHeaderError),
    /// The slice ended inside the table of channel descriptors.
    #[error("Channel descriptor group truncated ({found} of {expected} bytes).")]
    TruncatedChannelTable { expected: usize, found: usize },
}

/// Decode a document from a slice, publishing to a receiver.
///
/// Timestamps are interpreted as UTC. Returns the file header once the slice
/// is exhausted.
///
/// This method is also re-exported as `leadline::avec::decode_slice`.
pub fn decode(r: &[u8], o: &mut impl FromSamples) -> Result<FileHeader, Error> {
    decode_with(r, o, &Utc)
}

/// Decode a document from a slice, converting timestamps with an epoch
/// builder.
pub fn decode_with(
    r: &[u8],
    o: &mut impl FromSamples,
    e: &impl EpochBuilder,
) -> Result<FileHeader, Error> {
    let i = &mut 0; // Offset of the next unread byte.

    let file_header = take::<FILE_HEADER_SIZE>(r, i).ok_or(Error::EndOfSlice)?;
    let (header, successor) = Decoder::advance(file_header)?;

    publish_file_header(&header, o);

    let mut record_header = match successor {
        Left(mut state) => loop {
            let group = take::<CHANNEL_GROUP_SIZE>(r, i).ok_or(Error::TruncatedChannelTable {
                expected: CHANNEL_GROUP_SIZE,
                found: r.len() - *i,
            })?;

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

    while *i < r.len() {
        let Some(packet_header) = take::<PACKET_HEADER_SIZE>(r, i) else {
            report(
                o,
                Issue::TruncatedRecord {
                    expected: PACKET_HEADER_SIZE,
                    found: r.len() - *i,
                },
            );
            break;
        };

        let (h, payload) = record_header.advance(packet_header)?;

        o.add_record_type(h.header_type);

        let Some(bytes) = r.get(*i..).and_then(|r| r.get(..payload.size())) else {
            report(
                o,
                Issue::TruncatedRecord {
                    expected: h.length as usize,
                    found: PACKET_HEADER_SIZE + r.len() - *i,
                },
            );
            break;
        };

        *i += bytes.len();

        let (decoded, successor) = payload.advance(bytes, e);

        publish(&h, decoded, o);

        record_header = successor;
    }

    Ok(header)
}

/// Take an exact number of bytes from an offset in a slice, advancing the
/// offset only if enough bytes remain.
fn take<const N: usize>(r: &[u8], i: &mut usize) -> Option<[u8; N]> {
    let bytes = *r.get(*i..)?.first_chunk::<N>()?;
    *i += N;

    Some(bytes)
}
