//! Internal finite-state machine for implementing decoders.
//!
//! This module is intended for applications that need fine control over
//! decoder internals, such as reading from sources other than a slice or a
//! `std::io::Read`. See [`crate::avec`] for implementations covering common
//! decoding patterns.
//!
//! # Architecture
//!
//! Framing states are represented by non-copy tokens. Once enough bytes are
//! ready, transition to another state by calling the token's `advance` method.
//! This will return a successor state token, along with any extracted data.
//!
//! An XTF document is a 1024-byte file header, zero or more 1024-byte groups
//! of overflow channel descriptors, then a sequence of records. Each record is
//! a 14-byte header followed by a payload whose length the header declares.
//!
//! Only the initial state, re-exported for convenience as [`Decoder`], can be
//! constructed.
//!
//! Payloads are decoded in one step once all of their bytes are available.
//! QINSy R2Sonic bathymetry payloads additionally run through the section
//! machine in [`r2sonic`], which assembles beams in a [`beams::Beams`]
//! accumulator.
//!
//! Some areas of the decoding process are not represented in the
//! finite-state machine and must be carefully written:
//!
//! - Reading bytes from the correct place in the document, including buffering
//! as necessary.
//!
//! - Ending decoding once the document runs out. A record header cut short by
//! the end of the document is the normal end of a stream.
//!
//! Implementers are recommended to begin by studying and modifying a decoder
//! from the [`crate::avec`] module.

pub mod beams;
pub mod channel;
pub mod header;
pub mod r2sonic;
pub mod record;
pub mod sample;
pub mod time;

/// Entrypoint to the finite-state machine.
pub type Decoder = header::Document;
