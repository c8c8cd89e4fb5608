#![no_std]

//! A streaming decoder for eXtended Triton Format (XTF) hydrographic survey
//! records.
//!
//! Leadline walks a stream of length-prefixed XTF records and publishes the
//! attitude, position, and per-beam ping samples they carry. This includes the
//! big-endian R2Sonic bathymetry packets embedded by QINSy, whose beams are
//! assembled from several independently ordered sections.
//!
//! Most users should begin with the functions and the [`avec::FromSamples`]
//! trait in the [`avec`] module. If these prove insufficient, consider driving
//! the state tokens described in the [`sans`] module directly.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable reader-based decoder (default).

extern crate alloc;

pub mod avec;
pub mod sans;
