//! # Core Module
//!
//! This module provides the stateless building blocks of the dimuon analysis:
//! the event and histogram data models and the file codecs that move them in
//! and out of the process.
//!
//! ## Architecture
//!
//! - **Event Representation** ([`models`]) - Particles, four-momenta, events and histograms
//! - **File I/O** ([`io`]) - Event CSV reader, pileup profile reader, histogram writer
//!
//! Nothing in this module knows about selection criteria or weights; those
//! live in the [`engine`](crate::engine) layer.

pub mod io;
pub mod models;
