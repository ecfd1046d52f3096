//! # Dimuon Core Library
//!
//! Event selection, dimuon pairing and weighting for cutflow studies of collision and
//! simulated samples.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that the physics logic stays
//! independent of where events come from and where histograms go.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Particle`, `Event`,
//!   `LorentzVector`, `Histogram`) and the CSV codecs for events, pileup profiles and
//!   histogram output.
//!
//! - **[`engine`]: The Logic Core.** Validated configuration, candidate filtering,
//!   leading/subleading pair selection, the trigger gate, the pileup reweighting table,
//!   the weight cascade and the ordered cutflow stages.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into one
//!   analysis job over an event stream, returning filled histograms and a run summary.

pub mod core;
pub mod engine;
pub mod workflows;
