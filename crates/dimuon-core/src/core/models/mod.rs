//! # Core Models Module
//!
//! This module contains the fundamental data structures used to describe
//! collision events and the statistics accumulated from them.
//!
//! ## Overview
//!
//! The models are plain, immutable-by-convention values rebuilt for every
//! event by the data source. They carry no selection logic; the engine layer
//! interprets them.
//!
//! ## Key Components
//!
//! - [`kinematics`] - Four-momentum arithmetic and derived observables
//! - [`particle`] - Reconstructed muon candidates with identification and isolation data
//! - [`event`] - Per-event snapshot: particles, generator weight, pileup and trigger decisions
//! - [`histogram`] - Weighted fixed-binning histograms and named histogram sets
//!
//! ## Usage
//!
//! ```ignore
//! use dimuon::core::models::particle::Particle;
//!
//! let mu = Particle { pt: 45.0, eta: 0.3, phi: 1.2, charge: -1, ..Default::default() };
//! let p4 = mu.p4();
//! assert!((p4.pt() - 45.0).abs() < 1e-9);
//! ```

pub mod event;
pub mod histogram;
pub mod kinematics;
pub mod particle;
