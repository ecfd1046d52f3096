//! # Engine Module
//!
//! This module implements the selection, pairing and weighting logic that turns one
//! collision event into a set of weighted cutflow observations.
//!
//! ## Overview
//!
//! Every event that passes the trigger requirement is run through an ordered list of
//! cutflow stages. Each stage filters the event's muons with a fixed set of cuts, tries to
//! form an opposite-charge dimuon pair, and, if it succeeds, records the event with its
//! combined weight. The weight itself is a product of the generator weight, a per-sample
//! normalization and a pileup reweighting factor taken from a precomputed table.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated selection thresholds, trigger lists and sample properties
//! - **Candidate Filtering** ([`selection`]) - Independently toggleable per-muon cuts
//! - **Pair Selection** ([`pairing`]) - Leading / opposite-charge subleading choice and mass window
//! - **Trigger Gate** ([`trigger`]) - Sample-specific trigger OR over per-event decisions
//! - **Pileup Reweighting** ([`pileup`]) - Ratio table between observed and simulated pileup
//! - **Weight Cascade** ([`weights`]) - Generator, NNLO sign, normalization and pileup factors
//! - **Cutflow** ([`cutflow`]) - Ordered stages, observable binnings and the histogram sink seam
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-level error type
//!
//! ## Key Capabilities
//!
//! - **Deterministic pairing** with a fixed pt ordering and index tie-break
//! - **Degenerate events as values**, never as errors: every failed pairing is a [`pairing::PairOutcome`]
//! - **Explicit out-of-range handling** for pileup lookups, which are rejected rather than clamped
//! - **Shareable read-only state**: criteria, trigger lists and the pileup table are immutable once built

pub mod config;
pub mod cutflow;
pub mod error;
pub mod pairing;
pub mod pileup;
pub mod progress;
pub mod selection;
pub mod trigger;
pub mod weights;
