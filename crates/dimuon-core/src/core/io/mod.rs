//! Provides input/output functionality for the analysis collaborators.
//!
//! This module contains the file codecs that feed the selection engine and
//! persist its results: a streaming reader for flat per-muon event CSV files,
//! a reader for pileup reference profiles, and a CSV writer for histogram
//! sets. All codecs report failures through their own error enums and leave
//! interpretation of the data to the engine.

pub mod events;
pub mod histograms;
pub mod pileup;
