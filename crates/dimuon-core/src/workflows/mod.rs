//! # Workflows Module
//!
//! This module provides the job-level entry point that drives the engine over a
//! stream of collision events.
//!
//! ## Overview
//!
//! A workflow owns everything that lives for the duration of one job: the trigger gate
//! resolved for the sample, the weight cascade bound to the pileup table, the cutflow
//! accumulator and the histogram set it fills. Callers supply a validated
//! [`AnalysisConfig`](crate::engine::config::AnalysisConfig), an optional pileup table and
//! any iterator of events, and receive the filled histograms plus a run summary.
//!
//! ## Architecture
//!
//! - **Analysis Workflow** ([`analyze`]) - Per-event control flow (trigger, cutflow stages,
//!   weights, histogram filling) and end-of-job reporting.
//!
//! ## Key Capabilities
//!
//! - **Source-agnostic input**: anything yielding `Result<Event, E>` can be analysed
//! - **Explicit anomaly counts** for out-of-range pileup and absent triggers
//! - **Progress monitoring** through the engine's progress reporter

pub mod analyze;
