use thiserror::Error;

use super::config::ConfigError;
use super::cutflow::HistogramError;
use super::pileup::PileupError;
use crate::core::io::histograms::HistogramWriteError;
use crate::core::io::pileup::ProfileLoadError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Pileup reweighting setup failed: {source}")]
    Pileup {
        #[from]
        source: PileupError,
    },

    #[error("Failed to load pileup profile: {source}")]
    PileupProfile {
        #[from]
        source: ProfileLoadError,
    },

    #[error("Histogram registration failed: {source}")]
    Histogram {
        #[from]
        source: HistogramError,
    },

    #[error("Failed to write histograms: {source}")]
    HistogramOutput {
        #[from]
        source: HistogramWriteError,
    },

    #[error("Pileup value {value} is outside the reweighting table (0..{bins})")]
    PileupOutOfRange { value: u32, bins: usize },

    #[error("Event source failed: {0}")]
    EventSource(#[source] Box<dyn std::error::Error + Send + Sync>),
}
