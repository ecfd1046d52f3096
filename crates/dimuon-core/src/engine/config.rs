use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Leading pt threshold ({leading}) must not be below the subleading threshold ({subleading})")]
    ThresholdOrder { leading: f64, subleading: f64 },

    #[error("Mass window must satisfy low < high, got [{low}, {high}]")]
    MalformedMassWindow { low: f64, high: f64 },

    #[error("Trigger list for {0} is empty")]
    EmptyTriggerList(String),
}

/// Open interval `(low, high)` on the dimuon invariant mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassWindow {
    pub low: f64,
    pub high: f64,
}

impl MassWindow {
    pub fn new(low: f64, high: f64) -> Result<Self, ConfigError> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(ConfigError::MalformedMassWindow { low, high });
        }
        Ok(Self { low, high })
    }

    /// Strict containment; values on either edge are outside.
    pub fn contains(&self, mass: f64) -> bool {
        mass > self.low && mass < self.high
    }
}

/// Identification requirement, with the comparison policy fixed per variant.
///
/// Eras differ in how the identification working point is expressed: some
/// store a boolean flag, others an ordered quality tier that is either matched
/// exactly or used as a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdRequirement {
    /// The particle's tight identification flag must be set.
    #[default]
    TightFlag,
    /// The particle's tier must equal the given tier.
    ExactTier(u8),
    /// The particle's tier must be at least the given tier.
    MinimumTier(u8),
}

/// Thresholds for the muon selection. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCriteria {
    pub leading_min_pt: f64,
    pub subleading_min_pt: f64,
    pub max_eta: f64,
    pub id: IdRequirement,
    pub isolation_max: f64,
    pub mass_window: Option<MassWindow>,
}

#[derive(Default)]
pub struct SelectionCriteriaBuilder {
    leading_min_pt: Option<f64>,
    subleading_min_pt: Option<f64>,
    max_eta: Option<f64>,
    id: Option<IdRequirement>,
    isolation_max: Option<f64>,
    mass_window: Option<(f64, f64)>,
}

impl SelectionCriteriaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leading_min_pt(mut self, pt: f64) -> Self {
        self.leading_min_pt = Some(pt);
        self
    }
    pub fn subleading_min_pt(mut self, pt: f64) -> Self {
        self.subleading_min_pt = Some(pt);
        self
    }
    pub fn max_eta(mut self, eta: f64) -> Self {
        self.max_eta = Some(eta);
        self
    }
    pub fn id(mut self, id: IdRequirement) -> Self {
        self.id = Some(id);
        self
    }
    pub fn isolation_max(mut self, iso: f64) -> Self {
        self.isolation_max = Some(iso);
        self
    }
    pub fn mass_window(mut self, window: Option<(f64, f64)>) -> Self {
        self.mass_window = window;
        self
    }

    pub fn build(self) -> Result<SelectionCriteria, ConfigError> {
        let leading_min_pt = self
            .leading_min_pt
            .ok_or(ConfigError::MissingParameter("leading_min_pt"))?;
        let subleading_min_pt = self
            .subleading_min_pt
            .ok_or(ConfigError::MissingParameter("subleading_min_pt"))?;
        let max_eta = self
            .max_eta
            .ok_or(ConfigError::MissingParameter("max_eta"))?;
        let isolation_max = self
            .isolation_max
            .ok_or(ConfigError::MissingParameter("isolation_max"))?;

        require_finite_non_negative("leading_min_pt", leading_min_pt)?;
        require_finite_non_negative("subleading_min_pt", subleading_min_pt)?;
        require_finite_positive("max_eta", max_eta)?;
        require_finite_positive("isolation_max", isolation_max)?;
        if leading_min_pt < subleading_min_pt {
            return Err(ConfigError::ThresholdOrder {
                leading: leading_min_pt,
                subleading: subleading_min_pt,
            });
        }

        let mass_window = self
            .mass_window
            .map(|(low, high)| MassWindow::new(low, high))
            .transpose()?;

        Ok(SelectionCriteria {
            leading_min_pt,
            subleading_min_pt,
            max_eta,
            id: self.id.ok_or(ConfigError::MissingParameter("id"))?,
            isolation_max,
            mass_window,
        })
    }
}

fn require_finite_non_negative(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("expected a finite, non-negative number, got {value}"),
        });
    }
    Ok(())
}

fn require_finite_positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("expected a finite, positive number, got {value}"),
        });
    }
    Ok(())
}

/// Which cut categories a filtering pass enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionOptions {
    pub pt: bool,
    pub eta: bool,
    pub id: bool,
    pub isolation: bool,
    pub mass_window: bool,
}

impl SelectionOptions {
    pub const fn none() -> Self {
        Self {
            pt: false,
            eta: false,
            id: false,
            isolation: false,
            mass_window: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            pt: true,
            eta: true,
            id: true,
            isolation: true,
            mass_window: true,
        }
    }

    /// Every candidate-level cut, without the mass window.
    pub const fn candidate_cuts() -> Self {
        Self {
            mass_window: false,
            ..Self::all()
        }
    }

    pub const fn with_pt(mut self) -> Self {
        self.pt = true;
        self
    }
    pub const fn with_eta(mut self) -> Self {
        self.eta = true;
        self
    }
    pub const fn with_id(mut self) -> Self {
        self.id = true;
        self
    }
    pub const fn with_isolation(mut self) -> Self {
        self.isolation = true;
        self
    }
    pub const fn with_mass_window(mut self) -> Self {
        self.mass_window = true;
        self
    }
}

/// Trigger names to OR together, with optional per-sample replacements.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfiguration {
    default: Vec<String>,
    exceptions: HashMap<String, Vec<String>>,
}

impl TriggerConfiguration {
    pub fn new(
        default: Vec<String>,
        exceptions: HashMap<String, Vec<String>>,
    ) -> Result<Self, ConfigError> {
        if default.is_empty() {
            return Err(ConfigError::EmptyTriggerList("the default".to_string()));
        }
        if let Some((sample, _)) = exceptions.iter().find(|(_, list)| list.is_empty()) {
            return Err(ConfigError::EmptyTriggerList(format!("sample '{sample}'")));
        }
        Ok(Self {
            default,
            exceptions,
        })
    }

    /// Returns the override list for `sample` if one exists, else the default list.
    pub fn triggers_for(&self, sample: &str) -> &[String] {
        self.exceptions
            .get(sample)
            .map(Vec::as_slice)
            .unwrap_or(&self.default)
    }
}

/// Per-sample properties that drive the weight cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleInfo {
    pub name: String,
    pub is_mc: bool,
    pub is_nnlo: bool,
    pub normalization: f64,
}

impl SampleInfo {
    /// Naming convention marking next-to-next-to-leading-order samples.
    pub const NNLO_MARKER: &'static str = "NNLO";

    /// Simulated sample with unit normalization and the NNLO flag taken from the name.
    pub fn simulated(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_nnlo = name.contains(Self::NNLO_MARKER);
        Self {
            name,
            is_mc: true,
            is_nnlo,
            normalization: 1.0,
        }
    }

    /// Collision-data sample; never NNLO, unit normalization.
    pub fn collision_data(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_mc: false,
            is_nnlo: false,
            normalization: 1.0,
        }
    }
}

/// Locations of the observed and simulated pileup reference profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct PileupReferences {
    pub data_path: PathBuf,
    pub mc_path: PathBuf,
}

/// Everything one analysis job needs, validated up front.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub sample: SampleInfo,
    pub criteria: SelectionCriteria,
    pub triggers: TriggerConfiguration,
    pub pileup: Option<PileupReferences>,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    sample_name: Option<String>,
    is_mc: Option<bool>,
    is_nnlo: Option<bool>,
    normalization: Option<f64>,
    criteria: Option<SelectionCriteria>,
    triggers: Option<TriggerConfiguration>,
    pileup: Option<PileupReferences>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_name(mut self, name: impl Into<String>) -> Self {
        self.sample_name = Some(name.into());
        self
    }
    pub fn is_mc(mut self, is_mc: bool) -> Self {
        self.is_mc = Some(is_mc);
        self
    }
    pub fn is_nnlo(mut self, is_nnlo: bool) -> Self {
        self.is_nnlo = Some(is_nnlo);
        self
    }
    pub fn normalization(mut self, factor: f64) -> Self {
        self.normalization = Some(factor);
        self
    }
    pub fn criteria(mut self, criteria: SelectionCriteria) -> Self {
        self.criteria = Some(criteria);
        self
    }
    pub fn triggers(mut self, triggers: TriggerConfiguration) -> Self {
        self.triggers = Some(triggers);
        self
    }
    pub fn pileup(mut self, references: Option<PileupReferences>) -> Self {
        self.pileup = references;
        self
    }

    /// Builds the configuration.
    ///
    /// Unset sample flags fall back to: simulated, NNLO by naming convention,
    /// normalization `1.0`.
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let name = self
            .sample_name
            .ok_or(ConfigError::MissingParameter("sample_name"))?;
        if name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                parameter: "sample_name",
                reason: "sample name is empty".to_string(),
            });
        }
        let normalization = self.normalization.unwrap_or(1.0);
        if !normalization.is_finite() {
            return Err(ConfigError::InvalidValue {
                parameter: "normalization",
                reason: format!("expected a finite number, got {normalization}"),
            });
        }
        let is_mc = self.is_mc.unwrap_or(true);
        let is_nnlo = is_mc
            && self
                .is_nnlo
                .unwrap_or_else(|| name.contains(SampleInfo::NNLO_MARKER));

        Ok(AnalysisConfig {
            sample: SampleInfo {
                name,
                is_mc,
                is_nnlo,
                normalization,
            },
            criteria: self
                .criteria
                .ok_or(ConfigError::MissingParameter("criteria"))?,
            triggers: self
                .triggers
                .ok_or(ConfigError::MissingParameter("triggers"))?,
            pileup: self.pileup,
        })
    }
}
