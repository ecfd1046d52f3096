use crate::cli::RunArgs;
use crate::dataset::DEFAULT_FILES_PER_JOB;
use crate::error::{CliError, Result};
use dimuon::engine::config as core_config;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
enum PartialIdRequirement {
    TightFlag,
    ExactTier(u8),
    MinimumTier(u8),
}

impl From<PartialIdRequirement> for core_config::IdRequirement {
    fn from(p: PartialIdRequirement) -> Self {
        match p {
            PartialIdRequirement::TightFlag => core_config::IdRequirement::TightFlag,
            PartialIdRequirement::ExactTier(tier) => core_config::IdRequirement::ExactTier(tier),
            PartialIdRequirement::MinimumTier(tier) => {
                core_config::IdRequirement::MinimumTier(tier)
            }
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialProcessingConfig {
    #[serde(rename = "files-per-job")]
    files_per_job: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialTriggerConfig {
    default: Option<Vec<String>>,
    #[serde(default)]
    exception: HashMap<String, Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMuonConfig {
    #[serde(rename = "leading-pt")]
    leading_pt: Option<f64>,
    #[serde(rename = "subleading-pt")]
    subleading_pt: Option<f64>,
    eta: Option<f64>,
    #[serde(rename = "pf-iso")]
    pf_iso: Option<f64>,
    id: Option<PartialIdRequirement>,
    #[serde(rename = "mass-window")]
    mass_window: Option<[f64; 2]>,
    trigger: Option<PartialTriggerConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialPileupConfig {
    data: Option<PathBuf>,
    mc: Option<PathBuf>,
}

/// Settings for one `run` invocation after file, CLI and `--set` values are merged.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub analysis: core_config::AnalysisConfig,
    pub files_per_job: usize,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAnalysisConfig {
    processing: Option<PartialProcessingConfig>,
    muon: Option<PartialMuonConfig>,
    #[serde(default)]
    normalization: HashMap<String, f64>,
    #[serde(default, rename = "is-mc")]
    is_mc: HashMap<String, bool>,
    #[serde(default)]
    nnlo: HashMap<String, bool>,
    pileup: Option<PartialPileupConfig>,
    /// Directory relative pileup paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

impl PartialAnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<RunSettings> {
        self.apply_set_values(&args.set_values)?;

        let sample = args.sample.as_str();
        let processing = self.processing.take().unwrap_or_default();
        let muon = self.muon.take().ok_or_else(|| {
            CliError::Config("`muon` section is required.".to_string())
        })?;

        let files_per_job = args
            .files_per_job
            .or(processing.files_per_job)
            .unwrap_or(DEFAULT_FILES_PER_JOB);
        if files_per_job == 0 {
            return Err(CliError::Config(
                "`processing.files-per-job` must be at least 1.".to_string(),
            ));
        }

        let require = |value: Option<f64>, key: &str| {
            value.ok_or_else(|| CliError::Config(format!("`muon.{key}` is required.")))
        };
        let criteria = core_config::SelectionCriteriaBuilder::new()
            .leading_min_pt(require(muon.leading_pt, "leading-pt")?)
            .subleading_min_pt(require(muon.subleading_pt, "subleading-pt")?)
            .max_eta(require(muon.eta, "eta")?)
            .isolation_max(require(muon.pf_iso, "pf-iso")?)
            .id(muon.id.map(Into::into).unwrap_or_default())
            .mass_window(muon.mass_window.map(|[low, high]| (low, high)))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let trigger = muon.trigger.ok_or_else(|| {
            CliError::Config("`muon.trigger` section is required.".to_string())
        })?;
        let triggers = core_config::TriggerConfiguration::new(
            trigger.default.unwrap_or_default(),
            trigger.exception,
        )
        .map_err(|e| CliError::Config(e.to_string()))?;

        let pileup = self.resolve_pileup()?;

        let mut builder = core_config::AnalysisConfigBuilder::new()
            .sample_name(sample)
            .criteria(criteria)
            .triggers(triggers)
            .pileup(pileup);
        if let Some(&is_mc) = self.is_mc.get(sample) {
            builder = builder.is_mc(is_mc);
        }
        if let Some(&is_nnlo) = self.nnlo.get(sample) {
            builder = builder.is_nnlo(is_nnlo);
        }
        if let Some(&factor) = self.normalization.get(sample) {
            builder = builder.normalization(factor);
        }
        let analysis = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        debug!(?analysis, files_per_job, "Merged run configuration.");
        Ok(RunSettings {
            analysis,
            files_per_job,
        })
    }

    fn resolve_pileup(&mut self) -> Result<Option<core_config::PileupReferences>> {
        let Some(pileup) = self.pileup.take() else {
            return Ok(None);
        };
        let resolve = |p: PathBuf| {
            if p.is_absolute() {
                p
            } else {
                self.base_dir.join(p)
            }
        };
        match (pileup.data, pileup.mc) {
            (Some(data), Some(mc)) => Ok(Some(core_config::PileupReferences {
                data_path: resolve(data),
                mc_path: resolve(mc),
            })),
            (None, None) => Ok(None),
            _ => Err(CliError::Config(
                "`pileup` needs both `data` and `mc` profiles.".to_string(),
            )),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            if let Some((section, sample)) = key.split_once('.') {
                match section {
                    "normalization" => {
                        self.normalization
                            .insert(sample.to_string(), parse_value(key, value_str)?);
                        continue;
                    }
                    "is-mc" => {
                        self.is_mc
                            .insert(sample.to_string(), parse_value(key, value_str)?);
                        continue;
                    }
                    "nnlo" => {
                        self.nnlo
                            .insert(sample.to_string(), parse_value(key, value_str)?);
                        continue;
                    }
                    _ => {}
                }
            }

            match key {
                "processing.files-per-job" => {
                    self.processing
                        .get_or_insert_with(Default::default)
                        .files_per_job = Some(parse_value(key, value_str)?);
                }
                "muon.leading-pt" => {
                    self.muon.get_or_insert_with(Default::default).leading_pt =
                        Some(parse_value(key, value_str)?);
                }
                "muon.subleading-pt" => {
                    self.muon.get_or_insert_with(Default::default).subleading_pt =
                        Some(parse_value(key, value_str)?);
                }
                "muon.eta" => {
                    self.muon.get_or_insert_with(Default::default).eta = Some(parse_value(key, value_str)?);
                }
                "muon.pf-iso" => {
                    self.muon.get_or_insert_with(Default::default).pf_iso =
                        Some(parse_value(key, value_str)?);
                }
                "muon.mass-window" => {
                    self.muon.get_or_insert_with(Default::default).mass_window =
                        parse_mass_window(key, value_str)?;
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

/// Accepts `LOW,HIGH`, or `none` to disable the window.
fn parse_mass_window(key: &str, value: &str) -> Result<Option<[f64; 2]>> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let (low, high) = value.split_once(',').ok_or_else(|| {
        CliError::Config(format!("Invalid value for {}: expected LOW,HIGH or none", key))
    })?;
    Ok(Some([parse_value(key, low)?, parse_value(key, high)?]))
}
