use crate::core::io::pileup::read_profile;
use crate::core::models::event::Event;
use crate::core::models::histogram::{Binning, Histogram, HistogramSet};
use crate::engine::config::AnalysisConfig;
use crate::engine::cutflow::{CUTFLOW_STAGES, CutflowAccumulator};
use crate::engine::error::EngineError;
use crate::engine::pileup::PileupReweightingTable;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::trigger::TriggerGate;
use crate::engine::weights::WeightCascade;
use tracing::{debug, info, instrument, trace, warn};

/// Per-job bookkeeping returned alongside the histograms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub events_processed: u64,
    pub events_passing_trigger: u64,
    /// Events with a valid pair at each cutflow stage, in stage order.
    pub stage_counts: Vec<u64>,
    /// Trigger-passing events skipped because their pileup value had no table entry.
    pub pileup_out_of_range: u64,
    /// Sum of generator-level weights over all processed events.
    pub total_generator_weight: f64,
    /// Configured trigger names that no event carried.
    pub missing_triggers: Vec<String>,
}

impl RunSummary {
    /// Events that survived the final cutflow stage.
    pub fn events_selected(&self) -> u64 {
        self.stage_counts.last().copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub histograms: HistogramSet,
    pub summary: RunSummary,
}

/// Builds the pileup reweighting table for a simulated sample with configured references.
///
/// Returns `Ok(None)` for collision data and for samples without references.
pub fn load_pileup_table(
    config: &AnalysisConfig,
) -> Result<Option<PileupReweightingTable>, EngineError> {
    let Some(references) = config.pileup.as_ref().filter(|_| config.sample.is_mc) else {
        return Ok(None);
    };
    debug!(
        data = %references.data_path.display(),
        mc = %references.mc_path.display(),
        "Loading pileup reference profiles."
    );
    let observed = read_profile(&references.data_path)?;
    let simulated = read_profile(&references.mc_path)?;
    let table = PileupReweightingTable::new(&observed, &simulated)?;
    info!(bins = table.len(), "Pileup reweighting table ready.");
    Ok(Some(table))
}

/// Event-by-event state of one analysis job.
///
/// All configuration is borrowed and read-only; the only mutable state is the
/// histogram set and the summary counters owned by this value.
pub struct Analysis<'a> {
    config: &'a AnalysisConfig,
    pileup: Option<&'a PileupReweightingTable>,
    gate: TriggerGate,
    cascade: WeightCascade<'a>,
    accumulator: CutflowAccumulator<'a>,
    histograms: HistogramSet,
    summary: RunSummary,
}

impl<'a> Analysis<'a> {
    pub fn new(
        config: &'a AnalysisConfig,
        pileup: Option<&'a PileupReweightingTable>,
    ) -> Result<Self, EngineError> {
        let mut histograms = HistogramSet::new();
        CutflowAccumulator::register(&mut histograms)?;

        let gate = TriggerGate::for_sample(&config.triggers, &config.sample.name);
        debug!(triggers = ?gate.names(), "Resolved trigger list.");

        Ok(Self {
            config,
            pileup,
            gate,
            cascade: WeightCascade::new(&config.sample, pileup),
            accumulator: CutflowAccumulator::new(&config.criteria),
            histograms,
            summary: RunSummary {
                stage_counts: vec![0; CUTFLOW_STAGES.len()],
                ..Default::default()
            },
        })
    }

    /// Processes one event.
    ///
    /// Degenerate events (no trigger, no pair, out-of-range pileup) are
    /// counted, never returned as errors.
    pub fn process(&mut self, event: &Event) -> Result<(), EngineError> {
        self.summary.events_processed += 1;

        let generator = self.cascade.generator_weight(event.gen_weight);
        self.summary.total_generator_weight += generator;
        CutflowAccumulator::record_total_weight(&mut self.histograms, generator);

        if !self.gate.passes(&event.triggers) {
            return Ok(());
        }
        self.summary.events_passing_trigger += 1;

        let weights = match self.cascade.compute(event.gen_weight, event.pileup) {
            Ok(weights) => weights,
            Err(EngineError::PileupOutOfRange { value, bins }) => {
                trace!(event = event.number, value, bins, "Pileup outside reweighting table.");
                self.summary.pileup_out_of_range += 1;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let report = self.accumulator.record(event, &weights, &mut self.histograms);
        for count in &mut self.summary.stage_counts[..report.stages_passed] {
            *count += 1;
        }
        Ok(())
    }

    /// Closes the job: reports anomalies once and attaches pileup validation histograms.
    pub fn finish(mut self) -> AnalysisResult {
        self.summary.missing_triggers = self
            .gate
            .missing_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in &self.summary.missing_triggers {
            warn!(trigger = %name, "Configured trigger was not present in any event.");
        }
        if self.summary.pileup_out_of_range > 0 {
            warn!(
                count = self.summary.pileup_out_of_range,
                "Events skipped because their pileup value is outside the reweighting table."
            );
        }

        if let Some(table) = self.pileup {
            add_pileup_validation(&mut self.histograms, table);
        }

        info!(
            sample = %self.config.sample.name,
            processed = self.summary.events_processed,
            passed_trigger = self.summary.events_passing_trigger,
            selected = self.summary.events_selected(),
            "Analysis job finished."
        );
        AnalysisResult {
            histograms: self.histograms,
            summary: self.summary,
        }
    }
}

fn add_pileup_validation(histograms: &mut HistogramSet, table: &PileupReweightingTable) {
    let binning = Binning::new(table.len(), 0.0, table.len() as f64);
    let profiles = [
        ("h_pileup_observed", "Observed pileup profile", table.observed()),
        ("h_pileup_simulated", "Simulated pileup profile", table.simulated()),
        (
            "h_pileup_reweighted",
            "Reweighted simulated pileup profile",
            table.reweighted_simulation(),
        ),
        ("h_pileup_weights", "Pileup weights", table.weights()),
    ];
    for (name, title, contents) in profiles {
        let mut histogram = Histogram::new(name, title, binning);
        for (i, &content) in contents.iter().enumerate() {
            histogram.set_bin_content(i, content);
        }
        histograms.insert(histogram);
    }
}

/// Runs one analysis job over `events`.
///
/// The event source is consumed in order; the first source error aborts the
/// job, since corrupt input is not a per-event condition.
#[instrument(skip_all, name = "analysis_workflow", fields(sample = %config.sample.name))]
pub fn run<I, E>(
    config: &AnalysisConfig,
    pileup: Option<&PileupReweightingTable>,
    events: I,
    reporter: &ProgressReporter,
) -> Result<AnalysisResult, EngineError>
where
    I: IntoIterator<Item = Result<Event, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    reporter.report(Progress::PhaseStart { name: "Setup" });
    let mut analysis = Analysis::new(config, pileup)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Event Loop" });
    reporter.report(Progress::TaskStart {
        expected_events: None,
    });
    info!("Starting event loop.");

    let mut processed = 0u64;
    for event in events {
        let event = event.map_err(|e| EngineError::EventSource(Box::new(e)))?;
        analysis.process(&event)?;
        processed += 1;
        reporter.tick(processed);
    }
    reporter.flush(processed);
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    Ok(analysis.finish())
}
