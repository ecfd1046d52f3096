use super::config::{SelectionCriteria, SelectionOptions};
use super::pairing::{DimuonPair, PairOutcome, select_pair};
use super::selection::select_candidates;
use super::weights::WeightComponents;
use crate::core::models::event::Event;
use crate::core::models::histogram::{Binning, Histogram, HistogramSet};
use phf::{Map, phf_map};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum HistogramError {
    #[error("No binning is registered for histogram '{0}'")]
    UnknownObservable(String),
}

/// Destination for weighted observations.
pub trait HistogramSink {
    fn fill(&mut self, name: &str, value: f64, weight: f64);
}

/// Axis definition and title of a known observable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observable {
    pub binning: Binning,
    pub title: &'static str,
}

const PT: Binning = Binning::new(10000, 0.0, 10000.0);
const ETA: Binning = Binning::new(60, -3.0, 3.0);
const PHI: Binning = Binning::new(24, -PI, PI);
const PILEUP: Binning = Binning::new(100, 0.0, 100.0);
const STAGES: Binning = Binning::new(CUTFLOW_STAGES.len(), 0.0, CUTFLOW_STAGES.len() as f64);

const fn obs(binning: Binning, title: &'static str) -> Observable {
    Observable { binning, title }
}

#[rustfmt::skip]
static OBSERVABLES: Map<&'static str, Observable> = phf_map! {
    "h_singlemuon_pt"       => obs(PT,  "Single muon pT after z mass cut;p_{T} [GeV];Events"),
    "h_singlemuon_eta"      => obs(ETA, "Single muon #eta after z mass cut;#eta;Events"),
    "h_singlemuon_phi"      => obs(PHI, "Single muon #phi after z mass cut;#phi;Events"),
    "h_leadingmuon_pt"      => obs(PT,  "Leading muon pT after z mass cut;p_{T} [GeV];Events"),
    "h_leadingmuon_eta"     => obs(ETA, "Leading muon #eta after z mass cut;#eta;Events"),
    "h_leadingmuon_phi"     => obs(PHI, "Leading muon #phi after z mass cut;#phi;Events"),
    "h_subleadingmuon_pt"   => obs(PT,  "Subleading muon pT after z mass cut;p_{T} [GeV];Events"),
    "h_subleadingmuon_eta"  => obs(ETA, "Subleading muon #eta after z mass cut;#eta;Events"),
    "h_subleadingmuon_phi"  => obs(PHI, "Subleading muon #phi after z mass cut;#phi;Events"),
    "h_dimuon_pt"           => obs(PT,  "Dimuon pT after z mass cut;p_{T} [GeV];Events"),
    "h_dimuon_rapidity"     => obs(ETA, "Dimuon rapidity after z mass cut;y;Events"),
    "h_dimuon_phi"          => obs(PHI, "Dimuon #phi after z mass cut;#phi;Events"),
    "h_dimuon_mass"         => obs(PT,  "Dimuon mass after z mass cut;m [GeV];Events"),
    "h_npv"                 => obs(PILEUP, "Pileup after z mass cut;N_{PU};Events"),
    "h_cutflow"             => obs(STAGES, "Weighted cutflow;stage;Events"),
    "h_cutflow_unweighted"  => obs(STAGES, "Unweighted cutflow;stage;Events"),
    "h_total_weight"        => obs(Binning::new(1, 0.0, 1.0), "Sum of generator weights;;Sum"),
};

/// Weight-variant suffixes; the bare name carries the weight before normalization.
pub const AFTER_NORMALIZATION: &str = "_after_norm";
pub const AFTER_PILEUP: &str = "_after_pu";

/// Looks up the observable behind `name`, ignoring a weight-variant suffix.
pub fn observable(name: &str) -> Option<&'static Observable> {
    let base = name
        .strip_suffix(AFTER_NORMALIZATION)
        .or_else(|| name.strip_suffix(AFTER_PILEUP))
        .unwrap_or(name);
    OBSERVABLES.get(base)
}

impl HistogramSet {
    /// Adds an empty histogram for `name` with its table binning, if not present yet.
    pub fn register(&mut self, name: &str) -> Result<(), HistogramError> {
        if self.contains(name) {
            return Ok(());
        }
        let observable =
            observable(name).ok_or_else(|| HistogramError::UnknownObservable(name.to_string()))?;
        self.insert(Histogram::new(name, observable.title, observable.binning));
        Ok(())
    }
}

impl HistogramSink for HistogramSet {
    /// Fills `name`, creating it from the binning table on first use.
    /// Names without a table entry are dropped.
    fn fill(&mut self, name: &str, value: f64, weight: f64) {
        if !self.contains(name) && self.register(name).is_err() {
            trace!(histogram = name, "Dropping fill for unregistered histogram.");
            return;
        }
        if let Some(histogram) = self.get_mut(name) {
            histogram.fill(value, weight);
        }
    }
}

/// One named step of the cutflow with the cuts it enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutflowStage {
    pub name: &'static str,
    pub options: SelectionOptions,
}

/// Stages in evaluation order. Each enables a superset of the previous one's cuts.
pub const CUTFLOW_STAGES: [CutflowStage; 6] = [
    CutflowStage {
        name: "trigger",
        options: SelectionOptions::none(),
    },
    CutflowStage {
        name: "pt",
        options: SelectionOptions::none().with_pt(),
    },
    CutflowStage {
        name: "eta",
        options: SelectionOptions::none().with_pt().with_eta(),
    },
    CutflowStage {
        name: "id",
        options: SelectionOptions::none().with_pt().with_eta().with_id(),
    },
    CutflowStage {
        name: "isolation",
        options: SelectionOptions::candidate_cuts(),
    },
    CutflowStage {
        name: "mass_window",
        options: SelectionOptions::all(),
    },
];

const KINEMATIC_BASES: [&str; 13] = [
    "h_singlemuon_pt",
    "h_singlemuon_eta",
    "h_singlemuon_phi",
    "h_leadingmuon_pt",
    "h_leadingmuon_eta",
    "h_leadingmuon_phi",
    "h_subleadingmuon_pt",
    "h_subleadingmuon_eta",
    "h_subleadingmuon_phi",
    "h_dimuon_pt",
    "h_dimuon_rapidity",
    "h_dimuon_phi",
    "h_dimuon_mass",
];

/// Which stages an event survived and the pair formed at the final stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageReport {
    /// Number of leading stages with a valid pair.
    pub stages_passed: usize,
    /// Outcome of the final stage.
    pub final_outcome: PairOutcome,
}

impl StageReport {
    pub fn final_pair(&self) -> Option<&DimuonPair> {
        self.final_outcome.pair()
    }
}

/// Runs every cutflow stage for an event and fills the resulting histograms.
#[derive(Debug, Clone, Copy)]
pub struct CutflowAccumulator<'a> {
    criteria: &'a SelectionCriteria,
    stages: &'static [CutflowStage],
}

impl<'a> CutflowAccumulator<'a> {
    pub fn new(criteria: &'a SelectionCriteria) -> Self {
        Self {
            criteria,
            stages: &CUTFLOW_STAGES,
        }
    }

    /// Every histogram name the accumulator can fill, in output order.
    pub fn histogram_names() -> Vec<String> {
        let mut names = vec![
            "h_cutflow".to_string(),
            "h_cutflow_unweighted".to_string(),
            "h_total_weight".to_string(),
        ];
        for suffix in ["", AFTER_NORMALIZATION, AFTER_PILEUP] {
            names.extend(KINEMATIC_BASES.iter().map(|base| format!("{base}{suffix}")));
        }
        names.push("h_npv".to_string());
        names.push(format!("h_npv{AFTER_PILEUP}"));
        names
    }

    /// Pre-creates every histogram in `set` so the output layout does not
    /// depend on which events were seen.
    pub fn register(set: &mut HistogramSet) -> Result<(), HistogramError> {
        Self::histogram_names()
            .iter()
            .try_for_each(|name| set.register(name))
    }

    /// Evaluates each stage's cuts and pairing without filling anything.
    ///
    /// Stages are evaluated in order and stop at the first stage without a
    /// valid pair. Later stages enforce a superset of its cuts, so with every
    /// charge at `-1` or `+1` (as the event reader guarantees) a failing stage
    /// implies that all later stages fail too.
    pub fn evaluate(&self, event: &Event) -> StageReport {
        let mut stages_passed = 0;
        let mut final_outcome = PairOutcome::TooFewCandidates;
        for stage in self.stages {
            let candidates = select_candidates(&event.particles, self.criteria, stage.options);
            let outcome = select_pair(&candidates, self.criteria, stage.options.mass_window);
            final_outcome = outcome;
            if !outcome.is_valid() {
                trace!(
                    event = event.number,
                    stage = stage.name,
                    reason = outcome.reason(),
                    "Event failed cutflow stage."
                );
                break;
            }
            stages_passed += 1;
        }
        StageReport {
            stages_passed,
            final_outcome,
        }
    }

    /// Records a trigger-passing event: one cutflow bin per surviving stage,
    /// plus the kinematic and pileup histograms if the final stage is reached.
    pub fn record<S: HistogramSink>(
        &self,
        event: &Event,
        weights: &WeightComponents,
        sink: &mut S,
    ) -> StageReport {
        let report = self.evaluate(event);
        for stage in 0..report.stages_passed {
            sink.fill("h_cutflow", stage as f64, weights.total());
            sink.fill("h_cutflow_unweighted", stage as f64, 1.0);
        }

        if let Some(pair) = report.final_pair() {
            let variants = [
                ("", weights.before_normalization()),
                (AFTER_NORMALIZATION, weights.before_pileup()),
                (AFTER_PILEUP, weights.total()),
            ];
            for (suffix, weight) in variants {
                fill_kinematics(sink, event, pair, suffix, weight);
            }
            sink.fill("h_npv", event.pileup as f64, weights.before_pileup());
            sink.fill(
                &format!("h_npv{AFTER_PILEUP}"),
                event.pileup as f64,
                weights.total(),
            );
        }
        report
    }

    /// Adds one event's generator-level weight to the job total.
    pub fn record_total_weight<S: HistogramSink>(sink: &mut S, gen_weight: f64) {
        sink.fill("h_total_weight", 0.0, gen_weight);
    }
}

fn fill_kinematics<S: HistogramSink>(
    sink: &mut S,
    event: &Event,
    pair: &DimuonPair,
    suffix: &str,
    weight: f64,
) {
    let (leading, subleading) = pair.particles(&event.particles);
    let mut put = |base: &str, value: f64| sink.fill(&format!("{base}{suffix}"), value, weight);

    for muon in [leading, subleading] {
        put("h_singlemuon_pt", muon.pt);
        put("h_singlemuon_eta", muon.eta);
        put("h_singlemuon_phi", muon.phi);
    }
    put("h_leadingmuon_pt", leading.pt);
    put("h_leadingmuon_eta", leading.eta);
    put("h_leadingmuon_phi", leading.phi);
    put("h_subleadingmuon_pt", subleading.pt);
    put("h_subleadingmuon_eta", subleading.eta);
    put("h_subleadingmuon_phi", subleading.phi);

    let p4 = &pair.p4;
    put("h_dimuon_pt", p4.pt());
    put("h_dimuon_rapidity", p4.rapidity());
    put("h_dimuon_phi", p4.phi());
    put("h_dimuon_mass", p4.mass());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::particle::Particle;
    use crate::engine::config::{IdRequirement, SelectionCriteriaBuilder};
    use std::collections::HashMap;

    #[derive(Default)]
    struct RecordingSink {
        fills: HashMap<String, Vec<(f64, f64)>>,
    }

    impl HistogramSink for RecordingSink {
        fn fill(&mut self, name: &str, value: f64, weight: f64) {
            self.fills
                .entry(name.to_string())
                .or_default()
                .push((value, weight));
        }
    }

    fn criteria() -> SelectionCriteria {
        SelectionCriteriaBuilder::new()
            .leading_min_pt(26.0)
            .subleading_min_pt(15.0)
            .max_eta(2.4)
            .id(IdRequirement::TightFlag)
            .isolation_max(0.15)
            .mass_window(Some((60.0, 120.0)))
            .build()
            .unwrap()
    }

    fn muon(pt: f64, eta: f64, phi: f64, charge: i8, iso: f64) -> Particle {
        Particle {
            pt,
            eta,
            phi,
            charge,
            tight_id: true,
            pf_rel_iso: iso,
            ..Default::default()
        }
    }

    fn weights() -> WeightComponents {
        WeightComponents {
            generator: 1.5,
            normalization: 2.0,
            pileup: 0.8,
        }
    }

    #[test]
    fn stage_options_grow_monotonically() {
        let enabled = |o: &SelectionOptions| {
            [o.pt, o.eta, o.id, o.isolation, o.mass_window]
                .iter()
                .filter(|&&b| b)
                .count()
        };
        for pair in CUTFLOW_STAGES.windows(2) {
            assert_eq!(enabled(&pair[1].options), enabled(&pair[0].options) + 1);
        }
        assert_eq!(CUTFLOW_STAGES[0].options, SelectionOptions::none());
        assert_eq!(CUTFLOW_STAGES[5].options, SelectionOptions::all());
    }

    #[test]
    fn z_like_event_passes_every_stage_and_fills_all_variants() {
        let event = Event {
            particles: vec![
                muon(45.6, 0.0, 0.0, 1, 0.01),
                muon(45.6, 0.0, PI, -1, 0.02),
            ],
            pileup: 30,
            ..Default::default()
        };
        let criteria = criteria();
        let accumulator = CutflowAccumulator::new(&criteria);
        let mut sink = RecordingSink::default();

        let report = accumulator.record(&event, &weights(), &mut sink);

        assert_eq!(report.stages_passed, 6);
        assert!(report.final_pair().is_some());
        let cutflow = &sink.fills["h_cutflow"];
        assert_eq!(cutflow.len(), 6);
        assert!(cutflow.iter().all(|&(_, w)| (w - 2.4).abs() < 1e-12));
        assert!(sink.fills["h_cutflow_unweighted"].iter().all(|&(_, w)| w == 1.0));

        assert_eq!(sink.fills["h_dimuon_mass"][0].1, 1.5);
        assert!((sink.fills["h_dimuon_mass_after_norm"][0].1 - 3.0).abs() < 1e-12);
        assert!((sink.fills["h_dimuon_mass_after_pu"][0].1 - 2.4).abs() < 1e-12);
        assert!((sink.fills["h_dimuon_mass"][0].0 - 91.2).abs() < 1e-3);
        assert_eq!(sink.fills["h_singlemuon_pt"].len(), 2);
        assert_eq!(sink.fills["h_npv"], vec![(30.0, 3.0)]);
        assert_eq!(sink.fills["h_npv_after_pu"][0].0, 30.0);
    }

    #[test]
    fn failing_isolation_stops_the_cutflow() {
        let event = Event {
            particles: vec![
                muon(45.6, 0.0, 0.0, 1, 0.01),
                muon(45.6, 0.0, PI, -1, 0.50),
            ],
            ..Default::default()
        };
        let criteria = criteria();
        let accumulator = CutflowAccumulator::new(&criteria);
        let mut sink = RecordingSink::default();

        let report = accumulator.record(&event, &weights(), &mut sink);

        assert_eq!(report.stages_passed, 4);
        assert_eq!(report.final_outcome, PairOutcome::TooFewCandidates);
        let bins: Vec<f64> = sink.fills["h_cutflow"].iter().map(|&(v, _)| v).collect();
        assert_eq!(bins, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(!sink.fills.contains_key("h_dimuon_mass"));
    }

    #[test]
    fn mass_window_failure_fills_no_kinematics() {
        let event = Event {
            particles: vec![muon(100.0, 0.0, 0.0, 1, 0.0), muon(100.0, 0.0, PI, -1, 0.0)],
            ..Default::default()
        };
        let criteria = criteria();
        let accumulator = CutflowAccumulator::new(&criteria);
        let mut sink = RecordingSink::default();

        let report = accumulator.record(&event, &weights(), &mut sink);

        assert_eq!(report.stages_passed, 5);
        assert!(matches!(report.final_outcome, PairOutcome::OutsideMassWindow(_)));
        assert!(report.final_pair().is_none());
        assert!(!sink.fills.contains_key("h_npv"));
    }

    #[test]
    fn registration_creates_every_histogram_with_table_binning() {
        let mut set = HistogramSet::new();
        CutflowAccumulator::register(&mut set).unwrap();

        assert_eq!(set.len(), CutflowAccumulator::histogram_names().len());
        assert_eq!(set.get("h_dimuon_mass_after_pu").unwrap().binning, PT);
        assert_eq!(set.get("h_dimuon_phi").unwrap().binning.n_bins, 24);
        assert_eq!(set.get("h_cutflow").unwrap().binning.n_bins, 6);
        assert_eq!(set.get("h_npv_after_pu").unwrap().binning, PILEUP);
    }

    #[test]
    fn unknown_observable_is_rejected_at_registration() {
        let mut set = HistogramSet::new();
        assert_eq!(
            set.register("h_electron_pt"),
            Err(HistogramError::UnknownObservable("h_electron_pt".to_string()))
        );

        set.fill("h_electron_pt", 10.0, 1.0);
        assert!(set.is_empty());
    }

    #[test]
    fn histogram_set_sink_creates_known_histograms_on_first_fill() {
        let mut set = HistogramSet::new();
        set.fill("h_leadingmuon_eta_after_norm", 0.05, 2.0);

        let h = set.get("h_leadingmuon_eta_after_norm").unwrap();
        assert_eq!(h.binning, ETA);
        assert_eq!(h.contents[30], 2.0);
    }

    #[test]
    fn total_weight_sums_generator_weights() {
        let mut set = HistogramSet::new();
        for w in [1.0, -0.5, 2.0] {
            CutflowAccumulator::record_total_weight(&mut set, w);
        }
        assert_eq!(set.get("h_total_weight").unwrap().contents, vec![2.5]);
    }
}
