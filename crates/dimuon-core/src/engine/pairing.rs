use super::config::SelectionCriteria;
use super::selection::Candidate;
use crate::core::models::kinematics::LorentzVector;
use crate::core::models::particle::Particle;
use std::cmp::Ordering;
use tracing::trace;

/// A selected leading/subleading pair, referenced by index into the event's particle list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimuonPair {
    pub leading: usize,
    pub subleading: usize,
    /// Lorentz sum of the two four-momenta.
    pub p4: LorentzVector,
}

impl DimuonPair {
    pub fn mass(&self) -> f64 {
        self.p4.mass()
    }

    /// Resolves the pair's indices against the particle list it was built from.
    pub fn particles<'a>(&self, particles: &'a [Particle]) -> (&'a Particle, &'a Particle) {
        (&particles[self.leading], &particles[self.subleading])
    }
}

/// Result of one pairing attempt.
///
/// Only [`PairOutcome::Selected`] counts as a valid pair; the remaining
/// variants record why no pair was accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairOutcome {
    Selected(DimuonPair),
    TooFewCandidates,
    LeadingBelowThreshold,
    NoOppositeCharge,
    OutsideMassWindow(DimuonPair),
}

impl PairOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, PairOutcome::Selected(_))
    }

    /// The accepted pair, if any.
    pub fn pair(&self) -> Option<&DimuonPair> {
        match self {
            PairOutcome::Selected(pair) => Some(pair),
            _ => None,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            PairOutcome::Selected(_) => "selected",
            PairOutcome::TooFewCandidates => "fewer than two candidates",
            PairOutcome::LeadingBelowThreshold => "leading candidate below threshold",
            PairOutcome::NoOppositeCharge => "no opposite-charge partner",
            PairOutcome::OutsideMassWindow(_) => "pair outside mass window",
        }
    }
}

/// Picks the leading candidate and its first opposite-charge partner.
///
/// Candidates are ranked by descending pt, ties by ascending original index.
/// The leading candidate must exceed `criteria.leading_min_pt`. The
/// subleading candidate is the first lower-ranked candidate with opposite
/// charge. This first-match rule is a simplification: it does not search for
/// the pair closest to any resonance mass.
///
/// When `apply_mass_window` is set and `criteria` carries a window, a pair
/// whose invariant mass is not strictly inside it is reported as
/// [`PairOutcome::OutsideMassWindow`].
///
/// Kinematics are expected to be finite, which the event reader enforces. A
/// NaN pt would rank ahead of every finite pt and pass the threshold check.
pub fn select_pair(
    candidates: &[Candidate<'_>],
    criteria: &SelectionCriteria,
    apply_mass_window: bool,
) -> PairOutcome {
    if candidates.len() < 2 {
        return PairOutcome::TooFewCandidates;
    }

    let mut ranked = candidates.to_vec();
    ranked.sort_by(|a, b| by_descending_pt(a, b));

    let (lead_index, lead) = ranked[0];
    if lead.pt <= criteria.leading_min_pt {
        return PairOutcome::LeadingBelowThreshold;
    }

    let Some(&(sub_index, sub)) = ranked[1..]
        .iter()
        .find(|(_, p)| lead.is_opposite_charge(p))
    else {
        return PairOutcome::NoOppositeCharge;
    };

    let pair = DimuonPair {
        leading: lead_index,
        subleading: sub_index,
        p4: lead.p4() + sub.p4(),
    };

    if apply_mass_window {
        if let Some(window) = &criteria.mass_window {
            if !window.contains(pair.mass()) {
                trace!(mass = pair.mass(), "Dimuon pair rejected by mass window.");
                return PairOutcome::OutsideMassWindow(pair);
            }
        }
    }
    PairOutcome::Selected(pair)
}

fn by_descending_pt(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    b.1.pt.total_cmp(&a.1.pt).then(a.0.cmp(&b.0))
}
