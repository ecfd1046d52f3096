use super::config::{IdRequirement, SelectionCriteria, SelectionOptions};
use crate::core::models::particle::Particle;

/// A particle that survived filtering, paired with its index in the event.
pub type Candidate<'a> = (usize, &'a Particle);

impl IdRequirement {
    /// Applies the variant's comparison policy to `particle`.
    pub fn is_satisfied_by(&self, particle: &Particle) -> bool {
        match *self {
            IdRequirement::TightFlag => particle.tight_id,
            IdRequirement::ExactTier(tier) => particle.id_tier == tier,
            IdRequirement::MinimumTier(tier) => particle.id_tier >= tier,
        }
    }
}

/// Returns `true` if `particle` passes every cut enabled in `options`.
///
/// The pt cut uses the subleading threshold; the leading threshold is applied
/// when the pair is formed. The mass-window flag has no per-particle meaning
/// and is ignored here.
pub fn passes(particle: &Particle, criteria: &SelectionCriteria, options: SelectionOptions) -> bool {
    if options.pt && particle.pt <= criteria.subleading_min_pt {
        return false;
    }
    if options.eta && particle.eta.abs() >= criteria.max_eta {
        return false;
    }
    if options.id && !criteria.id.is_satisfied_by(particle) {
        return false;
    }
    if options.isolation && particle.pf_rel_iso >= criteria.isolation_max {
        return false;
    }
    true
}

/// Filters the event's particles, keeping input order and original indices.
pub fn select_candidates<'a>(
    particles: &'a [Particle],
    criteria: &SelectionCriteria,
    options: SelectionOptions,
) -> Vec<Candidate<'a>> {
    particles
        .iter()
        .enumerate()
        .filter(|(_, particle)| passes(particle, criteria, options))
        .collect()
}
