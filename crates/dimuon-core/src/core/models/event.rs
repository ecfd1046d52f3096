use super::particle::Particle;
use std::collections::HashMap;

/// Per-event trigger decisions keyed by trigger name.
///
/// Only the triggers the data source actually provides for the event are
/// present. A name that is absent carries no decision, which callers treat as
/// "did not fire".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerDecisions {
    decisions: HashMap<String, bool>,
}

impl TriggerDecisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the decision for `name`, or `None` if the trigger is not available.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.decisions.get(name).copied()
    }

    /// Returns `true` only if the trigger is available and fired.
    pub fn fired(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decisions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for TriggerDecisions {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        Self {
            decisions: iter
                .into_iter()
                .map(|(name, fired)| (name.into(), fired))
                .collect(),
        }
    }
}

/// A read-only snapshot of one collision event as delivered by the data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    /// Event number within the input, used for diagnostics only.
    pub number: u64,
    /// Muon candidates in the order the data source stores them.
    pub particles: Vec<Particle>,
    /// Raw generator weight. Meaningless for collision data.
    pub gen_weight: f64,
    /// Number of simultaneous interactions (true pileup for simulation).
    pub pileup: u32,
    /// Trigger decisions available for this event.
    pub triggers: TriggerDecisions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_trigger_is_not_fired() {
        let decisions: TriggerDecisions =
            [("HLT_IsoMu24", true), ("HLT_IsoTkMu24", false)].into_iter().collect();

        assert!(decisions.fired("HLT_IsoMu24"));
        assert!(!decisions.fired("HLT_IsoTkMu24"));
        assert!(!decisions.fired("HLT_IsoMu27"));
        assert_eq!(decisions.get("HLT_IsoMu27"), None);
        assert_eq!(decisions.len(), 2);
    }
}
