use super::config::TriggerConfiguration;
use crate::core::models::event::TriggerDecisions;
use std::cell::RefCell;
use std::collections::BTreeSet;

/// Event-level trigger requirement for one sample.
///
/// The trigger list is resolved once at construction. An event passes if any
/// configured trigger fired; names the event does not carry count as not fired.
#[derive(Debug)]
pub struct TriggerGate {
    names: Vec<String>,
    unseen: RefCell<BTreeSet<usize>>,
}

impl TriggerGate {
    /// Uses the sample's override list if one exists, else the default list.
    pub fn for_sample(config: &TriggerConfiguration, sample: &str) -> Self {
        let names = config.triggers_for(sample).to_vec();
        let unseen = RefCell::new((0..names.len()).collect());
        Self { names, unseen }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn passes(&self, decisions: &TriggerDecisions) -> bool {
        self.note_present(decisions);
        self.names.iter().any(|name| decisions.fired(name))
    }

    /// Configured names that were absent from every event seen so far.
    pub fn missing_names(&self) -> Vec<&str> {
        self.unseen
            .borrow()
            .iter()
            .map(|&i| self.names[i].as_str())
            .collect()
    }

    fn note_present(&self, decisions: &TriggerDecisions) {
        let mut unseen = self.unseen.borrow_mut();
        if unseen.is_empty() {
            return;
        }
        unseen.retain(|&i| !decisions.contains(&self.names[i]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> TriggerConfiguration {
        let mut exceptions = HashMap::new();
        exceptions.insert(
            "SingleMuon_RunB".to_string(),
            vec!["HLT_Mu50".to_string()],
        );
        TriggerConfiguration::new(
            vec!["HLT_IsoMu24".to_string(), "HLT_IsoTkMu24".to_string()],
            exceptions,
        )
        .unwrap()
    }

    fn decisions(entries: &[(&str, bool)]) -> TriggerDecisions {
        entries.iter().map(|&(n, f)| (n, f)).collect()
    }

    #[test]
    fn sample_override_replaces_default_list() {
        let gate = TriggerGate::for_sample(&config(), "SingleMuon_RunB");
        assert_eq!(gate.names(), ["HLT_Mu50".to_string()]);

        let gate = TriggerGate::for_sample(&config(), "DYJetsToLL_M-50");
        assert_eq!(gate.names().len(), 2);
    }

    #[test]
    fn passes_if_any_configured_trigger_fired() {
        let gate = TriggerGate::for_sample(&config(), "DYJetsToLL_M-50");

        assert!(gate.passes(&decisions(&[
            ("HLT_IsoMu24", false),
            ("HLT_IsoTkMu24", true),
        ])));
        assert!(!gate.passes(&decisions(&[
            ("HLT_IsoMu24", false),
            ("HLT_IsoTkMu24", false),
        ])));
    }

    #[test]
    fn unconfigured_triggers_are_ignored() {
        let gate = TriggerGate::for_sample(&config(), "SingleMuon_RunB");
        assert!(!gate.passes(&decisions(&[("HLT_IsoMu24", true)])));
    }

    #[test]
    fn absent_names_count_as_not_fired_and_are_reported() {
        let gate = TriggerGate::for_sample(&config(), "DYJetsToLL_M-50");

        assert!(!gate.passes(&decisions(&[])));
        assert!(gate.passes(&decisions(&[("HLT_IsoMu24", true)])));
        assert_eq!(gate.missing_names(), vec!["HLT_IsoTkMu24"]);

        gate.passes(&decisions(&[("HLT_IsoTkMu24", false)]));
        assert!(gate.missing_names().is_empty());
    }
}
