use once_cell::sync::OnceCell;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum PileupError {
    #[error("Pileup reference '{0}' is empty")]
    EmptyReference(&'static str),

    #[error("Pileup references differ in length: observed has {observed} bins, simulated has {simulated}")]
    BinCountMismatch { observed: usize, simulated: usize },

    #[error("Pileup reference '{reference}' has an invalid content {value} in bin {bin}")]
    InvalidContent {
        reference: &'static str,
        bin: usize,
        value: f64,
    },

    #[error("Pileup reference '{0}' has a non-positive integral")]
    ZeroIntegral(&'static str),

    #[error("Pileup value {value} is outside the reweighting table (0..{bins})")]
    OutOfRange { value: u32, bins: usize },
}

/// Per-pileup-value weights that map the simulated pileup profile onto the observed one.
///
/// Built once before the event loop and read-only afterwards, so a shared
/// reference can be used from any number of threads.
#[derive(Debug)]
pub struct PileupReweightingTable {
    observed: Vec<f64>,
    simulated: Vec<f64>,
    weights: Vec<f64>,
    reweighted: OnceCell<Vec<f64>>,
}

impl PileupReweightingTable {
    /// Builds the table from two distributions over the same integer pileup axis.
    ///
    /// Both references are normalized to unit integral. Bin `i` receives
    /// `observed[i] / simulated[i]`, or exactly `1.0` where the simulated
    /// probability is zero.
    ///
    /// # Errors
    ///
    /// Returns an error if either reference is empty, the lengths differ, a
    /// bin is negative or not finite, or an integral is not positive.
    pub fn new(observed: &[f64], simulated: &[f64]) -> Result<Self, PileupError> {
        let observed = normalized("observed", observed)?;
        let simulated = normalized("simulated", simulated)?;
        if observed.len() != simulated.len() {
            return Err(PileupError::BinCountMismatch {
                observed: observed.len(),
                simulated: simulated.len(),
            });
        }

        let weights = observed
            .iter()
            .zip(&simulated)
            .map(|(&obs, &sim)| if sim > 0.0 { obs / sim } else { 1.0 })
            .collect();

        Ok(Self {
            observed,
            simulated,
            weights,
            reweighted: OnceCell::new(),
        })
    }

    /// Returns the weight for pileup value `value`.
    ///
    /// Values beyond the table are rejected, never clamped to the last bin.
    pub fn weight(&self, value: u32) -> Result<f64, PileupError> {
        self.weights
            .get(value as usize)
            .copied()
            .ok_or(PileupError::OutOfRange {
                value,
                bins: self.weights.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Unit-normalized observed reference.
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// Unit-normalized simulated reference.
    pub fn simulated(&self) -> &[f64] {
        &self.simulated
    }

    /// Simulated reference multiplied bin-by-bin by its weight.
    ///
    /// Computed on first use and cached; used for validation plots only.
    pub fn reweighted_simulation(&self) -> &[f64] {
        self.reweighted.get_or_init(|| {
            self.simulated
                .iter()
                .zip(&self.weights)
                .map(|(&sim, &w)| sim * w)
                .collect()
        })
    }
}

fn normalized(reference: &'static str, contents: &[f64]) -> Result<Vec<f64>, PileupError> {
    if contents.is_empty() {
        return Err(PileupError::EmptyReference(reference));
    }
    if let Some((bin, &value)) = contents
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(PileupError::InvalidContent {
            reference,
            bin,
            value,
        });
    }
    let integral: f64 = contents.iter().sum();
    if integral <= 0.0 || !integral.is_finite() {
        return Err(PileupError::ZeroIntegral(reference));
    }
    Ok(contents.iter().map(|v| v / integral).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn weight_is_ratio_of_normalized_references() {
        let table = PileupReweightingTable::new(&[0.1, 0.4, 0.5], &[0.2, 0.4, 0.4]).unwrap();

        assert_close(table.weight(0).unwrap(), 0.5);
        assert_close(table.weight(1).unwrap(), 1.0);
        assert_close(table.weight(2).unwrap(), 1.25);
    }

    #[test]
    fn references_are_normalized_before_division() {
        let table = PileupReweightingTable::new(&[10.0, 30.0], &[2.0, 2.0]).unwrap();

        assert_close(table.observed()[0], 0.25);
        assert_close(table.simulated()[1], 0.5);
        assert_close(table.weight(0).unwrap(), 0.5);
        assert_close(table.weight(1).unwrap(), 1.5);
    }

    #[test]
    fn empty_simulated_bin_gets_unit_weight_exactly() {
        let table = PileupReweightingTable::new(&[0.3, 0.3, 0.4], &[0.5, 0.0, 0.5]).unwrap();

        assert_eq!(table.weight(1).unwrap(), 1.0);
        assert!(table.weights().iter().all(|w| w.is_finite()));
    }

    #[test]
    fn out_of_range_lookup_is_rejected() {
        let table = PileupReweightingTable::new(&[1.0, 1.0], &[1.0, 1.0]).unwrap();

        assert_eq!(
            table.weight(2),
            Err(PileupError::OutOfRange { value: 2, bins: 2 })
        );
        assert!(table.weight(u32::MAX).is_err());
    }

    #[test]
    fn invalid_references_fail_construction() {
        assert_eq!(
            PileupReweightingTable::new(&[], &[1.0]).unwrap_err(),
            PileupError::EmptyReference("observed")
        );
        assert_eq!(
            PileupReweightingTable::new(&[1.0, 2.0], &[1.0]).unwrap_err(),
            PileupError::BinCountMismatch {
                observed: 2,
                simulated: 1
            }
        );
        assert_eq!(
            PileupReweightingTable::new(&[1.0], &[0.0]).unwrap_err(),
            PileupError::ZeroIntegral("simulated")
        );
        assert!(matches!(
            PileupReweightingTable::new(&[1.0, -0.5], &[1.0, 1.0]),
            Err(PileupError::InvalidContent { bin: 1, .. })
        ));
        assert!(matches!(
            PileupReweightingTable::new(&[1.0, f64::NAN], &[1.0, 1.0]),
            Err(PileupError::InvalidContent { bin: 1, .. })
        ));
    }

    #[test]
    fn reweighted_simulation_reproduces_observed_where_simulation_is_populated() {
        let observed = [0.1, 0.2, 0.3, 0.4];
        let simulated = [0.25, 0.25, 0.5, 0.0];
        let table = PileupReweightingTable::new(&observed, &simulated).unwrap();

        let reweighted = table.reweighted_simulation();
        assert_close(reweighted[0], 0.1);
        assert_close(reweighted[1], 0.2);
        assert_close(reweighted[2], 0.3);
        assert_eq!(reweighted[3], 0.0);

        let again = table.reweighted_simulation();
        assert!(std::ptr::eq(reweighted, again));
    }

    #[test]
    fn table_is_shareable_across_threads() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<PileupReweightingTable>();
    }
}
