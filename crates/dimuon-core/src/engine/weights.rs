use super::config::SampleInfo;
use super::error::EngineError;
use super::pileup::{PileupError, PileupReweightingTable};

/// The factors that multiply into one event weight, kept separate so each
/// intermediate can be filled into its own histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightComponents {
    /// Generator weight after the NNLO sign correction; `1.0` for collision data.
    pub generator: f64,
    pub normalization: f64,
    pub pileup: f64,
}

impl WeightComponents {
    pub fn before_normalization(&self) -> f64 {
        self.generator
    }

    pub fn before_pileup(&self) -> f64 {
        self.generator * self.normalization
    }

    pub fn total(&self) -> f64 {
        self.generator * self.normalization * self.pileup
    }
}

/// Combines generator weight, sample normalization and pileup reweighting.
///
/// The order is fixed: generator weight (raw for simulation, `1.0` for data),
/// NNLO sign correction, normalization, pileup weight. Collision data and
/// simulation without a reweighting table get a pileup weight of `1.0`.
#[derive(Debug, Clone, Copy)]
pub struct WeightCascade<'a> {
    sample: &'a SampleInfo,
    pileup: Option<&'a PileupReweightingTable>,
}

impl<'a> WeightCascade<'a> {
    pub fn new(sample: &'a SampleInfo, pileup: Option<&'a PileupReweightingTable>) -> Self {
        Self { sample, pileup }
    }

    /// Generator weight after the NNLO sign correction; `1.0` for collision data.
    pub fn generator_weight(&self, gen_weight: f64) -> f64 {
        match (self.sample.is_mc, self.sample.is_nnlo) {
            (false, _) => 1.0,
            (true, true) => nnlo_sign(gen_weight),
            (true, false) => gen_weight,
        }
    }

    /// Computes every weight component for one event.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PileupOutOfRange`] if `pileup` has no entry in the
    /// reweighting table. The table is never clamped.
    pub fn compute(&self, gen_weight: f64, pileup: u32) -> Result<WeightComponents, EngineError> {
        let generator = self.generator_weight(gen_weight);
        if !self.sample.is_mc {
            return Ok(WeightComponents {
                generator,
                normalization: self.sample.normalization,
                pileup: 1.0,
            });
        }

        let pileup_weight = match self.pileup {
            Some(table) => table.weight(pileup).map_err(|e| match e {
                PileupError::OutOfRange { value, bins } => {
                    EngineError::PileupOutOfRange { value, bins }
                }
                other => EngineError::from(other),
            })?,
            None => 1.0,
        };

        Ok(WeightComponents {
            generator,
            normalization: self.sample.normalization,
            pileup: pileup_weight,
        })
    }
}

/// NNLO samples carry only the sign of their generator weight; zero counts as negative.
fn nnlo_sign(weight: f64) -> f64 {
    if weight > 0.0 { 1.0 } else { -1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PileupReweightingTable {
        // Bin 0 weighs 0.4/0.5 = 0.8, bin 1 weighs 0.6/0.5 = 1.2.
        PileupReweightingTable::new(&[0.4, 0.6], &[0.5, 0.5]).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn collision_data_has_unit_generator_and_pileup_weights() {
        let sample = SampleInfo::collision_data("SingleMuon_RunC");
        let table = table();
        let cascade = WeightCascade::new(&sample, Some(&table));

        let weights = cascade.compute(-42.0, 0).unwrap();
        assert_eq!(weights.generator, 1.0);
        assert_eq!(weights.pileup, 1.0);
        assert_eq!(weights.total(), 1.0);

        // Pileup is not looked up for data, so out-of-range values are irrelevant.
        assert!(cascade.compute(1.0, 500).is_ok());
    }

    #[test]
    fn nnlo_samples_keep_only_the_sign() {
        let sample = SampleInfo::simulated("DYJetsToLL_NNLO");
        assert!(sample.is_nnlo);
        let cascade = WeightCascade::new(&sample, None);

        assert_eq!(cascade.compute(-3.7, 0).unwrap().generator, -1.0);
        assert_eq!(cascade.compute(0.0, 0).unwrap().generator, -1.0);
        assert_eq!(cascade.compute(1234.5, 0).unwrap().generator, 1.0);
    }

    #[test]
    fn components_multiply_in_order() {
        let mut sample = SampleInfo::simulated("DYJetsToLL_M-50");
        sample.normalization = 2.0;
        let table = table();
        let cascade = WeightCascade::new(&sample, Some(&table));

        let weights = cascade.compute(1.5, 0).unwrap();
        assert_close(weights.before_normalization(), 1.5);
        assert_close(weights.before_pileup(), 3.0);
        assert_close(weights.pileup, 0.8);
        assert_close(weights.total(), 2.4);
    }

    #[test]
    fn simulation_without_table_gets_unit_pileup_weight() {
        let sample = SampleInfo::simulated("TTTo2L2Nu");
        let cascade = WeightCascade::new(&sample, None);

        let weights = cascade.compute(0.7, 999).unwrap();
        assert_eq!(weights.pileup, 1.0);
        assert_close(weights.total(), 0.7);
    }

    #[test]
    fn out_of_range_pileup_is_an_error() {
        let sample = SampleInfo::simulated("TTTo2L2Nu");
        let table = table();
        let cascade = WeightCascade::new(&sample, Some(&table));

        assert!(matches!(
            cascade.compute(1.0, 2),
            Err(EngineError::PileupOutOfRange { value: 2, bins: 2 })
        ));
    }
}
