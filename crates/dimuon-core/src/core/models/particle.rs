use super::kinematics::LorentzVector;

/// A reconstructed muon candidate within a single event.
///
/// Particles are rebuilt for every event from the data source and are never
/// modified afterwards. Selection code refers to them by their position in the
/// event's particle list, which is the index stored in candidate and pair
/// records.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Momentum transverse to the beam axis, in GeV.
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle in radians.
    pub phi: f64,
    /// Rest mass in GeV.
    pub mass: f64,
    /// Electric charge in units of the elementary charge (`+1` or `-1`).
    pub charge: i8,
    /// Whether the candidate passes the tight identification working point.
    pub tight_id: bool,
    /// Ordered identification quality tier (`0` means the candidate fails every tier).
    pub id_tier: u8,
    /// Relative particle-flow isolation in a cone of `ΔR = 0.4`.
    pub pf_rel_iso: f64,
    /// Number of tracker layers with hits.
    pub n_tracker_layers: u32,
}

impl Particle {
    /// Returns the particle's four-momentum.
    pub fn p4(&self) -> LorentzVector {
        LorentzVector::from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.mass)
    }

    /// Returns `true` if the two particles carry opposite electric charge.
    pub fn is_opposite_charge(&self, other: &Particle) -> bool {
        i16::from(self.charge) * i16::from(other.charge) < 0
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pt: 0.0,
            eta: 0.0,
            phi: 0.0,
            mass: MUON_MASS_GEV,
            charge: 1,
            tight_id: false,
            id_tier: 0,
            pf_rel_iso: 0.0,
            n_tracker_layers: 0,
        }
    }
}

/// Muon rest mass in GeV.
pub const MUON_MASS_GEV: f64 = 0.105_658_375_5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_charge_requires_product_below_zero() {
        let plus = Particle {
            charge: 1,
            ..Default::default()
        };
        let minus = Particle {
            charge: -1,
            ..Default::default()
        };
        let neutral = Particle {
            charge: 0,
            ..Default::default()
        };

        assert!(plus.is_opposite_charge(&minus));
        assert!(!plus.is_opposite_charge(&plus));
        assert!(!plus.is_opposite_charge(&neutral));
    }

    #[test]
    fn p4_uses_particle_kinematics() {
        let p = Particle {
            pt: 25.0,
            eta: 0.5,
            phi: -1.0,
            ..Default::default()
        };
        let v = p.p4();
        assert!((v.pt() - 25.0).abs() < 1e-9);
        assert!((v.mass() - MUON_MASS_GEV).abs() < 1e-6);
    }
}
