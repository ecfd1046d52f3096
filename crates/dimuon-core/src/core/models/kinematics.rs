use nalgebra::Vector3;
use std::ops::Add;

/// A four-momentum stored as a Cartesian three-momentum plus energy.
///
/// All quantities are in GeV with natural units (`c = 1`). Construction from
/// collider coordinates (`pt`, `eta`, `phi`, `m`) and the derived observables
/// follow the usual special-relativistic relations, so that summing two
/// vectors yields the four-momentum of the combined system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LorentzVector {
    /// Three-momentum `(px, py, pz)`.
    pub momentum: Vector3<f64>,
    /// Energy component.
    pub energy: f64,
}

impl LorentzVector {
    /// Creates a vector from its Cartesian components.
    pub fn new(px: f64, py: f64, pz: f64, energy: f64) -> Self {
        Self {
            momentum: Vector3::new(px, py, pz),
            energy,
        }
    }

    /// Creates a vector from transverse momentum, pseudorapidity, azimuth and mass.
    ///
    /// # Arguments
    ///
    /// * `pt` - Momentum transverse to the beam axis.
    /// * `eta` - Pseudorapidity.
    /// * `phi` - Azimuthal angle in radians.
    /// * `mass` - Rest mass.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let pt = pt.abs();
        let momentum = Vector3::new(pt * phi.cos(), pt * phi.sin(), pt * eta.sinh());
        let energy = (momentum.norm_squared() + mass * mass).sqrt();
        Self { momentum, energy }
    }

    pub fn px(&self) -> f64 {
        self.momentum.x
    }

    pub fn py(&self) -> f64 {
        self.momentum.y
    }

    pub fn pz(&self) -> f64 {
        self.momentum.z
    }

    /// Transverse momentum `sqrt(px² + py²)`.
    pub fn pt(&self) -> f64 {
        self.momentum.x.hypot(self.momentum.y)
    }

    /// Azimuthal angle in `(-π, π]`; zero for a vector along the beam axis.
    pub fn phi(&self) -> f64 {
        if self.momentum.x == 0.0 && self.momentum.y == 0.0 {
            0.0
        } else {
            self.momentum.y.atan2(self.momentum.x)
        }
    }

    /// Pseudorapidity `asinh(pz / pt)`.
    ///
    /// A vector with vanishing transverse momentum has an infinite
    /// pseudorapidity; the sign of `pz` is kept.
    pub fn eta(&self) -> f64 {
        let pt = self.pt();
        if pt == 0.0 {
            return match self.pz() {
                z if z > 0.0 => f64::INFINITY,
                z if z < 0.0 => f64::NEG_INFINITY,
                _ => 0.0,
            };
        }
        (self.pz() / pt).asinh()
    }

    /// Rapidity `0.5 · ln((E + pz) / (E − pz))`.
    pub fn rapidity(&self) -> f64 {
        let e = self.energy;
        let pz = self.pz();
        0.5 * ((e + pz) / (e - pz)).ln()
    }

    /// Invariant mass squared `E² − |p|²`.
    pub fn mass_squared(&self) -> f64 {
        self.energy * self.energy - self.momentum.norm_squared()
    }

    /// Invariant mass.
    ///
    /// For a space-like vector (negative mass squared, only reachable through
    /// rounding or unphysical input) the negated root of the magnitude is
    /// returned instead of `NaN`.
    pub fn mass(&self) -> f64 {
        let m2 = self.mass_squared();
        if m2 < 0.0 { -(-m2).sqrt() } else { m2.sqrt() }
    }

    /// Returns the vector rotated by `angle` radians around the beam axis.
    pub fn rotated_z(&self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        let p = &self.momentum;
        Self::new(
            cos * p.x - sin * p.y,
            sin * p.x + cos * p.y,
            p.z,
            self.energy,
        )
    }
}

impl Add for LorentzVector {
    type Output = LorentzVector;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            momentum: self.momentum + rhs.momentum,
            energy: self.energy + rhs.energy,
        }
    }
}
