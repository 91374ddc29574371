//! Top quark spin correlation observables
//!
//! The leptons from the top decays are analysed in the helicity basis
//! (K, N, R), which is built from the top direction in the ttbar rest
//! frame. Each charged lepton is projected onto the axes in the rest
//! frame of its parent quark.
use log::debug;
use thiserror::Error;

use crate::kinematics::{FourVector, ThreeVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value reported for observables that cannot be computed
pub const SENTINEL: f64 = -55.;

/// Below this sin θ the top is taken to be along the beam axis
pub const MIN_SIN_THETA: f64 = 1e-12;

/// The top direction is parallel to the beam axis
///
/// The N and R axes are undefined in this case.
#[derive(Copy, Clone, Debug, PartialEq, Error)]
#[error("Top quark along the beam axis (cos θ = {cos_theta}): N and R axes are undefined")]
pub struct DegenerateBasis {
    pub cos_theta: f64,
}

/// Orthonormal helicity basis
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HelicityBasis {
    /// Top direction in the ttbar rest frame
    pub k: ThreeVector,
    /// Normal to the production plane
    pub n: ThreeVector,
    /// In the production plane, orthogonal to K
    pub r: ThreeVector,
    /// Sign of cos θ, +1 for θ = π/2
    pub mask: f64,
}

impl HelicityBasis {
    /// Construct the basis from the top direction `k`
    pub fn new(k: &ThreeVector) -> Result<Self, DegenerateBasis> {
        let k = k.unit();
        let z = ThreeVector::beam_axis();
        let cos_theta = z.dot(&k);
        let sin_theta = (1. - cos_theta * cos_theta).max(0.).sqrt();
        // also catches NaN from a vanishing top momentum
        if !(sin_theta >= MIN_SIN_THETA) {
            return Err(DegenerateBasis { cos_theta });
        }
        let n = z.cross(&k) / sin_theta;
        let r = (z - cos_theta * k) / sin_theta;
        let mask = if cos_theta < 0. { -1. } else { 1. };
        Ok(Self { k, n, r, mask })
    }
}

/// Angular observables of a dileptonic ttbar event
///
/// The `_plus` cosines refer to the positively charged lepton in the top
/// rest frame, the `_minus` cosines to the negatively charged lepton in
/// the top antiquark rest frame.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpinObservables {
    pub cos_k_plus: f64,
    pub cos_k_minus: f64,
    pub cos_n_plus: f64,
    pub cos_n_minus: f64,
    pub cos_r_plus: f64,
    pub cos_r_minus: f64,
    /// Opening angle of the leptons in the ttbar rest frame
    pub cos_phi: f64,
    /// Opening angle of the leptons in the lab frame
    pub cos_phi_lab: f64,
    /// Azimuthal separation of the leptons in the lab frame
    pub dphi_ll: f64,
    /// Whether the N and R cosines are missing because of a [DegenerateBasis]
    pub degenerate_basis: bool,
}

impl SpinObservables {
    /// Compute all observables from lab frame four-momenta
    ///
    /// Any result that is not a number is replaced by [SENTINEL].
    pub fn compute(
        top: &FourVector,
        anti_top: &FourVector,
        lepton_plus: &FourVector,
        lepton_minus: &FourVector,
    ) -> Self {
        let to_ttbar = -(top + anti_top).boost_vector();
        let top_cm = top.boost(&to_ttbar);
        let anti_top_cm = anti_top.boost(&to_ttbar);
        let lp_cm = lepton_plus.boost(&to_ttbar);
        let lm_cm = lepton_minus.boost(&to_ttbar);

        let lp = lp_cm.boost(&-top_cm.boost_vector()).vect().unit();
        let lm = lm_cm.boost(&-anti_top_cm.boost_vector()).vect().unit();

        let cos_phi = lp_cm.vect().unit().dot(&lm_cm.vect().unit());
        let cos_phi_lab = lepton_plus.vect().unit().dot(&lepton_minus.vect().unit());
        let dphi_ll = lepton_plus.delta_phi(lepton_minus);

        let k = top_cm.vect().unit();
        let (cos_n, cos_r, degenerate_basis) = match HelicityBasis::new(&k) {
            Ok(basis) => {
                let n = basis.mask * basis.n;
                let r = basis.mask * basis.r;
                ((n.dot(&lp), -n.dot(&lm)), (r.dot(&lp), -r.dot(&lm)), false)
            }
            Err(err) => {
                debug!("{err}");
                ((SENTINEL, SENTINEL), (SENTINEL, SENTINEL), true)
            }
        };

        Self {
            cos_k_plus: or_sentinel(k.dot(&lp)),
            cos_k_minus: or_sentinel(-k.dot(&lm)),
            cos_n_plus: or_sentinel(cos_n.0),
            cos_n_minus: or_sentinel(cos_n.1),
            cos_r_plus: or_sentinel(cos_r.0),
            cos_r_minus: or_sentinel(cos_r.1),
            cos_phi: or_sentinel(cos_phi),
            cos_phi_lab: or_sentinel(cos_phi_lab),
            dphi_ll: or_sentinel(dphi_ll),
            degenerate_basis,
        }
    }

    /// The six helicity basis cosines
    pub fn cosines(&self) -> [f64; 6] {
        [
            self.cos_k_plus,
            self.cos_k_minus,
            self.cos_n_plus,
            self.cos_n_minus,
            self.cos_r_plus,
            self.cos_r_minus,
        ]
    }
}

/// Axis of the helicity basis
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    K,
    N,
    R,
}

/// Running averages of the helicity basis cosines over many events
///
/// The spin density matrix of the ttbar pair is estimated from these
/// averages: C_ij = −9⟨cos_i⁺ cos_j⁻⟩ and B_i± = −3⟨cos_i±⟩. Events with
/// any cosine missing are left out.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SpinCorrelations {
    events: usize,
    sum_plus: [f64; 3],
    sum_minus: [f64; 3],
    // [i][j] sums cos_i⁺ cos_j⁻
    sum_products: [[f64; 3]; 3],
}

impl SpinCorrelations {
    /// Add the cosines of one event
    ///
    /// Returns whether the event was used.
    pub fn add(&mut self, obs: &SpinObservables) -> bool {
        let plus = [obs.cos_k_plus, obs.cos_n_plus, obs.cos_r_plus];
        let minus = [obs.cos_k_minus, obs.cos_n_minus, obs.cos_r_minus];
        if plus.iter().chain(&minus).any(|&c| c == SENTINEL) {
            return false;
        }
        self.events += 1;
        for i in 0..3 {
            self.sum_plus[i] += plus[i];
            self.sum_minus[i] += minus[i];
            for j in 0..3 {
                self.sum_products[i][j] += plus[i] * minus[j];
            }
        }
        true
    }

    /// Number of events in the averages
    pub fn events(&self) -> usize {
        self.events
    }

    /// Spin correlation coefficient C_ij, not a number without events
    pub fn c(&self, plus: Axis, minus: Axis) -> f64 {
        -9. * self.sum_products[plus as usize][minus as usize] / self.events as f64
    }

    /// Polarisation B_i⁺ of the top quark
    pub fn b_plus(&self, axis: Axis) -> f64 {
        -3. * self.sum_plus[axis as usize] / self.events as f64
    }

    /// Polarisation B_i⁻ of the top antiquark
    pub fn b_minus(&self, axis: Axis) -> f64 {
        -3. * self.sum_minus[axis as usize] / self.events as f64
    }

    /// All coefficients, if any event was added
    pub fn coefficients(&self) -> Option<SpinCoefficients> {
        use Axis::*;
        if self.events == 0 {
            return None;
        }
        let axes = [K, N, R];
        Some(SpinCoefficients {
            c_kk: self.c(K, K),
            c_nn: self.c(N, N),
            c_rr: self.c(R, R),
            c_rk_plus: self.c(R, K) + self.c(K, R),
            c_rk_minus: self.c(R, K) - self.c(K, R),
            c_nr_plus: self.c(N, R) + self.c(R, N),
            c_nr_minus: self.c(N, R) - self.c(R, N),
            c_nk_plus: self.c(N, K) + self.c(K, N),
            c_nk_minus: self.c(N, K) - self.c(K, N),
            b_plus: axes.map(|a| self.b_plus(a)),
            b_minus: axes.map(|a| self.b_minus(a)),
        })
    }
}

/// Spin density matrix coefficients of the ttbar pair
///
/// Off-diagonal correlations are given as symmetric (`_plus`) and
/// antisymmetric (`_minus`) combinations, e.g. C_rk ± C_kr.
/// The polarisations are ordered (K, N, R).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpinCoefficients {
    pub c_kk: f64,
    pub c_nn: f64,
    pub c_rr: f64,
    pub c_rk_plus: f64,
    pub c_rk_minus: f64,
    pub c_nr_plus: f64,
    pub c_nr_minus: f64,
    pub c_nk_plus: f64,
    pub c_nk_minus: f64,
    pub b_plus: [f64; 3],
    pub b_minus: [f64; 3],
}

fn or_sentinel(x: f64) -> f64 {
    if x.is_nan() {
        SENTINEL
    } else {
        x
    }
}
