use std::collections::HashMap;

use crate::kinematics::{self, FourVector};
use crate::status::Status;

pub type XmlAttr = HashMap<String, String>;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Generator run information from the `<init>` block
///
/// See <https://arxiv.org/abs/hep-ph/0109068v1> for details on the fields.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RunInfo {
    /// Beam PDG ids
    pub beam_ids: [i32; 2],
    /// Beam energies in GeV
    pub beam_energies: [f64; 2],
    /// PDF author groups
    pub pdf_groups: [i32; 2],
    /// PDF set ids
    pub pdf_sets: [i32; 2],
    /// How the event weights are to be interpreted
    pub weight_strategy: i32,
    /// Subprocess information
    pub subprocesses: Vec<Subprocess>,
    /// Optional run information
    pub info: String,
    /// Attributes in `<init>` tag
    pub attr: XmlAttr,
}

/// Cross section information for one subprocess
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Subprocess {
    /// Cross section in pb
    pub xs: f64,
    /// Statistical cross section error in pb
    pub xs_err: f64,
    /// Maximum event weight
    pub max_weight: f64,
    /// Process id
    pub id: i32,
}

/// One particle line of an event block, as written by the generator
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ParticleLine {
    /// PDG particle id
    pub id: i32,
    /// Status code
    pub status: i32,
    /// 1-based indices of the mothers, 0 if absent
    pub mothers: [i32; 2],
    /// Colour flow
    pub colour: [i32; 2],
    /// Momentum (px, py, pz, E) in GeV
    pub p: [f64; 4],
    /// Mass in GeV
    pub m: f64,
    /// Lifetime in mm
    pub lifetime: f64,
    /// Spin angle, conventionally ±1
    pub spin: f64,
}

/// A particle with its derived kinematics
///
/// The derived quantities are computed once from the stored momentum,
/// energy and spin. The record cannot be modified after construction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone)]
pub struct ParticleRecord {
    index: usize,
    line: ParticleLine,
    p: f64,
    pt: f64,
    theta: f64,
    phi: f64,
    eta: f64,
    y: f64,
    helicity: i32,
}

/// Helicity label of a left-handed particle
pub const HELICITY_LEFT: i32 = 3;
/// Helicity label of a right-handed particle
pub const HELICITY_RIGHT: i32 = -3;

impl ParticleRecord {
    /// Wrap a particle line found at position `index` in its event
    pub fn new(index: usize, line: ParticleLine) -> Self {
        let [px, py, pz, e] = line.p;
        let pt = px.hypot(py);
        let helicity = if line.spin * pz > 0. {
            HELICITY_RIGHT
        } else {
            HELICITY_LEFT
        };
        Self {
            index,
            p: (pt * pt + pz * pz).sqrt(),
            pt,
            theta: kinematics::polar_angle(pt, pz),
            phi: kinematics::azimuth(px, py),
            eta: kinematics::pseudorapidity(pt, pz),
            y: kinematics::rapidity(e, pz),
            helicity,
            line,
        }
    }

    /// Position among the particles of the event, starting at 0
    pub fn index(&self) -> usize {
        self.index
    }

    /// The particle line this record was built from
    pub fn line(&self) -> &ParticleLine {
        &self.line
    }

    pub fn id(&self) -> i32 {
        self.line.id
    }

    pub fn status(&self) -> Status {
        Status::from(self.line.status)
    }

    pub fn px(&self) -> f64 {
        self.line.p[0]
    }

    pub fn py(&self) -> f64 {
        self.line.p[1]
    }

    pub fn pz(&self) -> f64 {
        self.line.p[2]
    }

    pub fn e(&self) -> f64 {
        self.line.p[3]
    }

    /// Mass as given in the event record
    pub fn m(&self) -> f64 {
        self.line.m
    }

    pub fn spin(&self) -> f64 {
        self.line.spin
    }

    /// Magnitude of the three-momentum
    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn pt(&self) -> f64 {
        self.pt
    }

    /// Polar angle with respect to the beam axis
    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn phi(&self) -> f64 {
        self.phi
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn rapidity(&self) -> f64 {
        self.y
    }

    /// [HELICITY_LEFT] or [HELICITY_RIGHT]
    pub fn helicity(&self) -> i32 {
        self.helicity
    }

    /// Four-momentum built from the recorded Cartesian components
    pub fn four_momentum(&self) -> FourVector {
        let [px, py, pz, e] = self.line.p;
        FourVector::new(px, py, pz, e)
    }
}

/// Contents of the first line of an event block
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct EventHeader {
    /// Number of particles
    pub nparticles: i32,
    /// Process id
    pub process_id: i32,
    /// Nominal event weight
    pub weight: f64,
    /// Scale in GeV
    pub scale: f64,
    /// Value of the QED coupling α
    pub alpha_qed: f64,
    /// Value of the QCD coupling α_s
    pub alpha_qcd: f64,
}

/// Named reweighting factor from the `<rwgt>` block
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone)]
pub struct Reweight {
    pub id: String,
    pub weight: f64,
}

/// A decoded event block
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(PartialEq, Debug, Clone, Default)]
pub struct EventRecord {
    pub header: EventHeader,
    /// All particles, starting with the two incoming beam partons
    pub particles: Vec<ParticleRecord>,
    pub reweights: Vec<Reweight>,
    /// Optional event information following the particles
    pub info: String,
    /// Attributes in `<event>` tag
    pub attr: XmlAttr,
}

/// Number of leading particles that are incoming beam partons
pub const NUM_BEAMS: usize = 2;

impl EventRecord {
    /// Nominal event weight
    pub fn weight(&self) -> f64 {
        self.header.weight
    }

    /// The incoming beam partons
    pub fn beams(&self) -> &[ParticleRecord] {
        &self.particles[..NUM_BEAMS.min(self.particles.len())]
    }

    /// All particles after the beam partons
    pub fn products(&self) -> &[ParticleRecord] {
        &self.particles[NUM_BEAMS.min(self.particles.len())..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn record(p: [f64; 4], m: f64, spin: f64) -> ParticleRecord {
        ParticleRecord::new(0, ParticleLine { id: 6, status: 1, p, m, spin, ..Default::default() })
    }

    #[test]
    fn derived_kinematics() {
        let t = record([30., -40., 120., 250.], 172.5, 1.);
        assert_eq!(t.pt(), 50.);
        assert_eq!(t.p(), 130.);
        assert_abs_diff_eq!(t.theta(), (120f64 / 130.).acos(), epsilon = 1e-12);
        assert_abs_diff_eq!(t.phi(), -(30f64 / 50.).acos(), epsilon = 1e-12);
        assert_abs_diff_eq!(t.eta(), -(t.theta() / 2.).tan().ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(t.rapidity(), 0.5 * (370f64 / 130.).ln(), epsilon = 1e-12);
        assert_eq!(t.helicity(), HELICITY_RIGHT);
        assert_eq!(t.m(), 172.5);
        assert_eq!(t.status(), Status::Outgoing);
    }

    #[test]
    fn along_beam_axis() {
        let t = record([0., 0., 100., 250.], 172.5, 1.);
        assert_eq!(t.phi(), 0.);
        assert_eq!(t.eta(), kinematics::ETA_SATURATION);
        assert_eq!(t.theta(), 0.);
        let tbar = record([0., 0., -100., 250.], 172.5, 1.);
        assert_eq!(tbar.eta(), -kinematics::ETA_SATURATION);
        assert_eq!(tbar.theta(), PI);
        assert_eq!(tbar.helicity(), HELICITY_LEFT);
    }

    #[test]
    fn massless_along_beam() {
        let g = record([0., 0., 125., 125.], 0., -1.);
        assert_eq!(g.rapidity(), 0.);
        assert_eq!(g.helicity(), HELICITY_LEFT);
        let g = record([0., 0., -125., 125.], 0., -1.);
        assert_eq!(g.helicity(), HELICITY_RIGHT);
    }

    #[test]
    fn slices() {
        let event = EventRecord {
            particles: vec![
                record([0., 0., 1., 1.], 0., 1.),
                record([0., 0., -1., 1.], 0., 1.),
                record([0., 0., 0., 2.], 2., 1.),
            ],
            ..Default::default()
        };
        assert_eq!(event.beams().len(), 2);
        assert_eq!(event.products().len(), 1);
        let empty = EventRecord::default();
        assert!(empty.beams().is_empty());
        assert!(empty.products().is_empty());
    }
}
