//! The flat output record of one event
use std::fmt::{self, Display};

use crate::classify::{ClassifiedEvent, Role};
use crate::data::{EventRecord, ParticleRecord, Reweight, RunInfo};
use crate::observables::SpinObservables;
use crate::reconstruct::{Kinematics, TopCandidate, TopPair};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single output cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Int(b.into())
    }
}

/// Name of an output column
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnName<'a> {
    Plain(&'static str),
    /// Object prefix and quantity, e.g. `top_pt`
    Field(&'static str, &'static str),
    /// Quantity of the first or second beam parton, e.g. `init_pz_1`
    Beam(&'static str, usize),
    /// Named reweighting factor
    Reweight(&'a str),
}

impl Display for ColumnName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnName::Plain(name) => f.write_str(name),
            ColumnName::Field(prefix, name) => write!(f, "{prefix}_{name}"),
            ColumnName::Beam(name, n) => write!(f, "init_{name}_{}", n + 1),
            ColumnName::Reweight(id) => write!(f, "rwgt_{id}"),
        }
    }
}

/// Longitudinal momentum, id, helicity and spin of a beam parton
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeamFields {
    pub pz: f64,
    pub pdg_id: i32,
    pub helicity: i32,
    pub spin: f64,
    /// Momentum fraction, if the beam energy is known
    pub x: Option<f64>,
}

impl BeamFields {
    pub fn new(parton: &ParticleRecord, run_info: Option<&RunInfo>) -> Self {
        let beam = if parton.pz() >= 0. { 0 } else { 1 };
        let x = run_info
            .map(|info| info.beam_energies[beam])
            .filter(|&energy| energy > 0.)
            .map(|energy| parton.e() / energy);
        Self {
            pz: parton.pz(),
            pdg_id: parton.id(),
            helicity: parton.helicity(),
            spin: parton.spin(),
            x,
        }
    }
}

/// Kinematics, id and spin of a particle in the decay chain
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParticleFields {
    pub kinematics: Kinematics,
    pub pdg_id: i32,
    pub spin: f64,
}

impl From<&ParticleRecord> for ParticleFields {
    fn from(p: &ParticleRecord) -> Self {
        Self {
            kinematics: p.into(),
            pdg_id: p.id(),
            spin: p.spin(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Quantity {
    Pt,
    Eta,
    Phi,
    E,
    M,
    PdgId,
    Spin,
}

impl Quantity {
    fn name(self) -> &'static str {
        match self {
            Quantity::Pt => "pt",
            Quantity::Eta => "eta",
            Quantity::Phi => "phi",
            Quantity::E => "e",
            Quantity::M => "m",
            Quantity::PdgId => "pdgid",
            Quantity::Spin => "spin",
        }
    }

    fn value(self, p: &ParticleFields) -> Value {
        match self {
            Quantity::Pt => p.kinematics.pt.into(),
            Quantity::Eta => p.kinematics.eta.into(),
            Quantity::Phi => p.kinematics.phi.into(),
            Quantity::E => p.kinematics.e.into(),
            Quantity::M => p.kinematics.m.into(),
            Quantity::PdgId => p.pdg_id.into(),
            Quantity::Spin => p.spin.into(),
        }
    }

    /// The quantities written out for each role
    fn for_role(role: Role) -> &'static [Quantity] {
        use Quantity::*;
        use Role::*;
        match role {
            WPlus | WMinus => &[Pt, Eta, Phi, E, M],
            Gluon | Bottom | AntiBottom | Top | AntiTop => &[Pt, Eta, Phi, E, M, Spin],
            LeptonPlus | LeptonMinus | Neutrino | AntiNeutrino => {
                &[Pt, Eta, Phi, E, M, PdgId, Spin]
            }
        }
    }
}

/// Decay products in the order of the output columns
const DECAY_PRODUCTS: [Role; 8] = [
    Role::Bottom,
    Role::AntiBottom,
    Role::WPlus,
    Role::WMinus,
    Role::LeptonPlus,
    Role::LeptonMinus,
    Role::Neutrino,
    Role::AntiNeutrino,
];

/// Everything written out for one event
///
/// Particles that are not in the event are `None` and give empty cells.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct EventRow {
    pub beams: [Option<BeamFields>; 2],
    pub weight: f64,
    pub reweights: Vec<Reweight>,
    pub tops: TopPair,
    pub gluon: Option<ParticleFields>,
    /// Present if both charged leptons are in the event
    pub spin: Option<SpinObservables>,
    particles: [Option<ParticleFields>; Role::ALL.len()],
}

impl EventRow {
    pub fn new(
        event: &EventRecord,
        classified: &ClassifiedEvent<'_>,
        tops: TopPair,
        spin: Option<SpinObservables>,
        run_info: Option<&RunInfo>,
    ) -> Self {
        let beams = classified
            .beams()
            .map(|parton| parton.map(|p| BeamFields::new(p, run_info)));
        let mut particles = [None; Role::ALL.len()];
        for role in DECAY_PRODUCTS {
            particles[role as usize] = classified.get(role).map(ParticleFields::from);
        }
        Self {
            beams,
            weight: event.weight(),
            reweights: event.reweights.clone(),
            tops,
            gluon: classified.get(Role::Gluon).map(ParticleFields::from),
            spin,
            particles,
        }
    }

    /// Output fields of a decay product
    pub fn particle(&self, role: Role) -> Option<&ParticleFields> {
        self.particles[role as usize].as_ref()
    }

    /// Weight of the reweighting factor with the given id
    pub fn reweight(&self, id: &str) -> Option<f64> {
        self.reweights
            .iter()
            .find(|rw| rw.id == id)
            .map(|rw| rw.weight)
    }

    /// Pass each column to `f`, in output order
    ///
    /// Reweighting factors are written for exactly the ids in
    /// `reweight_ids`, in that order.
    pub fn for_each_column<F>(&self, reweight_ids: &[String], mut f: F)
    where
        F: FnMut(ColumnName<'_>, Option<Value>),
    {
        type Getter = fn(&BeamFields) -> Option<Value>;
        const BEAM_COLUMNS: [(&str, Getter); 5] = [
            ("pz", |b| Some(b.pz.into())),
            ("pdgid", |b| Some(b.pdg_id.into())),
            ("hel", |b| Some(b.helicity.into())),
            ("spin", |b| Some(b.spin.into())),
            ("x", |b| b.x.map(Value::from)),
        ];
        for (name, get) in BEAM_COLUMNS {
            for (n, beam) in self.beams.iter().enumerate() {
                f(ColumnName::Beam(name, n), beam.as_ref().and_then(get));
            }
        }

        f(ColumnName::Plain("weight"), Some(self.weight.into()));
        for id in reweight_ids {
            f(ColumnName::Reweight(id), self.reweight(id).map(Value::from));
        }

        let mut top = |prefix, candidate: &TopCandidate| {
            composite(&mut f, prefix, &candidate.kinematics);
            f(ColumnName::Field("onshell", prefix), Some(candidate.on_shell.into()));
        };
        top(Role::Top.prefix(), &self.tops.top);
        top(Role::AntiTop.prefix(), &self.tops.anti_top);
        composite(&mut f, "ttbar", &self.tops.ttbar_kinematics);

        particle(&mut f, Role::Gluon, self.gluon.as_ref());

        let spin = self.spin.as_ref();
        type Observable = fn(&SpinObservables) -> f64;
        const SPIN_COLUMNS: [(&str, Observable); 9] = [
            ("cosp_hel", |s| s.cos_k_plus),
            ("cosm_hel", |s| s.cos_k_minus),
            ("cosp_trans", |s| s.cos_n_plus),
            ("cosm_trans", |s| s.cos_n_minus),
            ("cosp_raxis", |s| s.cos_r_plus),
            ("cosm_raxis", |s| s.cos_r_minus),
            ("cos_phi", |s| s.cos_phi),
            ("cos_phi_lab", |s| s.cos_phi_lab),
            ("dphi_ll", |s| s.dphi_ll),
        ];
        for (name, get) in SPIN_COLUMNS {
            f(ColumnName::Plain(name), spin.map(|s| Value::Float(get(s))));
        }

        for role in DECAY_PRODUCTS {
            particle(&mut f, role, self.particle(role));
        }
    }
}

fn composite<F>(f: &mut F, prefix: &'static str, k: &Kinematics)
where
    F: FnMut(ColumnName<'_>, Option<Value>),
{
    for (name, value) in [
        ("pt", k.pt),
        ("eta", k.eta),
        ("phi", k.phi),
        ("e", k.e),
        ("m", k.m),
        ("y", k.y),
    ] {
        f(ColumnName::Field(prefix, name), Some(value.into()));
    }
}

fn particle<F>(f: &mut F, role: Role, p: Option<&ParticleFields>)
where
    F: FnMut(ColumnName<'_>, Option<Value>),
{
    for &q in Quantity::for_role(role) {
        f(ColumnName::Field(role.prefix(), q.name()), p.map(|p| q.value(p)));
    }
}
