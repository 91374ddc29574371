//! Reconstruction of the top, anti-top and ttbar four-momenta
use std::fmt::{self, Display};

use itertools::Itertools;
use thiserror::Error;

use crate::classify::{ClassifiedEvent, Role};
use crate::data::ParticleRecord;
use crate::kinematics::FourVector;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// pT, η, φ, E, m and rapidity of an object
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Kinematics {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub e: f64,
    pub m: f64,
    pub y: f64,
}

impl From<&ParticleRecord> for Kinematics {
    fn from(p: &ParticleRecord) -> Self {
        Self {
            pt: p.pt(),
            eta: p.eta(),
            phi: p.phi(),
            e: p.e(),
            m: p.m(),
            y: p.rapidity(),
        }
    }
}

impl From<&FourVector> for Kinematics {
    fn from(p: &FourVector) -> Self {
        Self {
            pt: p.pt(),
            eta: p.eta(),
            phi: p.phi(),
            e: p.e,
            m: p.m(),
            y: p.rapidity(),
        }
    }
}

/// Top quark or antiquark side of the event
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    Top,
    AntiTop,
}

impl Side {
    /// The role of the quark itself
    pub fn quark(self) -> Role {
        match self {
            Side::Top => Role::Top,
            Side::AntiTop => Role::AntiTop,
        }
    }

    /// Lepton, neutrino and bottom from the leptonic decay of this side
    pub fn decay_products(self) -> [Role; 3] {
        use Role::*;
        match self {
            Side::Top => [LeptonPlus, Neutrino, Bottom],
            Side::AntiTop => [LeptonMinus, AntiNeutrino, AntiBottom],
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.quark().fmt(f)
    }
}

/// Neither the quark nor all its decay products are in the event
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error(
    "Cannot reconstruct {side}: no direct record and missing {}",
    .missing.iter().join(", ")
)]
pub struct IncompleteTopology {
    pub side: Side,
    pub missing: Vec<Role>,
}

/// A reconstructed top quark or antiquark
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TopCandidate {
    pub p: FourVector,
    pub kinematics: Kinematics,
    /// Whether the quark was found directly in the event record
    pub on_shell: bool,
}

impl TopCandidate {
    /// Find or synthesize the quark on the given side of the event
    ///
    /// A direct record is used as it is. Otherwise the quark is the sum of
    /// its leptonic decay products, which then all have to be present.
    pub fn reconstruct(
        event: &ClassifiedEvent<'_>,
        side: Side,
    ) -> Result<Self, IncompleteTopology> {
        if let Some(quark) = event.get(side.quark()) {
            return Ok(Self {
                p: quark.four_momentum(),
                kinematics: quark.into(),
                on_shell: true,
            });
        }
        let roles = side.decay_products();
        let missing: Vec<_> = roles.into_iter().filter(|&r| !event.has(r)).collect();
        if !missing.is_empty() {
            return Err(IncompleteTopology { side, missing });
        }
        let p: FourVector = roles
            .into_iter()
            .filter_map(|r| event.get(r))
            .map(ParticleRecord::four_momentum)
            .sum();
        Ok(Self {
            p,
            kinematics: (&p).into(),
            on_shell: false,
        })
    }
}

/// Top quark, top antiquark and their sum
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TopPair {
    pub top: TopCandidate,
    pub anti_top: TopCandidate,
    pub ttbar: FourVector,
    pub ttbar_kinematics: Kinematics,
}

impl TopPair {
    pub fn reconstruct(event: &ClassifiedEvent<'_>) -> Result<Self, IncompleteTopology> {
        let top = TopCandidate::reconstruct(event, Side::Top)?;
        let anti_top = TopCandidate::reconstruct(event, Side::AntiTop)?;
        let ttbar = top.p + anti_top.p;
        Ok(Self {
            top,
            anti_top,
            ttbar,
            ttbar_kinematics: (&ttbar).into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EventRecord, ParticleLine};
    use approx::assert_abs_diff_eq;

    fn particle(n: usize, id: i32, p: [f64; 4], m: f64) -> ParticleRecord {
        ParticleRecord::new(n, ParticleLine { id, status: 1, p, m, ..Default::default() })
    }

    fn event(particles: &[(i32, [f64; 4], f64)]) -> EventRecord {
        let mut all = vec![
            particle(0, 21, [0., 0., 300., 300.], 0.),
            particle(1, 21, [0., 0., -300., 300.], 0.),
        ];
        for (id, p, m) in particles {
            all.push(particle(all.len(), *id, *p, *m));
        }
        EventRecord { particles: all, ..Default::default() }
    }

    fn assert_kinematics_eq(a: &Kinematics, b: &Kinematics) {
        assert_abs_diff_eq!(a.pt, b.pt, epsilon = 1e-9);
        assert_abs_diff_eq!(a.eta, b.eta, epsilon = 1e-9);
        assert_abs_diff_eq!(a.phi, b.phi, epsilon = 1e-9);
        assert_abs_diff_eq!(a.e, b.e, epsilon = 1e-9);
        assert_abs_diff_eq!(a.m, b.m, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
    }

    // t → e⁺ νe b and t̄ → μ⁻ ν̄μ b̄ with pT along x
    const TOP: [f64; 4] = [120., 0., 0., 200.];
    const ANTI_TOP: [f64; 4] = [-120., 0., 0., 200.];
    const DECAYS: [(i32, [f64; 4], f64); 6] = [
        (-11, [30., 0., 40., 50.], 0.),
        (12, [0., 0., -40., 40.], 0.),
        (5, [90., 0., 0., 110.], 63.245553203367585),
        (13, [-30., 0., -40., 50.], 0.),
        (-14, [0., 0., 40., 40.], 0.),
        (-5, [-90., 0., 0., 110.], 63.245553203367585),
    ];

    #[test]
    fn direct_records() {
        let ev = event(&[(6, TOP, 160.), (-6, ANTI_TOP, 160.)]);
        let pair = TopPair::reconstruct(&ClassifiedEvent::new(&ev)).unwrap();
        assert!(pair.top.on_shell);
        assert!(pair.anti_top.on_shell);
        assert_eq!(pair.top.kinematics, Kinematics::from(&ev.particles[2]));
        assert_eq!(pair.ttbar, FourVector::new(0., 0., 0., 400.));
        assert_eq!(pair.ttbar_kinematics.m, 400.);
        assert_eq!(pair.ttbar_kinematics.y, 0.);
    }

    #[test]
    fn from_decay_products() {
        let ev = event(&DECAYS);
        let pair = TopPair::reconstruct(&ClassifiedEvent::new(&ev)).unwrap();
        assert!(!pair.top.on_shell);
        assert!(!pair.anti_top.on_shell);
        assert_eq!(pair.top.p, FourVector::new(120., 0., 0., 200.));
        assert_eq!(pair.anti_top.p, FourVector::new(-120., 0., 0., 200.));
        assert_abs_diff_eq!(pair.top.kinematics.m, 160., epsilon = 1e-12);
        assert_abs_diff_eq!(pair.top.kinematics.pt, 120., epsilon = 1e-12);
        assert_abs_diff_eq!(pair.top.kinematics.eta, 0., epsilon = 1e-12);
        assert_eq!(pair.anti_top.kinematics.phi, std::f64::consts::PI);
    }

    #[test]
    fn reconstruction_path_independence() {
        let direct = event(&[(6, TOP, 160.), (-6, ANTI_TOP, 160.)]);
        let direct = TopPair::reconstruct(&ClassifiedEvent::new(&direct)).unwrap();
        let decayed = event(&DECAYS);
        let decayed = TopPair::reconstruct(&ClassifiedEvent::new(&decayed)).unwrap();
        assert_kinematics_eq(&direct.ttbar_kinematics, &decayed.ttbar_kinematics);
        assert_kinematics_eq(&direct.top.kinematics, &decayed.top.kinematics);
        assert_kinematics_eq(&direct.anti_top.kinematics, &decayed.anti_top.kinematics);

        // one side direct, the other reconstructed
        let mut mixed: Vec<_> = DECAYS[..3].to_vec();
        mixed.push((-6, ANTI_TOP, 160.));
        let mixed = event(&mixed);
        let mixed = TopPair::reconstruct(&ClassifiedEvent::new(&mixed)).unwrap();
        assert!(!mixed.top.on_shell);
        assert!(mixed.anti_top.on_shell);
        assert_kinematics_eq(&direct.ttbar_kinematics, &mixed.ttbar_kinematics);
    }

    #[test]
    fn direct_record_takes_precedence() {
        let mut particles = DECAYS.to_vec();
        particles.push((6, TOP, 160.));
        let ev = event(&particles);
        let pair = TopPair::reconstruct(&ClassifiedEvent::new(&ev)).unwrap();
        assert!(pair.top.on_shell);
        assert!(!pair.anti_top.on_shell);
    }

    #[test]
    fn incomplete_topology() {
        let ev = event(&[(6, TOP, 160.), (13, [-30., 0., -40., 50.], 0.)]);
        let err = TopPair::reconstruct(&ClassifiedEvent::new(&ev)).unwrap_err();
        assert_eq!(err.side, Side::AntiTop);
        assert_eq!(err.missing, vec![Role::AntiNeutrino, Role::AntiBottom]);
        assert!(err.to_string().contains("antineutrino, bottom antiquark"));

        let ev = event(&[]);
        let err = TopPair::reconstruct(&ClassifiedEvent::new(&ev)).unwrap_err();
        assert_eq!(err.side, Side::Top);
        assert_eq!(err.missing.len(), 3);
    }
}
