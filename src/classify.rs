//! Assignment of particles to their role in the ttbar decay chain
use std::fmt::{self, Display};

use log::{debug, trace};

use crate::data::{EventRecord, ParticleRecord};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const TOP: i32 = 6;
pub const BOTTOM: i32 = 5;
pub const W_PLUS: i32 = 24;
pub const GLUON: i32 = 21;
pub const CHARGED_LEPTONS: [i32; 3] = [11, 13, 15];
pub const NEUTRINOS: [i32; 3] = [12, 14, 16];

/// Role of a particle in a (di)leptonic ttbar event
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum Role {
    Top,
    AntiTop,
    Bottom,
    AntiBottom,
    WPlus,
    WMinus,
    /// e⁻, μ⁻, τ⁻
    LeptonMinus,
    /// e⁺, μ⁺, τ⁺
    LeptonPlus,
    Neutrino,
    AntiNeutrino,
    Gluon,
}

impl Role {
    pub const ALL: [Role; 11] = [
        Role::Top,
        Role::AntiTop,
        Role::Bottom,
        Role::AntiBottom,
        Role::WPlus,
        Role::WMinus,
        Role::LeptonMinus,
        Role::LeptonPlus,
        Role::Neutrino,
        Role::AntiNeutrino,
        Role::Gluon,
    ];

    /// Look up the role of a PDG id
    ///
    /// Particles without a role in the ttbar decay chain give `None`.
    pub fn from_pdg_id(id: i32) -> Option<Self> {
        use Role::*;
        let role = match id {
            TOP => Top,
            id if id == -TOP => AntiTop,
            BOTTOM => Bottom,
            id if id == -BOTTOM => AntiBottom,
            W_PLUS => WPlus,
            id if id == -W_PLUS => WMinus,
            id if CHARGED_LEPTONS.contains(&id) => LeptonMinus,
            id if CHARGED_LEPTONS.contains(&-id) => LeptonPlus,
            id if NEUTRINOS.contains(&id) => Neutrino,
            id if NEUTRINOS.contains(&-id) => AntiNeutrino,
            id if id.abs() == GLUON => Gluon,
            _ => return None,
        };
        Some(role)
    }

    /// Prefix of the output columns for particles with this role
    pub fn prefix(self) -> &'static str {
        use Role::*;
        match self {
            Top => "top",
            AntiTop => "tbar",
            Bottom => "b",
            AntiBottom => "bbar",
            WPlus => "Wp",
            WMinus => "Wm",
            LeptonMinus => "lm",
            LeptonPlus => "lp",
            Neutrino => "v",
            AntiNeutrino => "vbar",
            Gluon => "G",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Role::*;
        let name = match self {
            Top => "top quark",
            AntiTop => "top antiquark",
            Bottom => "bottom quark",
            AntiBottom => "bottom antiquark",
            WPlus => "W⁺ boson",
            WMinus => "W⁻ boson",
            LeptonMinus => "negatively charged lepton",
            LeptonPlus => "positively charged lepton",
            Neutrino => "neutrino",
            AntiNeutrino => "antineutrino",
            Gluon => "gluon",
        };
        f.write_str(name)
    }
}

/// The particles of an event sorted by role
///
/// Only the first particle found for each role is kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassifiedEvent<'a> {
    beams: [Option<&'a ParticleRecord>; 2],
    first: [Option<&'a ParticleRecord>; Role::ALL.len()],
    multiplicity: [usize; Role::ALL.len()],
    unclassified: usize,
}

impl<'a> ClassifiedEvent<'a> {
    /// Sort the particles of an event
    ///
    /// The first two particles are the beam partons and are set aside
    /// regardless of their id; particles without a role are dropped.
    pub fn new(event: &'a EventRecord) -> Self {
        let mut classified = Self::default();
        for (slot, beam) in classified.beams.iter_mut().zip(event.beams()) {
            if !beam.status().is_incoming() {
                debug!("Beam parton {} has status {:?}", beam.index(), beam.status());
            }
            *slot = Some(beam);
        }
        for particle in event.products() {
            let Some(role) = Role::from_pdg_id(particle.id()) else {
                trace!("Particle {} with id {} has no role", particle.index(), particle.id());
                classified.unclassified += 1;
                continue;
            };
            let idx = role as usize;
            classified.multiplicity[idx] += 1;
            if classified.first[idx].is_none() {
                classified.first[idx] = Some(particle);
            }
        }
        classified
    }

    /// The beam partons in the order in which they appear
    pub fn beams(&self) -> [Option<&'a ParticleRecord>; 2] {
        self.beams
    }

    /// The first particle with the given role
    pub fn get(&self, role: Role) -> Option<&'a ParticleRecord> {
        self.first[role as usize]
    }

    pub fn has(&self, role: Role) -> bool {
        self.get(role).is_some()
    }

    /// How many particles have the given role
    pub fn multiplicity(&self, role: Role) -> usize {
        self.multiplicity[role as usize]
    }

    /// Number of dropped particles without a role
    pub fn unclassified(&self) -> usize {
        self.unclassified
    }

    /// Whether all particles with a role are in the final state
    pub fn is_final_state(&self) -> bool {
        self.first
            .iter()
            .flatten()
            .all(|p| p.status().is_final_state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ParticleLine;

    fn event(ids: &[i32]) -> EventRecord {
        let particles = ids
            .iter()
            .enumerate()
            .map(|(n, &id)| {
                let status = if n < 2 { -1 } else { 1 };
                let line = ParticleLine {
                    id,
                    status,
                    p: [0., 0., n as f64, 1. + n as f64],
                    ..Default::default()
                };
                ParticleRecord::new(n, line)
            })
            .collect();
        EventRecord { particles, ..Default::default() }
    }

    #[test]
    fn classification_table() {
        use Role::*;
        let expected = [
            (6, Some(Top)),
            (-6, Some(AntiTop)),
            (5, Some(Bottom)),
            (-5, Some(AntiBottom)),
            (24, Some(WPlus)),
            (-24, Some(WMinus)),
            (11, Some(LeptonMinus)),
            (13, Some(LeptonMinus)),
            (15, Some(LeptonMinus)),
            (-11, Some(LeptonPlus)),
            (-13, Some(LeptonPlus)),
            (-15, Some(LeptonPlus)),
            (12, Some(Neutrino)),
            (14, Some(Neutrino)),
            (16, Some(Neutrino)),
            (-12, Some(AntiNeutrino)),
            (-14, Some(AntiNeutrino)),
            (-16, Some(AntiNeutrino)),
            (21, Some(Gluon)),
            (-21, Some(Gluon)),
            (1, None),
            (-2, None),
            (22, None),
            (23, None),
            (25, None),
            (0, None),
        ];
        for (id, role) in expected {
            assert_eq!(Role::from_pdg_id(id), role, "id {id}");
        }
    }

    #[test]
    fn beams_are_not_classified() {
        let ev = event(&[21, 21, 6, -6]);
        let classified = ClassifiedEvent::new(&ev);
        let [b1, b2] = classified.beams();
        assert_eq!(b1.unwrap().index(), 0);
        assert_eq!(b2.unwrap().index(), 1);
        assert!(!classified.has(Role::Gluon));
        assert_eq!(classified.get(Role::Top).unwrap().index(), 2);
        assert_eq!(classified.get(Role::AntiTop).unwrap().index(), 3);
        assert!(classified.is_final_state());
    }

    #[test]
    fn first_match_is_kept() {
        let ev = event(&[2, -2, -11, 21, -13, 22, 21, 25]);
        let classified = ClassifiedEvent::new(&ev);
        assert_eq!(classified.get(Role::LeptonPlus).unwrap().id(), -11);
        assert_eq!(classified.multiplicity(Role::LeptonPlus), 2);
        assert_eq!(classified.get(Role::Gluon).unwrap().index(), 3);
        assert_eq!(classified.multiplicity(Role::Gluon), 2);
        assert_eq!(classified.unclassified(), 2);
        assert!(!classified.has(Role::Top));
    }

    #[test]
    fn short_events() {
        let ev = event(&[21]);
        let classified = ClassifiedEvent::new(&ev);
        let [b1, b2] = classified.beams();
        assert!(b1.is_some());
        assert!(b2.is_none());
        assert!(Role::ALL.iter().all(|&r| !classified.has(r)));
    }

    #[test]
    fn roles_are_indexed_in_order() {
        for (n, role) in Role::ALL.into_iter().enumerate() {
            assert_eq!(role as usize, n);
        }
    }
}
