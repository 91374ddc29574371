#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Incoming particle
pub const INCOMING: i32 = -1;
/// Outgoing final state particle
pub const OUTGOING: i32 = 1;
/// Intermediate space-like propagator defining an x and Q^2 which should be preserved
pub const INTERMEDIATE_SPACELIKE: i32 = -2;
/// Intermediate resonance, mass should be preserved
pub const INTERMEDIATE_RESONANCE: i32 = 2;
/// Intermediate resonance, for documentation only
pub const INTERMEDIATE_DOC: i32 = 3;
/// Incoming beam particles at time t = −∞
pub const INCOMING_BEAM: i32 = -9;

/// Particle status as recorded in the `ISTUP` column
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub enum Status {
    Incoming,
    Outgoing,
    IntermediateSpacelike,
    IntermediateResonance,
    IntermediateDoc,
    IncomingBeam,
    Unknown(i32),
}

impl From<i32> for Status {
    fn from(status: i32) -> Self {
        use Status::*;
        match status {
            INCOMING => Incoming,
            OUTGOING => Outgoing,
            INTERMEDIATE_SPACELIKE => IntermediateSpacelike,
            INTERMEDIATE_RESONANCE => IntermediateResonance,
            INTERMEDIATE_DOC => IntermediateDoc,
            INCOMING_BEAM => IncomingBeam,
            s => Unknown(s),
        }
    }
}

impl Status {
    /// Whether the particle enters the hard process
    pub fn is_incoming(self) -> bool {
        matches!(self, Status::Incoming | Status::IncomingBeam)
    }

    /// Whether the particle is in the final state
    pub fn is_final_state(self) -> bool {
        self == Status::Outgoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(Status::from(-1), Status::Incoming);
        assert_eq!(Status::from(1), Status::Outgoing);
        assert_eq!(Status::from(2), Status::IntermediateResonance);
        assert_eq!(Status::from(-9), Status::IncomingBeam);
        assert_eq!(Status::from(7), Status::Unknown(7));
        assert!(Status::from(-9).is_incoming());
        assert!(!Status::from(2).is_final_state());
    }
}
