//! Three- and four-vector value types
//!
//! All operations return new vectors; nothing is modified in place.
use std::f64::consts::PI;

use auto_ops::{impl_op_ex, impl_op_ex_commutative};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Value reported for the pseudorapidity of particles along the beam axis
pub const ETA_SATURATION: f64 = 9999.;

/// Cartesian three-vector
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ThreeVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ThreeVector {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Unit vector along the beam axis
    pub const fn beam_axis() -> Self {
        Self::new(0., 0., 1.)
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn mag2(&self) -> f64 {
        self.dot(self)
    }

    pub fn mag(&self) -> f64 {
        self.mag2().sqrt()
    }

    /// Unit vector in the same direction
    ///
    /// The zero vector has no direction, all components are NaN.
    pub fn unit(&self) -> Self {
        *self / self.mag()
    }
}

impl_op_ex!(+ |a: &ThreeVector, b: &ThreeVector| -> ThreeVector {
    ThreeVector::new(a.x + b.x, a.y + b.y, a.z + b.z)
});
impl_op_ex!(- |a: &ThreeVector, b: &ThreeVector| -> ThreeVector {
    ThreeVector::new(a.x - b.x, a.y - b.y, a.z - b.z)
});
impl_op_ex!(- |a: &ThreeVector| -> ThreeVector {
    ThreeVector::new(-a.x, -a.y, -a.z)
});
impl_op_ex_commutative!(* |a: &ThreeVector, b: &f64| -> ThreeVector {
    ThreeVector::new(a.x * b, a.y * b, a.z * b)
});
impl_op_ex!(/ |a: &ThreeVector, b: &f64| -> ThreeVector {
    ThreeVector::new(a.x / b, a.y / b, a.z / b)
});

/// Four-momentum (px, py, pz, E) in GeV
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FourVector {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourVector {
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Construct from transverse momentum, pseudorapidity, azimuth and mass
    ///
    /// A negative mass is interpreted as a space-like vector with
    /// m² = -mass², clamped so that the energy stays real.
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let px = pt * phi.cos();
        let py = pt * phi.sin();
        let pz = pt * eta.sinh();
        let p2 = px * px + py * py + pz * pz;
        let e = if m >= 0. {
            (p2 + m * m).sqrt()
        } else {
            (p2 - m * m).max(0.).sqrt()
        };
        Self::new(px, py, pz, e)
    }

    pub fn vect(&self) -> ThreeVector {
        ThreeVector::new(self.px, self.py, self.pz)
    }

    /// Magnitude of the three-momentum
    pub fn p(&self) -> f64 {
        self.vect().mag()
    }

    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    pub fn eta(&self) -> f64 {
        pseudorapidity(self.pt(), self.pz)
    }

    pub fn phi(&self) -> f64 {
        azimuth(self.px, self.py)
    }

    pub fn rapidity(&self) -> f64 {
        rapidity(self.e, self.pz)
    }

    pub fn m2(&self) -> f64 {
        self.e * self.e - self.vect().mag2()
    }

    /// Invariant mass
    ///
    /// Space-like vectors get a negative mass -√(-m²), so that small
    /// numerical noise around zero stays visible instead of turning into
    /// NaN.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0. {
            -(-m2).sqrt()
        } else {
            m2.sqrt()
        }
    }

    /// Velocity of the frame in which this four-momentum is at rest
    pub fn boost_vector(&self) -> ThreeVector {
        self.vect() / self.e
    }

    /// Lorentz boost by the velocity `beta`
    ///
    /// Boosting by `-p.boost_vector()` brings `p` to rest.
    pub fn boost(&self, beta: &ThreeVector) -> Self {
        let b2 = beta.mag2();
        if b2 == 0. {
            return *self;
        }
        let gamma = 1. / (1. - b2).sqrt();
        let bp = beta.dot(&self.vect());
        let gamma2 = (gamma - 1.) / b2;
        let p3 = self.vect() + beta * (gamma2 * bp + gamma * self.e);
        Self::new(p3.x, p3.y, p3.z, gamma * (self.e + bp))
    }

    /// Azimuthal separation, in the range (-π, π]
    pub fn delta_phi(&self, other: &Self) -> f64 {
        wrap_phi(self.phi() - other.phi())
    }
}

impl_op_ex!(+ |a: &FourVector, b: &FourVector| -> FourVector {
    FourVector::new(a.px + b.px, a.py + b.py, a.pz + b.pz, a.e + b.e)
});
impl_op_ex!(- |a: &FourVector, b: &FourVector| -> FourVector {
    FourVector::new(a.px - b.px, a.py - b.py, a.pz - b.pz, a.e - b.e)
});

impl std::iter::Sum for FourVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, p| acc + p)
    }
}

/// Azimuthal angle in (-π, π], signed by `py` and zero for vanishing
/// transverse momentum
pub fn azimuth(px: f64, py: f64) -> f64 {
    let pt = px.hypot(py);
    if pt == 0. {
        return 0.;
    }
    let phi = (px / pt).clamp(-1., 1.).acos();
    if py < 0. {
        -phi
    } else {
        phi
    }
}

/// Polar angle with respect to the beam axis
pub fn polar_angle(pt: f64, pz: f64) -> f64 {
    pt.atan2(pz)
}

/// Pseudorapidity -ln(tan(θ/2))
///
/// Saturates at ±[ETA_SATURATION] along the beam axis.
pub fn pseudorapidity(pt: f64, pz: f64) -> f64 {
    let theta = polar_angle(pt, pz);
    if theta == 0. || theta == PI {
        return ETA_SATURATION.copysign(pz);
    }
    -(theta / 2.).tan().ln()
}

/// Rapidity ½ ln((E + pz)/(E - pz)), zero outside the physical region
pub fn rapidity(e: f64, pz: f64) -> f64 {
    if pz.abs() >= e {
        return 0.;
    }
    0.5 * ((e + pz) / (e - pz)).ln()
}

fn wrap_phi(mut phi: f64) -> f64 {
    while phi > PI {
        phi -= 2. * PI;
    }
    while phi <= -PI {
        phi += 2. * PI;
    }
    phi
}
