//! Roll-pitch-yaw summaries of orientations.

use std::fmt::{self, Display, Formatter};
use uom::si::angle::radian;
use uom::si::f64::Angle;

use crate::rotation::RotationMatrix;
use crate::scalar::{Rendered, Scalar};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An orientation expressed as space-fixed (extrinsic) X-Y-Z rotation angles.
///
/// The orientation is obtained by rotating by `roll` about the fixed X axis, then by `pitch` about
/// the fixed Y axis, and finally by `yaw` about the fixed Z axis. As a rotation matrix that is
///
/// ```text
/// R = Rz(yaw) * Ry(pitch) * Rx(roll)
/// ```
///
/// Angles are in radians. Converting from a rotation always yields a pitch in `[-π/2, π/2]` and a
/// roll and yaw in `(-π, π]`. At a pitch of exactly ±π/2 (gimbal lock) roll and yaw are not
/// uniquely determined, and the split between them that comes back is arbitrary.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollPitchYaw<S: Scalar> {
    roll: S,
    pitch: S,
    yaw: S,
}

impl<S: Scalar> RollPitchYaw<S> {
    #[must_use]
    pub fn new(roll: S, pitch: S, yaw: S) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Extracts the roll, pitch, and yaw angles of a rotation.
    ///
    /// The computation is branch-free (it only uses `atan2` and `sqrt`), so it works just as well
    /// for symbolic rotations as for numeric ones.
    #[must_use]
    pub fn from_rotation(rotation: &RotationMatrix<S>) -> Self {
        let r = rotation.matrix();
        let (r00, r10, r20) = (r[(0, 0)].clone(), r[(1, 0)].clone(), r[(2, 0)].clone());
        let (r21, r22) = (r[(2, 1)].clone(), r[(2, 2)].clone());

        let cos_pitch = (r00.clone() * r00.clone() + r10.clone() * r10.clone()).sqrt();
        Self {
            roll: r21.atan2(r22),
            pitch: (-r20).atan2(cos_pitch),
            yaw: r10.atan2(r00),
        }
    }

    #[must_use]
    pub fn to_rotation(&self) -> RotationMatrix<S> {
        RotationMatrix::from_rpy(self)
    }

    /// Rotation about the space-fixed X axis.
    #[must_use]
    pub fn roll(&self) -> &S {
        &self.roll
    }

    /// Rotation about the space-fixed Y axis.
    #[must_use]
    pub fn pitch(&self) -> &S {
        &self.pitch
    }

    /// Rotation about the space-fixed Z axis.
    #[must_use]
    pub fn yaw(&self) -> &S {
        &self.yaw
    }
}

impl RollPitchYaw<f64> {
    /// Constructs roll-pitch-yaw angles from typed [`Angle`]s.
    #[must_use]
    pub fn from_angles(
        roll: impl Into<Angle>,
        pitch: impl Into<Angle>,
        yaw: impl Into<Angle>,
    ) -> Self {
        Self {
            roll: roll.into().get::<radian>(),
            pitch: pitch.into().get::<radian>(),
            yaw: yaw.into().get::<radian>(),
        }
    }

    /// Returns `(roll, pitch, yaw)` as typed [`Angle`]s.
    #[must_use]
    pub fn to_angles(&self) -> (Angle, Angle, Angle) {
        (
            Angle::new::<radian>(self.roll),
            Angle::new::<radian>(self.pitch),
            Angle::new::<radian>(self.yaw),
        )
    }
}

impl<S: Scalar> Display for RollPitchYaw<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rpy = {} {} {}",
            Rendered(&self.roll),
            Rendered(&self.pitch),
            Rendered(&self.yaw)
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl<S> AbsDiffEq<Self> for RollPitchYaw<S>
where
    S: Scalar + AbsDiffEq<Epsilon = f64>,
{
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        S::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.roll.abs_diff_eq(&other.roll, epsilon)
            && self.pitch.abs_diff_eq(&other.pitch, epsilon)
            && self.yaw.abs_diff_eq(&other.yaw, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<S> RelativeEq for RollPitchYaw<S>
where
    S: Scalar + RelativeEq<Epsilon = f64>,
{
    fn default_max_relative() -> Self::Epsilon {
        S::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.roll.relative_eq(&other.roll, epsilon, max_relative)
            && self.pitch.relative_eq(&other.pitch, epsilon, max_relative)
            && self.yaw.relative_eq(&other.yaw, epsilon, max_relative)
    }
}
