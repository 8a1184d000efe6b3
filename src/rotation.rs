//! Orthonormal rotation matrices.

use nalgebra::{Matrix3, Rotation3, Vector3};
use std::fmt::{self, Display, Formatter};
use std::ops::{Mul, Neg};

use crate::rpy::RollPitchYaw;
use crate::scalar::Scalar;
use crate::unit_vector::{validate_unit_vector, NotUnitVectorError, Policy};
use crate::util::Real;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How far `R·Rᵀ` may be from the identity (in its largest element) for `R` to count as
/// orthonormal.
pub const ORTHONORMALITY_TOLERANCE: f64 = 128. * f64::EPSILON;

/// Returned by [`RotationMatrix::new`] when the matrix is not a proper rotation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub struct NotOrthonormalError {
    orthonormality_error: f64,
    determinant: f64,
}

impl NotOrthonormalError {
    /// The largest element of `|R·Rᵀ - I|`.
    #[must_use]
    pub fn orthonormality_error(&self) -> f64 {
        self.orthonormality_error
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.determinant
    }
}

impl Display for NotOrthonormalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.orthonormality_error <= ORTHONORMALITY_TOLERANCE {
            write!(
                f,
                "The rotation matrix has determinant {}, so it is a reflection rather than a \
                 rotation. It is possible that a basis is left-handed.",
                Real(self.determinant)
            )
        } else {
            write!(
                f,
                "The rotation matrix is not orthonormal. Measure of orthonormality error: {} \
                 (near-zero is good), which is greater than {}.",
                Real(self.orthonormality_error),
                Real(ORTHONORMALITY_TOLERANCE)
            )
        }
    }
}

/// A 3×3 rotation matrix.
///
/// For scalar kinds that have a numeric value, the matrix is guaranteed to be orthonormal with a
/// positive determinant (within [`ORTHONORMALITY_TOLERANCE`]) unless it was built with
/// [`RotationMatrix::new_unchecked`]. Symbolic matrices cannot be checked and are taken on faith.
///
/// Operations that produce a rotation from rotations (composition, inversion) preserve the
/// invariant and do not check it again.
///
/// <div class="warning">
///
/// Note that this type implements `Deserialize` without validating its input. A deserialized
/// matrix is only a rotation if whatever serialized it was one.
///
/// </div>
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
// no need for the "matrix": indirection
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RotationMatrix<S: Scalar> {
    matrix: Matrix3<S>,
}

/// Copies out the values of a matrix whose scalar kind has them.
fn numeric_matrix<S: Scalar>(matrix: &Matrix3<S>) -> Option<Matrix3<f64>> {
    let mut values = Matrix3::zeros();
    for (value, element) in values.iter_mut().zip(matrix.iter()) {
        *value = element.numeric_value()?;
    }
    Some(values)
}

fn check_orthonormal(matrix: &Matrix3<f64>) -> Result<(), NotOrthonormalError> {
    let orthonormality_error = if matrix.iter().all(|x| x.is_finite()) {
        (matrix * matrix.transpose() - Matrix3::identity()).amax()
    } else {
        f64::NAN
    };
    let determinant = matrix.determinant();
    if orthonormality_error <= ORTHONORMALITY_TOLERANCE && determinant > 0. {
        Ok(())
    } else {
        Err(NotOrthonormalError {
            orthonormality_error,
            determinant,
        })
    }
}

impl<S: Scalar> RotationMatrix<S> {
    /// Constructs a rotation from a matrix, checking that it is orthonormal and right-handed.
    ///
    /// Symbolic matrices are accepted as-is.
    pub fn new(matrix: Matrix3<S>) -> Result<Self, NotOrthonormalError> {
        if let Some(values) = numeric_matrix(&matrix) {
            check_orthonormal(&values)?;
        }
        Ok(Self { matrix })
    }

    /// Constructs a rotation from a matrix without checking it.
    ///
    /// The caller is responsible for `matrix` being orthonormal with determinant 1; everything
    /// else in this crate assumes it is.
    #[must_use]
    pub fn new_unchecked(matrix: Matrix3<S>) -> Self {
        Self { matrix }
    }

    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Rotation by `theta` radians about the X axis.
    #[must_use]
    pub fn rot_x(theta: S) -> Self {
        let (s, c) = (theta.clone().sin(), theta.cos());
        let (zero, one) = (S::zero(), S::one());
        Self::new_unchecked(Matrix3::new(
            one,
            zero.clone(),
            zero.clone(),
            zero.clone(),
            c.clone(),
            -s.clone(),
            zero,
            s,
            c,
        ))
    }

    /// Rotation by `theta` radians about the Y axis.
    #[must_use]
    pub fn rot_y(theta: S) -> Self {
        let (s, c) = (theta.clone().sin(), theta.cos());
        let (zero, one) = (S::zero(), S::one());
        Self::new_unchecked(Matrix3::new(
            c.clone(),
            zero.clone(),
            s.clone(),
            zero.clone(),
            one,
            zero.clone(),
            -s,
            zero,
            c,
        ))
    }

    /// Rotation by `theta` radians about the Z axis.
    #[must_use]
    pub fn rot_z(theta: S) -> Self {
        let (s, c) = (theta.clone().sin(), theta.cos());
        let (zero, one) = (S::zero(), S::one());
        Self::new_unchecked(Matrix3::new(
            c.clone(),
            -s.clone(),
            zero.clone(),
            s,
            c,
            zero.clone(),
            zero.clone(),
            zero,
            one,
        ))
    }

    /// The rotation `Rz(yaw) * Ry(pitch) * Rx(roll)` described by `rpy`.
    #[must_use]
    pub fn from_rpy(rpy: &RollPitchYaw<S>) -> Self {
        let (sr, cr) = (rpy.roll().clone().sin(), rpy.roll().clone().cos());
        let (sp, cp) = (rpy.pitch().clone().sin(), rpy.pitch().clone().cos());
        let (sy, cy) = (rpy.yaw().clone().sin(), rpy.yaw().clone().cos());

        let m = |a: &S, b: &S| a.clone() * b.clone();
        let m3 = |a: &S, b: &S, c: &S| a.clone() * b.clone() * c.clone();
        Self::new_unchecked(Matrix3::new(
            m(&cy, &cp),
            m3(&cy, &sp, &sr) - m(&sy, &cr),
            m3(&cy, &sp, &cr) + m(&sy, &sr),
            m(&sy, &cp),
            m3(&sy, &sp, &sr) + m(&cy, &cr),
            m3(&sy, &sp, &cr) - m(&cy, &sr),
            -sp,
            m(&cp, &sr),
            m(&cp, &cr),
        ))
    }

    /// Rotation by `angle` radians about `axis`, which must be a unit vector.
    ///
    /// The axis is checked with [`Policy::Strict`], so for numeric scalar kinds a non-unit axis is
    /// an error rather than being silently normalized.
    pub fn from_axis_angle(axis: &Vector3<S>, angle: S) -> Result<Self, NotUnitVectorError> {
        validate_unit_vector(axis, "RotationMatrix::from_axis_angle", Policy::Strict)?;

        // Rodrigues: R = cI + s[k]× + (1 - c)kkᵀ
        let (s, c) = (angle.clone().sin(), angle.cos());
        let t = S::one() - c.clone();
        let (x, y, z) = (axis[0].clone(), axis[1].clone(), axis[2].clone());
        let tk = |a: &S, b: &S| t.clone() * a.clone() * b.clone();
        let sk = |a: &S| s.clone() * a.clone();
        Ok(Self::new_unchecked(Matrix3::new(
            tk(&x, &x) + c.clone(),
            tk(&x, &y) - sk(&z),
            tk(&x, &z) + sk(&y),
            tk(&x, &y) + sk(&z),
            tk(&y, &y) + c.clone(),
            tk(&y, &z) - sk(&x),
            tk(&x, &z) - sk(&y),
            tk(&y, &z) + sk(&x),
            tk(&z, &z) + c,
        )))
    }

    #[must_use]
    pub fn matrix(&self) -> &Matrix3<S> {
        &self.matrix
    }

    #[must_use]
    pub fn into_inner(self) -> Matrix3<S> {
        self.matrix
    }

    /// Returns the equal-but-opposite rotation, which for an orthonormal matrix is its transpose.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
        }
    }

    /// The transpose of the matrix, which is the same thing as [`RotationMatrix::inverse`].
    #[must_use]
    pub fn transpose(&self) -> Self {
        self.inverse()
    }

    /// Chains two rotations: the result applies `other` first, then `self`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            matrix: &self.matrix * &other.matrix,
        }
    }

    /// Rotates a vector.
    #[doc(alias = "apply")]
    #[must_use]
    pub fn transform(&self, vector: &Vector3<S>) -> Vector3<S> {
        &self.matrix * vector
    }

    #[must_use]
    pub fn to_rpy(&self) -> RollPitchYaw<S> {
        RollPitchYaw::from_rotation(self)
    }

    /// The largest element of `|R·Rᵀ - I|`, or `None` for symbolic matrices.
    #[must_use]
    pub fn orthonormality_error(&self) -> Option<f64> {
        let values = numeric_matrix(&self.matrix)?;
        Some((values * values.transpose() - Matrix3::identity()).amax())
    }
}

impl RotationMatrix<f64> {
    /// Returns the rotation closest to `matrix`, which need not be orthonormal.
    ///
    /// Useful to repair a matrix that accumulated numerical drift or came from a noisy source.
    #[must_use]
    pub fn project(matrix: &Matrix3<f64>) -> Self {
        Self {
            matrix: Rotation3::from_matrix(matrix).into_inner(),
        }
    }
}

impl<S: Scalar> Display for RotationMatrix<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.to_rpy().fmt(f)
    }
}

impl<S: Scalar> Neg for RotationMatrix<S> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.inverse()
    }
}

impl<S: Scalar> Mul<&RotationMatrix<S>> for &RotationMatrix<S> {
    type Output = RotationMatrix<S>;

    fn mul(self, rhs: &RotationMatrix<S>) -> Self::Output {
        self.compose(rhs)
    }
}

impl<S: Scalar> Mul for RotationMatrix<S> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}

impl<S: Scalar> Mul<&Vector3<S>> for &RotationMatrix<S> {
    type Output = Vector3<S>;

    fn mul(self, rhs: &Vector3<S>) -> Self::Output {
        self.transform(rhs)
    }
}

impl<S: Scalar> Mul<Vector3<S>> for RotationMatrix<S> {
    type Output = Vector3<S>;

    fn mul(self, rhs: Vector3<S>) -> Self::Output {
        self.transform(&rhs)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<S> AbsDiffEq<Self> for RotationMatrix<S>
where
    S: Scalar + AbsDiffEq<Epsilon = f64>,
{
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        S::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.matrix.abs_diff_eq(&other.matrix, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<S> RelativeEq for RotationMatrix<S>
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
        self.matrix.relative_eq(&other.matrix, epsilon, max_relative)
    }
}
