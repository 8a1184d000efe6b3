//! Rigid transforms: a rotation followed by a translation.

use nalgebra::{Matrix4, Vector3, Vector4};
use std::fmt::{self, Display, Formatter};
use std::ops::{Mul, Neg};

use crate::rotation::RotationMatrix;
use crate::scalar::{Rendered, Scalar};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Returned by [`RigidTransform::apply_homogeneous`] when the last element of the input is neither
/// exactly 0 nor exactly 1.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub struct InvalidHomogeneousCoordinateError {
    components: [String; 4],
}

impl InvalidHomogeneousCoordinateError {
    /// The offending vector, rendered one component at a time.
    #[must_use]
    pub fn components(&self) -> &[String; 4] {
        &self.components
    }
}

impl Display for InvalidHomogeneousCoordinateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = &self.components;
        write!(
            f,
            "The 4th element in vector [{a}, {b}, {c}, {d}] passed to \
             RigidTransform::apply_homogeneous is not 0 or 1."
        )
    }
}

/// A proper rigid transform `X`, made up of a rotation `R` and a translation `p`.
///
/// Applied to a point `q` it gives `X·q = R·q + p`; applied to a vector (a displacement, which has
/// no position) only the rotation is used. Transforms compose like the matrices they stand for:
/// `(a * b)` applies `b` first.
///
/// The same definition serves every [`Scalar`] kind:
///
/// ```
/// use kinemath::{Environment, Expression, RigidTransform, Variable};
/// use nalgebra::Vector3;
///
/// let x = Variable::new("x");
/// let shift = RigidTransform::from_translation(Vector3::new(
///     Expression::from(x.clone()),
///     Expression::constant(0.),
///     Expression::constant(0.),
/// ));
/// let moved = shift.transform_point(&Vector3::new(
///     Expression::constant(1.),
///     Expression::constant(2.),
///     Expression::constant(3.),
/// ));
///
/// let environment = Environment::from([(x, 10.)]);
/// assert_eq!(moved[0].evaluate(&environment), Ok(11.));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidTransform<S: Scalar> {
    rotation: RotationMatrix<S>,
    translation: Vector3<S>,
}

impl<S: Scalar> RigidTransform<S> {
    #[must_use]
    pub fn new(rotation: RotationMatrix<S>, translation: Vector3<S>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// The transform that leaves everything where it is.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(RotationMatrix::identity(), Vector3::zeros())
    }

    /// A pure rotation.
    #[must_use]
    pub fn from_rotation(rotation: RotationMatrix<S>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    /// A pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<S>) -> Self {
        Self::new(RotationMatrix::identity(), translation)
    }

    #[must_use]
    pub fn rotation(&self) -> &RotationMatrix<S> {
        &self.rotation
    }

    #[must_use]
    pub fn translation(&self) -> &Vector3<S> {
        &self.translation
    }

    pub fn set_rotation(&mut self, rotation: RotationMatrix<S>) {
        self.rotation = rotation;
    }

    pub fn set_translation(&mut self, translation: Vector3<S>) {
        self.translation = translation;
    }

    pub fn set(&mut self, rotation: RotationMatrix<S>, translation: Vector3<S>) {
        self.rotation = rotation;
        self.translation = translation;
    }

    /// Chains two transforms: the result applies `other` first, then `self`.
    #[doc(alias = "and_then")]
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            rotation: self.rotation.compose(&other.rotation),
            translation: self.rotation.transform(&other.translation) + &self.translation,
        }
    }

    /// Returns the transform that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let translation = -rotation.transform(&self.translation);
        Self {
            rotation,
            translation,
        }
    }

    /// Rotates and then translates a point.
    #[must_use]
    pub fn transform_point(&self, point: &Vector3<S>) -> Vector3<S> {
        self.rotation.transform(point) + &self.translation
    }

    /// Rotates a vector. Vectors have no position, so the translation does not apply.
    #[must_use]
    pub fn transform_vector(&self, vector: &Vector3<S>) -> Vector3<S> {
        self.rotation.transform(vector)
    }

    /// Applies the transform to a homogeneous 4-vector.
    ///
    /// A last element of exactly 0 marks a vector and exactly 1 marks a point; the result keeps
    /// the same last element. Anything else (including values within rounding error of 0 or 1) is
    /// rejected. For symbolic scalars the test is structural, so the last element must be a
    /// constant expression.
    pub fn apply_homogeneous(
        &self,
        vector: &Vector4<S>,
    ) -> Result<Vector4<S>, InvalidHomogeneousCoordinateError> {
        let w = &vector[3];
        let xyz = Vector3::new(vector[0].clone(), vector[1].clone(), vector[2].clone());
        let out = if w.is_exactly(0.) {
            self.transform_vector(&xyz)
        } else if w.is_exactly(1.) {
            self.transform_point(&xyz)
        } else {
            return Err(InvalidHomogeneousCoordinateError {
                components: [0, 1, 2, 3].map(|i| Rendered(&vector[i]).to_string()),
            });
        };
        let [x, y, z] = [0, 1, 2].map(|i| out[i].clone());
        Ok(Vector4::new(x, y, z, w.clone()))
    }

    /// The 4×4 matrix that [`RigidTransform::apply_homogeneous`] multiplies by.
    #[must_use]
    pub fn to_homogeneous(&self) -> Matrix4<S> {
        let mut matrix = Matrix4::identity();
        matrix
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(self.rotation.matrix());
        matrix
            .fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&self.translation);
        matrix
    }
}

impl<S: Scalar> Display for RigidTransform<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} xyz = {} {} {}",
            self.rotation.to_rpy(),
            Rendered(&self.translation[0]),
            Rendered(&self.translation[1]),
            Rendered(&self.translation[2])
        )
    }
}

impl<S: Scalar> Neg for RigidTransform<S> {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.inverse()
    }
}

impl<S: Scalar> Mul<&RigidTransform<S>> for &RigidTransform<S> {
    type Output = RigidTransform<S>;

    fn mul(self, rhs: &RigidTransform<S>) -> Self::Output {
        self.compose(rhs)
    }
}

impl<S: Scalar> Mul for RigidTransform<S> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(&rhs)
    }
}

// transforms act on points when multiplied; use transform_vector for displacements
impl<S: Scalar> Mul<&Vector3<S>> for &RigidTransform<S> {
    type Output = Vector3<S>;

    fn mul(self, rhs: &Vector3<S>) -> Self::Output {
        self.transform_point(rhs)
    }
}

impl<S: Scalar> Mul<Vector3<S>> for RigidTransform<S> {
    type Output = Vector3<S>;

    fn mul(self, rhs: Vector3<S>) -> Self::Output {
        self.transform_point(&rhs)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<S> AbsDiffEq<Self> for RigidTransform<S>
where
    S: Scalar + AbsDiffEq<Epsilon = f64>,
{
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        S::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.rotation.abs_diff_eq(&other.rotation, epsilon)
            && self.translation.abs_diff_eq(&other.translation, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<S> RelativeEq for RigidTransform<S>
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
        self.rotation.relative_eq(&other.rotation, epsilon, max_relative)
            && self.translation.relative_eq(&other.translation, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::RigidTransform;
    use crate::rotation::RotationMatrix;
    use crate::rpy::RollPitchYaw;
    use crate::{AutoDiff, Environment, Expression, Variable};
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use nalgebra::{Matrix4, Vector3, Vector4};
    use quickcheck::quickcheck;
    use rstest::rstest;
    use std::f64::consts::FRAC_PI_2;

    fn some_transform() -> RigidTransform<f64> {
        RigidTransform::new(
            RollPitchYaw::new(0.3, -0.2, 1.1).to_rotation(),
            Vector3::new(1., -2., 0.5),
        )
    }

    fn var(name: &str) -> Expression {
        Expression::from(Variable::new(name))
    }

    #[test]
    fn composes_rotation_then_translation() {
        let turn = RigidTransform::from_rotation(RotationMatrix::rot_z(FRAC_PI_2));
        let shift = RigidTransform::from_translation(Vector3::new(1., 0., 0.));

        // shift after turn
        let a = &shift * &turn;
        assert_abs_diff_eq!(a * Vector3::x(), Vector3::new(1., 1., 0.), epsilon = 1e-15);

        // turn after shift
        let b = turn.compose(&shift);
        assert_abs_diff_eq!(b * Vector3::x(), Vector3::new(0., 2., 0.), epsilon = 1e-15);
    }

    #[test]
    fn composition_with_inverse_is_identity() {
        let t = some_transform();
        assert_relative_eq!(
            t.compose(&t.inverse()),
            RigidTransform::identity(),
            epsilon = 1e-15
        );
        assert_relative_eq!(
            t.inverse().compose(&t),
            RigidTransform::identity(),
            epsilon = 1e-15
        );
        assert_eq!(-t.clone(), t.inverse());
    }

    #[test]
    fn composition_with_inverse_is_identity_for_differentiable_scalars() {
        let theta = AutoDiff::variable(0.7, 0, 4);
        let p = Vector3::new(
            AutoDiff::variable(1., 1, 4),
            AutoDiff::variable(-2., 2, 4),
            AutoDiff::variable(3., 3, 4),
        );
        let t = RigidTransform::new(RotationMatrix::rot_x(theta), p);
        let identity = t.compose(&t.inverse());

        assert_abs_diff_eq!(identity, RigidTransform::identity(), epsilon = 1e-15);
        // identically zero, so its partials vanish too
        for component in identity.translation().iter() {
            assert!(component.derivatives().iter().all(|d| d.abs() < 1e-12));
        }
    }

    #[test]
    fn points_are_translated_but_vectors_are_not() {
        let t = RigidTransform::new(RotationMatrix::rot_z(FRAC_PI_2), Vector3::new(0., 0., 5.));
        assert_abs_diff_eq!(
            t.transform_point(&Vector3::x()),
            Vector3::new(0., 1., 5.),
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            t.transform_vector(&Vector3::x()),
            Vector3::new(0., 1., 0.),
            epsilon = 1e-15
        );
        assert_eq!(&t * &Vector3::x(), t.transform_point(&Vector3::x()));
    }

    #[rstest]
    #[case(0.)]
    #[case(1.)]
    fn homogeneous_accepts_points_and_vectors(#[case] w: f64) {
        let t = some_transform();
        let xyz = Vector3::new(4., 5., 6.);
        let out = t.apply_homogeneous(&Vector4::new(4., 5., 6., w)).unwrap();
        let expected = if w == 1. {
            t.transform_point(&xyz)
        } else {
            t.transform_vector(&xyz)
        };
        assert_eq!(out, Vector4::new(expected.x, expected.y, expected.z, w));
    }

    #[test]
    fn homogeneous_matches_the_matrix_form() {
        let t = some_transform();
        let v = Vector4::new(4., 5., 6., 1.);
        assert_relative_eq!(
            t.apply_homogeneous(&v).unwrap(),
            t.to_homogeneous() * v,
            epsilon = 1e-14
        );
        assert_eq!(
            RigidTransform::<f64>::identity().to_homogeneous(),
            Matrix4::identity()
        );
    }

    #[rstest]
    #[case(0.5)]
    #[case(-1.)]
    #[case(f64::NAN)]
    #[case(1. + f64::EPSILON)]
    fn homogeneous_rejects_anything_else(#[case] w: f64) {
        let t = some_transform();
        assert!(t.apply_homogeneous(&Vector4::new(1., 2., 3., w)).is_err());
    }

    #[test]
    fn homogeneous_error_messages() {
        let t = RigidTransform::<f64>::identity();
        let err = t.apply_homogeneous(&Vector4::new(1., 2., 3., 0.5)).unwrap_err();
        insta::assert_snapshot!(err, @"The 4th element in vector [1, 2, 3, 0.5] passed to RigidTransform::apply_homogeneous is not 0 or 1.");
        assert_eq!(err.components()[3], "0.5");

        let err = t.apply_homogeneous(&Vector4::new(0., -0., 1e-20, f64::NAN)).unwrap_err();
        insta::assert_snapshot!(err, @"The 4th element in vector [0, 0, 1e-20, nan] passed to RigidTransform::apply_homogeneous is not 0 or 1.");
    }

    #[test]
    fn homogeneous_checks_symbolic_scalars_structurally() {
        let t = RigidTransform::<Expression>::identity();
        let point = Vector4::new(var("x"), var("y"), var("z"), Expression::constant(1.));
        assert!(t.apply_homogeneous(&point).is_ok());

        let unknown = Vector4::new(var("x"), var("y"), var("z"), var("w"));
        let err = t.apply_homogeneous(&unknown).unwrap_err();
        insta::assert_snapshot!(err, @"The 4th element in vector [x, y, z, w] passed to RigidTransform::apply_homogeneous is not 0 or 1.");
    }

    #[test]
    fn symbolic_transforms_evaluate_later() {
        let (x, y) = (Variable::new("x"), Variable::new("y"));
        let t = RigidTransform::new(
            RotationMatrix::rot_z(Expression::constant(FRAC_PI_2)),
            Vector3::new(
                Expression::from(x.clone()),
                Expression::from(y.clone()),
                Expression::constant(0.),
            ),
        );
        let moved = t.inverse().transform_point(&Vector3::new(
            Expression::constant(1.),
            Expression::constant(0.),
            Expression::constant(0.),
        ));

        let environment = Environment::from([(x, 1.), (y, 2.)]);
        let moved = moved.map(|e| e.evaluate(&environment).unwrap());
        // Rz(-90°)·((1, 0, 0) - (1, 2, 0))
        assert_abs_diff_eq!(moved, Vector3::new(-2., 0., 0.), epsilon = 1e-15);
    }

    #[test]
    fn display() {
        let t = RigidTransform::from_translation(Vector3::new(1., 2., 3.));
        insta::assert_snapshot!(t, @"rpy = 0 0 0 xyz = 1 2 3");

        let t = RigidTransform::from_translation(Vector3::new(-0.25, 0., 1e-5));
        insta::assert_snapshot!(t, @"rpy = 0 0 0 xyz = -0.25 0 1e-5");
    }

    #[test]
    fn display_of_differentiable_transform_shows_values_only() {
        let t = RigidTransform::new(
            RotationMatrix::rot_z(AutoDiff::variable(0., 0, 4)),
            Vector3::new(
                AutoDiff::variable(1.5, 1, 4),
                AutoDiff::variable(-2., 2, 4),
                AutoDiff::constant(0.25),
            ),
        );
        insta::assert_snapshot!(t, @"rpy = 0 0 0 xyz = 1.5 -2 0.25");
    }

    #[test]
    fn display_of_symbolic_transform_shows_expressions() {
        let t = RigidTransform::new(
            RotationMatrix::rot_x(var("theta")),
            Vector3::new(var("x"), Expression::constant(0.), Expression::constant(2.)),
        );
        insta::assert_snapshot!(t, @"rpy = atan2(sin(theta), cos(theta)) atan2(-0, sqrt((1 + (0 * 0)))) atan2(0, 1) xyz = x 0 2");
    }

    #[test]
    fn setters() {
        let mut t = RigidTransform::identity();
        t.set_translation(Vector3::new(1., 1., 1.));
        assert_eq!(t.rotation(), &RotationMatrix::identity());
        t.set_rotation(RotationMatrix::rot_y(0.1));
        assert_eq!(t.translation(), &Vector3::new(1., 1., 1.));
        t.set(RotationMatrix::identity(), Vector3::zeros());
        assert_eq!(t, RigidTransform::identity());
    }

    #[test]
    #[cfg(feature = "serde")]
    fn serde() {
        let t = some_transform();
        let yaml = serde_yaml::to_string(&t).unwrap();
        let back: RigidTransform<f64> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn shared_between_threads() {
        let t = &some_transform();
        let points: Vec<_> = (0..8).map(|i| Vector3::new(f64::from(i), 0., 0.)).collect();
        let moved: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = points
                .iter()
                .map(|p| s.spawn(move || t.transform_point(p)))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for (p, q) in points.iter().zip(&moved) {
            assert_eq!(*q, t.transform_point(p));
        }
    }

    quickcheck! {
        fn inverse_undoes_transform(roll: i8, pitch: i8, yaw: i8, x: i16, y: i16, z: i16) -> bool {
            let [roll, pitch, yaw] = [roll, pitch, yaw].map(|a| f64::from(a) / 50.);
            let rotation = RollPitchYaw::new(roll, pitch, yaw).to_rotation();
            let translation = Vector3::new(f64::from(x), f64::from(y), f64::from(z));
            let t = RigidTransform::new(rotation, translation);
            let p = Vector3::new(1., 2., 3.);
            approx::abs_diff_eq!(t.inverse() * (&t * &p), p, epsilon = 1e-10)
        }
    }
}
