//! Forward-mode automatic differentiation.
//!
//! [`AutoDiff`] is the [differentiable](crate::ScalarKind::Differentiable) scalar kind: a value
//! together with the vector of its partial derivatives with respect to some set of independent
//! variables. Every arithmetic operation propagates those derivatives using the chain rule, so
//! any algorithm written against [`Scalar`] yields gradients for free when instantiated over
//! `AutoDiff`.
//!
//! ```
//! use kinemath::AutoDiff;
//!
//! // f(x, y) = x * y + x at (x, y) = (3, 2)
//! let x = AutoDiff::variable(3., 0, 2);
//! let y = AutoDiff::variable(2., 1, 2);
//! let f = x.clone() * y + x;
//! assert_eq!(f.value(), 9.);
//! assert_eq!(f.derivatives().as_slice(), &[3., 3.]);
//! ```

use nalgebra::DVector;
use num_traits::{One, Zero};
use std::fmt::{self, Display, Formatter};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::scalar::{Scalar, ScalarKind};
use crate::util::Real;

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A value and its first derivatives.
///
/// An empty derivative vector stands for "all derivatives are zero", which is what constants
/// have. Combining two scalars whose derivative vectors are both non-empty but of different
/// lengths is a programming error and panics.
///
/// Equality (and approximate equality) only looks at the value, mirroring how comparisons
/// behave on the underlying function rather than on its derivatives.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AutoDiff {
    value: f64,
    derivatives: DVector<f64>,
}

impl AutoDiff {
    /// Constructs a scalar with explicit derivatives.
    #[must_use]
    pub fn new(value: f64, derivatives: DVector<f64>) -> Self {
        Self { value, derivatives }
    }

    /// Constructs a scalar whose derivatives are all zero.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            derivatives: DVector::zeros(0),
        }
    }

    /// Constructs the `index`-th of `count` independent variables.
    ///
    /// # Panics
    ///
    /// If `index` is not less than `count`.
    #[must_use]
    pub fn variable(value: f64, index: usize, count: usize) -> Self {
        assert!(
            index < count,
            "variable index {index} is out of range for {count} variables"
        );
        let mut derivatives = DVector::zeros(count);
        derivatives[index] = 1.;
        Self { value, derivatives }
    }

    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The partial derivatives of this value. Empty if they are all zero.
    #[must_use]
    pub fn derivatives(&self) -> &DVector<f64> {
        &self.derivatives
    }

    /// Applies a unary function with value `value` and derivative `slope` at `self.value`.
    fn chain(self, value: f64, slope: f64) -> Self {
        Self {
            value,
            derivatives: self.derivatives * slope,
        }
    }

    #[must_use]
    pub fn tan(self) -> Self {
        let tan = self.value.tan();
        self.chain(tan, 1. + tan * tan)
    }

    #[must_use]
    pub fn exp(self) -> Self {
        let exp = self.value.exp();
        self.chain(exp, exp)
    }

    /// Natural logarithm.
    #[must_use]
    pub fn ln(self) -> Self {
        let (ln, slope) = (self.value.ln(), 1. / self.value);
        self.chain(ln, slope)
    }

    #[must_use]
    pub fn sinh(self) -> Self {
        let (sinh, cosh) = (self.value.sinh(), self.value.cosh());
        self.chain(sinh, cosh)
    }

    #[must_use]
    pub fn cosh(self) -> Self {
        let (sinh, cosh) = (self.value.sinh(), self.value.cosh());
        self.chain(cosh, sinh)
    }

    #[must_use]
    pub fn tanh(self) -> Self {
        let tanh = self.value.tanh();
        self.chain(tanh, 1. - tanh * tanh)
    }
}

/// Computes `a * da + b * db`, treating empty derivative vectors as zero.
fn combine(a: f64, da: DVector<f64>, b: f64, db: DVector<f64>) -> DVector<f64> {
    match (da.is_empty(), db.is_empty()) {
        (true, true) => da,
        (false, true) => da * a,
        (true, false) => db * b,
        (false, false) => {
            assert_eq!(
                da.len(),
                db.len(),
                "cannot combine derivative vectors of different lengths"
            );
            da * a + db * b
        }
    }
}

impl Default for AutoDiff {
    fn default() -> Self {
        Self::constant(0.)
    }
}

impl From<f64> for AutoDiff {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl PartialEq for AutoDiff {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Display for AutoDiff {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Real(self.value).fmt(f)
    }
}

// (a + a'ε) + (b + b'ε) = (a + b) + (a' + b')ε
impl Add for AutoDiff {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            value: self.value + rhs.value,
            derivatives: combine(1., self.derivatives, 1., rhs.derivatives),
        }
    }
}

impl Sub for AutoDiff {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            value: self.value - rhs.value,
            derivatives: combine(1., self.derivatives, -1., rhs.derivatives),
        }
    }
}

// (a + a'ε) * (b + b'ε) = ab + (b·a' + a·b')ε
impl Mul for AutoDiff {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            value: self.value * rhs.value,
            derivatives: combine(rhs.value, self.derivatives, self.value, rhs.derivatives),
        }
    }
}

impl Neg for AutoDiff {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            value: -self.value,
            derivatives: -self.derivatives,
        }
    }
}

impl AddAssign for AutoDiff {
    fn add_assign(&mut self, rhs: Self) {
        let lhs = std::mem::take(self);
        *self = lhs + rhs;
    }
}

impl SubAssign for AutoDiff {
    fn sub_assign(&mut self, rhs: Self) {
        let lhs = std::mem::take(self);
        *self = lhs - rhs;
    }
}

impl MulAssign for AutoDiff {
    fn mul_assign(&mut self, rhs: Self) {
        let lhs = std::mem::take(self);
        *self = lhs * rhs;
    }
}

impl Zero for AutoDiff {
    fn zero() -> Self {
        Self::constant(0.)
    }

    fn is_zero(&self) -> bool {
        self.value == 0. && self.derivatives.iter().all(|d| *d == 0.)
    }
}

impl One for AutoDiff {
    fn one() -> Self {
        Self::constant(1.)
    }
}

impl Scalar for AutoDiff {
    const KIND: ScalarKind = ScalarKind::Differentiable;

    fn from_f64(value: f64) -> Self {
        Self::constant(value)
    }

    fn sqrt(self) -> Self {
        let sqrt = self.value.sqrt();
        self.chain(sqrt, 0.5 / sqrt)
    }

    fn sin(self) -> Self {
        let (sin, cos) = self.value.sin_cos();
        self.chain(sin, cos)
    }

    fn cos(self) -> Self {
        let (sin, cos) = self.value.sin_cos();
        self.chain(cos, -sin)
    }

    // d atan2(y, x) = (x·dy - y·dx) / (x² + y²)
    fn atan2(self, x: Self) -> Self {
        let y = self;
        let denominator = x.value * x.value + y.value * y.value;
        Self {
            value: y.value.atan2(x.value),
            derivatives: combine(
                x.value / denominator,
                y.derivatives,
                -y.value / denominator,
                x.derivatives,
            ),
        }
    }

    fn numeric_value(&self) -> Option<f64> {
        Some(self.value)
    }

    fn is_exactly(&self, literal: f64) -> bool {
        self.value == literal
    }

    fn fmt_scalar(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Real(self.value).fmt(f)
    }
}

#[cfg(any(test, feature = "approx"))]
impl AbsDiffEq for AutoDiff {
    type Epsilon = f64;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.value.abs_diff_eq(&other.value, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl RelativeEq for AutoDiff {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.value.relative_eq(&other.value, epsilon, max_relative)
    }
}

#[cfg(test)]
mod tests {
    use super::AutoDiff;
    use crate::scalar::Scalar;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use quickcheck::quickcheck;
    use rstest::rstest;

    const STEP: f64 = 1e-6;

    /// Central finite difference of `f` at `x`.
    fn numeric_slope(f: impl Fn(f64) -> f64, x: f64) -> f64 {
        (f(x + STEP) - f(x - STEP)) / (2. * STEP)
    }

    #[test]
    fn product_rule() {
        let x = AutoDiff::variable(3., 0, 2);
        let y = AutoDiff::variable(-2., 1, 2);
        let f = x.clone() * x * y;
        assert_eq!(f.value(), -18.);
        assert_eq!(f.derivatives().as_slice(), &[-12., 9.]);
    }

    #[test]
    fn constants_mix_with_variables() {
        let x = AutoDiff::variable(1.5, 0, 3);
        let f = AutoDiff::constant(2.) * x.clone() - AutoDiff::constant(1.);
        assert_eq!(f.value(), 2.);
        assert_eq!(f.derivatives().as_slice(), &[2., 0., 0.]);

        let g = AutoDiff::constant(4.) + AutoDiff::constant(1.);
        assert_eq!(g.value(), 5.);
        assert!(g.derivatives().is_empty());
    }

    #[test]
    #[should_panic(expected = "different lengths")]
    fn mismatched_derivative_lengths_panic() {
        let _ = AutoDiff::variable(1., 0, 2) + AutoDiff::variable(1., 0, 3);
    }

    #[test]
    fn assign_operators_match_binary_ones() {
        let x = AutoDiff::variable(2., 0, 1);
        let mut f = x.clone();
        f *= x.clone();
        f += x.clone();
        f -= AutoDiff::constant(1.);
        assert_eq!(f.value(), 5.);
        assert_eq!(f.derivatives().as_slice(), &[5.]);
    }

    #[test]
    fn equality_ignores_derivatives() {
        assert_eq!(AutoDiff::variable(1., 0, 1), AutoDiff::constant(1.));
        assert_ne!(AutoDiff::constant(1.), AutoDiff::constant(2.));
    }

    #[test]
    fn displays_value() {
        assert_eq!(
            AutoDiff::new(2.5, DVector::from_vec(vec![1.])).to_string(),
            "2.5"
        );
        assert_eq!(AutoDiff::constant(f64::NAN).to_string(), "nan");
    }

    #[rstest]
    #[case::sqrt(<AutoDiff as Scalar>::sqrt, f64::sqrt, 2.)]
    #[case::sin(<AutoDiff as Scalar>::sin, f64::sin, 0.3)]
    #[case::cos(<AutoDiff as Scalar>::cos, f64::cos, 0.3)]
    #[case::tan(AutoDiff::tan, f64::tan, 0.3)]
    #[case::exp(AutoDiff::exp, f64::exp, 0.7)]
    #[case::ln(AutoDiff::ln, f64::ln, 0.7)]
    #[case::sinh_positive(AutoDiff::sinh, f64::sinh, 0.1)]
    #[case::sinh_negative(AutoDiff::sinh, f64::sinh, -0.1)]
    #[case::cosh(AutoDiff::cosh, f64::cosh, 0.1)]
    #[case::tanh(AutoDiff::tanh, f64::tanh, -0.4)]
    fn unary_derivatives_match_finite_differences(
        #[case] autodiff: fn(AutoDiff) -> AutoDiff,
        #[case] plain: fn(f64) -> f64,
        #[case] at: f64,
    ) {
        let f = autodiff(AutoDiff::variable(at, 0, 1));
        assert_eq!(f.value(), plain(at));
        assert_relative_eq!(f.derivatives()[0], numeric_slope(plain, at), epsilon = 1e-8);
    }

    #[test]
    fn sinh_of_composite_argument_uses_the_chain_rule() {
        // d/dx sinh(x * y) = y cosh(xy), d/dy sinh(x * y) = x cosh(xy)
        let x = AutoDiff::variable(0.1, 0, 2);
        let y = AutoDiff::variable(-0.1, 1, 2);
        let f = (x * y).sinh();
        let cosh = (-0.01_f64).cosh();
        assert_relative_eq!(f.value(), (-0.01_f64).sinh(), epsilon = 1e-12);
        assert_relative_eq!(f.derivatives()[0], -0.1 * cosh, epsilon = 1e-12);
        assert_relative_eq!(f.derivatives()[1], 0.1 * cosh, epsilon = 1e-12);
    }

    #[rstest]
    #[case(1., 1.)]
    #[case(-2., 0.5)]
    #[case(0.3, -4.)]
    #[case(-1., -1.)]
    fn atan2_partials(#[case] y: f64, #[case] x: f64) {
        let f = AutoDiff::variable(y, 0, 2).atan2(AutoDiff::variable(x, 1, 2));
        assert_eq!(f.value(), y.atan2(x));
        assert_relative_eq!(
            f.derivatives()[0],
            numeric_slope(|y| y.atan2(x), y),
            epsilon = 1e-8
        );
        assert_relative_eq!(
            f.derivatives()[1],
            numeric_slope(|x| y.atan2(x), x),
            epsilon = 1e-8
        );
    }

    quickcheck! {
        fn square_has_derivative_twice_the_value(x: f64) -> bool {
            if !x.is_finite() || x.abs() > 1e100 {
                return true;
            }
            let v = AutoDiff::variable(x, 0, 1);
            let f = v.clone() * v;
            f.value() == x * x && f.derivatives()[0] == 2. * x
        }
    }
}
