//! The capability set shared by every scalar kind the crate is instantiated over.
//!
//! Everything in this crate is written once against [`Scalar`] and compiled separately for each
//! implementor. There are three of them:
//!
//! - `f64`, the [concrete](ScalarKind::Concrete) kind;
//! - [`AutoDiff`](crate::AutoDiff), the [differentiable](ScalarKind::Differentiable) kind, which
//!   carries a value and its partial derivatives;
//! - [`Expression`](crate::Expression), the [symbolic](ScalarKind::Symbolic) kind, which is only
//!   evaluated once all its variables are bound.
//!
//! The important difference between them is [`Scalar::numeric_value`]. Concrete and
//! differentiable scalars have a value that can be compared to a tolerance; symbolic scalars do
//! not, and any check that would have to branch on their value is skipped instead.

use num_traits::{One, Zero};
use std::fmt::{self, Display, Formatter};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::util::Real;

/// Which family of numeric behavior a [`Scalar`] implementation belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Plain floating point arithmetic.
    Concrete,
    /// A value plus first derivatives, propagated through arithmetic by the chain rule.
    Differentiable,
    /// An expression tree that is only evaluated later.
    Symbolic,
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::Concrete => "concrete",
            ScalarKind::Differentiable => "differentiable",
            ScalarKind::Symbolic => "symbolic",
        })
    }
}

/// A number type that rotations, transforms, and unit-vector checks can be computed over.
///
/// The arithmetic bounds are what [`nalgebra`] needs to multiply matrices and vectors of `Self`.
/// Note that there is deliberately no `PartialOrd` bound: symbolic scalars cannot be ordered, so
/// generic code has to go through [`Scalar::numeric_value`] whenever it needs a comparison.
pub trait Scalar:
    nalgebra::Scalar
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + Send
    + Sync
{
    /// The family this scalar belongs to.
    const KIND: ScalarKind;

    /// Lifts a literal into this scalar kind (as a constant, for differentiable scalars).
    fn from_f64(value: f64) -> Self;

    fn sqrt(self) -> Self;

    fn sin(self) -> Self;

    fn cos(self) -> Self;

    /// Four-quadrant arctangent of `self / x`.
    fn atan2(self, x: Self) -> Self;

    /// The value that numeric checks compare against tolerances.
    ///
    /// Returns `None` for symbolic scalars, even if the expression happens to be a constant,
    /// since validity judgments for symbolic pipelines are deferred to evaluation time.
    fn numeric_value(&self) -> Option<f64>;

    /// Whether this scalar is exactly the given literal.
    ///
    /// This is an exact (not tolerance-based) test. For symbolic scalars it is structural: only a
    /// constant expression holding `literal` qualifies.
    fn is_exactly(&self, literal: f64) -> bool;

    /// Writes this scalar the way diagnostics and `Display` impls in this crate render it.
    fn fmt_scalar(&self, f: &mut Formatter<'_>) -> fmt::Result;
}

impl Scalar for f64 {
    const KIND: ScalarKind = ScalarKind::Concrete;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn sin(self) -> Self {
        f64::sin(self)
    }

    #[inline]
    fn cos(self) -> Self {
        f64::cos(self)
    }

    #[inline]
    fn atan2(self, x: Self) -> Self {
        f64::atan2(self, x)
    }

    #[inline]
    fn numeric_value(&self) -> Option<f64> {
        Some(*self)
    }

    #[inline]
    fn is_exactly(&self, literal: f64) -> bool {
        *self == literal
    }

    fn fmt_scalar(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Real(*self).fmt(f)
    }
}

/// Adapter that lets any [`Scalar`] be used with `{}`.
pub(crate) struct Rendered<'a, S>(pub(crate) &'a S);

impl<S: Scalar> Display for Rendered<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt_scalar(f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Rendered, Scalar, ScalarKind};

    #[test]
    fn f64_is_concrete() {
        assert_eq!(<f64 as Scalar>::KIND, ScalarKind::Concrete);
        assert_eq!(ScalarKind::Concrete.to_string(), "concrete");
    }

    #[test]
    fn f64_capabilities() {
        assert_eq!(<f64 as Scalar>::sqrt(4.), 2.);
        assert_eq!(<f64 as Scalar>::atan2(0., 1.), 0.);
        assert_eq!(<f64 as Scalar>::from_f64(1.5), 1.5);
        assert_eq!(2.0_f64.numeric_value(), Some(2.));
        assert!(1.0_f64.is_exactly(1.));
        assert!(!0.5_f64.is_exactly(1.));
        assert!(!f64::NAN.is_exactly(f64::NAN));
    }

    #[test]
    fn f64_renders_like_diagnostics() {
        assert_eq!(Rendered(&f64::NAN).to_string(), "nan");
        assert_eq!(Rendered(&3.).to_string(), "3");
        assert_eq!(Rendered(&-0.).to_string(), "0");
    }
}
