//! Checks that a vector has unit length.
//!
//! Many constructions (axis-angle rotations, directions, bearings) are only meaningful when given
//! a unit vector. [`validate_unit_vector`] is the single place that decides whether a vector is
//! close enough to unit length, and what to do if it is not:
//!
//! - under [`Policy::Strict`], a vector that is not a unit vector is an error;
//! - under [`Policy::Lenient`], it is reported as a `tracing` warning and otherwise accepted.
//!
//! Either way, the squared norm of the vector is returned unchanged so callers can use it without
//! recomputing it. For [symbolic](crate::ScalarKind::Symbolic) vectors no check is made at all,
//! since their norm is not known until evaluation; the squared norm is returned as an
//! unevaluated expression.

use nalgebra::Vector3;
use std::fmt::{self, Display, Formatter};

use crate::scalar::Scalar;
use crate::util::Real;

/// How far the norm of a vector may be from 1 for it to still count as a unit vector.
///
/// The same threshold applies to every scalar kind that can be checked numerically; for
/// differentiable scalars only the value is checked, never the derivatives.
pub const UNIT_VECTOR_TOLERANCE: f64 = 4. * f64::EPSILON;

/// What [`validate_unit_vector`] does with a vector that is not a unit vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Return a [`NotUnitVectorError`].
    Strict,
    /// Emit a warning and carry on.
    Lenient,
}

/// The numeric norm of a vector and how far it is from 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitVectorMeasurement {
    /// `|v|`
    pub norm: f64,
    /// `||v| - 1|`
    pub deviation: f64,
}

impl UnitVectorMeasurement {
    fn of(components: [f64; 3]) -> Self {
        let [x, y, z] = components;
        let norm = (x * x + y * y + z * z).sqrt();
        Self {
            norm,
            deviation: (norm - 1.).abs(),
        }
    }

    /// Whether the deviation is within [`UNIT_VECTOR_TOLERANCE`].
    ///
    /// NaN and infinite norms are never acceptable.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        self.deviation <= UNIT_VECTOR_TOLERANCE
    }
}

/// Returned under [`Policy::Strict`] when a vector is not a unit vector.
///
/// The `Display` output is a stable, fully deterministic diagnostic:
///
/// ```text
/// Function(): The unit_vector argument 1 2 3 is not a unit vector.
/// |unit_vector| = 3.7416573867739413
/// ||unit_vector| - 1| = 2.7416573867739413 is greater than 8.881784197001252e-16.
/// ```
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub struct NotUnitVectorError {
    function_name: String,
    unit_vector: [f64; 3],
    measurement: UnitVectorMeasurement,
}

impl NotUnitVectorError {
    /// The name of the operation that was given the vector.
    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// The offending vector (its value components, for differentiable scalars).
    #[must_use]
    pub fn unit_vector(&self) -> [f64; 3] {
        self.unit_vector
    }

    #[must_use]
    pub fn norm(&self) -> f64 {
        self.measurement.norm
    }

    #[must_use]
    pub fn deviation(&self) -> f64 {
        self.measurement.deviation
    }

    #[must_use]
    pub fn tolerance(&self) -> f64 {
        UNIT_VECTOR_TOLERANCE
    }
}

impl Display for NotUnitVectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.unit_vector;
        writeln!(
            f,
            "{}(): The unit_vector argument {} {} {} is not a unit vector.",
            self.function_name,
            Real(x),
            Real(y),
            Real(z)
        )?;
        writeln!(f, "|unit_vector| = {}", Real(self.measurement.norm))?;
        write!(
            f,
            "||unit_vector| - 1| = {} is greater than {}.",
            Real(self.measurement.deviation),
            Real(UNIT_VECTOR_TOLERANCE)
        )
    }
}

/// `v0² + v1² + v2²`, in that order and without any normalization.
pub(crate) fn squared_norm<S: Scalar>(vector: &Vector3<S>) -> S {
    vector[0].clone() * vector[0].clone()
        + vector[1].clone() * vector[1].clone()
        + vector[2].clone() * vector[2].clone()
}

fn numeric_components<S: Scalar>(vector: &Vector3<S>) -> Option<[f64; 3]> {
    Some([
        vector[0].numeric_value()?,
        vector[1].numeric_value()?,
        vector[2].numeric_value()?,
    ])
}

/// Measures how far `vector` is from unit length.
///
/// Returns `None` for symbolic vectors, whose norm is unknown until evaluation.
#[must_use]
pub fn measure_unit_vector<S: Scalar>(vector: &Vector3<S>) -> Option<UnitVectorMeasurement> {
    numeric_components(vector).map(UnitVectorMeasurement::of)
}

/// Checks that `vector` is a unit vector and returns its squared norm.
///
/// `function_name` names the operation on whose behalf the check is made and is embedded in the
/// diagnostic. What happens when the vector is not within [`UNIT_VECTOR_TOLERANCE`] of unit
/// length depends on `policy`; see [`Policy`].
///
/// For symbolic vectors the check is skipped under either policy, and the returned squared norm is
/// the unevaluated expression `v0*v0 + v1*v1 + v2*v2`.
///
/// ```
/// use kinemath::{validate_unit_vector, Policy};
/// use nalgebra::Vector3;
///
/// let squared_norm = validate_unit_vector(&Vector3::new(0., 1., 0.), "Example", Policy::Strict);
/// assert_eq!(squared_norm, Ok(1.));
///
/// let err = validate_unit_vector(&Vector3::new(1., 2., 3.), "Example", Policy::Strict).unwrap_err();
/// assert!(err.to_string().starts_with("Example(): The unit_vector argument 1 2 3 is not"));
///
/// let squared_norm = validate_unit_vector(&Vector3::new(1., 2., 3.), "Example", Policy::Lenient);
/// assert_eq!(squared_norm, Ok(14.));
/// ```
pub fn validate_unit_vector<S: Scalar>(
    vector: &Vector3<S>,
    function_name: &str,
    policy: Policy,
) -> Result<S, NotUnitVectorError> {
    let squared_norm = squared_norm(vector);
    let Some(unit_vector) = numeric_components(vector) else {
        return Ok(squared_norm);
    };

    let measurement = UnitVectorMeasurement::of(unit_vector);
    if measurement.is_acceptable() {
        return Ok(squared_norm);
    }

    let error = NotUnitVectorError {
        function_name: function_name.to_owned(),
        unit_vector,
        measurement,
    };
    match policy {
        Policy::Strict => Err(error),
        Policy::Lenient => {
            tracing::warn!(function = function_name, kind = %S::KIND, "{error}");
            Ok(squared_norm)
        }
    }
}
