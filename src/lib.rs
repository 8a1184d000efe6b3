//! This library provides rigid body transforms and unit-vector checks that are written once and
//! work the same over three kinds of scalar:
//!
//! - plain `f64`;
//! - [`AutoDiff`], which carries partial derivatives alongside each value so that gradients of a
//!   kinematic computation fall out of evaluating it;
//! - [`Expression`], a symbolic scalar that records the computation and is only evaluated once
//!   its [`Variable`]s are given values.
//!
//! The central types are [`RotationMatrix`], [`RollPitchYaw`] and [`RigidTransform`], all generic
//! over [`Scalar`]. Alongside them, [`validate_unit_vector`] decides whether a vector handed to an
//! operation is close enough to unit length, either rejecting it ([`Policy::Strict`]) or logging
//! a warning through [`tracing`] ([`Policy::Lenient`]).
//!
//! Numeric checks (unit length, orthonormality) are made for `f64` and on the value part of
//! [`AutoDiff`]. Symbolic scalars have no value to check until evaluation, so for them the checks
//! are skipped and results are returned unevaluated.
//!
//! # Examples
//!
//! A sensor is mounted 0.5m ahead of a vehicle's origin and yawed by 90°. A point it observes 2m
//! straight ahead of itself is then, in the vehicle's frame:
//!
//! ```
//! use approx::assert_relative_eq;
//! use kinemath::{RigidTransform, RollPitchYaw};
//! use nalgebra::Vector3;
//! use uom::si::{angle::degree, f64::Angle};
//!
//! let mount = RigidTransform::new(
//!     RollPitchYaw::from_angles(
//!         Angle::new::<degree>(0.),
//!         Angle::new::<degree>(0.),
//!         Angle::new::<degree>(90.),
//!     )
//!     .to_rotation(),
//!     Vector3::new(0.5, 0., 0.),
//! );
//!
//! let observed = Vector3::new(2., 0., 0.);
//! assert_relative_eq!(mount * observed, Vector3::new(0.5, 2., 0.), epsilon = 1e-12);
//! ```
//!
//! The same transform with a differentiable yaw gives the sensitivity of the result to that yaw:
//!
//! ```
//! use approx::assert_relative_eq;
//! use kinemath::{AutoDiff, RigidTransform, RotationMatrix};
//! use nalgebra::Vector3;
//!
//! let yaw = AutoDiff::variable(std::f64::consts::FRAC_PI_2, 0, 1);
//! let mount = RigidTransform::new(
//!     RotationMatrix::rot_z(yaw),
//!     Vector3::new(0.5, 0., 0.).map(AutoDiff::constant),
//! );
//!
//! let observed = Vector3::new(2., 0., 0.).map(AutoDiff::constant);
//! let seen = mount.transform_point(&observed);
//! // turning further moves the point backwards along x
//! assert_relative_eq!(seen[0].derivatives()[0], -2., epsilon = 1e-12);
//! ```
//!
//! Unit vectors are checked where they are consumed:
//!
//! ```
//! use kinemath::RotationMatrix;
//! use nalgebra::Vector3;
//!
//! let err = RotationMatrix::from_axis_angle(&Vector3::new(0., 0., 2.), 1.).unwrap_err();
//! assert_eq!(err.norm(), 2.);
//! ```

mod autodiff;
mod rotation;
mod rpy;
mod scalar;
mod symbolic;
mod transform;
mod unit_vector;
mod util;

pub use autodiff::AutoDiff;
pub use rotation::{NotOrthonormalError, RotationMatrix, ORTHONORMALITY_TOLERANCE};
pub use rpy::RollPitchYaw;
pub use scalar::{Scalar, ScalarKind};
pub use symbolic::{Environment, EvaluationError, Expression, Variable};
pub use transform::{InvalidHomogeneousCoordinateError, RigidTransform};
pub use unit_vector::{
    measure_unit_vector, validate_unit_vector, NotUnitVectorError, Policy, UnitVectorMeasurement,
    UNIT_VECTOR_TOLERANCE,
};
