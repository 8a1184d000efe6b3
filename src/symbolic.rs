//! Symbolic scalars.
//!
//! [`Expression`] is the [symbolic](crate::ScalarKind::Symbolic) scalar kind. Arithmetic on
//! expressions does not compute anything; it builds an immutable expression tree which can later
//! be [evaluated](Expression::evaluate) once values for all its [`Variable`]s are known.
//!
//! Since an expression has no value at construction time, it cannot be compared against a
//! tolerance. Generic code in this crate therefore skips numeric validation for expressions
//! entirely (see [`Scalar::numeric_value`]).
//!
//! ```
//! use kinemath::{Environment, Expression, Variable};
//!
//! let x = Variable::new("x");
//! let e = Expression::from(x.clone()) * Expression::constant(2.) + Expression::constant(1.);
//! assert_eq!(e.to_string(), "((x * 2) + 1)");
//!
//! let env = Environment::from([(x, 3.)]);
//! assert_eq!(e.evaluate(&env), Ok(7.));
//! ```

use num_traits::{One, Zero};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug, Display, Formatter};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::Arc;

use crate::scalar::{Scalar, ScalarKind};
use crate::util::Real;

/// A named unknown in an [`Expression`].
///
/// Two variables are the same variable exactly when they have the same name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: Arc<str>,
}

impl Variable {
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Values for the [`Variable`]s of an expression.
pub type Environment = HashMap<Variable, f64>;

/// Returned by [`Expression::evaluate`] when the expression cannot be reduced to a number.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvaluationError {
    #[error("the variable {0} is not bound in the environment")]
    UnboundVariable(Variable),
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Constant(f64),
    Variable(Variable),
    Add(Expression, Expression),
    Sub(Expression, Expression),
    Mul(Expression, Expression),
    Neg(Expression),
    Sqrt(Expression),
    Sin(Expression),
    Cos(Expression),
    Atan2(Expression, Expression),
}

/// A symbolic scalar expression.
///
/// Expressions are cheap to clone (the tree is shared) and safe to send between threads.
/// Equality is structural: `x * y` and `y * x` are different expressions.
///
/// Building expressions applies the identities `0 + e = e`, `e + 0 = e`, `e - 0 = e`, `1 * e = e`
/// and `e * 1 = e`, but never folds constants, so `2 * 3` stays `(2 * 3)` until evaluated.
#[derive(Clone, PartialEq)]
pub struct Expression(Arc<Node>);

impl Expression {
    fn node(node: Node) -> Self {
        Self(Arc::new(node))
    }

    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::node(Node::Constant(value))
    }

    #[must_use]
    pub fn variable(variable: &Variable) -> Self {
        Self::node(Node::Variable(variable.clone()))
    }

    /// Returns the value of this expression if it is a single constant.
    #[must_use]
    pub fn to_constant(&self) -> Option<f64> {
        match *self.0 {
            Node::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// All the variables this expression depends on.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut variables = BTreeSet::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables(&self, into: &mut BTreeSet<Variable>) {
        match &*self.0 {
            Node::Constant(_) => {}
            Node::Variable(variable) => {
                into.insert(variable.clone());
            }
            Node::Add(a, b) | Node::Sub(a, b) | Node::Mul(a, b) | Node::Atan2(a, b) => {
                a.collect_variables(into);
                b.collect_variables(into);
            }
            Node::Neg(a) | Node::Sqrt(a) | Node::Sin(a) | Node::Cos(a) => {
                a.collect_variables(into)
            }
        }
    }

    /// Computes the value of this expression with the variables bound by `environment`.
    pub fn evaluate(&self, environment: &Environment) -> Result<f64, EvaluationError> {
        Ok(match &*self.0 {
            Node::Constant(value) => *value,
            Node::Variable(variable) => *environment
                .get(variable)
                .ok_or_else(|| EvaluationError::UnboundVariable(variable.clone()))?,
            Node::Add(a, b) => a.evaluate(environment)? + b.evaluate(environment)?,
            Node::Sub(a, b) => a.evaluate(environment)? - b.evaluate(environment)?,
            Node::Mul(a, b) => a.evaluate(environment)? * b.evaluate(environment)?,
            Node::Neg(a) => -a.evaluate(environment)?,
            Node::Sqrt(a) => a.evaluate(environment)?.sqrt(),
            Node::Sin(a) => a.evaluate(environment)?.sin(),
            Node::Cos(a) => a.evaluate(environment)?.cos(),
            Node::Atan2(y, x) => y.evaluate(environment)?.atan2(x.evaluate(environment)?),
        })
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Self::node(Node::Variable(variable))
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Node::Constant(value) => Display::fmt(&Real(*value), f),
            Node::Variable(variable) => Display::fmt(variable, f),
            Node::Add(a, b) => write!(f, "({a} + {b})"),
            Node::Sub(a, b) => write!(f, "({a} - {b})"),
            Node::Mul(a, b) => write!(f, "({a} * {b})"),
            Node::Neg(a) => write!(f, "-{a}"),
            Node::Sqrt(a) => write!(f, "sqrt({a})"),
            Node::Sin(a) => write!(f, "sin({a})"),
            Node::Cos(a) => write!(f, "cos({a})"),
            Node::Atan2(y, x) => write!(f, "atan2({y}, {x})"),
        }
    }
}

// the tree itself is unreadable in Debug output, so render it like Display does
impl Debug for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Add for Expression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        if self.is_exactly(0.) {
            rhs
        } else if rhs.is_exactly(0.) {
            self
        } else {
            Self::node(Node::Add(self, rhs))
        }
    }
}

impl Sub for Expression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        if rhs.is_exactly(0.) {
            self
        } else {
            Self::node(Node::Sub(self, rhs))
        }
    }
}

impl Mul for Expression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.is_exactly(1.) {
            rhs
        } else if rhs.is_exactly(1.) {
            self
        } else {
            Self::node(Node::Mul(self, rhs))
        }
    }
}

impl Neg for Expression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::node(Node::Neg(self))
    }
}

impl AddAssign for Expression {
    fn add_assign(&mut self, rhs: Self) {
        let lhs = std::mem::replace(self, Self::zero());
        *self = lhs + rhs;
    }
}

impl SubAssign for Expression {
    fn sub_assign(&mut self, rhs: Self) {
        let lhs = std::mem::replace(self, Self::zero());
        *self = lhs - rhs;
    }
}

impl MulAssign for Expression {
    fn mul_assign(&mut self, rhs: Self) {
        let lhs = std::mem::replace(self, Self::zero());
        *self = lhs * rhs;
    }
}

impl Zero for Expression {
    fn zero() -> Self {
        Self::constant(0.)
    }

    fn is_zero(&self) -> bool {
        self.is_exactly(0.)
    }
}

impl One for Expression {
    fn one() -> Self {
        Self::constant(1.)
    }
}

impl Scalar for Expression {
    const KIND: ScalarKind = ScalarKind::Symbolic;

    fn from_f64(value: f64) -> Self {
        Self::constant(value)
    }

    fn sqrt(self) -> Self {
        Self::node(Node::Sqrt(self))
    }

    fn sin(self) -> Self {
        Self::node(Node::Sin(self))
    }

    fn cos(self) -> Self {
        Self::node(Node::Cos(self))
    }

    fn atan2(self, x: Self) -> Self {
        Self::node(Node::Atan2(self, x))
    }

    fn numeric_value(&self) -> Option<f64> {
        None
    }

    fn is_exactly(&self, literal: f64) -> bool {
        self.to_constant() == Some(literal)
    }

    fn fmt_scalar(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}
