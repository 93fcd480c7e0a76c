//! Optimizers solving scalarized subproblems.
//!
//! An [`Optimizer`] takes a [`Scalarization`] and returns the decision vector
//! minimizing it, whatever solver it uses internally. Two adapters are
//! provided:
//! - [`LocalOptimizer`] hands objective, scalarization bounds, problem
//!   constraints and variable bounds to a derivative-free constrained
//!   [`ConstrainedMinimizer`], starting from problem's starting point;
//! - [`GlobalOptimizer`] adds a death penalty to infeasible points and hands
//!   the penalized objective and variable bounds to a stochastic
//!   [`GlobalMinimizer`].
//!
//! Both fail with [`Error::Infeasible`] instead of returning a point that
//! violates constraints.
//!
//! [`LocalOptimizer`]: local::LocalOptimizer
//! [`GlobalOptimizer`]: global::GlobalOptimizer
//! [`Error::Infeasible`]: crate::error::Error::Infeasible

pub mod differential_evolution;
pub mod global;
pub mod local;
pub mod nelder_mead;

pub use self::{
  differential_evolution::DifferentialEvolution,
  global::GlobalOptimizer,
  local::LocalOptimizer,
  nelder_mead::NelderMead,
};
use crate::{error::Result, scalarization::Scalarization};

/// Largest constraint value still considered satisfied.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// A scalar function of a decision vector, as seen by solvers.
pub type ScalarFn<'a> = dyn Fn(&[f64]) -> Result<f64> + 'a;

/// Best point a solver found.
#[derive(Clone, Debug, PartialEq)]
pub struct Minimum {
  /// Decision vector.
  pub x: Vec<f64>,
  /// Objective value at `x`.
  pub value: f64,
  /// Sum of positive constraint values at `x`.
  pub violation: f64,
  /// Number of objective evaluations spent.
  pub evaluations: usize,
}

/// Solution of a scalarized subproblem.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
  /// Decision vector.
  pub decision: Vec<f64>,
  /// Objective values of the underlying problem at `decision`.
  pub objectives: Vec<f64>,
  /// Scalarized value at `decision`.
  pub value: f64,
}

/// A solver minimizing a function subject to constraints `c(x) <= 0`,
/// starting from `x0`.
pub trait ConstrainedMinimizer {
  /// Returns the best point found.
  fn minimize(
    &mut self,
    objective: &ScalarFn<'_>,
    constraints: &[&ScalarFn<'_>],
    x0: &[f64],
  ) -> Result<Minimum>;
}

/// A solver searching a box for the global minimum of a function.
pub trait GlobalMinimizer {
  /// Returns the best point found within `bounds`, one `(lower, upper)` pair
  /// per variable.
  fn minimize(&mut self, objective: &ScalarFn<'_>, bounds: &[(f64, f64)]) -> Result<Minimum>;
}

/// Solves scalarized subproblems.
pub trait Optimizer {
  /// Returns the solution of `scalarization` within problem's variable
  /// bounds and scalarization's constraints.
  fn search(&mut self, scalarization: &dyn Scalarization) -> Result<Solution>;
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
  fn search(&mut self, scalarization: &dyn Scalarization) -> Result<Solution> {
    (**self).search(scalarization)
  }
}
