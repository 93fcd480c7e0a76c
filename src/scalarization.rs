//! Scalarizations turning a multi-objective problem into single-objective
//! subproblems.
//!
//! A [`Scalarization`] wraps a [`Problem`] and maps each objective vector to
//! a scalar value to minimize plus a set of objective bounds. The bounds are
//! constraints of the form `f_j(x) <= bound`, where `j` is given by
//! [`Scalarization::bounded_objectives`]. Scalarizations are built fresh for
//! every iteration and dropped after the optimizer has solved them.

pub mod achievement;
pub mod epsilon;
pub mod nimbus;

use serde::{Deserialize, Serialize};

pub use self::{
  achievement::AchievementProblem,
  epsilon::EpsilonConstraintProblem,
  nimbus::NimbusProblem,
};
use crate::{error::Result, problem::Problem};

/// Scalarized values of a batch of objective vectors.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalarized {
  /// One scalar value per objective vector.
  pub values: Vec<f64>,
  /// One row of objective bounds per objective vector, matching
  /// [`Scalarization::bounded_objectives`] column by column.
  pub bounds: Vec<Vec<f64>>,
}

/// Scalarized value and constraint values of a single decision vector.
#[derive(Clone, Debug, PartialEq)]
pub struct PointEvaluation {
  /// Objective values.
  pub objectives: Vec<f64>,
  /// Scalar value to minimize.
  pub value: f64,
  /// Constraint values, satisfied when not positive. Objective bounds come
  /// first, then problem's own constraints.
  pub constraints: Vec<f64>,
}

impl PointEvaluation {
  /// Returns the sum of positive constraint values.
  pub fn violation(&self) -> f64 {
    self.constraints.iter().map(|c| c.max(0.0)).sum()
  }

  /// Returns `true` if no constraint value exceeds `tolerance`.
  pub fn is_feasible(&self, tolerance: f64) -> bool {
    self.constraints.iter().all(|&c| c <= tolerance)
  }
}

/// A single-objective subproblem derived from a multi-objective problem.
pub trait Scalarization {
  /// Returns the wrapped problem.
  fn problem(&self) -> &dyn Problem;

  /// Scalarizes a batch of objective vectors.
  fn evaluate(&self, objectives: &[Vec<f64>]) -> Result<Scalarized>;

  /// Returns indices of objectives bounded by the columns of
  /// [`Scalarized::bounds`]. None by default.
  fn bounded_objectives(&self) -> &[usize] {
    &[]
  }

  /// Evaluates the wrapped problem at `decision` and scalarizes the result.
  fn evaluate_decision(&self, decision: &[f64]) -> Result<PointEvaluation> {
    let objectives = self.problem().evaluate_one(decision)?;
    let scalarized = self.evaluate(std::slice::from_ref(&objectives))?;
    let bounds = scalarized.bounds.first().map(Vec::as_slice).unwrap_or(&[]);
    let mut constraints: Vec<f64> = self
      .bounded_objectives()
      .iter()
      .zip(bounds)
      .map(|(&j, bound)| objectives[j] - bound)
      .collect();
    constraints.extend(self.problem().constraints(decision, &objectives)?);
    Ok(PointEvaluation {
      value: scalarized.values.first().copied().unwrap_or(f64::INFINITY),
      objectives,
      constraints,
    })
  }
}

/// Flavours of scalarization an iteration can be asked to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScalarKind {
  /// Classification-based NIMBUS subproblem, see [`NimbusProblem`].
  Nimbus,
  /// Satisficing trade-off method: reference point seen from the utopian
  /// point.
  Stom,
  /// Plain achievement scalarizing function towards the reference point.
  Achievement,
  /// GUESS: reference point seen from the nadir point.
  Guess,
}

impl ScalarKind {
  /// All flavours, in the order NIMBUS presents them.
  pub const ALL: [ScalarKind; 4] = [Self::Nimbus, Self::Stom, Self::Achievement, Self::Guess];
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::problem::tests::schaffer;

  #[test]
  fn test_point_evaluation() {
    let p = schaffer().with_constraints(|x, _| vec![x[0] - 1.5]);
    let s = EpsilonConstraintProblem::new(&p, vec![None, Some(0.5)]).unwrap();
    let e = s.evaluate_decision(&[2.0]).unwrap();
    assert_eq!(e.objectives, vec![4.0, 0.0]);
    assert_eq!(e.value, 4.0);
    assert_eq!(e.constraints, vec![-0.5, 0.5]);
    assert_eq!(e.violation(), 0.5);
    assert!(!e.is_feasible(1e-9));
    assert!(e.is_feasible(0.5));
  }
}
