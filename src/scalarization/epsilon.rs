//! The epsilon-constraint method.

use super::{Scalarization, Scalarized};
use crate::{
  error::{Error, Result},
  problem::Problem,
};

/// Minimizes one objective while every other objective `j` is bounded by
/// `f_j(x) <= ε_j`.
pub struct EpsilonConstraintProblem<'p> {
  problem: &'p dyn Problem,
  selected: usize,
  bounded: Vec<usize>,
  bounds: Vec<f64>,
}

impl<'p> EpsilonConstraintProblem<'p> {
  /// Creates the subproblem from one entry per objective: `None` for the
  /// objective to minimize, `Some(ε_j)` for each bounded one. Exactly one
  /// entry must be `None`.
  pub fn new(problem: &'p dyn Problem, obj_bounds: Vec<Option<f64>>) -> Result<Self> {
    Error::check_len("objective bounds", problem.objective_count(), obj_bounds.len())?;
    let mut free = obj_bounds
      .iter()
      .enumerate()
      .filter(|(_, b)| b.is_none())
      .map(|(i, _)| i);
    let selected = match (free.next(), free.next()) {
      (Some(i), None) => i,
      (None, _) => {
        return Err(Error::Configuration(
          "epsilon-constraint problem has no objective to minimize".into(),
        ))
      }
      (Some(_), Some(_)) => {
        return Err(Error::Configuration(
          "epsilon-constraint problem has more than one objective to minimize".into(),
        ))
      }
    };
    let (bounded, bounds): (Vec<usize>, Vec<f64>) = obj_bounds
      .iter()
      .enumerate()
      .filter_map(|(i, b)| b.map(|b| (i, b)))
      .unzip();
    Ok(Self {
      problem,
      selected,
      bounded,
      bounds,
    })
  }

  /// Returns the index of the minimized objective.
  pub fn selected(&self) -> usize {
    self.selected
  }
}

impl Scalarization for EpsilonConstraintProblem<'_> {
  fn problem(&self) -> &dyn Problem {
    self.problem
  }

  fn evaluate(&self, objectives: &[Vec<f64>]) -> Result<Scalarized> {
    let k = self.problem.objective_count();
    let values = objectives
      .iter()
      .map(|f| {
        Error::check_len("objective vector", k, f.len())?;
        Ok(f[self.selected])
      })
      .collect::<Result<_>>()?;
    Ok(Scalarized {
      values,
      bounds: vec![self.bounds.clone(); objectives.len()],
    })
  }

  fn bounded_objectives(&self) -> &[usize] {
    &self.bounded
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::problem::tests::{schaffer, triangle};

  #[test]
  fn test_selected_objective_and_repeated_bounds() {
    let p = schaffer();
    let e = EpsilonConstraintProblem::new(&p, vec![None, Some(0.5)]).unwrap();
    let s = e.evaluate(&[vec![0.2, 0.3], vec![0.1, 0.6]]).unwrap();
    assert_eq!(s.values, vec![0.2, 0.1]);
    assert_eq!(s.bounds, vec![vec![0.5], vec![0.5]]);
    assert_eq!(e.bounded_objectives(), &[1]);
    assert_eq!(e.selected(), 0);
  }

  #[test]
  fn test_requires_exactly_one_free_objective() {
    let p = triangle();
    assert!(matches!(
      EpsilonConstraintProblem::new(&p, vec![Some(1.0), Some(1.0), Some(1.0)]),
      Err(Error::Configuration(_))
    ));
    assert!(matches!(
      EpsilonConstraintProblem::new(&p, vec![None, Some(1.0), None]),
      Err(Error::Configuration(_))
    ));
    let e = EpsilonConstraintProblem::new(&p, vec![Some(1.0), None, Some(2.0)]).unwrap();
    assert_eq!(e.selected(), 1);
    assert_eq!(e.bounded_objectives(), &[0, 2]);
  }
}
