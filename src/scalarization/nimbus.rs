//! The classification-based NIMBUS subproblem.

use super::{achievement::Asf, Scalarization, Scalarized};
use crate::{
  error::{Error, Result},
  preference::{Class, Classification, PreferenceInformation},
  problem::Problem,
};

/// Turns a [`Classification`] into an achievement-style subproblem.
///
/// Objectives classified `<` form the max term, aiming at the classification
/// target. Every objective enters the augmentation term. The remaining
/// classes become objective bounds:
///
/// | Class | Bound                     |
/// |:-----:|:--------------------------|
/// | `<`   | `f_i <= current_i`        |
/// | `<=`  | `f_i <= aspiration_i`     |
/// | `=`   | `f_i <= current_i`        |
/// | `>=`  | `f_i <= bound_i`          |
/// | `0`   | none                      |
pub struct NimbusProblem<'p> {
  problem: &'p dyn Problem,
  asf: Asf,
  bounded: Vec<usize>,
  bounds: Vec<f64>,
}

impl<'p> NimbusProblem<'p> {
  /// Creates the subproblem from a classification, non-negative weights per
  /// objective and augmentation coefficient `rho`.
  pub fn new(
    problem: &'p dyn Problem,
    classification: &Classification,
    weights: Vec<f64>,
    rho: f64,
  ) -> Result<Self> {
    classification.validate(problem)?;
    Error::check_len("weights", problem.objective_count(), weights.len())?;

    let classes = classification.classes();
    let max_weights = classes
      .iter()
      .zip(&weights)
      .map(|((class, _), &w)| (*class == Class::Improve && w > 0.0).then_some(w))
      .collect();
    let sum_weights = weights.iter().map(|&w| if w > 0.0 { w } else { 1.0 }).collect();
    let (bounded, bounds): (Vec<usize>, Vec<f64>) = (0..classes.len())
      .filter_map(|i| classification.bound(i).map(|b| (i, b)))
      .unzip();

    Ok(Self {
      problem,
      asf: Asf::new(classification.target(), max_weights, sum_weights, rho)?,
      bounded,
      bounds,
    })
  }
}

impl Scalarization for NimbusProblem<'_> {
  fn problem(&self) -> &dyn Problem {
    self.problem
  }

  fn evaluate(&self, objectives: &[Vec<f64>]) -> Result<Scalarized> {
    Ok(Scalarized {
      values: objectives
        .iter()
        .map(|f| self.asf.value(f))
        .collect::<Result<_>>()?,
      bounds: vec![self.bounds.clone(); objectives.len()],
    })
  }

  fn bounded_objectives(&self) -> &[usize] {
    &self.bounded
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::problem::tests::triangle;

  #[test]
  fn test_bounds_follow_classes() {
    let p = triangle();
    let c = Classification::from_tokens(
      &p,
      &[1.0, 1.0, 1.0],
      &[("<", None), (">=", Some(1.5)), ("0", None)],
    )
    .unwrap();
    let n = NimbusProblem::new(&p, &c, vec![1.0; 3], 0.0).unwrap();
    assert_eq!(n.bounded_objectives(), &[0, 1]);
    let s = n.evaluate(&[vec![0.5, 1.2, 1.8]]).unwrap();
    assert_eq!(s.bounds, vec![vec![1.0, 1.5]]);
    // only objective 0 is in the max term, target is the ideal 0.0
    assert_relative_eq!(s.values[0], 0.5);
  }

  #[test]
  fn test_augmentation_covers_all_objectives() {
    let p = triangle();
    let c = Classification::from_tokens(
      &p,
      &[1.0, 1.0, 1.0],
      &[("<", None), ("<=", Some(0.5)), (">=", Some(2.0))],
    )
    .unwrap();
    let n = NimbusProblem::new(&p, &c, vec![1.0; 3], 0.1).unwrap();
    // target [0, 0.5, 2]; deviations [1, 0.5, -1]
    let s = n.evaluate(&[vec![1.0, 1.0, 1.0]]).unwrap();
    assert_relative_eq!(s.values[0], 1.0 + 0.1 * 0.5);
    assert_eq!(s.bounds[0], vec![1.0, 0.5, 2.0]);
  }
}
