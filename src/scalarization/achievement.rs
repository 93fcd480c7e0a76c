//! Wierzbicki's achievement scalarizing function.

use super::{Scalarization, Scalarized};
use crate::{
  error::{Error, Result},
  problem::Problem,
};

/// The augmented max term shared by achievement-style subproblems:
/// `max_{i ∈ M} μ_i (f_i - q_i) + ρ Σ_i s_i (f_i - q_i)`.
#[derive(Clone, Debug)]
pub(crate) struct Asf {
  reference: Vec<f64>,
  // `None` excludes the objective from the max term
  max_weights: Vec<Option<f64>>,
  sum_weights: Vec<f64>,
  rho: f64,
}

impl Asf {
  pub(crate) fn new(
    reference: Vec<f64>,
    max_weights: Vec<Option<f64>>,
    sum_weights: Vec<f64>,
    rho: f64,
  ) -> Result<Self> {
    if max_weights.iter().all(Option::is_none) {
      return Err(Error::Configuration(
        "achievement function has no objective in its max term".into(),
      ));
    }
    if !(rho >= 0.0) {
      return Err(Error::Configuration(format!(
        "augmentation coefficient must not be negative, got {rho}"
      )));
    }
    Ok(Self {
      reference,
      max_weights,
      sum_weights,
      rho,
    })
  }

  pub(crate) fn value(&self, f: &[f64]) -> Result<f64> {
    Error::check_len("objective vector", self.reference.len(), f.len())?;
    let deviations = f.iter().zip(&self.reference).map(|(f, q)| f - q);
    let (max, sum) = deviations.zip(self.max_weights.iter().zip(&self.sum_weights)).fold(
      (f64::NEG_INFINITY, 0.0),
      |(max, sum), (d, (mw, sw))| {
        let max = mw.map_or(max, |w| max.max(w * d));
        (max, sum + sw * d)
      },
    );
    Ok(max + self.rho * sum)
  }
}

/// Minimizes `max_i μ_i (f_i - q_i) + ρ Σ_i μ_i (f_i - q_i)`.
///
/// Minimizers are Pareto optimal for `ρ > 0` and at least weakly Pareto
/// optimal for `ρ = 0`. An objective with `μ_i = 0` takes no part in the max
/// term but still enters the augmentation with unit weight.
pub struct AchievementProblem<'p> {
  problem: &'p dyn Problem,
  asf: Asf,
}

impl<'p> AchievementProblem<'p> {
  /// Creates the subproblem for reference point `reference`, non-negative
  /// weights `weights` and augmentation coefficient `rho`.
  pub fn new(
    problem: &'p dyn Problem,
    reference: Vec<f64>,
    weights: Vec<f64>,
    rho: f64,
  ) -> Result<Self> {
    let k = problem.objective_count();
    Error::check_len("reference point", k, reference.len())?;
    Error::check_len("weights", k, weights.len())?;
    if let Some(i) = weights.iter().position(|w| !(w.is_finite() && *w >= 0.0)) {
      return Err(Error::Configuration(format!(
        "weight {} of objective {i} must be finite and not negative",
        weights[i]
      )));
    }
    let max_weights = weights.iter().map(|&w| (w > 0.0).then_some(w)).collect();
    let sum_weights = weights.iter().map(|&w| if w > 0.0 { w } else { 1.0 }).collect();
    Ok(Self {
      problem,
      asf: Asf::new(reference, max_weights, sum_weights, rho)?,
    })
  }
}

impl Scalarization for AchievementProblem<'_> {
  fn problem(&self) -> &dyn Problem {
    self.problem
  }

  fn evaluate(&self, objectives: &[Vec<f64>]) -> Result<Scalarized> {
    Ok(Scalarized {
      values: objectives
        .iter()
        .map(|f| self.asf.value(f))
        .collect::<Result<_>>()?,
      bounds: vec![Vec::new(); objectives.len()],
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use rand::prelude::*;

  use super::*;
  use crate::problem::tests::schaffer;

  #[test]
  fn test_achievement_value() {
    let p = schaffer();
    let a = AchievementProblem::new(&p, vec![1.0, 1.0], vec![1.0, 2.0], 0.1).unwrap();
    let s = a.evaluate(&[vec![2.0, 1.5], vec![0.0, 0.0]]).unwrap();
    // max(1, 1) + 0.1 * (1 + 1)
    assert_relative_eq!(s.values[0], 1.2);
    // max(-1, -2) + 0.1 * (-1 - 2)
    assert_relative_eq!(s.values[1], -1.3);
    assert!(s.bounds.iter().all(Vec::is_empty));
    assert!(a.bounded_objectives().is_empty());
  }

  #[test]
  fn test_monotone_in_each_objective() {
    let p = schaffer();
    let a = AchievementProblem::new(&p, vec![0.5, 0.5], vec![1.0, 1.0], 1e-6).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
      let f: Vec<f64> = (0..2).map(|_| rng.gen_range(-2.0..2.0)).collect();
      let i = rng.gen_range(0..2);
      let mut g = f.clone();
      g[i] -= rng.gen_range(0.0..1.0);
      let s = a.evaluate(&[f, g]).unwrap();
      assert!(s.values[1] <= s.values[0]);
    }
  }

  #[test]
  fn test_zero_weight_leaves_max_term() {
    let p = schaffer();
    let a = AchievementProblem::new(&p, vec![0.0, 0.0], vec![1.0, 0.0], 0.5).unwrap();
    // max term only sees objective 0, augmentation sees both with unit weight
    let s = a.evaluate(&[vec![-1.0, 3.0]]).unwrap();
    assert_relative_eq!(s.values[0], -1.0 + 0.5 * 2.0);
  }

  #[test]
  fn test_rejects_bad_setup() {
    let p = schaffer();
    assert!(AchievementProblem::new(&p, vec![0.0], vec![1.0, 1.0], 0.0).is_err());
    assert!(AchievementProblem::new(&p, vec![0.0, 0.0], vec![0.0, 0.0], 0.0).is_err());
    assert!(AchievementProblem::new(&p, vec![0.0, 0.0], vec![-1.0, 1.0], 0.0).is_err());
    assert!(AchievementProblem::new(&p, vec![0.0, 0.0], vec![1.0, 1.0], -1.0).is_err());
    let a = AchievementProblem::new(&p, vec![0.0, 0.0], vec![1.0, 1.0], 0.0).unwrap();
    assert!(matches!(
      a.evaluate(&[vec![1.0]]),
      Err(Error::DimensionMismatch { .. })
    ));
  }
}
