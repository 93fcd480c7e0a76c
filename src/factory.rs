//! Factories turning preferences into candidate points.
//!
//! [`IterationPointFactory`] builds the scalarized subproblem of each
//! requested [`ScalarKind`] and solves it. [`BoundsFactory`] computes, for
//! each objective, how far it can still improve without any other objective
//! getting worse than a given point.

use crate::{
  error::{Error, Result},
  optimizer::{Optimizer, Solution},
  preference::{Class, Preference, PreferenceInformation},
  problem::Problem,
  scalarization::{AchievementProblem, EpsilonConstraintProblem, NimbusProblem, ScalarKind},
};

/// Distance of the utopian point below the ideal point.
pub const UTOPIA_OFFSET: f64 = 1e-6;

// smallest denominator allowed when turning distances into weights
const MIN_DENOMINATOR: f64 = 1e-6;

fn normalizing_weights(problem: &dyn Problem) -> Vec<f64> {
  problem
    .ranges()
    .into_iter()
    .map(|r| 1.0 / r.max(MIN_DENOMINATOR))
    .collect()
}

/// Solves one scalarized subproblem per requested flavour.
///
/// | Flavour       | Reference point `q'`  | Weights `μ_i`                 |
/// |:--------------|:----------------------|:------------------------------|
/// | `Achievement` | `q`                   | `1 / (w_i (nadir_i - ideal_i))`, `0` if `w_i = 0` |
/// | `Stom`        | `ideal - 1e-6`        | `1 / (q_i - q'_i)`            |
/// | `Guess`       | `nadir`               | `1 / (nadir_i - q_i)`, `0` for free objectives |
/// | `Nimbus`      | classification target | `1 / (nadir_i - ideal_i)`     |
///
/// `q` is the reference point implied by the preference, or the one passed
/// in if the preference implies none, and `w` are preference's weights. A
/// heavier weight lets its objective travel further from `q`; objectives
/// weighted `0` take no part in the max term.
#[derive(Clone, Debug)]
pub struct IterationPointFactory<O> {
  optimizer: O,
  rho: f64,
}

impl<O: Optimizer> IterationPointFactory<O> {
  /// Creates a factory solving subproblems augmented with `rho`.
  pub fn new(optimizer: O, rho: f64) -> Self {
    Self { optimizer, rho }
  }

  /// Returns the optimizer.
  pub fn optimizer_mut(&mut self) -> &mut O {
    &mut self.optimizer
  }

  /// Solves the subproblem of flavour `kind`.
  pub fn result(
    &mut self,
    problem: &dyn Problem,
    kind: ScalarKind,
    preference: &Preference,
    reference: &[f64],
  ) -> Result<Solution> {
    let k = problem.objective_count();
    let q = preference
      .reference_point()
      .unwrap_or_else(|| reference.to_vec());
    Error::check_len("reference point", k, q.len())?;

    let solution = match kind {
      ScalarKind::Nimbus => {
        let classification = preference.as_classification().ok_or_else(|| {
          Error::validation(None, "NIMBUS subproblem needs a classification")
        })?;
        let scalarized =
          NimbusProblem::new(problem, classification, normalizing_weights(problem), self.rho)?;
        self.optimizer.search(&scalarized)?
      }
      ScalarKind::Achievement => {
        let weights = preference
          .weights()
          .iter()
          .zip(problem.ranges())
          .map(|(&w, r)| if w > 0.0 { 1.0 / (w * r.max(MIN_DENOMINATOR)) } else { 0.0 })
          .collect();
        let scalarized = AchievementProblem::new(problem, q, weights, self.rho)?;
        self.optimizer.search(&scalarized)?
      }
      ScalarKind::Stom => {
        let utopian: Vec<f64> = problem.ideal().iter().map(|z| z - UTOPIA_OFFSET).collect();
        let weights = q
          .iter()
          .zip(&utopian)
          .map(|(q, u)| 1.0 / (q - u).max(MIN_DENOMINATOR))
          .collect();
        let scalarized = AchievementProblem::new(problem, utopian, weights, self.rho)?;
        self.optimizer.search(&scalarized)?
      }
      ScalarKind::Guess => {
        let free: Vec<usize> = preference
          .as_classification()
          .map(|c| c.indices(Class::Free).collect())
          .unwrap_or_default();
        let nadir = problem.nadir().to_vec();
        let weights = q
          .iter()
          .zip(&nadir)
          .enumerate()
          .map(|(i, (q, n))| {
            if free.contains(&i) {
              0.0
            } else {
              1.0 / (n - q).max(MIN_DENOMINATOR)
            }
          })
          .collect();
        let scalarized = AchievementProblem::new(problem, nadir, weights, self.rho)?;
        self.optimizer.search(&scalarized)?
      }
    };
    log::debug!("{kind:?} subproblem solved at {:?}", solution.objectives);
    Ok(solution)
  }

  /// Solves one subproblem per flavour of `kinds`, returning solutions in the
  /// same order.
  pub fn results(
    &mut self,
    problem: &dyn Problem,
    kinds: &[ScalarKind],
    preference: &Preference,
    reference: &[f64],
  ) -> Result<Vec<Solution>> {
    kinds
      .iter()
      .map(|&kind| self.result(problem, kind, preference, reference))
      .collect()
  }
}

/// Computes the best value each objective can reach while every other
/// objective stays at least as good as a given point.
///
/// For objective `i` it solves the epsilon-constraint problem minimizing
/// `f_i` subject to `f_j <= current_j` for all `j != i`.
#[derive(Clone, Debug)]
pub struct BoundsFactory<O> {
  optimizer: O,
}

impl<O: Optimizer> BoundsFactory<O> {
  /// Creates a factory solving its subproblems with `optimizer`.
  pub fn new(optimizer: O) -> Self {
    Self { optimizer }
  }

  /// Returns one bound per objective.
  pub fn bounds(&mut self, problem: &dyn Problem, current: &[f64]) -> Result<Vec<f64>> {
    let k = problem.objective_count();
    Error::check_len("current point", k, current.len())?;

    let mut objective_bounds: Vec<Option<f64>> = current.iter().copied().map(Some).collect();
    let mut bounds = Vec::with_capacity(k);
    for i in 0..k {
      let fixed = objective_bounds[i].take();
      let solution = EpsilonConstraintProblem::new(problem, objective_bounds.clone())
        .and_then(|scalarized| self.optimizer.search(&scalarized));
      objective_bounds[i] = fixed;
      bounds.push(solution?.objectives[i]);
    }
    Ok(bounds)
  }
}
