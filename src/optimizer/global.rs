//! Adapter for stochastic global solvers.

use typed_builder::TypedBuilder;

use super::{
  DifferentialEvolution, GlobalMinimizer, Optimizer, Solution, FEASIBILITY_TOLERANCE,
};
use crate::{
  error::{Error, Result},
  scalarization::Scalarization,
};

/// Solves scalarized subproblems with a [`GlobalMinimizer`] searching the
/// box spanned by variable bounds.
///
/// Constraints are handled with a death penalty: a point violating any
/// constraint has `penalty` added to its value. If even the best point found
/// is infeasible, the search fails with [`Error::Infeasible`] instead of
/// returning it.
///
/// Every variable must be bounded.
///
/// # Examples
/// ```
/// # use imo::optimizer::{DifferentialEvolution, GlobalOptimizer};
/// let optimizer = GlobalOptimizer::builder()
///   .minimizer(DifferentialEvolution::builder().seed(1).build())
///   .penalty(1e9)
///   .build();
/// ```
#[derive(TypedBuilder, Clone, Debug)]
pub struct GlobalOptimizer<G = DifferentialEvolution> {
  /// Underlying solver.
  minimizer: G,
  /// Value added to the objective of infeasible points.
  #[builder(default = 1e6)]
  penalty: f64,
}

impl Default for GlobalOptimizer {
  fn default() -> Self {
    Self::builder().minimizer(DifferentialEvolution::default()).build()
  }
}

impl<G> GlobalOptimizer<G> {
  /// Wraps a global minimizer with the default penalty.
  pub fn new(minimizer: G) -> Self {
    Self::builder().minimizer(minimizer).build()
  }
}

impl<G: GlobalMinimizer> Optimizer for GlobalOptimizer<G> {
  fn search(&mut self, scalarization: &dyn Scalarization) -> Result<Solution> {
    let bounds = scalarization
      .problem()
      .variables()
      .iter()
      .map(|v| {
        v.bounds().ok_or_else(|| {
          Error::Configuration(format!(
            "global search needs bounds on every variable, `{}` has none",
            v.name()
          ))
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let penalty = self.penalty;
    let objective = |x: &[f64]| -> Result<f64> {
      let e = scalarization.evaluate_decision(x)?;
      Ok(if e.constraints.iter().any(|&c| c > 0.0) {
        e.value + penalty
      } else {
        e.value
      })
    };
    let minimum = self.minimizer.minimize(&objective, &bounds)?;

    let evaluation = scalarization.evaluate_decision(&minimum.x)?;
    log::debug!(
      "global search finished after {} evaluations, value {}",
      minimum.evaluations,
      evaluation.value
    );
    if !evaluation.is_feasible(FEASIBILITY_TOLERANCE) {
      let violation = evaluation.violation();
      log::warn!(
        "global search never sampled a feasible point, best point is penalized with {penalty} \
         and violates constraints by {violation}"
      );
      return Err(Error::Infeasible {
        decision: minimum.x,
        objectives: evaluation.objectives,
        violation,
      });
    }
    Ok(Solution {
      decision: minimum.x,
      objectives: evaluation.objectives,
      value: evaluation.value,
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;
  use crate::{
    problem::{
      tests::{schaffer, triangle},
      AnalyticProblem, Domain, Variable,
    },
    scalarization::{AchievementProblem, EpsilonConstraintProblem},
  };

  fn seeded() -> GlobalOptimizer {
    GlobalOptimizer::new(DifferentialEvolution::builder().seed(17).build())
  }

  #[test]
  fn test_achievement_on_schaffer() {
    let p = schaffer();
    let a = AchievementProblem::new(&p, vec![0.0, 0.0], vec![1.0, 1.0], 1e-6).unwrap();
    let s = seeded().search(&a).unwrap();
    assert_abs_diff_eq!(s.decision[0], 1.0, epsilon = 1e-3);
  }

  #[test]
  fn test_penalty_steers_into_feasible_region() {
    let p = triangle();
    let e = EpsilonConstraintProblem::new(&p, vec![None, Some(0.5), Some(10.0)]).unwrap();
    let s = seeded().search(&e).unwrap();
    assert!(s.objectives[1] <= 0.5 + 1e-6);
    assert_abs_diff_eq!(s.objectives[0], (1.0 - 0.5f64.sqrt()).powi(2), epsilon = 1e-2);
  }

  #[test]
  fn test_reports_infeasible() {
    let p = schaffer();
    let e = EpsilonConstraintProblem::new(&p, vec![Some(-1.0), None]).unwrap();
    match seeded().search(&e) {
      Err(Error::Infeasible { violation, .. }) => assert!(violation > 0.0),
      other => panic!("expected an infeasible error, got {other:?}"),
    }
  }

  #[test]
  fn test_requires_bounded_variables() {
    let domain = Domain::new(vec![Variable::new("x")], vec![0.0], vec![1.0]).unwrap();
    let p = AnalyticProblem::new(domain, |x: &[f64]| vec![x[0].abs()]);
    let a = AchievementProblem::new(&p, vec![0.0], vec![1.0], 0.0).unwrap();
    assert!(matches!(
      GlobalOptimizer::default().search(&a),
      Err(Error::Configuration(_))
    ));
  }

  #[test]
  fn test_penalty_is_configurable() {
    let o = GlobalOptimizer::builder()
      .minimizer(DifferentialEvolution::default())
      .penalty(42.0)
      .build();
    assert_eq!(o.penalty, 42.0);
    assert_eq!(GlobalOptimizer::default().penalty, 1e6);
  }
}
