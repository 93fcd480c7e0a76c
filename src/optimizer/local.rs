//! Adapter for derivative-free constrained local solvers.

use std::cell::{Cell, RefCell};

use super::{
  ConstrainedMinimizer, NelderMead, Optimizer, ScalarFn, Solution, FEASIBILITY_TOLERANCE,
};
use crate::{
  error::{Error, Result},
  scalarization::{PointEvaluation, Scalarization},
};

/// Solves scalarized subproblems with a [`ConstrainedMinimizer`] started at
/// problem's starting point.
///
/// The minimizer sees one inequality constraint per scalarization
/// constraint plus `lower - x_i <= 0` and `x_i - upper <= 0` for every
/// bounded variable.
///
/// # Examples
/// ```
/// # use imo::optimizer::{LocalOptimizer, NelderMead};
/// let optimizer = LocalOptimizer::new(NelderMead::builder().max_evaluations(1000).build());
/// ```
#[derive(Clone, Debug)]
pub struct LocalOptimizer<M = NelderMead> {
  minimizer: M,
}

impl Default for LocalOptimizer {
  fn default() -> Self {
    Self::new(NelderMead::default())
  }
}

impl<M> LocalOptimizer<M> {
  /// Wraps a constrained minimizer.
  pub fn new(minimizer: M) -> Self {
    Self { minimizer }
  }
}

/// Remembers the evaluation of the last decision vector, so the objective and
/// every constraint callback at the same point share one evaluation.
struct EvaluationCache<'s> {
  scalarization: &'s dyn Scalarization,
  last: RefCell<Option<(Vec<f64>, PointEvaluation)>>,
  evaluations: Cell<usize>,
}

impl<'s> EvaluationCache<'s> {
  fn new(scalarization: &'s dyn Scalarization) -> Self {
    Self {
      scalarization,
      last: RefCell::new(None),
      evaluations: Cell::new(0),
    }
  }

  fn with<T>(&self, x: &[f64], f: impl FnOnce(&PointEvaluation) -> T) -> Result<T> {
    let mut last = self.last.borrow_mut();
    if let Some((y, evaluation)) = last.as_ref() {
      if y.as_slice() == x {
        return Ok(f(evaluation));
      }
    }
    let evaluation = self.scalarization.evaluate_decision(x)?;
    self.evaluations.set(self.evaluations.get() + 1);
    let (_, evaluation) = last.insert((x.to_vec(), evaluation));
    Ok(f(&*evaluation))
  }
}

impl<M: ConstrainedMinimizer> Optimizer for LocalOptimizer<M> {
  fn search(&mut self, scalarization: &dyn Scalarization) -> Result<Solution> {
    let problem = scalarization.problem();
    let x0 = problem.starting_point();
    let cache = EvaluationCache::new(scalarization);
    let cache = &cache;
    let count = cache.with(&x0, |e| e.constraints.len())?;

    let objective = |x: &[f64]| -> Result<f64> { cache.with(x, |e| e.value) };
    let mut constraints: Vec<Box<ScalarFn<'_>>> = (0..count)
      .map(|j| {
        Box::new(move |x: &[f64]| -> Result<f64> {
          cache.with(x, |e| e.constraints.get(j).copied().unwrap_or(0.0))
        }) as Box<ScalarFn<'_>>
      })
      .collect();
    for (i, (lower, upper)) in problem
      .variables()
      .iter()
      .enumerate()
      .filter_map(|(i, v)| v.bounds().map(|b| (i, b)))
    {
      constraints.push(Box::new(move |x: &[f64]| -> Result<f64> { Ok(lower - x[i]) }));
      constraints.push(Box::new(move |x: &[f64]| -> Result<f64> { Ok(x[i] - upper) }));
    }
    let constraint_refs: Vec<&ScalarFn<'_>> = constraints.iter().map(|c| &**c).collect();

    let minimum = self.minimizer.minimize(&objective, &constraint_refs, &x0)?;
    let evaluation = cache.with(&minimum.x, PointEvaluation::clone)?;
    let box_violation: f64 = constraint_refs[count..]
      .iter()
      .map(|c| c(&minimum.x).map(|v| v.max(0.0)))
      .sum::<Result<f64>>()?;
    log::debug!(
      "local search finished after {} evaluations ({} scalarizations), value {}",
      minimum.evaluations,
      cache.evaluations.get(),
      evaluation.value
    );

    if !evaluation.is_feasible(FEASIBILITY_TOLERANCE) || box_violation > FEASIBILITY_TOLERANCE {
      let violation = evaluation.violation() + box_violation;
      log::warn!("local search ended at an infeasible point, violation {violation}");
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
      AnalyticProblem, Domain, Problem, Variable,
    },
    scalarization::{AchievementProblem, EpsilonConstraintProblem, Scalarized},
  };

  #[test]
  fn test_achievement_on_schaffer() {
    let p = schaffer();
    // equal weights and reference on the ideal give the symmetric point x = 1
    let a = AchievementProblem::new(&p, vec![0.0, 0.0], vec![1.0, 1.0], 1e-6).unwrap();
    let s = LocalOptimizer::default().search(&a).unwrap();
    assert_abs_diff_eq!(s.decision[0], 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(s.objectives[0], 1.0, epsilon = 1e-2);
    assert_abs_diff_eq!(s.objectives[1], 1.0, epsilon = 1e-2);
  }

  #[test]
  fn test_respects_objective_bounds() {
    let p = triangle();
    let e = EpsilonConstraintProblem::new(&p, vec![None, Some(0.5), Some(10.0)]).unwrap();
    let s = LocalOptimizer::default().search(&e).unwrap();
    assert!(s.objectives[1] <= 0.5 + 1e-6);
    // closest point of the disk around (1, 0) with radius sqrt(0.5)
    assert_abs_diff_eq!(s.objectives[0], (1.0 - 0.5f64.sqrt()).powi(2), epsilon = 1e-2);
  }

  #[test]
  fn test_respects_variable_bounds() {
    let domain = Domain::new(
      vec![Variable::bounded("x", -1.0, 3.0).unwrap()],
      vec![-3.0],
      vec![1.0],
    )
    .unwrap();
    let p = AnalyticProblem::new(domain, |x: &[f64]| vec![-x[0]]);
    let a = AchievementProblem::new(&p, vec![-3.0], vec![1.0], 0.0).unwrap();
    let s = LocalOptimizer::default().search(&a).unwrap();
    assert!(s.decision[0] <= 3.0 + 1e-6);
    assert_abs_diff_eq!(s.decision[0], 3.0, epsilon = 1e-4);

    let p = schaffer();
    let e = EpsilonConstraintProblem::new(&p, vec![None, Some(1.0)]).unwrap();
    let s = LocalOptimizer::default().search(&e).unwrap();
    assert_abs_diff_eq!(s.decision[0], 1.0, epsilon = 1e-3);
  }

  #[test]
  fn test_reports_infeasible() {
    let p = schaffer();
    // x^2 <= -1 can't hold anywhere
    let e = EpsilonConstraintProblem::new(&p, vec![Some(-1.0), None]).unwrap();
    match LocalOptimizer::default().search(&e) {
      Err(Error::Infeasible { violation, .. }) => assert!(violation > 0.0),
      other => panic!("expected an infeasible error, got {other:?}"),
    }
  }

  struct Counting<'p> {
    inner: AchievementProblem<'p>,
    calls: Cell<usize>,
  }

  impl Scalarization for Counting<'_> {
    fn problem(&self) -> &dyn Problem {
      self.inner.problem()
    }

    fn evaluate(&self, objectives: &[Vec<f64>]) -> Result<Scalarized> {
      self.calls.set(self.calls.get() + 1);
      self.inner.evaluate(objectives)
    }
  }

  #[test]
  fn test_one_evaluation_per_point() {
    let p = triangle().with_constraints(|x, _| vec![x[0] - 1.0, x[1] - 1.0, -x[0], -x[1]]);
    let counting = Counting {
      inner: AchievementProblem::new(&p, vec![0.0; 3], vec![1.0; 3], 1e-6).unwrap(),
      calls: Cell::new(0),
    };
    let mut minimizer = NelderMead::builder().max_evaluations(200).build();
    let cache = EvaluationCache::new(&counting);
    let x = [0.3, 0.3];
    for _ in 0..5 {
      cache.with(&x, |e| e.value).unwrap();
      for j in 0..4 {
        cache.with(&x, |e| e.constraints[j]).unwrap();
      }
    }
    assert_eq!(counting.calls.get(), 1);
    assert_eq!(cache.evaluations.get(), 1);

    // a full search never scalarizes more often than the minimizer evaluates
    let objective = |x: &[f64]| -> Result<f64> { cache.with(x, |e| e.value) };
    let m = minimizer.minimize(&objective, &[], &[0.5, 0.5]).unwrap();
    assert!(counting.calls.get() <= m.evaluations + 1);
  }
}
