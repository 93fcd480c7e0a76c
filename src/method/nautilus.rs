//! NAUTILUS: approaching the Pareto front from the nadir point.
//!
//! The iteration point starts at the nadir and every iteration moves it a
//! step towards the Pareto optimal point `f_h` that the current preference
//! leads to:
//!
//! `z_h = (it - 1) / it * z_{h-1} + 1 / it * f_h`
//!
//! where `it` is the number of iterations left. The last iteration lands on
//! the Pareto front. Alongside the iteration point the decision maker sees
//! how far each objective could still improve from it and how close to the
//! front it is. Closeness is left out when the step's target is the nadir
//! point itself.

use super::{distance, Dialogue, IterationSteps, MethodConfig, Step};
use crate::{
  error::{Error, Result},
  factory::{BoundsFactory, IterationPointFactory},
  optimizer::{LocalOptimizer, Optimizer},
  preference::Preference,
  problem::Problem,
  scalarization::ScalarKind,
};

/// NAUTILUS over problem `P`, solving subproblems with optimizer `O`.
///
/// Accepts every preference except classifications. Only the first
/// requested flavour is solved, [`ScalarKind::Achievement`] by default.
pub struct NautilusMethod<P, O = LocalOptimizer> {
  problem: P,
  factory: IterationPointFactory<O>,
  bounds: BoundsFactory<O>,
  dialogue: Dialogue,
  point: Vec<f64>,
  lower_bounds: Vec<f64>,
}

impl<P: Problem, O: Optimizer + Clone> NautilusMethod<P, O> {
  /// Creates the method. Its iteration point is the nadir point.
  pub fn new(problem: P, optimizer: O, config: MethodConfig) -> Result<Self> {
    Ok(Self {
      factory: IterationPointFactory::new(optimizer.clone(), config.rho),
      bounds: BoundsFactory::new(optimizer),
      dialogue: Dialogue::new(config)?,
      point: problem.nadir().to_vec(),
      lower_bounds: problem.ideal().to_vec(),
      problem,
    })
  }

  /// Returns the current iteration point.
  pub fn iteration_point(&self) -> &[f64] {
    &self.point
  }

  /// Returns the best value each objective can reach from the iteration
  /// point.
  pub fn lower_bounds(&self) -> &[f64] {
    &self.lower_bounds
  }
}

impl<P: Problem, O: Optimizer + Clone> IterationSteps for NautilusMethod<P, O> {
  fn dialogue(&self) -> &Dialogue {
    &self.dialogue
  }

  fn dialogue_mut(&mut self) -> &mut Dialogue {
    &mut self.dialogue
  }

  fn problem(&self) -> &dyn Problem {
    &self.problem
  }

  fn default_scalars(&self) -> Vec<ScalarKind> {
    vec![ScalarKind::Achievement]
  }

  fn first_points(&mut self) -> Result<Vec<Vec<f64>>> {
    self.point = self.problem.nadir().to_vec();
    self.lower_bounds = self.problem.ideal().to_vec();
    Ok(vec![self.point.clone()])
  }

  fn step(&mut self, preference: &Preference, scalars: &[ScalarKind]) -> Result<Step> {
    if preference.as_classification().is_some() {
      return Err(Error::validation(
        None,
        "NAUTILUS takes weights or rankings, not a classification",
      ));
    }
    let kind = scalars[0];
    let target = self
      .factory
      .result(&self.problem, kind, preference, &self.point)?
      .objectives;

    let it = self.dialogue.remaining() as f64;
    let point: Vec<f64> = self
      .point
      .iter()
      .zip(&target)
      .map(|(z, f)| (it - 1.0) / it * z + f / it)
      .collect();
    let lower_bounds = self.bounds.bounds(&self.problem, &point)?;
    let distance = match distance(&point, &target, self.problem.nadir()) {
      Ok(distance) => Some(distance),
      Err(Error::DegenerateDistance) => None,
      Err(e) => return Err(e),
    };

    self.point = point;
    self.lower_bounds = lower_bounds.clone();
    Ok(Step {
      candidate_points: vec![self.point.clone()],
      distance_to_front: distance,
      lower_bounds: Some(lower_bounds),
    })
  }
}
