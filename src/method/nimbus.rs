//! Synchronous NIMBUS.
//!
//! The decision maker classifies the objectives at the current Pareto
//! optimal point. Every iteration solves one subproblem per requested
//! flavour and returns all their solutions; the first becomes the current
//! point unless the decision maker picks another one with
//! [`NimbusMethod::select_point`].

use super::{Dialogue, IterationSteps, MethodConfig, Step};
use crate::{
  error::{Error, Result},
  factory::IterationPointFactory,
  optimizer::{LocalOptimizer, Optimizer},
  preference::{Classification, Preference},
  problem::Problem,
  scalarization::{AchievementProblem, ScalarKind},
};

/// NIMBUS over problem `P`, solving subproblems with optimizer `O`.
///
/// # Examples
/// ```
/// # use imo::{
/// #   method::{InteractiveMethod, IterationRequest, MethodConfig, NimbusMethod},
/// #   optimizer::LocalOptimizer,
/// #   problem::{AnalyticProblem, Domain, Variable},
/// # };
/// let domain = Domain::new(
///   vec![Variable::bounded("x", -1.0, 3.0).unwrap()],
///   vec![0.0, 0.0],
///   vec![4.0, 4.0],
/// )
/// .unwrap();
/// let problem = AnalyticProblem::new(domain, |x: &[f64]| vec![x[0] * x[0], (x[0] - 2.0).powi(2)]);
/// let config = MethodConfig::builder().user_iters(3).build();
/// let mut nimbus = NimbusMethod::new(problem, LocalOptimizer::default(), config).unwrap();
///
/// let start = nimbus.init_iteration().unwrap();
/// let classification = nimbus.classify(&[("<", None), ("0", None)]).unwrap();
/// let candidates = nimbus
///   .next_iteration(IterationRequest::builder().preference(classification).build())
///   .unwrap();
/// assert_eq!(candidates.len(), 4);
/// ```
pub struct NimbusMethod<P, O = LocalOptimizer> {
  problem: P,
  factory: IterationPointFactory<O>,
  dialogue: Dialogue,
  current: Option<Vec<f64>>,
  candidates: Vec<Vec<f64>>,
}

impl<P: Problem, O: Optimizer> NimbusMethod<P, O> {
  /// Creates the method.
  pub fn new(problem: P, optimizer: O, config: MethodConfig) -> Result<Self> {
    let factory = IterationPointFactory::new(optimizer, config.rho);
    Ok(Self {
      problem,
      factory,
      dialogue: Dialogue::new(config)?,
      current: None,
      candidates: Vec::new(),
    })
  }

  /// Returns the point the next classification is made at, once there is
  /// one.
  pub fn current_point(&self) -> Option<&[f64]> {
    self.current.as_deref()
  }

  /// Returns the candidates of the last iteration.
  pub fn candidates(&self) -> &[Vec<f64>] {
    &self.candidates
  }

  /// Makes candidate `index` of the last iteration the current point.
  pub fn select_point(&mut self, index: usize) -> Result<&[f64]> {
    let point = self.candidates.get(index).ok_or_else(|| {
      Error::validation(
        None,
        format!(
          "can't select candidate {index}, the last iteration produced {}",
          self.candidates.len()
        ),
      )
    })?;
    let current = self.current.insert(point.clone());
    Ok(current.as_slice())
  }

  /// Classifies objectives at the current point from `(token, value)`
  /// pairs, see [`Classification::from_tokens`].
  pub fn classify(&self, tokens: &[(&str, Option<f64>)]) -> Result<Classification> {
    let current = self
      .current
      .as_deref()
      .ok_or_else(|| Error::validation(None, "there is no current point to classify at yet"))?;
    Classification::from_tokens(&self.problem, current, tokens)
  }
}

impl<P: Problem, O: Optimizer> IterationSteps for NimbusMethod<P, O> {
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
    ScalarKind::ALL.to_vec()
  }

  fn first_points(&mut self) -> Result<Vec<Vec<f64>>> {
    // neutral compromise: halfway between ideal and nadir, ranges normalized
    let reference = self
      .problem
      .ideal()
      .iter()
      .zip(self.problem.nadir())
      .map(|(i, n)| (i + n) / 2.0)
      .collect();
    let weights = self
      .problem
      .ranges()
      .into_iter()
      .map(|r| 1.0 / r.max(f64::EPSILON))
      .collect();
    let scalarized =
      AchievementProblem::new(&self.problem, reference, weights, self.dialogue.config().rho)?;
    let solution = self.factory.optimizer_mut().search(&scalarized)?;
    self.current = Some(solution.objectives.clone());
    self.candidates = vec![solution.objectives.clone()];
    Ok(vec![solution.objectives])
  }

  fn step(&mut self, preference: &Preference, scalars: &[ScalarKind]) -> Result<Step> {
    let reference = match (&self.current, preference.as_classification()) {
      (_, Some(classification)) => classification.current().to_vec(),
      (Some(current), None) => current.clone(),
      (None, None) => self.problem.nadir().to_vec(),
    };
    let solutions = self
      .factory
      .results(&self.problem, scalars, preference, &reference)?;
    let candidates: Vec<Vec<f64>> = solutions.into_iter().map(|s| s.objectives).collect();
    self.current = candidates.first().cloned();
    self.candidates = candidates.clone();
    Ok(Step {
      candidate_points: candidates,
      distance_to_front: None,
      lower_bounds: None,
    })
  }
}
