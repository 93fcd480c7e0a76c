//! Decision variables and the multi-objective problems interactive methods
//! navigate.
//!
//! A [`Problem`] only has to map a population of decision vectors to their
//! objective vectors. Whether this happens through a formula
//! ([`AnalyticProblem`]), a pre-computed table ([`TableProblem`]), an
//! external process ([`SimulatorProblem`]) or fitted models
//! ([`SurrogateProblem`]) is invisible to the rest of the crate.
//!
//! Every objective is minimized.
//!
//! [`TableProblem`]: table::TableProblem
//! [`SimulatorProblem`]: simulator::SimulatorProblem
//! [`SurrogateProblem`]: surrogate::SurrogateProblem

pub mod simulator;
pub mod surrogate;
pub mod table;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single decision variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Variable {
  name: String,
  bounds: Option<(f64, f64)>,
  starting_point: Option<f64>,
}

impl Variable {
  /// Creates an unbounded variable.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      bounds: None,
      starting_point: None,
    }
  }

  /// Creates a variable restricted to `[lower, upper]`.
  pub fn bounded(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
    let name = name.into();
    if !(lower <= upper) {
      return Err(Error::Configuration(format!(
        "variable `{name}` has lower bound {lower} above upper bound {upper}"
      )));
    }
    Ok(Self {
      name,
      bounds: Some((lower, upper)),
      starting_point: None,
    })
  }

  /// Sets the point local solvers start from.
  pub fn with_starting_point(mut self, x: f64) -> Self {
    self.starting_point = Some(x);
    self
  }

  /// Returns variable's name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Returns `(lower, upper)` bounds, if any.
  pub fn bounds(&self) -> Option<(f64, f64)> {
    self.bounds
  }

  /// Returns the explicit starting point, or the middle of the bounds, or
  /// `0.0` for an unbounded variable.
  pub fn starting_point(&self) -> f64 {
    match (self.starting_point, self.bounds) {
      (Some(x), _) => x,
      (None, Some((lower, upper))) => lower + (upper - lower) / 2.0,
      (None, None) => 0.0,
    }
  }
}

/// Variables together with the ideal and nadir points of the objective
/// space. Shared by all concrete problem types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
  variables: Vec<Variable>,
  ideal: Vec<f64>,
  nadir: Vec<f64>,
}

impl Domain {
  /// Creates a domain, checking that ideal and nadir describe the same
  /// number of objectives and that the ideal is nowhere worse than the nadir.
  pub fn new(variables: Vec<Variable>, ideal: Vec<f64>, nadir: Vec<f64>) -> Result<Self> {
    if variables.is_empty() {
      return Err(Error::Configuration("problem has no variables".into()));
    }
    if ideal.is_empty() {
      return Err(Error::Configuration("problem has no objectives".into()));
    }
    Error::check_len("nadir point", ideal.len(), nadir.len())?;
    if let Some(i) = (0..ideal.len()).find(|&i| !(ideal[i] <= nadir[i])) {
      return Err(Error::Configuration(format!(
        "ideal value {} of objective {i} is worse than nadir value {}",
        ideal[i], nadir[i]
      )));
    }
    Ok(Self {
      variables,
      ideal,
      nadir,
    })
  }

  /// Returns the variables.
  pub fn variables(&self) -> &[Variable] {
    &self.variables
  }

  /// Returns the ideal point.
  pub fn ideal(&self) -> &[f64] {
    &self.ideal
  }

  /// Returns the nadir point.
  pub fn nadir(&self) -> &[f64] {
    &self.nadir
  }

  /// Checks that every member of `population` has one value per variable.
  pub fn check_population(&self, population: &[Vec<f64>]) -> Result<()> {
    population
      .iter()
      .try_for_each(|x| Error::check_len("decision vector", self.variables.len(), x.len()))
  }
}

/// A multi-objective minimization problem.
///
/// Implementors must keep `ideal().len() == nadir().len()` equal to the
/// number of objectives `evaluate` produces per decision vector.
pub trait Problem {
  /// Returns problem's decision variables.
  fn variables(&self) -> &[Variable];

  /// Returns the best achievable value of each objective.
  fn ideal(&self) -> &[f64];

  /// Returns the worst value of each objective over the Pareto front.
  fn nadir(&self) -> &[f64];

  /// Evaluates each decision vector of `population`, returning one objective
  /// vector per member, in order.
  fn evaluate(&self, population: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

  /// Returns problem's own constraint values at a point. A value is satisfied
  /// when it is not positive. No constraints by default.
  fn constraints(&self, _decision: &[f64], _objectives: &[f64]) -> Result<Vec<f64>> {
    Ok(Vec::new())
  }

  /// Returns the number of objectives.
  fn objective_count(&self) -> usize {
    self.ideal().len()
  }

  /// Evaluates a single decision vector.
  fn evaluate_one(&self, decision: &[f64]) -> Result<Vec<f64>> {
    let objectives = self
      .evaluate(&[decision.to_vec()])?
      .pop()
      .ok_or(Error::DimensionMismatch {
        what: "evaluated population",
        expected: 1,
        actual: 0,
      })?;
    Error::check_len("objective vector", self.objective_count(), objectives.len())?;
    Ok(objectives)
  }

  /// Returns the point local solvers start from.
  fn starting_point(&self) -> Vec<f64> {
    self.variables().iter().map(Variable::starting_point).collect()
  }

  /// Returns `nadir - ideal` per objective.
  fn ranges(&self) -> Vec<f64> {
    self
      .nadir()
      .iter()
      .zip(self.ideal())
      .map(|(n, i)| n - i)
      .collect()
  }
}

/// Computes objective values of a decision vector.
///
/// Implemented for closures of type `Fn(&[f64]) -> Vec<f64>` and for vectors
/// of closures `Fn(&[f64]) -> f64`, one closure per objective.
///
/// # Examples
/// ```
/// # use imo::problem::Objectives;
/// let f = |x: &[f64]| vec![x[0] * x[0], (x[0] - 2.0).powi(2)];
/// assert_eq!(f.evaluate(&[1.0]), vec![1.0, 1.0]);
/// ```
pub trait Objectives {
  /// Returns one value per objective.
  fn evaluate(&self, decision: &[f64]) -> Vec<f64>;
}

impl<F> Objectives for F
where
  F: Fn(&[f64]) -> Vec<f64>,
{
  fn evaluate(&self, decision: &[f64]) -> Vec<f64> {
    self(decision)
  }
}

impl<F> Objectives for Vec<F>
where
  F: Fn(&[f64]) -> f64,
{
  fn evaluate(&self, decision: &[f64]) -> Vec<f64> {
    self.iter().map(|f| f(decision)).collect()
  }
}

type ConstraintFn = Box<dyn Fn(&[f64], &[f64]) -> Vec<f64>>;

/// A problem given by closed-form objective functions.
pub struct AnalyticProblem<O> {
  domain: Domain,
  objectives: O,
  constraints: Option<ConstraintFn>,
}

impl<O: Objectives> AnalyticProblem<O> {
  /// Creates a problem from its domain and objective functions.
  pub fn new(domain: Domain, objectives: O) -> Self {
    Self {
      domain,
      objectives,
      constraints: None,
    }
  }

  /// Adds constraints `g(x, f(x)) <= 0`.
  pub fn with_constraints<C>(mut self, constraints: C) -> Self
  where
    C: Fn(&[f64], &[f64]) -> Vec<f64> + 'static,
  {
    self.constraints = Some(Box::new(constraints));
    self
  }
}

impl<O: Objectives> Problem for AnalyticProblem<O> {
  fn variables(&self) -> &[Variable] {
    self.domain.variables()
  }

  fn ideal(&self) -> &[f64] {
    self.domain.ideal()
  }

  fn nadir(&self) -> &[f64] {
    self.domain.nadir()
  }

  fn evaluate(&self, population: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    self.domain.check_population(population)?;
    population
      .iter()
      .map(|x| {
        let f = self.objectives.evaluate(x);
        Error::check_len("objective vector", self.objective_count(), f.len())?;
        Ok(f)
      })
      .collect()
  }

  fn constraints(&self, decision: &[f64], objectives: &[f64]) -> Result<Vec<f64>> {
    Ok(
      self
        .constraints
        .as_ref()
        .map(|c| c(decision, objectives))
        .unwrap_or_default(),
    )
  }
}
