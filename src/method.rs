//! Interactive methods and the dialogue they conduct with a decision maker.
//!
//! A method starts in [`MethodState::NotStarted`]. [`init_iteration`]
//! produces the first candidate point, each [`next_iteration`] turns a
//! preference into new candidates and appends an [`IterationRecord`] to the
//! history. Once the iteration budget is spent the method is
//! [`MethodState::Exhausted`]; [`terminate`] ends it early. Neither accepts
//! further iterations.
//!
//! Concrete methods implement [`IterationSteps`] and get
//! [`InteractiveMethod`] for free.
//!
//! [`init_iteration`]: InteractiveMethod::init_iteration
//! [`next_iteration`]: InteractiveMethod::next_iteration
//! [`terminate`]: InteractiveMethod::terminate

pub mod nautilus;
pub mod nimbus;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

pub use self::{nautilus::NautilusMethod, nimbus::NimbusMethod};
use crate::{
  error::{Error, Result},
  preference::{Preference, PreferenceInformation},
  problem::Problem,
  scalarization::ScalarKind,
};

/// Lifecycle of an interactive method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodState {
  /// No iteration has run yet.
  NotStarted,
  /// The method accepts further iterations.
  Iterating,
  /// Stopped by the caller.
  Terminated,
  /// Iteration budget spent.
  Exhausted,
}

/// What a single iteration produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
  /// One-based index of the iteration.
  pub iteration_index: usize,
  /// Preference the iteration ran with.
  pub preference: Preference,
  /// Candidate objective vectors, in the order their flavours were
  /// requested.
  pub candidate_points: Vec<Vec<f64>>,
  /// Progress towards the Pareto front in percent, for methods tracking it.
  pub distance_to_front: Option<f64>,
  /// Best reachable value of each objective from the iteration point, for
  /// methods tracking it.
  pub lower_bounds: Option<Vec<f64>>,
}

/// Arguments of [`InteractiveMethod::next_iteration`].
///
/// # Examples
/// ```
/// # use imo::{
/// #   method::IterationRequest, preference::DirectSpecification, scalarization::ScalarKind,
/// # };
/// let request = IterationRequest::builder()
///   .preference(DirectSpecification::new(vec![1.0, 2.0]).unwrap())
///   .scalars(vec![ScalarKind::Achievement])
///   .build();
/// ```
#[derive(TypedBuilder, Clone, Debug, Default)]
pub struct IterationRequest {
  /// New preference. The previous one is repeated if missing.
  #[builder(default, setter(strip_option, into))]
  pub preference: Option<Preference>,
  /// Flavours to solve. Method's defaults if missing.
  #[builder(default, setter(strip_option))]
  pub scalars: Option<Vec<ScalarKind>>,
}

/// Settings shared by interactive methods.
#[derive(TypedBuilder, Clone, Debug)]
pub struct MethodConfig {
  /// Number of iterations the decision maker is willing to run.
  pub user_iters: usize,
  /// Augmentation coefficient of achievement subproblems.
  #[builder(default = 1e-6)]
  pub rho: f64,
  /// Target of the log records the method emits.
  #[builder(default = String::from("imo"), setter(into))]
  pub log_target: String,
}

/// Returns `‖current - nadir‖ / ‖target - nadir‖ * 100`, how far `current`
/// has travelled from the nadir point towards `target` in percent.
///
/// Fails with [`Error::DegenerateDistance`] if `target` is the nadir point.
pub fn distance(current: &[f64], target: &[f64], nadir: &[f64]) -> Result<f64> {
  Error::check_len("current point", nadir.len(), current.len())?;
  Error::check_len("target point", nadir.len(), target.len())?;
  let norm = |p: &[f64]| -> f64 {
    p.iter()
      .zip(nadir)
      .map(|(p, n)| (p - n).powi(2))
      .sum::<f64>()
      .sqrt()
  };
  let denominator = norm(target);
  if denominator == 0.0 {
    return Err(Error::DegenerateDistance);
  }
  Ok(norm(current) / denominator * 100.0)
}

/// Bookkeeping every interactive method carries: its settings, state,
/// history and remaining iteration budget.
#[derive(Clone, Debug)]
pub struct Dialogue {
  config: MethodConfig,
  state: MethodState,
  history: Vec<IterationRecord>,
  remaining: usize,
}

impl Dialogue {
  /// Starts a dialogue. The budget must allow at least one iteration.
  pub fn new(config: MethodConfig) -> Result<Self> {
    if config.user_iters == 0 {
      return Err(Error::Configuration(
        "an interactive method needs at least one iteration".into(),
      ));
    }
    Ok(Self {
      remaining: config.user_iters,
      config,
      state: MethodState::NotStarted,
      history: Vec::new(),
    })
  }

  /// Returns the settings.
  pub fn config(&self) -> &MethodConfig {
    &self.config
  }

  /// Returns the number of iterations left, the current one included.
  pub fn remaining(&self) -> usize {
    self.remaining
  }

  fn target(&self) -> &str {
    &self.config.log_target
  }
}

/// What a method's iteration step hands back to the dialogue.
#[derive(Clone, Debug, PartialEq)]
pub struct Step {
  /// Candidate objective vectors.
  pub candidate_points: Vec<Vec<f64>>,
  /// See [`IterationRecord::distance_to_front`].
  pub distance_to_front: Option<f64>,
  /// See [`IterationRecord::lower_bounds`].
  pub lower_bounds: Option<Vec<f64>>,
}

/// Method-specific parts of an interactive method.
///
/// Implementors provide the arithmetic; the blanket [`InteractiveMethod`]
/// implementation drives state, history and the iteration budget around it.
/// Steps must leave the method untouched when they fail.
pub trait IterationSteps {
  /// Returns the dialogue bookkeeping.
  fn dialogue(&self) -> &Dialogue;

  /// Returns the dialogue bookkeeping mutably.
  fn dialogue_mut(&mut self) -> &mut Dialogue;

  /// Returns the problem being solved.
  fn problem(&self) -> &dyn Problem;

  /// Returns the flavours solved when a request names none.
  fn default_scalars(&self) -> Vec<ScalarKind>;

  /// Computes the first candidate points.
  fn first_points(&mut self) -> Result<Vec<Vec<f64>>>;

  /// Runs one iteration with a validated preference and a non-empty list of
  /// flavours.
  fn step(&mut self, preference: &Preference, scalars: &[ScalarKind]) -> Result<Step>;
}

/// An interactive method driven by a decision maker.
pub trait InteractiveMethod {
  /// Computes the first candidate points and starts iterating.
  fn init_iteration(&mut self) -> Result<Vec<Vec<f64>>>;

  /// Runs one iteration and returns its candidate points.
  fn next_iteration(&mut self, request: IterationRequest) -> Result<Vec<Vec<f64>>>;

  /// Stops the method. Later iterations are rejected.
  fn terminate(&mut self);

  /// Returns the current state.
  fn state(&self) -> MethodState;

  /// Returns records of all iterations run so far, oldest first.
  fn history(&self) -> &[IterationRecord];
}

impl<M: IterationSteps> InteractiveMethod for M {
  fn init_iteration(&mut self) -> Result<Vec<Vec<f64>>> {
    let state = self.dialogue().state;
    if state != MethodState::NotStarted {
      return Err(Error::State { state });
    }
    let points = self.first_points()?;
    let dialogue = self.dialogue_mut();
    dialogue.state = MethodState::Iterating;
    log::info!(target: dialogue.target(), "started with {} candidate points", points.len());
    Ok(points)
  }

  fn next_iteration(&mut self, request: IterationRequest) -> Result<Vec<Vec<f64>>> {
    let state = self.dialogue().state;
    if matches!(state, MethodState::Terminated | MethodState::Exhausted) {
      return Err(Error::State { state });
    }
    let preference = match request.preference {
      Some(preference) => preference,
      None => self
        .dialogue()
        .history
        .last()
        .map(|record| record.preference.clone())
        .ok_or(Error::MissingPreference)?,
    };
    preference.validate(self.problem())?;
    let scalars = request.scalars.unwrap_or_else(|| self.default_scalars());
    if scalars.is_empty() {
      return Err(Error::Configuration("no scalarization requested".into()));
    }

    let step = self.step(&preference, &scalars)?;

    let dialogue = self.dialogue_mut();
    let iteration_index = dialogue.history.len() + 1;
    dialogue.remaining -= 1;
    dialogue.state = if dialogue.remaining == 0 {
      MethodState::Exhausted
    } else {
      MethodState::Iterating
    };
    log::info!(
      target: dialogue.target(),
      "iteration {iteration_index} produced {} candidates, {} iterations left",
      step.candidate_points.len(),
      dialogue.remaining
    );
    if let Some(distance) = step.distance_to_front {
      log::debug!(target: dialogue.target(), "distance to the Pareto front {distance:.2}%");
    }
    dialogue.history.push(IterationRecord {
      iteration_index,
      preference,
      candidate_points: step.candidate_points.clone(),
      distance_to_front: step.distance_to_front,
      lower_bounds: step.lower_bounds,
    });
    Ok(step.candidate_points)
  }

  fn terminate(&mut self) {
    let dialogue = self.dialogue_mut();
    if dialogue.state != MethodState::Exhausted {
      dialogue.state = MethodState::Terminated;
    }
    log::info!(target: dialogue.target(), "terminated after {} iterations", dialogue.history.len());
  }

  fn state(&self) -> MethodState {
    self.dialogue().state
  }

  fn history(&self) -> &[IterationRecord] {
    &self.dialogue().history
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;
  use crate::{
    preference::{Classification, DirectSpecification},
    problem::tests::schaffer,
  };

  #[test]
  fn test_distance() {
    let nadir = [4.0, 4.0];
    assert_relative_eq!(distance(&[4.0, 4.0], &[0.0, 4.0], &nadir).unwrap(), 0.0);
    assert_relative_eq!(distance(&[2.0, 4.0], &[0.0, 4.0], &nadir).unwrap(), 50.0);
    assert_relative_eq!(distance(&[1.0, 1.0], &[1.0, 1.0], &nadir).unwrap(), 100.0);
  }

  #[test]
  fn test_distance_to_nadir_is_degenerate() {
    let nadir = [4.0, 4.0];
    assert!(matches!(
      distance(&[1.0, 1.0], &nadir, &nadir),
      Err(Error::DegenerateDistance)
    ));
    assert!(matches!(
      distance(&[1.0], &[0.0, 0.0], &nadir),
      Err(Error::DimensionMismatch { .. })
    ));
  }

  /// Echoes preference weights as candidate points.
  struct Echo<P> {
    problem: P,
    dialogue: Dialogue,
    fail: bool,
  }

  impl<P: Problem> IterationSteps for Echo<P> {
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
      Ok(vec![self.problem.nadir().to_vec()])
    }

    fn step(&mut self, preference: &Preference, scalars: &[ScalarKind]) -> Result<Step> {
      if self.fail {
        return Err(Error::Surrogate("unavailable".into()));
      }
      Ok(Step {
        candidate_points: scalars.iter().map(|_| preference.weights()).collect(),
        distance_to_front: None,
        lower_bounds: None,
      })
    }
  }

  fn echo(user_iters: usize) -> Echo<impl Problem> {
    Echo {
      problem: schaffer(),
      dialogue: Dialogue::new(MethodConfig::builder().user_iters(user_iters).build()).unwrap(),
      fail: false,
    }
  }

  fn direct(w: [f64; 2]) -> Preference {
    DirectSpecification::new(w.to_vec()).unwrap().into()
  }

  #[test]
  fn test_missing_preference_on_fresh_method() {
    let mut m = echo(2);
    assert!(matches!(
      m.next_iteration(IterationRequest::default()),
      Err(Error::MissingPreference)
    ));
    assert_eq!(m.state(), MethodState::NotStarted);
    assert!(m.history().is_empty());
    // the session survives, a retry with a preference works
    let points = m
      .next_iteration(IterationRequest::builder().preference(direct([1.0, 2.0])).build())
      .unwrap();
    assert_eq!(points, vec![vec![1.0, 2.0]]);
  }

  #[test]
  fn test_budget_exhaustion() {
    let mut m = echo(2);
    assert_eq!(m.init_iteration().unwrap(), vec![vec![4.0, 4.0]]);
    assert_eq!(m.state(), MethodState::Iterating);
    assert!(matches!(
      m.init_iteration(),
      Err(Error::State {
        state: MethodState::Iterating
      })
    ));

    let request = IterationRequest::builder()
      .preference(direct([1.0, 2.0]))
      .scalars(vec![ScalarKind::Achievement, ScalarKind::Stom])
      .build();
    assert_eq!(m.next_iteration(request).unwrap().len(), 2);
    assert_eq!(m.state(), MethodState::Iterating);
    // repeats the previous preference with default flavours
    assert_eq!(
      m.next_iteration(IterationRequest::default()).unwrap(),
      vec![vec![1.0, 2.0]]
    );
    assert_eq!(m.state(), MethodState::Exhausted);
    assert!(matches!(
      m.next_iteration(IterationRequest::builder().preference(direct([1.0, 1.0])).build()),
      Err(Error::State {
        state: MethodState::Exhausted
      })
    ));

    let history = m.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].iteration_index, 1);
    assert_eq!(history[1].iteration_index, 2);
    assert_eq!(history[1].preference, direct([1.0, 2.0]));
  }

  #[test]
  fn test_terminate() {
    let mut m = echo(5);
    m.terminate();
    assert_eq!(m.state(), MethodState::Terminated);
    assert!(matches!(
      m.next_iteration(IterationRequest::builder().preference(direct([1.0, 1.0])).build()),
      Err(Error::State {
        state: MethodState::Terminated
      })
    ));
  }

  #[test]
  fn test_failed_steps_leave_no_trace() {
    let mut m = echo(1);
    m.fail = true;
    let request = IterationRequest::builder().preference(direct([1.0, 1.0])).build();
    assert!(m.next_iteration(request.clone()).is_err());
    assert!(m.history().is_empty());
    assert_eq!(m.dialogue.remaining(), 1);

    // preference is validated against the problem
    m.fail = false;
    let wrong = IterationRequest::builder()
      .preference(DirectSpecification::new(vec![1.0, 1.0, 1.0]).unwrap())
      .build();
    assert!(matches!(m.next_iteration(wrong), Err(Error::Validation { .. })));
    let empty = IterationRequest::builder()
      .preference(direct([1.0, 1.0]))
      .scalars(vec![])
      .build();
    assert!(matches!(m.next_iteration(empty), Err(Error::Configuration(_))));
    assert!(m.next_iteration(request).is_ok());
  }

  #[test]
  fn test_records_serialize() {
    let mut m = echo(1);
    let c = Classification::from_tokens(&m.problem, &[1.0, 1.0], &[("<", None), ("0", None)])
      .unwrap();
    m.next_iteration(IterationRequest::builder().preference(c).build())
      .unwrap();
    let json = serde_json::to_value(&m.history()[0]).unwrap();
    assert_eq!(json["iteration_index"], 1);
    assert_eq!(json["candidate_points"][0], serde_json::json!([1.0, 1.0]));
    assert!(json["distance_to_front"].is_null());
  }

  #[test]
  fn test_config_defaults() {
    let c = MethodConfig::builder().user_iters(3).build();
    assert_eq!(c.rho, 1e-6);
    assert_eq!(c.log_target, "imo");
    assert!(Dialogue::new(MethodConfig::builder().user_iters(0).build()).is_err());
  }
}
