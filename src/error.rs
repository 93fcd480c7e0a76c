//! Error type shared by every stage of the interactive loop.

use crate::method::MethodState;

/// An alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building preferences, solving
/// scalarized subproblems or driving an interactive method.
///
/// Variants carry enough context (objective index, expected and actual
/// shapes, collaborator messages, best points found) for a caller to correct
/// its input and retry. None of them leave a method in a corrupted state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Preference input is malformed or inconsistent with the problem.
  #[error("invalid preference{}: {reason}", objective_suffix(.objective))]
  Validation {
    /// Index of the offending objective, if the problem is local to one.
    objective: Option<usize>,
    /// Human readable description.
    reason: String,
  },

  /// No preference was supplied and there is no earlier one to repeat.
  #[error("no preference given and no previous preference to repeat")]
  MissingPreference,

  /// The method can't iterate in its current state.
  #[error("method is {state:?} and accepts no further iterations")]
  State {
    /// State the method was in when the call was rejected.
    state: MethodState,
  },

  /// The optimizer didn't find a point satisfying every constraint.
  #[error("no feasible point found, best point violates constraints by {violation}")]
  Infeasible {
    /// Best decision vector found.
    decision: Vec<f64>,
    /// Objective values at `decision`.
    objectives: Vec<f64>,
    /// Sum of positive constraint values at `decision`.
    violation: f64,
  },

  /// An external simulator failed or produced unusable output.
  #[error("simulator `{program}` failed: {message}")]
  Simulator {
    /// Program that was invoked.
    program: String,
    /// Raw message from the process or the output parser.
    message: String,
  },

  /// A surrogate model couldn't be loaded or evaluated.
  #[error("surrogate model failed: {0}")]
  Surrogate(String),

  /// Reference point sampling ran out of attempts.
  #[error("accepted {accepted} of {requested} reference points within {attempts} attempts")]
  Generation {
    /// Points requested.
    requested: usize,
    /// Points accepted before giving up.
    accepted: usize,
    /// Samples drawn.
    attempts: usize,
  },

  /// A vector has the wrong length.
  #[error("{what}: expected length {expected}, got {actual}")]
  DimensionMismatch {
    /// What was being checked.
    what: &'static str,
    /// Expected length.
    expected: usize,
    /// Actual length.
    actual: usize,
  },

  /// Scalarization, optimizer or method set up inconsistently.
  #[error("invalid configuration: {0}")]
  Configuration(String),

  /// The convergence distance is undefined because the target sits on the
  /// nadir point.
  #[error("target point coincides with the nadir point, distance is undefined")]
  DegenerateDistance,
}

fn objective_suffix(objective: &Option<usize>) -> String {
  objective
    .map(|i| format!(" for objective {i}"))
    .unwrap_or_default()
}

impl Error {
  pub(crate) fn validation(objective: Option<usize>, reason: impl Into<String>) -> Self {
    Self::Validation {
      objective,
      reason: reason.into(),
    }
  }

  pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
      Ok(())
    } else {
      Err(Self::DimensionMismatch {
        what,
        expected,
        actual,
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validation_message_names_objective() {
    let e = Error::validation(Some(2), "rank must be positive");
    assert_eq!(
      e.to_string(),
      "invalid preference for objective 2: rank must be positive"
    );
    let e = Error::validation(None, "percentages must sum to 100");
    assert_eq!(e.to_string(), "invalid preference: percentages must sum to 100");
  }

  #[test]
  fn test_check_len() {
    assert!(Error::check_len("weights", 3, 3).is_ok());
    assert!(matches!(
      Error::check_len("weights", 3, 2),
      Err(Error::DimensionMismatch {
        expected: 3,
        actual: 2,
        ..
      })
    ));
  }
}
