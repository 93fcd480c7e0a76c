//! Classification of objectives, the preference used by NIMBUS.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::PreferenceInformation;
use crate::{
  error::{Error, Result},
  problem::Problem,
};

/// Share of an objective's range by which an improving objective's target
/// is pushed below the current value when the current value already sits
/// at the ideal.
const IMPROVEMENT_STEP: f64 = 0.01;

/// What the decision maker wants to happen to one objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Class {
  /// `<`: improve as much as possible.
  Improve,
  /// `<=`: improve until the given aspiration level.
  ImproveTo,
  /// `=`: keep the current value.
  Keep,
  /// `>=`: allowed to get worse until the given bound.
  WorsenTo,
  /// `0`: free to change.
  Free,
}

impl Class {
  /// Returns the token the class is written as.
  pub fn token(self) -> &'static str {
    match self {
      Self::Improve => "<",
      Self::ImproveTo => "<=",
      Self::Keep => "=",
      Self::WorsenTo => ">=",
      Self::Free => "0",
    }
  }

  fn needs_value(self) -> bool {
    matches!(self, Self::ImproveTo | Self::WorsenTo)
  }
}

impl fmt::Display for Class {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.token())
  }
}

impl FromStr for Class {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "<" => Ok(Self::Improve),
      "<=" => Ok(Self::ImproveTo),
      "=" => Ok(Self::Keep),
      ">=" => Ok(Self::WorsenTo),
      "0" => Ok(Self::Free),
      _ => Err(Error::validation(
        None,
        format!("unknown classification token `{s}`"),
      )),
    }
  }
}

/// One class per objective, given relative to the current solution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
  current: Vec<f64>,
  ideal: Vec<f64>,
  nadir: Vec<f64>,
  classes: Vec<(Class, Option<f64>)>,
}

impl Classification {
  /// Classifies each objective at `current`. Values are read only for
  /// [`Class::ImproveTo`] (the aspiration level) and [`Class::WorsenTo`]
  /// (the bound).
  ///
  /// Fails if there isn't exactly one class per objective, if a value is
  /// missing or points the wrong way, or if the classification is
  /// degenerate: at least one objective must be classified [`Class::Improve`]
  /// and at least one must be allowed to get worse.
  pub fn new(
    problem: &dyn Problem,
    current: &[f64],
    classes: Vec<(Class, Option<f64>)>,
  ) -> Result<Self> {
    let k = problem.objective_count();
    Error::check_len("current point", k, current.len())?;
    if classes.len() != k {
      return Err(Error::validation(
        None,
        format!("expected {k} classes, got {}", classes.len()),
      ));
    }

    for (i, &(class, value)) in classes.iter().enumerate() {
      match (class.needs_value(), value) {
        (true, None) => {
          return Err(Error::validation(
            Some(i),
            format!("class `{class}` needs a value"),
          ))
        }
        (true, Some(v)) if !v.is_finite() => {
          return Err(Error::validation(Some(i), format!("{v} is not finite")))
        }
        (true, Some(v)) if class == Class::ImproveTo && v > current[i] => {
          return Err(Error::validation(
            Some(i),
            format!("aspiration {v} is worse than current value {}", current[i]),
          ))
        }
        (true, Some(v)) if class == Class::WorsenTo && v < current[i] => {
          return Err(Error::validation(
            Some(i),
            format!("bound {v} is better than current value {}", current[i]),
          ))
        }
        _ => {}
      }
    }

    let improves = classes.iter().any(|(c, _)| *c == Class::Improve);
    let worsens = classes
      .iter()
      .any(|(c, _)| matches!(c, Class::WorsenTo | Class::Free));
    if !(improves && worsens) {
      return Err(Error::validation(
        None,
        "at least one objective must improve and at least one must be allowed to worsen",
      ));
    }

    Ok(Self {
      current: current.to_vec(),
      ideal: problem.ideal().to_vec(),
      nadir: problem.nadir().to_vec(),
      classes,
    })
  }

  /// Same as [`Classification::new`], reading classes from their tokens.
  pub fn from_tokens(
    problem: &dyn Problem,
    current: &[f64],
    tokens: &[(&str, Option<f64>)],
  ) -> Result<Self> {
    let classes = tokens
      .iter()
      .enumerate()
      .map(|(i, (token, value))| {
        token
          .parse::<Class>()
          .map(|c| (c, *value))
          .map_err(|e| match e {
            Error::Validation { reason, .. } => Error::validation(Some(i), reason),
            e => e,
          })
      })
      .collect::<Result<_>>()?;
    Self::new(problem, current, classes)
  }

  /// Returns the point the classification was made at.
  pub fn current(&self) -> &[f64] {
    &self.current
  }

  /// Returns class and value of each objective.
  pub fn classes(&self) -> &[(Class, Option<f64>)] {
    &self.classes
  }

  /// Returns indices of objectives in `class`.
  pub fn indices(&self, class: Class) -> impl Iterator<Item = usize> + '_ {
    self
      .classes
      .iter()
      .enumerate()
      .filter(move |(_, (c, _))| *c == class)
      .map(|(i, _)| i)
  }

  /// Returns the value an objective is bounded by in the next subproblem:
  /// the aspiration for `<=`, the bound for `>=`, the current value for `<`
  /// and `=`. Free objectives and indices past the last objective are
  /// unbounded.
  pub fn bound(&self, i: usize) -> Option<f64> {
    match *self.classes.get(i)? {
      (Class::ImproveTo | Class::WorsenTo, v) => v,
      (Class::Improve | Class::Keep, _) => Some(self.current[i]),
      (Class::Free, _) => None,
    }
  }

  /// Returns the target vector implied by the classification.
  ///
  /// Improving objectives aim at the ideal value (or just below the current
  /// value if it's already there), objectives with an aspiration or bound
  /// aim at it, kept objectives at their current value and free objectives
  /// at the nadir.
  pub fn target(&self) -> Vec<f64> {
    self
      .classes
      .iter()
      .enumerate()
      .map(|(i, &(class, value))| match class {
        Class::Improve if self.ideal[i] < self.current[i] => self.ideal[i],
        Class::Improve => {
          let step = (self.nadir[i] - self.ideal[i]).abs().max(f64::EPSILON);
          self.current[i] - IMPROVEMENT_STEP * step
        }
        Class::ImproveTo | Class::WorsenTo => value.unwrap_or(self.current[i]),
        Class::Keep => self.current[i],
        Class::Free => self.nadir[i],
      })
      .collect()
  }
}

impl PreferenceInformation for Classification {
  fn weights(&self) -> Vec<f64> {
    vec![1.0; self.classes.len()]
  }

  fn validate(&self, problem: &dyn Problem) -> Result<()> {
    if self.classes.len() == problem.objective_count() {
      Ok(())
    } else {
      Err(Error::validation(
        None,
        format!(
          "classification has {} classes, problem has {} objectives",
          self.classes.len(),
          problem.objective_count()
        ),
      ))
    }
  }

  fn reference_point(&self) -> Option<Vec<f64>> {
    Some(self.target())
  }
}
