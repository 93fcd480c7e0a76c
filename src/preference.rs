//! Preference information given by the decision maker.
//!
//! Each kind of preference turns raw user input into what a scalarization
//! needs: a weight vector saying how strongly each objective should be
//! pursued, and for classifications also a reference point. Constructors
//! reject malformed input with [`Error::Validation`]; [`validate`] further
//! checks the preference against the problem it's going to be used with.
//!
//! [`validate`]: PreferenceInformation::validate

pub mod classification;

use serde::{Deserialize, Serialize};

pub use self::classification::{Class, Classification};
use crate::{
  error::{Error, Result},
  problem::Problem,
};

/// Tolerance used when checking that percentages add up to 100.
pub const PERCENTAGE_TOLERANCE: f64 = 1e-6;

/// Common interface of every kind of preference information.
pub trait PreferenceInformation {
  /// Returns one weight per objective. Larger weights pull harder on the
  /// respective objective.
  fn weights(&self) -> Vec<f64>;

  /// Checks that the preference fits `problem`.
  fn validate(&self, problem: &dyn Problem) -> Result<()>;

  /// Returns the target point implied by the preference, if it implies one.
  fn reference_point(&self) -> Option<Vec<f64>> {
    None
  }
}

fn check_objective_count(problem: &dyn Problem, actual: usize) -> Result<()> {
  if problem.objective_count() == actual {
    Ok(())
  } else {
    Err(Error::validation(
      None,
      format!(
        "expected a value for each of {} objectives, got {actual}",
        problem.objective_count()
      ),
    ))
  }
}

fn check_finite(values: &[f64]) -> Result<()> {
  match values.iter().position(|v| !v.is_finite()) {
    Some(i) => Err(Error::validation(Some(i), format!("{} is not finite", values[i]))),
    None => Ok(()),
  }
}

/// Weights given directly as a direction vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectSpecification {
  direction: Vec<f64>,
}

impl DirectSpecification {
  /// Creates a preference from a non-negative, non-zero direction vector.
  pub fn new(direction: Vec<f64>) -> Result<Self> {
    check_finite(&direction)?;
    if let Some(i) = direction.iter().position(|&d| d < 0.0) {
      return Err(Error::validation(Some(i), "direction must not be negative"));
    }
    if direction.iter().all(|&d| d == 0.0) {
      return Err(Error::validation(None, "direction must not be zero"));
    }
    Ok(Self { direction })
  }
}

impl PreferenceInformation for DirectSpecification {
  fn weights(&self) -> Vec<f64> {
    self.direction.clone()
  }

  fn validate(&self, problem: &dyn Problem) -> Result<()> {
    check_objective_count(problem, self.direction.len())
  }
}

/// Percentages of desired improvement per objective, adding up to 100.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PercentageSpecification {
  percentages: Vec<f64>,
}

impl PercentageSpecification {
  /// Creates a preference from non-negative percentages summing to 100.
  pub fn new(percentages: Vec<f64>) -> Result<Self> {
    check_finite(&percentages)?;
    if let Some(i) = percentages.iter().position(|&p| p < 0.0) {
      return Err(Error::validation(Some(i), "percentage must not be negative"));
    }
    let sum: f64 = percentages.iter().sum();
    if (sum - 100.0).abs() > PERCENTAGE_TOLERANCE {
      return Err(Error::validation(
        None,
        format!("percentages must sum to 100, got {sum}"),
      ));
    }
    Ok(Self { percentages })
  }
}

impl PreferenceInformation for PercentageSpecification {
  fn weights(&self) -> Vec<f64> {
    self.percentages.iter().map(|p| p / 100.0).collect()
  }

  fn validate(&self, problem: &dyn Problem) -> Result<()> {
    check_objective_count(problem, self.percentages.len())
  }
}

/// Ranks of objectives, `1` being the most important.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRanking {
  ranks: Vec<f64>,
}

impl RelativeRanking {
  /// Creates a preference from strictly positive ranks.
  pub fn new(ranks: Vec<f64>) -> Result<Self> {
    check_finite(&ranks)?;
    if let Some(i) = ranks.iter().position(|&r| r <= 0.0) {
      return Err(Error::validation(
        Some(i),
        format!("rank must be positive, got {}", ranks[i]),
      ));
    }
    Ok(Self { ranks })
  }
}

impl PreferenceInformation for RelativeRanking {
  fn weights(&self) -> Vec<f64> {
    self.ranks.iter().map(|r| 1.0 / r).collect()
  }

  fn validate(&self, problem: &dyn Problem) -> Result<()> {
    check_objective_count(problem, self.ranks.len())
  }
}

/// Ranks of all objectives relative to a selected one, which implicitly has
/// rank `1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairwiseRanking {
  selected: usize,
  ranking: RelativeRanking,
}

impl PairwiseRanking {
  /// Creates a preference by inserting rank `1` for objective `selected`
  /// into `other_ranks`.
  pub fn new(selected: usize, mut other_ranks: Vec<f64>) -> Result<Self> {
    if selected > other_ranks.len() {
      return Err(Error::validation(
        Some(selected),
        format!(
          "selected objective out of bounds for {} objectives",
          other_ranks.len() + 1
        ),
      ));
    }
    other_ranks.insert(selected, 1.0);
    Ok(Self {
      selected,
      ranking: RelativeRanking::new(other_ranks)?,
    })
  }

  /// Returns the index of the reference objective.
  pub fn selected(&self) -> usize {
    self.selected
  }
}

impl PreferenceInformation for PairwiseRanking {
  fn weights(&self) -> Vec<f64> {
    self.ranking.weights()
  }

  fn validate(&self, problem: &dyn Problem) -> Result<()> {
    self.ranking.validate(problem)
  }
}

/// Any preference accepted by the interactive methods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Preference {
  /// See [`DirectSpecification`].
  Direct(DirectSpecification),
  /// See [`PercentageSpecification`].
  Percentage(PercentageSpecification),
  /// See [`RelativeRanking`].
  RelativeRanking(RelativeRanking),
  /// See [`PairwiseRanking`].
  PairwiseRanking(PairwiseRanking),
  /// See [`Classification`].
  Classification(Classification),
}

impl Preference {
  /// Returns the classification, if that's what this preference is.
  pub fn as_classification(&self) -> Option<&Classification> {
    match self {
      Self::Classification(c) => Some(c),
      _ => None,
    }
  }

  fn inner(&self) -> &dyn PreferenceInformation {
    match self {
      Self::Direct(p) => p,
      Self::Percentage(p) => p,
      Self::RelativeRanking(p) => p,
      Self::PairwiseRanking(p) => p,
      Self::Classification(p) => p,
    }
  }
}

impl PreferenceInformation for Preference {
  fn weights(&self) -> Vec<f64> {
    self.inner().weights()
  }

  fn validate(&self, problem: &dyn Problem) -> Result<()> {
    self.inner().validate(problem)
  }

  fn reference_point(&self) -> Option<Vec<f64>> {
    self.inner().reference_point()
  }
}

impl From<DirectSpecification> for Preference {
  fn from(p: DirectSpecification) -> Self {
    Self::Direct(p)
  }
}

impl From<PercentageSpecification> for Preference {
  fn from(p: PercentageSpecification) -> Self {
    Self::Percentage(p)
  }
}

impl From<RelativeRanking> for Preference {
  fn from(p: RelativeRanking) -> Self {
    Self::RelativeRanking(p)
  }
}

impl From<PairwiseRanking> for Preference {
  fn from(p: PairwiseRanking) -> Self {
    Self::PairwiseRanking(p)
  }
}

impl From<Classification> for Preference {
  fn from(p: Classification) -> Self {
    Self::Classification(p)
  }
}
