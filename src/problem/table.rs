//! Problems backed by a pre-generated table of evaluated points.

use itertools::Itertools;

use super::{Domain, Problem, Variable};
use crate::error::{Error, Result};

/// A problem whose objective values were computed beforehand.
///
/// Evaluating a decision vector returns the objectives of the closest
/// tabulated decision vector (Euclidean distance).
#[derive(Clone, Debug)]
pub struct TableProblem {
  domain: Domain,
  decisions: Vec<Vec<f64>>,
  objectives: Vec<Vec<f64>>,
}

impl TableProblem {
  /// Creates a table from matching rows of decision and objective vectors.
  pub fn new(
    domain: Domain,
    decisions: Vec<Vec<f64>>,
    objectives: Vec<Vec<f64>>,
  ) -> Result<Self> {
    if decisions.is_empty() {
      return Err(Error::Configuration("table has no rows".into()));
    }
    Error::check_len("objective rows", decisions.len(), objectives.len())?;
    domain.check_population(&decisions)?;
    objectives.iter().try_for_each(|f| {
      Error::check_len("objective vector", domain.ideal().len(), f.len())
    })?;
    Ok(Self {
      domain,
      decisions,
      objectives,
    })
  }

  /// Returns the number of tabulated points.
  pub fn len(&self) -> usize {
    self.decisions.len()
  }

  /// Returns `true` if the table has no rows. Never the case for a table
  /// built with [`TableProblem::new`].
  pub fn is_empty(&self) -> bool {
    self.decisions.is_empty()
  }

  fn nearest(&self, x: &[f64]) -> usize {
    self
      .decisions
      .iter()
      .map(|row| row.iter().zip(x).map(|(a, b)| (a - b).powi(2)).sum::<f64>())
      .position_min_by(|a, b| a.total_cmp(b))
      .unwrap_or_default()
  }
}

impl Problem for TableProblem {
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
    Ok(
      population
        .iter()
        .map(|x| self.objectives[self.nearest(x)].clone())
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table() -> TableProblem {
    let domain = Domain::new(
      vec![Variable::bounded("x", 0.0, 2.0).unwrap()],
      vec![0.0, 0.0],
      vec![2.0, 2.0],
    )
    .unwrap();
    TableProblem::new(
      domain,
      vec![vec![0.0], vec![1.0], vec![2.0]],
      vec![vec![0.0, 2.0], vec![1.0, 1.0], vec![2.0, 0.0]],
    )
    .unwrap()
  }

  #[test]
  fn test_nearest_row_lookup() {
    let t = table();
    assert_eq!(t.len(), 3);
    assert_eq!(
      t.evaluate(&[vec![0.2], vec![1.4], vec![5.0]]).unwrap(),
      vec![vec![0.0, 2.0], vec![1.0, 1.0], vec![2.0, 0.0]]
    );
  }

  #[test]
  fn test_rejects_ragged_table() {
    let domain = Domain::new(vec![Variable::new("x")], vec![0.0], vec![1.0]).unwrap();
    assert!(TableProblem::new(domain.clone(), vec![vec![0.0]], vec![]).is_err());
    assert!(TableProblem::new(domain.clone(), vec![vec![0.0]], vec![vec![0.0, 1.0]]).is_err());
    assert!(TableProblem::new(domain, vec![], vec![]).is_err());
  }
}
