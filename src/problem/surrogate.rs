//! Problems evaluated through fitted surrogate models.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use super::{Domain, Problem, Variable};
use crate::error::{Error, Result};

/// A fitted regression model predicting a single objective.
pub trait Surrogate {
  /// Returns one prediction per row of `x`.
  fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// A linear model `y = coefficients · x + intercept`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearSurrogate {
  /// One coefficient per input.
  pub coefficients: Vec<f64>,
  /// Constant term.
  pub intercept: f64,
}

impl LinearSurrogate {
  /// Parses a model from its JSON form, e.g.
  /// `{"coefficients": [1.0, -2.0], "intercept": 0.5}`.
  pub fn from_json(json: &str) -> Result<Self> {
    serde_json::from_str(json).map_err(|e| Error::Surrogate(format!("malformed model: {e}")))
  }

  /// Loads a model persisted as JSON.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
      .map_err(|e| Error::Surrogate(format!("can't read {}: {e}", path.display())))?;
    Self::from_json(&json)
  }
}

impl Surrogate for LinearSurrogate {
  fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
    x.iter()
      .map(|row| {
        if row.len() != self.coefficients.len() {
          return Err(Error::Surrogate(format!(
            "model expects {} inputs, got {}",
            self.coefficients.len(),
            row.len()
          )));
        }
        Ok(
          self
            .coefficients
            .iter()
            .zip(row)
            .map(|(c, v)| c * v)
            .sum::<f64>()
            + self.intercept,
        )
      })
      .collect()
  }
}

/// A problem with one surrogate model per objective.
pub struct SurrogateProblem {
  domain: Domain,
  models: Vec<Box<dyn Surrogate>>,
}

impl SurrogateProblem {
  /// Creates a problem from one model per objective, in objective order.
  pub fn new(domain: Domain, models: Vec<Box<dyn Surrogate>>) -> Result<Self> {
    Error::check_len("surrogate models", domain.ideal().len(), models.len())?;
    Ok(Self { domain, models })
  }
}

impl Problem for SurrogateProblem {
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
    let mut objectives = vec![Vec::with_capacity(self.models.len()); population.len()];
    for model in &self.models {
      let predictions = model.predict(population)?;
      if predictions.len() != population.len() {
        return Err(Error::Surrogate(format!(
          "model returned {} predictions for {} inputs",
          predictions.len(),
          population.len()
        )));
      }
      objectives
        .iter_mut()
        .zip(predictions)
        .for_each(|(f, y)| f.push(y));
    }
    Ok(objectives)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn domain() -> Domain {
    Domain::new(
      vec![
        Variable::bounded("a", 0.0, 1.0).unwrap(),
        Variable::bounded("b", 0.0, 1.0).unwrap(),
      ],
      vec![0.0, -1.0],
      vec![2.0, 1.0],
    )
    .unwrap()
  }

  #[test]
  fn test_linear_model_from_json() {
    let m = LinearSurrogate::from_json(r#"{"coefficients": [1.0, 1.0], "intercept": 0.0}"#)
      .unwrap();
    assert_eq!(m.predict(&[vec![0.5, 0.25]]).unwrap(), vec![0.75]);
    assert!(m.predict(&[vec![0.5]]).is_err());
    assert!(matches!(
      LinearSurrogate::from_json("{}"),
      Err(Error::Surrogate(_))
    ));
    assert!(matches!(
      LinearSurrogate::load("/nonexistent/model.json"),
      Err(Error::Surrogate(_))
    ));
  }

  #[test]
  fn test_surrogate_problem() {
    let p = SurrogateProblem::new(
      domain(),
      vec![
        Box::new(LinearSurrogate {
          coefficients: vec![1.0, 1.0],
          intercept: 0.0,
        }),
        Box::new(LinearSurrogate {
          coefficients: vec![-1.0, 1.0],
          intercept: 0.0,
        }),
      ],
    )
    .unwrap();
    assert_eq!(
      p.evaluate(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap(),
      vec![vec![1.0, -1.0], vec![1.0, 1.0]]
    );
    assert!(SurrogateProblem::new(domain(), vec![]).is_err());
  }
}
