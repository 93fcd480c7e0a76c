//! Problems evaluated by an external simulator process.
//!
//! The simulator is invoked once per decision vector as
//!
//! ```text
//! <program> [args...] --decision-variables '{"x1": 0.5, ...}' --parameters '{"p": 1.0, ...}'
//! ```
//!
//! and must print a JSON object mapping output names to sequences of numbers
//! on standard output, e.g. `{"cost": [1.0, 1.5], "loss": [0.2]}`.

use std::{collections::BTreeMap, path::PathBuf, process::Command};

use serde::{Deserialize, Serialize};

use super::{Domain, Problem, Variable};
use crate::error::{Error, Result};

/// How a sequence of simulator outputs becomes a single objective value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputReduction {
  /// The last value of the sequence.
  #[default]
  Last,
  /// The arithmetic mean.
  Mean,
  /// The largest value.
  Max,
  /// The smallest value.
  Min,
}

impl OutputReduction {
  fn reduce(self, values: &[f64]) -> Option<f64> {
    if values.is_empty() {
      return None;
    }
    Some(match self {
      Self::Last => values[values.len() - 1],
      Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
      Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
      Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
    })
  }
}

/// A problem whose objectives are produced by an external program.
#[derive(Clone, Debug)]
pub struct SimulatorProblem {
  domain: Domain,
  program: PathBuf,
  args: Vec<String>,
  parameters: BTreeMap<String, f64>,
  outputs: Vec<String>,
  reduction: OutputReduction,
}

impl SimulatorProblem {
  /// Creates a simulator-backed problem. `outputs` names the simulator output
  /// read for each objective, in objective order.
  pub fn new(
    domain: Domain,
    program: impl Into<PathBuf>,
    outputs: Vec<String>,
  ) -> Result<Self> {
    Error::check_len("simulator outputs", domain.ideal().len(), outputs.len())?;
    Ok(Self {
      domain,
      program: program.into(),
      args: Vec::new(),
      parameters: BTreeMap::new(),
      outputs,
      reduction: OutputReduction::default(),
    })
  }

  /// Sets arguments placed before the decision variables, e.g. a script path.
  pub fn with_args(mut self, args: Vec<String>) -> Self {
    self.args = args;
    self
  }

  /// Sets the fixed parameters passed on every invocation.
  pub fn with_parameters(mut self, parameters: BTreeMap<String, f64>) -> Self {
    self.parameters = parameters;
    self
  }

  /// Sets how output sequences are reduced to objective values.
  pub fn with_reduction(mut self, reduction: OutputReduction) -> Self {
    self.reduction = reduction;
    self
  }

  fn failure(&self, message: impl Into<String>) -> Error {
    Error::Simulator {
      program: self.program.display().to_string(),
      message: message.into(),
    }
  }

  fn run(&self, decision: &[f64]) -> Result<Vec<f64>> {
    let variables: BTreeMap<&str, f64> = self
      .domain
      .variables()
      .iter()
      .map(Variable::name)
      .zip(decision.iter().copied())
      .collect();
    let variables =
      serde_json::to_string(&variables).map_err(|e| self.failure(e.to_string()))?;
    let parameters =
      serde_json::to_string(&self.parameters).map_err(|e| self.failure(e.to_string()))?;

    let output = Command::new(&self.program)
      .args(&self.args)
      .arg("--decision-variables")
      .arg(variables)
      .arg("--parameters")
      .arg(parameters)
      .output()
      .map_err(|e| self.failure(e.to_string()))?;
    if !output.status.success() {
      return Err(self.failure(format!(
        "exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
      )));
    }

    let values: BTreeMap<String, Vec<f64>> = serde_json::from_slice(&output.stdout)
      .map_err(|e| self.failure(format!("malformed output: {e}")))?;
    self
      .outputs
      .iter()
      .map(|name| {
        let sequence = values
          .get(name)
          .ok_or_else(|| self.failure(format!("output `{name}` missing")))?;
        self
          .reduction
          .reduce(sequence)
          .ok_or_else(|| self.failure(format!("output `{name}` is empty")))
      })
      .collect()
  }
}

impl Problem for SimulatorProblem {
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
    population.iter().map(|x| self.run(x)).collect()
  }
}
