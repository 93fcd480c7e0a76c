//! Differential evolution over a box.
//!
//! Every generation, each member `x_i` of the population produces a mutant
//! `v = x_r1 + F * (x_r2 - x_r3)` from three other distinct members, mixes it
//! with itself by binomial crossover and is replaced by the trial vector if
//! the trial is not worse (DE/rand/1/bin). Mutants leaving the box are
//! clipped back into it.

use itertools::Itertools;
use rand::{prelude::*, seq::index};
use typed_builder::TypedBuilder;

use super::{GlobalMinimizer, Minimum, ScalarFn};
use crate::error::{Error, Result};

/// DE/rand/1/bin minimizer.
///
/// | Option            | Default         |
/// |:------------------|:----------------|
/// | `population_size` | `max(15, 10 n)` |
/// | `mutation_factor` | `0.8`           |
/// | `crossover_rate`  | `0.9`           |
/// | `generations`     | `300`           |
/// | `tolerance`       | `1e-10`         |
/// | `seed`            | from entropy    |
///
/// # Examples
/// ```
/// # use imo::optimizer::DifferentialEvolution;
/// let de = DifferentialEvolution::builder().generations(100).seed(42).build();
/// ```
#[derive(TypedBuilder, Clone, Debug)]
pub struct DifferentialEvolution {
  /// Population size, at least 4.
  #[builder(default, setter(strip_option))]
  population_size: Option<usize>,
  /// Differential weight `F`.
  #[builder(default = 0.8)]
  mutation_factor: f64,
  /// Probability of taking a coordinate from the mutant.
  #[builder(default = 0.9)]
  crossover_rate: f64,
  /// Maximum number of generations.
  #[builder(default = 300)]
  generations: usize,
  /// The search stops once population's values spread no more than this.
  #[builder(default = 1e-10)]
  tolerance: f64,
  /// Seed of the random number generator.
  #[builder(default, setter(strip_option))]
  seed: Option<u64>,
  #[builder(default, setter(skip))]
  rng: Option<StdRng>,
}

impl Default for DifferentialEvolution {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl DifferentialEvolution {
  fn rng(&mut self) -> &mut StdRng {
    let seed = self.seed;
    self.rng.get_or_insert_with(|| match seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    })
  }
}

fn value_of(objective: &ScalarFn<'_>, x: &[f64]) -> Result<f64> {
  let value = objective(x)?;
  Ok(if value.is_nan() { f64::INFINITY } else { value })
}

impl GlobalMinimizer for DifferentialEvolution {
  fn minimize(&mut self, objective: &ScalarFn<'_>, bounds: &[(f64, f64)]) -> Result<Minimum> {
    if bounds.is_empty() {
      return Err(Error::Configuration("nothing to minimize over".into()));
    }
    if let Some((i, (lo, hi))) = bounds
      .iter()
      .find_position(|(lo, hi)| !(lo.is_finite() && hi.is_finite() && lo <= hi))
    {
      return Err(Error::Configuration(format!(
        "variable {i} has invalid bounds [{lo}, {hi}]"
      )));
    }

    if !(0.0..=1.0).contains(&self.crossover_rate) {
      return Err(Error::Configuration(format!(
        "crossover rate must lie in [0, 1], got {}",
        self.crossover_rate
      )));
    }

    let n = bounds.len();
    let np = self.population_size.unwrap_or((10 * n).max(15)).max(4);
    let (f, cr, generations, tolerance) = (
      self.mutation_factor,
      self.crossover_rate,
      self.generations,
      self.tolerance,
    );
    let rng = self.rng();

    let mut population: Vec<Vec<f64>> = (0..np)
      .map(|_| {
        bounds
          .iter()
          .map(|&(lo, hi)| if lo < hi { rng.gen_range(lo..=hi) } else { lo })
          .collect()
      })
      .collect();
    let mut values = population
      .iter()
      .map(|x| value_of(objective, x))
      .collect::<Result<Vec<_>>>()?;
    let mut evaluations = np;

    for generation in 0..generations {
      let (lo, hi) = values
        .iter()
        .minmax_by(|a, b| a.total_cmp(b))
        .into_option()
        .unwrap_or((&0.0, &0.0));
      if hi - lo <= tolerance {
        log::trace!("differential evolution converged after {generation} generations");
        break;
      }
      for i in 0..np {
        // three distinct members other than `i`
        let r: Vec<usize> = index::sample(rng, np - 1, 3)
          .into_iter()
          .map(|r| if r >= i { r + 1 } else { r })
          .collect();
        let forced = rng.gen_range(0..n);
        let trial: Vec<f64> = (0..n)
          .map(|j| {
            if j == forced || rng.gen_bool(cr) {
              let v = population[r[0]][j] + f * (population[r[1]][j] - population[r[2]][j]);
              v.clamp(bounds[j].0, bounds[j].1)
            } else {
              population[i][j]
            }
          })
          .collect();
        let value = value_of(objective, &trial)?;
        evaluations += 1;
        if value <= values[i] {
          population[i] = trial;
          values[i] = value;
        }
      }
    }

    let best = values
      .iter()
      .position_min_by(|a, b| a.total_cmp(b))
      .unwrap_or_default();
    Ok(Minimum {
      x: population.swap_remove(best),
      value: values[best],
      violation: 0.0,
      evaluations,
    })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn test_sphere() {
    let f = |x: &[f64]| -> Result<f64> { Ok(x.iter().map(|x| (x - 1.0).powi(2)).sum()) };
    let m = DifferentialEvolution::builder()
      .seed(3)
      .build()
      .minimize(&f, &[(-5.0, 5.0), (-5.0, 5.0)])
      .unwrap();
    assert_abs_diff_eq!(m.x[0], 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(m.x[1], 1.0, epsilon = 1e-3);
  }

  #[test]
  fn test_multimodal() {
    // Rastrigin, global minimum at the origin
    let f = |x: &[f64]| -> Result<f64> {
      Ok(
        x.iter()
          .map(|x| x * x - 10.0 * (2.0 * std::f64::consts::PI * x).cos() + 10.0)
          .sum(),
      )
    };
    let m = DifferentialEvolution::builder()
      .seed(11)
      .population_size(40)
      .generations(1000)
      .build()
      .minimize(&f, &[(-5.12, 5.12), (-5.12, 5.12)])
      .unwrap();
    assert_abs_diff_eq!(m.value, 0.0, epsilon = 1e-3);
  }

  #[test]
  fn test_stays_in_bounds() {
    let f = |x: &[f64]| -> Result<f64> { Ok(-x[0]) };
    let m = DifferentialEvolution::builder()
      .seed(5)
      .build()
      .minimize(&f, &[(0.0, 2.0)])
      .unwrap();
    assert!(m.x[0] <= 2.0);
    assert_abs_diff_eq!(m.x[0], 2.0, epsilon = 1e-6);
  }

  #[test]
  fn test_seed_reproducibility() {
    let f = |x: &[f64]| -> Result<f64> { Ok((x[0] - 0.3).abs() + x[1].sin()) };
    let run = || {
      DifferentialEvolution::builder()
        .seed(9)
        .generations(20)
        .build()
        .minimize(&f, &[(-1.0, 1.0), (-1.0, 1.0)])
        .unwrap()
    };
    assert_eq!(run(), run());
  }

  #[test]
  fn test_rejects_bad_bounds() {
    let f = |_: &[f64]| -> Result<f64> { Ok(0.0) };
    let mut de = DifferentialEvolution::default();
    assert!(de.minimize(&f, &[]).is_err());
    assert!(de.minimize(&f, &[(1.0, 0.0)]).is_err());
    assert!(de.minimize(&f, &[(0.0, f64::INFINITY)]).is_err());
  }
}
