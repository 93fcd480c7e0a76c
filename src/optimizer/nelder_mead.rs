//! A derivative-free constrained Nelder-Mead simplex search.

use std::cmp::Ordering;

use itertools::Itertools;
use typed_builder::TypedBuilder;

use super::{ConstrainedMinimizer, Minimum, ScalarFn, FEASIBILITY_TOLERANCE};
use crate::error::{Error, Result};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Nelder-Mead simplex search handling constraints with feasibility rules:
/// a feasible vertex beats an infeasible one, two feasible vertices compare
/// by objective value and two infeasible ones by total violation.
///
/// # Examples
/// ```
/// # use imo::optimizer::NelderMead;
/// let nm = NelderMead::builder().max_evaluations(500).build();
/// ```
#[derive(TypedBuilder, Clone, Debug)]
pub struct NelderMead {
  /// Evaluation budget.
  #[builder(default = 4000)]
  max_evaluations: usize,
  /// Size of the initial simplex relative to the starting point.
  #[builder(default = 0.1)]
  initial_step: f64,
  /// The search stops once the simplex is this small in both decision and
  /// objective space.
  #[builder(default = 1e-10)]
  tolerance: f64,
  /// How many times the simplex is rebuilt around the best point after
  /// converging.
  #[builder(default = 3)]
  restarts: usize,
}

impl Default for NelderMead {
  fn default() -> Self {
    Self::builder().build()
  }
}

#[derive(Clone, Debug)]
struct Vertex {
  x: Vec<f64>,
  value: f64,
  violation: f64,
}

impl Vertex {
  fn feasible(&self) -> bool {
    self.violation <= FEASIBILITY_TOLERANCE
  }

  /// `Less` if `self` is the better vertex.
  fn rank(&self, other: &Self) -> Ordering {
    match (self.feasible(), other.feasible()) {
      (true, true) => self.value.total_cmp(&other.value),
      (true, false) => Ordering::Less,
      (false, true) => Ordering::Greater,
      (false, false) => self.violation.total_cmp(&other.violation),
    }
  }
}

struct Evaluator<'a, 'f> {
  objective: &'a ScalarFn<'f>,
  constraints: &'a [&'a ScalarFn<'f>],
  evaluations: usize,
}

impl Evaluator<'_, '_> {
  fn vertex(&mut self, x: Vec<f64>) -> Result<Vertex> {
    self.evaluations += 1;
    let value = (self.objective)(&x)?;
    let violation = self
      .constraints
      .iter()
      .map(|c| c(&x).map(|v| v.max(0.0)))
      .sum::<Result<f64>>()?;
    Ok(Vertex {
      x,
      value: if value.is_nan() { f64::INFINITY } else { value },
      violation: if violation.is_nan() { f64::INFINITY } else { violation },
    })
  }
}

// `a + t * (b - a)`
fn towards(a: &[f64], b: &[f64], t: f64) -> Vec<f64> {
  a.iter().zip(b).map(|(a, b)| a + t * (b - a)).collect()
}

impl NelderMead {
  fn descend(&self, eval: &mut Evaluator<'_, '_>, x0: &[f64]) -> Result<Vertex> {
    let n = x0.len();
    let mut simplex = Vec::with_capacity(n + 1);
    simplex.push(eval.vertex(x0.to_vec())?);
    for i in 0..n {
      let mut x = x0.to_vec();
      x[i] += self.initial_step * x0[i].abs().max(1.0);
      simplex.push(eval.vertex(x)?);
    }

    loop {
      simplex.sort_by(Vertex::rank);
      if eval.evaluations >= self.max_evaluations {
        break;
      }
      let best = &simplex[0];
      let x_spread = simplex[1..]
        .iter()
        .flat_map(|v| v.x.iter().zip(&best.x).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max);
      let (lo, hi) = simplex
        .iter()
        .map(|v| if v.feasible() { v.value } else { v.violation })
        .minmax_by(|a, b| a.total_cmp(b))
        .into_option()
        .unwrap_or_default();
      let same_side = simplex.iter().map(Vertex::feasible).all_equal();
      if same_side && x_spread <= self.tolerance && hi - lo <= self.tolerance {
        break;
      }

      let centroid: Vec<f64> = (0..n)
        .map(|j| simplex[..n].iter().map(|v| v.x[j]).sum::<f64>() / n as f64)
        .collect();
      let worst = simplex[n].x.clone();

      let reflected = eval.vertex(towards(&centroid, &worst, -REFLECTION))?;
      if reflected.rank(&simplex[0]) == Ordering::Less {
        let expanded = eval.vertex(towards(&centroid, &reflected.x, EXPANSION))?;
        simplex[n] = if expanded.rank(&reflected) == Ordering::Less {
          expanded
        } else {
          reflected
        };
        continue;
      }
      if reflected.rank(&simplex[n - 1]) == Ordering::Less {
        simplex[n] = reflected;
        continue;
      }

      let outside = reflected.rank(&simplex[n]) == Ordering::Less;
      let contracted = if outside {
        eval.vertex(towards(&centroid, &reflected.x, CONTRACTION))?
      } else {
        eval.vertex(towards(&centroid, &worst, CONTRACTION))?
      };
      let accepted = if outside {
        contracted.rank(&reflected) != Ordering::Greater
      } else {
        contracted.rank(&simplex[n]) == Ordering::Less
      };
      if accepted {
        simplex[n] = contracted;
        continue;
      }

      let best = simplex[0].x.clone();
      for v in simplex.iter_mut().skip(1) {
        *v = eval.vertex(towards(&best, &v.x, SHRINK))?;
      }
    }

    Ok(simplex.swap_remove(0))
  }
}

impl ConstrainedMinimizer for NelderMead {
  fn minimize(
    &mut self,
    objective: &ScalarFn<'_>,
    constraints: &[&ScalarFn<'_>],
    x0: &[f64],
  ) -> Result<Minimum> {
    if x0.is_empty() {
      return Err(Error::Configuration("nothing to minimize over".into()));
    }
    let mut eval = Evaluator {
      objective,
      constraints,
      evaluations: 0,
    };

    // a collapsed simplex can stall on a constraint boundary, restarting
    // from the best vertex rebuilds it
    let mut best = self.descend(&mut eval, x0)?;
    for _ in 0..self.restarts {
      if eval.evaluations >= self.max_evaluations {
        break;
      }
      let next = self.descend(&mut eval, &best.x)?;
      let progressed = next.feasible() != best.feasible()
        || (next.value - best.value).abs() > self.tolerance
        || (next.violation - best.violation).abs() > self.tolerance;
      if next.rank(&best) == Ordering::Less {
        best = next;
      }
      if !progressed {
        break;
      }
    }

    Ok(Minimum {
      x: best.x,
      value: best.value,
      violation: best.violation,
      evaluations: eval.evaluations,
    })
  }
}
