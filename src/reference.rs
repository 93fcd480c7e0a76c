//! Reference points spread over the normalized objective space.
//!
//! Objectives normalized to `[0, 1]` (ideal at the origin, nadir at
//! `(1, …, 1)`) form the unit hypercube. Projecting the cube along its main
//! diagonal gives a convex polytope in the hyperplane perpendicular to the
//! diagonal. Sampling uniformly inside that polytope and shifting the
//! samples to pass through the nadir point yields reference points covering
//! every trade-off direction evenly.
//!
//! The hyperplane is handled in coordinates where the diagonal is the last
//! axis, reached by two Householder reflections:
//!
//! - `H1 = I - 2 v vᵀ / (vᵀ v)` with `v = u + e_d` maps the unit diagonal
//!   `u = (1, …, 1) / √d` to `-e_d`;
//! - `H2 = I - 2 e_d e_dᵀ` flips it to `e_d`.
//!
//! In `R = H2 H1` coordinates the hyperplane is spanned by the first `d - 1`
//! axes.

use std::collections::{hash_map::Entry, HashMap};

use itertools::Itertools;
use rand::prelude::*;
use typed_builder::TypedBuilder;

use crate::error::{Error, Result};

// tolerance of the facet test
const FACET_TOLERANCE: f64 = f32::EPSILON as f64;

/// The projected hypercube of one dimensionality: rotation, facets and
/// bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferencePointSet {
  num_dims: usize,
  rotation: Vec<Vec<f64>>,
  lower: Vec<f64>,
  upper: Vec<f64>,
  normals: Vec<Vec<f64>>,
  offsets: Vec<f64>,
}

impl ReferencePointSet {
  /// Builds the set for `num_dims` objectives, at least two.
  pub fn new(num_dims: usize) -> Result<Self> {
    if num_dims < 2 {
      return Err(Error::Configuration(format!(
        "reference points need at least 2 objectives, got {num_dims}"
      )));
    }
    let d = num_dims;
    let u = 1.0 / (d as f64).sqrt();
    let v: Vec<f64> = (0..d).map(|i| if i == d - 1 { u + 1.0 } else { u }).collect();
    let vv: f64 = v.iter().map(|x| x * x).sum();
    let rotation = (0..d)
      .map(|i| {
        let sign = if i == d - 1 { -1.0 } else { 1.0 };
        (0..d)
          .map(|j| {
            let identity = if i == j { 1.0 } else { 0.0 };
            sign * (identity - 2.0 * v[i] * v[j] / vv)
          })
          .collect()
      })
      .collect();

    let mut set = Self {
      num_dims,
      rotation,
      lower: Vec::new(),
      upper: Vec::new(),
      normals: Vec::new(),
      offsets: Vec::new(),
    };

    // `y_i - y_j <= 1` for every ordered pair, written in rotated coordinates
    let (normals, offsets) = (0..d)
      .cartesian_product(0..d)
      .filter(|(i, j)| i != j)
      .map(|(i, j)| {
        let mut e = vec![0.0; d];
        e[i] = 1.0;
        e[j] = -1.0;
        (set.rotate_in(&e), -1.0)
      })
      .unzip();
    set.normals = normals;
    set.offsets = offsets;

    let vertices: Vec<Vec<f64>> = (0..d)
      .map(|_| [0.0, 1.0].into_iter())
      .multi_cartesian_product()
      .map(|vertex| set.rotate_in(&vertex))
      .collect();
    debug_assert!(vertices.iter().all(|p| set.contains(p)));
    (set.lower, set.upper) = (0..d - 1)
      .map(|k| {
        vertices
          .iter()
          .map(|p| p[k])
          .minmax_by(|a, b| a.total_cmp(b))
          .into_option()
          .unwrap_or((0.0, 0.0))
      })
      .unzip();
    Ok(set)
  }

  /// Returns the number of objectives.
  pub fn num_dims(&self) -> usize {
    self.num_dims
  }

  /// Returns lower and upper corners of the box enclosing the projected
  /// hypercube, in rotated coordinates.
  pub fn bounding_box(&self) -> (&[f64], &[f64]) {
    (&self.lower, &self.upper)
  }

  /// Returns facet normals `A` of the projected hypercube, one row per facet.
  pub fn normals(&self) -> &[Vec<f64>] {
    &self.normals
  }

  /// Returns facet offsets `b`, matching [`normals`](Self::normals).
  pub fn offsets(&self) -> &[f64] {
    &self.offsets
  }

  /// Rotates `x` so that the diagonal becomes the last axis, then drops that
  /// axis.
  pub fn rotate_in(&self, x: &[f64]) -> Vec<f64> {
    self.rotation[..self.num_dims - 1]
      .iter()
      .map(|row| row.iter().zip(x).map(|(r, x)| r * x).sum())
      .collect()
  }

  /// Maps a point of the rotated hyperplane back to objective space,
  /// shifted to pass through the nadir point `(1, …, 1)`. Results satisfy
  /// `Σ x_i = num_dims`.
  pub fn rotate_out(&self, p: &[f64]) -> Result<Vec<f64>> {
    Error::check_len("rotated point", self.num_dims - 1, p.len())?;
    Ok(
      (0..self.num_dims)
        .map(|k| {
          p.iter()
            .zip(&self.rotation)
            .map(|(p, row)| p * row[k])
            .sum::<f64>()
            + 1.0
        })
        .collect(),
    )
  }

  /// Checks `p·a + b < ε` for every facet `(a, b)`.
  pub fn contains(&self, p: &[f64]) -> bool {
    self.normals.iter().zip(&self.offsets).all(|(a, b)| {
      let dot: f64 = a.iter().zip(p).map(|(a, p)| a * p).sum();
      dot + b < FACET_TOLERANCE
    })
  }
}

/// Samples reference points by rejection from the bounding box of the
/// projected hypercube. Sets are cached per dimensionality.
///
/// # Examples
/// ```
/// # use imo::reference::ReferencePointGenerator;
/// let mut generator = ReferencePointGenerator::builder().seed(7).build();
/// let points = generator.generate_points(10, 3).unwrap();
/// assert!(points.iter().all(|p| (p.iter().sum::<f64>() - 3.0).abs() < 1e-9));
/// ```
#[derive(TypedBuilder, Clone, Debug)]
pub struct ReferencePointGenerator {
  /// Samples drawn before giving up on a request.
  #[builder(default = 1_000_000)]
  max_attempts: usize,
  /// Seed of the random number generator.
  #[builder(default, setter(strip_option))]
  seed: Option<u64>,
  #[builder(default, setter(skip))]
  rng: Option<StdRng>,
  #[builder(default, setter(skip))]
  sets: HashMap<usize, ReferencePointSet>,
}

impl Default for ReferencePointGenerator {
  fn default() -> Self {
    Self::builder().build()
  }
}

impl ReferencePointGenerator {
  /// Returns the set of `num_dims` objectives, building it on first use.
  pub fn set(&mut self, num_dims: usize) -> Result<&ReferencePointSet> {
    Ok(match self.sets.entry(num_dims) {
      Entry::Occupied(entry) => entry.into_mut(),
      Entry::Vacant(entry) => entry.insert(ReferencePointSet::new(num_dims)?),
    })
  }

  /// Returns `num_points` reference points for `num_dims` objectives, each
  /// on the hyperplane `Σ x_i = num_dims` and inside the projected unit
  /// hypercube.
  pub fn generate_points(&mut self, num_points: usize, num_dims: usize) -> Result<Vec<Vec<f64>>> {
    self.set(num_dims)?;
    let set = &self.sets[&num_dims];
    let seed = self.seed;
    let rng = self.rng.get_or_insert_with(|| match seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    });

    let (lower, upper) = set.bounding_box();
    let mut points = Vec::with_capacity(num_points);
    let mut attempts = 0;
    while points.len() < num_points {
      if attempts == self.max_attempts {
        return Err(Error::Generation {
          requested: num_points,
          accepted: points.len(),
          attempts,
        });
      }
      attempts += 1;
      let p: Vec<f64> = lower
        .iter()
        .zip(upper)
        .map(|(&lo, &hi)| if lo < hi { rng.gen_range(lo..hi) } else { lo })
        .collect();
      if set.contains(&p) {
        points.push(set.rotate_out(&p)?);
      }
    }
    log::debug!("accepted {num_points} reference points out of {attempts} samples");
    Ok(points)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn test_diagonal_becomes_last_axis() {
    let set = ReferencePointSet::new(3).unwrap();
    for x in set.rotate_in(&[1.0, 1.0, 1.0]) {
      assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
    }
    // rotation rows are orthonormal
    for (i, a) in set.rotation.iter().enumerate() {
      for (j, b) in set.rotation.iter().enumerate() {
        let dot: f64 = a.iter().zip(b).map(|(a, b)| a * b).sum();
        assert_abs_diff_eq!(dot, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn test_hexagon_in_three_dimensions() {
    let set = ReferencePointSet::new(3).unwrap();
    assert_eq!(set.normals().len(), 6);
    assert!(set.offsets().iter().all(|&b| b == -1.0));
    assert!(set.contains(&[0.0, 0.0]));
    let (lower, upper) = set.bounding_box();
    assert_eq!(lower.len(), 2);
    // a corner of the bounding box lies outside the hexagon
    assert!(!set.contains(&[upper[0], upper[1]]));
    // vertex (1, 0, 0) lands on the hull
    assert!(set.contains(&set.rotate_in(&[1.0, 0.0, 0.0])));
    assert!(!set.contains(&set.rotate_in(&[1.1, 0.0, 0.0])));
  }

  #[test]
  fn test_generated_points_lie_on_plane() {
    let mut generator = ReferencePointGenerator::builder().seed(42).build();
    let points = generator.generate_points(100, 3).unwrap();
    assert_eq!(points.len(), 100);
    for p in &points {
      assert_abs_diff_eq!(p.iter().sum::<f64>(), 3.0, epsilon = 1e-6);
      assert!(p.iter().all(|&x| (-1e-9..=2.0 + 1e-9).contains(&x)));
      // inside the projected cube: no two coordinates more than 1 apart
      let (lo, hi) = p
        .iter()
        .minmax_by(|a, b| a.total_cmp(b))
        .into_option()
        .unwrap();
      assert!(hi - lo <= 1.0 + 1e-6);
    }
  }

  #[test]
  fn test_rotate_out_inverts_rotate_in() {
    let set = ReferencePointSet::new(4).unwrap();
    let x = [0.5, 1.5, 1.25, 0.75];
    let back = set.rotate_out(&set.rotate_in(&x)).unwrap();
    for (a, b) in back.iter().zip(&x) {
      assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
    assert!(set.rotate_out(&[0.0]).is_err());
  }

  #[test]
  fn test_seeded_generation_is_reproducible() {
    let run = || {
      ReferencePointGenerator::builder()
        .seed(3)
        .build()
        .generate_points(5, 4)
        .unwrap()
    };
    assert_eq!(run(), run());
  }

  #[test]
  fn test_sets_are_cached() {
    let mut generator = ReferencePointGenerator::default();
    generator.generate_points(3, 3).unwrap();
    generator.generate_points(3, 5).unwrap();
    generator.generate_points(3, 3).unwrap();
    assert_eq!(generator.sets.len(), 2);
    assert_eq!(generator.set(5).unwrap().num_dims(), 5);
  }

  #[test]
  fn test_attempt_ceiling() {
    let mut generator = ReferencePointGenerator::builder().max_attempts(3).seed(1).build();
    match generator.generate_points(1000, 3) {
      Err(Error::Generation {
        requested,
        accepted,
        attempts,
      }) => {
        assert_eq!(requested, 1000);
        assert!(accepted <= 3);
        assert_eq!(attempts, 3);
      }
      other => panic!("expected a generation error, got {other:?}"),
    }
    assert!(matches!(
      generator.generate_points(1, 1),
      Err(Error::Configuration(_))
    ));
  }
}
