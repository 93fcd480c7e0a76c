//! **IMO** is an Interactive Multiobjective Optimization framework. It helps
//! a decision maker navigate the Pareto optimal trade-offs of a problem with
//! several conflicting objectives by alternating between two steps:
//! 1. **Ask** the decision maker for preference information: weights,
//!    rankings or a classification of objectives at the current point
//! 2. **Solve** a single-objective subproblem built from that preference and
//!    show the resulting candidate points
//!
//! The loop continues until the decision maker is satisfied or the iteration
//! budget is spent.
//!
//! Here's a [quick start example](#example) for the impatient.
//!
//! # Building blocks
//!
//! Leaves first:
//! - [`Problem`] maps decision vectors to objective vectors. It may be a
//!   formula, a table, an external simulator or a set of surrogate models
//! - [`Preference`] is what the decision maker says. Each kind turns raw
//!   input into weights and, for classifications, a reference point
//! - [`Scalarization`] turns a problem and a preference into a
//!   single-objective subproblem with objective bounds: an achievement
//!   scalarizing function, an epsilon-constraint problem or a NIMBUS
//!   subproblem
//! - [`Optimizer`] solves a scalarization. [`LocalOptimizer`] hands it to a
//!   derivative-free constrained solver, [`GlobalOptimizer`] to a stochastic
//!   global solver with a death penalty
//! - [`IterationPointFactory`] and [`BoundsFactory`] assemble candidate
//!   points from one or several scalarizations
//! - [`InteractiveMethod`] drives the dialogue: [`NimbusMethod`] works with
//!   classifications, [`NautilusMethod`] approaches the Pareto front from
//!   the nadir point
//!
//! Independent of the loop, [`ReferencePointGenerator`] spreads reference
//! points evenly over the normalized objective space.
//!
//! # Errors
//!
//! Every fallible operation returns [`Result`]. A failed iteration leaves
//! the method as it was, so the caller may correct the input and retry.
//!
//! # Logging
//!
//! Log records go through the [`log`](https://docs.rs/log) facade. Methods
//! write to the target set in their [`MethodConfig`], so several sessions
//! can be told apart.
//!
//! # Example
//!
//! Classifying the objectives of *Schaffer's Problem No.1* with NIMBUS.
//! ```
//! # fn main() -> imo::Result<()> {
//! use imo::{
//!   method::{InteractiveMethod, IterationRequest, MethodConfig, NimbusMethod},
//!   optimizer::LocalOptimizer,
//!   problem::{AnalyticProblem, Domain, Variable},
//!   scalarization::ScalarKind,
//! };
//! // objective functions `f1(x) = x^2` and `f2(x) = (x - 2)^2` over [-1, 3]
//! let domain = Domain::new(
//!   vec![Variable::bounded("x", -1.0, 3.0)?],
//!   vec![0.0, 0.0],
//!   vec![4.0, 4.0],
//! )?;
//! let problem = AnalyticProblem::new(domain, |x: &[f64]| {
//!   vec![x[0].powi(2), (x[0] - 2.0).powi(2)]
//! });
//! let config = MethodConfig::builder().user_iters(5).build();
//! let mut nimbus = NimbusMethod::new(problem, LocalOptimizer::default(), config)?;
//!
//! // start at a neutral compromise
//! let start = nimbus.init_iteration()?;
//! // improve `f1` as much as possible, let `f2` get worse
//! let classification = nimbus.classify(&[("<", None), ("0", None)])?;
//! let candidates = nimbus.next_iteration(
//!   IterationRequest::builder()
//!     .preference(classification)
//!     .scalars(vec![ScalarKind::Nimbus, ScalarKind::Achievement])
//!     .build(),
//! )?;
//! assert!(candidates[0][0] < start[0][0]);
//! # Ok(())
//! # }
//! ```
//!
//! [`Problem`]: crate::problem::Problem
//! [`Preference`]: crate::preference::Preference
//! [`Scalarization`]: crate::scalarization::Scalarization
//! [`Optimizer`]: crate::optimizer::Optimizer
//! [`LocalOptimizer`]: crate::optimizer::LocalOptimizer
//! [`GlobalOptimizer`]: crate::optimizer::GlobalOptimizer
//! [`IterationPointFactory`]: crate::factory::IterationPointFactory
//! [`BoundsFactory`]: crate::factory::BoundsFactory
//! [`InteractiveMethod`]: crate::method::InteractiveMethod
//! [`NimbusMethod`]: crate::method::NimbusMethod
//! [`NautilusMethod`]: crate::method::NautilusMethod
//! [`MethodConfig`]: crate::method::MethodConfig
//! [`ReferencePointGenerator`]: crate::reference::ReferencePointGenerator

#![warn(missing_docs)]

pub mod error;
pub mod factory;
pub mod method;
pub mod optimizer;
pub mod preference;
pub mod problem;
pub mod reference;
pub mod scalarization;

pub use error::{Error, Result};
