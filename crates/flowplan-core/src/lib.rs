//! Flowplan Core -- post-solve normalization for production planners.
//!
//! A linear-program solver decides how many machines run each recipe and
//! how many items each step moves. This crate turns those raw steps into
//! display-ready rows: who consumes what, belts and wagons needed, power,
//! pollution and beacons, rates scaled to the display unit, and a stable
//! order that reads top-down from finished products to raw resources.
//!
//! # Pipeline
//!
//! [`pipeline::normalize_steps`] runs, on a private copy of the steps:
//!
//! 1. **Recipes** -- attach missing recipe snapshots from objectives or the
//!    dataset.
//! 2. **Flow** -- accumulate consumption into item steps (`parents`) and
//!    output attribution into recipe steps (`outputs`).
//! 3. **Enrich** -- settings, power/pollution, belts/wagons, beacons,
//!    display scaling and the checked flag, one step at a time.
//! 4. **Layer** -- longest-path depth in the item/recipe graph, tolerating
//!    cycles.
//! 5. **Order** -- rank sort, then a parent/child pre-order.
//!
//! Objective values are converted to solver rates beforehand with
//! [`rate::objective_normalized_rate`].
//!
//! # Key Types
//!
//! - [`rational::Rational`] -- exact arbitrary-precision fraction used for
//!   every quantity.
//! - [`step::Step`] -- one row of the plan, annotated in place.
//! - [`dataset::AdjustedDataset`] -- immutable catalog, built through
//!   [`dataset::DatasetBuilder`].
//! - [`pipeline::PlanContext`] -- settings and catalog for one run.

pub mod dataset;
pub mod enrich;
pub mod error;
pub mod flow;
pub mod hierarchy;
pub mod id;
pub mod layering;
pub mod objective;
pub mod pipeline;
pub mod power;
pub mod rate;
pub mod rational;
pub mod settings;
pub mod step;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
