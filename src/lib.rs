//! Cutting and remnant-reuse planning for panel and bar stock.

pub mod aggregate;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod guillotine;
pub mod layouts;
pub mod linear;
pub mod logging;
pub mod packing;
pub mod panel;
pub mod plan;
pub mod pool;
pub mod solver;
pub mod tiers;
pub mod types;

pub use error::{PlanError, Result};
pub use solver::{Report, Solver};
