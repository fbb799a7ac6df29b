//! The estimation pipeline: spend → consumption → production → cost → financials → record.

pub mod cost;
pub mod finance;
pub mod labels;
pub mod pipeline;
pub mod production;
pub mod record;
pub mod simulation;
pub mod tariff;

pub use pipeline::{Estimate, Estimator};
