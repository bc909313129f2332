//! Equipment failure prediction.
//!
//! Trains a class-weighted decision tree on a small table of sensor or usage
//! features, evaluates it on a stratified hold-out partition and predicts the
//! status of single input rows. Two profiles are built in: battery
//! replacement from CSV history and turbine maintenance from synthetic
//! readings.

pub mod config;
pub mod data;
pub mod error;
pub mod ml;
pub mod models;
pub mod profiles;

pub use error::{AppError, Result};
