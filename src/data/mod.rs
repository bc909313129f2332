/// Dataset acquisition
///
/// Produces a labeled table for a feature schema from one of two sources:
/// - CSV files, labeled by membership in a set of problem timestamps
/// - a seeded synthetic generator

pub mod files;
pub mod synthetic;

pub use files::{load_labeled, TIMESTAMP_COLUMN};
pub use synthetic::{generate, LabelRule, SyntheticSpec, Threshold, UniformColumn};

use crate::error::Result;
use crate::ml::models::LabeledTable;
use crate::models::FeatureSchema;
use std::path::PathBuf;

/// Where a pipeline obtains its observations
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Primary measurement table plus a table of problem timestamps
    Files { primary: PathBuf, problems: PathBuf },

    /// Seeded synthetic table
    Synthetic(SyntheticSpec),
}

impl DataSource {
    /// Produce the labeled table for `schema`
    pub fn load(&self, schema: &FeatureSchema) -> Result<LabeledTable> {
        match self {
            DataSource::Files { primary, problems } => load_labeled(primary, problems, schema),
            DataSource::Synthetic(spec) => generate(schema, spec),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic(_))
    }
}
