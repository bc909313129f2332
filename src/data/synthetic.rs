//! In-memory synthetic tables drawn from independent uniform columns.

use crate::error::{AppError, Result};
use crate::ml::models::LabeledTable;
use crate::models::{FeatureSchema, FAILURE_LABEL, NORMAL_LABEL};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{info, warn};

/// How the synthetic label is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LabelRule {
    /// Threshold freshly drawn columns that are independent of the features.
    /// The label then carries no signal from the generated table.
    #[default]
    IndependentDraws,

    /// Threshold the generated feature columns themselves
    GeneratedColumns,
}

/// A feature drawn from `U(low, high)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformColumn {
    pub name: String,
    pub low: f64,
    pub high: f64,
}

impl UniformColumn {
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
        }
    }
}

/// `column > threshold` contributes a failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub column: String,
    pub threshold: f64,
}

/// Parameters of a synthetic table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    /// Number of rows
    pub rows: usize,

    /// RNG seed
    pub seed: u64,

    /// Generated columns, in draw order
    pub columns: Vec<UniformColumn>,

    /// A `U(0, 1)` flag above this value marks a random failure
    pub flag_threshold: f64,

    /// Per-column failure thresholds
    pub thresholds: Vec<Threshold>,

    /// Label derivation rule
    pub label_rule: LabelRule,
}

/// Generate the table.
///
/// Draw order is fixed: every feature column in turn, then the flag column,
/// then (for [`LabelRule::IndependentDraws`]) one fresh column per threshold.
pub fn generate(schema: &FeatureSchema, spec: &SyntheticSpec) -> Result<LabeledTable> {
    let column_idx: Vec<usize> = schema
        .names()
        .iter()
        .map(|name| {
            spec.columns
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| {
                    AppError::Validation(format!("No generator for feature '{}'", name))
                })
        })
        .collect::<Result<_>>()?;

    for column in &spec.columns {
        if !(column.low < column.high) {
            return Err(AppError::Validation(format!(
                "Invalid range for '{}': [{}, {})",
                column.name, column.low, column.high
            )));
        }
    }

    let threshold_idx: Vec<usize> = spec
        .thresholds
        .iter()
        .map(|t| {
            spec.columns
                .iter()
                .position(|c| c.name == t.column)
                .ok_or_else(|| {
                    AppError::Validation(format!("Threshold on unknown column '{}'", t.column))
                })
        })
        .collect::<Result<_>>()?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let generated: Vec<Vec<f64>> = spec
        .columns
        .iter()
        .map(|c| draw_uniform(&mut rng, c.low, c.high, spec.rows))
        .collect();

    let flags = draw_uniform(&mut rng, 0.0, 1.0, spec.rows);
    let mut failed: Vec<bool> = flags.iter().map(|&f| f > spec.flag_threshold).collect();

    match spec.label_rule {
        LabelRule::IndependentDraws => {
            warn!("Synthetic labels are drawn independently of the generated feature columns");
            for (t, &idx) in spec.thresholds.iter().zip(&threshold_idx) {
                let column = &spec.columns[idx];
                let resampled = draw_uniform(&mut rng, column.low, column.high, spec.rows);
                for (flag, value) in failed.iter_mut().zip(resampled) {
                    *flag |= value > t.threshold;
                }
            }
        }
        LabelRule::GeneratedColumns => {
            for (t, &idx) in spec.thresholds.iter().zip(&threshold_idx) {
                for (flag, &value) in failed.iter_mut().zip(&generated[idx]) {
                    *flag |= value > t.threshold;
                }
            }
        }
    }

    let mut features = Array2::zeros((spec.rows, schema.len()));
    for (j, &idx) in column_idx.iter().enumerate() {
        for (i, &value) in generated[idx].iter().enumerate() {
            features[[i, j]] = value;
        }
    }
    let labels: Array1<usize> = failed
        .iter()
        .map(|&f| if f { FAILURE_LABEL } else { NORMAL_LABEL })
        .collect();

    let table = LabeledTable::new(schema.clone(), features, labels)?;
    info!(
        rows = table.n_samples(),
        failures = table.positive_count(),
        seed = spec.seed,
        rule = %spec.label_rule,
        "Generated synthetic table"
    );

    Ok(table)
}

fn draw_uniform(rng: &mut StdRng, low: f64, high: f64, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(low..high)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["Speed", "Temperature"]).unwrap()
    }

    fn spec(rule: LabelRule) -> SyntheticSpec {
        SyntheticSpec {
            rows: 500,
            seed: 42,
            columns: vec![
                UniformColumn::new("Speed", 8000.0, 16000.0),
                UniformColumn::new("Temperature", 800.0, 1200.0),
            ],
            flag_threshold: 0.95,
            thresholds: vec![
                Threshold {
                    column: "Speed".to_string(),
                    threshold: 15500.0,
                },
                Threshold {
                    column: "Temperature".to_string(),
                    threshold: 1150.0,
                },
            ],
            label_rule: rule,
        }
    }

    #[test]
    fn test_values_stay_in_range() {
        let table = generate(&schema(), &spec(LabelRule::IndependentDraws)).unwrap();

        assert_eq!(table.n_samples(), 500);
        assert!(table.features.column(0).iter().all(|&v| (8000.0..16000.0).contains(&v)));
        assert!(table.features.column(1).iter().all(|&v| (800.0..1200.0).contains(&v)));
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = generate(&schema(), &spec(LabelRule::IndependentDraws)).unwrap();
        let b = generate(&schema(), &spec(LabelRule::IndependentDraws)).unwrap();

        assert_eq!(a.features, b.features);
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_generated_columns_rule_thresholds_features() {
        let table = generate(&schema(), &spec(LabelRule::GeneratedColumns)).unwrap();

        for (row, &label) in table.features.outer_iter().zip(table.labels.iter()) {
            if row[0] > 15500.0 || row[1] > 1150.0 {
                assert_eq!(label, FAILURE_LABEL);
            }
        }
    }

    #[test]
    fn test_feature_columns_do_not_depend_on_label_rule() {
        let independent = generate(&schema(), &spec(LabelRule::IndependentDraws)).unwrap();
        let generated = generate(&schema(), &spec(LabelRule::GeneratedColumns)).unwrap();

        assert_eq!(independent.features, generated.features);
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let schema = FeatureSchema::new(["Speed", "Pressure"]).unwrap();
        assert!(generate(&schema, &spec(LabelRule::IndependentDraws)).is_err());
    }

    #[test]
    fn test_label_rule_parsing() {
        assert_eq!(
            "generated-columns".parse::<LabelRule>().unwrap(),
            LabelRule::GeneratedColumns
        );
        assert_eq!(LabelRule::IndependentDraws.to_string(), "independent-draws");
    }
}
