use crate::error::{AppError, Result};
use crate::models::{FeatureSchema, Observation, FAILURE_LABEL};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labeled feature matrix in schema order
#[derive(Debug, Clone)]
pub struct LabeledTable {
    /// Column layout of `features`
    pub schema: FeatureSchema,

    /// Feature matrix (n_samples × n_features)
    pub features: Array2<f64>,

    /// Binary labels
    pub labels: Array1<usize>,
}

impl LabeledTable {
    /// Create a table, checking that shapes agree with the schema
    pub fn new(schema: FeatureSchema, features: Array2<f64>, labels: Array1<usize>) -> Result<Self> {
        if features.ncols() != schema.len() {
            return Err(AppError::Validation(format!(
                "Feature matrix has {} columns but schema has {} features",
                features.ncols(),
                schema.len()
            )));
        }
        if features.nrows() != labels.len() {
            return Err(AppError::Validation(format!(
                "Feature matrix has {} rows but {} labels were given",
                features.nrows(),
                labels.len()
            )));
        }

        Ok(Self {
            schema,
            features,
            labels,
        })
    }

    /// Build a table from observations whose values follow the schema order
    pub fn from_observations(schema: FeatureSchema, observations: &[Observation]) -> Result<Self> {
        let n_features = schema.len();
        let mut features = Array2::zeros((observations.len(), n_features));
        let mut labels = Array1::zeros(observations.len());

        for (i, obs) in observations.iter().enumerate() {
            if obs.values.len() != n_features {
                return Err(AppError::Validation(format!(
                    "Observation {} has {} values, expected {}",
                    i,
                    obs.values.len(),
                    n_features
                )));
            }
            for (j, &val) in obs.values.iter().enumerate() {
                features[[i, j]] = val;
            }
            labels[i] = obs.label;
        }

        Self::new(schema, features, labels)
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Number of rows labeled as failure
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == FAILURE_LABEL).count()
    }

    /// Fraction of rows labeled as failure (0 for an empty table)
    pub fn positive_fraction(&self) -> f64 {
        if self.n_samples() == 0 {
            return 0.0;
        }
        self.positive_count() as f64 / self.n_samples() as f64
    }

    /// Members per label, ordered by label
    pub fn class_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for &label in self.labels.iter() {
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    /// Copy the given rows into a new table
    pub fn select(&self, indices: &[usize]) -> LabeledTable {
        LabeledTable {
            schema: self.schema.clone(),
            features: self.features.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }
}

/// Confusion counts for the failure class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

/// Model evaluation metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Precision
    pub precision: f64,

    /// Recall
    pub recall: f64,

    /// F1 score
    pub f1_score: f64,

    /// Confusion counts
    pub confusion: ConfusionCounts,

    /// Number of true failures in the evaluated set
    pub support: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            confusion: ConfusionCounts::default(),
            support: 0,
        }
    }

    /// Binary metrics with the failure label as the positive class.
    ///
    /// Every ratio whose denominator is zero evaluates to 0.
    pub fn from_predictions(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(AppError::Validation(format!(
                "Got {} true labels but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }

        let mut confusion = ConfusionCounts::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == FAILURE_LABEL, p == FAILURE_LABEL) {
                (true, true) => confusion.true_positives += 1,
                (false, true) => confusion.false_positives += 1,
                (false, false) => confusion.true_negatives += 1,
                (true, false) => confusion.false_negatives += 1,
            }
        }

        let tp = confusion.true_positives as f64;
        let precision = ratio(tp, tp + confusion.false_positives as f64);
        let recall = ratio(tp, tp + confusion.false_negatives as f64);
        let f1_score = ratio(2.0 * precision * recall, precision + recall);
        let accuracy = ratio(
            (confusion.true_positives + confusion.true_negatives) as f64,
            confusion.total() as f64,
        );

        Ok(Self {
            accuracy,
            precision,
            recall,
            f1_score,
            confusion,
            support: confusion.true_positives + confusion.false_negatives,
        })
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Tree depth
    pub depth: usize,

    /// Number of leaves
    pub n_leaves: usize,

    /// Weight applied to each label during fitting
    pub class_weights: BTreeMap<usize, f64>,

    /// Impurity-based importance per feature name
    pub feature_importance: BTreeMap<String, f64>,

    /// Hyperparameters
    pub hyperparameters: BTreeMap<String, String>,
}

impl ModelMetadata {
    pub fn new(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
            trained_at: chrono::Utc::now(),
            n_training_samples: 0,
            n_features: 0,
            depth: 0,
            n_leaves: 0,
            class_weights: BTreeMap::new(),
            feature_importance: BTreeMap::new(),
            hyperparameters: BTreeMap::new(),
        }
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// CART decision tree
    DecisionTree,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::DecisionTree => write!(f, "Decision Tree"),
        }
    }
}

/// Result of a single-row prediction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted label
    pub label: usize,

    /// Human-readable status for the label
    pub status: String,
}

impl Prediction {
    pub fn is_failure(&self) -> bool {
        self.label == FAILURE_LABEL
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.status)
    }
}
