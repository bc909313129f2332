use crate::error::{AppError, Result};
use crate::ml::models::{LabeledTable, ModelMetadata, ModelMetrics, ModelType};
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, ArrayView2};
use std::collections::BTreeMap;

/// Trait for classifiers
pub trait Classifier {
    /// Train the classifier, returning metrics on the training rows
    fn train(&mut self, dataset: &LabeledTable) -> Result<ModelMetrics>;

    /// Predict class labels
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<usize>>;

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// Class weights inversely proportional to label frequency:
/// `n_samples / (n_classes * count)`.
pub fn balanced_class_weights(labels: &[usize]) -> BTreeMap<usize, f64> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let n_samples = labels.len() as f64;
    let n_classes = counts.len() as f64;

    counts
        .into_iter()
        .map(|(label, count)| (label, n_samples / (n_classes * count as f64)))
        .collect()
}

/// Gini decision tree fitted with balanced class weights.
///
/// The tree is grown without a depth limit, so it can isolate single rows.
/// That overfits small or imbalanced tables and is accepted as-is.
pub struct DecisionTreeClassifier {
    /// Model metadata
    metadata: ModelMetadata,

    /// Trained model
    model: Option<DecisionTree<f64, usize>>,

    /// Optional depth limit (None grows until leaves are pure)
    max_depth: Option<usize>,

    /// Minimum impurity decrease for a split
    min_impurity_decrease: f64,
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self {
            metadata: ModelMetadata::new("Decision Tree", ModelType::DecisionTree),
            model: None,
            max_depth: None,
            min_impurity_decrease: 1e-7,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of leaves of the fitted tree
    pub fn num_leaves(&self) -> usize {
        self.model.as_ref().map(|m| m.num_leaves()).unwrap_or(0)
    }

    /// Depth of the fitted tree
    pub fn depth(&self) -> usize {
        self.model.as_ref().map(|m| m.max_depth()).unwrap_or(0)
    }

    fn fitted(&self) -> Result<&DecisionTree<f64, usize>> {
        self.model
            .as_ref()
            .ok_or_else(|| AppError::Internal("Model not trained".to_string()))
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for DecisionTreeClassifier {
    fn train(&mut self, dataset: &LabeledTable) -> Result<ModelMetrics> {
        if dataset.n_samples() == 0 {
            return Err(AppError::Training(
                "Cannot train on an empty dataset".to_string(),
            ));
        }

        let labels: Vec<usize> = dataset.labels.to_vec();
        let class_weights = balanced_class_weights(&labels);
        let sample_weights: Array1<f32> = labels
            .iter()
            .map(|label| class_weights.get(label).copied().unwrap_or(1.0) as f32)
            .collect();

        // A leaf must hold at least one row of the lightest class.
        let min_leaf_weight = sample_weights.iter().copied().fold(f32::INFINITY, f32::min);

        let train = Dataset::new(dataset.features.clone(), dataset.labels.clone())
            .with_weights(sample_weights);

        let model = DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(self.max_depth)
            .min_weight_split(2.0 * min_leaf_weight)
            .min_weight_leaf(min_leaf_weight)
            .min_impurity_decrease(self.min_impurity_decrease)
            .fit(&train)
            .map_err(|e: linfa::error::Error| {
                AppError::Training(format!("Failed to train decision tree: {}", e))
            })?;

        let feature_importance = dataset
            .schema
            .names()
            .iter()
            .cloned()
            .zip(model.feature_importance())
            .collect();

        self.metadata.depth = model.max_depth();
        self.metadata.n_leaves = model.num_leaves();
        self.metadata.feature_importance = feature_importance;
        self.model = Some(model);

        self.metadata.n_training_samples = dataset.n_samples();
        self.metadata.n_features = dataset.n_features();
        self.metadata.trained_at = chrono::Utc::now();
        self.metadata.class_weights = class_weights;
        self.metadata.hyperparameters = [
            ("split_quality".to_string(), "gini".to_string()),
            (
                "max_depth".to_string(),
                self.max_depth
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
            ("class_weight".to_string(), "balanced".to_string()),
        ]
        .into_iter()
        .collect();

        tracing::info!(
            depth = self.metadata.depth,
            leaves = self.metadata.n_leaves,
            samples = self.metadata.n_training_samples,
            "Decision tree trained"
        );

        let predictions = self.predict(dataset.features.view())?;
        ModelMetrics::from_predictions(&labels, &predictions)
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        let model = self.fitted()?;

        if features.ncols() != self.metadata.n_features {
            return Err(AppError::Validation(format!(
                "Model expects {} features, got {}",
                self.metadata.n_features,
                features.ncols()
            )));
        }

        let predictions: Array1<usize> = linfa::traits::Predict::predict(model, &features);
        Ok(predictions.to_vec())
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn model_type(&self) -> ModelType {
        ModelType::DecisionTree
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}
