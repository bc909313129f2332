/// Machine Learning module for equipment failure prediction
///
/// This module provides:
/// - Standardization of feature columns
/// - Stratified train/test splitting
/// - A class-weighted decision tree classifier
/// - Binary evaluation metrics
/// - The end-to-end training pipeline and single-row prediction

pub mod classifier;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod split;

pub use classifier::{balanced_class_weights, Classifier, DecisionTreeClassifier};
pub use features::StandardScaler;
pub use models::{
    ConfusionCounts, LabeledTable, ModelMetadata, ModelMetrics, ModelType, Prediction,
};
pub use pipeline::{
    DatasetSummary, EvaluationReport, PipelineOptions, PipelineRun, PipelineRunner,
    TrainedPipeline,
};
pub use split::{split_table, stratified_split, SplitIndices};
