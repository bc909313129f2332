use crate::error::Result;
use crate::ml::classifier::{Classifier, DecisionTreeClassifier};
use crate::ml::features::StandardScaler;
use crate::ml::models::{LabeledTable, ModelMetadata, ModelMetrics, Prediction};
use crate::ml::split::split_table;
use crate::models::{FeatureRecord, FeatureSchema, StatusLabels};
use crate::profiles::{ExampleInput, PipelineProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Split and model settings shared by every profile
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Seed for the stratified split
    pub seed: u64,

    /// Optional tree depth limit
    pub max_depth: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            max_depth: None,
        }
    }
}

/// Size and label count of an acquired dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub positives: usize,
    pub positive_label_name: String,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset Size: {} records", self.records)?;
        write!(
            f,
            "{} (1) Count: {}",
            self.positive_label_name, self.positives
        )
    }
}

/// Held-out evaluation of a trained pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub title: String,

    /// Metrics on the test partition
    pub metrics: ModelMetrics,

    /// Metrics on the training partition
    pub training_metrics: ModelMetrics,

    pub n_train: usize,
    pub n_test: usize,
    pub train_positive_fraction: f64,
    pub test_positive_fraction: f64,

    pub model: ModelMetadata,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.title)?;
        writeln!(f, "  F1 Score: {:.4}", self.metrics.f1_score)?;
        writeln!(f, "  Accuracy: {:.4}", self.metrics.accuracy)?;
        writeln!(f, "  Precision: {:.4}", self.metrics.precision)?;
        write!(f, "  Recall: {:.4}", self.metrics.recall)
    }
}

/// Schema, fitted scaler and fitted tree of one run.
///
/// This is the only state single-row prediction needs.
pub struct TrainedPipeline {
    schema: FeatureSchema,
    scaler: StandardScaler,
    classifier: DecisionTreeClassifier,
    status: StatusLabels,
    report: EvaluationReport,
}

impl TrainedPipeline {
    /// Split, scale, fit and evaluate.
    ///
    /// The scaler only ever sees the training partition.
    pub fn train(
        table: &LabeledTable,
        status: StatusLabels,
        title: impl Into<String>,
        options: &PipelineOptions,
    ) -> Result<Self> {
        let (train, test, _) = split_table(table, options.test_size, options.seed)?;
        debug!(
            n_train = train.n_samples(),
            n_test = test.n_samples(),
            "Split dataset"
        );

        let scaler = StandardScaler::fit(&table.schema, train.features.view())?;
        let train_scaled = LabeledTable::new(
            train.schema.clone(),
            scaler.transform(train.features.view())?,
            train.labels.clone(),
        )?;
        let test_scaled = scaler.transform(test.features.view())?;

        let mut classifier = DecisionTreeClassifier::new().with_max_depth(options.max_depth);
        let training_metrics = classifier.train(&train_scaled)?;

        let predictions = classifier.predict(test_scaled.view())?;
        let metrics = ModelMetrics::from_predictions(&test.labels.to_vec(), &predictions)?;

        info!(
            f1 = metrics.f1_score,
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            "Evaluated on held-out partition"
        );

        let report = EvaluationReport {
            title: title.into(),
            metrics,
            training_metrics,
            n_train: train.n_samples(),
            n_test: test.n_samples(),
            train_positive_fraction: train.positive_fraction(),
            test_positive_fraction: test.positive_fraction(),
            model: classifier.metadata().clone(),
        };

        Ok(Self {
            schema: table.schema.clone(),
            scaler,
            classifier,
            status,
            report,
        })
    }

    /// Predict the status of one named input record
    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction> {
        let row = self.schema.row_from_record(record)?;
        self.predict_row(&row)
    }

    /// Predict from values given positionally in training column order.
    ///
    /// Only the count is checked; values in the wrong order are silently
    /// misread. Prefer [`TrainedPipeline::predict`].
    pub fn predict_values(&self, values: &[f64]) -> Result<Prediction> {
        let record = self.schema.record_from_values(values)?;
        self.predict(&record)
    }

    fn predict_row(&self, row: &[f64]) -> Result<Prediction> {
        let scaled = self.scaler.transform_row(row)?;
        let label = self
            .classifier
            .predict(scaled.view())?
            .first()
            .copied()
            .unwrap_or_default();

        Ok(Prediction {
            label,
            status: self.status.for_label(label).to_string(),
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &DecisionTreeClassifier {
        &self.classifier
    }

    pub fn report(&self) -> &EvaluationReport {
        &self.report
    }
}

/// Outcome of a full profile run
pub struct PipelineRun {
    /// Present for synthetic sources
    pub summary: Option<DatasetSummary>,
    pub trained: TrainedPipeline,
    pub examples: Vec<(ExampleInput, Prediction)>,
}

/// Runs a profile end to end: acquire, label, split, scale, fit, evaluate,
/// then predict the profile's example inputs.
pub struct PipelineRunner {
    profile: PipelineProfile,
    options: PipelineOptions,
}

impl PipelineRunner {
    pub fn new(profile: PipelineProfile, options: PipelineOptions) -> Self {
        Self { profile, options }
    }

    pub fn profile(&self) -> &PipelineProfile {
        &self.profile
    }

    /// Acquire the profile's labeled table
    pub fn acquire(&self) -> Result<LabeledTable> {
        self.profile.source.load(&self.profile.schema)
    }

    pub fn run(&self) -> Result<PipelineRun> {
        info!(profile = %self.profile.kind, "Running pipeline");

        let table = self.acquire()?;
        let summary = self.profile.source.is_synthetic().then(|| DatasetSummary {
            records: table.n_samples(),
            positives: table.positive_count(),
            positive_label_name: self.profile.positive_label_name.clone(),
        });

        let trained = TrainedPipeline::train(
            &table,
            self.profile.status.clone(),
            self.profile.report_title.clone(),
            &self.options,
        )?;

        let examples = self
            .profile
            .examples
            .iter()
            .map(|example| {
                trained
                    .predict(&example.record)
                    .map(|prediction| (example.clone(), prediction))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PipelineRun {
            summary,
            trained,
            examples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, FAILURE_LABEL, NORMAL_LABEL};

    /// Failure iff `load > 0.7`; `ambient` carries no signal and stays low
    fn threshold_table() -> LabeledTable {
        let schema = FeatureSchema::new(["load", "ambient"]).unwrap();
        let observations: Vec<Observation> = (0..200)
            .map(|i| {
                let load = i as f64 / 200.0;
                let ambient = (i % 7) as f64 / 100.0;
                let label = if load > 0.7 { FAILURE_LABEL } else { NORMAL_LABEL };
                Observation::new(vec![load, ambient], label)
            })
            .collect();
        LabeledTable::from_observations(schema, &observations).unwrap()
    }

    fn trained() -> TrainedPipeline {
        TrainedPipeline::train(
            &threshold_table(),
            StatusLabels::new("Ok/Normal", "Maintenance Required"),
            "Test",
            &PipelineOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_train_and_evaluate() {
        let pipeline = trained();
        let report = pipeline.report();

        assert_eq!(report.n_test, 40);
        assert_eq!(report.n_train, 160);
        assert!(report.metrics.accuracy > 0.9);
        assert!(report.metrics.f1_score > 0.8);
    }

    #[test]
    fn test_scaler_fitted_on_training_rows_only() {
        let pipeline = trained();
        assert_eq!(pipeline.scaler().n_samples_seen(), 160);
    }

    #[test]
    fn test_predict_named_record() {
        let pipeline = trained();

        let high = FeatureRecord::new().with("ambient", 0.01).with("load", 0.95);
        let low = FeatureRecord::new().with("load", 0.1).with("ambient", 0.01);

        assert_eq!(pipeline.predict(&high).unwrap().status, "Maintenance Required");
        assert_eq!(pipeline.predict(&low).unwrap().status, "Ok/Normal");
    }

    #[test]
    fn test_report_rendering() {
        let rendered = trained().report().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "--- Test ---");
        assert!(lines[1].starts_with("  F1 Score: "));
        assert!(lines[4].starts_with("  Recall: "));
        // four decimals
        assert_eq!(lines[2].trim_start_matches("  Accuracy: ").len(), 6);
    }

    #[test]
    fn test_dataset_summary_rendering() {
        let summary = DatasetSummary {
            records: 1000,
            positives: 150,
            positive_label_name: "Maintenance Required".to_string(),
        };

        assert_eq!(
            summary.to_string(),
            "Dataset Size: 1000 records\nMaintenance Required (1) Count: 150"
        );
    }
}
