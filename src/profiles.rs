//! Built-in pipeline profiles.
//!
//! A profile bundles everything that differs between predictors: the feature
//! schema, where the data comes from, the status strings and the example
//! inputs run after training.

use crate::config::{BatteryConfig, TurbineConfig};
use crate::data::{DataSource, LabelRule, SyntheticSpec, Threshold, UniformColumn};
use crate::error::Result;
use crate::models::{FeatureRecord, FeatureSchema, StatusLabels};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status reported for a normal prediction
pub const NORMAL_STATUS: &str = "Ok/Normal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProfileKind {
    /// Battery replacement from usage history
    #[default]
    Battery,

    /// Turbine motor maintenance from operating readings
    Turbine,
}

/// How one feature is echoed next to a prediction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub name: String,

    /// Digits after the decimal point
    pub precision: usize,
}

impl DisplayField {
    pub fn new(name: impl Into<String>, precision: usize) -> Self {
        Self {
            name: name.into(),
            precision,
        }
    }
}

/// One hand-written input run through a trained pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleInput {
    pub record: FeatureRecord,
}

/// Everything a pipeline run needs to know about its domain
#[derive(Debug, Clone)]
pub struct PipelineProfile {
    pub kind: ProfileKind,

    /// Feature columns in training order
    pub schema: FeatureSchema,

    /// Fields used when echoing example inputs, parallel to `schema`
    pub display_fields: Vec<DisplayField>,

    pub source: DataSource,

    pub status: StatusLabels,

    /// Heading of the evaluation block
    pub report_title: String,

    /// Heading of the example prediction block
    pub examples_title: String,

    /// Name printed for the positive label count of synthetic data
    pub positive_label_name: String,

    pub examples: Vec<ExampleInput>,
}

impl PipelineProfile {
    /// Battery replacement: five usage features, CSV source
    pub fn battery(config: &BatteryConfig) -> Result<Self> {
        let schema = FeatureSchema::new([
            "age_days",
            "cycles",
            "avg_dod",
            "avg_temp",
            "cumulative_ah",
        ])?;

        let examples = [
            [350.0, 70.0, 0.35, 30.0, 7000.0],
            [50.0, 10.0, 0.20, 25.0, 1000.0],
        ]
        .iter()
        .map(|values| {
            schema
                .record_from_values(values)
                .map(|record| ExampleInput { record })
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            kind: ProfileKind::Battery,
            display_fields: vec![
                DisplayField::new("Age", 0),
                DisplayField::new("Cycles", 0),
                DisplayField::new("Avg_DoD", 2),
                DisplayField::new("Avg_Temp", 0),
                DisplayField::new("Cum_Ah", 0),
            ],
            schema,
            source: DataSource::Files {
                primary: config.primary_path(),
                problems: config.problems_path(),
            },
            status: StatusLabels::new(NORMAL_STATUS, "Needs to be Replaced"),
            report_title: "Final Decision Tree Model Evaluation (All Descriptive Features)"
                .to_string(),
            examples_title: "Example Prediction".to_string(),
            positive_label_name: "Needs Replacement".to_string(),
            examples,
        })
    }

    /// Turbine maintenance: three operating readings, synthetic source
    pub fn turbine(config: &TurbineConfig, seed: u64) -> Result<Self> {
        let schema = FeatureSchema::new(["Speed", "Output_Voltage", "Temperature"])?;

        let spec = SyntheticSpec {
            rows: config.rows,
            seed,
            columns: vec![
                // RPM
                UniformColumn::new("Speed", 8000.0, 16000.0),
                // MW
                UniformColumn::new("Output_Voltage", 50.0, 100.0),
                // Inlet temperature, °C
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
            label_rule: config.label_rule,
        };

        let examples = [[12000.0, 80.0, 950.0], [15800.0, 95.0, 1180.0]]
            .iter()
            .map(|values| {
                schema
                    .record_from_values(values)
                    .map(|record| ExampleInput { record })
            })
            .collect::<Result<Vec<_>>>()?;

        let report_title = match config.label_rule {
            LabelRule::IndependentDraws => "Decision Tree Model Evaluation (Placeholder Data)",
            LabelRule::GeneratedColumns => "Decision Tree Model Evaluation (Thresholded Data)",
        };

        Ok(Self {
            kind: ProfileKind::Turbine,
            display_fields: vec![
                DisplayField::new("Speed", 0),
                DisplayField::new("Voltage", 0),
                DisplayField::new("Temp", 0),
            ],
            schema,
            source: DataSource::Synthetic(spec),
            status: StatusLabels::new(NORMAL_STATUS, "Maintenance Required"),
            report_title: report_title.to_string(),
            examples_title: "Example Predictions".to_string(),
            positive_label_name: "Maintenance Required".to_string(),
            examples,
        })
    }

    /// Echo an input as `Name=value` pairs in schema order
    pub fn describe_input(&self, record: &FeatureRecord) -> String {
        self.schema
            .names()
            .iter()
            .zip(&self.display_fields)
            .map(|(name, field)| match record.get(name) {
                Some(value) => format!("{}={:.*}", field.name, field.precision, value),
                None => format!("{}=?", field.name),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
