use serde::{Deserialize, Serialize};

/// Label of a normal observation
pub const NORMAL_LABEL: usize = 0;

/// Label of an observation that needs replacement or maintenance
pub const FAILURE_LABEL: usize = 1;

/// One row of sensor/usage measurements plus its binary label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Measurement timestamp, only present for file-backed data
    pub timestamp: Option<String>,

    /// Feature values in schema order
    pub values: Vec<f64>,

    /// 1 = failure, 0 = normal
    pub label: usize,
}

impl Observation {
    pub fn new(values: Vec<f64>, label: usize) -> Self {
        Self {
            timestamp: None,
            values,
            label,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.label == FAILURE_LABEL
    }
}

/// Human-readable strings a prediction maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabels {
    pub normal: String,
    pub failure: String,
}

impl StatusLabels {
    pub fn new(normal: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            normal: normal.into(),
            failure: failure.into(),
        }
    }

    pub fn for_label(&self, label: usize) -> &str {
        if label == FAILURE_LABEL {
            &self.failure
        } else {
            &self.normal
        }
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self::new("Ok/Normal", "Failure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_creation() {
        let obs = Observation::new(vec![1.0, 2.0], FAILURE_LABEL).with_timestamp("2024-01-01 00:00");

        assert!(obs.is_failure());
        assert_eq!(obs.timestamp.as_deref(), Some("2024-01-01 00:00"));
    }

    #[test]
    fn test_status_labels() {
        let labels = StatusLabels::new("Ok/Normal", "Maintenance Required");

        assert_eq!(labels.for_label(NORMAL_LABEL), "Ok/Normal");
        assert_eq!(labels.for_label(FAILURE_LABEL), "Maintenance Required");
    }
}
