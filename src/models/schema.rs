use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Ordered list of feature names a model is trained on.
///
/// The order defines the column layout of every matrix handed to the scaler
/// and the classifier, and the layout of the positional row built at
/// prediction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Create a schema, rejecting empty, blank or duplicate names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(AppError::Validation(
                "Feature schema must contain at least one feature".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(AppError::Validation(
                    "Feature names must not be blank".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Duplicate feature '{}' in schema",
                    name
                )));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column index of a feature
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Translate a named record into a row in schema order.
    ///
    /// Every schema feature must be present and the record must not carry
    /// names the schema does not know.
    pub fn row_from_record(&self, record: &FeatureRecord) -> Result<Vec<f64>> {
        if let Some(unknown) = record.names().find(|name| self.position(name).is_none()) {
            return Err(AppError::Validation(format!(
                "Unknown feature '{}' (expected one of: {})",
                unknown,
                self.names.join(", ")
            )));
        }

        self.names
            .iter()
            .map(|name| {
                record.get(name).ok_or_else(|| {
                    AppError::Validation(format!("Missing feature '{}'", name))
                })
            })
            .collect()
    }

    /// Attach schema names to positional values
    pub fn record_from_values(&self, values: &[f64]) -> Result<FeatureRecord> {
        if values.len() != self.names.len() {
            return Err(AppError::Validation(format!(
                "Expected {} feature values ({}), got {}",
                self.names.len(),
                self.names.join(", "),
                values.len()
            )));
        }

        Ok(self
            .names
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect())
    }
}

/// One raw input row keyed by feature name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    values: BTreeMap<String, f64>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for FeatureRecord {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        let mut record = FeatureRecord::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["Speed", "Output_Voltage", "Temperature"]).unwrap()
    }

    #[test]
    fn test_schema_rejects_duplicates_and_blanks() {
        assert!(FeatureSchema::new(Vec::<String>::new()).is_err());
        assert!(FeatureSchema::new(["a", "a"]).is_err());
        assert!(FeatureSchema::new(["a", " "]).is_err());
    }

    #[test]
    fn test_row_follows_schema_order() {
        let record = FeatureRecord::new()
            .with("Temperature", 950.0)
            .with("Speed", 12000.0)
            .with("Output_Voltage", 80.0);

        let row = schema().row_from_record(&record).unwrap();
        assert_eq!(row, vec![12000.0, 80.0, 950.0]);
    }

    #[test]
    fn test_missing_and_unknown_features() {
        let missing = FeatureRecord::new().with("Speed", 1.0).with("Temperature", 2.0);
        let err = schema().row_from_record(&missing).unwrap_err();
        assert!(err.to_string().contains("Output_Voltage"));

        let unknown = FeatureRecord::new()
            .with("Speed", 1.0)
            .with("Output_Voltage", 2.0)
            .with("Temperature", 3.0)
            .with("Pressure", 4.0);
        let err = schema().row_from_record(&unknown).unwrap_err();
        assert!(err.to_string().contains("Pressure"));
    }

    #[test]
    fn test_record_from_values_checks_count() {
        let schema = schema();
        let record = schema.record_from_values(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(record.get("Output_Voltage"), Some(2.0));

        assert!(schema.record_from_values(&[1.0, 2.0]).is_err());
    }
}
