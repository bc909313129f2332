//! File-backed acquisition: a measurement table labeled by a second table of
//! problem timestamps.

use crate::error::{AppError, Result};
use crate::ml::models::LabeledTable;
use crate::models::{FeatureSchema, Observation, FAILURE_LABEL, NORMAL_LABEL};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Name of the column that joins measurements to problem rows
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Load the primary table and label every row whose timestamp appears in
/// the problem table.
///
/// Both files are opened before any row is read, so a missing problem file
/// fails the load without partial processing.
pub fn load_labeled(
    primary: &Path,
    problems: &Path,
    schema: &FeatureSchema,
) -> Result<LabeledTable> {
    let primary_reader = open_csv(primary)?;
    let problem_reader = open_csv(problems)?;

    let problem_timestamps = read_timestamps(problem_reader, problems)?;
    debug!(
        path = %problems.display(),
        count = problem_timestamps.len(),
        "Loaded problem timestamps"
    );

    let observations = read_observations(primary_reader, primary, schema)?;
    let observations: Vec<Observation> = observations
        .into_iter()
        .map(|mut obs| {
            let is_problem = obs
                .timestamp
                .as_deref()
                .map(|ts| problem_timestamps.contains(ts))
                .unwrap_or(false);
            obs.label = if is_problem { FAILURE_LABEL } else { NORMAL_LABEL };
            obs
        })
        .collect();

    let table = LabeledTable::from_observations(schema.clone(), &observations)?;
    info!(
        path = %primary.display(),
        rows = table.n_samples(),
        failures = table.positive_count(),
        "Loaded labeled measurement table"
    );

    Ok(table)
}

/// Open a headed CSV file, mapping a missing or unreadable file to
/// `DataUnavailable`
pub fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path).map_err(|source| AppError::DataUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

/// Collect the timestamp column of a table into a membership set
pub fn read_timestamps<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
) -> Result<HashSet<String>> {
    let ts_idx = column_index(reader.headers()?, TIMESTAMP_COLUMN, path)?;

    let mut timestamps = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(ts) = record.get(ts_idx) {
            timestamps.insert(ts.to_string());
        }
    }

    Ok(timestamps)
}

/// Read timestamp and schema columns of every row; labels are left at 0
pub fn read_observations<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    path: &Path,
    schema: &FeatureSchema,
) -> Result<Vec<Observation>> {
    let headers = reader.headers()?.clone();
    let ts_idx = column_index(&headers, TIMESTAMP_COLUMN, path)?;
    let feature_idx: Vec<usize> = schema
        .names()
        .iter()
        .map(|name| column_index(&headers, name, path))
        .collect::<Result<_>>()?;

    let mut observations = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;

        let values = feature_idx
            .iter()
            .zip(schema.names())
            .map(|(&idx, name)| {
                let cell = record.get(idx).unwrap_or("");
                cell.parse::<f64>().map_err(|_| {
                    AppError::Validation(format!(
                        "{}: row {}: column '{}' is not numeric: '{}'",
                        path.display(),
                        row + 1,
                        name,
                        cell
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let timestamp = record.get(ts_idx).unwrap_or("").to_string();
        observations.push(Observation::new(values, NORMAL_LABEL).with_timestamp(timestamp));
    }

    Ok(observations)
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        AppError::Validation(format!(
            "{}: missing column '{}'",
            path.display(),
            name
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["age_days", "cycles"]).unwrap()
    }

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_labels_follow_problem_timestamps() {
        let dir = TempDir::new().unwrap();
        let primary = write_file(
            &dir,
            "primary.csv",
            "timestamp,cycles,age_days,extra\nt1,10,100,x\nt2,20,200,y\nt3,30,300,z\n",
        );
        let problems = write_file(&dir, "problems.csv", "timestamp,note\nt2,bad\n");

        let table = load_labeled(&primary, &problems, &schema()).unwrap();

        assert_eq!(table.n_samples(), 3);
        assert_eq!(table.labels.to_vec(), vec![0, 1, 0]);
        // Columns follow the schema, not the file
        assert_eq!(table.features[[1, 0]], 200.0);
        assert_eq!(table.features[[1, 1]], 20.0);
    }

    #[test]
    fn test_missing_file_is_data_unavailable() {
        let dir = TempDir::new().unwrap();
        let primary = write_file(&dir, "primary.csv", "timestamp,age_days,cycles\nt1,1,2\n");
        let problems = dir.path().join("absent.csv");

        let err = load_labeled(&primary, &problems, &schema()).unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let primary = write_file(&dir, "primary.csv", "timestamp,age_days\nt1,1\n");
        let problems = write_file(&dir, "problems.csv", "timestamp\n");

        let err = load_labeled(&primary, &problems, &schema()).unwrap_err();
        assert!(err.to_string().contains("cycles"));
    }

    #[test]
    fn test_non_numeric_cell_is_reported() {
        let dir = TempDir::new().unwrap();
        let primary = write_file(&dir, "primary.csv", "timestamp,age_days,cycles\nt1,abc,2\n");
        let problems = write_file(&dir, "problems.csv", "timestamp\n");

        let err = load_labeled(&primary, &problems, &schema()).unwrap_err();
        assert!(err.to_string().contains("age_days"));
        assert!(err.to_string().contains("row 1"));
    }
}
