use crate::error::{AppError, Result};
use crate::models::FeatureSchema;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature standardization to zero mean and unit variance.
///
/// Statistics are learned once with [`StandardScaler::fit`] and then applied
/// as a pure affine map. A column with zero variance is centered but not
/// divided (its scale is 1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Schema the statistics were fitted on
    schema: FeatureSchema,

    /// Per-feature mean
    mean: Array1<f64>,

    /// Per-feature population standard deviation (ddof = 0)
    std_dev: Array1<f64>,

    /// Divisor applied per feature
    scale: Array1<f64>,

    /// Number of rows the scaler was fitted on
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Learn mean and standard deviation of every column
    pub fn fit(schema: &FeatureSchema, features: ArrayView2<'_, f64>) -> Result<Self> {
        if features.ncols() != schema.len() {
            return Err(AppError::Validation(format!(
                "Cannot fit scaler: matrix has {} columns, schema has {}",
                features.ncols(),
                schema.len()
            )));
        }

        let mean = features.mean_axis(Axis(0)).ok_or_else(|| {
            AppError::Validation("Cannot fit scaler on an empty feature matrix".to_string())
        })?;
        let std_dev = features.std_axis(Axis(0), 0.0);
        let scale = std_dev.mapv(|s| if s.is_finite() && s > 0.0 { s } else { 1.0 });

        for (name, &s) in schema.names().iter().zip(std_dev.iter()) {
            if s == 0.0 {
                tracing::debug!(feature = %name, "Zero-variance feature left unscaled");
            }
        }

        Ok(Self {
            schema: schema.clone(),
            mean,
            std_dev,
            scale,
            n_samples_seen: features.nrows(),
        })
    }

    /// Apply `(x - mean) / scale` column-wise
    pub fn transform(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.mean.len() {
            return Err(AppError::Validation(format!(
                "Scaler was fitted on {} features ({}), got {}",
                self.mean.len(),
                self.schema.names().join(", "),
                features.ncols()
            )));
        }

        Ok((&features - &self.mean) / &self.scale)
    }

    /// Scale a single row given in schema order
    pub fn transform_row(&self, row: &[f64]) -> Result<Array2<f64>> {
        let row = Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| AppError::Internal(format!("Failed to create feature array: {}", e)))?;
        self.transform(row.view())
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std_dev(&self) -> &Array1<f64> {
        &self.std_dev
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(["age_days", "cycles"]).unwrap()
    }

    #[test]
    fn test_fit_statistics() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let scaler = StandardScaler::fit(&schema(), x.view()).unwrap();

        assert_eq!(scaler.mean(), &array![3.0, 10.0]);
        assert!((scaler.std_dev()[0] - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(scaler.n_samples_seen(), 3);
    }

    #[test]
    fn test_scaled_columns_have_zero_mean_unit_variance() {
        let x = array![
            [350.0, 70.0],
            [50.0, 10.0],
            [120.0, 33.0],
            [280.0, 41.0],
            [10.0, 2.0]
        ];
        let scaler = StandardScaler::fit(&schema(), x.view()).unwrap();
        let scaled = scaler.transform(x.view()).unwrap();

        for column in scaled.axis_iter(Axis(1)) {
            let mean = column.mean().unwrap();
            let std = column.std(0.0);
            assert!(mean.abs() < 1e-12, "mean {}", mean);
            assert!((std - 1.0).abs() < 1e-12, "std {}", std);
        }
    }

    #[test]
    fn test_zero_variance_column_is_only_centered() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0]];
        let scaler = StandardScaler::fit(&schema(), x.view()).unwrap();

        assert_eq!(scaler.scale()[1], 1.0);

        let scaled = scaler.transform_row(&[2.0, 9.0]).unwrap();
        assert_eq!(scaled[[0, 0]], 0.0);
        assert_eq!(scaled[[0, 1]], 2.0);
    }

    #[test]
    fn test_transform_uses_stored_statistics() {
        let train = array![[0.0, 0.0], [2.0, 4.0]];
        let scaler = StandardScaler::fit(&schema(), train.view()).unwrap();

        let other = array![[100.0, 100.0], [200.0, 200.0]];
        let scaled = scaler.transform(other.view()).unwrap();

        assert_eq!(scaled[[0, 0]], 99.0);
        assert_eq!(scaled[[0, 1]], 49.0);
        assert_eq!(scaler.mean(), &array![1.0, 2.0]);
    }

    #[test]
    fn test_rejects_wrong_width_and_empty_input() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let scaler = StandardScaler::fit(&schema(), x.view()).unwrap();
        assert!(scaler.transform_row(&[1.0, 2.0, 3.0]).is_err());

        let empty = Array2::<f64>::zeros((0, 2));
        assert!(StandardScaler::fit(&schema(), empty.view()).is_err());
    }
}
