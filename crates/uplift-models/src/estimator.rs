//! Estimator traits shared by base learners and uplift strategies

use crate::matrix::Matrix;
use uplift_core::{Error, FeatureRow, Result};

/// Binary classifier over encoded feature matrices
pub trait BinaryClassifier: Send + Sync {
    /// Fit on `x` with 0/1 labels `y`
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()>;

    /// Probability of the positive class per row
    fn predict_proba(&self, x: &Matrix) -> Result<Vec<f64>>;

    /// Get the learner name
    fn name(&self) -> &str;
}

/// Anything that scores raw feature rows with an uplift estimate.
///
/// Implementations must be safe to call concurrently; the serving runtime
/// shares one instance across all in-flight requests.
pub trait Estimator: Send + Sync {
    /// One uplift score per row
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>>;

    /// Get the estimator name
    fn name(&self) -> &str;
}

/// Reject empty training sets, length mismatches, and non-binary labels
pub(crate) fn check_binary_target(x: &Matrix, y: &[f64]) -> Result<()> {
    if x.is_empty() {
        return Err(Error::model("cannot fit on an empty dataset"));
    }
    if x.rows() != y.len() {
        return Err(Error::shape(format!(
            "{} rows but {} labels",
            x.rows(),
            y.len()
        )));
    }
    if let Some(bad) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
        return Err(Error::model(format!("labels must be 0 or 1, found {}", bad)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_binary_target() {
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        assert!(check_binary_target(&x, &[0.0, 1.0]).is_ok());
        assert!(check_binary_target(&x, &[0.0]).is_err());
        assert!(check_binary_target(&x, &[0.0, 2.0]).is_err());
        assert!(check_binary_target(&Matrix::empty(1), &[]).is_err());
    }
}
