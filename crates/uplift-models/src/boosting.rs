//! Gradient boosted trees for binary classification (logistic loss)

use crate::estimator::{check_binary_target, BinaryClassifier};
use crate::matrix::Matrix;
use crate::tree::{BinMapper, RegressionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uplift_core::{Error, Result};

/// Boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    /// Number of trees
    pub iterations: usize,

    /// Maximum tree depth
    pub depth: usize,

    /// Shrinkage applied to every tree
    pub learning_rate: f64,

    /// L2 regularization on leaf values
    pub l2_leaf_reg: f64,

    /// Minimum hessian sum per child
    pub min_child_weight: f64,

    /// Row sampling fraction per tree
    pub subsample: f64,

    /// Histogram resolution
    pub max_bins: usize,

    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            depth: 4,
            learning_rate: 0.1,
            l2_leaf_reg: 3.0,
            min_child_weight: 1.0,
            subsample: 1.0,
            max_bins: 64,
            seed: 0,
        }
    }
}

/// Binary gradient boosting classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: BoostingParams,
    n_features: usize,
    base_score: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingClassifier {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            n_features: 0,
            base_score: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    /// Number of fitted trees
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Raw log-odds per row
    pub fn predict_margin(&self, x: &Matrix) -> Result<Vec<f64>> {
        self.check_fitted(x)?;
        Ok(x.iter_rows()
            .map(|row| {
                self.base_score + self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }

    /// Total split gain per feature
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut importance = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.add_importance(&mut importance);
        }
        importance
    }

    fn check_fitted(&self, x: &Matrix) -> Result<()> {
        if self.n_features == 0 {
            return Err(Error::model("gradient boosting classifier is not fitted"));
        }
        if x.cols() != self.n_features {
            return Err(Error::shape(format!(
                "classifier expects {} features, got {}",
                self.n_features,
                x.cols()
            )));
        }
        Ok(())
    }
}

impl BinaryClassifier for GradientBoostingClassifier {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()> {
        check_binary_target(x, y)?;
        let p = &self.params;
        let n = x.rows();

        let mean = (y.iter().sum::<f64>() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        let base_score = (mean / (1.0 - mean)).ln();

        let mapper = BinMapper::fit(x, p.max_bins);
        let binned = mapper.bin_matrix(x);
        let tree_params = TreeParams {
            max_depth: p.depth,
            min_child_weight: p.min_child_weight,
            min_samples_leaf: 1,
            lambda: p.l2_leaf_reg,
            gamma: 0.0,
            max_features: None,
        };
        let mut rng = StdRng::seed_from_u64(p.seed);

        let mut margin = vec![base_score; n];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut trees = Vec::with_capacity(p.iterations);

        for iteration in 0..p.iterations {
            for i in 0..n {
                let prob = sigmoid(margin[i]);
                grad[i] = prob - y[i];
                hess[i] = (prob * (1.0 - prob)).max(1e-6);
            }

            let indices: Vec<usize> = if p.subsample < 1.0 {
                (0..n).filter(|_| rng.gen::<f64>() < p.subsample).collect()
            } else {
                (0..n).collect()
            };
            if indices.is_empty() {
                continue;
            }

            let mut tree = RegressionTree::fit(
                &binned,
                &mapper,
                &grad,
                &hess,
                indices,
                &tree_params,
                &mut rng,
            );
            tree.scale(p.learning_rate);

            for (i, row) in x.iter_rows().enumerate() {
                margin[i] += tree.predict_row(row);
            }
            trees.push(tree);

            if iteration % 25 == 0 {
                debug!(
                    "Boosting iteration {}/{} logloss={:.5}",
                    iteration + 1,
                    p.iterations,
                    log_loss(&margin, y)
                );
            }
        }

        self.n_features = x.cols();
        self.base_score = base_score;
        self.trees = trees;
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix) -> Result<Vec<f64>> {
        Ok(self.predict_margin(x)?.into_iter().map(sigmoid).collect())
    }

    fn name(&self) -> &str {
        "gradient_boosting"
    }
}

#[inline]
pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn log_loss(margin: &[f64], y: &[f64]) -> f64 {
    let total: f64 = margin
        .iter()
        .zip(y)
        .map(|(m, t)| {
            let p = sigmoid(*m).clamp(1e-15, 1.0 - 1e-15);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum();
    total / margin.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Matrix, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..200).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = (0..200).map(|i| if i >= 100 { 1.0 } else { 0.0 }).collect();
        (Matrix::from_rows(&rows).unwrap(), y)
    }

    #[test]
    fn test_learns_threshold() {
        let (x, y) = separable();
        let mut model = GradientBoostingClassifier::new(BoostingParams {
            iterations: 30,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        let probe = Matrix::from_rows(&[vec![10.0, 3.0], vec![190.0, 3.0]]).unwrap();
        let p = model.predict_proba(&probe).unwrap();
        assert!(p[0] < 0.2, "low side got {}", p[0]);
        assert!(p[1] > 0.8, "high side got {}", p[1]);
        assert_eq!(model.tree_count(), 30);
    }

    #[test]
    fn test_importance_prefers_informative_feature() {
        let (x, y) = separable();
        let mut model = GradientBoostingClassifier::new(BoostingParams {
            iterations: 10,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let importance = model.feature_importance();
        assert!(importance[0] > importance[1]);
    }

    #[test]
    fn test_unfitted_model_errors() {
        let model = GradientBoostingClassifier::new(BoostingParams::default());
        let x = Matrix::from_rows(&[vec![1.0]]).unwrap();
        assert!(model.predict_proba(&x).is_err());
    }

    #[test]
    fn test_width_mismatch_errors() {
        let (x, y) = separable();
        let mut model = GradientBoostingClassifier::new(BoostingParams {
            iterations: 2,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let narrow = Matrix::from_rows(&[vec![1.0]]).unwrap();
        assert!(matches!(model.predict_proba(&narrow), Err(Error::Shape(_))));
    }

    #[test]
    fn test_subsample_is_deterministic_for_seed() {
        let (x, y) = separable();
        let params = BoostingParams {
            iterations: 5,
            subsample: 0.5,
            seed: 9,
            ..Default::default()
        };
        let mut a = GradientBoostingClassifier::new(params.clone());
        let mut b = GradientBoostingClassifier::new(params);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }
}
