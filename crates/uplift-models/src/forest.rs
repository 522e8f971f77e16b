//! Random forest of probability trees

use crate::estimator::{check_binary_target, BinaryClassifier};
use crate::matrix::Matrix;
use crate::tree::{BinMapper, RegressionTree, TreeParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uplift_core::{Error, Result};

/// Features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    #[default]
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> Option<usize> {
        let n = n_features as f64;
        match self {
            Self::Sqrt => Some(n.sqrt().round().max(1.0) as usize),
            Self::Log2 => Some(n.log2().round().max(1.0) as usize),
            Self::All => None,
        }
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Sample rows with replacement for every tree
    pub bootstrap: bool,
    pub max_bins: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_leaf: 5,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            max_bins: 64,
            seed: 0,
        }
    }
}

/// Random forest classifier; probabilities are the mean leaf frequency
/// across trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl BinaryClassifier for RandomForestClassifier {
    fn fit(&mut self, x: &Matrix, y: &[f64]) -> Result<()> {
        check_binary_target(x, y)?;
        let p = &self.params;
        let n = x.rows();

        let mapper = BinMapper::fit(x, p.max_bins);
        let binned = mapper.bin_matrix(x);
        let tree_params = TreeParams {
            max_depth: p.max_depth,
            min_child_weight: 0.0,
            min_samples_leaf: p.min_samples_leaf.max(1),
            lambda: 0.0,
            gamma: 0.0,
            max_features: p.max_features.resolve(x.cols()),
        };

        // squared-error gradients around zero: leaves hold mean(y)
        let grad: Vec<f64> = y.iter().map(|v| -v).collect();
        let hess = vec![1.0; n];
        let mut rng = StdRng::seed_from_u64(p.seed);

        let trees: Vec<RegressionTree> = (0..p.n_trees)
            .map(|_| {
                let indices: Vec<usize> = if p.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(&binned, &mapper, &grad, &hess, indices, &tree_params, &mut rng)
            })
            .collect();

        self.n_features = x.cols();
        self.trees = trees;
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(Error::model("random forest classifier is not fitted"));
        }
        if x.cols() != self.n_features {
            return Err(Error::shape(format!(
                "classifier expects {} features, got {}",
                self.n_features,
                x.cols()
            )));
        }
        let n_trees = self.trees.len() as f64;
        Ok(x.iter_rows()
            .map(|row| {
                let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                (total / n_trees).clamp(0.0, 1.0)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
