//! Histogram regression trees grown on gradient/hessian statistics
//!
//! Both learners share this builder: boosting feeds logistic-loss
//! gradients, the forest feeds `g = -y, h = 1` so that leaves hold the
//! mean target of their samples.

use crate::matrix::Matrix;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Split candidates per feature, learned once per fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinMapper {
    thresholds: Vec<Vec<f64>>,
}

impl BinMapper {
    /// Learn at most `max_bins - 1` thresholds per feature from quantiles
    /// of the distinct non-missing values.
    pub fn fit(x: &Matrix, max_bins: usize) -> Self {
        let max_bins = max_bins.max(2);
        let thresholds = (0..x.cols())
            .map(|f| {
                let mut values: Vec<f64> = (0..x.rows())
                    .map(|r| x.get(r, f))
                    .filter(|v| !v.is_nan())
                    .collect();
                values.sort_by(|a, b| a.total_cmp(b));
                values.dedup();

                if values.len() <= max_bins {
                    values.windows(2).map(|w| midpoint(w[0], w[1])).collect()
                } else {
                    let mut cuts: Vec<f64> = (1..max_bins)
                        .map(|q| {
                            let idx = q * values.len() / max_bins;
                            midpoint(values[idx - 1], values[idx])
                        })
                        .collect();
                    cuts.dedup();
                    cuts
                }
            })
            .collect();
        Self { thresholds }
    }

    /// Bin index of `value` for `feature`; missing values land in bin 0
    pub fn bin(&self, feature: usize, value: f64) -> u16 {
        if value.is_nan() {
            return 0;
        }
        self.thresholds[feature].partition_point(|t| *t < value) as u16
    }

    /// Number of bins for `feature`
    pub fn bin_count(&self, feature: usize) -> usize {
        self.thresholds[feature].len() + 1
    }

    /// Threshold separating bins `k` and `k + 1`
    pub fn threshold(&self, feature: usize, k: usize) -> f64 {
        self.thresholds[feature][k]
    }

    pub fn features(&self) -> usize {
        self.thresholds.len()
    }

    /// Bin every value of `x`
    pub fn bin_matrix(&self, x: &Matrix) -> BinnedMatrix {
        let mut bins = Vec::with_capacity(x.rows() * x.cols());
        for row in x.iter_rows() {
            for (f, v) in row.iter().enumerate() {
                bins.push(self.bin(f, *v));
            }
        }
        BinnedMatrix {
            cols: x.cols(),
            bins,
        }
    }
}

fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) / 2.0
}

/// Row-major bin indices
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    cols: usize,
    bins: Vec<u16>,
}

impl BinnedMatrix {
    #[inline]
    fn get(&self, row: usize, col: usize) -> u16 {
        self.bins[row * self.cols + col]
    }
}

/// Growth limits for a single tree
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub min_samples_leaf: usize,
    /// L2 penalty on leaf values
    pub lambda: f64,
    /// Minimum gain to accept a split
    pub gamma: f64,
    /// Features considered per split, all when `None`
    pub max_features: Option<usize>,
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        gain: f64,
    },
    Leaf {
        value: f64,
    },
}

/// Binary regression tree. Rows with `value <= threshold` or a missing
/// value go left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on the samples in `indices`
    pub fn fit(
        binned: &BinnedMatrix,
        mapper: &BinMapper,
        grad: &[f64],
        hess: &[f64],
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = TreeBuilder {
            binned,
            mapper,
            grad,
            hess,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.grow(indices, 0);
        Self {
            nodes: builder.nodes,
        }
    }

    /// Evaluate one encoded row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let v = row[*feature];
                    id = if v.is_nan() || v <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Multiply every leaf value by `factor`
    pub fn scale(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Accumulate split gain per feature
    pub fn add_importance(&self, importance: &mut [f64]) {
        for node in &self.nodes {
            if let Node::Split { feature, gain, .. } = node {
                if let Some(slot) = importance.get_mut(*feature) {
                    *slot += gain;
                }
            }
        }
    }
}

struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    mapper: &'a BinMapper,
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: 0.0 });

        let g: f64 = indices.iter().map(|&i| self.grad[i]).sum();
        let h: f64 = indices.iter().map(|&i| self.hess[i]).sum();

        let split = if depth < self.params.max_depth {
            self.best_split(&indices, g, h)
        } else {
            None
        };

        match split {
            Some(split) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .into_iter()
                    .partition(|&i| self.binned.get(i, split.feature) as usize <= split.bin);
                let left = self.grow(left_idx, depth + 1);
                let right = self.grow(right_idx, depth + 1);
                self.nodes[id] = Node::Split {
                    feature: split.feature,
                    threshold: self.mapper.threshold(split.feature, split.bin),
                    left,
                    right,
                    gain: split.gain,
                };
            }
            None => {
                self.nodes[id] = Node::Leaf {
                    value: leaf_value(g, h, self.params.lambda),
                };
            }
        }
        id
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n = self.mapper.features();
        match self.params.max_features {
            Some(m) if m > 0 && m < n => rand::seq::index::sample(&mut *self.rng, n, m).into_vec(),
            _ => (0..n).collect(),
        }
    }

    fn best_split(&mut self, indices: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let p = self.params;
        if indices.len() < 2 * p.min_samples_leaf.max(1) {
            return None;
        }
        let parent = score(g, h, p.lambda);
        let mut best: Option<SplitCandidate> = None;

        for feature in self.candidate_features() {
            let bins = self.mapper.bin_count(feature);
            if bins < 2 {
                continue;
            }
            let mut hist_g = vec![0.0; bins];
            let mut hist_h = vec![0.0; bins];
            let mut hist_n = vec![0usize; bins];
            for &i in indices {
                let b = self.binned.get(i, feature) as usize;
                hist_g[b] += self.grad[i];
                hist_h[b] += self.hess[i];
                hist_n[b] += 1;
            }

            let (mut gl, mut hl, mut nl) = (0.0, 0.0, 0usize);
            for k in 0..bins - 1 {
                gl += hist_g[k];
                hl += hist_h[k];
                nl += hist_n[k];
                let (gr, hr, nr) = (g - gl, h - hl, indices.len() - nl);

                if hl < p.min_child_weight || hr < p.min_child_weight {
                    continue;
                }
                if nl < p.min_samples_leaf || nr < p.min_samples_leaf {
                    continue;
                }

                let gain =
                    0.5 * (score(gl, hl, p.lambda) + score(gr, hr, p.lambda) - parent) - p.gamma;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        bin: k,
                        gain,
                    });
                }
            }
        }
        best
    }
}

#[inline]
fn score(g: f64, h: f64, lambda: f64) -> f64 {
    let denom = h + lambda;
    if denom <= 0.0 {
        0.0
    } else {
        g * g / denom
    }
}

#[inline]
fn leaf_value(g: f64, h: f64, lambda: f64) -> f64 {
    let denom = h + lambda;
    if denom <= 0.0 {
        0.0
    } else {
        -g / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_child_weight: 0.0,
            min_samples_leaf: 1,
            lambda: 0.0,
            gamma: 0.0,
            max_features: None,
        }
    }

    #[test]
    fn test_bin_mapper_orders_values() {
        let x = Matrix::from_rows(&[vec![1.0], vec![3.0], vec![2.0], vec![f64::NAN]]).unwrap();
        let mapper = BinMapper::fit(&x, 16);
        assert_eq!(mapper.bin_count(0), 3);
        assert_eq!(mapper.bin(0, 1.0), 0);
        assert_eq!(mapper.bin(0, 2.0), 1);
        assert_eq!(mapper.bin(0, 3.0), 2);
        assert_eq!(mapper.bin(0, f64::NAN), 0);
        assert_eq!(mapper.threshold(0, 0), 1.5);
    }

    #[test]
    fn test_bin_mapper_caps_bins() {
        let rows: Vec<Vec<f64>> = (0..1000).map(|i| vec![i as f64]).collect();
        let x = Matrix::from_rows(&rows).unwrap();
        let mapper = BinMapper::fit(&x, 32);
        assert!(mapper.bin_count(0) <= 32);
    }

    #[test]
    fn test_tree_recovers_step_function() {
        // y = 1 when x > 5, mean-fitting gradients
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let x = Matrix::from_rows(&rows).unwrap();
        let y: Vec<f64> = (0..10).map(|i| if i > 5 { 1.0 } else { 0.0 }).collect();
        let grad: Vec<f64> = y.iter().map(|v| -v).collect();
        let hess = vec![1.0; 10];

        let mapper = BinMapper::fit(&x, 64);
        let binned = mapper.bin_matrix(&x);
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit(&binned, &mapper, &grad, &hess, (0..10).collect(), &params(3), &mut rng);

        assert_eq!(tree.predict_row(&[2.0]), 0.0);
        assert_eq!(tree.predict_row(&[8.0]), 1.0);
        assert_eq!(tree.predict_row(&[f64::NAN]), 0.0);
    }

    #[test]
    fn test_depth_zero_is_single_leaf() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        let mapper = BinMapper::fit(&x, 8);
        let binned = mapper.bin_matrix(&x);
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit(&binned, &mapper, &[-1.0, -3.0], &[1.0, 1.0], vec![0, 1], &params(0), &mut rng);

        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict_row(&[0.0]), 2.0);
    }

    #[test]
    fn test_scale_affects_leaves() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        let mapper = BinMapper::fit(&x, 8);
        let binned = mapper.bin_matrix(&x);
        let mut rng = StdRng::seed_from_u64(0);
        let mut tree = RegressionTree::fit(&binned, &mapper, &[-2.0, -2.0], &[1.0, 1.0], vec![0, 1], &params(0), &mut rng);
        tree.scale(0.5);
        assert_eq!(tree.predict_row(&[1.0]), 1.0);
    }
}
