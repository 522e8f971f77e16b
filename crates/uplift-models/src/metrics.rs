//! Holdout evaluation metrics

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uplift_core::{Error, Result};

/// How the top-k slice is taken for uplift@k
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpliftAtKStrategy {
    /// Top k fraction of all customers, then split by arm
    Overall,
    /// Top k fraction of each arm separately
    ByGroup,
}

impl UpliftAtKStrategy {
    pub const ALL: [UpliftAtKStrategy; 2] = [Self::Overall, Self::ByGroup];
}

impl fmt::Display for UpliftAtKStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overall => f.write_str("overall"),
            Self::ByGroup => f.write_str("by_group"),
        }
    }
}

fn rank_desc(scores: &[f64], indices: &mut [usize]) {
    // stable, so ties keep input order
    indices.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });
}

fn top_n(len: usize, k: f64) -> usize {
    ((len as f64) * k).floor() as usize
}

fn mean_of(target: &[f64], indices: impl Iterator<Item = usize>) -> Option<f64> {
    let (sum, count) = indices.fold((0.0, 0usize), |(s, c), i| (s + target[i], c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Conversion rate difference between treated and control customers among
/// the top `k` fraction ranked by predicted uplift.
pub fn uplift_at_k(
    target: &[f64],
    uplift: &[f64],
    treatment: &[f64],
    k: f64,
    strategy: UpliftAtKStrategy,
) -> Result<f64> {
    if target.len() != uplift.len() || target.len() != treatment.len() {
        return Err(Error::shape(format!(
            "uplift@k inputs differ in length: target={}, uplift={}, treatment={}",
            target.len(),
            uplift.len(),
            treatment.len()
        )));
    }
    if !(k > 0.0 && k <= 1.0) {
        return Err(Error::invalid_argument(format!(
            "k must be in (0, 1], got {}",
            k
        )));
    }

    let empty_group = |what: &str| {
        Error::model(format!(
            "uplift@k with k={} and strategy '{}' has no {} customers in the top slice",
            k, strategy, what
        ))
    };

    match strategy {
        UpliftAtKStrategy::Overall => {
            let mut order: Vec<usize> = (0..target.len()).collect();
            rank_desc(uplift, &mut order);
            let top = &order[..top_n(order.len(), k)];

            let treated = mean_of(target, top.iter().copied().filter(|&i| treatment[i] == 1.0))
                .ok_or_else(|| empty_group("treated"))?;
            let control = mean_of(target, top.iter().copied().filter(|&i| treatment[i] == 0.0))
                .ok_or_else(|| empty_group("control"))?;
            Ok(treated - control)
        }
        UpliftAtKStrategy::ByGroup => {
            let arm_top = |arm: f64| {
                let mut order: Vec<usize> =
                    (0..target.len()).filter(|&i| treatment[i] == arm).collect();
                rank_desc(uplift, &mut order);
                let n = top_n(order.len(), k);
                mean_of(target, order.into_iter().take(n))
            };

            let treated = arm_top(1.0).ok_or_else(|| empty_group("treated"))?;
            let control = arm_top(0.0).ok_or_else(|| empty_group("control"))?;
            Ok(treated - control)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // scores rank rows 0..8; treated rows convert, control rows mostly not
    fn fixture() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let uplift = vec![0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1, 0.0];
        let treatment = vec![1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let target = vec![1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        (target, uplift, treatment)
    }

    #[test]
    fn test_overall_strategy() {
        let (target, uplift, treatment) = fixture();
        // top 4: rows 0..4 -> treated {0, 2} rate 1.0, control {1, 3} rate 0.5
        let score = uplift_at_k(&target, &uplift, &treatment, 0.4, UpliftAtKStrategy::Overall).unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_by_group_strategy() {
        let (target, uplift, treatment) = fixture();
        // top 2 of each arm: treated {0, 2} rate 1.0, control {1, 3} rate 0.5
        let score = uplift_at_k(&target, &uplift, &treatment, 0.4, UpliftAtKStrategy::ByGroup).unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_group_is_an_error() {
        let (target, uplift, treatment) = fixture();
        // top 1 is a single treated row
        let err = uplift_at_k(&target, &uplift, &treatment, 0.1, UpliftAtKStrategy::Overall);
        assert!(matches!(err, Err(Error::Model(_))));
    }

    #[test]
    fn test_invalid_k() {
        let (target, uplift, treatment) = fixture();
        for k in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(uplift_at_k(&target, &uplift, &treatment, k, UpliftAtKStrategy::ByGroup).is_err());
        }
    }

    #[test]
    fn test_length_mismatch() {
        let err = uplift_at_k(&[1.0], &[0.5, 0.2], &[1.0], 0.5, UpliftAtKStrategy::Overall);
        assert!(matches!(err, Err(Error::Shape(_))));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(UpliftAtKStrategy::Overall.to_string(), "overall");
        assert_eq!(UpliftAtKStrategy::ByGroup.to_string(), "by_group");
    }
}
