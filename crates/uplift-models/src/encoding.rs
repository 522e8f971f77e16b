//! Feature encoding from heterogeneous rows to a numeric matrix
//!
//! Numeric columns pass through. Categorical columns are replaced by a
//! smoothed target statistic: `(sum + prior * a) / (count + a)` where `a`
//! is the prior weight. Unseen categories fall back to the prior.

use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uplift_core::{Error, FeatureRow, FeatureValue, Result};

/// Running target sum and count for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub sum: f64,
    pub count: f64,
}

/// How a single column is encoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnEncoding {
    Numeric,
    Categorical {
        stats: HashMap<String, CategoryStats>,
        prior: f64,
        prior_weight: f64,
    },
}

impl ColumnEncoding {
    fn encode(&self, column: &str, value: &FeatureValue) -> Result<f64> {
        match self {
            Self::Numeric => value.as_f64().ok_or_else(|| {
                Error::shape(format!("column '{}' expects a number, got {}", column, value))
            }),
            Self::Categorical {
                stats,
                prior,
                prior_weight,
            } => Ok(match value.category() {
                None => f64::NAN,
                Some(label) => match stats.get(&label) {
                    Some(s) => (s.sum + prior * prior_weight) / (s.count + prior_weight),
                    None => *prior,
                },
            }),
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Categorical { .. })
    }
}

/// Fitted encoder for a fixed column layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<String>,
    encodings: Vec<ColumnEncoding>,
}

impl FeatureEncoder {
    /// Learn column kinds and category statistics.
    ///
    /// A column is categorical when it is named in `categorical` or when
    /// any training value in it is non-numeric text.
    pub fn fit(
        columns: &[String],
        rows: &[FeatureRow],
        target: &[f64],
        categorical: &[String],
        prior_weight: f64,
    ) -> Result<Self> {
        if rows.len() != target.len() {
            return Err(Error::shape(format!(
                "{} rows but {} targets",
                rows.len(),
                target.len()
            )));
        }
        for name in categorical {
            if !columns.contains(name) {
                return Err(Error::config(format!(
                    "categorical feature '{}' is not a known column",
                    name
                )));
            }
        }
        check_width(columns.len(), rows)?;

        let prior = if target.is_empty() {
            0.5
        } else {
            target.iter().sum::<f64>() / target.len() as f64
        };

        let mut encodings = Vec::with_capacity(columns.len());
        for (col, name) in columns.iter().enumerate() {
            let textual = rows
                .iter()
                .any(|row| row[col].is_text() && row[col].as_f64().is_none());

            if !textual && !categorical.contains(name) {
                encodings.push(ColumnEncoding::Numeric);
                continue;
            }

            let mut stats: HashMap<String, CategoryStats> = HashMap::new();
            for (row, y) in rows.iter().zip(target) {
                if let Some(label) = row[col].category() {
                    let entry = stats.entry(label).or_default();
                    entry.sum += y;
                    entry.count += 1.0;
                }
            }
            debug!("Column '{}' is categorical with {} levels", name, stats.len());
            encodings.push(ColumnEncoding::Categorical {
                stats,
                prior,
                prior_weight,
            });
        }

        Ok(Self {
            columns: columns.to_vec(),
            encodings,
        })
    }

    /// Encode rows into a matrix with one column per input column
    pub fn transform(&self, rows: &[FeatureRow]) -> Result<Matrix> {
        check_width(self.columns.len(), rows)?;
        let mut data = Vec::with_capacity(rows.len() * self.columns.len());
        for row in rows {
            for ((value, encoding), name) in row.iter().zip(&self.encodings).zip(&self.columns) {
                data.push(encoding.encode(name, value)?);
            }
        }
        Matrix::new(rows.len(), self.columns.len(), data)
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Names of the columns encoded as categories
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .zip(&self.encodings)
            .filter(|(_, e)| e.is_categorical())
            .map(|(c, _)| c.as_str())
            .collect()
    }

    /// Number of encoded columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

fn check_width(expected: usize, rows: &[FeatureRow]) -> Result<()> {
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
        return Err(Error::shape(format!(
            "row {} has {} values, expected {}",
            i,
            row.len(),
            expected
        )));
    }
    Ok(())
}
