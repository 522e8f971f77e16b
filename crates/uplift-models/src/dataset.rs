//! Treatment datasets: on-disk tables, synthetic generation, splitting
//!
//! Tables are parquet files by default. A `.json` path holds the table
//! split-oriented instead: `{"columns": [...], "index": [...], "data": [[...], ...]}`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};
use uplift_core::{Error, FeatureRow, FeatureValue, Result};

use crate::columnar;

/// Name of the binary outcome column
pub const TARGET_COLUMN: &str = "target";

/// Name of the treatment indicator column
pub const TREATMENT_COLUMN: &str = "treatment_flg";

/// On-disk table format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Parquet,
    Json,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Parquet,
        }
    }
}

/// Split-oriented table keyed by client id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub index: Vec<String>,
    pub data: Vec<Vec<Value>>,
}

impl Table {
    /// Read a table from a parquet or JSON file
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = match TableFormat::from_path(path) {
            TableFormat::Parquet => columnar::read_parquet(path)?,
            TableFormat::Json => {
                let file = File::open(path)
                    .map_err(|e| Error::config(format!("failed to open {}: {}", path.display(), e)))?;
                serde_json::from_reader(BufReader::new(file))?
            }
        };
        table.validate()?;
        Ok(table)
    }

    /// Write the table in the format its extension names, creating parent
    /// directories
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        match TableFormat::from_path(path) {
            TableFormat::Parquet => columnar::write_parquet(self, path),
            TableFormat::Json => {
                let mut writer = BufWriter::new(File::create(path)?);
                serde_json::to_writer(&mut writer, self)?;
                writer.flush()?;
                Ok(())
            }
        }
    }

    /// Index and row lengths must line up with the column list
    pub fn validate(&self) -> Result<()> {
        if self.index.len() != self.data.len() {
            return Err(Error::shape(format!(
                "table has {} index entries but {} rows",
                self.index.len(),
                self.data.len()
            )));
        }
        if let Some(i) = self.data.iter().position(|r| r.len() != self.columns.len()) {
            return Err(Error::shape(format!(
                "table row {} has {} values, expected {}",
                i,
                self.data[i].len(),
                self.columns.len()
            )));
        }
        Ok(())
    }

    fn column_position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::config(format!("table has no column '{}'", name)))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Feature rows joined with outcome and treatment labels
#[derive(Debug, Clone, PartialEq)]
pub struct UpliftDataset {
    pub ids: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
    pub target: Vec<f64>,
    pub treatment: Vec<f64>,
}

impl UpliftDataset {
    /// Join the feature table with the label table on the index.
    ///
    /// Every labelled client must have a feature row.
    pub fn from_tables(features: &Table, labels: &Table) -> Result<Self> {
        let target_col = labels.column_position(TARGET_COLUMN)?;
        let treatment_col = labels.column_position(TREATMENT_COLUMN)?;

        let by_id: HashMap<&str, usize> = features
            .index
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();

        let mut dataset = Self {
            ids: Vec::with_capacity(labels.len()),
            columns: features.columns.clone(),
            rows: Vec::with_capacity(labels.len()),
            target: Vec::with_capacity(labels.len()),
            treatment: Vec::with_capacity(labels.len()),
        };

        for (id, label_row) in labels.index.iter().zip(&labels.data) {
            let pos = *by_id
                .get(id.as_str())
                .ok_or_else(|| Error::config(format!("client '{}' has no feature row", id)))?;
            let row = features.data[pos]
                .iter()
                .map(|v| serde_json::from_value::<FeatureValue>(v.clone()))
                .collect::<std::result::Result<FeatureRow, _>>()?;

            dataset.ids.push(id.clone());
            dataset.rows.push(row);
            dataset.target.push(binary_label(&label_row[target_col], TARGET_COLUMN)?);
            dataset
                .treatment
                .push(binary_label(&label_row[treatment_col], TREATMENT_COLUMN)?);
        }

        debug!(
            "Joined {} labelled clients against {} feature rows",
            dataset.len(),
            features.len()
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of treated rows
    pub fn treated_count(&self) -> usize {
        self.treatment.iter().filter(|t| **t == 1.0).count()
    }

    /// New dataset holding the selected rows, in order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            ids: indices.iter().map(|&i| self.ids[i].clone()).collect(),
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
            target: indices.iter().map(|&i| self.target[i]).collect(),
            treatment: indices.iter().map(|&i| self.treatment[i]).collect(),
        }
    }

    /// Shuffle and split into (train, test).
    ///
    /// With `stratify`, every treatment x target cell is split separately
    /// so both partitions keep the same mix.
    pub fn train_test_split(&self, test_size: f64, seed: Option<u64>, stratify: bool) -> Result<(Self, Self)> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(Error::invalid_argument(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let groups: Vec<Vec<usize>> = if stratify {
            let mut cells: [Vec<usize>; 4] = Default::default();
            for i in 0..self.len() {
                let cell = (self.treatment[i] as usize) * 2 + self.target[i] as usize;
                cells[cell].push(i);
            }
            cells.into_iter().collect()
        } else {
            vec![(0..self.len()).collect()]
        };

        let mut train = Vec::new();
        let mut test = Vec::new();
        for mut group in groups {
            group.shuffle(&mut rng);
            let n_test = (group.len() as f64 * test_size).round() as usize;
            test.extend_from_slice(&group[..n_test]);
            train.extend_from_slice(&group[n_test..]);
        }
        train.sort_unstable();
        test.sort_unstable();

        Ok((self.subset(&train), self.subset(&test)))
    }
}

fn binary_label(value: &Value, column: &str) -> Result<f64> {
    let v = match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    match v {
        Some(v) if v == 0.0 || v == 1.0 => Ok(v),
        _ => Err(Error::shape(format!(
            "column '{}' must hold 0/1 labels, found {}",
            column, value
        ))),
    }
}

/// Column layout of the synthetic retail dataset
pub fn retail_columns() -> Vec<String> {
    [
        "age",
        "gender",
        "first_issue_time",
        "first_redeem_time",
        "issue_redeem_delay",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Generate a retail promotion dataset shaped like the X5 uplift
/// benchmark: customer features plus a randomized treatment whose effect
/// is larger for younger and female customers.
///
/// Returns the (features, labels) tables.
pub fn synthetic_retail(n: usize, seed: u64) -> (Table, Table) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut index = Vec::with_capacity(n);
    let mut feature_rows = Vec::with_capacity(n);
    let mut label_rows = Vec::with_capacity(n);

    for i in 0..n {
        let age: i64 = rng.gen_range(18..80);
        let gender = match rng.gen::<f64>() {
            g if g < 0.45 => "F",
            g if g < 0.80 => "M",
            _ => "U",
        };
        let first_issue_time: i64 = rng.gen_range(1_490_000_000..1_530_000_000);
        let delay = rng.gen_range(0.0..30_000_000.0f64).round();
        let first_redeem_time = first_issue_time as f64 + delay;
        let treated = rng.gen_bool(0.5);

        let gender_shift = match gender {
            "F" => 0.3,
            "M" => 0.0,
            _ => -0.2,
        };
        let base = -0.8 + 0.015 * (age as f64 - 45.0) + gender_shift - 0.8 * delay / 30_000_000.0;
        let effect = (if age < 40 { 0.7 } else { 0.15 }) + (if gender == "F" { 0.2 } else { 0.0 });
        let logit = if treated { base + effect } else { base };
        let converted = rng.gen::<f64>() < 1.0 / (1.0 + (-logit).exp());

        index.push(format!("c{:07}", i));
        feature_rows.push(vec![
            Value::from(age),
            Value::from(gender),
            Value::from(first_issue_time),
            Value::from(first_redeem_time),
            Value::from(delay),
        ]);
        label_rows.push(vec![
            Value::from(if treated { 1 } else { 0 }),
            Value::from(if converted { 1 } else { 0 }),
        ]);
    }

    info!("Generated synthetic retail dataset with {} clients", n);
    (
        Table {
            columns: retail_columns(),
            index: index.clone(),
            data: feature_rows,
        },
        Table {
            columns: vec![TREATMENT_COLUMN.to_string(), TARGET_COLUMN.to_string()],
            index,
            data: label_rows,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_join_tables() {
        let features = Table {
            columns: vec!["age".into(), "gender".into()],
            index: vec!["a".into(), "b".into()],
            data: vec![vec![json!(30), json!("M")], vec![json!(40), json!("F")]],
        };
        let labels = Table {
            columns: vec![TREATMENT_COLUMN.into(), TARGET_COLUMN.into()],
            index: vec!["b".into(), "a".into()],
            data: vec![vec![json!(1), json!(0)], vec![json!(0), json!(1)]],
        };

        let dataset = UpliftDataset::from_tables(&features, &labels).unwrap();
        assert_eq!(dataset.ids, vec!["b", "a"]);
        assert_eq!(dataset.rows[0][1], FeatureValue::from("F"));
        assert_eq!(dataset.treatment, vec![1.0, 0.0]);
        assert_eq!(dataset.target, vec![0.0, 1.0]);
    }

    #[test]
    fn test_join_requires_features() {
        let features = Table {
            columns: vec!["age".into()],
            index: vec!["a".into()],
            data: vec![vec![json!(30)]],
        };
        let labels = Table {
            columns: vec![TREATMENT_COLUMN.into(), TARGET_COLUMN.into()],
            index: vec!["z".into()],
            data: vec![vec![json!(1), json!(0)]],
        };
        assert!(UpliftDataset::from_tables(&features, &labels).is_err());
    }

    #[test]
    fn test_non_binary_label_rejected() {
        assert!(binary_label(&json!(2), TARGET_COLUMN).is_err());
        assert_eq!(binary_label(&json!(true), TARGET_COLUMN).unwrap(), 1.0);
    }

    #[test]
    fn test_table_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let (features, labels) = synthetic_retail(20, 1);
        let path = dir.path().join("nested").join("df_features.json");
        features.write(&path).unwrap();

        let read = Table::read(&path).unwrap();
        assert_eq!(read, features);
        assert_eq!(labels.len(), 20);
    }

    #[test]
    fn test_format_follows_extension() {
        assert_eq!(TableFormat::from_path(Path::new("data/df_train.parquet")), TableFormat::Parquet);
        assert_eq!(TableFormat::from_path(Path::new("data/df_train.JSON")), TableFormat::Json);
        assert_eq!(TableFormat::from_path(Path::new("data/df_train")), TableFormat::Parquet);
    }

    #[test]
    fn test_parquet_table_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let (_, labels) = synthetic_retail(30, 2);
        let path = dir.path().join("nested").join("df_train.parquet");
        labels.write(&path).unwrap();
        assert_eq!(Table::read(&path).unwrap(), labels);
    }

    #[test]
    fn test_synthetic_is_seeded() {
        let (a, _) = synthetic_retail(50, 7);
        let (b, _) = synthetic_retail(50, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stratified_split_keeps_every_cell() {
        let (features, labels) = synthetic_retail(400, 3);
        let dataset = UpliftDataset::from_tables(&features, &labels).unwrap();
        let (train, test) = dataset.train_test_split(0.25, Some(1), true).unwrap();

        assert_eq!(train.len() + test.len(), dataset.len());
        assert!((test.len() as f64 - 100.0).abs() <= 2.0);
        assert!(test.treated_count() > 0);
        assert!(test.treated_count() < test.len());
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let (features, labels) = synthetic_retail(10, 3);
        let dataset = UpliftDataset::from_tables(&features, &labels).unwrap();
        assert!(dataset.train_test_split(1.0, None, false).is_err());
        assert!(dataset.train_test_split(0.0, None, false).is_err());
    }
}
