//! Tabular microdata the risk analyses run over.

use anyhow::{bail, Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub attributes: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Load a dataset from a JSON file of the form `{"attributes": [..], "rows": [[..], ..]}`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        let dataset: Dataset = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse dataset {}", path.display()))?;
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn validate(&self) -> Result<()> {
        if self.attributes.is_empty() {
            bail!("dataset has no attributes");
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.attributes.len() {
                bail!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    self.attributes.len()
                );
            }
        }
        Ok(())
    }

    pub fn column_index(&self, attribute: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a == attribute)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

const SEXES: &[&str] = &["female", "male"];
const EDUCATION: &[&str] = &["primary", "secondary", "bachelor", "master", "doctorate"];
const MARITAL: &[&str] = &["single", "married", "divorced", "widowed"];
const OCCUPATION: &[&str] = &[
    "clerk", "engineer", "farmer", "nurse", "sales", "teacher", "technician", "unemployed",
];

/// Generate a deterministic census-like dataset.
pub fn synthetic(rows: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let attributes = ["age", "sex", "zipcode", "education", "marital-status", "occupation"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = (0..rows)
        .map(|_| {
            vec![
                rng.gen_range(18..90u32).to_string(),
                pick(&mut rng, SEXES),
                format!("{:05}", 47600 + rng.gen_range(0..40u32)),
                pick(&mut rng, EDUCATION),
                pick(&mut rng, MARITAL),
                pick(&mut rng, OCCUPATION),
            ]
        })
        .collect();

    Dataset { attributes, rows }
}

fn pick(rng: &mut StdRng, values: &[&str]) -> String {
    values[rng.gen_range(0..values.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_is_deterministic_per_seed() {
        let a = synthetic(50, 7);
        let b = synthetic(50, 7);
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.len(), 50);
        a.validate().unwrap();
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dataset = Dataset {
            attributes: vec!["a".into(), "b".into()],
            rows: vec![vec!["1".into()]],
        };
        let err = dataset.validate().unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn load_reads_json_files() {
        let path = std::env::temp_dir().join(format!("dataset-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"attributes":["zip","age"],"rows":[["1","2"],["3","4"]]}"#)
            .unwrap();
        let dataset = Dataset::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(dataset.column_index("age"), Some(1));
        assert_eq!(dataset.len(), 2);
    }
}
