use crate::error::{QscoreError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Project-by-measure matrix of normalized values, the durable intermediate
/// handed to the threshold-derivation procedure. Column order is fixed by
/// the first benchmark project.
#[derive(Debug, Clone)]
pub struct MeasureMatrix {
    pub measure_names: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone)]
pub struct MatrixRow {
    pub project: String,
    pub values: Vec<f64>,
}

impl MeasureMatrix {
    /// Assembles the matrix from per-project rows. Every project after the
    /// first must expose the identical measure set; a mismatch means the
    /// corpus is inconsistent and calibration cannot proceed.
    pub fn from_rows(rows: Vec<(String, BTreeMap<String, f64>)>) -> Result<Self> {
        let first = rows.first().ok_or_else(|| {
            QscoreError::Calibration("benchmark run produced no project rows".to_string())
        })?;
        let measure_names: Vec<String> = first.1.keys().cloned().collect();

        let mut matrix_rows = Vec::with_capacity(rows.len());
        for (project, values) in &rows {
            let row_names: Vec<&String> = values.keys().collect();
            if row_names.len() != measure_names.len()
                || row_names.iter().zip(&measure_names).any(|(a, b)| *a != b)
            {
                return Err(QscoreError::Calibration(format!(
                    "project {project} exposes a different measure set than the first benchmark project"
                )));
            }
            matrix_rows.push(MatrixRow {
                project: project.clone(),
                values: values.values().copied().collect(),
            });
        }

        Ok(Self {
            measure_names,
            rows: matrix_rows,
        })
    }

    /// Writes the matrix as a freshly created CSV artifact, truncating any
    /// stale file from an earlier run.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = String::new();
        out.push_str("Project");
        for name in &self.measure_names {
            out.push(',');
            out.push_str(&csv_field(name));
        }
        out.push('\n');

        for row in &self.rows {
            out.push_str(&csv_field(&row.project));
            for value in &row.values {
                out.push(',');
                out.push_str(&value.to_string());
            }
            out.push('\n');
        }

        fs::write(path, out)?;
        Ok(())
    }

    /// All values of one measure column, in row order.
    pub fn column(&self, measure: &str) -> Option<Vec<f64>> {
        let index = self.measure_names.iter().position(|name| name == measure)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(project: &str, values: &[(&str, f64)]) -> (String, BTreeMap<String, f64>) {
        (
            project.to_string(),
            values
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        )
    }

    #[test]
    fn first_project_fixes_column_order() {
        let matrix = MeasureMatrix::from_rows(vec![
            row("p1", &[("M1", 0.1), ("M2", 0.2)]),
            row("p2", &[("M2", 0.4), ("M1", 0.3)]),
        ])
        .expect("matrix should assemble");

        assert_eq!(matrix.measure_names, vec!["M1", "M2"]);
        assert_eq!(matrix.rows[1].values, vec![0.3, 0.4]);
    }

    #[test]
    fn inconsistent_measure_set_is_a_calibration_error() {
        let err = MeasureMatrix::from_rows(vec![
            row("p1", &[("M1", 0.1), ("M2", 0.2)]),
            row("p2", &[("M1", 0.3), ("M3", 0.4)]),
        ])
        .unwrap_err();
        assert!(matches!(err, QscoreError::Calibration(_)));
        assert!(err.to_string().contains("p2"));
    }

    #[test]
    fn empty_corpus_is_a_calibration_error() {
        let err = MeasureMatrix::from_rows(Vec::new()).unwrap_err();
        assert!(matches!(err, QscoreError::Calibration(_)));
    }

    #[test]
    fn csv_round_trip_preserves_header_and_rows() {
        let matrix = MeasureMatrix::from_rows(vec![
            row("p1", &[("Injection Findings", 0.1)]),
            row("p2", &[("Injection Findings", 0.05)]),
        ])
        .expect("matrix should assemble");

        let dir = TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("benchmark_data.csv");
        matrix.write_csv(&path).expect("csv should write");

        let written = std::fs::read_to_string(&path).expect("csv should read back");
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("Project,Injection Findings"));
        assert_eq!(lines.next(), Some("p1,0.1"));
        assert_eq!(lines.next(), Some("p2,0.05"));
    }

    #[test]
    fn column_returns_values_in_row_order() {
        let matrix = MeasureMatrix::from_rows(vec![
            row("p1", &[("M1", 0.10)]),
            row("p2", &[("M1", 0.05)]),
            row("p3", &[("M1", 0.01)]),
        ])
        .expect("matrix should assemble");

        assert_eq!(matrix.column("M1"), Some(vec![0.10, 0.05, 0.01]));
        assert_eq!(matrix.column("M2"), None);
    }
}
