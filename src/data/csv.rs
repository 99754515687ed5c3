//! CSV parsing for flat-feature classification data (e.g. Iris).
//!
//! Supported format:
//! - UTF-8, comma-separated
//! - Optional header row (auto-detected: the first row is a header if any
//!   feature cell is non-numeric)
//! - Double-quoted fields with embedded commas are handled correctly
//! - The last column is the class: either a 0-based integer index or a
//!   class name (names are numbered in order of first appearance)

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};

use crate::data::dataset::Dataset;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CsvData {
    pub dataset: Dataset<Vec<f64>>,
    /// Class names in index order when the label column held names.
    pub class_names: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn load_csv(path: &Path, num_classes: Option<usize>) -> Result<CsvData> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("cannot read CSV file {}", path.display()))?;
    parse_csv(&bytes, num_classes)
        .with_context(|| format!("while parsing {}", path.display()))
}

/// Parses CSV bytes into features and class labels.
///
/// `num_classes` defaults to the number of distinct classes seen (largest
/// index plus one for integer labels).
pub fn parse_csv(data: &[u8], num_classes: Option<usize>) -> Result<CsvData> {
    let text = std::str::from_utf8(data).context("CSV file is not valid UTF-8")?;

    let mut lines = text.lines().peekable();

    if let Some(first) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut inputs: Vec<Vec<f64>> = Vec::new();
    let mut raw_labels: Vec<String> = Vec::new();

    for (row_idx, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells = parse_csv_row(line);
        ensure!(
            cells.len() >= 2,
            "Row {}: expected at least 2 columns (features + class), got {}",
            row_idx + 1,
            cells.len()
        );
        let Some((label_cell, feature_cells)) = cells.split_last() else {
            bail!("Row {}: empty row", row_idx + 1);
        };

        inputs.push(parse_floats(feature_cells, row_idx + 1)?);
        raw_labels.push(label_cell.trim().to_owned());
    }

    ensure!(!inputs.is_empty(), "CSV contains no data rows after parsing");

    let n_feats = inputs[0].len();
    for (i, row) in inputs.iter().enumerate() {
        ensure!(
            row.len() == n_feats,
            "Row {}: feature count {} does not match first row's {}",
            i + 1, row.len(), n_feats
        );
    }

    let numeric: Option<Vec<usize>> = raw_labels.iter().map(|l| l.parse::<usize>().ok()).collect();
    let (labels, class_names) = match numeric {
        Some(labels) => (labels, None),
        None => {
            let mut names: Vec<String> = Vec::new();
            let labels = raw_labels
                .iter()
                .map(|l| match names.iter().position(|n| n == l) {
                    Some(i) => i,
                    None => {
                        names.push(l.clone());
                        names.len() - 1
                    }
                })
                .collect();
            (labels, Some(names))
        }
    };

    let seen = labels.iter().max().map_or(0, |&m| m + 1);
    let num_classes = num_classes.unwrap_or(seen);
    if num_classes < 2 {
        bail!("need at least 2 classes, found {}", num_classes);
    }

    Ok(CsvData { dataset: Dataset::new(inputs, labels, num_classes)?, class_names })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Returns `true` if the row looks like a header (any feature cell non-numeric).
fn is_header(line: &str) -> bool {
    let cells = parse_csv_row(line);
    let features = &cells[..cells.len().saturating_sub(1)];
    features.iter().any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    })
}

/// Parses a single CSV row, handling double-quoted fields.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                // Escaped quote inside quoted field.
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parses a slice of string cells as `f64`, returning an error with row info on failure.
fn parse_floats(cells: &[String], row_num: usize) -> Result<Vec<f64>> {
    cells.iter()
        .map(|c| {
            c.trim().parse::<f64>().with_context(|| {
                format!("Row {}: '{}' is not a valid number", row_num, c)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iris_style_names_are_indexed_in_order() {
        let csv = "sepal_length,sepal_width,petal_length,petal_width,species\n\
                   5.1,3.5,1.4,0.2,Iris-setosa\n\
                   7.0,3.2,4.7,1.4,Iris-versicolor\n\
                   6.3,3.3,6.0,2.5,Iris-virginica\n\
                   4.9,3.0,1.4,0.2,Iris-setosa\n";
        let data = parse_csv(csv.as_bytes(), None).unwrap();
        assert_eq!(data.dataset.len(), 4);
        assert_eq!(data.dataset.num_classes(), 3);
        assert_eq!(data.dataset.labels(), &[0, 1, 2, 0]);
        assert_eq!(data.dataset.inputs()[1], vec![7.0, 3.2, 4.7, 1.4]);
        assert_eq!(data.class_names.unwrap()[2], "Iris-virginica");
    }

    #[test]
    fn integer_labels_without_header() {
        let data = parse_csv(b"0.5,1.0,2\n0.1,0.2,0\n", Some(3)).unwrap();
        assert_eq!(data.dataset.labels(), &[2, 0]);
        assert!(data.class_names.is_none());
    }

    #[test]
    fn quoted_fields_keep_commas() {
        assert_eq!(parse_csv_row(r#"1,"a,b",2"#), vec!["1", "a,b", "2"]);
        assert_eq!(parse_csv_row(r#""say ""hi""",3"#), vec![r#"say "hi""#, "3"]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(parse_csv(b"1,2,0\n1,1\n", None).is_err());
    }

    #[test]
    fn label_beyond_declared_classes_is_rejected() {
        assert!(parse_csv(b"1,2,5\n1,1,0\n", Some(3)).is_err());
    }
}
