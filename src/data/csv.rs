//! CSV ingestion and export
//!
//! Expects a header row. The label column is selected by name, or defaults to
//! the last column. Feature cells that are empty or one of the conventional
//! missing-value markers parse to NaN and are left for the imputation step.

use crate::core::{PipelineError, Result};
use crate::data::Dataset;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Markers treated as a missing feature value (case-insensitive)
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "?"];

fn parse_feature(field: &str, column: &str, line: usize) -> Result<f64> {
    let trimmed = field.trim();
    if MISSING_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| {
        PipelineError::ParseError(format!(
            "invalid value for feature '{column}' on data row {line}: '{trimmed}'"
        ))
    })
}

impl Dataset {
    /// Load a dataset from a CSV file
    pub fn from_csv_path<P: AsRef<Path>>(path: P, label: Option<&str>) -> Result<Self> {
        let file = File::open(path).map_err(PipelineError::IoError)?;
        Self::from_csv_reader(file, label)
    }

    /// Load a dataset from any reader producing CSV with a header row
    pub fn from_csv_reader<R: Read>(reader: R, label: Option<&str>) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.len() < 2 {
            return Err(PipelineError::InvalidDataset(
                "need at least one feature column and one label column".to_string(),
            ));
        }

        let label_idx = match label {
            Some(name) => headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| PipelineError::UnknownLabelColumn(name.to_string()))?,
            None => headers.len() - 1,
        };
        let label_name = headers[label_idx].clone();
        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != label_idx)
            .map(|(_, h)| h.clone())
            .collect();

        let mut classes: Vec<String> = Vec::new();
        let mut class_ids: HashMap<String, usize> = HashMap::new();
        let mut features: Vec<Vec<f64>> = Vec::new();
        let mut labels: Vec<usize> = Vec::new();

        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(PipelineError::ParseError(format!(
                    "data row {} has {} fields, expected {}",
                    line + 1,
                    record.len(),
                    headers.len()
                )));
            }

            let mut row = Vec::with_capacity(feature_names.len());
            let mut feature_col = 0;
            for (i, field) in record.iter().enumerate() {
                if i == label_idx {
                    continue;
                }
                row.push(parse_feature(field, &feature_names[feature_col], line + 1)?);
                feature_col += 1;
            }

            let class_name = record[label_idx].trim().to_string();
            if class_name.is_empty() {
                return Err(PipelineError::ParseError(format!(
                    "missing label on data row {}",
                    line + 1
                )));
            }
            let id = *class_ids.entry(class_name.clone()).or_insert_with(|| {
                classes.push(class_name);
                classes.len() - 1
            });

            features.push(row);
            labels.push(id);
        }

        Dataset::new(feature_names, classes, features, labels)
            .map(|d| d.with_label_name(label_name))
    }

    /// Write the dataset back out as CSV (missing values become empty cells)
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = self.feature_names().iter().map(|s| s.as_str()).collect();
        header.push(self.label_name());
        csv_writer
            .write_record(&header)
            .map_err(PipelineError::CsvError)?;

        for i in 0..self.len() {
            let mut record: Vec<String> = self
                .row(i)
                .iter()
                .map(|v| if v.is_nan() { String::new() } else { v.to_string() })
                .collect();
            record.push(self.classes()[self.label(i)].clone());
            csv_writer
                .write_record(&record)
                .map_err(PipelineError::CsvError)?;
        }
        csv_writer.flush().map_err(PipelineError::IoError)?;
        Ok(())
    }

    /// Write the dataset to a CSV file
    pub fn to_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(PipelineError::IoError)?;
        self.to_csv_writer(file)
    }
}
