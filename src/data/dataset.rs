//! Owned tabular dataset: numeric feature matrix plus a categorical label column

use crate::core::{PipelineError, Result, Sample};

/// Labeled tabular dataset.
///
/// Rows are samples, columns are numeric features. Missing feature values are
/// stored as NaN until an imputation step fills them in. Labels are class ids
/// into an insertion-ordered class table, so class names survive round trips
/// through splitting and preprocessing.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    label_name: String,
    classes: Vec<String>,
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl Dataset {
    /// Create a dataset from parts, validating shape invariants
    pub fn new(
        feature_names: Vec<String>,
        classes: Vec<String>,
        features: Vec<Vec<f64>>,
        labels: Vec<usize>,
    ) -> Result<Self> {
        if features.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if features.len() != labels.len() {
            return Err(PipelineError::InvalidDataset(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        let dim = feature_names.len();
        for (i, row) in features.iter().enumerate() {
            if row.len() != dim {
                return Err(PipelineError::DimensionMismatch {
                    expected: dim,
                    actual: row.len(),
                });
            }
            if labels[i] >= classes.len() {
                return Err(PipelineError::InvalidDataset(format!(
                    "label id {} out of range for {} classes",
                    labels[i],
                    classes.len()
                )));
            }
        }
        Ok(Self {
            feature_names,
            label_name: "class".to_string(),
            classes,
            features,
            labels,
        })
    }

    /// Set the label column name (kept for CSV round trips)
    pub fn with_label_name(mut self, name: impl Into<String>) -> Self {
        self.label_name = name.into();
        self
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Feature column names
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Label column name
    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    /// Class names, indexed by class id
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Feature row by index
    pub fn row(&self, i: usize) -> &[f64] {
        &self.features[i]
    }

    /// All feature rows
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Class id for a sample
    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }

    /// All class ids
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Clone a sample out of the table
    pub fn sample(&self, i: usize) -> Sample {
        Sample::new(self.features[i].clone(), self.labels[i])
    }

    /// Per-class sample counts
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    /// True if any feature cell is missing
    pub fn has_missing(&self) -> bool {
        self.features
            .iter()
            .any(|row| row.iter().any(|v| v.is_nan()))
    }

    /// Select rows by index, keeping the class table intact
    pub fn subset(&self, indices: &[usize]) -> Result<Self> {
        if indices.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        let features = indices.iter().map(|&i| self.features[i].clone()).collect();
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        Ok(Self {
            feature_names: self.feature_names.clone(),
            label_name: self.label_name.clone(),
            classes: self.classes.clone(),
            features,
            labels,
        })
    }

    /// Rebuild with transformed feature columns (same rows, labels, classes).
    /// Used by fitted recipes, which may drop columns.
    pub fn with_features(&self, feature_names: Vec<String>, features: Vec<Vec<f64>>) -> Result<Self> {
        if features.len() != self.labels.len() {
            return Err(PipelineError::InvalidDataset(format!(
                "transformed row count {} does not match label count {}",
                features.len(),
                self.labels.len()
            )));
        }
        let dim = feature_names.len();
        if let Some(bad) = features.iter().find(|row| row.len() != dim) {
            return Err(PipelineError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        Ok(Self {
            feature_names,
            label_name: self.label_name.clone(),
            classes: self.classes.clone(),
            features,
            labels: self.labels.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Dataset {
        Dataset::new(
            vec!["a".into(), "b".into()],
            vec!["red".into(), "white".into()],
            vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            vec![0, 1, 0],
        )
        .unwrap()
    }

    #[test]
    fn test_dataset_accessors() {
        let d = toy();
        assert_eq!(d.len(), 3);
        assert_eq!(d.n_features(), 2);
        assert_eq!(d.n_classes(), 2);
        assert_eq!(d.row(1), &[3.0, 4.0]);
        assert_eq!(d.label(2), 0);
        assert_eq!(d.class_counts(), vec![2, 1]);
        assert!(!d.has_missing());
    }

    #[test]
    fn test_dataset_shape_validation() {
        let result = Dataset::new(
            vec!["a".into()],
            vec!["x".into()],
            vec![vec![1.0, 2.0]],
            vec![0],
        );
        assert!(matches!(
            result,
            Err(PipelineError::DimensionMismatch { expected: 1, actual: 2 })
        ));
    }

    #[test]
    fn test_dataset_label_out_of_range() {
        let result = Dataset::new(
            vec!["a".into()],
            vec!["x".into()],
            vec![vec![1.0]],
            vec![1],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_dataset_empty() {
        let result = Dataset::new(vec!["a".into()], vec!["x".into()], vec![], vec![]);
        assert!(matches!(result, Err(PipelineError::EmptyDataset)));
    }

    #[test]
    fn test_subset() {
        let d = toy();
        let s = d.subset(&[0, 2]).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.labels(), &[0, 0]);
        assert_eq!(s.classes(), d.classes());
    }

    #[test]
    fn test_subset_empty() {
        let d = toy();
        assert!(d.subset(&[]).is_err());
    }

    #[test]
    fn test_with_features_drops_columns() {
        let d = toy();
        let t = d
            .with_features(vec!["a".into()], vec![vec![1.0], vec![3.0], vec![5.0]])
            .unwrap();
        assert_eq!(t.n_features(), 1);
        assert_eq!(t.labels(), d.labels());
    }

    #[test]
    fn test_missing_detection() {
        let d = Dataset::new(
            vec!["a".into()],
            vec!["x".into()],
            vec![vec![f64::NAN], vec![1.0]],
            vec![0, 0],
        )
        .unwrap();
        assert!(d.has_missing());
    }
}
