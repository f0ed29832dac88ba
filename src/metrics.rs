//! Classification metrics: accuracy, confusion matrix, ROC curves and AUC

use crate::core::{PipelineError, Result};
use std::fmt;

/// Fraction of predictions matching the truth
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> Result<f64> {
    if truth.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    if truth.len() != predicted.len() {
        return Err(PipelineError::InvalidDataset(format!(
            "{} truth labels but {} predictions",
            truth.len(),
            predicted.len()
        )));
    }
    let correct = truth
        .iter()
        .zip(predicted.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Confusion matrix with rows as truth and columns as prediction
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Tally a confusion matrix from parallel truth/prediction vectors
    pub fn from_predictions(
        classes: &[String],
        truth: &[usize],
        predicted: &[usize],
    ) -> Result<Self> {
        if truth.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if truth.len() != predicted.len() {
            return Err(PipelineError::InvalidDataset(format!(
                "{} truth labels but {} predictions",
                truth.len(),
                predicted.len()
            )));
        }
        let k = classes.len();
        let mut counts = vec![vec![0usize; k]; k];
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            if t >= k || p >= k {
                return Err(PipelineError::InvalidDataset(format!(
                    "label id out of range for {k} classes"
                )));
            }
            counts[t][p] += 1;
        }
        Ok(Self {
            classes: classes.to_vec(),
            counts,
        })
    }

    /// Class names
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Raw counts, counts[truth][prediction]
    pub fn counts(&self) -> &[Vec<usize>] {
        &self.counts
    }

    /// Total number of scored samples
    pub fn total(&self) -> usize {
        self.counts.iter().map(|r| r.iter().sum::<usize>()).sum()
    }

    /// Overall accuracy
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let diag: usize = (0..self.classes.len()).map(|i| self.counts[i][i]).sum();
        diag as f64 / total as f64
    }

    /// Per-class precision: tp / predicted-as-class, 0 when never predicted
    pub fn precision(&self, class: usize) -> f64 {
        let predicted: usize = self.counts.iter().map(|row| row[class]).sum();
        if predicted == 0 {
            0.0
        } else {
            self.counts[class][class] as f64 / predicted as f64
        }
    }

    /// Per-class recall: tp / actual-class, 0 when the class is absent
    pub fn recall(&self, class: usize) -> f64 {
        let actual: usize = self.counts[class].iter().sum();
        if actual == 0 {
            0.0
        } else {
            self.counts[class][class] as f64 / actual as f64
        }
    }

    /// Per-class F1 score
    pub fn f1(&self, class: usize) -> f64 {
        let p = self.precision(class);
        let r = self.recall(class);
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.len())
            .chain(std::iter::once(9))
            .max()
            .unwrap_or(9)
            + 2;

        write!(f, "{:>width$}", "truth\\pred")?;
        for class in &self.classes {
            write!(f, "{class:>width$}")?;
        }
        writeln!(f)?;

        for (i, class) in self.classes.iter().enumerate() {
            write!(f, "{class:>width$}")?;
            for &count in &self.counts[i] {
                write!(f, "{count:>width$}")?;
            }
            writeln!(f)?;
        }

        write!(f, "accuracy: {:.4}", self.accuracy())
    }
}

/// One operating point on a ROC curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    pub threshold: f64,
    pub fpr: f64,
    pub tpr: f64,
}

/// Binary ROC curve over a score sweep
#[derive(Debug, Clone)]
pub struct RocCurve {
    points: Vec<RocPoint>,
}

impl RocCurve {
    /// Build a ROC curve for a binary problem from positive-class scores.
    ///
    /// Sweeps a threshold through every distinct score; a sample is called
    /// positive when its score is at or above the threshold.
    pub fn binary(truth: &[bool], scores: &[f64]) -> Result<Self> {
        if truth.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if truth.len() != scores.len() {
            return Err(PipelineError::InvalidDataset(format!(
                "{} truth labels but {} scores",
                truth.len(),
                scores.len()
            )));
        }
        let n_pos = truth.iter().filter(|&&t| t).count();
        let n_neg = truth.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(PipelineError::InvalidDataset(
                "ROC curve needs both positive and negative samples".to_string(),
            ));
        }

        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut points = vec![RocPoint {
            threshold: f64::INFINITY,
            fpr: 0.0,
            tpr: 0.0,
        }];
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut i = 0;
        while i < order.len() {
            let threshold = scores[order[i]];
            // consume all samples tied at this score
            while i < order.len() && scores[order[i]] == threshold {
                if truth[order[i]] {
                    tp += 1;
                } else {
                    fp += 1;
                }
                i += 1;
            }
            points.push(RocPoint {
                threshold,
                fpr: fp as f64 / n_neg as f64,
                tpr: tp as f64 / n_pos as f64,
            });
        }

        Ok(Self { points })
    }

    /// Curve points ordered from (0, 0) to (1, 1)
    pub fn points(&self) -> &[RocPoint] {
        &self.points
    }

    /// Area under the curve by trapezoid rule
    pub fn auc(&self) -> f64 {
        let mut area = 0.0;
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            area += (b.fpr - a.fpr) * (a.tpr + b.tpr) / 2.0;
        }
        area
    }
}

/// Macro-averaged one-vs-rest ROC AUC for a multiclass problem.
///
/// `scores[i]` holds per-class scores for sample i. Classes with no positive
/// or no negative samples are skipped; errors if every class is degenerate.
pub fn roc_auc(truth: &[usize], scores: &[Vec<f64>]) -> Result<f64> {
    if truth.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }
    if truth.len() != scores.len() {
        return Err(PipelineError::InvalidDataset(format!(
            "{} truth labels but {} score rows",
            truth.len(),
            scores.len()
        )));
    }
    let n_classes = scores[0].len();

    let mut total = 0.0;
    let mut counted = 0usize;
    for class in 0..n_classes {
        let binary: Vec<bool> = truth.iter().map(|&t| t == class).collect();
        let class_scores: Vec<f64> = scores.iter().map(|s| s[class]).collect();
        match RocCurve::binary(&binary, &class_scores) {
            Ok(curve) => {
                total += curve.auc();
                counted += 1;
            }
            Err(_) => continue,
        }
    }

    if counted == 0 {
        return Err(PipelineError::InvalidDataset(
            "no class had both positive and negative samples".to_string(),
        ));
    }
    Ok(total / counted as f64)
}
