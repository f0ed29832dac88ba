//! Repeated stratified V-fold cross-validation
//!
//! Fold assignment is stratified: within each class, shuffled sample indices
//! are dealt round-robin across the folds, so every fold sees roughly the
//! class proportions of the full set. Each repeat reshuffles with its own
//! seeded generator, keeping runs reproducible.

use crate::core::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One analysis/assessment split produced by the resampler
#[derive(Debug, Clone)]
pub struct ResampleSplit {
    /// Repeat this split belongs to (0-based)
    pub repeat: usize,
    /// Fold held out for assessment (0-based)
    pub fold: usize,
    /// Row indices used for fitting
    pub analysis: Vec<usize>,
    /// Row indices held out for scoring
    pub assessment: Vec<usize>,
}

/// Repeated stratified V-fold cross-validation plan
#[derive(Debug, Clone)]
pub struct VfoldCv {
    v: usize,
    repeats: usize,
    seed: u64,
}

impl Default for VfoldCv {
    fn default() -> Self {
        Self {
            v: 5,
            repeats: 5,
            seed: 0,
        }
    }
}

impl VfoldCv {
    /// Create a V-fold plan with a single repeat
    pub fn new(v: usize) -> Result<Self> {
        if v < 2 {
            return Err(PipelineError::InvalidParameter(format!(
                "cross-validation needs at least 2 folds, got {v}"
            )));
        }
        Ok(Self {
            v,
            repeats: 1,
            seed: 0,
        })
    }

    /// Set the number of repeats
    pub fn with_repeats(mut self, repeats: usize) -> Result<Self> {
        if repeats == 0 {
            return Err(PipelineError::InvalidParameter(
                "repeats must be at least 1".to_string(),
            ));
        }
        self.repeats = repeats;
        Ok(self)
    }

    /// Set the shuffle seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of folds
    pub fn v(&self) -> usize {
        self.v
    }

    /// Number of repeats
    pub fn repeats(&self) -> usize {
        self.repeats
    }

    /// Produce all analysis/assessment splits for the given label vector
    pub fn splits(&self, labels: &[usize]) -> Result<Vec<ResampleSplit>> {
        if labels.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if labels.len() < self.v {
            return Err(PipelineError::InvalidDataset(format!(
                "{} samples cannot fill {} folds",
                labels.len(),
                self.v
            )));
        }

        let n_classes = labels.iter().copied().max().map_or(0, |m| m + 1);
        let mut splits = Vec::with_capacity(self.v * self.repeats);

        for repeat in 0..self.repeats {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(repeat as u64));

            // fold id per sample
            let mut assignment = vec![0usize; labels.len()];
            for class in 0..n_classes {
                let mut members: Vec<usize> = labels
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &l)| (l == class).then_some(i))
                    .collect();
                members.shuffle(&mut rng);
                for (pos, &idx) in members.iter().enumerate() {
                    assignment[idx] = pos % self.v;
                }
            }

            for fold in 0..self.v {
                let mut analysis = Vec::new();
                let mut assessment = Vec::new();
                for (i, &f) in assignment.iter().enumerate() {
                    if f == fold {
                        assessment.push(i);
                    } else {
                        analysis.push(i);
                    }
                }
                if assessment.is_empty() || analysis.is_empty() {
                    return Err(PipelineError::InvalidDataset(format!(
                        "fold {fold} of repeat {repeat} has an empty side; use fewer folds"
                    )));
                }
                splits.push(ResampleSplit {
                    repeat,
                    fold,
                    analysis,
                    assessment,
                });
            }
        }

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<usize> {
        // 3 classes, 20 samples each
        let mut labels = Vec::new();
        for class in 0..3 {
            labels.extend(std::iter::repeat(class).take(20));
        }
        labels
    }

    #[test]
    fn test_rejects_degenerate_plans() {
        assert!(VfoldCv::new(1).is_err());
        assert!(VfoldCv::new(5).unwrap().with_repeats(0).is_err());
    }

    #[test]
    fn test_split_count() {
        let cv = VfoldCv::new(5).unwrap().with_repeats(3).unwrap();
        let splits = cv.splits(&labels()).unwrap();
        assert_eq!(splits.len(), 15);
    }

    #[test]
    fn test_each_repeat_covers_every_sample_once() {
        let cv = VfoldCv::default();
        let labels = labels();
        let splits = cv.splits(&labels).unwrap();

        for repeat in 0..cv.repeats() {
            let mut seen = vec![0usize; labels.len()];
            for split in splits.iter().filter(|s| s.repeat == repeat) {
                for &i in &split.assessment {
                    seen[i] += 1;
                }
                assert_eq!(split.analysis.len() + split.assessment.len(), labels.len());
            }
            assert!(seen.iter().all(|&c| c == 1));
        }
    }

    #[test]
    fn test_folds_are_stratified() {
        let cv = VfoldCv::new(5).unwrap();
        let labels = labels();
        let splits = cv.splits(&labels).unwrap();

        // 20 samples per class over 5 folds: exactly 4 per class per fold
        for split in &splits {
            let mut counts = [0usize; 3];
            for &i in &split.assessment {
                counts[labels[i]] += 1;
            }
            assert_eq!(counts, [4, 4, 4]);
        }
    }

    #[test]
    fn test_seed_determinism() {
        let labels = labels();
        let a = VfoldCv::default().with_seed(7).splits(&labels).unwrap();
        let b = VfoldCv::default().with_seed(7).splits(&labels).unwrap();
        let c = VfoldCv::default().with_seed(8).splits(&labels).unwrap();

        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.assessment, y.assessment);
        }
        assert!(a
            .iter()
            .zip(c.iter())
            .any(|(x, y)| x.assessment != y.assessment));
    }

    #[test]
    fn test_repeats_differ() {
        let labels = labels();
        let splits = VfoldCv::default().splits(&labels).unwrap();
        let r0: Vec<_> = splits.iter().filter(|s| s.repeat == 0).collect();
        let r1: Vec<_> = splits.iter().filter(|s| s.repeat == 1).collect();
        assert!(r0
            .iter()
            .zip(r1.iter())
            .any(|(x, y)| x.assessment != y.assessment));
    }

    #[test]
    fn test_too_few_samples() {
        let cv = VfoldCv::new(10).unwrap();
        assert!(cv.splits(&[0, 1, 0]).is_err());
    }
}
