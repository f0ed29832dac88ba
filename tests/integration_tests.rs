//! End-to-end pipeline tests
//!
//! These tests run the full workflow — CSV ingestion, stratified splitting,
//! preprocessing, tuning, training and evaluation — on a synthetic dataset
//! with the shape of a real chemical-profile table: three classes, a dozen
//! numeric columns, a few missing cells and one near-constant column.

use std::fmt::Write as _;
use varietal::data::{Dataset, StratifiedSplit};
use varietal::model::SvmSpec;
use varietal::persistence::SavedModel;
use varietal::recipe::Recipe;
use varietal::resample::VfoldCv;
use varietal::tune::{tune_grid, ParamGrid, TuneMetric};
use varietal::workflow::Workflow;

const CLASSES: [&str; 3] = ["barolo", "grignolino", "barbera"];
const SAMPLES_PER_CLASS: usize = 30;

/// Synthetic wine-like CSV: three class clusters in a 4-dimensional profile,
/// plus a near-constant column and sporadic missing cells.
fn synthetic_csv() -> String {
    // Cluster centers per class
    let centers = [
        [13.7, 2.0, 16.8, 1050.0],
        [12.3, 1.9, 20.2, 520.0],
        [13.2, 3.3, 21.4, 620.0],
    ];

    let mut csv = String::from("alcohol,malic_acid,alcalinity,proline,dilution,class\n");
    for (c, center) in centers.iter().enumerate() {
        for i in 0..SAMPLES_PER_CLASS {
            // Deterministic jitter, different per row and column.
            let t = i as f64;
            let jitter = |j: usize| ((t * 7.3 + j as f64 * 3.1).sin()) * 0.04;

            for (j, &base) in center.iter().enumerate() {
                let value = base * (1.0 + jitter(j));
                // A few missing cells in the first two columns.
                if j < 2 && i % 11 == 10 - c {
                    csv.push_str("NA,");
                } else {
                    let _ = write!(csv, "{value:.4},");
                }
            }
            // dilution is near-constant: one distinct off value in 90 rows
            let dilution = if c == 0 && i == 0 { 2.9 } else { 2.8 };
            let _ = writeln!(csv, "{dilution},{}", CLASSES[c]);
        }
    }
    csv
}

fn load() -> Dataset {
    Dataset::from_csv_reader(synthetic_csv().as_bytes(), Some("class")).unwrap()
}

fn default_recipe() -> Recipe {
    Recipe::new().step_impute_knn(5).step_nzv().step_normalize()
}

#[test]
fn test_csv_ingestion_shape() {
    let data = load();
    assert_eq!(data.len(), 3 * SAMPLES_PER_CLASS);
    assert_eq!(data.n_features(), 5);
    assert_eq!(data.n_classes(), 3);
    assert_eq!(data.classes(), &CLASSES);
    assert!(data.has_missing());
}

#[test]
fn test_stratified_split_preserves_proportions() {
    let data = load();
    let (train, test) = StratifiedSplit::new(0.75)
        .unwrap()
        .with_seed(42)
        .split(&data)
        .unwrap();

    assert_eq!(train.len() + test.len(), data.len());
    // 30 per class at 0.75: at most one row of rounding slack per class.
    for count in train.class_counts() {
        assert!((22..=23).contains(&count), "train class count {count}");
    }
    for count in test.class_counts() {
        assert!((7..=8).contains(&count), "test class count {count}");
    }
}

#[test]
fn test_recipe_imputes_and_drops_near_constant_column() {
    let data = load();
    let fitted = default_recipe().fit(&data).unwrap();

    // dilution falls to the near-zero-variance filter
    assert!(!fitted.output_features().contains(&"dilution".to_string()));
    assert_eq!(fitted.output_features().len(), 4);

    let transformed = fitted.apply(&data).unwrap();
    assert!(!transformed.has_missing());
}

#[test]
fn test_full_pipeline_accuracy() {
    let data = load();
    let (train, test) = StratifiedSplit::new(0.75)
        .unwrap()
        .with_seed(42)
        .split(&data)
        .unwrap();

    let workflow = Workflow::new(default_recipe(), SvmSpec::rbf().with_cost(4.0));
    let fitted = workflow.fit(&train).unwrap();
    let eval = fitted.evaluate(&test).unwrap();

    // The clusters are widely separated; the pipeline should nail them.
    assert!(eval.accuracy > 0.9, "accuracy {}", eval.accuracy);
    assert!(eval.roc_auc > 0.9, "ROC AUC {}", eval.roc_auc);
    assert_eq!(eval.confusion.total(), test.len());
    assert_eq!(eval.roc_curves.len(), 3);
}

#[test]
fn test_tuning_selects_a_working_candidate() {
    let data = load();
    let (train, test) = StratifiedSplit::new(0.75)
        .unwrap()
        .with_seed(42)
        .split(&data)
        .unwrap();

    let recipe = default_recipe();
    let spec = SvmSpec::rbf();
    // Small custom grid to keep the test fast.
    let grid = ParamGrid::new()
        .with_cost(vec![1.0, 8.0])
        .with_gamma(vec![0.1, 1.0])
        .with_tolerance(vec![1e-3]);
    let cv = VfoldCv::new(3).unwrap().with_seed(7);

    let results = tune_grid(&train, &recipe, &spec, &grid, &cv).unwrap();
    assert_eq!(results.candidates().len(), 4);

    let best = results.select_best(TuneMetric::RocAuc).unwrap();
    assert!(best.roc_auc.mean > 0.9, "best AUC {}", best.roc_auc.mean);

    let fitted = Workflow::new(recipe, spec)
        .with_params(best.params)
        .fit(&train)
        .unwrap();
    let eval = fitted.evaluate(&test).unwrap();
    assert!(eval.accuracy > 0.85, "finalized accuracy {}", eval.accuracy);
}

#[test]
fn test_tuning_is_deterministic() {
    let data = load();
    let recipe = default_recipe();
    let spec = SvmSpec::rbf();
    let grid = ParamGrid::new()
        .with_cost(vec![1.0])
        .with_gamma(vec![0.5])
        .with_tolerance(vec![1e-3]);
    let cv = VfoldCv::new(3).unwrap().with_seed(11);

    let a = tune_grid(&data, &recipe, &spec, &grid, &cv).unwrap();
    let b = tune_grid(&data, &recipe, &spec, &grid, &cv).unwrap();
    assert_eq!(
        a.candidates()[0].accuracy.mean,
        b.candidates()[0].accuracy.mean
    );
    assert_eq!(
        a.candidates()[0].roc_auc.mean,
        b.candidates()[0].roc_auc.mean
    );
}

#[test]
fn test_persistence_round_trip_preserves_predictions() {
    let data = load();
    let fitted = Workflow::new(default_recipe(), SvmSpec::rbf().with_cost(4.0))
        .fit(&data)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    SavedModel::from_workflow(&fitted).save_to_file(&path).unwrap();

    let restored = SavedModel::load_from_file(&path)
        .unwrap()
        .into_workflow()
        .unwrap();

    let a = fitted.predict(&data).unwrap();
    let b = restored.predict(&data).unwrap();
    assert_eq!(a, b);
}
