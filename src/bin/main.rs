//! Varietal Command Line Interface
//!
//! A command-line interface for splitting, tuning, training, evaluating, and
//! using SVM classification models on labeled CSV data.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;
use varietal::core::{PipelineError, Result};
use varietal::data::{Dataset, StratifiedSplit};
use varietal::model::SvmSpec;
use varietal::persistence::SavedModel;
use varietal::recipe::Recipe;
use varietal::resample::VfoldCv;
use varietal::tune::{tune_grid, ParamGrid, TuneMetric};
use varietal::workflow::{Evaluation, FittedWorkflow, Workflow};

#[derive(Parser)]
#[command(name = "varietal")]
#[command(about = "SVM classification pipeline for labeled tabular data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a labeled CSV into stratified train and test files
    Split(SplitArgs),
    /// Grid-search hyperparameters by repeated cross-validation
    Tune(TuneArgs),
    /// Train a model with fixed hyperparameters
    Train(TrainArgs),
    /// Evaluate a saved model on labeled test data
    Evaluate(EvaluateArgs),
    /// Predict classes for unlabeled or labeled data
    Predict(PredictArgs),
    /// Display saved model information
    Info(InfoArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Labeled CSV file
    #[arg(long)]
    data: PathBuf,

    /// Label column name (defaults to the last column)
    #[arg(long)]
    label: Option<String>,

    /// Output file for the training partition
    #[arg(long)]
    train_output: PathBuf,

    /// Output file for the test partition
    #[arg(long)]
    test_output: PathBuf,

    /// Fraction of each class kept for training
    #[arg(long, default_value = "0.75")]
    proportion: f64,

    /// Shuffle seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Args)]
struct TuneArgs {
    /// Labeled CSV file
    #[arg(long)]
    data: PathBuf,

    /// Label column name (defaults to the last column)
    #[arg(long)]
    label: Option<String>,

    /// Fraction of each class kept for training before tuning
    #[arg(long, default_value = "0.75")]
    proportion: f64,

    /// Values per hyperparameter in the regular grid
    #[arg(long, default_value = "3")]
    grid_levels: usize,

    /// Number of cross-validation folds
    #[arg(long, default_value = "5")]
    folds: usize,

    /// Number of cross-validation repeats
    #[arg(long, default_value = "5")]
    repeats: usize,

    /// Metric used to pick the winning candidate
    #[arg(long, default_value = "roc-auc")]
    metric: CliMetric,

    /// Shuffle seed for the split and the resampler
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Neighbors for KNN imputation
    #[arg(long, default_value = "5")]
    knn_impute: usize,

    /// Save the finalized model to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct TrainArgs {
    /// Training data CSV file
    #[arg(long)]
    data: PathBuf,

    /// Label column name (defaults to the last column)
    #[arg(long)]
    label: Option<String>,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Kernel function
    #[arg(long, default_value = "rbf")]
    kernel: CliKernel,

    /// Soft-margin cost parameter
    #[arg(long, default_value = "1.0")]
    cost: f64,

    /// RBF gamma (defaults to 1 / n_features)
    #[arg(long)]
    gamma: Option<f64>,

    /// Solver convergence tolerance
    #[arg(long, default_value = "0.001")]
    tolerance: f64,

    /// Maximum solver iterations
    #[arg(long, default_value = "10000")]
    max_iterations: usize,

    /// Neighbors for KNN imputation
    #[arg(long, default_value = "5")]
    knn_impute: usize,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Saved model file
    #[arg(short, long)]
    model: PathBuf,

    /// Labeled test data CSV file
    #[arg(long)]
    data: PathBuf,

    /// Label column name (defaults to the last column)
    #[arg(long)]
    label: Option<String>,

    /// Write per-class ROC curve points to this CSV file
    #[arg(long)]
    roc_output: Option<PathBuf>,
}

#[derive(Args)]
struct PredictArgs {
    /// Saved model file
    #[arg(short, long)]
    model: PathBuf,

    /// Data CSV file (label column ignored if present)
    #[arg(long)]
    data: PathBuf,

    /// Label column name to skip (defaults to the last column)
    #[arg(long)]
    label: Option<String>,

    /// Output CSV file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include per-class scores in the output
    #[arg(long)]
    scores: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Saved model file
    #[arg(short, long)]
    model: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    #[value(name = "rbf")]
    Rbf,
    #[value(name = "linear")]
    Linear,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliMetric {
    #[value(name = "accuracy")]
    Accuracy,
    #[value(name = "roc-auc")]
    RocAuc,
}

impl From<CliMetric> for TuneMetric {
    fn from(metric: CliMetric) -> Self {
        match metric {
            CliMetric::Accuracy => TuneMetric::Accuracy,
            CliMetric::RocAuc => TuneMetric::RocAuc,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Split(args) => split_command(args),
        Commands::Tune(args) => tune_command(args),
        Commands::Train(args) => train_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn default_recipe(knn_impute: usize) -> Recipe {
    Recipe::new()
        .step_impute_knn(knn_impute)
        .step_nzv()
        .step_normalize()
}

fn split_command(args: SplitArgs) -> Result<()> {
    let data = Dataset::from_csv_path(&args.data, args.label.as_deref())?;
    info!(
        "loaded {} rows, {} features, {} classes",
        data.len(),
        data.n_features(),
        data.n_classes()
    );

    let (train, test) = StratifiedSplit::new(args.proportion)?
        .with_seed(args.seed)
        .split(&data)?;

    train.to_csv_path(&args.train_output)?;
    test.to_csv_path(&args.test_output)?;

    println!(
        "wrote {} training rows to {} and {} test rows to {}",
        train.len(),
        args.train_output.display(),
        test.len(),
        args.test_output.display()
    );
    Ok(())
}

fn tune_command(args: TuneArgs) -> Result<()> {
    let data = Dataset::from_csv_path(&args.data, args.label.as_deref())?;
    info!(
        "loaded {} rows, {} features, {} classes",
        data.len(),
        data.n_features(),
        data.n_classes()
    );

    let (train, test) = StratifiedSplit::new(args.proportion)?
        .with_seed(args.seed)
        .split(&data)?;

    let recipe = default_recipe(args.knn_impute);
    let spec = SvmSpec::rbf();
    let grid = ParamGrid::regular(args.grid_levels)?;
    let cv = VfoldCv::new(args.folds)?
        .with_repeats(args.repeats)?
        .with_seed(args.seed);

    let results = tune_grid(&train, &recipe, &spec, &grid, &cv)?;

    let metric: TuneMetric = args.metric.into();
    println!(
        "{:<40} {:>10} {:>10} {:>10} {:>10}",
        "candidate", "accuracy", "(se)", "roc_auc", "(se)"
    );
    for candidate in results.rank(metric) {
        println!(
            "{:<40} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
            candidate.params.to_string(),
            candidate.accuracy.mean,
            candidate.accuracy.std_err,
            candidate.roc_auc.mean,
            candidate.roc_auc.std_err
        );
    }

    let best = results.select_best(metric)?;
    println!("\nbest by {}: {}", metric.name(), best.params);

    // Finalize: refit on the full training partition, score on the test set.
    let workflow = Workflow::new(recipe, spec).with_params(best.params);
    let fitted = workflow.fit(&train)?;
    let eval = fitted.evaluate(&test)?;
    print_evaluation(&eval);

    if let Some(path) = args.output {
        SavedModel::from_workflow(&fitted).save_to_file(&path)?;
        println!("saved finalized model to {}", path.display());
    }
    Ok(())
}

fn train_command(args: TrainArgs) -> Result<()> {
    let data = Dataset::from_csv_path(&args.data, args.label.as_deref())?;
    info!(
        "loaded {} rows, {} features, {} classes",
        data.len(),
        data.n_features(),
        data.n_classes()
    );

    let mut spec = match args.kernel {
        CliKernel::Rbf => SvmSpec::rbf(),
        CliKernel::Linear => SvmSpec::linear(),
    };
    spec = spec
        .with_cost(args.cost)
        .with_tolerance(args.tolerance)
        .with_max_iterations(args.max_iterations);
    if let Some(gamma) = args.gamma {
        spec = spec.with_gamma(gamma);
    }

    let workflow = Workflow::new(default_recipe(args.knn_impute), spec);
    let fitted = workflow.fit(&data)?;

    SavedModel::from_workflow(&fitted).save_to_file(&args.output)?;
    println!(
        "trained on {} rows ({} support vectors), saved to {}",
        data.len(),
        fitted.model().n_support_vectors(),
        args.output.display()
    );
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    let fitted = load_workflow(&args.model)?;
    let data = Dataset::from_csv_path(&args.data, args.label.as_deref())?;

    let eval = fitted.evaluate(&data)?;
    print_evaluation(&eval);

    if let Some(path) = args.roc_output {
        write_roc_csv(&path, &eval)?;
        println!("wrote ROC curve points to {}", path.display());
    }
    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    let fitted = load_workflow(&args.model)?;
    let data = Dataset::from_csv_path(&args.data, args.label.as_deref())?;
    let predictions = fitted.predict(&data)?;

    let mut writer: csv::Writer<Box<dyn std::io::Write>> = match &args.output {
        Some(path) => csv::Writer::from_writer(Box::new(std::fs::File::create(path)?)),
        None => csv::Writer::from_writer(Box::new(std::io::stdout())),
    };

    let mut header = vec!["prediction".to_string()];
    if args.scores {
        header.extend(fitted.classes().iter().map(|c| format!("score_{c}")));
    }
    writer.write_record(&header)?;

    for prediction in &predictions {
        let mut record = vec![fitted.classes()[prediction.class].clone()];
        if args.scores {
            record.extend(prediction.scores.iter().map(|s| format!("{s:.6}")));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    if let Some(path) = args.output {
        println!(
            "wrote {} predictions to {}",
            predictions.len(),
            path.display()
        );
    }
    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    let saved = SavedModel::load_from_file(&args.model)?;
    println!("{}", saved.summary());
    Ok(())
}

fn load_workflow(path: &Path) -> Result<FittedWorkflow> {
    SavedModel::load_from_file(path)?.into_workflow()
}

fn print_evaluation(eval: &Evaluation) {
    println!("\ntest accuracy: {:.4}", eval.accuracy);
    println!("test ROC AUC:  {:.4}", eval.roc_auc);
    println!("\n{}", eval.confusion);
    for (class, curve) in &eval.roc_curves {
        println!("ROC AUC ({class}): {:.4}", curve.auc());
    }
}

fn write_roc_csv(path: &Path, eval: &Evaluation) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::fs::File::create(path)?);
    writer.write_record(["class", "threshold", "fpr", "tpr"])?;
    for (class, curve) in &eval.roc_curves {
        for point in curve.points() {
            writer.write_record([
                class.as_str(),
                &format!("{}", point.threshold),
                &format!("{}", point.fpr),
                &format!("{}", point.tpr),
            ])?;
        }
    }
    writer.flush().map_err(PipelineError::IoError)?;
    Ok(())
}
