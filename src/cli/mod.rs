//! behav-clf command-line interface
//!
//! Training and classification entry points over a project directory.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::evaluation::EvaluationBundle;
use crate::model::{classify_behaviours, train_behaviours, BehaviorModel, ClassifyConfig, TrainingResult};
use crate::training::ClassifierType;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn bad(s: &str) -> ColoredString    { s.truecolor(230, 110, 110) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("    {} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "behav-clf")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and run per-frame behaviour classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train the classifier for one behaviour
    Train {
        /// Project directory
        #[arg(short, long)]
        proj_dir: PathBuf,

        /// Behaviour name, as scored in the label tables
        #[arg(short, long)]
        behaviour: String,

        /// Classifier variant (Mlp, MlpDeep, RandomForest, or "all");
        /// defaults to the model's configured variant
        #[arg(short, long)]
        clf: Option<String>,
    },

    /// Train every scored behaviour of a project
    TrainAll {
        /// Project directory
        #[arg(short, long)]
        proj_dir: PathBuf,
    },

    /// Classify one experiment's features with the configured models
    Classify {
        /// Feature table of the experiment
        #[arg(short, long)]
        features: PathBuf,

        /// Output prediction table
        #[arg(short, long)]
        out: PathBuf,

        /// Classification config (JSON list of models)
        #[arg(short, long)]
        config: PathBuf,

        /// Overwrite the output if it exists
        #[arg(long)]
        overwrite: bool,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(proj_dir: &Path, behaviour: &str, clf: Option<&str>) -> anyhow::Result<()> {
    section(&format!("Train {}", behaviour));

    let mut model = BehaviorModel::new(proj_dir, behaviour)?;
    let results = match clf {
        Some(name) if name.eq_ignore_ascii_case("all") => {
            step_run("Training all classifier variants");
            let start = Instant::now();
            let results = model.train_all_variants()?;
            step_done(&format!("{:?}", start.elapsed()));
            results
        }
        Some(name) => {
            let clf_type: ClassifierType = name.parse()?;
            step_run(&format!("Training {}", clf_type.name().cyan()));
            let start = Instant::now();
            let result = model.train_variant(clf_type)?;
            step_done(&format!("{:?}", start.elapsed()));
            vec![result]
        }
        None => {
            step_run(&format!("Training {}", model.config().clf_struct.name().cyan()));
            let start = Instant::now();
            let result = model.train()?;
            step_done(&format!("{:?}", start.elapsed()));
            vec![result]
        }
    };

    for result in &results {
        print_result(result);
    }
    println!();
    Ok(())
}

pub fn cmd_train_all(proj_dir: &Path) -> anyhow::Result<()> {
    section("Train all behaviours");

    step_run("Training behaviour models");
    let start = Instant::now();
    let outcome = train_behaviours(proj_dir)?;
    step_done(&format!("{:?}", start.elapsed()));

    for (behaviour, result) in &outcome.trained {
        println!("  {} {}", ok("✓"), behaviour);
        print_result(result);
    }
    for (behaviour, err) in &outcome.failed {
        println!("  {} {} {}", bad("✗"), behaviour, dim(&err.to_string()));
    }
    println!();

    if !outcome.is_success() {
        anyhow::bail!("{} of {} behaviours failed", outcome.failed.len(), outcome.failed.len() + outcome.trained.len());
    }
    Ok(())
}

pub fn cmd_classify(features: &Path, out: &Path, config: &Path, overwrite: bool) -> anyhow::Result<()> {
    section("Classify");

    let config = ClassifyConfig::load(config)?;
    step_run(&format!("Running {} models", config.models.len()));
    let start = Instant::now();
    let outcome = classify_behaviours(features, out, &config, overwrite)?;
    step_done(&format!("{:?}", start.elapsed()));

    for line in outcome.lines() {
        println!("    {}", dim(line));
    }
    println!();
    Ok(())
}

fn print_result(result: &TrainingResult) {
    println!();
    println!("  {}", result.clf_type.name().white().bold());
    if let Some(last) = result.history.last() {
        kv("final loss", &format!("{:.4}", last.loss));
    }
    print_bundle(&result.train);
    print_bundle(&result.test);
}

fn print_bundle(bundle: &EvaluationBundle) {
    let report = &bundle.report;
    kv(
        &format!("{:<5}", bundle.split),
        &format!(
            "accuracy {:.3}  precision {:.3}  recall {:.3}  f1 {:.3}  (pcutoff {:.2})",
            report.accuracy, report.behav.precision, report.behav.recall, report.behav.f1_score, bundle.pcutoff
        ),
    );
}
