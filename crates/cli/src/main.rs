// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use vision_harness_core::{EvalConfig, EvalPlan, ImageFolderDataset};
use vision_harness_formats::ImageCodec;
use vision_harness_models::{backend_name, EvalRunner};

/// vision-harness – image-folder evaluation harness for saved classifiers
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the evaluation entry point against a dataset and saved artifact
    Evaluate {
        /// Path to a YAML config file
        #[arg(short, long)]
        config: std::path::PathBuf,

        /// Save the JSON report to a file instead of stdout
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Validate a config without running it
    Validate {
        /// Path to a YAML config file
        #[arg(short, long)]
        config: std::path::PathBuf,

        /// Convert YAML to JSON and print it
        #[arg(long)]
        to_json: bool,
    },
    /// Print the label set and file count a config resolves to
    Inspect {
        /// Path to a YAML config file
        #[arg(short, long)]
        config: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("vision_harness={}", log_level))
        .init();

    info!("vision-harness v{} starting", env!("CARGO_PKG_VERSION"));

    match args.command {
        Commands::Evaluate { config, output } => run_evaluation(&config, output.as_deref()).await,
        Commands::Validate { config, to_json } => validate_config(&config, to_json).await,
        Commands::Inspect { config } => inspect_dataset(&config).await,
    }
}

async fn run_evaluation(
    config_path: &std::path::Path,
    output_path: Option<&std::path::Path>,
) -> Result<()> {
    info!("Loading config from: {:?}", config_path);

    let plan = load_plan(config_path)?;
    let mut runner = EvalRunner::new(plan);
    let report = runner.run().await.context("Evaluation failed")?;

    let json = serde_json::to_string_pretty(&report)?;
    if let Some(output_file) = output_path {
        std::fs::write(output_file, json)
            .with_context(|| format!("Failed to write report to {:?}", output_file))?;
        eprintln!("✅ Report written to {:?}", output_file);
    } else {
        println!("{}", json);
    }

    Ok(())
}

async fn validate_config(config_path: &std::path::Path, to_json: bool) -> Result<()> {
    info!("Validating config: {:?}", config_path);

    let yaml_content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {:?}", config_path))?;

    if to_json {
        let json_content = vision_harness_core::config::yaml_to_json(&yaml_content)?;
        println!("{}", json_content);
        return Ok(());
    }

    let config = EvalConfig::from_yaml(&yaml_content)?;
    println!("✅ YAML parsing: SUCCESS");
    println!("✅ Data folder: {}", config.dataset.data_folder);
    println!("✅ Backbone: {}", config.model.backbone.name);
    println!("✅ Artifact: {}", config.model.artifact);

    let plan = EvalPlan::from_config(&config)?;
    println!("✅ Plan normalization: SUCCESS");
    println!("  - Extension: {}", plan.extension);
    println!("  - Target size: {}x{}", plan.target.0, plan.target.1);
    println!(
        "  - Shuffle: {}",
        plan.seed.map_or("off".to_string(), |s| format!("seed {}", s))
    );
    println!("  - Parallelism: {}", plan.parallelism);
    println!("  - Batch size: {}", plan.batch_size);
    println!("  - Prefetch: {}", plan.prefetch);
    println!("  - Cache: {}", plan.cache);
    println!("  - Backbone: {} ({})", plan.backbone.kind, plan.backbone.weights);
    println!("  - Trainable: {}", plan.backbone.trainable());
    println!("  - Backend: {}", backend_name());

    println!("🎉 Configuration is valid and ready to run!");

    Ok(())
}

async fn inspect_dataset(config_path: &std::path::Path) -> Result<()> {
    let plan = load_plan(config_path)?;
    let dataset = ImageFolderDataset::from_plan(&plan)
        .with_context(|| format!("Failed to open dataset at {:?}", plan.data_root))?;

    let codec = ImageCodec::from_extension(&plan.extension)?;

    println!("Dataset root: {:?}", plan.data_root);
    println!("Classes ({}):", dataset.num_classes());
    for label in dataset.labels() {
        println!("  - {}", label);
    }
    println!(
        "Files: {} (*.{}, {} codec claims: {})",
        dataset.len(),
        plan.extension,
        codec,
        codec.extensions().join(", ")
    );

    Ok(())
}

fn load_plan(config_path: &std::path::Path) -> Result<EvalPlan> {
    let yaml_content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {:?}", config_path))?;
    let config = EvalConfig::from_yaml(&yaml_content)
        .with_context(|| format!("Failed to parse config from {:?}", config_path))?;
    config.to_plan().context("Failed to normalize config into a plan")
}
