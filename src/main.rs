//! behav-clf - behaviour classifier entry point

use behav_classifier::cli::{cmd_classify, cmd_train, cmd_train_all, Cli, Commands};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "behav_classifier=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { proj_dir, behaviour, clf } => {
            cmd_train(&proj_dir, &behaviour, clf.as_deref())?;
        }
        Commands::TrainAll { proj_dir } => {
            cmd_train_all(&proj_dir)?;
        }
        Commands::Classify { features, out, config, overwrite } => {
            cmd_classify(&features, &out, &config, overwrite)?;
        }
    }

    Ok(())
}
