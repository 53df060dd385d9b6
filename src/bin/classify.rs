use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use genre_classifier::cli::ClassifyCli;
use genre_classifier::inference::Predictor;

fn main() {
    let cli = ClassifyCli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &ClassifyCli) -> Result<()> {
    let config = cli.app_config()?;
    let predictor = Predictor::load(&config.model_path, &config.features)
        .with_context(|| format!("failed to load model {:?}", config.model_path))?;

    for outcome in predictor.classify(&cli.files) {
        println!("{outcome}");
    }
    Ok(())
}
