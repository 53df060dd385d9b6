use std::process;

use anyhow::Result;
use clap::Parser;
use genre_classifier::cli::TrainCli;
use genre_classifier::training::Trainer;

fn main() {
    let cli = TrainCli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &TrainCli) -> Result<()> {
    let config = cli.app_config()?;
    println!("Dataset: {:?}", config.dataset_root);
    println!("Genres:  {}", config.genres.join(", "));

    let report = Trainer::new(config).run()?;
    println!(
        "Trained on {} of {} files ({} held out, {} skipped)",
        report.train_rows, report.rows, report.test_rows, report.skipped
    );
    Ok(())
}
