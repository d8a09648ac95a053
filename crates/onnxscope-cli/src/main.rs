mod cli;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use onnxscope_core::{ModelLoader, ModelLocation};
use onnxscope_introspect::{check_model, make_spatial_dims_dynamic, DefaultShapeInference};
use onnxscope_loader::{read_model_lossless, write_model, OnnxLoader};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log);

    match cli.command {
        Command::Check { model } => check(&model),
        Command::MakeDynamic { model, output } => make_dynamic(&model, output),
    }
}

fn init_logging(log: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn check(raw: &str) -> Result<()> {
    let location = ModelLocation::parse(raw)?;
    let loader = OnnxLoader::new();
    tracing::info!(%location, loader = loader.name(), "checking model");

    let mut graph = loader.load(&location)?;
    let report = check_model(&mut graph, &DefaultShapeInference::new())?;
    print!("{report}");
    Ok(())
}

fn make_dynamic(path: &Path, output: Option<PathBuf>) -> Result<()> {
    let mut model = read_model_lossless(path)?;
    for update in make_spatial_dims_dynamic(&mut model)? {
        println!("{update}");
    }

    if let Some(output) = output {
        write_model(&output, &model)?;
        println!("Wrote updated model to: {}", output.display());
    }
    Ok(())
}
