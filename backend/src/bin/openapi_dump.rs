//! Print the OpenAPI document as JSON, to stdout or a file.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use gateway::doc::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Print the gateway OpenAPI document")]
struct Cli {
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("failed to serialize OpenAPI document")?;
    match cli.output {
        Some(path) => std::fs::write(&path, json)
            .wrap_err_with(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
