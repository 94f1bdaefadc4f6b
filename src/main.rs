//! Swagger from Flow - command-line front end.
//!
//! Analyzes a Flow-annotated handler file, or every handler file of a folder, and prints or
//! writes the resulting Swagger 2.0 document.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-flow [OPTIONS] <TARGET>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation using a running Flow server:
//! ```bash
//! swagger-from-flow ./controllers -o swagger.yaml
//! ```
//!
//! Generate JSON without Flow, also writing the graph schema:
//! ```bash
//! swagger-from-flow ./controllers --resolver local -f json -o swagger.json -g graph.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_flow::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Swagger from Flow starting...");

    let args = cli::parse_args_from_parsed(args)?;

    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
