// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

mod config;
mod conversion;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::ConvertConfig;
use conversion::{Format, Summary};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datapoints-convert")]
#[command(about = "Sensor datapoint converter (base64 / legacy / compact)")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter (e.g. info, datapoints=debug)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a datapoint between representations
    Convert {
        /// Input file ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Input format (auto-detect if not specified)
        #[arg(long, value_enum)]
        from: Option<Format>,

        /// Output format
        #[arg(long, value_enum)]
        to: Option<Format>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show device, grid variant and usage of a datapoint
    Inspect {
        /// Input file ("-" for stdin)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Input format (auto-detect if not specified)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("Invalid log level {:?}", config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            input,
            from,
            to,
            output,
            pretty,
        } => cmd_convert(&config, &input, from, to, output, pretty),
        Commands::Inspect { input, format } => cmd_inspect(&config, &input, format),
    }
}

/// Defaults, then the config file, then command-line flags.
fn load_config(cli: &Cli) -> anyhow::Result<ConvertConfig> {
    let mut builder = ConvertConfig::builder();
    if let Some(path) = &cli.config {
        let file = ConvertConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;
        builder = builder.base(file);
    }
    if let Some(level) = &cli.log_level {
        builder = builder.log_level(level.clone());
    }
    let config = builder.build();
    config.validate()?;
    Ok(config)
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))
    }
}

fn resolve_input_format(
    text: &str,
    flag: Option<Format>,
    config: &ConvertConfig,
) -> anyhow::Result<Format> {
    if let Some(format) = flag.or(config.default_from) {
        return Ok(format);
    }
    let format = Format::detect(text)
        .context("Cannot detect input format. Use --from to specify it.")?;
    tracing::info!("Detected input format: {}", format);
    Ok(format)
}

fn cmd_convert(
    config: &ConvertConfig,
    input: &Path,
    from: Option<Format>,
    to: Option<Format>,
    output: Option<PathBuf>,
    pretty: bool,
) -> anyhow::Result<()> {
    let text = read_input(input)?;
    let from = resolve_input_format(&text, from, config)?;
    let Some(to) = to.or(config.default_to) else {
        anyhow::bail!("No output format. Use --to or set default_to in the config.");
    };

    let dp = conversion::read_datapoint(&text, from)
        .with_context(|| format!("Failed to decode {} input", from))?;
    tracing::info!("Decoded {}", dp);

    let out = conversion::write_datapoint(&dp, to, pretty || config.pretty)
        .with_context(|| format!("Failed to encode {} output", to))?;

    if let Some(out_path) = output {
        std::fs::write(&out_path, &out)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        tracing::info!("Wrote {} to {}", to, out_path.display());
    } else {
        println!("{out}");
    }
    Ok(())
}

fn cmd_inspect(config: &ConvertConfig, input: &Path, format: Option<Format>) -> anyhow::Result<()> {
    let text = read_input(input)?;
    let format = resolve_input_format(&text, format, config)?;
    let dp = conversion::read_datapoint(&text, format)
        .with_context(|| format!("Failed to decode {} input", format))?;
    println!("{}", Summary::of(&dp));
    Ok(())
}
