use anyhow::{Context, Result};
use chartspec::{build_from_input, validate, ChartInput};
use clap::Parser;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chartspec")]
#[command(about = "Build chart options from an execution result and chart config", long_about = None)]
struct Args {
    /// Request file ({"result", "config", "drillableItems"}); stdin when omitted
    file: Option<PathBuf>,

    /// Print the data validation result instead of the chart options
    #[arg(long)]
    validate: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read request from stdin")?;
            Ok(buffer)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let raw = read_input(args.file.as_ref())?;
    let input = ChartInput::parse(&raw)?;

    let options = build_from_input(&input).context("Failed to build chart options")?;

    let json = if args.validate {
        let limits = input.config.limits.clone().unwrap_or_default();
        let result = validate(&options, &limits);
        if args.pretty {
            serde_json::to_string_pretty(&result)
        } else {
            serde_json::to_string(&result)
        }
    } else if args.pretty {
        serde_json::to_string_pretty(&options)
    } else {
        serde_json::to_string(&options)
    }
    .context("Failed to serialize output")?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
