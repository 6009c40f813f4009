use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trifem::analysis::Model;
use trifem::config::AnalysisConfig;
use trifem::input::ModelInput;
use trifem::observer::TracingObserver;
use trifem::{report, Result};

/// Linear static analysis with constant-strain plane-stress triangles
#[derive(Parser, Debug)]
#[command(name = "trifem", version, about)]
struct Cli {
    /// STAP-style input file
    input: PathBuf,

    /// Writes the text report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Writes displacements and stresses as json
    #[arg(long)]
    json: Option<PathBuf>,

    /// Json file with analysis settings
    #[arg(short, long)]
    config: Option<String>,

    /// Shows progress bars while assembling and recovering stresses
    #[arg(long)]
    progress: bool,

    /// Raises the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::read(path)?,
        None => AnalysisConfig::default(),
    };
    config.show_progress |= cli.progress;

    let input = ModelInput::read(&cli.input)?;
    tracing::info!(heading = input.heading.as_str(), "read input");

    let mut model = Model::new(input, &config)?;
    let results = model.run(&config, &TracingObserver)?;

    let text = report::text_report(&model, &results)?;
    match &cli.output {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{text}"),
    }

    if let Some(path) = &cli.json {
        std::fs::write(path, report::json_results(&model, &results).pretty(4))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
