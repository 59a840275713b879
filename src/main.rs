// Command-line entry point: render, session and sample subcommands

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use dualplot::compiler::build_chart_from_names;
use dualplot::config::RenderConfig;
use dualplot::crosshair::CrosshairCoordinator;
use dualplot::csv_reader;
use dualplot::dataset::Dataset;
use dualplot::graph;
use dualplot::logging;
use dualplot::provider::{CsvProvider, DataProvider, SampleProvider};
use dualplot::session::Session;

const SELECTION_NOTICE: &str = "Please select metrics for all axes.";

#[derive(Parser, Debug)]
#[command(name = "dualplot")]
#[command(
    about = "Compare time series on dual-y-axis charts with a linked crosshair",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one or more comparison charts to PNG
    Render(RenderArgs),
    /// Apply selection, hover and save events from a script
    Session(SessionArgs),
    /// Write the generated sample dataset as CSV
    Sample(DataArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    #[arg(
        short = 'i',
        long = "input",
        help = "CSV file with a date column first ('-' for stdin); sample data if omitted"
    )]
    input: Option<PathBuf>,

    #[arg(long = "days", default_value = "100", help = "Number of days of sample data")]
    days: usize,

    #[arg(long = "seed", help = "Seed for reproducible sample data")]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    data: DataArgs,

    #[arg(
        short = 'c',
        long = "chart",
        help = "Chart as PRIMARY:SECONDARY, each a comma-separated series list (repeatable)"
    )]
    charts: Vec<String>,

    #[arg(short = 't', long = "title", help = "Chart title, in --chart order (repeatable)")]
    titles: Vec<String>,

    #[arg(long = "hover", help = "Show the linked crosshair at this date")]
    hover: Option<String>,

    #[arg(long = "width", default_value = "800", help = "Width of each chart in pixels")]
    width: u32,

    #[arg(long = "height", default_value = "250", help = "Height of each chart in pixels")]
    height: u32,

    #[arg(long = "columns", default_value = "1", help = "Charts per row")]
    columns: usize,

    #[arg(short = 'o', long = "output", help = "Write the PNG here instead of stdout")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SessionArgs {
    #[command(flatten)]
    data: DataArgs,

    #[arg(
        short = 's',
        long = "script",
        help = "Event script (one event per line); stdin if omitted"
    )]
    script: Option<PathBuf>,

    #[arg(long = "slots", default_value = "2", help = "Number of comparison charts")]
    slots: usize,
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Session(args) => run_session(args),
        Commands::Sample(args) => run_sample(args),
    }
}

fn load_dataset(args: &DataArgs) -> Result<Dataset> {
    let provider: Box<dyn DataProvider> = match &args.input {
        Some(path) => Box::new(CsvProvider { path: path.clone() }),
        None => Box::new(SampleProvider::new(args.days, args.seed)),
    };
    provider.get_dataset().context("Failed to load dataset")
}

/// Split `A,B:C` into its primary and secondary series lists.
fn parse_chart_arg(arg: &str) -> Result<(Vec<String>, Vec<String>)> {
    let (primary, secondary) = arg
        .split_once(':')
        .ok_or_else(|| anyhow!("Chart '{}' must look like PRIMARY:SECONDARY", arg))?;
    let split = |list: &str| -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    Ok((split(primary), split(secondary)))
}

fn run_render(args: RenderArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;

    let chart_args = if args.charts.is_empty() {
        vec!["Metric1:Metric2".to_string(), "Metric3:Metric4".to_string()]
    } else {
        args.charts.clone()
    };

    let mut crosshair = CrosshairCoordinator::new();
    let group = crosshair.create_group();

    // 1. Build every chart, suppressing those with an empty axis
    let mut charts = Vec::new();
    for (i, chart_arg) in chart_args.iter().enumerate() {
        let (primary, secondary) = parse_chart_arg(chart_arg)?;
        let title = args.titles.get(i).map(String::as_str);
        match build_chart_from_names(title, &dataset, &primary, &secondary, group) {
            Ok(chart) => charts.push(chart),
            Err(e) if e.is_selection_required() => {
                warn!(chart = %chart_arg, "chart suppressed: {}", e);
                eprintln!("{}", SELECTION_NOTICE);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to build chart '{}'", chart_arg))
            }
        }
    }
    if charts.is_empty() {
        bail!("No chart to render: {}", SELECTION_NOTICE);
    }

    // 2. Link the crosshair and position it if requested
    crosshair.link_group(&charts, &dataset)?;
    let active = match &args.hover {
        Some(date) => {
            let at = csv_reader::parse_date(date)
                .ok_or_else(|| anyhow!("Invalid --hover date '{}'", date))?;
            Some(crosshair.pointer_moved(charts[0].id, at)?.index)
        }
        None => None,
    };

    // 3. Draw
    let config = RenderConfig {
        width: args.width,
        height: args.height,
        columns: args.columns,
        ..RenderConfig::comparison()
    };
    let png_bytes = graph::render_grid(&charts, &dataset, &config, active)
        .context("Failed to generate chart")?;
    info!(charts = charts.len(), "rendered");

    match &args.output {
        Some(path) => std::fs::write(path, &png_bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&png_bytes)
                .context("Failed to write PNG to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn run_session(args: SessionArgs) -> Result<()> {
    if args.slots == 0 {
        bail!("A session needs at least one slot");
    }
    if args.script.is_none() && matches!(&args.data.input, Some(p) if p.as_os_str() == "-") {
        bail!("stdin cannot carry both the dataset and the event script");
    }

    let dataset = load_dataset(&args.data)?;
    let mut session = Session::new(dataset, args.slots);
    info!(slots = args.slots, rows = session.dataset().len(), "session started");

    let stdout = io::stdout();
    let out = stdout.lock();
    match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            session.run(BufReader::new(file), out)
        }
        None => session.run(io::stdin().lock(), out),
    }
}

fn run_sample(args: DataArgs) -> Result<()> {
    let dataset = load_dataset(&args)?;
    let stdout = io::stdout();
    csv_reader::write_dataset(&dataset, stdout.lock()).context("Failed to write CSV to stdout")
}
