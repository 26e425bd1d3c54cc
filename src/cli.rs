//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{self, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sample_adapter::SampleAdapter;
use crate::adapters::svg_chart_adapter::SvgChartAdapter;
use crate::domain::analysis::{analyze, AnalysisParams, DEFAULT_RANGE};
use crate::domain::config_validation::{
    validate_analysis_config, validate_required_keys, validate_sample_config,
};
use crate::domain::error::StructbreakError;
use crate::domain::order_block::Color;
use crate::domain::sample_data::{generate_sample_bars, SampleConfig};
use crate::ports::annotation_port::AnnotationPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(
    name = "structbreak",
    about = "Structure-break and order-block labeling for OHLC bars"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect structure breaks and render order-block annotations
    Analyze(AnalyzeArgs),
    /// Write synthetic sample bars to a CSV file
    Sample {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// First day, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// Last day (inclusive), YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Bar CSV (timestamp,open,high,low,close); sample data when omitted
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// Structure-low window length
    #[arg(short, long)]
    pub range: Option<usize>,
    /// SVG chart path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub bearish_connectors: bool,
    #[arg(long)]
    pub bullish_connectors: bool,
    /// Write the labeled break table to this CSV
    #[arg(long)]
    pub table: Option<PathBuf>,
    /// Print the labeled break table to stdout
    #[arg(long)]
    pub print_table: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze(args) => run_analyze(&args),
        Command::Sample {
            output,
            config,
            start,
            end,
            seed,
        } => run_sample(
            &output,
            config.as_ref(),
            start.as_deref(),
            end.as_deref(),
            seed,
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Loads the INI file at `path`, or an empty configuration when no path is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    match path {
        None => Ok(FileConfigAdapter::empty()),
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            FileConfigAdapter::from_file(p).map_err(|e| {
                eprintln!("error: {e}");
                ExitCode::from(&e)
            })
        }
    }
}

pub fn build_analysis_params(config: &dyn ConfigPort) -> Result<AnalysisParams, StructbreakError> {
    let defaults = AnalysisParams::default();

    let range = config.get_int("analysis", "range", DEFAULT_RANGE as i64);
    if range < 1 {
        return Err(StructbreakError::ConfigInvalid {
            section: "analysis".into(),
            key: "range".into(),
            reason: "range must be at least 1".into(),
        });
    }

    let color = |key: &str, default: Color| {
        config
            .get_string("analysis", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(Color::new)
            .unwrap_or(default)
    };

    Ok(AnalysisParams {
        range: range as usize,
        show_bearish_connectors: config.get_bool(
            "analysis",
            "show_bearish_connectors",
            defaults.show_bearish_connectors,
        ),
        show_bullish_connectors: config.get_bool(
            "analysis",
            "show_bullish_connectors",
            defaults.show_bullish_connectors,
        ),
        bearish_color: color("bearish_color", defaults.bearish_color),
        bullish_color: color("bullish_color", defaults.bullish_color),
        bearish_line_color: color("bearish_line_color", defaults.bearish_line_color),
        bullish_line_color: color("bullish_line_color", defaults.bullish_line_color),
        bearish_line_width: positive_u32(
            config,
            "analysis",
            "bearish_line_width",
            defaults.bearish_line_width,
        )?,
        bullish_line_width: positive_u32(
            config,
            "analysis",
            "bullish_line_width",
            defaults.bullish_line_width,
        )?,
    })
}

pub fn build_sample_config(config: &dyn ConfigPort) -> Result<SampleConfig, StructbreakError> {
    let defaults = SampleConfig::default();
    let start_date = match config.get_string("sample", "start_date") {
        Some(s) => parse_day(&s, "sample", "start_date")?,
        None => defaults.start_date,
    };
    let end_date = match config.get_string("sample", "end_date") {
        Some(s) => parse_day(&s, "sample", "end_date")?,
        None => defaults.end_date,
    };
    let seed = match config.get_string("sample", "seed") {
        Some(s) => s.trim().parse().map_err(|_| StructbreakError::ConfigInvalid {
            section: "sample".into(),
            key: "seed".into(),
            reason: "seed must be a non-negative integer".into(),
        })?,
        None => defaults.seed,
    };
    Ok(SampleConfig {
        start_date,
        end_date,
        seed,
    })
}

pub fn build_chart_adapter(
    config: &dyn ConfigPort,
    params: &AnalysisParams,
) -> Result<SvgChartAdapter, StructbreakError> {
    let defaults = SvgChartAdapter::default();
    Ok(SvgChartAdapter {
        width: positive_u32(config, "output", "width", defaults.width)?,
        height: positive_u32(config, "output", "height", defaults.height)?,
        bearish_color: params.bearish_color.clone(),
        bullish_color: params.bullish_color.clone(),
    })
}

/// Integer setting in `1..=u32::MAX`; anything outside is rejected rather than clamped.
fn positive_u32(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, StructbreakError> {
    let value = config.get_int(section, key, i64::from(default));
    match u32::try_from(value) {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(StructbreakError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{} must be between 1 and {}, got {}", key, u32::MAX, value),
        }),
    }
}

/// Applies command-line date and seed overrides, then rejects a reversed range.
pub fn apply_sample_overrides(
    mut sample: SampleConfig,
    start: Option<&str>,
    end: Option<&str>,
    seed: Option<u64>,
) -> Result<SampleConfig, StructbreakError> {
    if let Some(value) = start {
        sample.start_date = parse_day(value, "sample", "start_date")?;
    }
    if let Some(value) = end {
        sample.end_date = parse_day(value, "sample", "end_date")?;
    }
    if let Some(seed) = seed {
        sample.seed = seed;
    }
    if sample.start_date > sample.end_date {
        return Err(StructbreakError::ConfigInvalid {
            section: "sample".into(),
            key: "start_date".into(),
            reason: format!(
                "start_date {} must not be after end_date {}",
                sample.start_date, sample.end_date
            ),
        });
    }
    Ok(sample)
}

fn parse_day(value: &str, section: &str, key: &str) -> Result<NaiveDate, StructbreakError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        StructbreakError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: "invalid date format (expected YYYY-MM-DD)".into(),
        }
    })
}

/// CSV path from the command line, then `[data] path`, else the sample generator.
pub fn resolve_data_port(
    input: Option<&PathBuf>,
    config: &dyn ConfigPort,
) -> Result<Box<dyn DataPort>, StructbreakError> {
    if let Some(path) = input {
        return Ok(Box::new(CsvAdapter::new(path.clone())));
    }
    if let Some(path) = config
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
    {
        return Ok(Box::new(CsvAdapter::new(PathBuf::from(path.trim()))));
    }
    Ok(Box::new(SampleAdapter::new(build_sample_config(config)?)))
}

fn run_analyze(args: &AnalyzeArgs) -> ExitCode {
    // Stage 1: Load and validate config
    let config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_analysis_config(&config) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Resolve parameters, command line over config
    let mut params = match build_analysis_params(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if let Some(range) = args.range {
        if range == 0 {
            eprintln!("error: --range must be at least 1");
            return ExitCode::from(2);
        }
        params.range = range;
    }
    params.show_bearish_connectors |= args.bearish_connectors;
    params.show_bullish_connectors |= args.bullish_connectors;

    // Stage 3: Resolve data source and sink
    let data_port = match resolve_data_port(args.input.as_ref(), &config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let chart = match build_chart_adapter(&config, &params) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let chart_path = args
        .output
        .clone()
        .or_else(|| config.get_string("output", "chart").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("chart.svg"));

    run_analysis_pipeline(
        data_port.as_ref(),
        &params,
        &chart,
        &chart_path,
        args.table.as_deref(),
        args.print_table,
    )
}

pub fn run_analysis_pipeline(
    data_port: &dyn DataPort,
    params: &AnalysisParams,
    sink: &dyn AnnotationPort,
    chart_path: &Path,
    table_path: Option<&Path>,
    print_table: bool,
) -> ExitCode {
    // Stage 4: Load bars
    eprintln!("Loading bars from {}", data_port.describe());
    let bars = match data_port.fetch_bars() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 5: Analyze
    eprintln!("Analyzing {} bars (range {})", bars.len(), params.range);
    let analysis = analyze(&bars, params);

    // Stage 6: Console summary
    eprintln!("\n=== Structure Breaks ===");
    eprintln!("Bullish breaks:        {}", analysis.bullish_breaks());
    eprintln!("Bearish breaks:        {}", analysis.bearish_breaks());
    eprintln!("Active bullish blocks: {}", analysis.bullish_blocks.len());
    eprintln!("Bearish blocks:        {}", analysis.bearish_blocks.len());
    eprintln!("Mitigated blocks:      {}", analysis.mitigated_blocks.len());
    eprintln!("Connector lines:       {}", analysis.lines.len());

    if analysis.is_empty() {
        eprintln!("\nNothing to render: no structure breaks detected.");
        return ExitCode::SUCCESS;
    }

    // Stage 7: Tables
    if print_table {
        if let Err(e) = csv_adapter::write_labeled(io::stdout().lock(), &analysis) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    if let Some(path) = table_path {
        let written = std::fs::File::create(path)
            .map_err(StructbreakError::from)
            .and_then(|file| csv_adapter::write_labeled(file, &analysis));
        match written {
            Ok(()) => eprintln!("Table written to: {}", path.display()),
            Err(e) => {
                eprintln!("error: failed to write table: {e}");
                return (&e).into();
            }
        }
    }

    // Stage 8: Annotations
    match sink.render(&analysis, chart_path) {
        Ok(()) => {
            eprintln!("\nChart written to: {}", chart_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_sample(
    output: &Path,
    config_path: Option<&PathBuf>,
    start: Option<&str>,
    end: Option<&str>,
    seed: Option<u64>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let sample = build_sample_config(&config)
        .and_then(|s| apply_sample_overrides(s, start, end, seed));
    let sample = match sample {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let bars = generate_sample_bars(&sample);
    match csv_adapter::write_bars_file(output, &bars) {
        Ok(()) => {
            eprintln!("{} sample bars written to: {}", bars.len(), output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Every check `validate` runs on a standalone config file.
pub fn validate_config(config: &dyn ConfigPort) -> Result<AnalysisParams, StructbreakError> {
    validate_required_keys(config)?;
    validate_analysis_config(config)?;
    validate_sample_config(config)?;
    let params = build_analysis_params(config)?;
    build_chart_adapter(config, &params)?;
    Ok(params)
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(Some(config_path)) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let params = match validate_config(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nAnalysis:");
    eprintln!("  range:                   {}", params.range);
    eprintln!("  show_bearish_connectors: {}", params.show_bearish_connectors);
    eprintln!("  show_bullish_connectors: {}", params.show_bullish_connectors);
    eprintln!("  bearish_color:           {}", params.bearish_color);
    eprintln!("  bullish_color:           {}", params.bullish_color);
    match config.get_string("data", "path") {
        Some(path) => eprintln!("  data:                    {}", path),
        None => eprintln!("  data:                    sample"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
