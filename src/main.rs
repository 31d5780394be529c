//! Pipeline entry point — CLI wiring around the batch driver and the
//! validation engine.

use std::path::{Path, PathBuf};
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use slp_synth::aggregate::Aggregator;
use slp_synth::batch::{self, BatchResult, RunMode};
use slp_synth::calendar::{HolidayCalendar, Region};
use slp_synth::config::PipelineConfig;
use slp_synth::error::Result;
use slp_synth::io::export;
use slp_synth::io::input;
use slp_synth::profile::industrial::BusinessWindow;
use slp_synth::profile::slp::SlpTable;
use slp_synth::sector::SpatialUnit;
use slp_synth::series::{ReferenceSeries, Resolution, TimeSeries};
use slp_synth::validate;

/// Overall per-unit annual demand assumed for dummy fleets (kWh).
const DUMMY_OVERALL_KWH: f64 = 1e5;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<PathBuf>,
    units_path: Option<PathBuf>,
    dummy_count: Option<usize>,
    seed: u64,
    slp_path: Option<PathBuf>,
    mode_override: Option<String>,
    out_path: Option<PathBuf>,
    reference_path: Option<PathBuf>,
    reference_quarter_hour: bool,
    validation_out: Option<PathBuf>,
}

fn print_help() {
    eprintln!("slp-synth — standard-load-profile demand synthesis and validation");
    eprintln!();
    eprintln!("Usage: slp-synth [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>            Load pipeline config from TOML file");
    eprintln!("  --units <path>             Spatial units CSV (annual consumption per sector)");
    eprintln!("  --dummy <count>            Generate a random dummy fleet instead of --units");
    eprintln!("  --seed <u64>               Dummy fleet seed (default: 42)");
    eprintln!("  --slp <path>               Shape table CSV (default: flat demo shapes)");
    eprintln!("  --mode <name>              Override run mode: timeseries | peak_load");
    eprintln!("  --out <path>               Write batch results to CSV");
    eprintln!("  --reference <path>         Reference demand CSV; enables validation");
    eprintln!("  --reference-quarter-hour   Reference CSV is quarter-hourly (resampled)");
    eprintln!("  --validation-out <path>    Write per-timestamp validation table to CSV");
    eprintln!("  --help                     Show this help message");
    eprintln!();
    eprintln!("One of --units or --dummy is required.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        units_path: None,
        dummy_count: None,
        seed: 42,
        slp_path: None,
        mode_override: None,
        out_path: None,
        reference_path: None,
        reference_quarter_hour: false,
        validation_out: None,
    };

    let mut i = 1;
    let take_value = |args: &[String], i: &mut usize, flag: &str| -> String {
        *i += 1;
        match args.get(*i) {
            Some(v) => v.clone(),
            None => {
                eprintln!("error: {flag} requires a value");
                process::exit(1);
            }
        }
    };

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => cli.config_path = Some(PathBuf::from(take_value(&args, &mut i, "--config"))),
            "--units" => cli.units_path = Some(PathBuf::from(take_value(&args, &mut i, "--units"))),
            "--dummy" => {
                let v = take_value(&args, &mut i, "--dummy");
                match v.parse::<usize>() {
                    Ok(n) if n > 0 => cli.dummy_count = Some(n),
                    _ => {
                        eprintln!("error: --dummy value \"{v}\" is not a positive integer");
                        process::exit(1);
                    }
                }
            }
            "--seed" => {
                let v = take_value(&args, &mut i, "--seed");
                match v.parse::<u64>() {
                    Ok(s) => cli.seed = s,
                    Err(_) => {
                        eprintln!("error: --seed value \"{v}\" is not a valid u64");
                        process::exit(1);
                    }
                }
            }
            "--slp" => cli.slp_path = Some(PathBuf::from(take_value(&args, &mut i, "--slp"))),
            "--mode" => cli.mode_override = Some(take_value(&args, &mut i, "--mode")),
            "--out" => cli.out_path = Some(PathBuf::from(take_value(&args, &mut i, "--out"))),
            "--reference" => {
                cli.reference_path = Some(PathBuf::from(take_value(&args, &mut i, "--reference")));
            }
            "--reference-quarter-hour" => cli.reference_quarter_hour = true,
            "--validation-out" => {
                cli.validation_out = Some(PathBuf::from(take_value(&args, &mut i, "--validation-out")));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.units_path.is_some() && cli.dummy_count.is_some() {
        eprintln!("error: --units and --dummy are mutually exclusive");
        process::exit(1);
    }
    if cli.units_path.is_none() && cli.dummy_count.is_none() {
        eprintln!("error: one of --units or --dummy is required");
        print_help();
        process::exit(1);
    }

    cli
}

/// Sums a batch of composites (and their industrial-free counterparts)
/// across all units for validation against a system-wide reference.
fn fleet_totals(
    units: &[SpatialUnit],
    aggregator: &Aggregator<'_>,
    year: i32,
    target: Resolution,
) -> Result<(TimeSeries, TimeSeries)> {
    let mut total = TimeSeries::zeros(year, target);
    let mut excl = TimeSeries::zeros(year, target);
    for unit in units {
        total.add_assign(&aggregator.composite(unit, target)?)?;
        excl.add_assign(&aggregator.composite_excluding(
            unit,
            Some(slp_synth::sector::Sector::Industrial),
            target,
        )?)?;
    }
    Ok((total, excl))
}

fn run_validation(
    cli: &CliArgs,
    reference_path: &Path,
    units: &[SpatialUnit],
    aggregator: &Aggregator<'_>,
    year: i32,
    target: Resolution,
) -> Result<()> {
    let reference: ReferenceSeries = if cli.reference_quarter_hour {
        input::read_reference_file(reference_path, year, Resolution::QuarterHour)?.resample(target)
    } else {
        input::read_reference_file(reference_path, year, target)?
    };

    let (total, excl) = fleet_totals(units, aggregator, year, target)?;
    let result = validate::validate(&total, &excl, &reference)?;

    let n = result.residual.len() as f64;
    let rmse = (result.residual.values().iter().map(|r| r * r).sum::<f64>() / n).sqrt();
    println!("--- Validation ---");
    println!("Rescale factor:        {:.6}", result.rescale_factor);
    println!("Residual RMSE:         {rmse:.3} kW");
    println!(
        "Industrial estimate:   {:.1} kWh",
        result.industrial_estimate.energy_kwh()
    );

    if let Some(ref path) = cli.validation_out {
        export::export_validation(path, &result)?;
        info!(path = %path.display(), "validation table written");
    }
    Ok(())
}

fn run_pipeline(cli: &CliArgs, config: &PipelineConfig) -> Result<()> {
    let region: Region = config.run.region.parse()?;
    let calendar = HolidayCalendar::for_year(config.run.year, region)?;
    // Validated before this point; defaults are always valid.
    let target = config.target_resolution().unwrap_or(Resolution::Hour);
    let mode = config.mode().unwrap_or(RunMode::Timeseries);
    let native = Resolution::QuarterHour;

    let table = match cli.slp_path {
        Some(ref path) => {
            let file = std::fs::File::open(path)?;
            SlpTable::from_csv_reader(file, native.per_day())?
        }
        None => SlpTable::flat(native.per_day()),
    };

    let units = match (&cli.units_path, cli.dummy_count) {
        (Some(path), _) => input::read_units_file(path)?,
        (None, Some(count)) => SpatialUnit::dummy_fleet(count, DUMMY_OVERALL_KWH, cli.seed),
        (None, None) => unreachable!("checked in parse_args"),
    };
    info!(units = units.len(), year = config.run.year, "pipeline start");

    let window = BusinessWindow::parse(&config.industrial.am, &config.industrial.pm)?;
    let aggregator = Aggregator::new(
        &calendar,
        &table,
        window,
        config.profile_factors(),
        native,
    );

    match (mode, &cli.out_path) {
        (RunMode::Timeseries, Some(path)) => {
            // Streaming export: never holds more than one chunk of series.
            let file = std::fs::File::create(path)?;
            let mut wtr = export::timeseries_writer(std::io::BufWriter::new(file))?;
            batch::run_streaming(
                &units,
                &aggregator,
                target,
                config.run.chunk_size,
                |row| export::write_unit_series(&mut wtr, &row),
            )?;
            wtr.flush().map_err(slp_synth::Error::from)?;
            info!(path = %path.display(), "timeseries written");
        }
        (mode, out) => {
            let result = batch::run(&units, &aggregator, mode, target)?;
            match result {
                BatchResult::PeakLoad(ref rows) => {
                    for row in rows {
                        println!("{}: peak {:.3} kW", row.unit_id, row.peak_kw);
                    }
                    if let Some(path) = out {
                        export::export_peaks(path, rows)?;
                        info!(path = %path.display(), "peak table written");
                    }
                }
                BatchResult::Timeseries(ref rows) => {
                    for row in rows {
                        println!(
                            "{}: {} intervals, {:.1} kWh, peak {:.3} kW",
                            row.unit_id,
                            row.series.len(),
                            row.series.energy_kwh(),
                            row.series.peak_kw()
                        );
                    }
                }
            }
        }
    }

    if let Some(ref path) = cli.reference_path {
        run_validation(cli, path, &units, &aggregator, config.run.year, target)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = parse_args();

    let mut config = match cli.config_path {
        Some(ref path) => match PipelineConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => PipelineConfig::baseline(),
    };

    if let Some(ref mode) = cli.mode_override {
        config.run.mode = mode.clone();
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if let Err(e) = run_pipeline(&cli, &config) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
