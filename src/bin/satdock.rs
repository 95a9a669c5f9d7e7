use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use colored::*;
use satdock::config::MAX_PREDICTION_HORIZON;
use satdock::loader::{load_spec_catalog, load_telemetry};
use satdock::report::{ConsoleReporter, OutputFormat};
use satdock::{FleetConfig, FleetController, TickReporter};
use std::time::Duration;
use tokio::time;
use tracing::{error, info, Level};

const DEFAULT_PACE_MS: &str = "1000";
const DEFAULT_DRAIN_TICKS: &str = "0";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input_args = || {
        vec![
            Arg::with_name("static")
                .long("static")
                .value_name("FILE")
                .help("Static satellite specifications (JSON object keyed by id)")
                .takes_value(true)
                .required(true),
            Arg::with_name("telemetry")
                .long("telemetry")
                .value_name("FILE")
                .help("Telemetry readings in arrival order (JSON array)")
                .takes_value(true)
                .required(true),
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Fleet configuration (JSON, missing fields take defaults)")
                .takes_value(true),
        ]
    };

    let matches = App::new("satdock")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🛰️  Satellite Dock Scheduler - predictive energy alerts and single-dock charging")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable debug logging")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("run")
                .about("🚀 Run the docking simulation over a telemetry file")
                .args(&input_args())
                .arg(
                    Arg::with_name("batch-size")
                        .long("batch-size")
                        .value_name("N")
                        .help("Readings merged per tick")
                        .takes_value(true)
                        .validator(|v| match v.parse::<usize>() {
                            Ok(n) if n > 0 => Ok(()),
                            _ => Err("Batch size must be a positive integer".into()),
                        }),
                )
                .arg(
                    Arg::with_name("safe-battery")
                        .long("safe-battery")
                        .value_name("FRACTION")
                        .help("Energy fraction at which charging completes")
                        .takes_value(true)
                        .validator(|v| match v.parse::<f64>() {
                            Ok(f) if f > 0.0 && f <= 1.0 => Ok(()),
                            _ => Err("Safe battery fraction must be in (0, 1]".into()),
                        }),
                )
                .arg(
                    Arg::with_name("horizon")
                        .long("horizon")
                        .value_name("TICKS")
                        .help("Failure predictor lookahead")
                        .takes_value(true)
                        .validator(|v| match v.parse::<u32>() {
                            Ok(h) if h <= MAX_PREDICTION_HORIZON => Ok(()),
                            _ => Err(format!(
                                "Horizon must be an integer from 0 to {}",
                                MAX_PREDICTION_HORIZON
                            )),
                        }),
                )
                .arg(
                    Arg::with_name("tick-seconds")
                        .long("tick-seconds")
                        .value_name("SECONDS")
                        .help("Simulated seconds per tick")
                        .takes_value(true)
                        .validator(|v| match v.parse::<f64>() {
                            Ok(f) if f > 0.0 => Ok(()),
                            _ => Err("Tick duration must be a positive number".into()),
                        }),
                )
                .arg(
                    Arg::with_name("pace-ms")
                        .long("pace-ms")
                        .value_name("MS")
                        .help("Wall-clock delay between ticks (0 runs as fast as possible)")
                        .takes_value(true)
                        .default_value(DEFAULT_PACE_MS)
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Pace must be a number of milliseconds".into()),
                        }),
                )
                .arg(
                    Arg::with_name("drain-ticks")
                        .long("drain-ticks")
                        .value_name("TICKS")
                        .help("Extra ticks without telemetry after the input is exhausted")
                        .takes_value(true)
                        .default_value(DEFAULT_DRAIN_TICKS)
                        .validator(|v| match v.parse::<u64>() {
                            Ok(_) => Ok(()),
                            Err(_) => Err("Drain ticks must be a non-negative integer".into()),
                        }),
                )
                .arg(
                    Arg::with_name("format")
                        .short("f")
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format")
                        .takes_value(true)
                        .possible_values(&["table", "compact", "json"])
                        .default_value("table"),
                ),
        )
        .subcommand(
            SubCommand::with_name("validate")
                .about("🔍 Load and validate configuration and input files")
                .args(&input_args()),
        )
        .get_matches();

    let level = if matches.is_present("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match matches.subcommand() {
        ("run", Some(sub)) => handle_run(sub).await,
        ("validate", Some(sub)) => handle_validate(sub),
        _ => Ok(()),
    }
}

fn load_config(matches: &ArgMatches<'_>) -> Result<FleetConfig, Box<dyn std::error::Error>> {
    let mut config = match matches.value_of("config") {
        Some(path) => FleetConfig::from_json_file(path)?,
        None => FleetConfig::default(),
    };

    if let Some(v) = matches.value_of("batch-size") {
        config.batch_size = v.parse()?;
    }
    if let Some(v) = matches.value_of("safe-battery") {
        config.safe_battery_fraction = v.parse()?;
    }
    if let Some(v) = matches.value_of("horizon") {
        config.prediction_horizon = v.parse()?;
    }
    if let Some(v) = matches.value_of("tick-seconds") {
        config.tick_seconds = v.parse()?;
    }

    config.validate()?;
    Ok(config)
}

async fn handle_run(matches: &ArgMatches<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches)?;
    let catalog = load_spec_catalog(matches.value_of("static").unwrap_or_default())?;
    let readings = load_telemetry(matches.value_of("telemetry").unwrap_or_default())?;
    let pace_ms: u64 = matches.value_of("pace-ms").unwrap_or(DEFAULT_PACE_MS).parse()?;
    let drain_ticks: u64 = matches.value_of("drain-ticks").unwrap_or(DEFAULT_DRAIN_TICKS).parse()?;
    let format: OutputFormat = matches.value_of("format").unwrap_or("table").parse()?;

    info!(
        "Loaded {} satellite specs and {} readings (batch size {})",
        catalog.len(),
        readings.len(),
        config.batch_size
    );

    let mut reporter = ConsoleReporter::new(format, config.tick_seconds);
    let batch_size = config.batch_size;
    let mut controller = FleetController::new(config, catalog)?;

    let mut interval = (pace_ms > 0).then(|| time::interval(Duration::from_millis(pace_ms)));
    let batches = readings
        .chunks(batch_size)
        .map(<[_]>::to_vec)
        .chain((0..drain_ticks).map(|_| Vec::new()));

    for batch in batches {
        if let Some(ref mut iv) = interval {
            tokio::select! {
                _ = iv.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping after tick {}", controller.get_state().tick_count);
                    break;
                }
            }
        }

        match controller.process_batch(&batch) {
            Ok(outcome) => reporter.report(&outcome),
            Err(e) => {
                error!("❌ Simulation halted: {}", e);
                return Err(e.into());
            }
        }
    }

    let stats = controller.dock_stats();
    let state = controller.get_state();
    if format != OutputFormat::Json {
        println!("\n{}", "📊 Run Summary".bright_blue().bold());
        println!("Ticks processed:     {}", state.tick_count.to_string().bright_cyan());
        println!("Satellites tracked:  {}", state.satellites_known.to_string().bright_cyan());
        println!("Readings merged:     {}", state.readings_merged.to_string().bright_cyan());
        println!("Readings skipped:    {}", state.readings_skipped.to_string().bright_yellow());
        println!("Dock cycles:         {}", stats.cycles_completed.to_string().bright_green());
        println!("Energy delivered:    {:.1}", stats.energy_delivered);
        let dock = controller.dock_state();
        match (dock.occupant.as_deref(), dock.occupied_since_tick) {
            (Some(id), Some(since)) => println!(
                "Dock:                occupied by {} since tick {}",
                id.bright_white(),
                since
            ),
            (Some(id), None) => println!("Dock:                occupied by {}", id.bright_white()),
            (None, _) => println!("Dock:                {}", "free".bright_green()),
        }
        let grounded: Vec<&str> = controller.grounded().collect();
        if !grounded.is_empty() {
            println!("Grounded:            {}", grounded.join(", ").bright_red());
        }
    }

    Ok(())
}

fn handle_validate(matches: &ArgMatches<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(matches)?;
    let catalog = load_spec_catalog(matches.value_of("static").unwrap_or_default())?;
    let readings = load_telemetry(matches.value_of("telemetry").unwrap_or_default())?;

    let mut unknown: Vec<&str> = readings
        .iter()
        .filter(|r| !catalog.contains_key(&r.id))
        .map(|r| r.id.as_str())
        .collect();
    unknown.sort_unstable();
    unknown.dedup();

    println!("{} {}", "✅".green(), "Configuration valid".bright_green());
    println!(
        "   batch size {}, horizon {}, safe battery {:.2}, tick {}s",
        config.batch_size, config.prediction_horizon, config.safe_battery_fraction, config.tick_seconds
    );
    println!("{} {} satellite specifications", "✅".green(), catalog.len().to_string().bright_cyan());
    println!("{} {} telemetry readings", "✅".green(), readings.len().to_string().bright_cyan());

    if unknown.is_empty() {
        println!("{} every reading has a static specification", "✅".green());
    } else {
        println!(
            "{} readings for ids without a specification will be skipped: {}",
            "⚠️".yellow(),
            unknown.join(", ").bright_yellow()
        );
    }

    Ok(())
}
