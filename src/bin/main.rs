//! CLI tool for RAID controller status (raidstat)

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use colored::Colorize;
#[cfg(feature = "cli")]
use raidlib::{
    BrokenDrives, DialectKind, LinePolicy, MonitorConfig, PhysicalDriveRecord, RaidExporter,
    StatusMonitor, StatusSnapshot, VirtualDriveRecord,
};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "raidstat")]
#[command(about = "RAID controller status from MegaCli or mfiutil reports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Controller utility executable
    #[arg(long, global = true)]
    utility_path: Option<PathBuf>,

    /// Number of adapters to query (0..N)
    #[arg(short, long, global = true)]
    adapters: Option<u32>,

    /// Report dialect: key_value (MegaCli) or tabular (mfiutil)
    #[arg(long, global = true)]
    dialect: Option<DialectKind>,

    /// Unparsable report lines: lenient (skip) or strict (fail)
    #[arg(long, global = true)]
    line_policy: Option<LinePolicy>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Query every adapter and print all drives
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print drives that are not healthy
    Broken {
        /// Which drives to report
        #[arg(value_enum, default_value = "all")]
        kind: BrokenKind,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print status in Prometheus text exposition format
    Metrics,
    /// Print controller event logs
    Log,
    /// Print a sample configuration file
    Config,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BrokenKind {
    Volumes,
    Drives,
    All,
}

#[cfg(feature = "cli")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config => print!("{}", MonitorConfig::sample_toml()),
        Commands::Status { format } => {
            let mut monitor = start(&cli)?;
            let snapshot = monitor.refresh()?;
            match format {
                OutputFormat::Json => println!("{}", snapshot.to_json_pretty()?),
                OutputFormat::Text => print_snapshot(snapshot),
            }
        }
        Commands::Broken { kind, format } => {
            let mut broken = start(&cli)?.list_broken()?;
            match kind {
                BrokenKind::Volumes => broken.drives.clear(),
                BrokenKind::Drives => broken.volumes.clear(),
                BrokenKind::All => {}
            }
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&broken)?),
                OutputFormat::Text => print_broken(&broken),
            }
            if !broken.is_empty() {
                std::process::exit(2);
            }
        }
        Commands::Metrics => {
            let mut monitor = start(&cli)?;
            let prefix = monitor.config().metric_prefix.clone();
            let snapshot = monitor.refresh()?;
            let mut exporter = RaidExporter::new(&prefix);
            exporter.collect_snapshot(snapshot);
            print!("{}", exporter.export());
        }
        Commands::Log => {
            for log in start(&cli)?.controller_logs() {
                println!(
                    "{}",
                    format!("═══ Adapter {} ═══", log.adapter_id).cyan().bold()
                );
                println!("{}", log.text);
            }
        }
    }

    Ok(())
}

/// Load configuration, initialise logging and build the monitor.
#[cfg(feature = "cli")]
fn start(cli: &Cli) -> Result<StatusMonitor, Box<dyn std::error::Error>> {
    let config = load_config(cli)?;

    env_logger::Builder::new()
        .filter_level(config.log_level.to_filter())
        .parse_default_env()
        .init();

    Ok(StatusMonitor::new(config)?)
}

/// File values first, then command-line overrides.
#[cfg(feature = "cli")]
fn load_config(cli: &Cli) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::from_toml_file(path)?,
        None => MonitorConfig::default(),
    };

    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
        if cli.utility_path.is_none() && cli.config.is_none() {
            config.utility_path = PathBuf::from(match dialect {
                DialectKind::KeyValue => raidlib::config::MEGACLI_PATH,
                DialectKind::Tabular => raidlib::config::MFIUTIL_PATH,
            });
        }
    }
    if let Some(path) = &cli.utility_path {
        config.utility_path = path.clone();
    }
    if let Some(adapters) = cli.adapters {
        config.adapter_count = adapters;
    }
    if let Some(policy) = cli.line_policy {
        config.line_policy = policy;
    }

    Ok(config)
}

#[cfg(feature = "cli")]
fn print_snapshot(snapshot: &StatusSnapshot) {
    println!(
        "{} {}",
        "Utility:".white().bold(),
        snapshot.utility_path().display()
    );
    for adapter in &snapshot.adapters {
        println!(
            "{}",
            format!("═══ Adapter {} ═══", adapter.adapter_id).cyan().bold()
        );
        println!("  {}", "Virtual Drives".white().bold());
        for vd in &adapter.virtual_drives {
            print_volume(vd);
        }
        println!("  {}", "Physical Drives".white().bold());
        for pd in &adapter.physical_drives {
            print_drive(pd);
        }
    }
}

#[cfg(feature = "cli")]
fn print_broken(broken: &BrokenDrives) {
    if broken.is_empty() {
        println!("{}", "All drives healthy".green());
        return;
    }
    for vd in &broken.volumes {
        print_volume(vd);
    }
    for pd in &broken.drives {
        print_drive(pd);
    }
}

#[cfg(feature = "cli")]
fn print_volume(vd: &VirtualDriveRecord) {
    let state = if vd.is_healthy() {
        vd.state.green()
    } else {
        vd.state.red().bold()
    };
    let name = if vd.name.is_empty() { "-" } else { vd.name.as_str() };
    println!(
        "    VD {:<3} {:<16} {:>12} {:<8} drives={:<3} {}",
        vd.index, name, vd.size, vd.raid_level, vd.number_of_drives, state
    );
}

#[cfg(feature = "cli")]
fn print_drive(pd: &PhysicalDriveRecord) {
    let state = if pd.is_healthy() {
        pd.firmware_state.green()
    } else {
        pd.firmware_state.red().bold()
    };
    let has_errors =
        pd.media_error_count > 0 || pd.other_error_count > 0 || pd.predictive_failure_count > 0;
    let errors = if has_errors {
        format!(
            "errors={}/{}/{}",
            pd.media_error_count, pd.other_error_count, pd.predictive_failure_count
        )
        .yellow()
    } else {
        "errors=0".normal()
    };
    println!(
        "    PD {:>3}:{:<3} dev={:<3} {} {} {} {} temp={} {}",
        pd.enclosure_device_id,
        pd.slot_number,
        pd.device_id,
        pd.brand,
        pd.model,
        pd.serial_number,
        pd.raw_size,
        pd.drive_temperature,
        state
    );
    println!("           {}", errors);
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features not enabled. Please compile with --features cli");
    std::process::exit(1);
}
