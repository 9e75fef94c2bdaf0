//! gpp-monitor
//!
//! Host utilization sampling and process affinity with tracing logging.
//! This is the main entry point that resolves configuration and dispatches subcommands.

mod cli;
mod commands;
mod config;
mod startup_checks;

use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use cli::{Args, Commands, LogLevel, ReportFormat};
use commands::{
    command_affinity, command_check, command_config, command_interrupts, command_sample,
    AffinityRequest,
};
use config::{effective_log_level, resolve_config, show_config, validate_effective_config, Config};
use gpp_monitor::affinity::get_property_definitions;

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let level = effective_log_level(config);
    let max_level = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Logging initialized with level: {:?}", level);
    Ok(())
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            match validate_effective_config(&config) {
                Ok(_) => {
                    println!("✅ Configuration is valid");
                    return Ok(());
                }
                Err(e) => {
                    eprintln!("❌ Configuration invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }

        show_config(&config, args.config_format.clone())?;
        return Ok(());
    }

    // Generating a config file needs no existing config
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), format.clone(), *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config)?;

    match args.command {
        Some(Commands::Sample { iterations, format }) => {
            command_sample(Some(iterations), format, &config)?;
        }
        Some(Commands::Affinity {
            pid,
            nic,
            socket,
            cpu,
            cpuset,
            cgroup,
            blacklist,
            dry_run,
        }) => {
            let request = AffinityRequest {
                pid,
                nic,
                socket,
                cpu,
                cpuset,
                cgroup,
                blacklist,
                dry_run,
            };
            command_affinity(request, &config)?;
        }
        Some(Commands::Interrupts { iface }) => {
            command_interrupts(&iface, &config)?;
        }
        Some(Commands::Check { proc, sys, all }) => {
            command_check(proc, sys, all, &config)?;
        }
        Some(Commands::Properties) => {
            print!("{}", get_property_definitions());
        }
        Some(Commands::Config { .. }) => {}
        None => {
            info!(
                "Sampling every {}s until interrupted",
                config.interval_seconds()
            );
            command_sample(None, ReportFormat::Yaml, &config)?;
        }
    }

    Ok(())
}
