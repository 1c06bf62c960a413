//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use clap::{App, Arg};
use holo_sim::config::{self, Config, LoggingFmtStyle};
use holo_sim::network::Simulator;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

fn init_tracing(config: &config::Logging) {
    // Enable logging to stdout.
    let stdout = config.stdout.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(config.stdout.fmt.show_source)
            .with_line_number(config.stdout.fmt.show_source)
            .with_ansi(config.stdout.fmt.colors);
        let layer = match config.stdout.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("holo=debug".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout)
        .init();
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Holo multi-topology link-state simulator")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .required(true)
                .help("Topology and simulation configuration file."),
        )
        .arg(
            Arg::with_name("time")
                .short("t")
                .long("time")
                .value_name("secs")
                .help("Override the simulated time."),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("Print the path tables as JSON when done."),
        )
        .get_matches();

    // Read configuration file.
    let config_file = matches.value_of("config").unwrap();
    let config = match Config::load(config_file) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}: {config_file}");
            std::process::exit(1);
        }
    };
    let duration = match matches.value_of("time") {
        Some(time) => match time.parse::<u64>() {
            Ok(time) => time,
            Err(error) => {
                eprintln!("invalid simulated time: {error}");
                std::process::exit(1);
            }
        },
        None => config.simulation.duration,
    };

    // Initialize tracing.
    init_tracing(&config.logging);

    let mut sim = match Simulator::new(&config) {
        Ok(sim) => sim,
        Err(error) => {
            error.log();
            error!("failed to build the simulated network");
            std::process::exit(1);
        }
    };

    info!(%duration, "starting simulation");
    sim.run_until(Duration::from_secs(duration));
    info!(stats = ?sim.stats(), "simulation finished");

    if matches.is_present("json") {
        let output = serde_json::json!({
            "time": sim.now().as_secs_f64(),
            "stats": sim.stats(),
            "paths": sim.path_tables(),
        });
        match serde_json::to_string_pretty(&output) {
            Ok(output) => println!("{output}"),
            Err(error) => {
                error!(%error, "failed to serialize path tables");
                std::process::exit(1);
            }
        }
    }
}
