// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Simulate a mesh network-on-chip under synthetic traffic.
//!
//! See `lib.rs` for details.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use noc_engine::engine::Engine;
use noc_engine::types::SimError;
use noc_sim::config::{ConfigArgs, SimConfig};
use noc_sim::experiment::Experiment;
use noc_sim::sweep::run_sweep;
use noc_track::builder::{TrackerConfig, build_tracker};
use noc_track::{error, info};

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Mesh network-on-chip simulator")]
struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,

    /// Write the log to this file instead of the console.
    #[arg(long)]
    log_file: Option<String>,

    /// Show a progress bar towards the cycle (or packet) limit.
    #[arg(long)]
    progress: bool,

    /// TOML file of configuration values. Command-line options take priority.
    #[arg(long)]
    conf_file: Option<PathBuf>,

    /// Run one experiment per data packet injection rate, in parallel.
    #[arg(long, value_delimiter = ',')]
    sweep_injection_rates: Vec<f64>,

    #[command(flatten)]
    config: ConfigArgs,
}

fn tracker_config(args: &Cli) -> TrackerConfig {
    TrackerConfig {
        enable: args.stdout || args.log_file.is_some(),
        level: args.stdout_level,
        filter_regex: args.stdout_filter_regex.clone(),
        file: args.log_file.clone(),
    }
}

fn print_statistics(statistics: &BTreeMap<String, String>) {
    for (key, value) in statistics {
        println!("{key}: {value}");
    }
}

fn main() -> Result<(), SimError> {
    let args = Cli::parse();

    let mut config = SimConfig::load(args.conf_file.as_deref())?;
    args.config.apply(&mut config);
    config.validate()?;

    let tracker_config = tracker_config(&args);

    if !args.sweep_injection_rates.is_empty() {
        let mut result = Ok(());
        for sweep_result in run_sweep(&config, &tracker_config, &args.sweep_injection_rates) {
            println!(
                "# dataPacketInjectionRate: {}",
                sweep_result.data_packet_injection_rate
            );
            match sweep_result.statistics {
                Ok(statistics) => print_statistics(&statistics),
                Err(e) => {
                    println!("{e}");
                    result = Err(e);
                }
            }
        }
        return result;
    }

    let tracker = build_tracker(&tracker_config)?;
    let engine = Engine::new(&tracker);
    let top = engine.top().clone();
    info!(top ; "{} node mesh, {} routing, {} selection",
        config.num_nodes, config.routing, config.network_config().effective_selection());

    let mut experiment = Experiment::new(&top, config)?;
    if args.progress {
        experiment.show_progress();
    }

    let result = experiment.run();
    match &result {
        Ok(statistics) => {
            info!(top ; "Pass (cycle {})", experiment.network().current_cycle());
            print_statistics(statistics);
        }
        Err(e) => error!(top ; "Failed: {e}"),
    }
    tracker.shutdown();
    result.map(|_| ())
}
