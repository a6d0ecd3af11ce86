// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Run the same experiment at several data injection rates in parallel.
//!
//! Models are single threaded and share nothing, so each experiment gets its
//! own OS thread with its own tracker, network and random number generator.

use std::collections::BTreeMap;
use std::thread;

use noc_engine::engine::Engine;
use noc_engine::types::SimError;
use noc_track::builder::{TrackerConfig, build_tracker};

use crate::config::SimConfig;
use crate::experiment::Experiment;

#[derive(Debug)]
pub struct SweepResult {
    pub data_packet_injection_rate: f64,
    pub statistics: Result<BTreeMap<String, String>, SimError>,
}

/// Give each experiment of a sweep its own log file.
fn tracker_config_for(tracker_config: &TrackerConfig, index: usize) -> TrackerConfig {
    TrackerConfig {
        file: tracker_config
            .file
            .as_ref()
            .map(|file| format!("{file}.{index}")),
        ..tracker_config.clone()
    }
}

fn run_one(
    config: SimConfig,
    tracker_config: &TrackerConfig,
) -> Result<BTreeMap<String, String>, SimError> {
    let tracker = build_tracker(tracker_config)?;
    let statistics = {
        let engine = Engine::new(&tracker);
        let mut experiment = Experiment::new(engine.top(), config)?;
        experiment.run()
    };
    tracker.shutdown();
    statistics
}

/// Run `config` once per injection rate and return the results in the order
/// of `rates`.
#[must_use]
pub fn run_sweep(
    config: &SimConfig,
    tracker_config: &TrackerConfig,
    rates: &[f64],
) -> Vec<SweepResult> {
    thread::scope(|scope| {
        let handles: Vec<_> = rates
            .iter()
            .enumerate()
            .map(|(index, rate)| {
                let config = SimConfig {
                    data_packet_injection_rate: *rate,
                    ..config.clone()
                };
                let tracker_config = tracker_config_for(tracker_config, index);
                scope.spawn(move || run_one(config, &tracker_config))
            })
            .collect();

        handles
            .into_iter()
            .zip(rates)
            .map(|(handle, rate)| SweepResult {
                data_packet_injection_rate: *rate,
                statistics: handle.join().unwrap_or_else(|_| {
                    Err(SimError(format!("Experiment at rate {rate} panicked")))
                }),
            })
            .collect()
    })
}
