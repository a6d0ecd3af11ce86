// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use noc_models::config::SelectionAlgorithm;
use noc_sim::config::SimConfig;
use noc_sim::sweep::run_sweep;
use noc_track::builder::TrackerConfig;

fn config() -> SimConfig {
    SimConfig {
        num_nodes: 16,
        max_cycles: 300,
        selection: SelectionAlgorithm::BufferLevel,
        ..Default::default()
    }
}

fn quiet() -> TrackerConfig {
    TrackerConfig {
        enable: false,
        ..Default::default()
    }
}

#[test]
fn results_in_rate_order() {
    let rates = [0.01, 0.05, 0.1];
    let results = run_sweep(&config(), &quiet(), &rates);
    assert_eq!(results.len(), 3);

    let mut last_received = 0;
    for (result, rate) in results.iter().zip(rates) {
        approx::assert_relative_eq!(result.data_packet_injection_rate, rate);
        let statistics = result.statistics.as_ref().unwrap();
        assert_eq!(
            statistics["numPacketsReceived"],
            statistics["numPacketsTransmitted"]
        );
        let received: u64 = statistics["numPacketsReceived"].parse().unwrap();
        assert!(received > last_received);
        last_received = received;
    }
}

#[test]
fn matches_a_single_run() {
    let first = run_sweep(&config(), &quiet(), &[0.05]);
    let second = run_sweep(&config(), &quiet(), &[0.01, 0.05]);
    assert_eq!(
        first[0].statistics.as_ref().unwrap(),
        second[1].statistics.as_ref().unwrap()
    );
}

#[test]
fn failures_are_per_experiment() {
    let config = SimConfig {
        deadlock_threshold: 1,
        ..config()
    };
    let results = run_sweep(&config, &quiet(), &[0.0, 0.05]);
    assert!(results[0].statistics.is_ok());
    assert!(results[1].statistics.is_err());
}

#[test]
fn log_files_per_experiment() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("noc.log");
    let tracker_config = TrackerConfig {
        enable: true,
        level: log::Level::Info,
        file: Some(log.to_string_lossy().to_string()),
        ..Default::default()
    };
    let results = run_sweep(&config(), &tracker_config, &[0.01, 0.02]);
    assert!(results.iter().all(|result| result.statistics.is_ok()));
    for index in 0..2 {
        let path = dir.path().join(format!("noc.log.{index}"));
        assert!(std::fs::read_to_string(path).unwrap().contains("Finished"));
    }
}
