// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Run one network under synthetic traffic and collect its statistics.

use std::collections::BTreeMap;
use std::rc::Rc;

use indicatif::ProgressBar;
use noc_engine::sim_error;
use noc_engine::types::{Cycle, SimError, SimResult};
use noc_models::network::Network;
use noc_models::packet::PacketKind;
use noc_track::entity::Entity;
use noc_track::{error, info};

use crate::config::SimConfig;
use crate::traffic::TrafficGenerator;

/// Number of cycles between progress bar updates.
const PROGRESS_CYCLES: u64 = 100;

pub struct Experiment {
    pub entity: Rc<Entity>,
    config: SimConfig,
    network: Network,
    data_traffic: TrafficGenerator,
    ant_traffic: Option<TrafficGenerator>,
    progress_bar: Option<ProgressBar>,

    last_delivery_cycle: Cycle,
    last_num_transmitted: u64,
}

impl Experiment {
    pub fn new(parent: &Rc<Entity>, config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let entity = Rc::new(Entity::new(parent, "experiment"));
        let network = Network::new(&entity, config.network_config())?;
        let mesh = *network.mesh();

        let data_traffic = TrafficGenerator::new(
            &entity,
            PacketKind::Data,
            config.data_packet_traffic,
            config.data_packet_size,
            config.data_packet_injection_rate,
            config.hotspot_fraction,
            &mesh,
        );
        let ant_traffic = network.config().uses_ants().then(|| {
            TrafficGenerator::new(
                &entity,
                PacketKind::ForwardAnt,
                config.ant_packet_traffic,
                config.ant_packet_size,
                config.ant_packet_injection_rate,
                config.hotspot_fraction,
                &mesh,
            )
        });

        Ok(Self {
            entity,
            config,
            network,
            data_traffic,
            ant_traffic,
            progress_bar: None,
            last_delivery_cycle: 0,
            last_num_transmitted: 0,
        })
    }

    /// Show progress towards the cycle (or packet) limit.
    pub fn show_progress(&mut self) {
        let length = if self.config.max_cycles > 0 {
            self.config.max_cycles
        } else {
            self.config.max_packets
        };
        self.progress_bar = Some(ProgressBar::new(length));
    }

    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    fn limit_reached(&self) -> bool {
        let stats = self.network.statistics();
        (self.config.max_cycles > 0 && self.network.current_cycle() >= self.config.max_cycles)
            || (self.config.max_packets > 0
                && stats.num_packets_received() >= self.config.max_packets)
    }

    fn update_progress(&self) {
        let Some(progress_bar) = &self.progress_bar else {
            return;
        };
        let cycle = self.network.current_cycle();
        if cycle % PROGRESS_CYCLES == 0 {
            if self.config.max_cycles > 0 {
                progress_bar.set_position(cycle);
            } else {
                progress_bar.set_position(self.network.statistics().num_packets_received());
            }
        }
    }

    /// Advance the network one cycle and check that it is still delivering
    /// packets.
    fn step(&mut self) -> SimResult {
        self.network.advance_one_cycle()?;

        let cycle = self.network.current_cycle();
        let num_transmitted = self.network.statistics().num_packets_transmitted();
        if num_transmitted != self.last_num_transmitted || self.network.num_in_flight() == 0 {
            self.last_num_transmitted = num_transmitted;
            self.last_delivery_cycle = cycle;
        } else if cycle - self.last_delivery_cycle >= self.config.deadlock_threshold {
            error!(self.entity ; "No packet delivered for {} cycles with {} in flight",
                self.config.deadlock_threshold, self.network.num_in_flight());
            error!(self.entity ; "Deadlock detected at cycle {cycle}");
            return sim_error!("Deadlock");
        }
        Ok(())
    }

    /// Run until the limits are reached, then drain unless disabled.
    ///
    /// Returns the statistics of the network.
    pub fn run(&mut self) -> Result<BTreeMap<String, String>, SimError> {
        info!(self.entity ; "Running {} traffic at rate {} ({} nodes)",
            self.config.data_packet_traffic, self.config.data_packet_injection_rate,
            self.config.num_nodes);

        while !self.limit_reached() {
            self.data_traffic.generate(&mut self.network)?;
            if let Some(ant_traffic) = &mut self.ant_traffic {
                ant_traffic.generate(&mut self.network)?;
            }
            self.step()?;
            self.update_progress();
        }

        if !self.config.no_drain {
            info!(self.entity ; "Draining {} packets at cycle {}",
                self.network.num_in_flight(), self.network.current_cycle());
            while self.network.num_in_flight() > 0 {
                self.step()?;
            }
        }

        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish();
        }

        let stats = self.network.statistics();
        info!(self.entity ; "Finished at cycle {}: {} packets received, {} transmitted, throughput {:.6}, average delay {:.2}",
            self.network.current_cycle(), stats.num_packets_received(),
            stats.num_packets_transmitted(), self.network.throughput(),
            stats.all().delay.average());

        Ok(self.network.statistics_map())
    }
}

#[cfg(test)]
mod tests {
    use noc_engine::test_helpers::start_test;
    use noc_models::config::{RoutingAlgorithm, SelectionAlgorithm};

    use super::*;

    fn small_config() -> SimConfig {
        SimConfig {
            num_nodes: 16,
            max_cycles: 500,
            data_packet_injection_rate: 0.05,
            ..Default::default()
        }
    }

    #[test]
    fn drained_run_delivers_everything() {
        let engine = start_test(file!());
        let mut experiment = Experiment::new(engine.top(), small_config()).unwrap();
        let stats = experiment.run().unwrap();
        assert_eq!(stats["numPacketsReceived"], stats["numPacketsTransmitted"]);
        assert!(stats["simulationCycles"].parse::<u64>().unwrap() >= 500);
        assert_ne!(stats["numPacketsTransmitted::forward-ant"], "0");
    }

    #[test]
    fn no_drain_stops_at_limit() {
        let engine = start_test(file!());
        let config = SimConfig {
            no_drain: true,
            selection: SelectionAlgorithm::Random,
            ..small_config()
        };
        let mut experiment = Experiment::new(engine.top(), config).unwrap();
        let stats = experiment.run().unwrap();
        assert_eq!(stats["simulationCycles"], "500");
        assert_eq!(stats["numPacketsTransmitted::forward-ant"], "0");
    }

    #[test]
    fn packet_limit() {
        let engine = start_test(file!());
        let config = SimConfig {
            routing: RoutingAlgorithm::Xy,
            max_cycles: 0,
            max_packets: 50,
            ..small_config()
        };
        let mut experiment = Experiment::new(engine.top(), config).unwrap();
        let stats = experiment.run().unwrap();
        let received: u64 = stats["numPacketsReceived"].parse().unwrap();
        // The last cycle may create several packets
        assert!((50..50 + 16).contains(&received));
        assert_eq!(stats["numPacketsTransmitted"], stats["numPacketsReceived"]);
    }

    #[test]
    fn stalled_network_reported() {
        let engine = start_test(file!());
        // No packet can cross the mesh in a single cycle
        let config = SimConfig {
            deadlock_threshold: 1,
            ..small_config()
        };
        let mut experiment = Experiment::new(engine.top(), config).unwrap();
        assert_eq!(experiment.run().unwrap_err(), SimError("Deadlock".to_string()));
    }

    #[test]
    fn invalid_configuration() {
        let engine = start_test(file!());
        let config = SimConfig {
            selection: SelectionAlgorithm::Aco,
            num_virtual_channels: 1,
            ..small_config()
        };
        assert!(Experiment::new(engine.top(), config).is_err());
    }
}
