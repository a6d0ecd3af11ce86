// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Layered configuration of an experiment.
//!
//! Values are taken from, in increasing priority:
//!  - the defaults of [`SimConfig`],
//!  - an optional TOML file,
//!  - `NOC_` prefixed environment variables (e.g. `NOC_NUM_NODES=16`),
//!  - command-line options ([`ConfigArgs`]).

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use noc_engine::sim_error;
use noc_engine::types::{SimError, SimResult};
use noc_models::config::{NocConfig, RoutingAlgorithm, SelectionAlgorithm};
use serde::{Deserialize, Serialize};

use crate::traffic::TrafficPattern;

const ENV_PREFIX: &str = "NOC_";

/// Everything needed to run one experiment.
///
/// Keys are snake_case, camelCase is accepted too. Unknown keys are
/// rejected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    #[serde(alias = "numNodes")]
    pub num_nodes: usize,
    pub routing: RoutingAlgorithm,
    pub selection: SelectionAlgorithm,
    #[serde(alias = "dataPacketTraffic")]
    pub data_packet_traffic: TrafficPattern,
    #[serde(alias = "antPacketTraffic")]
    pub ant_packet_traffic: TrafficPattern,

    /// Cycles to generate traffic for (0 for no limit).
    #[serde(alias = "maxCycles")]
    pub max_cycles: u64,

    /// Packets to accept before traffic stops (0 for no limit).
    #[serde(alias = "maxPackets")]
    pub max_packets: u64,

    /// Stop as soon as the limits are reached instead of waiting for all
    /// packets in flight to be delivered.
    #[serde(alias = "noDrain")]
    pub no_drain: bool,

    #[serde(alias = "maxInjectionBufferSize")]
    pub max_injection_buffer_size: usize,
    #[serde(alias = "maxInputBufferSize")]
    pub max_input_buffer_size: usize,
    #[serde(alias = "numVirtualChannels")]
    pub num_virtual_channels: usize,
    #[serde(alias = "linkWidth")]
    pub link_width: usize,
    #[serde(alias = "linkDelay")]
    pub link_delay: u64,
    #[serde(alias = "dataPacketSize")]
    pub data_packet_size: usize,
    #[serde(alias = "dataPacketInjectionRate")]
    pub data_packet_injection_rate: f64,
    #[serde(alias = "antPacketSize")]
    pub ant_packet_size: usize,
    #[serde(alias = "antPacketInjectionRate")]
    pub ant_packet_injection_rate: f64,
    #[serde(alias = "acoSelectionAlpha")]
    pub aco_selection_alpha: f64,
    #[serde(alias = "reinforcementFactor")]
    pub reinforcement_factor: f64,
    #[serde(alias = "randSeed")]
    pub rand_seed: u64,

    /// Probability that hotspot traffic targets one of the central nodes.
    #[serde(alias = "hotspotFraction")]
    pub hotspot_fraction: f64,

    /// Cycles without any delivery, while packets are in flight, after which
    /// the network is considered deadlocked.
    #[serde(alias = "deadlockThreshold")]
    pub deadlock_threshold: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let network = NocConfig::default();
        Self {
            num_nodes: network.num_nodes,
            routing: network.routing,
            selection: network.selection,
            data_packet_traffic: TrafficPattern::Uniform,
            ant_packet_traffic: TrafficPattern::Uniform,
            max_cycles: 10000,
            max_packets: 0,
            no_drain: false,
            max_injection_buffer_size: network.max_injection_buffer_size,
            max_input_buffer_size: network.max_input_buffer_size,
            num_virtual_channels: network.num_virtual_channels,
            link_width: network.link_width,
            link_delay: network.link_delay,
            data_packet_size: 16,
            data_packet_injection_rate: 0.01,
            ant_packet_size: network.ant_packet_size,
            ant_packet_injection_rate: 0.01,
            aco_selection_alpha: network.aco_selection_alpha,
            reinforcement_factor: network.reinforcement_factor,
            rand_seed: network.rand_seed,
            hotspot_fraction: 0.5,
            deadlock_threshold: 10000,
        }
    }
}

fn from_figment(e: &figment::Error) -> SimError {
    SimError(format!("Invalid configuration: {e}"))
}

impl SimConfig {
    /// The configuration sources below the command line.
    ///
    /// Missing values take their defaults when extracted. They are not
    /// merged in so that a file may use the camelCase names.
    #[must_use]
    pub fn figment(conf_file: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(conf_file) = conf_file {
            figment = figment.merge(Toml::file(conf_file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load defaults, then the TOML file (if any), then the environment.
    pub fn load(conf_file: Option<&Path>) -> Result<Self, SimError> {
        if let Some(conf_file) = conf_file {
            if !conf_file.exists() {
                return sim_error!(format!(
                    "Configuration file '{}' not found",
                    conf_file.display()
                ));
            }
        }
        Self::figment(conf_file)
            .extract()
            .map_err(|e| from_figment(&e))
    }

    /// The part of the configuration that describes the network itself.
    #[must_use]
    pub fn network_config(&self) -> NocConfig {
        NocConfig {
            num_nodes: self.num_nodes,
            routing: self.routing,
            selection: self.selection,
            max_injection_buffer_size: self.max_injection_buffer_size,
            max_input_buffer_size: self.max_input_buffer_size,
            num_virtual_channels: self.num_virtual_channels,
            link_width: self.link_width,
            link_delay: self.link_delay,
            ant_packet_size: self.ant_packet_size,
            aco_selection_alpha: self.aco_selection_alpha,
            reinforcement_factor: self.reinforcement_factor,
            rand_seed: self.rand_seed,
        }
    }

    pub fn validate(&self) -> SimResult {
        if self.max_cycles == 0 && self.max_packets == 0 {
            return sim_error!("At least one of max cycles or max packets must be set");
        }
        for (name, value) in [
            ("data packet injection rate", self.data_packet_injection_rate),
            ("ant packet injection rate", self.ant_packet_injection_rate),
            ("hotspot fraction", self.hotspot_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return sim_error!(format!("The {name} must be between 0 and 1 ({value})"));
            }
        }
        if self.deadlock_threshold == 0 {
            return sim_error!("Deadlock threshold must be at least 1 cycle");
        }
        self.network_config().validate()
    }
}

/// Command-line overrides of [`SimConfig`] values.
///
/// Only options given on the command line replace the values loaded from
/// the other sources.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// Number of nodes in the mesh (must be a perfect square).
    #[arg(long)]
    pub num_nodes: Option<usize>,

    /// Routing policy.
    #[arg(long)]
    pub routing: Option<RoutingAlgorithm>,

    /// Output selection strategy (ignored with xy routing).
    #[arg(long)]
    pub selection: Option<SelectionAlgorithm>,

    /// Destination pattern of data packets.
    #[arg(long)]
    pub data_packet_traffic: Option<TrafficPattern>,

    /// Destination pattern of ant packets.
    #[arg(long)]
    pub ant_packet_traffic: Option<TrafficPattern>,

    /// Cycles to run for. Use 0 for no limit.
    #[arg(long)]
    pub max_cycles: Option<u64>,

    /// Packets to inject. Use 0 for no limit.
    #[arg(long)]
    pub max_packets: Option<u64>,

    /// Do not wait for packets in flight once the limits are reached.
    #[arg(long)]
    pub no_drain: bool,

    /// Packets each injection buffer can hold.
    #[arg(long)]
    pub max_injection_buffer_size: Option<usize>,

    /// Flits each input virtual channel can hold.
    #[arg(long)]
    pub max_input_buffer_size: Option<usize>,

    /// Virtual channels per port.
    #[arg(long)]
    pub num_virtual_channels: Option<usize>,

    /// Bytes per flit.
    #[arg(long)]
    pub link_width: Option<usize>,

    /// Cycles to cross a link.
    #[arg(long)]
    pub link_delay: Option<u64>,

    /// Bytes per data packet.
    #[arg(long)]
    pub data_packet_size: Option<usize>,

    /// Probability of each node injecting a data packet each cycle.
    #[arg(long)]
    pub data_packet_injection_rate: Option<f64>,

    /// Bytes per ant packet.
    #[arg(long)]
    pub ant_packet_size: Option<usize>,

    /// Probability of each node injecting a forward ant each cycle.
    #[arg(long)]
    pub ant_packet_injection_rate: Option<f64>,

    /// Weight of buffer occupancy in ant colony selection.
    #[arg(long)]
    pub aco_selection_alpha: Option<f64>,

    /// Pheromone added by each backward ant.
    #[arg(long)]
    pub reinforcement_factor: Option<f64>,

    /// Seed of the random number generator.
    #[arg(long)]
    pub rand_seed: Option<u64>,

    /// Probability that hotspot traffic targets a central node.
    #[arg(long)]
    pub hotspot_fraction: Option<f64>,

    /// Cycles without progress before a deadlock is reported.
    #[arg(long)]
    pub deadlock_threshold: Option<u64>,
}

macro_rules! override_fields {
    ($args:expr, $config:expr ; $($field:ident),+) => {
        $(
            if let Some(value) = $args.$field.clone() {
                $config.$field = value;
            }
        )+
    };
}

impl ConfigArgs {
    /// Replace the values of `config` given on the command line.
    pub fn apply(&self, config: &mut SimConfig) {
        override_fields!(self, config ;
            num_nodes, routing, selection, data_packet_traffic, ant_packet_traffic,
            max_cycles, max_packets, max_injection_buffer_size, max_input_buffer_size,
            num_virtual_channels, link_width, link_delay, data_packet_size,
            data_packet_injection_rate, ant_packet_size, ant_packet_injection_rate,
            aco_selection_alpha, reinforcement_factor, rand_seed, hotspot_fraction,
            deadlock_threshold
        );
        if self.no_drain {
            config.no_drain = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network_config(), NocConfig::default());
    }

    #[test]
    fn needs_a_limit() {
        let config = SimConfig {
            max_cycles: 0,
            max_packets: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SimConfig {
            max_cycles: 0,
            max_packets: 100,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rates_are_probabilities() {
        let config = SimConfig {
            data_packet_injection_rate: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn command_line_overrides() {
        let cli = TestCli::parse_from([
            "test",
            "--num-nodes",
            "16",
            "--routing",
            "xy",
            "--selection",
            "bufferLevel",
            "--data-packet-traffic",
            "transpose",
            "--no-drain",
        ]);
        let mut config = SimConfig::default();
        cli.config.apply(&mut config);

        assert_eq!(config.num_nodes, 16);
        assert_eq!(config.routing, RoutingAlgorithm::Xy);
        assert_eq!(config.selection, SelectionAlgorithm::BufferLevel);
        assert_eq!(config.data_packet_traffic, TrafficPattern::Transpose);
        assert!(config.no_drain);
        // Untouched values keep their defaults
        assert_eq!(config.max_cycles, 10000);
        assert_eq!(config.ant_packet_traffic, TrafficPattern::Uniform);
    }

    #[test]
    fn unknown_values_rejected() {
        assert!(TestCli::try_parse_from(["test", "--routing", "west-first"]).is_err());
        assert!(TestCli::try_parse_from(["test", "--data-packet-traffic", "bitrev"]).is_err());
    }
}
