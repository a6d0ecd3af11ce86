// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Configuration of the network model.

use std::fmt;

use noc_engine::sim_error;
use noc_engine::types::SimResult;
use serde::{Deserialize, Serialize};

/// Which routing policy the mesh uses.
#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingAlgorithm {
    /// Dimension order routing: all X hops before any Y hop.
    Xy,

    /// Adaptive minimal routing restricted by the odd-even turn model.
    #[default]
    #[value(alias = "oddEven")]
    #[serde(alias = "oddEven")]
    OddEven,
}

impl fmt::Display for RoutingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RoutingAlgorithm::Xy => write!(f, "xy"),
            RoutingAlgorithm::OddEven => write!(f, "odd-even"),
        }
    }
}

/// How a node picks one output among the legal routing directions.
#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionAlgorithm {
    /// Uniform random choice.
    Random,

    /// Prefer the neighbour with the most free input buffer slots.
    #[value(alias = "bufferLevel")]
    #[serde(alias = "bufferLevel")]
    BufferLevel,

    /// Buffer level with one extra hop of look-ahead.
    #[value(alias = "neighborOnPath")]
    #[serde(alias = "neighborOnPath")]
    NeighborOnPath,

    /// Ant colony optimisation using a learnt pheromone table.
    #[default]
    Aco,
}

impl fmt::Display for SelectionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectionAlgorithm::Random => write!(f, "random"),
            SelectionAlgorithm::BufferLevel => write!(f, "buffer-level"),
            SelectionAlgorithm::NeighborOnPath => write!(f, "neighbor-on-path"),
            SelectionAlgorithm::Aco => write!(f, "aco"),
        }
    }
}

/// Configuration structure for a network
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NocConfig {
    /// Number of nodes in the mesh (must be a perfect square)
    pub num_nodes: usize,

    /// Routing policy shared by all nodes
    pub routing: RoutingAlgorithm,

    /// Selection strategy used by every node
    pub selection: SelectionAlgorithm,

    /// Number of packets each injection buffer can hold
    pub max_injection_buffer_size: usize,

    /// Number of flits each input virtual channel can hold
    pub max_input_buffer_size: usize,

    /// Number of virtual channels per physical port
    pub num_virtual_channels: usize,

    /// Bytes moved across a link per flit
    pub link_width: usize,

    /// Cycles taken for a flit to cross a link
    pub link_delay: u64,

    /// Size in bytes of ant packets
    pub ant_packet_size: usize,

    /// Weight of the local buffer level in ant colony selection
    pub aco_selection_alpha: f64,

    /// Amount by which a backward ant reinforces the pheromone of the
    /// direction it arrived from
    pub reinforcement_factor: f64,

    /// Seed of the single random number generator
    pub rand_seed: u64,
}

impl Default for NocConfig {
    fn default() -> Self {
        Self {
            num_nodes: 64,
            routing: RoutingAlgorithm::OddEven,
            selection: SelectionAlgorithm::Aco,
            max_injection_buffer_size: 32,
            max_input_buffer_size: 4,
            num_virtual_channels: 4,
            link_width: 4,
            link_delay: 1,
            ant_packet_size: 4,
            aco_selection_alpha: 0.5,
            reinforcement_factor: 0.05,
            rand_seed: 13,
        }
    }
}

impl NocConfig {
    /// The selection strategy that is actually used.
    ///
    /// Dimension order routing only ever offers one direction so there is
    /// nothing to learn or balance; it always uses random selection.
    #[must_use]
    pub fn effective_selection(&self) -> SelectionAlgorithm {
        match self.routing {
            RoutingAlgorithm::Xy => SelectionAlgorithm::Random,
            RoutingAlgorithm::OddEven => self.selection,
        }
    }

    /// Whether ant packets are used by this configuration.
    #[must_use]
    pub fn uses_ants(&self) -> bool {
        self.effective_selection() == SelectionAlgorithm::Aco
    }

    /// Check the values are usable before building a network.
    pub fn validate(&self) -> SimResult {
        if self.num_nodes < 4 {
            return sim_error!(format!(
                "A mesh needs at least 4 nodes ({} requested)",
                self.num_nodes
            ));
        }
        if self.max_injection_buffer_size == 0 || self.max_input_buffer_size == 0 {
            return sim_error!("Buffer sizes must be at least 1");
        }
        if self.num_virtual_channels == 0 {
            return sim_error!("At least one virtual channel is required");
        }
        if self.link_width == 0 {
            return sim_error!("Link width must be at least 1 byte");
        }
        if self.link_delay == 0 {
            return sim_error!("Link delay must be at least 1 cycle");
        }
        if self.uses_ants() {
            if self.num_virtual_channels < 2 {
                return sim_error!(
                    "ACO selection requires at least 2 virtual channels (one is reserved for backward ants)"
                );
            }
            if !(self.reinforcement_factor > 0.0 && self.reinforcement_factor.is_finite()) {
                return sim_error!(format!(
                    "Reinforcement factor must be positive ({})",
                    self.reinforcement_factor
                ));
            }
            if !(self.aco_selection_alpha >= 0.0 && self.aco_selection_alpha.is_finite()) {
                return sim_error!(format!(
                    "ACO selection alpha must not be negative ({})",
                    self.aco_selection_alpha
                ));
            }
        }
        Ok(())
    }
}
