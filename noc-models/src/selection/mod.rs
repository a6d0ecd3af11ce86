// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Output selection strategies.
//!
//! When the routing policy offers more than one legal direction, the node's
//! [`Selection`] strategy picks the one the head flit will take. Each node
//! owns its own boxed strategy so that strategies with state (such as the
//! ant colony pheromone table) learn per node.

use itertools::Itertools;
use noc_engine::types::Cycle;

use crate::NocRng;
use crate::config::{NocConfig, SelectionAlgorithm};
use crate::mesh::{Direction, Mesh, NodeId};
use crate::packet::PacketKind;

pub mod aco;
pub mod buffer_level;
pub mod neighbor_on_path;
pub mod pheromone;
pub mod random;

pub use pheromone::PheromoneTable;

/// One legal output direction and the congestion seen through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub direction: Direction,

    /// Free flit slots in the downstream router's input port.
    pub free_slots: usize,

    /// Total flit slots of the downstream router's input port.
    pub capacity: usize,

    /// Most free slots of any input port the packet could use one hop after
    /// the downstream router.
    pub look_ahead_free_slots: usize,
}

/// What a strategy knows about the packet being routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionContext {
    pub node: NodeId,
    pub src: NodeId,
    pub dest: NodeId,
    pub kind: PacketKind,
}

pub trait Selection {
    /// Choose one of `candidates`, which is never empty.
    fn select(
        &mut self,
        context: &SelectionContext,
        candidates: &[Candidate],
        rng: &mut NocRng,
    ) -> Direction;

    /// A backward ant carrying `memory` has arrived at `node`.
    fn on_backward_ant(&mut self, _node: NodeId, _memory: &[(NodeId, Cycle)], _mesh: &Mesh) {}

    /// The learnt pheromone table, if this strategy keeps one.
    fn pheromones(&self) -> Option<&PheromoneTable> {
        None
    }

    fn name(&self) -> &'static str;
}

/// Build the strategy used by `node`.
#[must_use]
pub fn build_selection(
    algorithm: SelectionAlgorithm,
    node: NodeId,
    mesh: &Mesh,
    config: &NocConfig,
) -> Box<dyn Selection> {
    match algorithm {
        SelectionAlgorithm::Random => Box::new(random::RandomSelection),
        SelectionAlgorithm::BufferLevel => Box::new(buffer_level::BufferLevelSelection),
        SelectionAlgorithm::NeighborOnPath => Box::new(neighbor_on_path::NeighborOnPathSelection),
        SelectionAlgorithm::Aco => Box::new(aco::AcoSelection::new(node, mesh, config)),
    }
}

/// Pick uniformly among the candidates that maximise `key`.
pub(crate) fn best_by_key<K: Ord>(
    candidates: &[Candidate],
    rng: &mut NocRng,
    key: impl Fn(&Candidate) -> K,
) -> Direction {
    let best = candidates.iter().max_set_by_key(|c| key(c));
    random::pick(&best, rng).direction
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;

    use super::*;

    pub fn rng() -> NocRng {
        NocRng::seed_from_u64(13)
    }

    pub fn context() -> SelectionContext {
        SelectionContext {
            node: 0,
            src: 0,
            dest: 5,
            kind: PacketKind::Data,
        }
    }

    pub fn candidate(direction: Direction, free_slots: usize, look_ahead: usize) -> Candidate {
        Candidate {
            direction,
            free_slots,
            capacity: 16,
            look_ahead_free_slots: look_ahead,
        }
    }
}
