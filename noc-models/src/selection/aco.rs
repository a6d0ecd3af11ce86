// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Ant colony optimisation.
//!
//! Forward ants travel like data packets and record the nodes they visit.
//! At the destination each becomes a backward ant that retraces the path.
//! At every node on the way back the backward ant reinforces the direction
//! it arrived from for each destination that lies further along the path,
//! so directions that recently led quickly to a destination become more
//! likely to be chosen again.

use noc_engine::types::Cycle;
use rand::Rng;

use super::{Candidate, PheromoneTable, Selection, SelectionContext, random};
use crate::NocRng;
use crate::config::NocConfig;
use crate::mesh::{Direction, Mesh, NodeId};

pub struct AcoSelection {
    node: NodeId,
    pheromones: PheromoneTable,
    alpha: f64,
    reinforcement_factor: f64,
}

impl AcoSelection {
    #[must_use]
    pub fn new(node: NodeId, mesh: &Mesh, config: &NocConfig) -> Self {
        Self {
            node,
            pheromones: PheromoneTable::new(node, mesh),
            alpha: config.aco_selection_alpha,
            reinforcement_factor: config.reinforcement_factor,
        }
    }

    /// The roulette weight of each candidate towards `dest`.
    ///
    /// Combines the learnt pheromone with the fraction of the downstream
    /// buffer that is free, weighted by alpha.
    #[must_use]
    pub fn weights(&self, dest: NodeId, candidates: &[Candidate]) -> Vec<f64> {
        let n = candidates.len() as f64;
        let norm = 1.0 + self.alpha * (n - 1.0);
        candidates
            .iter()
            .map(|c| {
                let p = self.pheromones.weight(dest, c.direction);
                let q = if c.capacity == 0 {
                    0.0
                } else {
                    c.free_slots as f64 / c.capacity as f64
                };
                (p + self.alpha * q) / norm
            })
            .collect()
    }
}

impl Selection for AcoSelection {
    fn select(
        &mut self,
        context: &SelectionContext,
        candidates: &[Candidate],
        rng: &mut NocRng,
    ) -> Direction {
        let weights = self.weights(context.dest, candidates);
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return random::pick(candidates, rng).direction;
        }

        let mut target = rng.r#gen::<f64>() * total;
        for (candidate, weight) in candidates.iter().zip(&weights) {
            if target < *weight {
                return candidate.direction;
            }
            target -= weight;
        }
        // Rounding can leave the draw just past the last weight
        candidates[candidates.len() - 1].direction
    }

    fn on_backward_ant(&mut self, node: NodeId, memory: &[(NodeId, Cycle)], mesh: &Mesh) {
        debug_assert_eq!(node, self.node);
        let Some(index) = memory.iter().position(|(n, _)| *n == node) else {
            return;
        };
        let Some((next, _)) = memory.get(index + 1) else {
            return;
        };
        let Some(direction) = mesh.direction_to(node, *next) else {
            return;
        };
        for (dest, _) in &memory[index + 1..] {
            self.pheromones
                .reinforce(*dest, direction, self.reinforcement_factor);
        }
    }

    fn pheromones(&self) -> Option<&PheromoneTable> {
        Some(&self.pheromones)
    }

    fn name(&self) -> &'static str {
        "aco"
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::selection::test_support::{candidate, context, rng};

    fn mesh() -> Mesh {
        Mesh::new(16).unwrap()
    }

    #[test]
    fn initial_weights() {
        let aco = AcoSelection::new(0, &mesh(), &NocConfig::default());
        let candidates = [
            candidate(Direction::East, 16, 0),
            candidate(Direction::South, 8, 0),
        ];
        let weights = aco.weights(5, &candidates);
        assert_relative_eq!(weights[0], (0.5 + 0.5) / 1.5);
        assert_relative_eq!(weights[1], (0.5 + 0.25) / 1.5);
    }

    #[test]
    fn backward_ant_reinforces_path() {
        let mesh = mesh();
        let mut aco = AcoSelection::new(1, &mesh, &NocConfig::default());
        // Forward path 0 -> 1 -> 2 -> 6
        let memory = [(0, 1), (1, 3), (2, 5), (6, 7)];
        aco.on_backward_ant(1, &memory, &mesh);

        let table = aco.pheromones().unwrap();
        for dest in [2, 6] {
            assert!(table.weight(dest, Direction::East) > table.weight(dest, Direction::West));
            assert!(table.weight(dest, Direction::East) > table.weight(dest, Direction::South));
        }
        // Nodes before this one on the path are not destinations of the
        // reinforced direction
        assert_relative_eq!(table.weight(0, Direction::East), 1.0 / 3.0);
    }

    #[test]
    fn strong_pheromone_dominates() {
        let mesh = mesh();
        let config = NocConfig {
            aco_selection_alpha: 0.0,
            ..Default::default()
        };
        let mut aco = AcoSelection::new(0, &mesh, &config);
        let memory = [(0, 0), (1, 1)];
        for _ in 0..200 {
            aco.on_backward_ant(0, &memory, &mesh);
        }
        let candidates = [
            candidate(Direction::East, 16, 0),
            candidate(Direction::South, 16, 0),
        ];
        let context = SelectionContext { dest: 1, ..context() };
        let mut rng = rng();
        let east = (0..100)
            .filter(|_| aco.select(&context, &candidates, &mut rng) == Direction::East)
            .count();
        assert!(east > 90);
    }
}
