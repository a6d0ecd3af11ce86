// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Per-node pheromone weights learnt from backward ants.

use std::collections::BTreeMap;

use crate::mesh::{Direction, Mesh, NodeId};

/// For each destination, one weight per direction out of this node.
///
/// The weights of a destination always sum to 1. Directions without a
/// neighbour keep a weight of 0.
#[derive(Clone, Debug, PartialEq)]
pub struct PheromoneTable {
    weights: BTreeMap<NodeId, [f64; Direction::NUM]>,
}

impl PheromoneTable {
    /// Uniform weights over the neighbours of `node` for every other
    /// destination in the mesh.
    #[must_use]
    pub fn new(node: NodeId, mesh: &Mesh) -> Self {
        let neighbors: Vec<Direction> = mesh.neighbors(node).map(|(d, _)| d).collect();
        let initial = 1.0 / neighbors.len() as f64;
        let mut row = [0.0; Direction::NUM];
        for direction in &neighbors {
            row[direction.index()] = initial;
        }

        let weights = (0..mesh.num_nodes())
            .filter(|dest| *dest != node)
            .map(|dest| (dest, row))
            .collect();
        Self { weights }
    }

    #[must_use]
    pub fn weight(&self, dest: NodeId, direction: Direction) -> f64 {
        self.weights
            .get(&dest)
            .map_or(0.0, |row| row[direction.index()])
    }

    /// Add `amount` to the weight of `direction` towards `dest` and
    /// renormalise so the weights for `dest` sum to 1 again.
    pub fn reinforce(&mut self, dest: NodeId, direction: Direction, amount: f64) {
        let Some(row) = self.weights.get_mut(&dest) else {
            return;
        };
        row[direction.index()] += amount;
        let sum: f64 = row.iter().sum();
        for weight in row.iter_mut() {
            *weight /= sum;
        }
    }

    /// All `(dest, direction, weight)` entries for directions that lead to a
    /// neighbour, ordered by destination then direction.
    pub fn entries(&self) -> impl Iterator<Item = (NodeId, Direction, f64)> + '_ {
        self.weights.iter().flat_map(|(dest, row)| {
            Direction::ALL
                .into_iter()
                .filter(|d| row[d.index()] > 0.0)
                .map(move |d| (*dest, d, row[d.index()]))
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn uniform_start() {
        let mesh = Mesh::new(16).unwrap();
        let corner = PheromoneTable::new(0, &mesh);
        assert_relative_eq!(corner.weight(5, Direction::East), 0.5);
        assert_relative_eq!(corner.weight(5, Direction::South), 0.5);
        assert_relative_eq!(corner.weight(5, Direction::North), 0.0);
        assert_relative_eq!(corner.weight(0, Direction::East), 0.0);

        let middle = PheromoneTable::new(5, &mesh);
        assert_relative_eq!(middle.weight(0, Direction::West), 0.25);
        assert_eq!(middle.entries().count(), 15 * 4);
    }

    #[test]
    fn reinforce_keeps_sum() {
        let mesh = Mesh::new(16).unwrap();
        let mut table = PheromoneTable::new(5, &mesh);
        table.reinforce(7, Direction::East, 0.05);

        let east = table.weight(7, Direction::East);
        let north = table.weight(7, Direction::North);
        assert_relative_eq!(east, 0.30 / 1.05);
        assert_relative_eq!(north, 0.25 / 1.05);
        let sum: f64 = Direction::ALL.iter().map(|d| table.weight(7, *d)).sum();
        assert_relative_eq!(sum, 1.0);

        // Other destinations are untouched
        assert_relative_eq!(table.weight(6, Direction::East), 0.25);
    }
}
