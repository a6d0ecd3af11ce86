// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Geometry of a square 2D mesh.
//!
//! Nodes are numbered row by row so that node `id` is at column
//! `x = id % width` and row `y = id / width`. Row 0 is the northern edge:
//!
//! ```txt
//!          North (y - 1)
//!             ^
//!  West  <- node ->  East
//! (x - 1)     v     (x + 1)
//!          South (y + 1)
//! ```

use std::fmt;

use noc_engine::sim_error;
use noc_engine::types::SimError;

/// Identifier of a node within the mesh.
pub type NodeId = usize;

/// A router port: one per mesh direction plus the local injection/ejection
/// port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Local,
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Number of ports on each router.
    pub const NUM: usize = 5;

    /// All ports, in index order.
    pub const ALL: [Direction; Direction::NUM] = [
        Direction::Local,
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The port on a neighbour that faces back towards this one.
    #[must_use]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Local => Direction::Local,
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Direction::Local => "LOCAL",
            Direction::North => "NORTH",
            Direction::East => "EAST",
            Direction::South => "SOUTH",
            Direction::West => "WEST",
        };
        write!(f, "{name}")
    }
}

/// A square mesh of `width * width` nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mesh {
    width: usize,
}

impl Mesh {
    /// Create a mesh of `num_nodes` nodes.
    ///
    /// Fails unless `num_nodes` is a perfect square.
    pub fn new(num_nodes: usize) -> Result<Self, SimError> {
        let width = (num_nodes as f64).sqrt().round() as usize;
        if num_nodes == 0 || width * width != num_nodes {
            return sim_error!(format!(
                "Only 2D meshes are supported ({num_nodes} nodes is not a perfect square)"
            ));
        }
        Ok(Self { width })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.width * self.width
    }

    #[must_use]
    pub fn x(&self, id: NodeId) -> usize {
        id % self.width
    }

    #[must_use]
    pub fn y(&self, id: NodeId) -> usize {
        id / self.width
    }

    #[must_use]
    pub fn id_at(&self, x: usize, y: usize) -> NodeId {
        y * self.width + x
    }

    /// The node adjacent to `id` in `direction`, if there is one.
    #[must_use]
    pub fn neighbor(&self, id: NodeId, direction: Direction) -> Option<NodeId> {
        let x = self.x(id);
        let y = self.y(id);
        match direction {
            Direction::Local => None,
            Direction::North => (y > 0).then(|| id - self.width),
            Direction::East => (x + 1 < self.width).then(|| id + 1),
            Direction::South => (y + 1 < self.width).then(|| id + self.width),
            Direction::West => (x > 0).then(|| id - 1),
        }
    }

    /// All mesh neighbours of `id` with the direction in which they lie.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (Direction, NodeId)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| self.neighbor(id, direction).map(|n| (direction, n)))
    }

    /// The direction from `from` to the adjacent node `to`.
    #[must_use]
    pub fn direction_to(&self, from: NodeId, to: NodeId) -> Option<Direction> {
        self.neighbors(from)
            .find(|(_, neighbor)| *neighbor == to)
            .map(|(direction, _)| direction)
    }

    /// Manhattan distance between two nodes.
    #[must_use]
    pub fn distance(&self, a: NodeId, b: NodeId) -> usize {
        self.x(a).abs_diff(self.x(b)) + self.y(a).abs_diff(self.y(b))
    }
}
