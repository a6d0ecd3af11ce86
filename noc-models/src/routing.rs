// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Routing policies.
//!
//! A routing policy returns the set of directions a head flit may legally
//! take next. Both policies are minimal (every direction returned reduces the
//! distance to the destination) and deadlock free. When more than one
//! direction is legal the node's selection strategy picks one.

use crate::config::RoutingAlgorithm;
use crate::mesh::{Direction, Mesh, NodeId};

pub trait Routing {
    /// The legal next hops from `current` for a packet travelling from `src`
    /// to `dest`, in [`Direction`] order.
    ///
    /// Returns `[Direction::Local]` when `current == dest` and is never empty.
    fn legal_directions(
        &self,
        mesh: &Mesh,
        src: NodeId,
        current: NodeId,
        dest: NodeId,
    ) -> Vec<Direction>;

    fn name(&self) -> &'static str;
}

#[must_use]
pub fn build_routing(algorithm: RoutingAlgorithm) -> Box<dyn Routing> {
    match algorithm {
        RoutingAlgorithm::Xy => Box::new(XyRouting),
        RoutingAlgorithm::OddEven => Box::new(OddEvenRouting),
    }
}

/// Signed column/row offsets from `current` to `dest`.
fn offsets(mesh: &Mesh, current: NodeId, dest: NodeId) -> (i64, i64) {
    let dx = mesh.x(dest) as i64 - mesh.x(current) as i64;
    let dy = mesh.y(dest) as i64 - mesh.y(current) as i64;
    (dx, dy)
}

fn vertical(dy: i64) -> Direction {
    if dy > 0 {
        Direction::South
    } else {
        Direction::North
    }
}

/// Dimension order routing: finish all hops in X before any hop in Y.
pub struct XyRouting;

impl Routing for XyRouting {
    fn legal_directions(
        &self,
        mesh: &Mesh,
        _src: NodeId,
        current: NodeId,
        dest: NodeId,
    ) -> Vec<Direction> {
        let (dx, dy) = offsets(mesh, current, dest);
        let direction = if dx > 0 {
            Direction::East
        } else if dx < 0 {
            Direction::West
        } else if dy != 0 {
            vertical(dy)
        } else {
            Direction::Local
        };
        vec![direction]
    }

    fn name(&self) -> &'static str {
        "xy"
    }
}

/// The odd-even turn model.
///
/// Columns are classed as even or odd by their x coordinate. East-to-North
/// and East-to-South turns are forbidden in even columns, and North-to-West
/// and South-to-West turns are forbidden in odd columns. This removes the
/// rightmost column of every possible cycle of channel dependencies while
/// still allowing adaptivity for most source/destination pairs.
pub struct OddEvenRouting;

impl Routing for OddEvenRouting {
    fn legal_directions(
        &self,
        mesh: &Mesh,
        src: NodeId,
        current: NodeId,
        dest: NodeId,
    ) -> Vec<Direction> {
        let (dx, dy) = offsets(mesh, current, dest);
        let cur_x = mesh.x(current);
        let src_x = mesh.x(src);
        let dest_x = mesh.x(dest);
        let is_odd = |x: usize| x % 2 == 1;

        let mut directions = Vec::with_capacity(2);
        if dx == 0 {
            if dy == 0 {
                directions.push(Direction::Local);
            } else {
                directions.push(vertical(dy));
            }
        } else if dx > 0 {
            if dy == 0 {
                directions.push(Direction::East);
            } else {
                // Turning from East to vertical is only allowed in odd
                // columns; a packet that has not moved East yet can turn in
                // its source column.
                if is_odd(cur_x) || cur_x == src_x {
                    directions.push(vertical(dy));
                }
                // Going East into an even destination column would require a
                // forbidden turn there.
                if is_odd(dest_x) || dx != 1 {
                    directions.push(Direction::East);
                }
            }
        } else {
            directions.push(Direction::West);
            // Turning from vertical to West is forbidden in odd columns.
            if dy != 0 && !is_odd(cur_x) {
                directions.push(vertical(dy));
            }
        }

        directions.sort();
        directions
    }

    fn name(&self) -> &'static str {
        "odd-even"
    }
}
