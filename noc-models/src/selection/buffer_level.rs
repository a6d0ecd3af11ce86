// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use super::{Candidate, Selection, SelectionContext, best_by_key};
use crate::NocRng;
use crate::mesh::Direction;

/// Choose the neighbour whose input port has the most free slots.
pub struct BufferLevelSelection;

impl Selection for BufferLevelSelection {
    fn select(
        &mut self,
        _context: &SelectionContext,
        candidates: &[Candidate],
        rng: &mut NocRng,
    ) -> Direction {
        best_by_key(candidates, rng, |c| c.free_slots)
    }

    fn name(&self) -> &'static str {
        "buffer-level"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::test_support::{candidate, context, rng};

    #[test]
    fn least_occupied_wins() {
        let candidates = [
            candidate(Direction::East, 3, 16),
            candidate(Direction::South, 9, 0),
        ];
        let mut rng = rng();
        for _ in 0..20 {
            assert_eq!(
                BufferLevelSelection.select(&context(), &candidates, &mut rng),
                Direction::South
            );
        }
    }

    #[test]
    fn ties_are_random() {
        let candidates = [
            candidate(Direction::East, 4, 0),
            candidate(Direction::South, 4, 0),
        ];
        let mut rng = rng();
        let picks: Vec<_> = (0..50)
            .map(|_| BufferLevelSelection.select(&context(), &candidates, &mut rng))
            .collect();
        assert!(picks.contains(&Direction::East));
        assert!(picks.contains(&Direction::South));
    }
}
