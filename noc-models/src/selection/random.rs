// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use rand::seq::SliceRandom;

use super::{Candidate, Selection, SelectionContext};
use crate::NocRng;
use crate::mesh::Direction;

/// Uniformly random choice among the legal directions.
pub struct RandomSelection;

/// Uniform draw from a non-empty slice.
///
/// # Panics
///
/// If `items` is empty, which [`Selection::select`] never allows.
pub(crate) fn pick<'a, T>(items: &'a [T], rng: &mut NocRng) -> &'a T {
    items
        .choose(rng)
        .expect("selection is only made between legal directions")
}

impl Selection for RandomSelection {
    fn select(
        &mut self,
        _context: &SelectionContext,
        candidates: &[Candidate],
        rng: &mut NocRng,
    ) -> Direction {
        pick(candidates, rng).direction
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::test_support::{candidate, context, rng};

    #[test]
    fn picks_every_candidate() {
        let candidates = [
            candidate(Direction::East, 0, 0),
            candidate(Direction::South, 0, 0),
        ];
        let mut rng = rng();
        let mut seen = [false; Direction::NUM];
        for _ in 0..100 {
            let direction = RandomSelection.select(&context(), &candidates, &mut rng);
            seen[direction.index()] = true;
        }
        assert!(seen[Direction::East.index()]);
        assert!(seen[Direction::South.index()]);
        assert!(!seen[Direction::North.index()]);
    }

    #[test]
    fn single_candidate() {
        let mut rng = rng();
        assert_eq!(*pick(&[Direction::West], &mut rng), Direction::West);
    }

    #[test]
    #[should_panic(expected = "legal directions")]
    fn no_candidates() {
        let mut rng = rng();
        pick::<Direction>(&[], &mut rng);
    }
}
