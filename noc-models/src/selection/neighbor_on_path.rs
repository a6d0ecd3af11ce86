// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use super::{Candidate, Selection, SelectionContext, best_by_key};
use crate::NocRng;
use crate::mesh::Direction;

/// Buffer level selection that breaks ties by looking one hop further along
/// a minimal path.
pub struct NeighborOnPathSelection;

impl Selection for NeighborOnPathSelection {
    fn select(
        &mut self,
        _context: &SelectionContext,
        candidates: &[Candidate],
        rng: &mut NocRng,
    ) -> Direction {
        best_by_key(candidates, rng, |c| (c.free_slots, c.look_ahead_free_slots))
    }

    fn name(&self) -> &'static str {
        "neighbor-on-path"
    }
}
