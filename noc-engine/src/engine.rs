// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use noc_track::Tracker;
use noc_track::entity::{Entity, toplevel};
use noc_track::tracker::stdout_tracker;

/// The root of a simulation.
///
/// Holds the [`Tracker`] and the top-level [`Entity`] that every model is
/// created beneath.
pub struct Engine {
    toplevel: Rc<Entity>,
    tracker: Tracker,
}

impl Engine {
    /// Create a standalone engine.
    #[must_use]
    pub fn new(tracker: &Tracker) -> Self {
        let toplevel = toplevel(tracker, "top");
        Self {
            toplevel,
            tracker: tracker.clone(),
        }
    }

    #[must_use]
    pub fn top(&self) -> &Rc<Entity> {
        &self.toplevel
    }

    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&stdout_tracker(log::Level::Warn))
    }
}
