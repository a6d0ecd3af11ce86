// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The unit of transmission across a link.

use std::fmt;

use noc_engine::types::Cycle;

use crate::packet::{PacketHeader, PacketId};

/// Pipeline state of a flit.
///
/// Each state names the last stage the flit has completed. A flit that has
/// crossed a link returns to `Injected` in the next router's input buffer,
/// where the head flit goes through route computation again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlitState {
    /// Waiting in an input buffer.
    Injected,
    RouteCompute,
    VcAllocate,
    SwitchAllocate,
    SwitchTraverse,
    LinkTraverse,
    /// Left the network at its destination.
    Ejected,
}

impl FlitState {
    pub const NUM: usize = 7;

    pub const ALL: [FlitState; FlitState::NUM] = [
        FlitState::Injected,
        FlitState::RouteCompute,
        FlitState::VcAllocate,
        FlitState::SwitchAllocate,
        FlitState::SwitchTraverse,
        FlitState::LinkTraverse,
        FlitState::Ejected,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FlitState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FlitState::Injected => "INJECTED",
            FlitState::RouteCompute => "ROUTE_COMPUTE",
            FlitState::VcAllocate => "VC_ALLOCATE",
            FlitState::SwitchAllocate => "SWITCH_ALLOCATE",
            FlitState::SwitchTraverse => "SWITCH_TRAVERSE",
            FlitState::LinkTraverse => "LINK_TRAVERSE",
            FlitState::Ejected => "EJECTED",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug)]
pub struct Flit {
    header: PacketHeader,
    index: usize,
    state: FlitState,
    state_entered: Cycle,

    /// Input virtual channel the flit is buffered in.
    input_vc: usize,
}

impl Flit {
    #[must_use]
    pub fn new(header: PacketHeader, index: usize, input_vc: usize, cycle: Cycle) -> Self {
        Self {
            header,
            index,
            state: FlitState::Injected,
            state_entered: cycle,
            input_vc,
        }
    }

    #[must_use]
    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    #[must_use]
    pub fn packet_id(&self) -> PacketId {
        self.header.id
    }

    #[must_use]
    pub fn is_head(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub fn is_tail(&self) -> bool {
        self.index + 1 == self.header.num_flits
    }

    #[must_use]
    pub fn state(&self) -> FlitState {
        self.state
    }

    #[must_use]
    pub fn input_vc(&self) -> usize {
        self.input_vc
    }

    pub(crate) fn set_input_vc(&mut self, vc: usize) {
        self.input_vc = vc;
    }

    /// Move to a new state.
    ///
    /// Returns the previous state and the number of cycles spent in it.
    pub fn set_state(&mut self, state: FlitState, cycle: Cycle) -> (FlitState, Cycle) {
        let previous = self.state;
        let residency = cycle.saturating_sub(self.state_entered);
        self.state = state;
        self.state_entered = cycle;
        (previous, residency)
    }
}

impl fmt::Display for Flit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "flit {}.{}", self.header.id, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::PacketKind;

    fn header(num_flits: usize) -> PacketHeader {
        PacketHeader {
            id: 7,
            kind: PacketKind::Data,
            src: 0,
            dest: 3,
            num_flits,
        }
    }

    #[test]
    fn head_and_tail() {
        let flits: Vec<_> = header(3).flits(1, 5).collect();
        assert_eq!(flits.len(), 3);
        assert!(flits[0].is_head() && !flits[0].is_tail());
        assert!(!flits[1].is_head() && !flits[1].is_tail());
        assert!(!flits[2].is_head() && flits[2].is_tail());
        assert!(flits.iter().all(|f| f.input_vc() == 1));

        let single: Vec<_> = header(1).flits(0, 5).collect();
        assert!(single[0].is_head() && single[0].is_tail());
    }

    #[test]
    fn residency() {
        let mut flit = Flit::new(header(1), 0, 0, 10);
        assert_eq!(
            flit.set_state(FlitState::RouteCompute, 12),
            (FlitState::Injected, 2)
        );
        assert_eq!(
            flit.set_state(FlitState::VcAllocate, 12),
            (FlitState::RouteCompute, 0)
        );
        assert_eq!(flit.state(), FlitState::VcAllocate);
    }
}
