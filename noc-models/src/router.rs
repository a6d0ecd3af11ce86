// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A wormhole router with virtual channel flow control.
//!
//! Each of the five ports has one input buffer per virtual channel (VC) and
//! one output VC per downstream input VC. The router moves flits through the
//! pipeline one stage per cycle:
//!
//! ```txt
//!  Injected -> RouteCompute -> VcAllocate -> SwitchAllocate
//!           -> SwitchTraverse -> LinkTraverse (or Ejected at the Local port)
//! ```
//!
//! Route computation needs the whole network (routing, selection and the
//! state of neighbouring routers) so the router only reports which head flits
//! need a route and records the decision it is given. All other stages are
//! local to the router.
//!
//! Output VCs carry a credit count equal to the free slots of the matching
//! input VC downstream. A flit may only leave on a VC with credit; the credit
//! is returned when the flit leaves the downstream input VC.

use std::collections::VecDeque;
use std::rc::Rc;

use itertools::iproduct;
use noc_engine::sim_error;
use noc_engine::types::{Cycle, SimResult};
use noc_track::entity::Entity;
use noc_track::trace;

use crate::arbiter::RoundRobin;
use crate::config::NocConfig;
use crate::flit::{Flit, FlitState};
use crate::mesh::{Direction, NodeId};
use crate::packet::{PacketHeader, PacketKind};
use crate::stats::Statistics;

#[derive(Default)]
struct InputVc {
    flits: VecDeque<Flit>,

    /// Output port chosen by route computation for the packet at the front.
    route: Option<Direction>,

    /// Output VC granted to the packet at the front.
    output_vc: Option<usize>,
}

struct OutputVc {
    credits: usize,

    /// The input VC whose packet currently owns this output VC.
    input: Option<(Direction, usize)>,
}

/// A flit that has left the router this cycle.
#[derive(Debug)]
pub struct Departure {
    pub flit: Flit,
    pub input_port: Direction,
    pub input_vc: usize,
    pub output: Direction,
    pub output_vc: usize,
}

/// A head flit waiting for route computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteRequest {
    pub port: Direction,
    pub vc: usize,
    pub header: PacketHeader,
}

pub struct Router {
    entity: Rc<Entity>,
    node: NodeId,
    num_vcs: usize,
    max_input_buffer_size: usize,
    max_injection_buffer_size: usize,

    /// Keep the last VC of each mesh output for backward ants only.
    reserve_last_vc: bool,

    injection: VecDeque<PacketHeader>,
    inputs: Vec<Vec<InputVc>>,
    outputs: Vec<Vec<OutputVc>>,
    vc_arbiters: Vec<Vec<RoundRobin>>,
    switch_arbiters: Vec<RoundRobin>,
}

/// Move a flit to `state` and record how long it spent in its previous
/// state.
fn transition(
    entity: &Entity,
    flit: &mut Flit,
    state: FlitState,
    cycle: Cycle,
    stats: &mut Statistics,
) {
    let (previous, residency) = flit.set_state(state, cycle);
    stats.log_flit_per_state_delay(previous, residency);
    trace!(entity ; "{flit} {previous} -> {state}");
}

impl Router {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, node: NodeId, config: &NocConfig) -> Self {
        let entity = Rc::new(Entity::new(parent, "router"));
        let num_vcs = config.num_virtual_channels;

        let inputs = (0..Direction::NUM)
            .map(|_| (0..num_vcs).map(|_| InputVc::default()).collect())
            .collect();
        let outputs = (0..Direction::NUM)
            .map(|_| {
                (0..num_vcs)
                    .map(|_| OutputVc {
                        credits: config.max_input_buffer_size,
                        input: None,
                    })
                    .collect()
            })
            .collect();
        let vc_arbiters = (0..Direction::NUM)
            .map(|_| (0..num_vcs).map(|_| RoundRobin::new()).collect())
            .collect();
        let switch_arbiters = (0..Direction::NUM).map(|_| RoundRobin::new()).collect();

        Self {
            entity,
            node,
            num_vcs,
            max_input_buffer_size: config.max_input_buffer_size,
            max_injection_buffer_size: config.max_injection_buffer_size,
            reserve_last_vc: config.uses_ants(),
            injection: VecDeque::new(),
            inputs,
            outputs,
            vc_arbiters,
            switch_arbiters,
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Queue a packet for injection. Returns `false` if the injection buffer
    /// is full.
    pub fn inject(&mut self, header: PacketHeader) -> bool {
        if self.injection.len() >= self.max_injection_buffer_size {
            return false;
        }
        self.injection.push_back(header);
        true
    }

    #[must_use]
    pub fn injection_buffer_len(&self) -> usize {
        self.injection.len()
    }

    /// Free flit slots over all the VCs of an input port.
    #[must_use]
    pub fn free_slots(&self, port: Direction) -> usize {
        self.inputs[port.index()]
            .iter()
            .map(|input| self.max_input_buffer_size - input.flits.len())
            .sum()
    }

    /// Total flit slots of one input port.
    #[must_use]
    pub fn port_capacity(&self) -> usize {
        self.num_vcs * self.max_input_buffer_size
    }

    /// Number of flits held in the input buffers.
    #[must_use]
    pub fn num_buffered_flits(&self) -> usize {
        self.inputs.iter().flatten().map(|input| input.flits.len()).sum()
    }

    #[must_use]
    pub fn credits(&self, port: Direction, vc: usize) -> usize {
        self.outputs[port.index()][vc].credits
    }

    fn requester_index(&self, port: Direction, vc: usize) -> usize {
        port.index() * self.num_vcs + vc
    }

    /// Whether a packet of `kind` may use output VC `vc` of `port`.
    fn vc_permitted(&self, port: Direction, vc: usize, kind: PacketKind) -> bool {
        if !self.reserve_last_vc || port == Direction::Local {
            return true;
        }
        let reserved = vc + 1 == self.num_vcs;
        reserved == (kind == PacketKind::BackwardAnt)
    }

    /// Head flits at the front of an input VC that have not been routed yet.
    #[must_use]
    pub fn route_requests(&self) -> Vec<RouteRequest> {
        iproduct!(Direction::ALL, 0..self.num_vcs)
            .filter_map(|(port, vc)| {
                let input = &self.inputs[port.index()][vc];
                let flit = input.flits.front()?;
                (flit.is_head() && flit.state() == FlitState::Injected && input.route.is_none())
                    .then(|| RouteRequest {
                        port,
                        vc,
                        header: *flit.header(),
                    })
            })
            .collect()
    }

    /// Record the result of route computation for the head flit of an input
    /// VC.
    pub fn set_route(
        &mut self,
        port: Direction,
        vc: usize,
        direction: Direction,
        cycle: Cycle,
        stats: &mut Statistics,
    ) {
        let input = &mut self.inputs[port.index()][vc];
        input.route = Some(direction);
        if let Some(flit) = input.flits.front_mut() {
            transition(&self.entity, flit, FlitState::RouteCompute, cycle, stats);
            trace!(self.entity ; "{flit} routed {direction}");
        }
    }

    /// Grant free output VCs to routed head flits.
    pub fn vc_allocation(&mut self, cycle: Cycle, stats: &mut Statistics) {
        let num_requesters = Direction::NUM * self.num_vcs;
        for (out, ovc) in iproduct!(Direction::ALL, 0..self.num_vcs) {
            let output = &self.outputs[out.index()][ovc];
            if output.input.is_some() || (out != Direction::Local && output.credits == 0) {
                continue;
            }

            let mut requests = vec![None; num_requesters];
            for (port, vc) in iproduct!(Direction::ALL, 0..self.num_vcs) {
                let input = &self.inputs[port.index()][vc];
                if input.route != Some(out) || input.output_vc.is_some() {
                    continue;
                }
                let Some(flit) = input.flits.front() else {
                    continue;
                };
                if flit.is_head()
                    && flit.state() == FlitState::RouteCompute
                    && self.vc_permitted(out, ovc, flit.header().kind)
                {
                    requests[self.requester_index(port, vc)] = Some((port, vc));
                }
            }

            let Some((_, (port, vc))) =
                self.vc_arbiters[out.index()][ovc].arbitrate(&mut requests)
            else {
                continue;
            };
            self.outputs[out.index()][ovc].input = Some((port, vc));
            let input = &mut self.inputs[port.index()][vc];
            input.output_vc = Some(ovc);
            if let Some(flit) = input.flits.front_mut() {
                transition(&self.entity, flit, FlitState::VcAllocate, cycle, stats);
            }
        }
    }

    /// Grant each output port to at most one flit, and each input port to at
    /// most one output.
    pub fn switch_allocation(&mut self, cycle: Cycle, stats: &mut Statistics) {
        let num_requesters = Direction::NUM * self.num_vcs;
        let mut input_granted = [false; Direction::NUM];

        for out in Direction::ALL {
            let mut requests = vec![None; num_requesters];
            for (port, vc) in iproduct!(Direction::ALL, 0..self.num_vcs) {
                if input_granted[port.index()] {
                    continue;
                }
                let input = &self.inputs[port.index()][vc];
                if input.route != Some(out) {
                    continue;
                }
                let (Some(ovc), Some(flit)) = (input.output_vc, input.flits.front()) else {
                    continue;
                };
                let waiting = if flit.is_head() {
                    flit.state() == FlitState::VcAllocate
                } else {
                    flit.state() == FlitState::Injected
                };
                let has_credit =
                    out == Direction::Local || self.outputs[out.index()][ovc].credits > 0;
                if waiting && has_credit {
                    requests[self.requester_index(port, vc)] = Some((port, vc));
                }
            }

            let Some((_, (port, vc))) = self.switch_arbiters[out.index()].arbitrate(&mut requests)
            else {
                continue;
            };
            input_granted[port.index()] = true;
            if let Some(flit) = self.inputs[port.index()][vc].flits.front_mut() {
                transition(&self.entity, flit, FlitState::SwitchAllocate, cycle, stats);
            }
        }
    }

    pub fn switch_traversal(&mut self, cycle: Cycle, stats: &mut Statistics) {
        for input in self.inputs.iter_mut().flatten() {
            if let Some(flit) = input.flits.front_mut() {
                if flit.state() == FlitState::SwitchAllocate {
                    transition(&self.entity, flit, FlitState::SwitchTraverse, cycle, stats);
                }
            }
        }
    }

    /// Send every flit that has crossed the switch.
    ///
    /// Flits leaving on a mesh port consume a credit of their output VC.
    /// Flits leaving on the Local port are ejected. A tail flit releases the
    /// output VC held by its packet.
    pub fn link_traversal(&mut self, cycle: Cycle, stats: &mut Statistics) -> Vec<Departure> {
        let mut departures = Vec::new();
        for (port, vc) in iproduct!(Direction::ALL, 0..self.num_vcs) {
            let input = &mut self.inputs[port.index()][vc];
            let ready = input
                .flits
                .front()
                .is_some_and(|flit| flit.state() == FlitState::SwitchTraverse);
            if !ready {
                continue;
            }
            let (Some(output), Some(output_vc)) = (input.route, input.output_vc) else {
                continue;
            };
            let Some(mut flit) = input.flits.pop_front() else {
                continue;
            };

            if flit.is_tail() {
                input.route = None;
                input.output_vc = None;
                self.outputs[output.index()][output_vc].input = None;
            }

            if output == Direction::Local {
                transition(&self.entity, &mut flit, FlitState::Ejected, cycle, stats);
            } else {
                let credits = &mut self.outputs[output.index()][output_vc].credits;
                *credits = credits.saturating_sub(1);
                transition(&self.entity, &mut flit, FlitState::LinkTraverse, cycle, stats);
            }

            departures.push(Departure {
                flit,
                input_port: port,
                input_vc: vc,
                output,
                output_vc,
            });
        }
        departures
    }

    /// Move packets from the injection buffer into Local input VCs with room
    /// for all of their flits.
    pub fn local_injection(&mut self, cycle: Cycle) {
        let capacity = self.max_input_buffer_size;
        while let Some(header) = self.injection.front().copied() {
            let local = &mut self.inputs[Direction::Local.index()];
            let Some(vc) =
                (0..self.num_vcs).find(|vc| capacity - local[*vc].flits.len() >= header.num_flits)
            else {
                break;
            };
            self.injection.pop_front();
            local[vc].flits.extend(header.flits(vc, cycle));
            trace!(self.entity ; "injected packet {} into VC {vc}", header.id);
        }
    }

    /// A flit that left input VC `vc` of the downstream router connected to
    /// `port` has freed a slot.
    pub fn return_credit(&mut self, port: Direction, vc: usize) {
        let credits = &mut self.outputs[port.index()][vc].credits;
        *credits = (*credits + 1).min(self.max_input_buffer_size);
    }

    /// Accept a flit arriving over the link into input `port`.
    ///
    /// Arrival at a full VC means credits were not respected upstream.
    pub fn accept_flit(
        &mut self,
        port: Direction,
        vc: usize,
        mut flit: Flit,
        cycle: Cycle,
        stats: &mut Statistics,
    ) -> SimResult {
        let input = &mut self.inputs[port.index()][vc];
        if input.flits.len() >= self.max_input_buffer_size {
            return sim_error!(format!(
                "{flit} arrived at full input VC {vc} of port {port} on node {}",
                self.node
            ));
        }
        flit.set_input_vc(vc);
        transition(&self.entity, &mut flit, FlitState::Injected, cycle, stats);
        input.flits.push_back(flit);
        Ok(())
    }
}
