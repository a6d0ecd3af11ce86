// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The mesh network: all nodes plus the state they share.
//!
//! The network owns the event queue, the random number generator, the
//! packets in flight and the statistics. Routers only hold flits and refer to
//! packets by id, so the network decides routes and handles delivery.

use std::collections::BTreeMap;
use std::rc::Rc;

use noc_engine::event_queue::EventQueue;
use noc_engine::sim_error;
use noc_engine::types::{Cycle, SimError, SimResult};
use noc_track::entity::Entity;
use noc_track::{debug, error, info, set_time, trace};
use rand::{Rng, SeedableRng};

use crate::NocRng;
use crate::config::NocConfig;
use crate::flit::Flit;
use crate::mesh::{Direction, Mesh, NodeId};
use crate::node::Node;
use crate::packet::{CompletionCallback, Packet, PacketHeader, PacketId, PacketKind};
use crate::router::Departure;
use crate::routing::{Routing, build_routing};
use crate::selection::{Candidate, SelectionContext};
use crate::stats::Statistics;

/// Events handled by the network.
#[derive(Debug)]
pub enum NocEvent {
    /// Try to inject a pending packet.
    Receive(PacketId),

    /// A flit has crossed a link into input `port`, VC `vc` of `node`.
    LinkArrival {
        node: NodeId,
        port: Direction,
        vc: usize,
        flit: Flit,
    },
}

pub struct Network {
    pub entity: Rc<Entity>,
    config: NocConfig,
    mesh: Mesh,
    nodes: Vec<Node>,
    routing: Box<dyn Routing>,
    queue: EventQueue<NocEvent>,
    rng: NocRng,

    /// Packets accepted by a router and not yet delivered.
    packets: BTreeMap<PacketId, Packet>,

    /// Packets waiting for a `Receive` event.
    pending: BTreeMap<PacketId, Packet>,

    next_packet_id: PacketId,
    stats: Statistics,
}

impl Network {
    pub fn new(parent: &Rc<Entity>, config: NocConfig) -> Result<Self, SimError> {
        config.validate()?;
        let mesh = Mesh::new(config.num_nodes)?;
        let entity = Rc::new(Entity::new(parent, "network"));

        let nodes = (0..mesh.num_nodes())
            .map(|id| Node::new(&entity, id, &mesh, &config))
            .collect();
        let routing = build_routing(config.routing);

        info!(entity ; "{}x{} mesh, {} routing, {} selection, {} VCs",
            mesh.width(), mesh.width(), routing.name(), config.effective_selection(),
            config.num_virtual_channels);

        Ok(Self {
            entity,
            rng: NocRng::seed_from_u64(config.rand_seed),
            config,
            mesh,
            nodes,
            routing,
            queue: EventQueue::new(),
            packets: BTreeMap::new(),
            pending: BTreeMap::new(),
            next_packet_id: 0,
            stats: Statistics::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &NocConfig {
        &self.config
    }

    #[must_use]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.mesh.num_nodes()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[must_use]
    pub fn current_cycle(&self) -> Cycle {
        self.queue.current_cycle()
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    pub fn rng_mut(&mut self) -> &mut NocRng {
        &mut self.rng
    }

    /// Packets accepted or waiting to be accepted that have not been
    /// delivered.
    #[must_use]
    pub fn num_in_flight(&self) -> usize {
        self.packets.len() + self.pending.len()
    }

    /// A packet that has been accepted and is still in flight.
    #[must_use]
    pub fn packet(&self, id: PacketId) -> Option<&Packet> {
        self.packets.get(&id)
    }

    /// Create a packet with the next id, starting at the current cycle.
    pub fn new_packet(
        &mut self,
        kind: PacketKind,
        src: NodeId,
        dest: NodeId,
        size: usize,
        on_completed: Option<CompletionCallback>,
    ) -> Result<Packet, SimError> {
        let id = self.next_packet_id;
        let packet = Packet::new(
            id,
            kind,
            src,
            dest,
            size,
            self.current_cycle(),
            &self.config,
        )?;
        self.next_packet_id += 1;
        Ok(match on_completed {
            Some(on_completed) => packet.with_on_completed(on_completed),
            None => packet,
        })
    }

    /// Try to inject `packet` at its source node.
    ///
    /// If the injection buffer is full the network keeps the packet and tries
    /// again next cycle. Returns whether the packet was accepted now.
    ///
    /// A packet built by another network that does not fit this one is
    /// dropped and `false` returned.
    pub fn receive(&mut self, packet: Packet) -> bool {
        let header = packet.header();
        if !self.fits(&header) {
            error!(self.entity ; "dropped {packet}: it does not fit this network");
            return false;
        }
        if self.nodes[header.src].router.inject(header) {
            debug!(self.entity ; "accepted {packet}");
            self.stats.log_packet_received(&packet);
            self.packets.insert(header.id, packet);
            true
        } else {
            trace!(self.entity ; "injection buffer of node {} full, retrying {packet}", header.src);
            self.pending.insert(header.id, packet);
            self.queue.schedule(NocEvent::Receive(header.id), 1);
            false
        }
    }

    /// Whether a packet can be carried by this network and is not already in
    /// flight.
    fn fits(&self, header: &PacketHeader) -> bool {
        header.src < self.num_nodes()
            && header.dest < self.num_nodes()
            && header.num_flits <= self.config.max_input_buffer_size
            && !self.packets.contains_key(&header.id)
            && !self.pending.contains_key(&header.id)
    }

    /// Deliver `packet` to [`receive`](Self::receive) after `delay` cycles.
    ///
    /// The packet's begin cycle becomes the cycle at which it is received.
    pub fn schedule_receive(&mut self, mut packet: Packet, delay: Cycle) {
        packet.set_begin_cycle(self.current_cycle() + delay);
        let id = packet.id();
        self.pending.insert(id, packet);
        self.queue.schedule(NocEvent::Receive(id), delay);
    }

    /// A uniformly random node other than `src`.
    pub fn rand_dest(&mut self, src: NodeId) -> NodeId {
        let num_nodes = self.num_nodes();
        loop {
            let dest = self.rng.gen_range(0..num_nodes);
            if dest != src {
                return dest;
            }
        }
    }

    #[must_use]
    pub fn throughput(&self) -> f64 {
        self.stats
            .throughput(self.current_cycle(), self.num_nodes())
    }

    #[must_use]
    pub fn payload_throughput(&self) -> f64 {
        self.stats
            .payload_throughput(self.current_cycle(), self.num_nodes())
    }

    #[must_use]
    pub fn throughput_per_kind(&self, kind: PacketKind) -> f64 {
        self.stats
            .throughput_per_kind(kind, self.current_cycle(), self.num_nodes())
    }

    /// Advance the whole network by one cycle.
    ///
    /// Routers run their stages in reverse pipeline order so a flit advances
    /// at most one stage per cycle.
    pub fn advance_one_cycle(&mut self) -> SimResult {
        let cycle = self.queue.advance_cycle();
        set_time!(self.entity ; cycle);

        while let Some(event) = self.queue.pop_due() {
            match event {
                NocEvent::Receive(id) => {
                    if let Some(packet) = self.pending.remove(&id) {
                        self.receive(packet);
                    }
                }
                NocEvent::LinkArrival {
                    node,
                    port,
                    vc,
                    flit,
                } => {
                    self.nodes[node]
                        .router
                        .accept_flit(port, vc, flit, cycle, &mut self.stats)?;
                }
            }
        }

        for node in 0..self.nodes.len() {
            let departures = self.nodes[node]
                .router
                .link_traversal(cycle, &mut self.stats);
            for departure in departures {
                self.depart(node, departure, cycle)?;
            }

            let router = &mut self.nodes[node].router;
            router.switch_traversal(cycle, &mut self.stats);
            router.switch_allocation(cycle, &mut self.stats);
            router.vc_allocation(cycle, &mut self.stats);

            self.route_computation(node, cycle)?;
            self.nodes[node].router.local_injection(cycle);
        }
        Ok(())
    }

    fn depart(&mut self, node: NodeId, departure: Departure, cycle: Cycle) -> SimResult {
        if departure.input_port != Direction::Local {
            let Some(upstream) = self.mesh.neighbor(node, departure.input_port) else {
                return sim_error!(format!(
                    "Node {node} has no neighbour {} to return a credit to",
                    departure.input_port
                ));
            };
            self.nodes[upstream]
                .router
                .return_credit(departure.input_port.opposite(), departure.input_vc);
        }

        if departure.output == Direction::Local {
            if departure.flit.is_tail() {
                self.deliver(departure.flit.packet_id(), cycle)?;
            }
            return Ok(());
        }

        let Some(next) = self.mesh.neighbor(node, departure.output) else {
            return sim_error!(format!(
                "{} left node {node} towards {} where there is no neighbour",
                departure.flit, departure.output
            ));
        };
        self.queue.schedule(
            NocEvent::LinkArrival {
                node: next,
                port: departure.output.opposite(),
                vc: departure.output_vc,
                flit: departure.flit,
            },
            self.config.link_delay,
        );
        Ok(())
    }

    fn route_computation(&mut self, node: NodeId, cycle: Cycle) -> SimResult {
        for request in self.nodes[node].router.route_requests() {
            let direction = self.compute_route(node, &request.header, cycle)?;
            self.nodes[node].router.set_route(
                request.port,
                request.vc,
                direction,
                cycle,
                &mut self.stats,
            );
        }
        Ok(())
    }

    fn compute_route(
        &mut self,
        node: NodeId,
        header: &PacketHeader,
        cycle: Cycle,
    ) -> Result<Direction, SimError> {
        let Some(packet) = self.packets.get_mut(&header.id) else {
            return sim_error!(format!("Packet {} is not in flight", header.id));
        };

        if header.kind == PacketKind::BackwardAnt {
            // Retrace the forward ant's path, learning on the way
            if node != header.src {
                self.nodes[node]
                    .selection
                    .on_backward_ant(node, packet.memory(), &self.mesh);
                trace!(self.nodes[node].entity ; "pheromones updated by {packet}");
            }
            if node == header.dest {
                return Ok(Direction::Local);
            }
            let previous = packet.previous_hop(node);
            return match previous.and_then(|prev| self.mesh.direction_to(node, prev)) {
                Some(direction) => Ok(direction),
                None => sim_error!(format!("{packet} cannot retrace its path from node {node}")),
            };
        }

        if node == header.dest {
            return Ok(Direction::Local);
        }
        packet.memorize(node, cycle)?;

        let directions = self
            .routing
            .legal_directions(&self.mesh, header.src, node, header.dest);
        if let [direction] = directions.as_slice() {
            return Ok(*direction);
        }

        let candidates: Vec<Candidate> = directions
            .iter()
            .map(|direction| self.candidate(node, header, *direction))
            .collect();
        let context = SelectionContext {
            node,
            src: header.src,
            dest: header.dest,
            kind: header.kind,
        };
        Ok(self.nodes[node]
            .selection
            .select(&context, &candidates, &mut self.rng))
    }

    /// The congestion seen from `node` through `direction`.
    fn candidate(&self, node: NodeId, header: &PacketHeader, direction: Direction) -> Candidate {
        let Some(next) = self.mesh.neighbor(node, direction) else {
            return Candidate {
                direction,
                free_slots: 0,
                capacity: 0,
                look_ahead_free_slots: 0,
            };
        };
        let router = &self.nodes[next].router;
        let capacity = router.port_capacity();
        let look_ahead_free_slots = if next == header.dest {
            capacity
        } else {
            self.routing
                .legal_directions(&self.mesh, header.src, next, header.dest)
                .into_iter()
                .filter_map(|d| {
                    self.mesh
                        .neighbor(next, d)
                        .map(|n| self.nodes[n].router.free_slots(d.opposite()))
                })
                .max()
                .unwrap_or(0)
        };
        Candidate {
            direction,
            free_slots: router.free_slots(direction.opposite()),
            capacity,
            look_ahead_free_slots,
        }
    }

    /// The tail flit of a packet has been ejected.
    fn deliver(&mut self, id: PacketId, cycle: Cycle) -> SimResult {
        let Some(mut packet) = self.packets.remove(&id) else {
            return sim_error!(format!("Delivered packet {id} is not in flight"));
        };

        if packet.kind() == PacketKind::ForwardAnt {
            packet.memorize(packet.dest(), cycle)?;
        }
        packet.complete(cycle);
        self.stats.log_packet_transmitted(&packet);
        debug!(self.entity ; "delivered {packet} after {} cycles, {} hops",
            packet.delay().unwrap_or_default(), packet.hops());

        if packet.kind() == PacketKind::ForwardAnt {
            let size = self.config.ant_packet_size;
            let mut backward =
                self.new_packet(PacketKind::BackwardAnt, packet.dest(), packet.src(), size, None)?;
            backward.set_memory(packet.memory().to_vec());
            self.schedule_receive(backward, 1);
        }
        Ok(())
    }

    /// All statistics by name, including learnt pheromones.
    #[must_use]
    pub fn statistics_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let cycle = self.current_cycle();
        map.insert("simulationCycles".to_string(), cycle.to_string());
        self.stats.add_to_map(&mut map, cycle, self.num_nodes());

        for node in &self.nodes {
            let Some(pheromones) = node.selection.pheromones() else {
                continue;
            };
            for (dest, direction, weight) in pheromones.entries() {
                map.insert(
                    format!("node_{}.pheromones[node_{dest}][{direction}]", node.id()),
                    weight.to_string(),
                );
            }
        }
        map
    }
}
