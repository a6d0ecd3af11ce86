// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The unit of delivery through the network.
//!
//! A [`Packet`] is split into flits when it is injected into its source
//! router. The flits only refer back to the packet through a
//! [`PacketHeader`], which is a copy of the packet's identity, so the packet
//! itself can be held by the network while its flits are owned by routers.

use std::fmt;

use noc_engine::sim_error;
use noc_engine::types::{Cycle, SimError, SimResult};

use crate::config::NocConfig;
use crate::flit::Flit;
use crate::mesh::NodeId;

/// Network-scoped packet identifier.
pub type PacketId = u64;

/// Called once when a packet has been delivered.
pub type CompletionCallback = Box<dyn FnOnce(&Packet)>;

/// The class of traffic a packet belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PacketKind {
    /// Ordinary traffic carrying a payload.
    Data,

    /// Control packet that explores a path and records it.
    ForwardAnt,

    /// Control packet that walks back along a forward ant's path updating
    /// pheromones.
    BackwardAnt,
}

impl PacketKind {
    pub const NUM: usize = 3;

    pub const ALL: [PacketKind; PacketKind::NUM] = [
        PacketKind::Data,
        PacketKind::ForwardAnt,
        PacketKind::BackwardAnt,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn has_payload(self) -> bool {
        self == PacketKind::Data
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PacketKind::Data => write!(f, "data"),
            PacketKind::ForwardAnt => write!(f, "forward-ant"),
            PacketKind::BackwardAnt => write!(f, "backward-ant"),
        }
    }
}

/// The immutable identity of a packet that travels with each of its flits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacketHeader {
    pub id: PacketId,
    pub kind: PacketKind,
    pub src: NodeId,
    pub dest: NodeId,
    pub num_flits: usize,
}

impl PacketHeader {
    /// Build the flits of this packet ready to be placed in input virtual
    /// channel `vc`.
    pub fn flits(self, vc: usize, cycle: Cycle) -> impl Iterator<Item = Flit> {
        (0..self.num_flits).map(move |index| Flit::new(self, index, vc, cycle))
    }
}

pub struct Packet {
    header: PacketHeader,
    size: usize,
    begin_cycle: Cycle,
    end_cycle: Option<Cycle>,
    memory: Vec<(NodeId, Cycle)>,
    on_completed: Option<CompletionCallback>,
}

impl Packet {
    /// Create a packet of `size` bytes.
    ///
    /// Fails if the packet would need more flits than an input virtual
    /// channel can hold, as it could then never be forwarded.
    ///
    /// Packets are built by [`Network::new_packet`](crate::network::Network::new_packet)
    /// so that they always match the network that carries them.
    pub(crate) fn new(
        id: PacketId,
        kind: PacketKind,
        src: NodeId,
        dest: NodeId,
        size: usize,
        begin_cycle: Cycle,
        config: &NocConfig,
    ) -> Result<Self, SimError> {
        let num_flits = size.div_ceil(config.link_width).max(1);
        if num_flits > config.max_input_buffer_size {
            return sim_error!(format!(
                "Number of flits ({}) in a packet cannot be greater than max input buffer size ({})",
                num_flits, config.max_input_buffer_size
            ));
        }
        if src >= config.num_nodes || dest >= config.num_nodes {
            return sim_error!(format!(
                "Packet {id} from {src} to {dest} is outside a mesh of {} nodes",
                config.num_nodes
            ));
        }

        Ok(Self {
            header: PacketHeader {
                id,
                kind,
                src,
                dest,
                num_flits,
            },
            size,
            begin_cycle,
            end_cycle: None,
            memory: Vec::new(),
            on_completed: None,
        })
    }

    /// Attach a function to be called when the packet is delivered.
    #[must_use]
    pub fn with_on_completed(mut self, on_completed: CompletionCallback) -> Self {
        self.on_completed = Some(on_completed);
        self
    }

    #[must_use]
    pub fn header(&self) -> PacketHeader {
        self.header
    }

    #[must_use]
    pub fn id(&self) -> PacketId {
        self.header.id
    }

    #[must_use]
    pub fn kind(&self) -> PacketKind {
        self.header.kind
    }

    #[must_use]
    pub fn src(&self) -> NodeId {
        self.header.src
    }

    #[must_use]
    pub fn dest(&self) -> NodeId {
        self.header.dest
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn num_flits(&self) -> usize {
        self.header.num_flits
    }

    #[must_use]
    pub fn begin_cycle(&self) -> Cycle {
        self.begin_cycle
    }

    pub(crate) fn set_begin_cycle(&mut self, cycle: Cycle) {
        self.begin_cycle = cycle;
    }

    /// Cycle at which the tail flit was ejected, `None` while in flight.
    #[must_use]
    pub fn end_cycle(&self) -> Option<Cycle> {
        self.end_cycle
    }

    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.end_cycle.is_some()
    }

    /// Cycles from creation to delivery.
    #[must_use]
    pub fn delay(&self) -> Option<Cycle> {
        self.end_cycle.map(|end| end - self.begin_cycle)
    }

    #[must_use]
    pub fn hops(&self) -> usize {
        self.memory.len()
    }

    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.header.kind.has_payload()
    }

    /// The nodes visited so far with the cycle of each visit.
    #[must_use]
    pub fn memory(&self) -> &[(NodeId, Cycle)] {
        &self.memory
    }

    pub(crate) fn set_memory(&mut self, memory: Vec<(NodeId, Cycle)>) {
        self.memory = memory;
    }

    /// Record a visit to `node`.
    ///
    /// A packet visiting the same node twice means routing has looped, which
    /// is a fatal error.
    pub fn memorize(&mut self, node: NodeId, cycle: Cycle) -> SimResult {
        if self.memory.iter().any(|(visited, _)| *visited == node) {
            return sim_error!(format!(
                "{self} visited node {node} twice (path {:?})",
                self.memory.iter().map(|(n, _)| *n).collect::<Vec<_>>()
            ));
        }
        self.memory.push((node, cycle));
        Ok(())
    }

    /// The node visited just before `node`, used to retrace a path.
    #[must_use]
    pub fn previous_hop(&self, node: NodeId) -> Option<NodeId> {
        let index = self.memory.iter().position(|(n, _)| *n == node)?;
        index.checked_sub(1).map(|prev| self.memory[prev].0)
    }

    /// Stamp the delivery cycle and fire the completion callback.
    pub(crate) fn complete(&mut self, cycle: Cycle) {
        self.end_cycle = Some(cycle);
        if let Some(on_completed) = self.on_completed.take() {
            on_completed(self);
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} packet {} ({} -> {})",
            self.header.kind, self.header.id, self.header.src, self.header.dest
        )
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("header", &self.header)
            .field("size", &self.size)
            .field("begin_cycle", &self.begin_cycle)
            .field("end_cycle", &self.end_cycle)
            .field("memory", &self.memory)
            .finish_non_exhaustive()
    }
}
