// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Synthetic traffic sources.
//!
//! Every cycle each node injects a packet with a probability equal to the
//! injection rate. The destination is chosen by a [`TrafficPattern`].

use std::fmt;
use std::rc::Rc;

use noc_engine::types::SimError;
use noc_models::mesh::{Mesh, NodeId};
use noc_models::network::Network;
use noc_models::packet::PacketKind;
use noc_track::entity::Entity;
use noc_track::trace;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(clap::ValueEnum, Clone, Copy, Default, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TrafficPattern {
    /// Any node other than the source, uniformly
    #[default]
    Uniform,

    /// The node at the transposed coordinates, (x, y) sends to (y, x).
    /// Nodes on the diagonal do not send.
    Transpose,

    /// Biased towards the nodes at the centre of the mesh
    Hotspot,
}

impl fmt::Display for TrafficPattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrafficPattern::Uniform => write!(f, "uniform"),
            TrafficPattern::Transpose => write!(f, "transpose"),
            TrafficPattern::Hotspot => write!(f, "hotspot"),
        }
    }
}

/// The one node at the centre of an odd width mesh, or the four around the
/// centre of an even width mesh.
#[must_use]
pub fn central_nodes(mesh: &Mesh) -> Vec<NodeId> {
    let width = mesh.width();
    let mid = width / 2;
    if width % 2 == 1 {
        vec![mesh.id_at(mid, mid)]
    } else {
        vec![
            mesh.id_at(mid - 1, mid - 1),
            mesh.id_at(mid, mid - 1),
            mesh.id_at(mid - 1, mid),
            mesh.id_at(mid, mid),
        ]
    }
}

/// Generates one class of packets at every node.
pub struct TrafficGenerator {
    pub entity: Rc<Entity>,
    kind: PacketKind,
    pattern: TrafficPattern,
    packet_size: usize,
    injection_rate: f64,
    hotspot_fraction: f64,
    hotspots: Vec<NodeId>,
    num_generated: u64,
}

impl TrafficGenerator {
    #[must_use]
    pub fn new(
        parent: &Rc<Entity>,
        kind: PacketKind,
        pattern: TrafficPattern,
        packet_size: usize,
        injection_rate: f64,
        hotspot_fraction: f64,
        mesh: &Mesh,
    ) -> Self {
        let entity = Rc::new(Entity::new(parent, &format!("{kind}_traffic")));
        Self {
            entity,
            kind,
            pattern,
            packet_size,
            injection_rate,
            hotspot_fraction,
            hotspots: central_nodes(mesh),
            num_generated: 0,
        }
    }

    #[must_use]
    pub fn num_generated(&self) -> u64 {
        self.num_generated
    }

    /// The destination of a packet from `src`, `None` if `src` does not send
    /// under this pattern.
    pub fn dest(&self, network: &mut Network, src: NodeId) -> Option<NodeId> {
        match self.pattern {
            TrafficPattern::Uniform => Some(network.rand_dest(src)),
            TrafficPattern::Transpose => {
                let mesh = network.mesh();
                let (x, y) = (mesh.x(src), mesh.y(src));
                (x != y).then(|| mesh.id_at(y, x))
            }
            TrafficPattern::Hotspot => {
                if network.rng_mut().r#gen::<f64>() < self.hotspot_fraction {
                    let dest = *self.hotspots.choose(network.rng_mut())?;
                    if dest != src {
                        return Some(dest);
                    }
                }
                Some(network.rand_dest(src))
            }
        }
    }

    /// Give every node the chance to inject one packet this cycle.
    ///
    /// Returns the number of packets created.
    pub fn generate(&mut self, network: &mut Network) -> Result<u64, SimError> {
        if self.injection_rate <= 0.0 {
            return Ok(0);
        }

        let mut num_created = 0;
        for src in 0..network.num_nodes() {
            if network.rng_mut().r#gen::<f64>() >= self.injection_rate {
                continue;
            }
            let Some(dest) = self.dest(network, src) else {
                continue;
            };
            let packet = network.new_packet(self.kind, src, dest, self.packet_size, None)?;
            trace!(self.entity ; "{packet} created");
            network.receive(packet);
            num_created += 1;
        }
        self.num_generated += num_created;
        Ok(num_created)
    }
}
