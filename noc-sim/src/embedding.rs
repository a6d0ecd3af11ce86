// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Use the network as the interconnect of a larger system.
//!
//! Each device of the system is given its own node, in the order the
//! devices are listed. The mesh is grown to the next perfect square if the
//! number of devices is not one, leaving the extra nodes idle.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::rc::Rc;

use noc_engine::sim_error;
use noc_engine::types::{SimError, SimResult};
use noc_models::config::NocConfig;
use noc_models::mesh::NodeId;
use noc_models::network::Network;
use noc_models::packet::{CompletionCallback, PacketKind};
use noc_track::debug;
use noc_track::entity::Entity;

/// Smallest perfect square of at least `n` nodes, and at least 4.
#[must_use]
pub fn mesh_size_for(n: usize) -> usize {
    let mut width = 2;
    while width * width < n {
        width += 1;
    }
    width * width
}

pub struct Interconnect<D> {
    network: Network,
    nodes: BTreeMap<D, NodeId>,
}

impl<D> Interconnect<D>
where
    D: Ord + Clone + Debug,
{
    pub fn new(
        parent: &Rc<Entity>,
        config: NocConfig,
        devices: &[D],
    ) -> Result<Self, SimError> {
        let mut nodes = BTreeMap::new();
        for (node, device) in devices.iter().enumerate() {
            if nodes.insert(device.clone(), node).is_some() {
                return sim_error!(format!("Device {device:?} is attached twice"));
            }
        }

        let config = NocConfig {
            num_nodes: mesh_size_for(devices.len()),
            ..config
        };
        let network = Network::new(parent, config)?;
        debug!(network.entity ; "{} devices attached", devices.len());
        Ok(Self { network, nodes })
    }

    /// The node a device is attached to.
    pub fn node(&self, device: &D) -> Result<NodeId, SimError> {
        match self.nodes.get(device) {
            Some(node) => Ok(*node),
            None => sim_error!(format!("Device {device:?} is not attached")),
        }
    }

    /// Send `size` bytes from one device to another.
    ///
    /// The packet enters the network on the next cycle and `on_completed`
    /// is called once it has been delivered.
    pub fn transfer(
        &mut self,
        from: &D,
        to: &D,
        size: usize,
        on_completed: Option<CompletionCallback>,
    ) -> SimResult {
        let src = self.node(from)?;
        let dest = self.node(to)?;
        let packet = self
            .network
            .new_packet(PacketKind::Data, src, dest, size, on_completed)?;
        self.network.schedule_receive(packet, 1);
        Ok(())
    }

    pub fn advance_one_cycle(&mut self) -> SimResult {
        self.network.advance_one_cycle()
    }

    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }
}
