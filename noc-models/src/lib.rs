// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! A cycle-accurate model of a wormhole-routed 2D mesh network-on-chip.
//!
//! The [`Network`](crate::network::Network) owns one
//! [`Node`](crate::node::Node) per tile. Each node has a
//! [`Router`](crate::router::Router) with virtual channel buffers and credit
//! based flow control, and a [`Selection`](crate::selection::Selection)
//! strategy that picks between the directions a
//! [`Routing`](crate::routing::Routing) policy allows.
//!
//! # Example
//!
//! ```rust
//! use noc_engine::engine::Engine;
//! use noc_models::config::{NocConfig, RoutingAlgorithm};
//! use noc_models::network::Network;
//! use noc_models::packet::PacketKind;
//!
//! let engine = Engine::default();
//! let config = NocConfig {
//!     num_nodes: 16,
//!     routing: RoutingAlgorithm::Xy,
//!     ..Default::default()
//! };
//! let mut network = Network::new(engine.top(), config).unwrap();
//!
//! let packet = network
//!     .new_packet(PacketKind::Data, 0, 15, 16, None)
//!     .unwrap();
//! assert!(network.receive(packet));
//!
//! while network.statistics().num_packets_transmitted() == 0 {
//!     network.advance_one_cycle().unwrap();
//! }
//! assert_eq!(network.statistics().all().hops.max(), 6);
//! ```

pub mod arbiter;
pub mod config;
pub mod flit;
pub mod mesh;
pub mod network;
pub mod node;
pub mod packet;
pub mod router;
pub mod routing;
pub mod selection;
pub mod stats;

/// The single random number generator shared by traffic and selection.
pub type NocRng = rand::rngs::StdRng;
