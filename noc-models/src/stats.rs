// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Aggregate network statistics.
//!
//! Counters are updated when a packet is accepted into the network, when it
//! is delivered and whenever a flit changes pipeline state. Averages are
//! computed on demand.

use std::collections::BTreeMap;

use noc_engine::types::Cycle;

use crate::flit::FlitState;
use crate::packet::{Packet, PacketKind};

/// Count, total and maximum of a series of samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    count: u64,
    total: u64,
    max: u64,
}

impl Summary {
    pub fn sample(&mut self, value: u64) {
        self.count += 1;
        self.total += value;
        self.max = self.max.max(value);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Mean of the samples, 0 if there are none.
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }
}

/// Delay and hop counts of the delivered packets of one class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delay: Summary,
    pub hops: Summary,
}

impl DeliveryStats {
    fn sample(&mut self, delay: Cycle, hops: usize) {
        self.delay.sample(delay);
        self.hops.sample(hops as u64);
    }

    #[must_use]
    pub fn num_transmitted(&self) -> u64 {
        self.delay.count()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
    num_packets_received: u64,
    num_payload_packets_received: u64,
    all: DeliveryStats,
    payload: DeliveryStats,
    per_kind: [DeliveryStats; PacketKind::NUM],
    per_state: [Summary; FlitState::NUM],
}

/// Packets per cycle per node.
fn rate(count: u64, cycle: Cycle, num_nodes: usize) -> f64 {
    if cycle == 0 || num_nodes == 0 {
        0.0
    } else {
        count as f64 / cycle as f64 / num_nodes as f64
    }
}

impl Statistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_packet_received(&mut self, packet: &Packet) {
        self.num_packets_received += 1;
        if packet.has_payload() {
            self.num_payload_packets_received += 1;
        }
    }

    /// Record a delivered packet. Packets still in flight are ignored.
    pub fn log_packet_transmitted(&mut self, packet: &Packet) {
        let Some(delay) = packet.delay() else {
            return;
        };
        let hops = packet.hops();
        self.all.sample(delay, hops);
        if packet.has_payload() {
            self.payload.sample(delay, hops);
        }
        self.per_kind[packet.kind().index()].sample(delay, hops);
    }

    /// Record the number of cycles a flit spent in `state`.
    pub fn log_flit_per_state_delay(&mut self, state: FlitState, delay: Cycle) {
        self.per_state[state.index()].sample(delay);
    }

    #[must_use]
    pub fn num_packets_received(&self) -> u64 {
        self.num_packets_received
    }

    #[must_use]
    pub fn num_packets_transmitted(&self) -> u64 {
        self.all.num_transmitted()
    }

    #[must_use]
    pub fn num_payload_packets_received(&self) -> u64 {
        self.num_payload_packets_received
    }

    #[must_use]
    pub fn num_payload_packets_transmitted(&self) -> u64 {
        self.payload.num_transmitted()
    }

    #[must_use]
    pub fn all(&self) -> &DeliveryStats {
        &self.all
    }

    #[must_use]
    pub fn payload(&self) -> &DeliveryStats {
        &self.payload
    }

    #[must_use]
    pub fn per_kind(&self, kind: PacketKind) -> &DeliveryStats {
        &self.per_kind[kind.index()]
    }

    #[must_use]
    pub fn per_state(&self, state: FlitState) -> &Summary {
        &self.per_state[state.index()]
    }

    #[must_use]
    pub fn throughput(&self, cycle: Cycle, num_nodes: usize) -> f64 {
        rate(self.num_packets_transmitted(), cycle, num_nodes)
    }

    #[must_use]
    pub fn payload_throughput(&self, cycle: Cycle, num_nodes: usize) -> f64 {
        rate(self.num_payload_packets_transmitted(), cycle, num_nodes)
    }

    #[must_use]
    pub fn throughput_per_kind(&self, kind: PacketKind, cycle: Cycle, num_nodes: usize) -> f64 {
        rate(self.per_kind(kind).num_transmitted(), cycle, num_nodes)
    }

    /// Add all the statistics to `map` under their reported names.
    pub fn add_to_map(&self, map: &mut BTreeMap<String, String>, cycle: Cycle, num_nodes: usize) {
        let mut put = |key: String, value: String| {
            map.insert(key, value);
        };

        put(
            "numPacketsReceived".to_string(),
            self.num_packets_received.to_string(),
        );
        put(
            "numPacketsTransmitted".to_string(),
            self.num_packets_transmitted().to_string(),
        );
        put(
            "throughput".to_string(),
            self.throughput(cycle, num_nodes).to_string(),
        );
        put(
            "averagePacketDelay".to_string(),
            self.all.delay.average().to_string(),
        );
        put(
            "averagePacketHops".to_string(),
            self.all.hops.average().to_string(),
        );
        put(
            "maxPacketDelay".to_string(),
            self.all.delay.max().to_string(),
        );
        put("maxPacketHops".to_string(), self.all.hops.max().to_string());

        put(
            "numPayloadPacketsReceived".to_string(),
            self.num_payload_packets_received.to_string(),
        );
        put(
            "numPayloadPacketsTransmitted".to_string(),
            self.num_payload_packets_transmitted().to_string(),
        );
        put(
            "payloadThroughput".to_string(),
            self.payload_throughput(cycle, num_nodes).to_string(),
        );
        put(
            "averagePayloadPacketDelay".to_string(),
            self.payload.delay.average().to_string(),
        );
        put(
            "averagePayloadPacketHops".to_string(),
            self.payload.hops.average().to_string(),
        );
        put(
            "maxPayloadPacketDelay".to_string(),
            self.payload.delay.max().to_string(),
        );
        put(
            "maxPayloadPacketHops".to_string(),
            self.payload.hops.max().to_string(),
        );

        for kind in PacketKind::ALL {
            let stats = self.per_kind(kind);
            put(
                format!("numPacketsTransmitted::{kind}"),
                stats.num_transmitted().to_string(),
            );
            put(
                format!("throughput::{kind}"),
                self.throughput_per_kind(kind, cycle, num_nodes).to_string(),
            );
            put(
                format!("averagePacketDelay::{kind}"),
                stats.delay.average().to_string(),
            );
            put(
                format!("averagePacketHops::{kind}"),
                stats.hops.average().to_string(),
            );
        }

        for state in FlitState::ALL {
            let summary = self.per_state(state);
            put(
                format!("averageFlitPerStateDelay::{state}"),
                summary.average().to_string(),
            );
            put(
                format!("maxFlitPerStateDelay::{state}"),
                summary.max().to_string(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::config::NocConfig;

    fn delivered(id: u64, kind: PacketKind, begin: Cycle, end: Cycle, hops: usize) -> Packet {
        let mut packet = Packet::new(id, kind, 0, 9, 4, begin, &NocConfig::default()).unwrap();
        for node in 0..hops {
            packet.memorize(node, begin).unwrap();
        }
        packet.complete(end);
        packet
    }

    #[test]
    fn throughput_over_cycles_and_nodes() {
        let mut stats = Statistics::new();
        for id in 0..10 {
            let packet = delivered(id, PacketKind::Data, 0, 20, 2);
            stats.log_packet_received(&packet);
            stats.log_packet_transmitted(&packet);
        }
        assert_relative_eq!(stats.throughput(1000, 64), 0.00015625);
        assert_relative_eq!(stats.throughput(0, 64), 0.0);
    }

    #[test]
    fn payload_excludes_ants() {
        let mut stats = Statistics::new();
        let data = delivered(1, PacketKind::Data, 0, 10, 2);
        let ant = delivered(2, PacketKind::ForwardAnt, 5, 35, 6);
        for packet in [&data, &ant] {
            stats.log_packet_received(packet);
            stats.log_packet_transmitted(packet);
        }

        assert_eq!(stats.num_packets_transmitted(), 2);
        assert_eq!(stats.num_payload_packets_transmitted(), 1);
        assert_relative_eq!(stats.all().delay.average(), 20.0);
        assert_relative_eq!(stats.payload().delay.average(), 10.0);
        assert_eq!(stats.all().hops.max(), 6);
        assert_eq!(stats.per_kind(PacketKind::ForwardAnt).num_transmitted(), 1);
        assert_eq!(stats.per_kind(PacketKind::BackwardAnt).num_transmitted(), 0);
    }

    #[test]
    fn map_keys() {
        let mut stats = Statistics::new();
        stats.log_flit_per_state_delay(FlitState::Injected, 3);
        stats.log_flit_per_state_delay(FlitState::Injected, 5);

        let mut map = BTreeMap::new();
        stats.add_to_map(&mut map, 100, 16);
        assert_eq!(map["averageFlitPerStateDelay::INJECTED"], "4");
        assert_eq!(map["maxFlitPerStateDelay::INJECTED"], "5");
        assert_eq!(map["numPacketsTransmitted::forward-ant"], "0");
        assert_eq!(map["throughput"], "0");
        assert!(map.contains_key("averagePayloadPacketHops"));
    }
}
