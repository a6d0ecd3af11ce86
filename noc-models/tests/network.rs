// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use noc_engine::test_helpers::start_test;
use noc_models::config::{NocConfig, RoutingAlgorithm, SelectionAlgorithm};
use noc_models::mesh::NodeId;
use noc_models::network::Network;
use noc_models::packet::{CompletionCallback, Packet, PacketKind};
use rand::Rng;

/// What was seen of a packet when it was delivered.
#[derive(Clone, Debug)]
struct Delivery {
    src: NodeId,
    dest: NodeId,
    delay: u64,
    hops: usize,
    path: Vec<NodeId>,
}

type Deliveries = Rc<RefCell<Vec<Delivery>>>;

fn record(deliveries: &Deliveries) -> CompletionCallback {
    let deliveries = deliveries.clone();
    Box::new(move |packet: &Packet| {
        deliveries.borrow_mut().push(Delivery {
            src: packet.src(),
            dest: packet.dest(),
            delay: packet.delay().unwrap(),
            hops: packet.hops(),
            path: packet.memory().iter().map(|(node, _)| *node).collect(),
        });
    })
}

/// Inject uniform random data traffic for `cycles` cycles then drain.
fn run_random_traffic(
    network: &mut Network,
    cycles: u64,
    rate: f64,
    deliveries: &Deliveries,
) -> u64 {
    for _ in 0..cycles {
        for src in 0..network.num_nodes() {
            if network.rng_mut().r#gen::<f64>() < rate {
                let dest = network.rand_dest(src);
                let packet = network
                    .new_packet(PacketKind::Data, src, dest, 16, Some(record(deliveries)))
                    .unwrap();
                network.receive(packet);
            }
            let stats = network.statistics();
            assert!(stats.num_packets_received() >= stats.num_packets_transmitted());
        }
        network.advance_one_cycle().unwrap();
    }

    let mut drain_cycles = 0;
    while network.num_in_flight() > 0 {
        network.advance_one_cycle().unwrap();
        drain_cycles += 1;
        assert!(drain_cycles < 100_000, "network failed to drain");
    }
    drain_cycles
}

#[test]
fn xy_path() {
    let engine = start_test(file!());
    let config = NocConfig {
        routing: RoutingAlgorithm::Xy,
        ..Default::default()
    };
    let mut network = Network::new(engine.top(), config).unwrap();
    let deliveries = Deliveries::default();

    let packet = network
        .new_packet(PacketKind::Data, 0, 9, 16, Some(record(&deliveries)))
        .unwrap();
    assert!(network.receive(packet));

    while network.num_in_flight() > 0 {
        network.advance_one_cycle().unwrap();
    }

    let deliveries = deliveries.borrow();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].path, vec![0, 1]);
    assert_eq!(deliveries[0].hops, 2);
    assert_eq!(network.statistics().num_packets_transmitted(), 1);
}

#[test]
fn packet_too_large() {
    let engine = start_test(file!());
    let mut network = Network::new(engine.top(), NocConfig::default()).unwrap();
    assert!(network.new_packet(PacketKind::Data, 0, 1, 16, None).is_ok());
    let err = network
        .new_packet(PacketKind::Data, 0, 1, 17, None)
        .unwrap_err();
    assert_eq!(
        err.0,
        "Number of flits (5) in a packet cannot be greater than max input buffer size (4)"
    );
}

#[test]
fn packets_from_another_network_rejected() {
    let engine = start_test(file!());
    let mut network = Network::new(
        engine.top(),
        NocConfig {
            num_nodes: 16,
            ..Default::default()
        },
    )
    .unwrap();
    let mut deep = Network::new(
        engine.top(),
        NocConfig {
            num_nodes: 16,
            max_input_buffer_size: 8,
            ..Default::default()
        },
    )
    .unwrap();
    let mut large = Network::new(engine.top(), NocConfig::default()).unwrap();

    // 8 flits do not fit the 4 flit input buffers
    let oversized = deep.new_packet(PacketKind::Data, 0, 1, 32, None).unwrap();
    assert!(!network.receive(oversized));

    // Node 40 is outside a 16 node mesh
    let outside = large.new_packet(PacketKind::Data, 40, 1, 4, None).unwrap();
    assert!(!network.receive(outside));
    assert_eq!(network.num_in_flight(), 0);

    // The node still injects its own traffic
    let own = network.new_packet(PacketKind::Data, 0, 1, 16, None).unwrap();
    assert_eq!(own.id(), 0);
    assert!(network.receive(own));

    // Same id as the packet already in flight
    let mut fresh = Network::new(engine.top(), NocConfig::default()).unwrap();
    let clash = fresh.new_packet(PacketKind::Data, 2, 3, 4, None).unwrap();
    assert_eq!(clash.id(), 0);
    assert!(!network.receive(clash));

    run_random_traffic(&mut network, 0, 0.0, &Deliveries::default());
    assert_eq!(network.statistics().num_packets_received(), 1);
    assert_eq!(network.statistics().num_packets_transmitted(), 1);
}

#[test]
fn flit_state_delays_of_one_packet() {
    let engine = start_test(file!());
    let config = NocConfig {
        routing: RoutingAlgorithm::Xy,
        link_delay: 3,
        ..Default::default()
    };
    let mut network = Network::new(engine.top(), config).unwrap();
    let packet = network.new_packet(PacketKind::Data, 0, 9, 16, None).unwrap();
    assert!(network.receive(packet));
    while network.num_in_flight() > 0 {
        network.advance_one_cycle().unwrap();
    }

    let map = network.statistics_map();
    assert_eq!(map["maxFlitPerStateDelay::LINK_TRAVERSE"], "3");
    assert_eq!(map["averageFlitPerStateDelay::LINK_TRAVERSE"], "3");
    assert_eq!(map["maxFlitPerStateDelay::ROUTE_COMPUTE"], "1");
}

#[test]
fn not_a_square_mesh() {
    let engine = start_test(file!());
    let config = NocConfig {
        num_nodes: 12,
        ..Default::default()
    };
    let err = Network::new(engine.top(), config).err().unwrap();
    assert!(err.0.starts_with("Only 2D meshes are supported"));
}

#[test]
fn delivered_packets_are_consistent() {
    let engine = start_test(file!());
    let config = NocConfig {
        num_nodes: 16,
        selection: SelectionAlgorithm::BufferLevel,
        link_delay: 2,
        ..Default::default()
    };
    let mut network = Network::new(engine.top(), config).unwrap();
    let deliveries = Deliveries::default();
    run_random_traffic(&mut network, 400, 0.05, &deliveries);

    let stats = network.statistics();
    assert_eq!(stats.num_packets_received(), stats.num_packets_transmitted());

    let deliveries = deliveries.borrow();
    assert_eq!(deliveries.len() as u64, stats.num_packets_transmitted());
    assert!(!deliveries.is_empty());
    let mesh = *network.mesh();
    for delivery in deliveries.iter() {
        assert!(delivery.delay >= delivery.hops as u64 * 2);
        assert_eq!(delivery.hops, delivery.path.len());
        assert_eq!(delivery.hops, mesh.distance(delivery.src, delivery.dest));
        let mut sorted = delivery.path.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), delivery.path.len());
    }
}

#[test]
fn saturated_injection_buffer_retries() {
    let engine = start_test(file!());
    let config = NocConfig {
        num_nodes: 16,
        max_injection_buffer_size: 1,
        ..Default::default()
    };
    let mut network = Network::new(engine.top(), config).unwrap();
    let deliveries = Deliveries::default();

    let first = network
        .new_packet(PacketKind::Data, 0, 15, 16, Some(record(&deliveries)))
        .unwrap();
    let second = network
        .new_packet(PacketKind::Data, 0, 10, 16, Some(record(&deliveries)))
        .unwrap();
    assert!(network.receive(first));
    assert!(!network.receive(second));
    assert_eq!(network.statistics().num_packets_received(), 1);
    assert_eq!(network.num_in_flight(), 2);

    for _ in 0..200 {
        network.advance_one_cycle().unwrap();
    }
    assert_eq!(network.num_in_flight(), 0);
    assert_eq!(network.statistics().num_packets_received(), 2);
    let dests: Vec<_> = deliveries.borrow().iter().map(|d| d.dest).collect();
    assert!(dests.contains(&15));
    assert!(dests.contains(&10));
}

fn statistics_of_run(config: NocConfig) -> BTreeMap<String, String> {
    let engine = start_test(file!());
    let mut network = Network::new(engine.top(), config).unwrap();
    run_random_traffic(&mut network, 300, 0.03, &Deliveries::default());
    network.statistics_map()
}

#[test]
fn identical_seeds_identical_results() {
    let config = NocConfig {
        num_nodes: 16,
        selection: SelectionAlgorithm::NeighborOnPath,
        ..Default::default()
    };
    let first = statistics_of_run(config.clone());
    let second = statistics_of_run(config.clone());
    assert_eq!(first, second);

    let other = statistics_of_run(NocConfig {
        rand_seed: 99,
        ..config
    });
    assert_ne!(first, other);
}

#[test]
fn statistics_map_contents() {
    let map = statistics_of_run(NocConfig {
        num_nodes: 16,
        ..Default::default()
    });
    assert_eq!(map["numPacketsReceived"], map["numPacketsTransmitted"]);
    assert!(map.contains_key("simulationCycles"));
    assert!(map.contains_key("averageFlitPerStateDelay::SWITCH_TRAVERSE"));
    assert!(map.contains_key("averagePacketDelay::data"));
    // ACO is the default selection so pheromones are reported
    assert!(map.contains_key("node_0.pheromones[node_3][EAST]"));
    assert!(!map.contains_key("node_0.pheromones[node_3][WEST]"));
}

#[test]
fn throughput_is_per_cycle_per_node() {
    let engine = start_test(file!());
    let config = NocConfig {
        num_nodes: 16,
        routing: RoutingAlgorithm::Xy,
        ..Default::default()
    };
    let mut network = Network::new(engine.top(), config).unwrap();
    assert_eq!(network.throughput(), 0.0);

    for src in 0..4 {
        let packet = network
            .new_packet(PacketKind::Data, src, src + 4, 4, None)
            .unwrap();
        network.receive(packet);
    }
    for _ in 0..100 {
        network.advance_one_cycle().unwrap();
    }
    approx::assert_relative_eq!(network.throughput(), 4.0 / 100.0 / 16.0);
    approx::assert_relative_eq!(network.payload_throughput(), network.throughput());
    assert_eq!(network.throughput_per_kind(PacketKind::ForwardAnt), 0.0);
}
