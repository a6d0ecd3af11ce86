// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use noc_engine::test_helpers::start_test;
use noc_models::config::NocConfig;
use noc_models::mesh::Direction;
use noc_models::network::Network;
use noc_models::packet::PacketKind;
use rand::Rng;

fn east_and_south(network: &Network) -> (f64, f64) {
    let table = network.node(0).selection().pheromones().unwrap();
    (
        table.weight(3, Direction::East),
        table.weight(3, Direction::South),
    )
}

#[test]
fn repeated_ants_reinforce_the_path() {
    let engine = start_test(file!());
    let config = NocConfig {
        num_nodes: 16,
        ..Default::default()
    };
    let mut network = Network::new(engine.top(), config).unwrap();

    let (mut east, south) = east_and_south(&network);
    assert_eq!(east, south);

    for _ in 0..5 {
        let ant = network
            .new_packet(PacketKind::ForwardAnt, 0, 3, 4, None)
            .unwrap();
        assert!(network.receive(ant));
        while network.num_in_flight() > 0 {
            network.advance_one_cycle().unwrap();
        }

        let (new_east, new_south) = east_and_south(&network);
        assert!(new_east > east);
        assert!(new_east > new_south);
        east = new_east;
    }

    let stats = network.statistics();
    assert_eq!(stats.per_kind(PacketKind::ForwardAnt).num_transmitted(), 5);
    assert_eq!(stats.per_kind(PacketKind::BackwardAnt).num_transmitted(), 5);
    assert_eq!(stats.num_payload_packets_transmitted(), 0);
    // A forward ant also records its destination
    assert_eq!(stats.per_kind(PacketKind::ForwardAnt).hops.max(), 4);
}

#[test]
fn ants_and_data_drain() {
    let engine = start_test(file!());
    let config = NocConfig {
        num_nodes: 16,
        ..Default::default()
    };
    let mut network = Network::new(engine.top(), config.clone()).unwrap();

    for _ in 0..500 {
        for src in 0..network.num_nodes() {
            for (kind, size, rate) in [
                (PacketKind::Data, 16, 0.04),
                (PacketKind::ForwardAnt, config.ant_packet_size, 0.02),
            ] {
                if network.rng_mut().r#gen::<f64>() < rate {
                    let dest = network.rand_dest(src);
                    let packet = network.new_packet(kind, src, dest, size, None).unwrap();
                    network.receive(packet);
                }
            }
        }
        network.advance_one_cycle().unwrap();
    }
    while network.num_in_flight() > 0 {
        network.advance_one_cycle().unwrap();
        assert!(network.current_cycle() < 100_000);
    }

    let stats = network.statistics();
    assert_eq!(stats.num_packets_received(), stats.num_packets_transmitted());
    assert_eq!(
        stats.per_kind(PacketKind::ForwardAnt).num_transmitted(),
        stats.per_kind(PacketKind::BackwardAnt).num_transmitted()
    );
}
