// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Ensure that all versions of each macro can be used

use std::rc::Rc;

use noc_track::entity::{Entity, toplevel};
use noc_track::test_helpers::check_and_clear;
use noc_track::{debug, error, info, set_time, test_init, trace, warn};

#[test]
fn log_levels() {
    let (test_tracker, tracker) = test_init!(10);
    let top = toplevel(&tracker, "top");
    check_and_clear(&test_tracker, &["0: created 10, top"]);

    trace!(top ; "trace {}", 1);
    debug!(top ; "debug {}", 2);
    info!(top ; "info");
    warn!(top ; "warn {val}", val = 4);
    error!(top ; "error");

    check_and_clear(
        &test_tracker,
        &[
            "10:TRACE: trace 1",
            "10:DEBUG: debug 2",
            "10:INFO: info",
            "10:WARN: warn 4",
            "10:ERROR: error",
        ],
    );
}

#[test]
fn hierarchy() {
    let (test_tracker, tracker) = test_init!(20);
    let top = toplevel(&tracker, "top");
    let network = Rc::new(Entity::new(&top, "network"));
    let node = Entity::new(&network, "node3");

    assert_eq!(node.full_name(), "top::network::node3");
    assert_eq!(format!("{node}"), "top::network::node3");
    check_and_clear(
        &test_tracker,
        &[
            "0: created 20, top",
            "20: created 21, top::network",
            "21: created 22, top::network::node3",
        ],
    );

    drop(node);
    check_and_clear(&test_tracker, &["21: destroyed 22"]);
}

#[test]
fn time() {
    let (test_tracker, tracker) = test_init!(1);
    let top = toplevel(&tracker, "top");
    set_time!(top ; 42);
    check_and_clear(
        &test_tracker,
        &["0: created 1, top", "1: set time to cycle 42"],
    );
}
