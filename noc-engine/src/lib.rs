// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The core of the NoC simulation engine.
//!
//! Simulations are cycle based: a model owns an
//! [`EventQueue`](crate::event_queue::EventQueue) of its own event type,
//! advances it one cycle at a time and handles the events that become due.
//! There is no global scheduler, which means that independent simulations
//! can be run on separate threads without sharing any state.
//!
//! The [`Engine`](crate::engine::Engine) provides the top-level
//! [`Entity`](noc_track::entity::Entity) and
//! [`Tracker`](noc_track::Tracker) for a simulation, and
//! [`types`] defines the error handling used throughout.

pub mod engine;
pub mod event_queue;
pub mod test_helpers;
pub mod types;
