// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Experiments on the NoC model.
//!
//! This crate provides everything around the network model needed to run
//! it:
//!  - [`config`]: layered configuration (defaults, TOML, environment and
//!    command line).
//!  - [`traffic`]: synthetic traffic sources.
//!  - [`experiment`]: run to a cycle or packet limit, drain and report.
//!  - [`sweep`]: run a set of experiments in parallel.
//!  - [`embedding`]: attach the devices of a larger model to the network.
//!
//! The `sim-noc` binary exposes all of it on the command line.

pub mod config;
pub mod embedding;
pub mod experiment;
pub mod sweep;
pub mod traffic;
