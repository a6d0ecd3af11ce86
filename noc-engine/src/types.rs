// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

/// A point in simulated time, counted in clock cycles.
pub type Cycle = u64;

// Simulation errors

#[macro_export]
/// Build a [SimError] from a message that supports `to_string`
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError($msg.to_string()))
    };
}

/// The `SimError` is what should be returned in the case of an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimError(pub String);

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for SimError {}

impl From<noc_track::tracker::TrackConfigError> for SimError {
    fn from(e: noc_track::tracker::TrackConfigError) -> Self {
        SimError(e.0)
    }
}

/// The SimResult is the return type for most simulation functions
pub type SimResult = Result<(), SimError>;
