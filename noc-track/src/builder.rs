// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Library functions to build trackers as defined by the user.

use std::fs;
use std::io::{self, BufWriter};
use std::rc::Rc;

use crate::tracker::{DevNullTracker, EntityManager, TextTracker, TrackConfigError};
use crate::{Tracker, Writer};

/// Configuration options for a text tracker.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Enable this tracker.
    pub enable: bool,

    /// Set the level at which this tracker should be enabled.
    pub level: log::Level,

    /// A regular expression to match which entities should have this level
    /// applied. All others are set to `Error`.
    pub filter_regex: String,

    /// If set, the name of the file to which the tracker will write instead
    /// of `stdout`.
    pub file: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enable: true,
            level: log::Level::Warn,
            filter_regex: String::new(),
            file: None,
        }
    }
}

/// Build a tracker according to the configuration.
///
/// The user can pass a filter regular expression which will set the level
/// only for matching Entities and set all other Entities to only emit errors.
/// A disabled tracker discards all events.
pub fn build_tracker(config: &TrackerConfig) -> Result<Tracker, TrackConfigError> {
    if !config.enable {
        return Ok(Rc::new(DevNullTracker {}));
    }

    let default_level = if config.filter_regex.is_empty() {
        config.level
    } else {
        log::Level::Error
    };

    let mut entity_manager = EntityManager::new(default_level);
    if !config.filter_regex.is_empty() {
        entity_manager.add_entity_level_filter(&config.filter_regex, config.level)?;
    }

    let writer: Writer = match &config.file {
        Some(file) => {
            let file = fs::File::create(file).map_err(|e| {
                TrackConfigError(format!("Unable to create log file '{file}': {e}"))
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };
    Ok(Rc::new(TextTracker::new(entity_manager, writer)))
}
