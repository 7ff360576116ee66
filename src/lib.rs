//! An agent-based simulation of bargaining within households.
//!
//! Households on a grid each hold two members who bargain every tick over which portfolio of
//! activities to pursue. Members then adapt how much they hold out for by looking at their
//! wealthier neighbours.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod activity;
pub mod cli;
pub mod grid;
pub mod household;
pub mod id;
pub mod input;
pub mod log;
pub mod member;
pub mod metrics;
pub mod model;
pub mod output;
pub mod portfolio;
pub mod schedule;
pub mod settings;
pub mod simulation;
pub mod units;
pub mod world;

#[cfg(test)]
mod fixture;

/// Get the config dir for the program
pub fn get_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir on this platform, so use the working directory
        return PathBuf::new();
    };

    config_dir.push("hhbargain");
    config_dir
}
