//! A solar-thermal collector asset block for energy system optimisation models.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod block;
pub mod cli;
pub mod collector;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod optimisation;
pub mod output;
pub mod settings;
pub mod time_index;

#[cfg(test)]
mod fixture;

/// Get the config folder for the program, if the platform has one
pub fn get_config_dir() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("st_collector");
    Some(path)
}
