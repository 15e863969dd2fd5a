//! The host optimisation model.
//!
//! An [`EnergySystemModel`] holds the data shared by every asset (the time index, indexed time
//! series and scalar parameters) along with the blocks that assets have attached to it.
use crate::block::Block;
use crate::id::{BlockID, TimeStepID};
use crate::time_index::TimeIndex;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::debug;

/// A time series mapping each time step to a value
pub type ProfileMap = IndexMap<TimeStepID, f64>;

/// Name of the time index in the model
pub const TIME_INDEX_NAME: &str = "t";

/// Model definition
#[derive(Debug, Default)]
pub struct EnergySystemModel {
    time_index: Option<TimeIndex>,
    time_series: IndexMap<String, ProfileMap>,
    parameters: IndexMap<String, f64>,
    blocks: IndexMap<BlockID, Block>,
}

impl EnergySystemModel {
    /// Create a new, empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time index for the model, replacing any previous one
    pub fn set_time_index(&mut self, time_index: TimeIndex) {
        self.time_index = Some(time_index);
    }

    /// Add a time series indexed by time step
    pub fn add_time_series(&mut self, name: &str, series: ProfileMap) -> Result<()> {
        ensure!(
            !self.time_series.contains_key(name),
            "Time series {name} is already defined"
        );
        self.time_series.insert(name.to_string(), series);

        Ok(())
    }

    /// Add a scalar parameter
    pub fn add_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        ensure!(
            !self.parameters.contains_key(name),
            "Parameter {name} is already defined"
        );
        self.parameters.insert(name.to_string(), value);

        Ok(())
    }

    /// The model's time index
    pub fn time_index(&self) -> Result<&TimeIndex> {
        self.time_index
            .as_ref()
            .with_context(|| format!("Model has no time index {TIME_INDEX_NAME}"))
    }

    /// Get a time series by name
    pub fn time_series(&self, name: &str) -> Result<&ProfileMap> {
        self.time_series
            .get(name)
            .with_context(|| format!("Model has no time series {name}"))
    }

    /// Get a scalar parameter by name
    pub fn parameter(&self, name: &str) -> Result<f64> {
        self.parameters
            .get(name)
            .copied()
            .with_context(|| format!("Model has no parameter {name}"))
    }

    /// Add a block to the model.
    ///
    /// Fails if a block with the same ID is already present, in which case the existing block is
    /// left untouched.
    pub fn add_block(&mut self, block: Block) -> Result<()> {
        self.check_block_id_free(&block.id)?;

        debug!("Adding block {} to model", block.id);
        self.blocks.insert(block.id.clone(), block);

        Ok(())
    }

    /// Check that no block called `id` has been added yet
    pub fn check_block_id_free(&self, id: &BlockID) -> Result<()> {
        ensure!(
            !self.blocks.contains_key(id),
            "Model already has a component named {id}"
        );

        Ok(())
    }

    /// Whether a block with the given ID has been added
    pub fn contains_block(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    /// Get a block by ID
    pub fn get_block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Iterate over the model's blocks in the order they were added
    pub fn iter_blocks(&self) -> indexmap::map::Values<'_, BlockID, Block> {
        self.blocks.values()
    }
}
