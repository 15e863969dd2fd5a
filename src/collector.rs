//! Solar-thermal collector assets.
//!
//! A collector's heat output is fixed by an exogenous, normalised production profile scaled by
//! the installed capacity. A companion binary variable records whether the collector is producing
//! at each time step.
use crate::block::{Block, Domain, LinearConstraint, Port, PortKind, VariableRef};
use crate::id::{BlockID, TimeStepID};
use crate::input::profile::ProfileTable;
use crate::model::{EnergySystemModel, ProfileMap};
use crate::time_index::TimeIndex;
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

/// Time series holding the raw (un-normalised) heat profile
pub const RAW_PROFILE_SERIES: &str = "solar_thermal_heat_profile";

/// Time series holding the normalised heat profile
pub const NORMALIZED_PROFILE_SERIES: &str = "normalized_solar_thermal_heat_profile";

/// Scalar parameter holding the installed collector capacity
pub const INSTALLED_CAPACITY_PARAM: &str = "INSTALLED_ST_POWER";

/// Binary variable indicating whether the collector is producing
pub const BIN_VAR: &str = "bin";

/// Heat output variable
pub const HEAT_VAR: &str = "heat";

/// Output port carrying the heat output
pub const HEAT_OUT_PORT: &str = "heat_out";

/// Label under which heat is exposed on [`HEAT_OUT_PORT`]
pub const HEAT_LABEL: &str = "st_heat";

/// Constraint linking [`BIN_VAR`] to the raw profile
pub const BIN_CONSTRAINT: &str = "bin_rule";

/// Constraint fixing [`HEAT_VAR`] to the scaled normalised profile
pub const PROFILE_CONSTRAINT: &str = "profile_constraint";

/// The data a collector reads from its host model
#[derive(Debug, Clone, Copy)]
pub struct HostView<'a> {
    /// The time steps to define variables and constraints for
    pub time_index: &'a TimeIndex,
    /// Profile deciding whether the collector is on (> 0) or off (<= 0)
    pub raw_profile: &'a ProfileMap,
    /// Profile which, scaled by `installed_capacity`, gives the heat output
    pub normalized_profile: &'a ProfileMap,
    /// Installed collector capacity
    pub installed_capacity: f64,
}

impl<'a> HostView<'a> {
    /// Look up the collector's inputs on `model`.
    ///
    /// Fails if any of them is missing.
    pub fn from_model(model: &'a EnergySystemModel) -> Result<Self> {
        Ok(Self {
            time_index: model.time_index()?,
            raw_profile: model.time_series(RAW_PROFILE_SERIES)?,
            normalized_profile: model.time_series(NORMALIZED_PROFILE_SERIES)?,
            installed_capacity: model.parameter(INSTALLED_CAPACITY_PARAM)?,
        })
    }
}

/// A solar-thermal collector asset
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorAsset {
    id: BlockID,
    profile: ProfileTable,
}

impl CollectorAsset {
    /// Create a collector, reading its profile from a CSV file.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the collector's block in the host model
    /// * `file_path` - Path to the profile CSV file
    /// * `index_col` - Zero-based position of the file's index column
    pub fn new(name: &str, file_path: &Path, index_col: usize) -> Result<Self> {
        let profile = ProfileTable::from_path(file_path, index_col)?;
        debug!(
            "Read {} rows of profile data for collector {name} from {}",
            profile.len(),
            file_path.display()
        );

        Ok(Self {
            id: name.into(),
            profile,
        })
    }

    /// Create a collector, using the first column of the CSV file as the index
    pub fn from_path(name: &str, file_path: &Path) -> Result<Self> {
        Self::new(name, file_path, 0)
    }

    /// The collector's ID (its block name in the host model)
    pub fn id(&self) -> &BlockID {
        &self.id
    }

    /// The profile table read at construction
    pub fn profile(&self) -> &ProfileTable {
        &self.profile
    }

    /// Add the collector's block to the host model.
    ///
    /// The model is only modified if every step succeeds.
    pub fn add_to_model(&self, model: &mut EnergySystemModel) -> Result<()> {
        model.check_block_id_free(&self.id)?;

        let block = {
            let host = HostView::from_model(model)?;
            self.build_block(&host)?
        };
        model.add_block(block)?;
        info!("Added collector {} to model", self.id);

        Ok(())
    }

    /// Build the collector's block from the host data.
    ///
    /// For every time step, `heat` is fixed to the normalised profile scaled by the installed
    /// capacity and `bin` is 0 if the raw profile is <= 0, otherwise 1.
    pub fn build_block(&self, host: &HostView) -> Result<Block> {
        let t = host.time_index;
        let mut block = Block::new(self.id.clone());

        block.add_variable(BIN_VAR, t, Domain::Binary, Some(0.0))?;
        block.add_variable(HEAT_VAR, t, Domain::NonNegativeReals, None)?;

        let mut heat_out = Port::default();
        heat_out.add(HEAT_VAR, HEAT_LABEL, PortKind::Extensive, false);
        block.add_port(HEAT_OUT_PORT, heat_out)?;

        block.add_constraint(BIN_CONSTRAINT, t, |i| {
            let raw = profile_value(host.raw_profile, RAW_PROFILE_SERIES, i)?;
            let on = if raw <= 0.0 { 0.0 } else { 1.0 };
            Ok(LinearConstraint::fix(var_ref(BIN_VAR, i), 1.0, on))
        })?;

        block.add_constraint(PROFILE_CONSTRAINT, t, |i| {
            let normalized = profile_value(host.normalized_profile, NORMALIZED_PROFILE_SERIES, i)?;
            Ok(LinearConstraint::fix(
                var_ref(HEAT_VAR, i),
                1.0,
                normalized * host.installed_capacity,
            ))
        })?;

        Ok(block)
    }
}

/// Look up the value of a profile at the given time step
fn profile_value(profile: &ProfileMap, name: &str, time_step: &TimeStepID) -> Result<f64> {
    profile
        .get(time_step)
        .copied()
        .with_context(|| format!("Time step {time_step} not found in {name}"))
}

fn var_ref(variable: &str, time_step: &TimeStepID) -> VariableRef {
    VariableRef {
        variable: variable.to_string(),
        time_step: time_step.clone(),
    }
}
