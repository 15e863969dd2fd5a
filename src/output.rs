//! The module responsible for writing output data to disk.
use crate::id::{BlockID, TimeStepID};
use crate::model::EnergySystemModel;
use crate::optimisation::Solution;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "st_collector_results";

/// The output file name for variable values
const VARIABLE_VALUES_FILE_NAME: &str = "variable_values.csv";

/// The output file name for constraint bounds
const CONSTRAINTS_FILE_NAME: &str = "debug_constraints.csv";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model, if it doesn't already exist.
///
/// # Arguments
///
/// * `output_dir` - The folder to create
/// * `allow_overwrite` - Whether an existing, non-empty folder may be reused
///
/// # Returns
///
/// Whether an existing non-empty folder will be overwritten, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        let is_empty = output_dir.read_dir()?.next().is_none();
        ensure!(
            is_empty || allow_overwrite,
            "Output folder already exists and is not empty. Pass --overwrite to replace it."
        );

        return Ok(!is_empty);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Represents a row in the variable values CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct VariableValueRow {
    block_id: BlockID,
    variable: String,
    time_step: TimeStepID,
    value: f64,
}

/// Represents a row in the constraints CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ConstraintRow {
    block_id: BlockID,
    constraint: String,
    time_step: TimeStepID,
    lower: f64,
    upper: f64,
}

/// An object for writing model results to file
pub struct DataWriter {
    values_writer: csv::Writer<File>,
    constraints_writer: Option<csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let constraints_writer = if save_debug_info {
            Some(new_writer(CONSTRAINTS_FILE_NAME)?)
        } else {
            None
        };

        Ok(Self {
            values_writer: new_writer(VARIABLE_VALUES_FILE_NAME)?,
            constraints_writer,
        })
    }

    /// Write the value of every variable in the solution
    pub fn write_variable_values(&mut self, solution: &Solution) -> Result<()> {
        for (block_id, variable, time_step, value) in solution.iter_variable_values() {
            let row = VariableValueRow {
                block_id: block_id.clone(),
                variable: variable.to_string(),
                time_step: time_step.clone(),
                value,
            };
            self.values_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write the bounds of every constraint in the model (debug info only)
    pub fn write_constraints(&mut self, model: &EnergySystemModel) -> Result<()> {
        let Some(wtr) = &mut self.constraints_writer else {
            return Ok(());
        };

        for block in model.iter_blocks() {
            for (name, constraint) in block.iter_constraints() {
                for (time_step, row) in constraint {
                    wtr.serialize(ConstraintRow {
                        block_id: block.id.clone(),
                        constraint: name.clone(),
                        time_step: time_step.clone(),
                        lower: *row.bounds.start(),
                        upper: *row.bounds.end(),
                    })?;
                }
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.values_writer.flush()?;
        if let Some(wtr) = &mut self.constraints_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}
