//! Code for reading a model from a model directory.
use super::profile::ProfileTable;
use super::read_toml;
use crate::collector::CollectorAsset;
use crate::model::EnergySystemModel;
use crate::time_index::TimeIndex;
use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const MODEL_FILE_NAME: &str = "model.toml";

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
struct ModelFile {
    /// Indexed parameters. The first one also defines the time index.
    #[serde(default)]
    time_series: Vec<TimeSeriesEntry>,
    /// Scalar parameters
    #[serde(default)]
    parameters: BTreeMap<String, f64>,
    /// Collector assets to add to the model
    #[serde(default)]
    collectors: Vec<CollectorEntry>,
}

fn default_index_name() -> String {
    "t".to_string()
}

/// An indexed parameter read from a CSV file
#[derive(Debug, Deserialize, PartialEq)]
struct TimeSeriesEntry {
    name: String,
    file: PathBuf,
    #[serde(default = "default_index_name")]
    index: String,
    /// The column with the values, if different from `name`
    column: Option<String>,
}

/// A collector asset
#[derive(Debug, Deserialize, PartialEq)]
struct CollectorEntry {
    name: String,
    file: PathBuf,
    #[serde(default)]
    index_col: usize,
}

impl ModelFile {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    fn from_path(model_dir: &Path) -> Result<ModelFile> {
        read_toml(&model_dir.join(MODEL_FILE_NAME))
    }
}

impl EnergySystemModel {
    /// Read a model's time series and parameters from the specified directory.
    ///
    /// No assets are added; see [`load_model`] for that.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<EnergySystemModel> {
        let model_dir = model_dir.as_ref();
        let model_file = ModelFile::from_path(model_dir)?;
        read_model_data(model_dir, &model_file)
    }
}

/// Populate a new model with the time series and parameters listed in `model_file`
fn read_model_data(model_dir: &Path, model_file: &ModelFile) -> Result<EnergySystemModel> {
    let mut model = EnergySystemModel::new();

    for entry in &model_file.time_series {
        let file_path = model_dir.join(&entry.file);
        let table = ProfileTable::from_path_with_index_name(&file_path, &entry.index)?;
        let column = entry.column.as_deref().unwrap_or(&entry.name);
        let series = table
            .column(column)
            .with_context(|| format!("Could not read time series {}", entry.name))?;

        // The time index is taken from the first time series
        if model.time_index().is_err() {
            model.set_time_index(TimeIndex::from_iter_checked(series.keys().cloned())?);
        }

        model.add_time_series(&entry.name, series)?;
    }

    if model_file.time_series.is_empty() {
        warn!("No time series in model file; the model will have no time index");
    }

    for (name, value) in &model_file.parameters {
        model.add_parameter(name, *value)?;
    }

    Ok(model)
}

/// Load a model from the specified directory and add all of its collectors to it.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The model, with a block for each collector.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<EnergySystemModel> {
    let model_dir = model_dir.as_ref();
    let model_file = ModelFile::from_path(model_dir)?;
    let mut model = read_model_data(model_dir, &model_file)?;

    for entry in &model_file.collectors {
        let collector =
            CollectorAsset::new(&entry.name, &model_dir.join(&entry.file), entry.index_col)?;
        collector
            .add_to_model(&mut model)
            .with_context(|| format!("Could not add collector {} to model", entry.name))?;
    }

    info!(
        "Loaded model with {} time steps and {} collector(s)",
        model.time_index().map_or(0, TimeIndex::len),
        model_file.collectors.len()
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{BIN_VAR, HEAT_VAR};
    use crate::fixture::{PROFILE_CSV, assert_error};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const MODEL_TOML: &str = r#"
[[time_series]]
name = "solar_thermal_heat_profile"
file = "solar_thermal.csv"
index = "time"
column = "value"

[[time_series]]
name = "normalized_solar_thermal_heat_profile"
file = "solar_thermal.csv"
index = "time"
column = "value"

[parameters]
INSTALLED_ST_POWER = 100.0

[[collectors]]
name = "solar_thermal"
file = "solar_thermal.csv"
"#;

    /// Write a model file and a profile CSV file into `dir_path`
    fn create_model_dir(dir_path: &Path, model_toml: &str) {
        let mut file = File::create(dir_path.join(MODEL_FILE_NAME)).unwrap();
        write!(file, "{model_toml}").unwrap();
        let mut file = File::create(dir_path.join("solar_thermal.csv")).unwrap();
        write!(file, "{PROFILE_CSV}").unwrap();
    }

    #[test]
    fn test_model_file_from_path() {
        let dir = tempdir().unwrap();
        create_model_dir(dir.path(), MODEL_TOML);

        let model_file = ModelFile::from_path(dir.path()).unwrap();
        assert_eq!(model_file.time_series.len(), 2);
        assert_eq!(model_file.parameters["INSTALLED_ST_POWER"], 100.0);
        assert_eq!(
            model_file.collectors,
            [CollectorEntry {
                name: "solar_thermal".into(),
                file: "solar_thermal.csv".into(),
                index_col: 0
            }]
        );
    }

    #[test]
    fn test_time_series_defaults() {
        let entry: TimeSeriesEntry = toml::from_str("name = \"value\"\nfile = \"a.csv\"").unwrap();
        assert_eq!(entry.index, "t");
        assert_eq!(entry.column, None);
    }

    #[test]
    fn test_energy_system_model_from_path() {
        let dir = tempdir().unwrap();
        create_model_dir(dir.path(), MODEL_TOML);

        let model = EnergySystemModel::from_path(dir.path()).unwrap();
        assert_eq!(model.time_index().unwrap().len(), 3);
        assert_eq!(model.parameter("INSTALLED_ST_POWER").unwrap(), 100.0);
        assert_eq!(
            model.time_series("solar_thermal_heat_profile").unwrap()["t1"],
            0.5
        );
        assert_eq!(model.iter_blocks().count(), 0);
    }

    #[test]
    fn test_load_model() {
        let dir = tempdir().unwrap();
        create_model_dir(dir.path(), MODEL_TOML);

        let model = load_model(dir.path()).unwrap();
        let block = model.get_block("solar_thermal").unwrap();
        assert!(block.variable(BIN_VAR).is_some());
        assert!(block.variable(HEAT_VAR).is_some());
    }

    #[test]
    fn test_load_model_missing_parameter() {
        let dir = tempdir().unwrap();
        create_model_dir(
            dir.path(),
            &MODEL_TOML.replace("INSTALLED_ST_POWER = 100.0", ""),
        );

        let result = load_model(dir.path());
        assert_error!(result, "Could not add collector solar_thermal to model");
    }

    #[test]
    fn test_load_model_bad_column() {
        let dir = tempdir().unwrap();
        create_model_dir(dir.path(), &MODEL_TOML.replace("column = \"value\"", ""));

        assert_error!(
            load_model(dir.path()),
            "Could not read time series solar_thermal_heat_profile"
        );
    }
}
