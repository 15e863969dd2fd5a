//! Fixtures for tests
use crate::collector::{
    INSTALLED_CAPACITY_PARAM, NORMALIZED_PROFILE_SERIES, RAW_PROFILE_SERIES,
};
use crate::id::TimeStepID;
use crate::model::{EnergySystemModel, ProfileMap};
use crate::time_index::TimeIndex;
use rstest::fixture;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// The profile used in most tests: off, half output, full output
pub const PROFILE_CSV: &str = "time,value
t0,0.0
t1,0.5
t2,1.0
";

/// Write [`PROFILE_CSV`] to `dir_path`, returning the path to the new file
pub fn create_profile_file(dir_path: &Path) -> PathBuf {
    let file_path = dir_path.join("solar_thermal.csv");
    let mut file = File::create(&file_path).unwrap();
    write!(file, "{PROFILE_CSV}").unwrap();
    file_path
}

#[fixture]
pub fn time_index() -> TimeIndex {
    TimeIndex::from_iter_checked(["t0".into(), "t1".into(), "t2".into()]).unwrap()
}

#[fixture]
pub fn profile(time_index: TimeIndex) -> ProfileMap {
    time_index
        .iter()
        .cloned()
        .zip([0.0, 0.5, 1.0])
        .collect::<ProfileMap>()
}

/// A host model with everything a collector needs
#[fixture]
pub fn host_model(time_index: TimeIndex, profile: ProfileMap) -> EnergySystemModel {
    let mut model = EnergySystemModel::new();
    model.set_time_index(time_index);
    model
        .add_time_series(RAW_PROFILE_SERIES, profile.clone())
        .unwrap();
    model
        .add_time_series(NORMALIZED_PROFILE_SERIES, profile)
        .unwrap();
    model.add_parameter(INSTALLED_CAPACITY_PARAM, 100.0).unwrap();
    model
}

/// Build a [`ProfileMap`] from time step/value pairs
pub fn profile_from_pairs(pairs: &[(&str, f64)]) -> ProfileMap {
    pairs
        .iter()
        .map(|(time_step, value)| (TimeStepID::new(time_step), *value))
        .collect()
}
