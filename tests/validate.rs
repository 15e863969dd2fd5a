//! Integration tests for the `validate` command.
use st_collector::cli::handle_validate_command;
use st_collector::input::load_model;
use st_collector::settings::Settings;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("simple")
}

/// An integration test for the `validate` command.
#[test]
fn test_handle_validate_command() {
    let settings = || Settings {
        log_level: Some("off".to_string()),
        ..Settings::default()
    };
    handle_validate_command(&get_model_dir(), Some(settings())).unwrap();

    // A copy of the model without the installed capacity is invalid
    let dir = tempdir().unwrap();
    for entry in fs::read_dir(get_model_dir()).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, dir.path().join(path.file_name().unwrap())).unwrap();
    }
    let model_toml = fs::read_to_string(dir.path().join("model.toml")).unwrap();
    fs::write(
        dir.path().join("model.toml"),
        model_toml.replace("INSTALLED_ST_POWER = 1200.0", ""),
    )
    .unwrap();

    assert_eq!(
        load_model(dir.path())
            .unwrap_err()
            .chain()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        [
            "Could not add collector solar_thermal to model",
            "Model has no parameter INSTALLED_ST_POWER"
        ]
    );
}
