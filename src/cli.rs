//! The command line interface for the program.
use crate::input::load_model;
use crate::log;
use crate::optimisation::solve;
use crate::output::{DataWriter, create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the run command
#[derive(Args, Default)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// Whether to write additional information to CSV files
    #[arg(long)]
    pub debug_model: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Build and solve a model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model by building it without solving.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
        }
    }
}

/// Parse CLI arguments and run the requested command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Use the given settings, or read them from the user's settings file
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    settings.map_or_else(
        || Settings::load().context("Failed to load settings."),
        Ok,
    )
}

impl RunOpts {
    /// Command-line flags override the corresponding settings
    fn apply_to(&self, settings: &mut Settings) {
        settings.overwrite |= self.overwrite;
        settings.debug_model |= self.debug_model;
    }
}

/// Handle the `run` command.
///
/// Loads the model, attaches its collectors, solves it and writes the results to the output
/// folder (by default `st_collector_results/<model name>`).
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = settings_or_load(settings)?;
    opts.apply_to(&mut settings);

    let output_path = match &opts.output_dir {
        Some(path) => path.clone(),
        None => get_output_dir(model_path)?,
    };
    let overwrite =
        create_output_directory(&output_path, settings.overwrite).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(settings.log_level.as_deref(), Some(&output_path))
        .context("Failed to initialise logging.")?;

    // Only warn once the logger is up
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    let model = load_model(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    let solution = solve(&model).context("Failed to solve model.")?;

    let mut writer = DataWriter::create(&output_path, settings.debug_model)?;
    writer.write_variable_values(&solution)?;
    writer.write_constraints(&model)?;
    writer.flush()?;
    info!("Model solved successfully!");

    Ok(())
}

/// Handle the `validate` command.
///
/// Loads the model and attaches its collectors without solving. No log files are written.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(settings.log_level.as_deref(), None).context("Failed to initialise logging.")?;

    load_model(model_path).context("Failed to validate model.")?;
    info!("Model validation successful!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_opts_apply_to() {
        let mut settings = Settings {
            overwrite: true,
            ..Settings::default()
        };
        RunOpts {
            debug_model: true,
            ..RunOpts::default()
        }
        .apply_to(&mut settings);

        // Flags can only switch options on
        assert!(settings.overwrite);
        assert!(settings.debug_model);
    }

    #[test]
    fn test_settings_or_load() {
        let settings = Settings {
            log_level: Some("off".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings_or_load(Some(settings)).unwrap().log_level.as_deref(), Some("off"));
    }
}
