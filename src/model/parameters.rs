//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{deserialise_proportion, input_err_msg, read_toml};
use crate::units::Dimensionless;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

fn default_toroidal() -> bool {
    true
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Number of columns in the grid
    pub width: u32,
    /// Number of rows in the grid
    pub height: u32,
    /// Whether neighbourhoods wrap around the edges of the grid
    #[serde(default = "default_toroidal")]
    pub toroidal: bool,
    /// Probability that a member insists on the whole portfolio on any given tick
    #[serde(default)]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub insistence: Dimensionless,
    /// Number of ticks to run for
    pub ticks: u32,
    /// Seed for the random number generator.
    ///
    /// If not given, one is chosen at random when the simulation starts.
    pub seed: Option<u64>,
}

/// Check that the grid dimensions are valid
fn check_grid_dimensions(width: u32, height: u32) -> Result<()> {
    ensure!(
        width > 0 && height > 0,
        "`width` and `height` must both be greater than zero"
    );

    Ok(())
}

/// Check that the `ticks` parameter is valid
fn check_ticks(ticks: u32) -> Result<()> {
    ensure!(ticks > 0, "`ticks` cannot be zero");

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_grid_dimensions(self.width, self.height)?;
        check_ticks(self.ticks)?;

        // insistence already validated with deserialise_proportion

        Ok(())
    }
}
