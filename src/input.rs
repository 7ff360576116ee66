//! Common routines for handling input data.
use crate::grid::Grid;
use crate::household::Household;
use crate::member::Member;
use crate::model::{Model, ModelParameters};
use crate::units::Dimensionless;
use crate::world::World;
use anyhow::{Context, Result, ensure};
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

mod activity;
use activity::read_activities;
mod portfolio;
use portfolio::read_portfolios;
mod household;
use household::{HouseholdRawMap, read_households};
mod member;
use member::read_members;

/// Read a series of type `T`s from a CSV file.
///
/// Returns an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| input_err_msg(file_path))?;
        vec.push(record);
    }

    ensure!(
        !vec.is_empty(),
        "{}: CSV file cannot be empty",
        input_err_msg(file_path)
    );

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a value, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<Dimensionless, D::Error>
where
    D: Deserializer<'de>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(Dimensionless(value))
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;

    let activities = read_activities(model_dir)?;
    let portfolios = read_portfolios(model_dir, &activities)?;
    let households = read_households(model_dir, &parameters)?;
    let members = read_members(model_dir, &households, &activities, &portfolios)?;
    let world = build_world(&parameters, households, members)?;

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        activities,
        portfolios,
        world,
    })
}

/// Place households and their members on a new grid
fn build_world(
    parameters: &ModelParameters,
    households: HouseholdRawMap,
    members: Vec<Member>,
) -> Result<World> {
    let grid = Grid::new(parameters.width, parameters.height, parameters.toroidal)?;
    let households = households
        .into_values()
        .enumerate()
        .map(|(index, household)| {
            let (alice, bob) = member::household_members(&members, index)
                .with_context(|| format!("Invalid members for household {}", household.id))?;
            Ok(Household::new(
                household.id.clone(),
                household.position(),
                alice,
                bob,
                household.coffer,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    World::new(grid, households, members)
}
