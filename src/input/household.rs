//! Code for reading households from a CSV file.
use super::*;
use crate::grid::Position;
use crate::household::HouseholdID;
use crate::units::Money;
use indexmap::IndexMap;
use serde::Deserialize;

const HOUSEHOLDS_FILE_NAME: &str = "households.csv";

/// A household as it appears in the input file
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct HouseholdRaw {
    pub id: HouseholdID,
    pub x: u32,
    pub y: u32,
    pub coffer: Money,
}

impl HouseholdRaw {
    /// The cell the household lives in
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Households keyed by ID, in file order
pub type HouseholdRawMap = IndexMap<HouseholdID, HouseholdRaw>;

/// Read households from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `parameters` - Model parameters, giving the grid dimensions
pub fn read_households(model_dir: &Path, parameters: &ModelParameters) -> Result<HouseholdRawMap> {
    let file_path = model_dir.join(HOUSEHOLDS_FILE_NAME);
    let households = read_csv(&file_path)?;
    read_households_from_iter(households.into_iter(), parameters.width, parameters.height)
        .with_context(|| input_err_msg(&file_path))
}

fn read_households_from_iter<I>(iter: I, width: u32, height: u32) -> Result<HouseholdRawMap>
where
    I: Iterator<Item = HouseholdRaw>,
{
    let mut households = IndexMap::new();
    for household in iter {
        ensure!(
            household.x < width && household.y < height,
            "Household {} at {} is outside the {width}x{height} grid",
            household.id,
            household.position()
        );
        ensure!(
            household.coffer.is_finite(),
            "Coffer for household {} must be a finite number",
            household.id
        );

        let id = household.id.clone();
        ensure!(
            households.insert(id.clone(), household).is_none(),
            "Duplicate household ID found: {id}"
        );
    }

    Ok(households)
}
