//! The model represents the static input data provided by the user.
use crate::activity::ActivityMap;
use crate::portfolio::Portfolio;
use crate::world::World;
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::ModelParameters;

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Activities households can put labour into
    pub activities: ActivityMap,
    /// Portfolios available to every household, in index order
    pub portfolios: Vec<Portfolio>,
    /// The households and members in their initial state
    pub world: World,
}

impl Model {
    /// Iterate over the model's ticks, starting from one
    pub fn iter_ticks(&self) -> RangeInclusive<u32> {
        1..=self.parameters.ticks
    }
}
