//! The module responsible for writing output data to disk.
use crate::household::Bargain;
use crate::metrics::{AgentRow, MetricsSink, iter_agents};
use crate::schedule::HouseholdStep;
use crate::units::{Dimensionless, Money};
use crate::world::World;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "hhbargain_results";

/// The output file name for agent observations
pub const AGENTS_FILE_NAME: &str = "agents.csv";

/// The output file name for the details of every bargain
pub const BARGAINS_FILE_NAME: &str = "debug_bargains.csv";

/// Get the default output directory for the model specified at `model_dir`
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

/// Create a new output directory for the model, optionally overwriting existing data.
///
/// # Arguments
///
/// * `output_dir` - The folder to create
/// * `allow_overwrite` - Whether to delete and recreate the folder if it is non-empty
///
/// # Returns
///
/// Whether an existing, non-empty folder was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        if fs::read_dir(output_dir)?.next().is_none() {
            // Folder exists but is empty, so we can use it as is
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace its \
            contents."
        );

        fs::remove_dir_all(output_dir)?;
        fs::create_dir_all(output_dir)?;
        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Represents a row in the bargains CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct BargainRow {
    tick: u32,
    order: usize,
    household_id: String,
    pref_alice: usize,
    pref_bob: usize,
    allotment_alice: Money,
    allotment_bob: Money,
    base_penalty: Option<Dimensionless>,
    concede_payoff: Option<Money>,
    compensate_payoff: Option<Money>,
    bob_pmin: Option<Dimensionless>,
    outcome: String,
    choice: usize,
    penalty: Option<Dimensionless>,
    payoff: Money,
}

impl BargainRow {
    /// Create a new [`BargainRow`]
    fn new(tick: u32, order: usize, household_id: String, bargain: &Bargain, payoff: Money) -> Self {
        let negotiation = bargain.negotiation.as_ref();
        Self {
            tick,
            order,
            household_id,
            pref_alice: bargain.alice.index,
            pref_bob: bargain.bob.index,
            allotment_alice: bargain.alice.allotment,
            allotment_bob: bargain.bob.allotment,
            base_penalty: negotiation.map(|n| n.base_penalty),
            concede_payoff: negotiation.map(|n| n.concede_payoff),
            compensate_payoff: negotiation.map(|n| n.compensate_payoff),
            bob_pmin: negotiation.map(|n| n.bob_pmin),
            outcome: bargain.outcome.label().to_string(),
            choice: bargain.choice,
            penalty: bargain.outcome.penalty(),
            payoff,
        }
    }
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    bargains_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        let file_path = output_path.join(BARGAINS_FILE_NAME);
        Ok(Self {
            bargains_writer: csv::Writer::from_path(file_path)?,
        })
    }

    /// Write the bargains from a tick, in the order households were processed
    fn write_bargains(&mut self, tick: u32, steps: &[HouseholdStep], world: &World) -> Result<()> {
        for (order, step) in steps.iter().enumerate() {
            let household_id = world.households()[step.household].id.to_string();
            let row = BargainRow::new(tick, order, household_id, &step.bargain, step.payoff);
            self.bargains_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.bargains_writer.flush()?;

        Ok(())
    }
}

/// An object for writing simulation results to file
pub struct DataWriter {
    agents_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            agents_writer: csv::Writer::from_path(output_path.join(AGENTS_FILE_NAME))?,
            debug_writer,
        })
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.agents_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}

impl MetricsSink for DataWriter {
    fn record(&mut self, tick: u32, world: &World) -> Result<()> {
        for agent in iter_agents(world) {
            let row: AgentRow = agent.report(tick);
            self.agents_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write bargaining details to CSV, if debug output is enabled
    fn record_bargains(&mut self, tick: u32, steps: &[HouseholdStep], world: &World) -> Result<()> {
        if let Some(wtr) = &mut self.debug_writer {
            wtr.write_bargains(tick, steps, world)?;
        }

        Ok(())
    }
}
