//! Functionality for running the simulation.
use crate::member::Role;
use crate::metrics::MetricsSink;
use crate::model::Model;
use crate::output::DataWriter;
use crate::output::metadata::write_metadata;
use crate::schedule::{HouseholdStep, Scheduler};
use crate::world::World;
use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, info};
use std::path::Path;

/// Run the simulation and write the results to disk.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information (e.g. bargain details) to CSV files
/// * `seed` - Seed for the random number generator, overriding the one in the model (if any)
pub fn run(model: &Model, output_path: &Path, debug_model: bool, seed: Option<u64>) -> Result<()> {
    let seed = choose_seed(model, seed);
    write_metadata(output_path, &model.model_path, seed).context("Failed to save metadata")?;

    let mut writer = DataWriter::create(output_path, debug_model)?;
    simulate(model, seed, &mut writer)?;
    writer.flush()?;

    Ok(())
}

/// Pick the seed for a run: the one given explicitly, else the model's, else a random one
pub fn choose_seed(model: &Model, seed: Option<u64>) -> u64 {
    let seed = seed.or(model.parameters.seed).unwrap_or_else(|| {
        let seed = u64::from(rand::random::<u32>());
        info!("No seed given; using a randomly chosen one");
        seed
    });
    info!("Random seed: {seed}");

    seed
}

/// Run the simulation, passing the state of the world to a sink after every tick.
///
/// The initial state is recorded as tick zero. The model itself is left untouched.
///
/// # Returns
///
/// The world as it stands after the final tick
pub fn simulate<S: MetricsSink>(model: &Model, seed: u64, sink: &mut S) -> Result<World> {
    let mut world = model.world.clone();
    let mut scheduler = Scheduler::new(seed, model.parameters.insistence)?;

    sink.record(0, &world)?;
    for tick in model.iter_ticks() {
        let steps = scheduler.step(&mut world, &model.portfolios)?;
        log_tick_summary(tick, &steps, &world);

        sink.record_bargains(tick, &steps, &world)?;
        sink.record(tick, &world)?;
    }
    info!("Completed {} ticks", scheduler.time());

    Ok(world)
}

/// The mean `pmin` of all members with the given role
fn mean_pmin(world: &World, role: Role) -> f64 {
    let pmins = world
        .members()
        .iter()
        .filter(|member| member.role == role)
        .map(|member| member.pmin.value())
        .collect_vec();

    pmins.iter().sum::<f64>() / pmins.len() as f64
}

fn log_tick_summary(tick: u32, steps: &[HouseholdStep], world: &World) {
    let counts = steps
        .iter()
        .counts_by(|step| step.bargain.outcome.label());
    let count = |label: &str| counts.get(label).copied().unwrap_or(0);

    debug!(
        "Tick {tick}: {} agreed, {} compensated, {} sweetened, {} conceded; mean pmin is {:.4} \
        for Alice and {:.4} for Bob",
        count("agreed"),
        count("compensated"),
        count("sweetened"),
        count("conceded"),
        mean_pmin(world, Role::Alice),
        mean_pmin(world, Role::Bob)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityMap;
    use crate::fixture::{grid_world, portfolios};
    use crate::metrics::MetricsTable;
    use crate::model::ModelParameters;
    use crate::portfolio::Portfolio;
    use crate::units::Dimensionless;
    use rstest::{fixture, rstest};
    use std::path::PathBuf;

    #[fixture]
    fn model(grid_world: World, portfolios: Vec<Portfolio>) -> Model {
        Model {
            model_path: PathBuf::from("model"),
            parameters: ModelParameters {
                width: 3,
                height: 3,
                toroidal: true,
                insistence: Dimensionless(0.0),
                ticks: 4,
                seed: Some(5),
            },
            activities: ActivityMap::new(),
            portfolios,
            world: grid_world,
        }
    }

    #[rstest]
    fn test_simulate_records_every_tick(model: Model) {
        let mut table = MetricsTable::default();
        let world = simulate(&model, 5, &mut table).unwrap();

        // 9 households and 18 members for ticks 0 to 4
        assert_eq!(table.rows().len(), 27 * 5);
        assert!(table.rows().iter().map(|row| row.tick).is_sorted());
        assert_eq!(table.coffer(4, "h_0"), Some(world.households()[0].coffer));

        // The model's own world is untouched
        assert_eq!(model.world.households()[0].coffer, table.coffer(0, "h_0").unwrap());
    }

    #[rstest]
    fn test_choose_seed(model: Model) {
        assert_eq!(choose_seed(&model, Some(1)), 1);
        assert_eq!(choose_seed(&model, None), 5);
    }

    #[rstest]
    fn test_mean_pmin(grid_world: World) {
        // Five Alices at 0.6 and four at 0.4
        float_cmp::assert_approx_eq!(f64, mean_pmin(&grid_world, Role::Alice), 4.6 / 9.0);
    }
}
