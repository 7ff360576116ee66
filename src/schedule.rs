//! The scheduler advances the world one tick at a time.
//!
//! Each tick, households are visited in a freshly shuffled order. For each household in turn the
//! bargain is resolved and paid out, then Alice updates her reservation share, then Bob updates
//! his, before moving on to the next household. Members therefore see the coffers of households
//! visited earlier in the same tick as already updated.
use crate::household::Bargain;
use crate::portfolio::Portfolio;
use crate::units::{Dimensionless, Money};
use crate::world::World;
use anyhow::{Context, Result, ensure};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// What happened to a single household during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HouseholdStep {
    /// Index of the household
    pub household: usize,
    /// The household's bargain
    pub bargain: Bargain,
    /// The payoff added to the household's coffer
    pub payoff: Money,
}

/// Holds the simulation clock and random number generator
pub struct Scheduler {
    time: u32,
    rng: StdRng,
    insistence: Dimensionless,
}

impl Scheduler {
    /// Create a new [`Scheduler`] starting at tick zero.
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed for the random number generator
    /// * `insistence` - Probability that a member becomes insistent on any given tick
    pub fn new(seed: u64, insistence: Dimensionless) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&insistence.value()),
            "Insistence must be a probability between 0 and 1"
        );

        Ok(Self {
            time: 0,
            rng: StdRng::seed_from_u64(seed),
            insistence,
        })
    }

    /// The number of completed ticks
    pub fn time(&self) -> u32 {
        self.time
    }

    /// Run a single tick.
    ///
    /// # Returns
    ///
    /// What happened to each household, in the order the households were visited
    pub fn step(
        &mut self,
        world: &mut World,
        portfolios: &[Portfolio],
    ) -> Result<Vec<HouseholdStep>> {
        let mut order: Vec<usize> = (0..world.households().len()).collect();
        order.shuffle(&mut self.rng);

        let mut steps = Vec::with_capacity(order.len());
        for household in order {
            let (bargain, payoff) = world
                .step_household(household, portfolios)
                .with_context(|| {
                    format!(
                        "Tick {}: household {}",
                        self.time + 1,
                        world.households()[household].id
                    )
                })?;

            let (alice, bob) = {
                let household = &world.households()[household];
                (household.alice, household.bob)
            };
            for member in [alice, bob] {
                let insistent = self.rng.random_bool(self.insistence.value());
                world.update_member(member, insistent);
            }

            steps.push(HouseholdStep {
                household,
                bargain,
                payoff,
            });
        }
        self.time += 1;

        Ok(steps)
    }
}
