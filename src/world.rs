//! The world holds every household and member of a run, along with the grid they live on.
//!
//! Households and members refer to each other by index into the world's collections rather
//! than holding references, so the world is the only owner of simulation state.
use crate::grid::{Grid, Occupant};
use crate::household::{Bargain, Household, bargain};
use crate::member::{Member, Role, above_average_pmin};
use crate::portfolio::Portfolio;
use crate::units::{Dimensionless, Money};
use anyhow::{Context, Result, ensure};
use log::trace;

/// All the agents in a simulation and the grid on which they are placed
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    households: Vec<Household>,
    members: Vec<Member>,
    grid: Grid,
}

impl World {
    /// Create a new [`World`], placing each household and its members on the grid.
    ///
    /// # Arguments
    ///
    /// * `grid` - An empty grid
    /// * `households` - The households, each referring to its two members by index
    /// * `members` - The members, each referring to its household by index
    ///
    /// # Returns
    ///
    /// The world or an error if households and members are inconsistently linked
    pub fn new(mut grid: Grid, households: Vec<Household>, members: Vec<Member>) -> Result<Self> {
        ensure!(!households.is_empty(), "There must be at least one household");
        check_links(&households, &members)?;

        for (index, household) in households.iter().enumerate() {
            let position = household.position;
            grid.place(Occupant::Household(index), position)
                .with_context(|| format!("Could not place household {}", household.id))?;
            grid.place(Occupant::Member(household.alice), position)?;
            grid.place(Occupant::Member(household.bob), position)?;
        }

        Ok(Self {
            households,
            members,
            grid,
        })
    }

    /// The households, in index order
    pub fn households(&self) -> &[Household] {
        &self.households
    }

    /// The members, in index order
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// The grid on which agents are placed
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The household a member belongs to
    pub fn household_of(&self, member: &Member) -> &Household {
        &self.households[member.household]
    }

    /// Resolve a household's bargain for this tick and pay the chosen portfolio into its coffer.
    ///
    /// # Returns
    ///
    /// The bargain along with the payoff received
    pub fn step_household(
        &mut self,
        index: usize,
        portfolios: &[Portfolio],
    ) -> Result<(Bargain, Money)> {
        let household = &self.households[index];
        let bargain = bargain(
            &self.members[household.alice],
            &self.members[household.bob],
            portfolios,
        )?;
        let payoff = self.households[index].apply_bargain(&bargain, portfolios);

        Ok((bargain, payoff))
    }

    /// The mean `pmin` of the wealthier half of a member's same-role neighbours.
    ///
    /// Coffers are read as they currently stand, so households which have already bargained
    /// this tick contribute their updated wealth.
    pub fn neighbour_average(&self, index: usize) -> Option<Dimensionless> {
        let member = &self.members[index];
        let position = self.household_of(member).position;
        let neighbours = self.grid.neighbours(position).filter_map(|occupant| {
            let Occupant::Member(other) = occupant else {
                return None;
            };
            let other = &self.members[other];
            (other.role == member.role).then(|| (self.household_of(other).coffer, other.pmin))
        });

        above_average_pmin(neighbours)
    }

    /// Update a member's reservation share after its household has bargained.
    ///
    /// # Arguments
    ///
    /// * `index` - Index of the member
    /// * `insistent` - Outcome of the member's insistence draw for this tick
    pub fn update_member(&mut self, index: usize, insistent: bool) {
        let above_average = self.neighbour_average(index);
        let member = &mut self.members[index];
        if above_average.is_none() && !insistent {
            trace!(
                "Member {} has no same-role neighbours; pmin not adapted",
                member.id
            );
        }
        member.update(insistent, above_average);
    }
}

/// Check that households and members refer to each other consistently
fn check_links(households: &[Household], members: &[Member]) -> Result<()> {
    let mut owner = vec![None; members.len()];
    for (index, household) in households.iter().enumerate() {
        for (member_index, role) in [(household.alice, Role::Alice), (household.bob, Role::Bob)] {
            let member = members.get(member_index).with_context(|| {
                format!("Household {} refers to an unknown member", household.id)
            })?;
            ensure!(
                member.role == role,
                "Member {} of household {} should have role {role}",
                member.id,
                household.id
            );
            ensure!(
                member.household == index,
                "Member {} does not refer back to household {}",
                member.id,
                household.id
            );
            ensure!(
                owner[member_index].replace(index).is_none(),
                "Member {} belongs to more than one household",
                member.id
            );
        }
    }

    if let Some(index) = owner.iter().position(Option::is_none) {
        anyhow::bail!("Member {} does not belong to a household", members[index].id);
    }

    Ok(())
}
