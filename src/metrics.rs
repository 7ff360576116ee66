//! Per-tick observations of every agent in the world.
//!
//! Each tick, one [`AgentRow`] is produced for every household and every member. Fields which
//! don't apply to a given kind of agent are left empty.
use crate::household::Household;
use crate::member::{Member, Role};
use crate::schedule::HouseholdStep;
use crate::units::{Dimensionless, Money};
use crate::world::World;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// The kind of agent a row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// A household
    Household,
    /// A household member
    Member,
}

/// An observation of a single agent at a given tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRow {
    /// The tick, where zero is the initial state
    pub tick: u32,
    /// ID of the agent
    pub agent_id: String,
    /// What kind of agent this is
    pub kind: AgentKind,
    /// The household the agent is (or belongs to)
    pub household_id: String,
    /// Member's reservation share
    pub pmin: Option<Dimensionless>,
    /// Member's role tag
    pub tag: Option<usize>,
    /// Whether the member was insistent in its latest update
    pub insistent: Option<bool>,
    /// Household's wealth
    pub coffer: Option<Money>,
    /// Household's latest side payment share
    pub penalty: Option<Dimensionless>,
    /// Index of the household's latest chosen portfolio
    pub portfolio_choice: Option<usize>,
    /// How the household's latest bargain was resolved
    pub outcome: Option<String>,
}

/// A reference to any agent in the world
#[derive(Debug, Clone, Copy)]
pub enum AgentRef<'a> {
    /// A household
    Household(&'a Household),
    /// A member along with the household it belongs to
    Member(&'a Member, &'a Household),
}

impl AgentRef<'_> {
    /// Report the agent's current state
    pub fn report(&self, tick: u32) -> AgentRow {
        match *self {
            Self::Household(household) => AgentRow {
                tick,
                agent_id: household.id.to_string(),
                kind: AgentKind::Household,
                household_id: household.id.to_string(),
                pmin: None,
                tag: None,
                insistent: None,
                coffer: Some(household.coffer),
                penalty: household.penalty(),
                portfolio_choice: household.choice(),
                outcome: household
                    .outcome()
                    .map(|outcome| outcome.label().to_string()),
            },
            Self::Member(member, household) => AgentRow {
                tick,
                agent_id: member.id.to_string(),
                kind: AgentKind::Member,
                household_id: household.id.to_string(),
                pmin: Some(member.pmin),
                tag: Some(member.role.tag()),
                insistent: Some(member.is_insistent()),
                coffer: None,
                penalty: None,
                portfolio_choice: None,
                outcome: None,
            },
        }
    }
}

/// Iterate over every agent in the world: households first, then members
pub fn iter_agents(world: &World) -> impl Iterator<Item = AgentRef<'_>> {
    let households = world.households().iter().map(AgentRef::Household);
    let members = world
        .members()
        .iter()
        .map(|member| AgentRef::Member(member, world.household_of(member)));

    households.chain(members)
}

/// Something which records the state of the world each tick
pub trait MetricsSink {
    /// Record the state of every agent at the given tick
    fn record(&mut self, tick: u32, world: &World) -> Result<()>;

    /// Record the bargains struck during a tick, in the order households were visited
    fn record_bargains(
        &mut self,
        _tick: u32,
        _steps: &[HouseholdStep],
        _world: &World,
    ) -> Result<()> {
        Ok(())
    }
}

/// An in-memory table of agent observations
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MetricsTable {
    rows: Vec<AgentRow>,
}

impl MetricsTable {
    /// All rows recorded so far, ordered by tick
    pub fn rows(&self) -> &[AgentRow] {
        &self.rows
    }

    /// The reservation shares of all members with the given role at a tick
    pub fn pmins(&self, tick: u32, role: Role) -> Vec<Dimensionless> {
        self.rows
            .iter()
            .filter(|row| row.tick == tick && row.tag == Some(role.tag()))
            .filter_map(|row| row.pmin)
            .collect()
    }

    /// The population variance of reservation shares across members with the given role
    pub fn pmin_variance(&self, tick: u32, role: Role) -> Option<f64> {
        let pmins = self.pmins(tick, role);
        if pmins.is_empty() {
            return None;
        }

        let n = pmins.len() as f64;
        let mean = pmins.iter().map(|pmin| pmin.value()).sum::<f64>() / n;
        let variance = pmins
            .iter()
            .map(|pmin| (pmin.value() - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(variance)
    }

    /// The coffer of a household at a tick
    pub fn coffer(&self, tick: u32, household_id: &str) -> Option<Money> {
        self.rows
            .iter()
            .find(|row| {
                row.tick == tick && row.kind == AgentKind::Household && row.agent_id == household_id
            })
            .and_then(|row| row.coffer)
    }
}

impl MetricsSink for MetricsTable {
    fn record(&mut self, tick: u32, world: &World) -> Result<()> {
        self.rows
            .extend(iter_agents(world).map(|agent| agent.report(tick)));

        Ok(())
    }
}
