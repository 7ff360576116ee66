//! Portfolios are bundles of activities which a household can choose between each tick.
use crate::activity::{Activity, ActivityID};
use crate::id::{define_id_getter, define_id_type};
use crate::member::Role;
use crate::units::{Dimensionless, Hours, Money};
use anyhow::{Result, ensure};
use std::rc::Rc;

define_id_type! {PortfolioID}

/// An activity included in a [`Portfolio`] along with the labour put into it
#[derive(Debug, PartialEq, Clone)]
pub struct PortfolioActivity {
    /// The activity
    pub activity: Rc<Activity>,
    /// The hours of input allocated to the activity
    pub hours: Hours,
}

/// A bundle of activities plus a fixed pre-negotiation split of its value between the two roles.
///
/// Portfolios are immutable for the duration of a run and shared by all households.
#[derive(Debug, PartialEq, Clone)]
pub struct Portfolio {
    /// A unique identifier for the portfolio
    pub id: PortfolioID,
    /// The value shares for each role, indexed by [`Role::tag`]. These always sum to one.
    shares: [Dimensionless; 2],
    /// The activities making up the portfolio
    activities: Vec<PortfolioActivity>,
}
define_id_getter! {Portfolio, PortfolioID}

impl Portfolio {
    /// Create a new [`Portfolio`].
    ///
    /// # Arguments
    ///
    /// * `id` - Portfolio ID
    /// * `p` - The share of the portfolio's value for [`Role::Bob`]; [`Role::Alice`] gets `1 - p`
    /// * `activities` - The activities in the portfolio with their input hours
    pub fn new(id: PortfolioID, p: Dimensionless, activities: Vec<PortfolioActivity>) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&p.value()),
            "Share for portfolio {id} must be between 0 and 1"
        );
        ensure!(
            !activities.is_empty(),
            "Portfolio {id} must contain at least one activity"
        );
        for (i, input) in activities.iter().enumerate() {
            ensure!(
                activities[..i]
                    .iter()
                    .all(|other| other.activity.id != input.activity.id),
                "Activity {} appears more than once in portfolio {id}",
                input.activity.id
            );
        }

        Ok(Self {
            id,
            shares: [Dimensionless(1.0) - p, p],
            activities,
        })
    }

    /// The pre-negotiation share of the portfolio's value for the given role
    pub fn share_for(&self, role: Role) -> Dimensionless {
        self.shares[role.tag()]
    }

    /// Iterate over the activities in this portfolio
    pub fn iter_activities(&self) -> impl Iterator<Item = &PortfolioActivity> {
        self.activities.iter()
    }

    /// Iterate over the input hours for each activity, keyed by activity ID
    pub fn iter_inputs(&self) -> impl Iterator<Item = (&ActivityID, Hours)> {
        self.activities
            .iter()
            .map(|input| (&input.activity.id, input.hours))
    }

    /// The realised payoff of the portfolio.
    ///
    /// Labour is communal, so this is the same for both members of a household.
    pub fn payoff(&self) -> Money {
        self.activities
            .iter()
            .map(|input| input.activity.net_return(input.hours))
            .sum()
    }
}

/// Scale another portfolio's share by how much its expected value differs from this one's.
///
/// If the two portfolios differ in expected value by a ratio `delta` (smaller over larger), the
/// equivalent share in this portfolio is `delta * other_share`. This gives the share of this
/// portfolio a party would need in order to be as well off as with their own preferred one.
///
/// If both values are zero the portfolios are equally worthless and `delta` is taken to be one.
///
/// # Arguments
///
/// * `other_value` - Expected value of the other portfolio
/// * `other_share` - The party's share in the other portfolio
/// * `my_value` - Expected value of this portfolio for the same party
pub fn equivalent_share(
    other_value: Money,
    other_share: Dimensionless,
    my_value: Money,
) -> Dimensionless {
    let larger = other_value.max(my_value);
    let delta = if larger == Money(0.0) {
        Dimensionless(1.0)
    } else {
        other_value.min(my_value) / larger
    };

    delta * other_share
}
