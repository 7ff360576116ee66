//! Members are the two participants in each household.
//!
//! Each member values portfolios according to its own preferences and carries a reservation
//! share (`pmin`): the minimum share of a portfolio's value it demands before accepting its
//! partner's preferred portfolio. The reservation share adapts each tick towards that of the
//! wealthier of the member's same-role neighbours.
use crate::activity::ActivityID;
use crate::id::{define_id_getter, define_id_type};
use crate::portfolio::Portfolio;
use crate::units::{Dimensionless, Money, MoneyPerHour};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;

define_id_type! {MemberID}

/// How much a member values an hour spent on each activity
pub type MemberPreferences = IndexMap<ActivityID, MoneyPerHour>;

/// The role a member plays in its household.
///
/// Alice always makes the proposal during bargaining; Bob accepts it or not.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    DeserializeLabeledStringEnum,
)]
pub enum Role {
    /// The proposing member (tag 0)
    #[string = "alice"]
    Alice,
    /// The responding member (tag 1)
    #[string = "bob"]
    Bob,
}

impl Role {
    /// The numeric tag for this role
    pub const fn tag(self) -> usize {
        match self {
            Self::Alice => 0,
            Self::Bob => 1,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Alice => write!(f, "alice"),
            Self::Bob => write!(f, "bob"),
        }
    }
}

/// Whether a member insisted on the whole portfolio in its two most recent updates.
///
/// Only the previous update is ever consulted, so nothing older is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InsistenceHistory {
    previous: bool,
    latest: bool,
}

impl InsistenceHistory {
    /// Record the outcome of the latest update
    fn push(&mut self, insistent: bool) {
        self.previous = self.latest;
        self.latest = insistent;
    }

    /// Whether the member was insistent in its most recent update
    pub fn latest(&self) -> bool {
        self.latest
    }

    /// Whether the member was insistent in the update before the most recent one
    pub fn previous(&self) -> bool {
        self.previous
    }
}

/// A member of a household
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// A unique identifier for the member
    pub id: MemberID,
    /// The member's role in its household
    pub role: Role,
    /// Index of the owning household in the world
    pub household: usize,
    /// Preference weights for each activity
    pub preferences: MemberPreferences,
    /// Current reservation share, always in [0, 1]
    pub pmin: Dimensionless,
    /// Rate at which `pmin` moves towards that of wealthier neighbours
    pub alpha: Dimensionless,
    /// The value of `pmin` before the member last became insistent
    last_pmin: Dimensionless,
    insistence: InsistenceHistory,
}
define_id_getter! {Member, MemberID}

impl Member {
    /// Create a new [`Member`]
    pub fn new(
        id: MemberID,
        role: Role,
        household: usize,
        preferences: MemberPreferences,
        pmin: Dimensionless,
        alpha: Dimensionless,
    ) -> Self {
        Self {
            id,
            role,
            household,
            preferences,
            pmin,
            alpha,
            last_pmin: pmin,
            insistence: InsistenceHistory::default(),
        }
    }

    /// The value of `pmin` remembered from before the latest insistence episode
    pub fn last_pmin(&self) -> Dimensionless {
        self.last_pmin
    }

    /// Whether this member was insistent during its most recent update
    pub fn is_insistent(&self) -> bool {
        self.insistence.latest()
    }

    /// The member's recent insistence history
    pub fn insistence(&self) -> InsistenceHistory {
        self.insistence
    }

    /// The expected value of each portfolio according to this member's preferences.
    ///
    /// # Returns
    ///
    /// One value per portfolio, in the same order as `portfolios`, or an error if a portfolio
    /// contains an activity for which the member has no preference.
    pub fn expected_payoffs(&self, portfolios: &[Portfolio]) -> Result<Vec<Money>> {
        portfolios
            .iter()
            .map(|portfolio| {
                portfolio
                    .iter_inputs()
                    .map(|(activity_id, hours)| {
                        let weight = self.preferences.get(activity_id).with_context(|| {
                            format!(
                                "Member {} has no preference for activity {activity_id} \
                                (used in portfolio {})",
                                self.id, portfolio.id
                            )
                        })?;
                        Ok(*weight * hours)
                    })
                    .sum::<Result<Money>>()
            })
            .collect()
    }

    /// Update the reservation share after this tick's bargain.
    ///
    /// An insistent member demands the whole portfolio (`pmin = 1`). Otherwise, a member which
    /// was insistent last time first reverts to the value it held before, then moves towards
    /// `above_average` at rate `alpha`.
    ///
    /// # Arguments
    ///
    /// * `insistent` - Outcome of this tick's insistence draw
    /// * `above_average` - Mean `pmin` of the wealthier half of the member's same-role
    ///   neighbours, or `None` if it has no such neighbours (in which case no adaptive step is
    ///   taken)
    pub fn update(&mut self, insistent: bool, above_average: Option<Dimensionless>) {
        if insistent {
            self.pmin = Dimensionless(1.0);
            self.insistence.push(true);
            return;
        }

        if self.insistence.latest() {
            self.pmin = self.last_pmin;
        }
        if let Some(above_average) = above_average {
            self.pmin += self.alpha * (above_average - self.pmin);
        }
        self.pmin = self.pmin.clamp(Dimensionless(0.0), Dimensionless(1.0));
        self.insistence.push(false);
        self.last_pmin = self.pmin;
    }
}

/// The mean `pmin` of the wealthier half of a set of neighbours.
///
/// Neighbours are ranked by household coffer (ties keep their original order) and the upper
/// half is taken, rounding the half-way point down, so with an odd number the median neighbour
/// is included.
///
/// # Arguments
///
/// * `neighbours` - `(coffer, pmin)` for each neighbour
///
/// # Returns
///
/// The mean, or `None` if there are no neighbours
pub fn above_average_pmin<I>(neighbours: I) -> Option<Dimensionless>
where
    I: IntoIterator<Item = (Money, Dimensionless)>,
{
    let mut neighbours: Vec<_> = neighbours.into_iter().collect();
    if neighbours.is_empty() {
        return None;
    }

    neighbours.sort_by(|(coffer1, _), (coffer2, _)| coffer1.total_cmp(coffer2));
    let upper = &neighbours[neighbours.len() / 2..];
    let total: Dimensionless = upper.iter().map(|(_, pmin)| *pmin).sum();

    Some(total / Dimensionless(upper.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{alice, bob, portfolios};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_expected_payoffs(alice: Member, portfolios: Vec<Portfolio>) {
        // Preferences are {smoking: 0, crops: 1}
        assert_eq!(
            alice.expected_payoffs(&portfolios).unwrap(),
            [Money(10.0), Money(8.0)]
        );
    }

    #[rstest]
    fn test_expected_payoffs_missing_preference(mut alice: Member, portfolios: Vec<Portfolio>) {
        alice.preferences.shift_remove("smoking");
        assert!(alice.expected_payoffs(&portfolios).is_err());
    }

    #[rstest]
    fn test_update_moves_towards_average(mut bob: Member) {
        // pmin 0.4, alpha 0.2
        bob.update(false, Some(Dimensionless(0.9)));
        assert_approx_eq!(f64, bob.pmin.value(), 0.5);
        assert_approx_eq!(f64, bob.last_pmin().value(), 0.5);
        assert!(!bob.is_insistent());
    }

    #[rstest]
    fn test_update_no_neighbours(mut bob: Member) {
        bob.update(false, None);
        assert_eq!(bob.pmin, Dimensionless(0.4));
        assert!(!bob.is_insistent());
    }

    #[rstest]
    fn test_update_insistent_then_reverts(mut bob: Member) {
        bob.update(true, Some(Dimensionless(0.9)));
        assert_eq!(bob.pmin, Dimensionless(1.0));
        assert!(bob.is_insistent());
        assert_eq!(bob.last_pmin(), Dimensionless(0.4));

        // Next update starts again from the remembered value, not from 1.0
        bob.update(false, Some(Dimensionless(0.4)));
        assert_approx_eq!(f64, bob.pmin.value(), 0.4);
        assert!(bob.insistence().previous());
        assert!(!bob.insistence().latest());
    }

    #[rstest]
    fn test_update_insistent_twice_keeps_memory(mut bob: Member) {
        bob.update(true, None);
        bob.update(true, None);
        assert_eq!(bob.last_pmin(), Dimensionless(0.4));
        bob.update(false, None);
        assert_eq!(bob.pmin, Dimensionless(0.4));
    }

    #[rstest]
    #[case(1.0, 2.0)]
    #[case(0.0, -3.0)]
    fn test_update_stays_in_bounds(mut bob: Member, #[case] alpha: f64, #[case] target: f64) {
        bob.alpha = Dimensionless(alpha);
        bob.update(false, Some(Dimensionless(target)));
        assert!((0.0..=1.0).contains(&bob.pmin.value()));
    }

    #[test]
    fn test_above_average_pmin_empty() {
        assert_eq!(above_average_pmin(std::iter::empty()), None);
    }

    #[rstest]
    #[case(vec![(10.0, 0.2)], 0.2)]
    #[case(vec![(30.0, 0.9), (10.0, 0.1)], 0.9)]
    #[case(vec![(5.0, 0.1), (20.0, 0.6), (10.0, 0.5)], 0.55)] // odd: median included
    #[case(vec![(1.0, 0.0), (2.0, 0.0), (3.0, 0.4), (4.0, 0.8)], 0.6)]
    fn test_above_average_pmin(#[case] neighbours: Vec<(f64, f64)>, #[case] expected: f64) {
        let avg = above_average_pmin(
            neighbours
                .into_iter()
                .map(|(coffer, pmin)| (Money(coffer), Dimensionless(pmin))),
        )
        .unwrap();
        assert_approx_eq!(f64, avg.value(), expected);
    }
}
