//! Households own two members and a coffer, and run the bargaining protocol each tick.
//!
//! Bargaining is a single proposal round. Each member picks the portfolio which maximises its
//! expected value weighted by its own pre-negotiation share. If they differ, Alice offers Bob a
//! side payment (a penalty share of her preferred portfolio) which leaves him as well off as with
//! his own preference. Should Bob's reservation share exceed that, Alice may sweeten the offer up
//! to his reservation share if she can afford to; otherwise she concedes to Bob's portfolio.
use crate::grid::Position;
use crate::id::{define_id_getter, define_id_type};
use crate::member::{Member, Role};
use crate::portfolio::{Portfolio, equivalent_share};
use crate::units::{Dimensionless, Money};
use anyhow::{Context, Result, ensure};
use log::trace;

define_id_type! {HouseholdID}

/// A household of two members sharing a coffer
#[derive(Debug, Clone, PartialEq)]
pub struct Household {
    /// A unique identifier for the household
    pub id: HouseholdID,
    /// The grid cell the household (and its members) occupies
    pub position: Position,
    /// Index of the household's [`Role::Alice`] member in the world
    pub alice: usize,
    /// Index of the household's [`Role::Bob`] member in the world
    pub bob: usize,
    /// Accumulated wealth
    pub coffer: Money,
    choice: Option<usize>,
    outcome: Option<BargainOutcome>,
}
define_id_getter! {Household, HouseholdID}

impl Household {
    /// Create a new [`Household`] which has not yet bargained
    pub fn new(
        id: HouseholdID,
        position: Position,
        alice: usize,
        bob: usize,
        coffer: Money,
    ) -> Self {
        Self {
            id,
            position,
            alice,
            bob,
            coffer,
            choice: None,
            outcome: None,
        }
    }

    /// Index of the portfolio chosen in the most recent bargain
    pub fn choice(&self) -> Option<usize> {
        self.choice
    }

    /// Outcome of the most recent bargain
    pub fn outcome(&self) -> Option<BargainOutcome> {
        self.outcome
    }

    /// The side payment agreed in the most recent bargain.
    ///
    /// This is `None` if the household has not bargained yet or if Alice conceded.
    pub fn penalty(&self) -> Option<Dimensionless> {
        self.outcome.and_then(|outcome| outcome.penalty())
    }

    /// Record a bargain and add the chosen portfolio's payoff to the coffer.
    ///
    /// # Returns
    ///
    /// The payoff
    pub fn apply_bargain(&mut self, bargain: &Bargain, portfolios: &[Portfolio]) -> Money {
        let payoff = portfolios[bargain.choice].payoff();
        self.choice = Some(bargain.choice);
        self.outcome = Some(bargain.outcome);
        self.coffer += payoff;

        payoff
    }
}

/// How a bargain was resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BargainOutcome {
    /// Both members preferred the same portfolio, so no side payment was needed
    Agreed,
    /// Alice's portfolio was chosen and Bob receives `penalty` of its value
    Compensated {
        /// The share of the portfolio paid to Bob
        penalty: Dimensionless,
        /// Whether Alice had to raise her offer to meet Bob's reservation share
        sweetened: bool,
    },
    /// Alice could not meet Bob's reservation share and accepted his portfolio
    Conceded,
}

impl BargainOutcome {
    /// The side payment share: zero when the members agree, `None` when Alice conceded
    pub fn penalty(self) -> Option<Dimensionless> {
        match self {
            Self::Agreed => Some(Dimensionless(0.0)),
            Self::Compensated { penalty, .. } => Some(penalty),
            Self::Conceded => None,
        }
    }

    /// A short label for output files
    pub fn label(self) -> &'static str {
        match self {
            Self::Agreed => "agreed",
            Self::Compensated {
                sweetened: false, ..
            } => "compensated",
            Self::Compensated {
                sweetened: true, ..
            } => "sweetened",
            Self::Conceded => "conceded",
        }
    }
}

/// A member's preferred portfolio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preference {
    /// Index of the portfolio
    pub index: usize,
    /// Expected value of the portfolio weighted by the member's own share
    pub allotment: Money,
}

/// The terms on the table when the members' preferences differ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Negotiation {
    /// Share of Alice's portfolio which makes Bob as well off as with his own
    pub base_penalty: Dimensionless,
    /// Alice's payoff if she concedes to Bob's portfolio
    pub concede_payoff: Money,
    /// Alice's payoff if she gets her portfolio and pays the base penalty
    pub compensate_payoff: Money,
    /// Bob's reservation share at the time of the bargain
    pub bob_pmin: Dimensionless,
}

impl Negotiation {
    /// The most Alice can offer without doing worse than conceding
    pub fn max_bribe(&self) -> Money {
        self.concede_payoff.max(self.compensate_payoff)
    }
}

/// The full result of one household's bargain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bargain {
    /// Alice's preferred portfolio
    pub alice: Preference,
    /// Bob's preferred portfolio
    pub bob: Preference,
    /// The terms negotiated, if the preferences differed
    pub negotiation: Option<Negotiation>,
    /// How the bargain was resolved
    pub outcome: BargainOutcome,
    /// Index of the chosen portfolio
    pub choice: usize,
}

/// Find the portfolio a member prefers, taking the first in case of a tie
fn preferred_portfolio(
    payoffs: &[Money],
    portfolios: &[Portfolio],
    role: Role,
) -> Option<Preference> {
    let mut best: Option<Preference> = None;
    for (index, (payoff, portfolio)) in payoffs.iter().zip(portfolios).enumerate() {
        let allotment = *payoff * portfolio.share_for(role);
        if best.is_none_or(|best| allotment > best.allotment) {
            best = Some(Preference { index, allotment });
        }
    }

    best
}

/// Run the bargaining protocol between the two members of a household.
///
/// # Arguments
///
/// * `alice` - The proposing member
/// * `bob` - The responding member
/// * `portfolios` - The portfolios available to the household
///
/// # Returns
///
/// The resolved [`Bargain`], whose `choice` is always either member's preferred portfolio
pub fn bargain(alice: &Member, bob: &Member, portfolios: &[Portfolio]) -> Result<Bargain> {
    ensure!(
        alice.role == Role::Alice && bob.role == Role::Bob,
        "Members {} and {} have the wrong roles for bargaining",
        alice.id,
        bob.id
    );

    let payoffs_a = alice.expected_payoffs(portfolios)?;
    let payoffs_b = bob.expected_payoffs(portfolios)?;
    let pref_a = preferred_portfolio(&payoffs_a, portfolios, Role::Alice)
        .context("No portfolios to bargain over")?;
    let pref_b = preferred_portfolio(&payoffs_b, portfolios, Role::Bob)
        .context("No portfolios to bargain over")?;
    trace!(
        "Alice ({}) prefers portfolio {} with expected payoff {}; Bob ({}) prefers portfolio {} \
        with expected payoff {}",
        alice.id,
        portfolios[pref_a.index].id,
        pref_a.allotment,
        bob.id,
        portfolios[pref_b.index].id,
        pref_b.allotment
    );

    if pref_a.index == pref_b.index {
        trace!("Agreement on portfolio {}", portfolios[pref_a.index].id);
        return Ok(Bargain {
            alice: pref_a,
            bob: pref_b,
            negotiation: None,
            outcome: BargainOutcome::Agreed,
            choice: pref_a.index,
        });
    }

    let (a, b) = (pref_a.index, pref_b.index);
    let base_penalty = equivalent_share(
        payoffs_b[b],
        portfolios[b].share_for(Role::Bob),
        payoffs_b[a],
    );
    let negotiation = Negotiation {
        base_penalty,
        concede_payoff: payoffs_a[b] * portfolios[b].share_for(Role::Alice),
        compensate_payoff: payoffs_a[a] * (Dimensionless(1.0) - base_penalty),
        bob_pmin: bob.pmin,
    };
    trace!(
        "Base penalty is {base_penalty}; Bob's pmin is {}; Alice can offer up to {}",
        bob.pmin,
        negotiation.max_bribe()
    );

    let (outcome, choice) = if bob.pmin > base_penalty {
        // Bob won't accept the base offer, so Alice tries to meet his reservation share
        let needed = bob.pmin * payoffs_b[a];
        if needed <= negotiation.max_bribe() {
            trace!("Alice sweetens her offer to {needed}");
            let outcome = BargainOutcome::Compensated {
                penalty: bob.pmin,
                sweetened: true,
            };
            (outcome, a)
        } else {
            trace!("Alice needs to offer {needed} and cannot; she concedes");
            (BargainOutcome::Conceded, b)
        }
    } else {
        let outcome = BargainOutcome::Compensated {
            penalty: base_penalty,
            sweetened: false,
        };
        (outcome, a)
    };

    Ok(Bargain {
        alice: pref_a,
        bob: pref_b,
        negotiation: Some(negotiation),
        outcome,
        choice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::fixture::{alice, bob, crops, household, portfolios, smoking};
    use crate::portfolio::PortfolioActivity;
    use crate::units::Hours;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::rc::Rc;

    /// Portfolios with shares [0.6, 0.4] and [0.3, 0.7], where the first is best for everyone
    fn agreeable_portfolios(crops: &Rc<Activity>) -> Vec<Portfolio> {
        let make = |id: &str, p, hours| {
            let activities = vec![PortfolioActivity {
                activity: Rc::clone(crops),
                hours: Hours(hours),
            }];
            Portfolio::new(id.into(), Dimensionless(p), activities).unwrap()
        };
        vec![make("p_0", 0.4, 10.0), make("p_1", 0.7, 4.0)]
    }

    #[rstest]
    fn test_bargain_agreement(
        alice: Member,
        bob: Member,
        crops: Rc<Activity>,
        mut household: Household,
    ) {
        let portfolios = agreeable_portfolios(&crops);
        let bargain = bargain(&alice, &bob, &portfolios).unwrap();
        assert_eq!(bargain.alice.index, 0);
        assert_eq!(bargain.bob.index, 0);
        assert_eq!(bargain.outcome, BargainOutcome::Agreed);
        assert_eq!(bargain.negotiation, None);
        assert_eq!(bargain.choice, 0);

        let coffer = household.coffer;
        let payoff = household.apply_bargain(&bargain, &portfolios);
        assert_eq!(payoff, Money(29.0));
        assert_eq!(household.coffer, coffer + Money(29.0));
        assert_eq!(household.choice(), Some(0));
        assert_eq!(household.penalty(), Some(Dimensionless(0.0)));
    }

    #[rstest]
    fn test_bargain_base_penalty(alice: Member, bob: Member, portfolios: Vec<Portfolio>) {
        // Bob's pmin (0.4) is below the base penalty: 8 / 10 * 0.6 = 0.48
        let bargain = bargain(&alice, &bob, &portfolios).unwrap();
        assert_eq!(bargain.alice.index, 0);
        assert_eq!(bargain.bob.index, 1);
        let negotiation = bargain.negotiation.unwrap();
        assert_approx_eq!(f64, negotiation.base_penalty.value(), 0.48);
        assert_approx_eq!(f64, negotiation.compensate_payoff.value(), 5.2);
        assert_approx_eq!(f64, negotiation.concede_payoff.value(), 3.2);
        assert_eq!(bargain.choice, 0);
        let BargainOutcome::Compensated { penalty, sweetened } = bargain.outcome else {
            panic!("Expected compensation, got {:?}", bargain.outcome);
        };
        assert_approx_eq!(f64, penalty.value(), 0.48);
        assert!(!sweetened);
    }

    #[rstest]
    fn test_bargain_sweetened(alice: Member, mut bob: Member, portfolios: Vec<Portfolio>) {
        // Alice needs to offer 0.5 * 10 = 5, which is within her bribe range
        bob.pmin = Dimensionless(0.5);
        let bargain = bargain(&alice, &bob, &portfolios).unwrap();
        assert_eq!(bargain.choice, 0);
        assert_eq!(
            bargain.outcome,
            BargainOutcome::Compensated {
                penalty: Dimensionless(0.5),
                sweetened: true
            }
        );
    }

    #[rstest]
    fn test_bargain_conceded(
        alice: Member,
        mut bob: Member,
        portfolios: Vec<Portfolio>,
        mut household: Household,
    ) {
        // Alice would need to offer 0.6 * 10 = 6, but can only afford 5.2
        bob.pmin = Dimensionless(0.6);
        let bargain = bargain(&alice, &bob, &portfolios).unwrap();
        assert_eq!(bargain.choice, 1);
        assert_eq!(bargain.outcome, BargainOutcome::Conceded);

        household.apply_bargain(&bargain, &portfolios);
        assert_eq!(household.choice(), Some(1));
        assert_eq!(household.penalty(), None);
    }

    #[rstest]
    fn test_bargain_choice_is_a_preference(
        alice: Member,
        mut bob: Member,
        portfolios: Vec<Portfolio>,
    ) {
        for pmin in [0.0, 0.1, 0.3, 0.48, 0.49, 0.52, 0.53, 0.75, 1.0] {
            bob.pmin = Dimensionless(pmin);
            let bargain = bargain(&alice, &bob, &portfolios).unwrap();
            assert!([bargain.alice.index, bargain.bob.index].contains(&bargain.choice));

            // Bob's reservation share is always met when Alice gets her way
            if bargain.choice == bargain.alice.index {
                assert!(bargain.outcome.penalty().unwrap() >= bob.pmin);
            } else {
                assert_eq!(bargain.outcome, BargainOutcome::Conceded);
            }
        }
    }

    #[rstest]
    fn test_bargain_tie_takes_first(
        alice: Member,
        bob: Member,
        crops: Rc<Activity>,
    ) {
        let make = |id: &str| {
            let activities = vec![PortfolioActivity {
                activity: Rc::clone(&crops),
                hours: Hours(5.0),
            }];
            Portfolio::new(id.into(), Dimensionless(0.5), activities).unwrap()
        };
        let portfolios = [make("p_0"), make("p_1"), make("p_2")];
        let bargain = bargain(&alice, &bob, &portfolios).unwrap();
        assert_eq!(bargain.choice, 0);
        assert_eq!(bargain.outcome, BargainOutcome::Agreed);
    }

    #[rstest]
    fn test_bargain_worthless_portfolios(
        alice: Member,
        bob: Member,
        smoking: Rc<Activity>,
    ) {
        // Nobody values smoking, so every expected value is zero and preferences tie
        let activities = vec![PortfolioActivity {
            activity: smoking,
            hours: Hours(2.0),
        }];
        let portfolios = [Portfolio::new("p_0".into(), Dimensionless(0.5), activities).unwrap()];
        let bargain = bargain(&alice, &bob, &portfolios).unwrap();
        assert_eq!(bargain.outcome, BargainOutcome::Agreed);
    }

    #[rstest]
    fn test_bargain_wrong_roles(alice: Member, bob: Member, portfolios: Vec<Portfolio>) {
        assert!(bargain(&bob, &alice, &portfolios).is_err());
    }

    #[rstest]
    #[case(BargainOutcome::Agreed, Some(0.0), "agreed")]
    #[case(BargainOutcome::Compensated { penalty: Dimensionless(0.3), sweetened: false }, Some(0.3), "compensated")]
    #[case(BargainOutcome::Compensated { penalty: Dimensionless(0.3), sweetened: true }, Some(0.3), "sweetened")]
    #[case(BargainOutcome::Conceded, None, "conceded")]
    fn test_outcome_penalty_and_label(
        #[case] outcome: BargainOutcome,
        #[case] penalty: Option<f64>,
        #[case] label: &str,
    ) {
        assert_eq!(outcome.penalty(), penalty.map(Dimensionless));
        assert_eq!(outcome.label(), label);
    }
}
