//! Fixtures for tests

use crate::activity::Activity;
use crate::grid::{Grid, Position};
use crate::household::Household;
use crate::member::{Member, MemberPreferences, Role};
use crate::portfolio::{Portfolio, PortfolioActivity};
use crate::units::{Dimensionless, Hours, Money, MoneyPerHour};
use crate::world::World;
use indexmap::indexmap;
use rstest::fixture;
use std::rc::Rc;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn crops() -> Rc<Activity> {
    Rc::new(Activity {
        id: "crops".into(),
        roi: MoneyPerHour(3.0),
        cost: Money(1.0),
    })
}

#[fixture]
pub fn smoking() -> Rc<Activity> {
    Rc::new(Activity {
        id: "smoking".into(),
        roi: MoneyPerHour(0.0),
        cost: Money(2.0),
    })
}

fn make_portfolio(
    id: &str,
    p: f64,
    smoking: &Rc<Activity>,
    smoking_hours: f64,
    crops: &Rc<Activity>,
    crops_hours: f64,
) -> Portfolio {
    Portfolio::new(
        id.into(),
        Dimensionless(p),
        vec![
            PortfolioActivity {
                activity: Rc::clone(smoking),
                hours: Hours(smoking_hours),
            },
            PortfolioActivity {
                activity: Rc::clone(crops),
                hours: Hours(crops_hours),
            },
        ],
    )
    .unwrap()
}

/// All the crops go to the household; Bob gets the smaller share
#[fixture]
pub fn portfolio(smoking: Rc<Activity>, crops: Rc<Activity>) -> Portfolio {
    make_portfolio("p_0", 0.4, &smoking, 0.0, &crops, 10.0)
}

#[fixture]
pub fn portfolios(smoking: Rc<Activity>, crops: Rc<Activity>) -> Vec<Portfolio> {
    vec![
        make_portfolio("p_0", 0.4, &smoking, 0.0, &crops, 10.0),
        make_portfolio("p_1", 0.6, &smoking, 2.0, &crops, 8.0),
    ]
}

#[fixture]
pub fn member_preferences() -> MemberPreferences {
    indexmap! {
        "smoking".into() => MoneyPerHour(0.0),
        "crops".into() => MoneyPerHour(1.0),
    }
}

#[fixture]
pub fn alice(member_preferences: MemberPreferences) -> Member {
    Member::new(
        "m_0".into(),
        Role::Alice,
        0,
        member_preferences,
        Dimensionless(0.6),
        Dimensionless(0.2),
    )
}

#[fixture]
pub fn bob(member_preferences: MemberPreferences) -> Member {
    Member::new(
        "m_1".into(),
        Role::Bob,
        0,
        member_preferences,
        Dimensionless(0.4),
        Dimensionless(0.2),
    )
}

#[fixture]
pub fn household() -> Household {
    Household::new("h_0".into(), Position::new(0, 0), 0, 1, Money(10.0))
}

/// A single household alone on a 1x1 grid
#[fixture]
pub fn world(alice: Member, bob: Member, household: Household) -> World {
    World::new(
        Grid::new(1, 1, true).unwrap(),
        vec![household],
        vec![alice, bob],
    )
    .unwrap()
}

/// One household per cell of a 3x3 toroidal grid, with Alices alternately holding out for
/// more or less than their partners
#[fixture]
pub fn grid_world(alice: Member, bob: Member) -> World {
    let mut households = Vec::new();
    let mut members = Vec::new();
    for x in 0..3u32 {
        for y in 0..3u32 {
            let index = households.len();
            let (alice_pmin, bob_pmin) = if index % 2 == 0 { (0.6, 0.4) } else { (0.4, 0.6) };

            let mut a = alice.clone();
            a.id = format!("m_{}", 2 * index).into();
            a.household = index;
            a.pmin = Dimensionless(alice_pmin);
            let mut b = bob.clone();
            b.id = format!("m_{}", 2 * index + 1).into();
            b.household = index;
            b.pmin = Dimensionless(bob_pmin);
            members.extend([
                Member::new(a.id, a.role, a.household, a.preferences, a.pmin, a.alpha),
                Member::new(b.id, b.role, b.household, b.preferences, b.pmin, b.alpha),
            ]);

            households.push(Household::new(
                format!("h_{index}").into(),
                Position::new(x, y),
                2 * index,
                2 * index + 1,
                Money(10.0),
            ));
        }
    }

    World::new(Grid::new(3, 3, true).unwrap(), households, members).unwrap()
}
