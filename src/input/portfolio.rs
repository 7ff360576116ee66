//! Code for reading [`Portfolio`]s from CSV files.
use super::*;
use crate::activity::ActivityMap;
use crate::portfolio::{Portfolio, PortfolioActivity, PortfolioID};
use crate::units::{Hours, Money};
use indexmap::IndexMap;
use serde::Deserialize;
use std::rc::Rc;

const PORTFOLIOS_FILE_NAME: &str = "portfolios.csv";
const PORTFOLIO_ACTIVITIES_FILE_NAME: &str = "portfolio_activities.csv";

#[derive(Debug, Deserialize, PartialEq)]
struct PortfolioRaw {
    id: PortfolioID,
    #[serde(deserialize_with = "deserialise_proportion")]
    p: Dimensionless,
}

#[derive(Debug, Deserialize, PartialEq)]
struct PortfolioActivityRaw {
    portfolio_id: String,
    activity_id: String,
    hours: Hours,
}

/// Read portfolios and the hours they put into each activity.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `activities` - All activities
///
/// # Returns
///
/// The portfolios, in the order they appear in `portfolios.csv`
pub fn read_portfolios(model_dir: &Path, activities: &ActivityMap) -> Result<Vec<Portfolio>> {
    let file_path = model_dir.join(PORTFOLIOS_FILE_NAME);
    let portfolios = read_csv(&file_path)?;

    let inputs_path = model_dir.join(PORTFOLIO_ACTIVITIES_FILE_NAME);
    let inputs = read_csv(&inputs_path)?;

    read_portfolios_from_iter(portfolios.into_iter(), inputs.into_iter(), activities)
        .with_context(|| input_err_msg(&inputs_path))
}

fn read_portfolios_from_iter<I, J>(
    portfolios: I,
    inputs: J,
    activities: &ActivityMap,
) -> Result<Vec<Portfolio>>
where
    I: Iterator<Item = PortfolioRaw>,
    J: Iterator<Item = PortfolioActivityRaw>,
{
    let mut shares = IndexMap::new();
    for portfolio in portfolios {
        ensure!(
            shares.insert(portfolio.id.clone(), portfolio.p).is_none(),
            "Duplicate portfolio ID found: {}",
            portfolio.id
        );
    }

    let mut portfolio_inputs: Vec<Vec<PortfolioActivity>> = vec![Vec::new(); shares.len()];
    for input in inputs {
        let index = shares
            .get_index_of(input.portfolio_id.as_str())
            .with_context(|| format!("Unknown portfolio ID {} found", input.portfolio_id))?;
        let activity = activities
            .get(input.activity_id.as_str())
            .with_context(|| format!("Unknown activity ID {} found", input.activity_id))?;
        ensure!(
            input.hours.is_finite() && input.hours >= Hours(0.0),
            "Hours for activity {} in portfolio {} must be a finite number greater than or equal \
            to zero",
            input.activity_id,
            input.portfolio_id
        );

        portfolio_inputs[index].push(PortfolioActivity {
            activity: Rc::clone(activity),
            hours: input.hours,
        });
    }

    shares
        .into_iter()
        .zip(portfolio_inputs)
        .map(|((id, p), inputs)| {
            let portfolio = Portfolio::new(id, p, inputs)?;
            ensure!(
                portfolio.payoff() >= Money(0.0),
                "Portfolio {} has a negative payoff ({})",
                portfolio.id,
                portfolio.payoff()
            );

            Ok(portfolio)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::fixture::{crops, smoking};
    use crate::member::Role;
    use indexmap::indexmap;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn activities(smoking: Rc<Activity>, crops: Rc<Activity>) -> ActivityMap {
        indexmap! {
            smoking.id.clone() => smoking,
            crops.id.clone() => crops,
        }
    }

    fn raw(id: &str, p: f64) -> PortfolioRaw {
        PortfolioRaw {
            id: id.into(),
            p: Dimensionless(p),
        }
    }

    fn input(portfolio_id: &str, activity_id: &str, hours: f64) -> PortfolioActivityRaw {
        PortfolioActivityRaw {
            portfolio_id: portfolio_id.into(),
            activity_id: activity_id.into(),
            hours: Hours(hours),
        }
    }

    #[rstest]
    fn test_read_portfolios(activities: ActivityMap) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(PORTFOLIOS_FILE_NAME)).unwrap();
            writeln!(file, "id,p\np_0,0.4\np_1,0.6").unwrap();
            let mut file = File::create(dir.path().join(PORTFOLIO_ACTIVITIES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "portfolio_id,activity_id,hours\np_0,smoking,0\np_0,crops,10\n\
                p_1,smoking,2\np_1,crops,8"
            )
            .unwrap();
        }

        let portfolios = read_portfolios(dir.path(), &activities).unwrap();
        assert_eq!(portfolios.len(), 2);
        assert_eq!(portfolios[0].payoff(), Money(27.0));
        assert_eq!(portfolios[1].payoff(), Money(21.0));
        assert_eq!(portfolios[1].share_for(Role::Bob), Dimensionless(0.6));
    }

    #[rstest]
    fn test_read_portfolios_from_iter_bad_ids(activities: ActivityMap) {
        // Unknown portfolio
        let result = read_portfolios_from_iter(
            [raw("p_0", 0.4)].into_iter(),
            [input("p_9", "crops", 1.0)].into_iter(),
            &activities,
        );
        assert!(result.is_err());

        // Unknown activity
        let result = read_portfolios_from_iter(
            [raw("p_0", 0.4)].into_iter(),
            [input("p_0", "fishing", 1.0)].into_iter(),
            &activities,
        );
        assert!(result.is_err());

        // Duplicate portfolio
        let result = read_portfolios_from_iter(
            [raw("p_0", 0.4), raw("p_0", 0.5)].into_iter(),
            [input("p_0", "crops", 1.0)].into_iter(),
            &activities,
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_read_portfolios_from_iter_empty_portfolio(activities: ActivityMap) {
        let result = read_portfolios_from_iter(
            [raw("p_0", 0.4), raw("p_1", 0.5)].into_iter(),
            [input("p_0", "crops", 1.0)].into_iter(),
            &activities,
        );
        assert!(result.is_err());
    }

    #[rstest]
    fn test_read_portfolios_from_iter_negative(activities: ActivityMap) {
        let result = read_portfolios_from_iter(
            [raw("p_0", 0.4)].into_iter(),
            [input("p_0", "crops", -1.0)].into_iter(),
            &activities,
        );
        assert!(result.is_err());

        // Only smoking: a net loss
        let result = read_portfolios_from_iter(
            [raw("p_0", 0.4)].into_iter(),
            [input("p_0", "smoking", 1.0)].into_iter(),
            &activities,
        );
        assert!(result.is_err());
    }
}
