//! Code for reading [`Activity`]s from a CSV file.
use super::*;
use crate::activity::{Activity, ActivityMap};
use crate::id::try_collect_id_map;
use crate::units::Money;
use std::rc::Rc;

const ACTIVITIES_FILE_NAME: &str = "activities.csv";

/// Read activities from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of [`Activity`]s, keyed by activity ID, in the order they appear in the file
pub fn read_activities(model_dir: &Path) -> Result<ActivityMap> {
    let file_path = model_dir.join(ACTIVITIES_FILE_NAME);
    let activities = read_csv(&file_path)?;
    read_activities_from_iter(activities.into_iter()).with_context(|| input_err_msg(&file_path))
}

fn read_activities_from_iter<I>(iter: I) -> Result<ActivityMap>
where
    I: Iterator<Item = Activity>,
{
    let activities = iter
        .map(|activity| -> Result<_> {
            ensure!(
                activity.roi.is_finite(),
                "Return on investment for activity {} must be a finite number",
                activity.id
            );
            ensure!(
                activity.cost.is_finite() && activity.cost >= Money(0.0),
                "Cost for activity {} must be a finite number greater than or equal to zero",
                activity.id
            );

            Ok(activity)
        })
        .collect::<Result<Vec<_>>>()?;

    let map = try_collect_id_map(activities)?;
    Ok(map
        .into_iter()
        .map(|(id, activity)| (id, Rc::new(activity)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::units::MoneyPerHour;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn activity(id: &str, roi: f64, cost: f64) -> Activity {
        Activity {
            id: id.into(),
            roi: MoneyPerHour(roi),
            cost: Money(cost),
        }
    }

    #[test]
    fn test_read_activities() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(ACTIVITIES_FILE_NAME)).unwrap();
            writeln!(file, "id,roi,cost\nsmoking,0,2\ncrops,3,1").unwrap();
        }

        let activities = read_activities(dir.path()).unwrap();
        assert_eq!(
            activities.keys().map(|id| id.to_string()).collect::<Vec<_>>(),
            ["smoking", "crops"]
        );
        assert_eq!(*activities["crops"], activity("crops", 3.0, 1.0));
    }

    #[test]
    fn test_read_activities_from_iter_duplicate() {
        let activities = [activity("crops", 3.0, 1.0), activity("crops", 2.0, 1.0)];
        assert_error!(
            read_activities_from_iter(activities.into_iter()),
            "Duplicate ID found: crops"
        );
    }

    #[test]
    fn test_read_activities_from_iter_bad_values() {
        let activities = [activity("crops", 3.0, -1.0)];
        assert!(read_activities_from_iter(activities.into_iter()).is_err());

        let activities = [activity("crops", f64::NAN, 1.0)];
        assert!(read_activities_from_iter(activities.into_iter()).is_err());
    }
}
