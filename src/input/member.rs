//! Code for reading household members and their preferences from CSV files.
use super::household::HouseholdRawMap;
use super::*;
use crate::activity::ActivityMap;
use crate::id::IDCollection;
use crate::member::{Member, MemberID, MemberPreferences, Role};
use crate::portfolio::Portfolio;
use crate::units::MoneyPerHour;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Deserialize;

const MEMBERS_FILE_NAME: &str = "members.csv";
const MEMBER_PREFERENCES_FILE_NAME: &str = "member_preferences.csv";

/// Applies a preference row to every member
const ALL_MEMBERS: &str = "all";

#[derive(Debug, Deserialize, PartialEq)]
struct MemberRaw {
    id: MemberID,
    household_id: String,
    role: Role,
    #[serde(deserialize_with = "deserialise_proportion")]
    pmin: Dimensionless,
    #[serde(deserialize_with = "deserialise_proportion")]
    alpha: Dimensionless,
}

#[derive(Debug, Deserialize, PartialEq)]
struct MemberPreferenceRaw {
    member_id: String,
    activity_id: String,
    weight: MoneyPerHour,
}

/// Read members and their preferences.
///
/// Each member's household is given as an index into `households`.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `households` - All households
/// * `activities` - All activities
/// * `portfolios` - All portfolios. Members must have a preference for every activity in these.
pub fn read_members(
    model_dir: &Path,
    households: &HouseholdRawMap,
    activities: &ActivityMap,
    portfolios: &[Portfolio],
) -> Result<Vec<Member>> {
    let file_path = model_dir.join(MEMBERS_FILE_NAME);
    let members = read_csv(&file_path)?;
    let members = read_members_from_iter(members.into_iter(), households)
        .with_context(|| input_err_msg(&file_path))?;

    let file_path = model_dir.join(MEMBER_PREFERENCES_FILE_NAME);
    let preferences = read_csv(&file_path)?;
    let mut preferences = read_preferences_from_iter(preferences.into_iter(), &members, activities)
        .with_context(|| input_err_msg(&file_path))?;

    let members = members
        .into_values()
        .map(|(member, household)| {
            let preferences = preferences.swap_remove(&member.id).unwrap_or_default();
            Member::new(
                member.id,
                member.role,
                household,
                preferences,
                member.pmin,
                member.alpha,
            )
        })
        .collect::<Vec<_>>();

    for member in &members {
        member
            .expected_payoffs(portfolios)
            .with_context(|| input_err_msg(&file_path))?;
    }

    Ok(members)
}

/// Find the indices of a household's Alice and Bob.
///
/// Returns an error unless the household has exactly one member of each role.
pub fn household_members(members: &[Member], household: usize) -> Result<(usize, usize)> {
    let find = |role: Role| -> Result<usize> {
        let mut found = members
            .iter()
            .positions(|member| member.household == household && member.role == role);
        let index = found.next().with_context(|| format!("No member has role {role}"))?;
        ensure!(
            found.next().is_none(),
            "More than one member has role {role}"
        );
        Ok(index)
    };

    Ok((find(Role::Alice)?, find(Role::Bob)?))
}

/// Check member rows, resolving each member's household to an index
fn read_members_from_iter<I>(
    iter: I,
    households: &HouseholdRawMap,
) -> Result<IndexMap<MemberID, (MemberRaw, usize)>>
where
    I: Iterator<Item = MemberRaw>,
{
    let mut members = IndexMap::new();
    for member in iter {
        let household = households
            .get_index_of(member.household_id.as_str())
            .with_context(|| {
                format!(
                    "Member {} refers to unknown household {}",
                    member.id, member.household_id
                )
            })?;

        let id = member.id.clone();
        ensure!(
            members.insert(id.clone(), (member, household)).is_none(),
            "Duplicate member ID found: {id}"
        );
    }

    Ok(members)
}

/// Gather preference weights for each member.
///
/// Rows with a `member_id` of `all` apply to every member.
fn read_preferences_from_iter<I>(
    iter: I,
    members: &IndexMap<MemberID, (MemberRaw, usize)>,
    activities: &ActivityMap,
) -> Result<IndexMap<MemberID, MemberPreferences>>
where
    I: Iterator<Item = MemberPreferenceRaw>,
{
    let mut map: IndexMap<MemberID, MemberPreferences> = IndexMap::new();
    for preference in iter {
        let activity_id = activities.get_id_by_str(&preference.activity_id)?;
        ensure!(
            preference.weight.is_finite() && preference.weight >= MoneyPerHour(0.0),
            "Weight for activity {activity_id} must be a finite number greater than or equal to \
            zero"
        );

        let member_ids = if preference.member_id.eq_ignore_ascii_case(ALL_MEMBERS) {
            members.keys().cloned().collect()
        } else {
            vec![members.get_id_by_str(&preference.member_id)?]
        };

        for member_id in member_ids {
            ensure!(
                map.entry(member_id.clone())
                    .or_default()
                    .insert(activity_id.clone(), preference.weight)
                    .is_none(),
                "Preference for activity {activity_id} given more than once for member {member_id}"
            );
        }
    }

    Ok(map)
}
