//! Activities are the productive undertakings a household can put labour into.
use crate::id::{define_id_getter, define_id_type};
use crate::units::{Hours, Money, MoneyPerHour};
use indexmap::IndexMap;
use serde::Deserialize;
use std::rc::Rc;

define_id_type! {ActivityID}

/// A map of [`Activity`]s, keyed by activity ID
pub type ActivityMap = IndexMap<ActivityID, Rc<Activity>>;

/// A production activity (e.g. growing crops)
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Activity {
    /// A unique identifier for the activity (e.g. "crops")
    pub id: ActivityID,
    /// Return on investment per hour of input
    pub roi: MoneyPerHour,
    /// Fixed cost incurred whenever the activity is undertaken
    pub cost: Money,
}
define_id_getter! {Activity, ActivityID}

impl Activity {
    /// The net return from putting the given number of hours into this activity
    pub fn net_return(&self, hours: Hours) -> Money {
        self.roi * hours - self.cost
    }
}
