//! Lookup lists for the task form and the name to ID resolution used when a
//! payment or purchase is committed.

mod enrollee;
mod item;
mod options;
mod school;

pub use enrollee::{
    EnrolleeId, create_enrollee_table, create_or_get_enrollee, list_enrollees, resolve_enrollee_id,
};
pub use item::{ItemId, create_item_table, create_or_get_item, list_items};
pub use options::{
    enrollee_options_view, get_enrollee_options, get_item_options, item_options_view,
};
pub use school::{School, SchoolId, create_school_table, list_schools, resolve_school_id};

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// The option value that selects "add a new enrollee".
pub const ADD_NEW_ENROLLEE: &str = "add_new_enrollee";
/// The option label for [ADD_NEW_ENROLLEE].
pub const ADD_NEW_ENROLLEE_LABEL: &str = "➕ Add new enrollee...";
/// The option value that selects "add a new item".
pub const ADD_NEW_ITEM: &str = "add_new_item";
/// The option label for [ADD_NEW_ITEM].
pub const ADD_NEW_ITEM_LABEL: &str = "➕ Add new item...";

/// An entry in a reference list: either a real row or the sentinel that asks
/// for a new one to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Existing(T),
    AddNew,
}

/// The kind of fee a payment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeType {
    Registration,
    Feeding,
    Handout,
}

impl FeeType {
    /// Every fee type, in display order.
    pub const ALL: [FeeType; 3] = [FeeType::Registration, FeeType::Feeding, FeeType::Handout];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::Registration => "Registration",
            FeeType::Feeding => "Feeding",
            FeeType::Handout => "Handout",
        }
    }
}

impl Display for FeeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeeType::ALL
            .into_iter()
            .find(|fee_type| fee_type.as_str() == s)
            .ok_or_else(|| format!("unknown fee type \"{s}\""))
    }
}
