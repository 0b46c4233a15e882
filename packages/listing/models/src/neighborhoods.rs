//! The fixed catalog of neighborhoods the collectors walk.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::NeighborhoodId;

/// A New York City borough covered by the catalog.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Borough {
    /// Manhattan.
    Manhattan,
    /// Brooklyn.
    Brooklyn,
}

/// Manhattan neighborhood slugs, in collection order.
pub const MANHATTAN_NEIGHBORHOODS: &[&str] = &[
    "upper-east-side",
    "upper-west-side",
    "midtown",
    "chelsea",
    "greenwich-village",
    "east-village",
    "harlem",
    "tribeca",
    "soho",
];

/// Brooklyn neighborhood slugs, in collection order.
pub const BROOKLYN_NEIGHBORHOODS: &[&str] = &[
    "williamsburg",
    "park-slope",
    "brooklyn-heights",
    "dumbo",
    "bushwick",
    "bedford-stuyvesant",
];

/// Returns every catalog neighborhood, Manhattan first, in definition order.
#[must_use]
pub fn all_neighborhoods() -> Vec<NeighborhoodId> {
    MANHATTAN_NEIGHBORHOODS
        .iter()
        .chain(BROOKLYN_NEIGHBORHOODS)
        .filter_map(|slug| NeighborhoodId::new(*slug).ok())
        .collect()
}

/// Returns the borough a catalog slug belongs to, or `None` for slugs
/// outside the catalog.
#[must_use]
pub fn borough_of(slug: &str) -> Option<Borough> {
    if MANHATTAN_NEIGHBORHOODS.contains(&slug) {
        Some(Borough::Manhattan)
    } else if BROOKLYN_NEIGHBORHOODS.contains(&slug) {
        Some(Borough::Brooklyn)
    } else {
        None
    }
}
