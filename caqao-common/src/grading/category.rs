//! Bean category vocabulary

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the twelve bean categories the detector is trained on.
///
/// The serialized form is the camelCase key used in API payloads
/// (`veryDarkBrown`, `insectInfested`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    VeryDarkBrown,
    Brown,
    PartlyPurple,
    TotalPurple,
    G1,
    G2,
    G3,
    G4,
    Mouldy,
    InsectInfested,
    Slaty,
    Germinated,
}

/// Coarse grouping of categories, used for annotation colours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryGroup {
    /// Fermentation colour (left half of a compound label)
    Colour,
    /// Cut-test grade g1..g4 (right half of a compound label)
    Cut,
    /// Standalone defect
    Defect,
}

impl Category {
    /// All categories in tally order
    pub const ALL: [Category; 12] = [
        Category::VeryDarkBrown,
        Category::Brown,
        Category::PartlyPurple,
        Category::TotalPurple,
        Category::G1,
        Category::G2,
        Category::G3,
        Category::G4,
        Category::Mouldy,
        Category::InsectInfested,
        Category::Slaty,
        Category::Germinated,
    ];

    /// camelCase vocabulary key
    pub fn key(self) -> &'static str {
        match self {
            Category::VeryDarkBrown => "veryDarkBrown",
            Category::Brown => "brown",
            Category::PartlyPurple => "partlyPurple",
            Category::TotalPurple => "totalPurple",
            Category::G1 => "g1",
            Category::G2 => "g2",
            Category::G3 => "g3",
            Category::G4 => "g4",
            Category::Mouldy => "mouldy",
            Category::InsectInfested => "insectInfested",
            Category::Slaty => "slaty",
            Category::Germinated => "germinated",
        }
    }

    /// Resolve a camelCase vocabulary key (exact match)
    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.key() == key)
    }

    pub fn group(self) -> CategoryGroup {
        match self {
            Category::VeryDarkBrown
            | Category::Brown
            | Category::PartlyPurple
            | Category::TotalPurple => CategoryGroup::Colour,
            Category::G1 | Category::G2 | Category::G3 | Category::G4 => CategoryGroup::Cut,
            Category::Mouldy
            | Category::InsectInfested
            | Category::Slaty
            | Category::Germinated => CategoryGroup::Defect,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
