//! Twelve-counter detection tally

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{normalize_label, Category};
use crate::Result;

/// Per-category detection counts for one image.
///
/// Serializes with the camelCase category keys, so it can be flattened
/// straight into API responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionTally {
    pub very_dark_brown: u32,
    pub brown: u32,
    pub partly_purple: u32,
    pub total_purple: u32,
    pub g1: u32,
    pub g2: u32,
    pub g3: u32,
    pub g4: u32,
    pub mouldy: u32,
    pub insect_infested: u32,
    pub slaty: u32,
    pub germinated: u32,
}

impl DetectionTally {
    /// Count detections by label.
    ///
    /// Labels are grouped case-insensitively, then each distinct label is
    /// normalized once and its count added to one or two counters. Any label
    /// that fails normalization fails the whole tally.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for label in labels {
            *counts.entry(label.as_ref().to_lowercase()).or_insert(0) += 1;
        }
        Self::from_label_counts(counts.iter().map(|(label, count)| (label.as_str(), *count)))
    }

    /// Build a tally from already grouped `(label, count)` pairs
    pub fn from_label_counts<'a, I>(label_counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, u32)>,
    {
        let mut tally = Self::default();
        for (label, count) in label_counts {
            for category in normalize_label(label)?.iter() {
                tally.add(category, count);
            }
        }
        Ok(tally)
    }

    pub fn get(&self, category: Category) -> u32 {
        *self.slot(category)
    }

    pub fn add(&mut self, category: Category, count: u32) {
        let slot = self.slot_mut(category);
        *slot = slot.saturating_add(count);
    }

    /// Sum of all counters (compound labels count twice)
    pub fn total(&self) -> u64 {
        Category::ALL.iter().map(|c| u64::from(self.get(*c))).sum()
    }

    fn slot(&self, category: Category) -> &u32 {
        match category {
            Category::VeryDarkBrown => &self.very_dark_brown,
            Category::Brown => &self.brown,
            Category::PartlyPurple => &self.partly_purple,
            Category::TotalPurple => &self.total_purple,
            Category::G1 => &self.g1,
            Category::G2 => &self.g2,
            Category::G3 => &self.g3,
            Category::G4 => &self.g4,
            Category::Mouldy => &self.mouldy,
            Category::InsectInfested => &self.insect_infested,
            Category::Slaty => &self.slaty,
            Category::Germinated => &self.germinated,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::VeryDarkBrown => &mut self.very_dark_brown,
            Category::Brown => &mut self.brown,
            Category::PartlyPurple => &mut self.partly_purple,
            Category::TotalPurple => &mut self.total_purple,
            Category::G1 => &mut self.g1,
            Category::G2 => &mut self.g2,
            Category::G3 => &mut self.g3,
            Category::G4 => &mut self.g4,
            Category::Mouldy => &mut self.mouldy,
            Category::InsectInfested => &mut self.insect_infested,
            Category::Slaty => &mut self.slaty,
            Category::Germinated => &mut self.germinated,
        }
    }
}
