//! Detector label normalization
//!
//! The detector reports labels such as `"Very Dark Brown-G1"` (colour and
//! cut grade joined by a hyphen) or `"Insect Infested"` (a single defect).
//! Each hyphen segment is a multi-word token that is camelCased and looked up
//! in the [`Category`] vocabulary.

use super::Category;
use crate::{Error, Result};

/// The one or two categories a single label contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCategories {
    /// Standalone defect label
    Single(Category),
    /// Compound `colour-grade` label
    Compound { colour: Category, grade: Category },
}

impl LabelCategories {
    /// Iterate the categories in label order
    pub fn iter(&self) -> impl Iterator<Item = Category> {
        let (first, second) = match *self {
            LabelCategories::Single(c) => (c, None),
            LabelCategories::Compound { colour, grade } => (colour, Some(grade)),
        };
        std::iter::once(first).chain(second)
    }
}

/// Normalize one detector label into its categories.
///
/// Only the first two hyphen segments are considered. Fails with
/// [`Error::MalformedLabel`] when a considered segment has no words, and with
/// [`Error::UnknownCategory`] when a segment is not in the vocabulary.
pub fn normalize_label(label: &str) -> Result<LabelCategories> {
    let lowered = label.to_lowercase();
    let mut segments = lowered.split('-');

    // split() always yields at least one segment
    let first = segments.next().unwrap_or_default();
    match segments.next() {
        Some(second) => Ok(LabelCategories::Compound {
            colour: resolve_token(label, first)?,
            grade: resolve_token(label, second)?,
        }),
        None => Ok(LabelCategories::Single(resolve_token(label, first)?)),
    }
}

fn resolve_token(label: &str, token: &str) -> Result<Category> {
    let key = camel_case(token).ok_or_else(|| Error::MalformedLabel(label.to_string()))?;
    Category::from_key(&key).ok_or_else(|| Error::UnknownCategory {
        label: label.to_string(),
        key,
    })
}

/// `"very dark brown"` -> `"veryDarkBrown"`; `None` for a blank token
fn camel_case(token: &str) -> Option<String> {
    let mut words = token.split_whitespace();
    let mut key = words.next()?.to_lowercase();
    for word in words {
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            key.extend(head.to_uppercase());
            key.push_str(&chars.as_str().to_lowercase());
        }
    }
    Some(key)
}
