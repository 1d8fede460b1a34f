//! Bean classification and grading
//!
//! Turns the raw class labels reported by the detector into a fixed
//! twelve-counter [`DetectionTally`], and the tally plus a bean-size
//! measurement into a two-character [`GradeCode`].
//!
//! Everything in this module is pure: no I/O, no global state.

mod category;
mod grade;
mod normalize;
mod tally;

pub use category::{Category, CategoryGroup};
pub use grade::{grade, DefectGrade, GradeCode, SizeGrade, DEFECT_THRESHOLD_RATIO};
pub use normalize::{normalize_label, LabelCategories};
pub use tally::DetectionTally;
