//! Bean grade computation
//!
//! A grade code is a defect digit followed by a size letter, e.g. `"1A"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DetectionTally;
use crate::Error;

/// Fraction of the per-image detection cap a defect count may reach while
/// still grading as `1`
pub const DEFECT_THRESHOLD_RATIO: f64 = 0.03;

/// Defect severity digit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectGrade {
    /// `1`: every defect measure within threshold
    One,
    /// `2`: at least one defect measure over threshold
    Two,
}

/// Bean size letter (bean count per 100 g, larger means smaller beans)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeGrade {
    /// `A`: at most 100 beans
    A,
    /// `B`: 101 to 110 beans
    B,
    /// `C`: anything else
    C,
}

impl SizeGrade {
    pub fn from_bean_size(bean_size: i64) -> Self {
        match bean_size {
            i64::MIN..=100 => SizeGrade::A,
            101..=110 => SizeGrade::B,
            _ => SizeGrade::C,
        }
    }
}

/// Two-character bean grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct GradeCode {
    pub defect: DefectGrade,
    pub size: SizeGrade,
}

/// Grade a tally.
///
/// `max_det` is the detector's per-image detection cap; the defect threshold
/// scales with it. Slaty and mouldy counts are tested on their own, insect
/// infested and germinated counts are tested as a sum.
pub fn grade(tally: &DetectionTally, bean_size: i64, max_det: u32) -> GradeCode {
    let threshold = DEFECT_THRESHOLD_RATIO * f64::from(max_det);
    let within = |count: u64| count as f64 <= threshold;

    let defect = if within(u64::from(tally.slaty))
        && within(u64::from(tally.mouldy))
        && within(u64::from(tally.insect_infested) + u64::from(tally.germinated))
    {
        DefectGrade::One
    } else {
        DefectGrade::Two
    };

    GradeCode {
        defect,
        size: SizeGrade::from_bean_size(bean_size),
    }
}

impl fmt::Display for GradeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digit = match self.defect {
            DefectGrade::One => '1',
            DefectGrade::Two => '2',
        };
        let letter = match self.size {
            SizeGrade::A => 'A',
            SizeGrade::B => 'B',
            SizeGrade::C => 'C',
        };
        write!(f, "{}{}", digit, letter)
    }
}

impl FromStr for GradeCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (digit, letter) = match (chars.next(), chars.next(), chars.next()) {
            (Some(d), Some(l), None) => (d, l),
            _ => return Err(Error::InvalidInput(format!("Invalid grade code: {:?}", s))),
        };

        let defect = match digit {
            '1' => DefectGrade::One,
            '2' => DefectGrade::Two,
            _ => return Err(Error::InvalidInput(format!("Invalid grade digit in {:?}", s))),
        };
        let size = match letter {
            'A' => SizeGrade::A,
            'B' => SizeGrade::B,
            'C' => SizeGrade::C,
            _ => return Err(Error::InvalidInput(format!("Invalid grade letter in {:?}", s))),
        };

        Ok(GradeCode { defect, size })
    }
}

impl From<GradeCode> for String {
    fn from(code: GradeCode) -> Self {
        code.to_string()
    }
}

impl TryFrom<String> for GradeCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
