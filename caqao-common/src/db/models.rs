//! Database models

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::grading::{Category, DetectionTally, GradeCode};
use crate::{Error, Result};

/// Mime type of every stored (annotated) image
pub const ANNOTATED_IMAGE_MIMETYPE: &str = "image/jpeg";

/// Fresh assessment result, about to be written as a scratch record
#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub image: Vec<u8>,
    pub mimetype: String,
    pub filename: String,
    pub tally: DetectionTally,
    pub grade: GradeCode,
    pub created_at: DateTime<Utc>,
}

/// Stored assessment, scratch or promoted
#[derive(Debug, Clone)]
pub struct AssessmentRecord {
    pub id: i64,
    /// Owning user, promoted records only
    pub user_id: Option<i64>,
    pub image: Vec<u8>,
    pub mimetype: String,
    pub filename: String,
    pub tally: DetectionTally,
    pub grade: GradeCode,
    pub created_at: DateTime<Utc>,
}

/// One entry of the promoted-record listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub id: i64,
    pub filename: String,
}

/// Image payload looked up by filename
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub mimetype: String,
    pub image: Vec<u8>,
}

/// Column names of the twelve counters, in [`Category::ALL`] order
pub(crate) const TALLY_COLUMNS: [&str; 12] = [
    "very_dark_brown",
    "brown",
    "partly_purple",
    "total_purple",
    "g1",
    "g2",
    "g3",
    "g4",
    "mouldy",
    "insect_infested",
    "slaty",
    "germinated",
];

pub(crate) fn tally_from_row(row: &SqliteRow) -> Result<DetectionTally> {
    let mut tally = DetectionTally::default();
    for (category, column) in Category::ALL.iter().zip(TALLY_COLUMNS) {
        let value: i64 = row.try_get(column)?;
        let count = u32::try_from(value).map_err(|_| {
            Error::Internal(format!("Counter {} out of range: {}", column, value))
        })?;
        tally.add(*category, count);
    }
    Ok(tally)
}

/// Map a `detections` or `temp_detections` row; `user_id` is read only when
/// the row carries it
pub(crate) fn record_from_row(row: &SqliteRow, with_user: bool) -> Result<AssessmentRecord> {
    let grade: String = row.try_get("bean_grade")?;
    let user_id = if with_user {
        row.try_get("user_id")?
    } else {
        None
    };

    Ok(AssessmentRecord {
        id: row.try_get("id")?,
        user_id,
        image: row.try_get("image")?,
        mimetype: row.try_get("mimetype")?,
        filename: row.try_get("filename")?,
        tally: tally_from_row(row)?,
        grade: grade.parse()?,
        created_at: row.try_get("created_at")?,
    })
}
