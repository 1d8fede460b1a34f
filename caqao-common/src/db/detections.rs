//! Assessment record queries
//!
//! Scratch records live in `temp_detections`, promoted records in
//! `detections`. Every assessment adds a scratch record; promotion copies one
//! scratch record (the most recent unless an id is given) into `detections`
//! and purges the whole scratch table in the same transaction.

use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::models::{
    record_from_row, AssessmentRecord, NewAssessment, RecordSummary, StoredImage, TALLY_COLUMNS,
};
use crate::grading::Category;
use crate::{Error, Result};

/// Store a fresh assessment as a scratch record, returning its id
pub async fn insert_scratch(pool: &SqlitePool, assessment: &NewAssessment) -> Result<i64> {
    let columns = TALLY_COLUMNS.join(", ");
    let placeholders = vec!["?"; TALLY_COLUMNS.len()].join(", ");
    let sql = format!(
        "INSERT INTO temp_detections (image, filename, mimetype, bean_grade, created_at, {}) \
         VALUES (?, ?, ?, ?, ?, {})",
        columns, placeholders
    );

    let mut query = sqlx::query(&sql)
        .bind(&assessment.image)
        .bind(&assessment.filename)
        .bind(&assessment.mimetype)
        .bind(assessment.grade.to_string())
        .bind(assessment.created_at);
    for category in Category::ALL {
        query = query.bind(i64::from(assessment.tally.get(category)));
    }

    let result = query.execute(pool).await?;
    let id = result.last_insert_rowid();

    debug!("Stored scratch record {} ({})", id, assessment.filename);
    Ok(id)
}

/// Promote a scratch record and purge all scratch records.
///
/// With `scratch_id == None` the most recent scratch record is promoted.
/// `user_id`, when given, must name an existing user ([`Error::NotFound`]
/// otherwise). Fails with
/// [`Error::NoScratchRecord`] when there is nothing matching to promote; on
/// any failure neither table is modified.
pub async fn promote_scratch(
    pool: &SqlitePool,
    scratch_id: Option<i64>,
    user_id: Option<i64>,
) -> Result<AssessmentRecord> {
    // Write lock up front; concurrent scratch inserts wait on the busy timeout
    let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

    // Single INSERT ... SELECT: the newest scratch row is read under the
    // write lock, not in a separate query
    let columns = TALLY_COLUMNS.join(", ");
    let sql = format!(
        "INSERT INTO detections (user_id, image, filename, mimetype, bean_grade, created_at, {cols}) \
         SELECT ?, image, filename, mimetype, bean_grade, created_at, {cols} \
         FROM temp_detections \
         WHERE (? IS NULL OR id = ?) \
         ORDER BY id DESC LIMIT 1",
        cols = columns
    );

    let inserted = sqlx::query(&sql)
        .bind(user_id)
        .bind(scratch_id)
        .bind(scratch_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let fk_violation = matches!(
                &e,
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation()
            );
            match user_id {
                Some(user_id) if fk_violation => Error::NotFound(format!("User {}", user_id)),
                _ => Error::Database(e),
            }
        })?;

    if inserted.rows_affected() == 0 {
        // Dropping the transaction rolls it back
        return Err(Error::NoScratchRecord);
    }
    let promoted_id = inserted.last_insert_rowid();

    let purged = sqlx::query("DELETE FROM temp_detections")
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let row = sqlx::query("SELECT * FROM detections WHERE id = ?")
        .bind(promoted_id)
        .fetch_one(&mut *tx)
        .await?;
    let record = record_from_row(&row, true)?;

    tx.commit().await?;

    info!(
        "Promoted assessment {} as record {} (purged {} scratch record(s))",
        record.filename, promoted_id, purged
    );
    Ok(record)
}

/// Load one promoted record by id
pub async fn get_detection(pool: &SqlitePool, id: i64) -> Result<Option<AssessmentRecord>> {
    let row = sqlx::query("SELECT * FROM detections WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|row| record_from_row(&row, true)).transpose()
}

/// Load one scratch record by id
pub async fn get_scratch(pool: &SqlitePool, id: i64) -> Result<Option<AssessmentRecord>> {
    let row = sqlx::query("SELECT * FROM temp_detections WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|row| record_from_row(&row, false)).transpose()
}

/// Number of pending scratch records
pub async fn count_scratch(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM temp_detections")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// List all promoted records in id order
pub async fn list_detections(pool: &SqlitePool) -> Result<Vec<RecordSummary>> {
    let rows = sqlx::query("SELECT id, filename FROM detections ORDER BY id")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| -> Result<RecordSummary> {
            Ok(RecordSummary {
                id: row.try_get("id")?,
                filename: row.try_get("filename")?,
            })
        })
        .collect()
}

/// Find an image by filename, promoted records first, then scratch records
pub async fn find_image(pool: &SqlitePool, filename: &str) -> Result<Option<StoredImage>> {
    for table in ["detections", "temp_detections"] {
        let sql = format!(
            "SELECT filename, mimetype, image FROM {} WHERE filename = ? ORDER BY id DESC LIMIT 1",
            table
        );
        let row = sqlx::query(&sql)
            .bind(filename)
            .fetch_optional(pool)
            .await?;

        if let Some(row) = row {
            return Ok(Some(StoredImage {
                filename: row.try_get("filename")?,
                mimetype: row.try_get("mimetype")?,
                image: row.try_get("image")?,
            }));
        }
    }

    Ok(None)
}
