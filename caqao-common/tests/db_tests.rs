//! Tests for the scratch/promote record lifecycle and image lookup

use caqao_common::db::detections::{
    count_scratch, find_image, get_detection, get_scratch, insert_scratch, list_detections,
    promote_scratch,
};
use caqao_common::db::init::init_database;
use caqao_common::db::users::{create_user, get_user, NewUser};
use caqao_common::db::{NewAssessment, ANNOTATED_IMAGE_MIMETYPE};
use caqao_common::grading::{grade, DetectionTally};
use caqao_common::Error;
use chrono::Utc;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh database in a temp dir; keep the TempDir alive for the test
async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("detections.db")).await.unwrap();
    (dir, pool)
}

fn assessment(filename: &str, tally: DetectionTally, image: &[u8]) -> NewAssessment {
    NewAssessment {
        image: image.to_vec(),
        mimetype: ANNOTATED_IMAGE_MIMETYPE.to_string(),
        filename: filename.to_string(),
        tally,
        grade: grade(&tally, 90, 50),
        created_at: Utc::now(),
    }
}

fn sample_user(username: &str) -> NewUser {
    NewUser {
        first_name: "Maria".to_string(),
        last_name: "Santos".to_string(),
        email: format!("{}@example.com", username),
        username: username.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
    }
}

#[tokio::test]
async fn test_init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("detections.db");

    let first = init_database(&path).await.unwrap();
    drop(first);
    let second = init_database(&path).await;
    assert!(second.is_ok(), "Reopening failed: {:?}", second.err());
    assert!(path.exists());
}

#[tokio::test]
async fn test_scratch_round_trip() {
    let (_dir, pool) = setup_db().await;
    let tally = DetectionTally {
        brown: 2,
        g2: 2,
        mouldy: 3,
        slaty: 1,
        ..Default::default()
    };

    let id = insert_scratch(&pool, &assessment("a.jpg", tally, b"jpeg-a"))
        .await
        .unwrap();
    let record = get_scratch(&pool, id).await.unwrap().expect("scratch record");

    assert_eq!(record.filename, "a.jpg");
    assert_eq!(record.tally, tally);
    assert_eq!(record.grade.to_string(), "2A");
    assert_eq!(record.image, b"jpeg-a");
    assert_eq!(record.user_id, None);
    assert_eq!(count_scratch(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_promote_copies_latest_and_purges_all() {
    let (_dir, pool) = setup_db().await;
    let older = DetectionTally { g1: 1, ..Default::default() };
    let newer = DetectionTally { g3: 7, ..Default::default() };

    insert_scratch(&pool, &assessment("older.jpg", older, b"old"))
        .await
        .unwrap();
    let newer_id = insert_scratch(&pool, &assessment("newer.jpg", newer, b"new"))
        .await
        .unwrap();
    let newer_scratch = get_scratch(&pool, newer_id).await.unwrap().unwrap();

    let promoted = promote_scratch(&pool, None, None).await.unwrap();

    assert_eq!(promoted.filename, "newer.jpg");
    assert_eq!(promoted.tally, newer);
    assert_eq!(promoted.grade, newer_scratch.grade);
    assert_eq!(promoted.image, b"new");
    assert_eq!(promoted.created_at, newer_scratch.created_at);
    assert_eq!(count_scratch(&pool).await.unwrap(), 0);

    let listing = list_detections(&pool).await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].id, promoted.id);
    assert_eq!(listing[0].filename, "newer.jpg");

    let stored = get_detection(&pool, promoted.id).await.unwrap().unwrap();
    assert_eq!(stored.tally, newer);
}

#[tokio::test]
async fn test_promote_without_scratch_fails_and_changes_nothing() {
    let (_dir, pool) = setup_db().await;

    let result = promote_scratch(&pool, None, None).await;
    assert!(matches!(result, Err(Error::NoScratchRecord)));
    assert!(list_detections(&pool).await.unwrap().is_empty());

    // Second attempt after a successful promotion also fails
    insert_scratch(&pool, &assessment("one.jpg", DetectionTally::default(), b"1"))
        .await
        .unwrap();
    promote_scratch(&pool, None, None).await.unwrap();

    let result = promote_scratch(&pool, None, None).await;
    assert!(matches!(result, Err(Error::NoScratchRecord)));
    assert_eq!(list_detections(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_promote_explicit_scratch_id() {
    let (_dir, pool) = setup_db().await;

    let first = insert_scratch(&pool, &assessment("first.jpg", DetectionTally::default(), b"1"))
        .await
        .unwrap();
    insert_scratch(&pool, &assessment("second.jpg", DetectionTally::default(), b"2"))
        .await
        .unwrap();

    // Unknown id: nothing promoted, scratch kept
    let result = promote_scratch(&pool, Some(first + 100), None).await;
    assert!(matches!(result, Err(Error::NoScratchRecord)));
    assert_eq!(count_scratch(&pool).await.unwrap(), 2);

    let promoted = promote_scratch(&pool, Some(first), None).await.unwrap();
    assert_eq!(promoted.filename, "first.jpg");
    assert_eq!(count_scratch(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_promote_with_owner() {
    let (_dir, pool) = setup_db().await;
    let user_id = create_user(&pool, &sample_user("msantos")).await.unwrap();
    let user = get_user(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(user.username, "msantos");

    insert_scratch(&pool, &assessment("owned.jpg", DetectionTally::default(), b"x"))
        .await
        .unwrap();
    let promoted = promote_scratch(&pool, None, Some(user_id)).await.unwrap();
    assert_eq!(promoted.user_id, Some(user_id));
}

#[tokio::test]
async fn test_promote_with_unknown_owner_rolls_back() {
    let (_dir, pool) = setup_db().await;
    insert_scratch(&pool, &assessment("orphan.jpg", DetectionTally::default(), b"x"))
        .await
        .unwrap();

    let result = promote_scratch(&pool, None, Some(999)).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(count_scratch(&pool).await.unwrap(), 1);
    assert!(list_detections(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let (_dir, pool) = setup_db().await;
    create_user(&pool, &sample_user("dup")).await.unwrap();

    let result = create_user(&pool, &sample_user("dup")).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_find_image_prefers_promoted_then_scratch() {
    let (_dir, pool) = setup_db().await;

    insert_scratch(&pool, &assessment("kept.jpg", DetectionTally::default(), b"promoted"))
        .await
        .unwrap();
    promote_scratch(&pool, None, None).await.unwrap();
    insert_scratch(&pool, &assessment("pending.jpg", DetectionTally::default(), b"scratch"))
        .await
        .unwrap();

    let promoted = find_image(&pool, "kept.jpg").await.unwrap().unwrap();
    assert_eq!(promoted.image, b"promoted");
    assert_eq!(promoted.mimetype, "image/jpeg");

    let pending = find_image(&pool, "pending.jpg").await.unwrap().unwrap();
    assert_eq!(pending.image, b"scratch");

    assert!(find_image(&pool, "missing.jpg").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_assessments_then_single_promotion() {
    let (_dir, pool) = setup_db().await;

    let a = {
        let pool = pool.clone();
        tokio::spawn(async move {
            insert_scratch(&pool, &assessment("a.jpg", DetectionTally::default(), b"a")).await
        })
    };
    let b = {
        let pool = pool.clone();
        tokio::spawn(async move {
            insert_scratch(&pool, &assessment("b.jpg", DetectionTally::default(), b"b")).await
        })
    };
    let id_a = a.await.unwrap().unwrap();
    let id_b = b.await.unwrap().unwrap();

    let promoted = promote_scratch(&pool, None, None).await.unwrap();
    let expected = if id_a > id_b { "a.jpg" } else { "b.jpg" };
    assert_eq!(promoted.filename, expected);
    assert_eq!(count_scratch(&pool).await.unwrap(), 0);
    assert_eq!(list_detections(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_promote_while_assessments_keep_arriving() {
    let (_dir, pool) = setup_db().await;
    insert_scratch(&pool, &assessment("first.jpg", DetectionTally::default(), b"f"))
        .await
        .unwrap();

    let writers: Vec<_> = (0..16)
        .map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let name = format!("burst-{}.jpg", i);
                insert_scratch(&pool, &assessment(&name, DetectionTally::default(), b"b")).await
            })
        })
        .collect();

    let promoted = promote_scratch(&pool, None, None).await;
    assert!(promoted.is_ok(), "Promotion failed: {:?}", promoted.err());

    for writer in writers {
        writer.await.unwrap().unwrap();
    }
    assert_eq!(list_detections(&pool).await.unwrap().len(), 1);
}
