// libs/doctor-cell/tests/blocks_test.rs

mod common;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use doctor_cell::models::{BlockKind, CreateBlockRequest, DoctorError};
use shared_utils::test_utils::utc;

use common::TestPractice;

fn block(start: DateTime<Utc>, end: DateTime<Utc>, kind: BlockKind) -> CreateBlockRequest {
    CreateBlockRequest {
        start,
        end,
        kind,
        all_day: false,
        reason: None,
    }
}

#[tokio::test]
async fn test_create_rejects_empty_interval() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let at = utc(2030, 1, 7, 10, 0);

    let result = blocks.create(org, practice.doctor(), block(at, at, BlockKind::Surgery)).await;
    assert_matches!(result, Err(DoctorError::Validation(_)));
}

#[tokio::test]
async fn test_overlapping_blocks_are_allowed() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let doctor = practice.doctor();

    blocks
        .create(org, doctor, block(utc(2030, 1, 7, 9, 0), utc(2030, 1, 7, 12, 0), BlockKind::Surgery))
        .await
        .unwrap();
    blocks
        .create(org, doctor, block(utc(2030, 1, 7, 11, 0), utc(2030, 1, 7, 15, 0), BlockKind::Conference))
        .await
        .unwrap();

    let found = blocks
        .blocks_overlapping(org, doctor, utc(2030, 1, 7, 0, 0), utc(2030, 1, 8, 0, 0))
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].kind, BlockKind::Surgery);
    assert_eq!(found[1].kind, BlockKind::Conference);
}

#[tokio::test]
async fn test_blocks_overlapping_uses_half_open_intervals() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let doctor = practice.doctor();

    blocks
        .create(org, doctor, block(utc(2030, 1, 7, 10, 0), utc(2030, 1, 7, 11, 0), BlockKind::Personal))
        .await
        .unwrap();

    let before = blocks
        .blocks_overlapping(org, doctor, utc(2030, 1, 7, 9, 0), utc(2030, 1, 7, 10, 0))
        .await
        .unwrap();
    assert!(before.is_empty());

    let after = blocks
        .blocks_overlapping(org, doctor, utc(2030, 1, 7, 11, 0), utc(2030, 1, 7, 12, 0))
        .await
        .unwrap();
    assert!(after.is_empty());

    let inside = blocks
        .blocks_overlapping(org, doctor, utc(2030, 1, 7, 10, 59), utc(2030, 1, 7, 11, 30))
        .await
        .unwrap();
    assert_eq!(inside.len(), 1);
}

#[tokio::test]
async fn test_long_block_started_on_previous_day_is_found() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let doctor = practice.doctor();

    blocks
        .create(org, doctor, block(utc(2030, 1, 1, 0, 0), utc(2030, 1, 15, 0, 0), BlockKind::Vacation))
        .await
        .unwrap();

    let found = blocks
        .blocks_overlapping(org, doctor, utc(2030, 1, 7, 0, 0), utc(2030, 1, 8, 0, 0))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_all_day_block_covers_whole_days() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let doctor = practice.doctor();

    let request = CreateBlockRequest {
        all_day: true,
        reason: Some("Annual leave".to_string()),
        ..block(utc(2030, 1, 7, 13, 0), utc(2030, 1, 8, 9, 0), BlockKind::Vacation)
    };
    let stored = blocks.create(org, doctor, request).await.unwrap();

    assert_eq!(stored.start, utc(2030, 1, 7, 0, 0));
    assert_eq!(stored.end, utc(2030, 1, 9, 0, 0));
    assert!(stored.all_day);
}

#[tokio::test]
async fn test_blocks_are_scoped_per_doctor() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let doctor = practice.doctor();

    blocks
        .create(org, doctor, block(utc(2030, 1, 7, 10, 0), utc(2030, 1, 7, 11, 0), BlockKind::Other))
        .await
        .unwrap();

    let other = blocks
        .blocks_overlapping(org, practice.doctor(), utc(2030, 1, 7, 0, 0), utc(2030, 1, 8, 0, 0))
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_remove_block() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let doctor = practice.doctor();

    let stored = blocks
        .create(org, doctor, block(utc(2030, 1, 7, 10, 0), utc(2030, 1, 7, 11, 0), BlockKind::Other))
        .await
        .unwrap();

    blocks.remove(org, doctor, stored.id).await.unwrap();
    assert_matches!(blocks.remove(org, doctor, stored.id).await, Err(DoctorError::NotFound(_)));
}

#[tokio::test]
async fn test_all_day_block_ending_on_last_date_is_rejected() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);

    let request = CreateBlockRequest {
        all_day: true,
        ..block(
            DateTime::<Utc>::MAX_UTC - Duration::days(2),
            DateTime::<Utc>::MAX_UTC,
            BlockKind::Vacation,
        )
    };
    let result = blocks.create(org, practice.doctor(), request).await;
    assert_matches!(result, Err(DoctorError::Validation(_)));
}

#[tokio::test]
async fn test_blocks_of_other_organisation_are_not_reachable() {
    let practice = TestPractice::new();
    let (blocks, org) = (&practice.blocks, practice.organization_id);
    let doctor = practice.doctor();

    let stored = blocks
        .create(org, doctor, block(utc(2030, 1, 7, 10, 0), utc(2030, 1, 7, 11, 0), BlockKind::Surgery))
        .await
        .unwrap();

    let foreign = Uuid::new_v4();
    let result = blocks
        .create(foreign, doctor, block(utc(2030, 1, 8, 10, 0), utc(2030, 1, 8, 11, 0), BlockKind::Other))
        .await;
    assert_matches!(result, Err(DoctorError::NotFound(_)));
    assert_matches!(
        blocks.blocks_overlapping(foreign, doctor, utc(2030, 1, 7, 0, 0), utc(2030, 1, 8, 0, 0)).await,
        Err(DoctorError::NotFound(_))
    );
    assert_matches!(blocks.remove(foreign, doctor, stored.id).await, Err(DoctorError::NotFound(_)));

    // Still in place for its own organisation
    blocks.remove(org, doctor, stored.id).await.unwrap();
}
