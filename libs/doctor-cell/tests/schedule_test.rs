// libs/doctor-cell/tests/schedule_test.rs

mod common;

use assert_matches::assert_matches;
use chrono::NaiveTime;
use proptest::prelude::*;
use uuid::Uuid;

use doctor_cell::models::{DoctorError, SetScheduleEntryRequest};
use shared_utils::test_utils::time;

use common::TestPractice;

fn entry(weekday: u8, start: NaiveTime, end: NaiveTime) -> SetScheduleEntryRequest {
    SetScheduleEntryRequest {
        weekday,
        start_time: start,
        end_time: end,
        break_start: None,
        break_end: None,
    }
}

fn entry_with_break(
    weekday: u8,
    start: NaiveTime,
    end: NaiveTime,
    break_start: NaiveTime,
    break_end: NaiveTime,
) -> SetScheduleEntryRequest {
    SetScheduleEntryRequest {
        break_start: Some(break_start),
        break_end: Some(break_end),
        ..entry(weekday, start, end)
    }
}

// ==============================================================================
// VALIDATION
// ==============================================================================

#[tokio::test]
async fn test_rejects_start_not_before_end() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor = practice.doctor();

    let result = schedule.set_entry(org, doctor, entry(0, time(17, 0), time(8, 0))).await;
    assert_matches!(result, Err(DoctorError::Validation(_)));

    let result = schedule.set_entry(org, doctor, entry(0, time(8, 0), time(8, 0))).await;
    assert_matches!(result, Err(DoctorError::Validation(_)));
}

#[tokio::test]
async fn test_rejects_break_outside_working_hours() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor = practice.doctor();

    let early = entry_with_break(1, time(8, 0), time(17, 0), time(7, 30), time(8, 30));
    assert_matches!(schedule.set_entry(org, doctor, early).await, Err(DoctorError::Validation(_)));

    let late = entry_with_break(1, time(8, 0), time(17, 0), time(16, 30), time(17, 30));
    assert_matches!(schedule.set_entry(org, doctor, late).await, Err(DoctorError::Validation(_)));

    let inverted = entry_with_break(1, time(8, 0), time(17, 0), time(13, 0), time(12, 0));
    assert_matches!(schedule.set_entry(org, doctor, inverted).await, Err(DoctorError::Validation(_)));
}

#[tokio::test]
async fn test_rejects_half_specified_break() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let request = SetScheduleEntryRequest {
        break_start: Some(time(12, 0)),
        ..entry(2, time(8, 0), time(17, 0))
    };

    let result = schedule.set_entry(org, practice.doctor(), request).await;
    assert_matches!(result, Err(DoctorError::Validation(_)));
}

#[tokio::test]
async fn test_rejects_weekday_out_of_range() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let result = schedule.set_entry(org, practice.doctor(), entry(7, time(8, 0), time(17, 0))).await;
    assert_matches!(result, Err(DoctorError::Validation(_)));
}

#[tokio::test]
async fn test_break_may_touch_working_hours_edges() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let request = entry_with_break(3, time(8, 0), time(17, 0), time(8, 0), time(9, 0));
    let stored = schedule.set_entry(org, practice.doctor(), request).await.unwrap();
    assert!(stored.has_break());
}

// ==============================================================================
// OVERLAP AND UPSERT
// ==============================================================================

#[tokio::test]
async fn test_overlapping_entry_is_rejected() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor = practice.doctor();

    schedule.set_entry(org, doctor, entry(0, time(8, 0), time(12, 0))).await.unwrap();

    let result = schedule.set_entry(org, doctor, entry(0, time(11, 0), time(15, 0))).await;
    assert_matches!(
        result,
        Err(DoctorError::ScheduleOverlap { weekday: 0, existing_start, existing_end })
            if existing_start == time(8, 0) && existing_end == time(12, 0)
    );
}

#[tokio::test]
async fn test_touching_entries_are_allowed_and_ordered() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor = practice.doctor();

    schedule.set_entry(org, doctor, entry(4, time(14, 0), time(18, 0))).await.unwrap();
    schedule.set_entry(org, doctor, entry(4, time(8, 0), time(14, 0))).await.unwrap();

    let entries = schedule.entries_for(org, doctor, 4).await.unwrap();
    let starts: Vec<_> = entries.iter().map(|e| e.start_time).collect();
    assert_eq!(starts, vec![time(8, 0), time(14, 0)]);
}

#[tokio::test]
async fn test_same_start_replaces_entry_in_place() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor = practice.doctor();

    let first = schedule.set_entry(org, doctor, entry(0, time(8, 0), time(12, 0))).await.unwrap();
    let second = schedule
        .set_entry(org, doctor, entry_with_break(0, time(8, 0), time(17, 0), time(12, 0), time(13, 0)))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    let entries = schedule.entries_for(org, doctor, 0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].end_time, time(17, 0));
    assert_eq!(entries[0].break_start, Some(time(12, 0)));
}

#[tokio::test]
async fn test_entries_are_scoped_per_doctor_and_weekday() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor_a = practice.doctor();
    let doctor_b = practice.doctor();

    schedule.set_entry(org, doctor_a, entry(0, time(8, 0), time(12, 0))).await.unwrap();
    schedule.set_entry(org, doctor_b, entry(0, time(9, 0), time(11, 0))).await.unwrap();
    schedule.set_entry(org, doctor_a, entry(1, time(9, 0), time(11, 0))).await.unwrap();

    assert_eq!(schedule.entries_for(org, doctor_a, 0).await.unwrap().len(), 1);
    assert_eq!(schedule.entries_for(org, doctor_a, 2).await.unwrap().len(), 0);

    let week = schedule.entries_for_doctor(org, doctor_a).await.unwrap();
    let days: Vec<_> = week.iter().map(|e| e.weekday).collect();
    assert_eq!(days, vec![0, 1]);
}

#[tokio::test]
async fn test_remove_entry() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor = practice.doctor();

    let stored = schedule.set_entry(org, doctor, entry(5, time(8, 0), time(12, 0))).await.unwrap();
    schedule.remove_entry(org, doctor, stored.id).await.unwrap();

    assert!(schedule.entries_for(org, doctor, 5).await.unwrap().is_empty());
    assert_matches!(
        schedule.remove_entry(org, doctor, stored.id).await,
        Err(DoctorError::NotFound(_))
    );
}

#[tokio::test]
async fn test_doctor_of_other_organisation_is_not_found() {
    let practice = TestPractice::new();
    let (schedule, org) = (&practice.schedule, practice.organization_id);
    let doctor = practice.doctor();
    schedule.set_entry(org, doctor, entry(0, time(8, 0), time(12, 0))).await.unwrap();

    let foreign = Uuid::new_v4();
    assert_matches!(
        schedule.set_entry(foreign, doctor, entry(0, time(13, 0), time(17, 0))).await,
        Err(DoctorError::NotFound(_))
    );
    assert_matches!(schedule.entries_for_doctor(foreign, doctor).await, Err(DoctorError::NotFound(_)));

    // Unregistered ids cannot carry a schedule either
    assert_matches!(
        schedule.set_entry(org, Uuid::new_v4(), entry(0, time(8, 0), time(12, 0))).await,
        Err(DoctorError::NotFound(_))
    );

    assert_eq!(schedule.entries_for(org, doctor, 0).await.unwrap().len(), 1);
}

// ==============================================================================
// PROPERTIES
// ==============================================================================

fn arb_request() -> impl Strategy<Value = SetScheduleEntryRequest> {
    (0u8..2, 0u32..48, 1u32..16).prop_map(|(weekday, start_slot, len_slots)| {
        let start_minutes = start_slot * 30;
        let end_minutes = (start_minutes + len_slots * 30).min(23 * 60 + 59);
        let at = |minutes: u32| NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap();
        entry(weekday, at(start_minutes), at(end_minutes))
    })
}

proptest! {
    #[test]
    fn prop_stored_entries_never_overlap(requests in prop::collection::vec(arb_request(), 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let entries = runtime.block_on(async {
            let practice = TestPractice::new();
            let (schedule, org) = (&practice.schedule, practice.organization_id);
            let doctor = practice.doctor();
            for request in requests {
                // Rejections are expected; only stored state matters here.
                let _ = schedule.set_entry(org, doctor, request).await;
            }
            schedule.entries_for_doctor(org, doctor).await.unwrap()
        });

        for (i, a) in entries.iter().enumerate() {
            prop_assert!(a.start_time < a.end_time);
            for b in entries.iter().skip(i + 1) {
                if a.weekday == b.weekday {
                    prop_assert!(!a.overlaps(b.start_time, b.end_time),
                        "{}-{} overlaps {}-{}", a.start_time, a.end_time, b.start_time, b.end_time);
                }
            }
        }
    }
}
