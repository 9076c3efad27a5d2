mod common;

use std::sync::Arc;

use time::macros::{date, time};

use clinic_scheduler::db::repositories::MemoryAppointmentStore;
use clinic_scheduler::db::{SlotAdjustment, UnavailabilityKind};
use clinic_scheduler::scheduling::store::AvailabilityStore;
use clinic_scheduler::scheduling::{BookingError, ScheduleEvent, SlotState};

use common::{draft, harness, harness_on, BookingDuringEdit, DAY};

#[tokio::test]
async fn marking_a_selection_then_clearing_the_day() {
    let h = harness();
    let record = h
        .service
        .mark_unavailable(DAY, &[time!(9:30), time!(9:00), time!(10:00)], None)
        .await
        .unwrap();

    assert_eq!(record.kind, UnavailabilityKind::Block);
    assert_eq!(record.range_start, time!(9:00));
    assert_eq!(record.range_end, time!(10:30));
    for slot in [time!(9:00), time!(9:30), time!(10:00)] {
        assert!(!h.service.is_available(DAY, slot).await.unwrap());
    }
    assert!(h.service.is_available(DAY, time!(10:30)).await.unwrap());

    let removed = h.service.clear_unavailability(DAY).await.unwrap();
    assert_eq!(removed, 1);
    assert!(h.service.list_unavailability(DAY).await.unwrap().is_empty());
    assert_eq!(h.service.day_schedule(DAY).await.unwrap().available_starts().count(), 19);
}

#[tokio::test]
async fn clearing_one_day_leaves_others_alone() {
    let h = harness();
    let other_day = date!(2024 - 05 - 07);
    h.service
        .mark_unavailable(DAY, &[time!(8:00)], None)
        .await
        .unwrap();
    h.service
        .mark_unavailable(other_day, &[time!(8:00)], None)
        .await
        .unwrap();

    h.service.clear_unavailability(DAY).await.unwrap();

    assert!(h.service.list_unavailability(DAY).await.unwrap().is_empty());
    assert_eq!(h.service.list_unavailability(other_day).await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_or_off_grid_selection_is_rejected() {
    let h = harness();
    assert!(matches!(
        h.service.mark_unavailable(DAY, &[], None).await.unwrap_err(),
        BookingError::Validation(_)
    ));
    assert!(matches!(
        h.service
            .mark_unavailable(DAY, &[time!(9:10)], None)
            .await
            .unwrap_err(),
        BookingError::Validation(_)
    ));
    assert!(h.service.list_unavailability(DAY).await.unwrap().is_empty());
}

#[tokio::test]
async fn limit_slot_validates_capacity_and_duplicates() {
    let h = harness();
    assert!(matches!(
        h.service
            .limit_slot(DAY, time!(9:00), 0, None)
            .await
            .unwrap_err(),
        BookingError::Validation(_)
    ));

    h.service
        .limit_slot(DAY, time!(9:00), 3, None)
        .await
        .unwrap();
    assert_eq!(
        h.service.slot_state(DAY, time!(9:00)).await.unwrap(),
        SlotState::Limited { remaining: 3 }
    );

    assert!(matches!(
        h.service
            .limit_slot(DAY, time!(9:00), 2, None)
            .await
            .unwrap_err(),
        BookingError::Validation(_)
    ));
}

#[tokio::test]
async fn booked_slot_cannot_be_limited_again() {
    let h = harness();
    h.service
        .book_slot(DAY, time!(12:00), draft("Ada"))
        .await
        .unwrap();

    assert!(matches!(
        h.service
            .limit_slot(DAY, time!(12:00), 4, None)
            .await
            .unwrap_err(),
        BookingError::Validation(_)
    ));
}

#[tokio::test]
async fn admin_adjustment_reopens_a_full_slot() {
    let h = harness();
    let record = h
        .service
        .limit_slot(DAY, time!(16:00), 1, None)
        .await
        .unwrap();
    h.service
        .book_slot(DAY, time!(16:00), draft("Ada"))
        .await
        .unwrap();
    assert_eq!(
        h.service.slot_state(DAY, time!(16:00)).await.unwrap(),
        SlotState::Full
    );

    let adjusted = h
        .service
        .adjust_slot(
            record.id,
            SlotAdjustment {
                capacity: Some(2),
                ..SlotAdjustment::default()
            },
        )
        .await
        .unwrap();
    assert_eq!((adjusted.capacity, adjusted.booked), (Some(2), Some(1)));
    assert!(h.service.is_available(DAY, time!(16:00)).await.unwrap());
}

#[tokio::test]
async fn adjustment_cannot_overbook_or_drop_below_zero() {
    let h = harness();
    let record = h
        .service
        .limit_slot(DAY, time!(8:30), 2, None)
        .await
        .unwrap();

    for booked in [-1, 3] {
        let err = h
            .service
            .adjust_slot(
                record.id,
                SlotAdjustment {
                    booked: Some(booked),
                    ..SlotAdjustment::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    let block = h
        .service
        .mark_unavailable(DAY, &[time!(13:00)], None)
        .await
        .unwrap();
    let err = h
        .service
        .adjust_slot(
            block.id,
            SlotAdjustment {
                booked: Some(1),
                ..SlotAdjustment::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_record_reopens_its_slots() {
    let h = harness();
    let record = h
        .service
        .mark_unavailable(DAY, &[time!(14:00), time!(14:30)], Some("Lunch".to_string()))
        .await
        .unwrap();

    let mut events = h.service.subscribe();
    h.service.delete_unavailability_slot(record.id).await.unwrap();

    assert_eq!(
        events.recv().await.unwrap(),
        ScheduleEvent::AvailabilityChanged {
            date: DAY,
            record_id: record.id,
        }
    );
    assert!(h.service.is_available(DAY, time!(14:00)).await.unwrap());
    assert!(matches!(
        h.service
            .delete_unavailability_slot(record.id)
            .await
            .unwrap_err(),
        BookingError::NotFound(_)
    ));
}

#[tokio::test]
async fn raising_capacity_keeps_a_seat_taken_during_the_edit() {
    let h = harness_on(
        Arc::new(MemoryAppointmentStore::new()),
        Arc::new(BookingDuringEdit::default()),
    );
    let record = h
        .service
        .limit_slot(DAY, time!(9:00), 1, None)
        .await
        .unwrap();

    let adjusted = h
        .service
        .adjust_slot(
            record.id,
            SlotAdjustment {
                capacity: Some(2),
                ..SlotAdjustment::default()
            },
        )
        .await
        .unwrap();

    assert_eq!((adjusted.capacity, adjusted.booked), (Some(2), Some(1)));
    assert_eq!(
        h.service.slot_state(DAY, time!(9:00)).await.unwrap(),
        SlotState::Limited { remaining: 1 }
    );
}

#[tokio::test]
async fn lowering_capacity_below_seats_taken_during_the_edit_is_refused() {
    let h = harness_on(
        Arc::new(MemoryAppointmentStore::new()),
        Arc::new(BookingDuringEdit::default()),
    );
    let record = h
        .service
        .limit_slot(DAY, time!(9:30), 2, None)
        .await
        .unwrap();
    h.service
        .book_slot(DAY, time!(9:30), draft("Ada"))
        .await
        .unwrap();

    // One seat was free when the admin looked; the second goes while saving.
    let err = h
        .service
        .adjust_slot(
            record.id,
            SlotAdjustment {
                capacity: Some(1),
                ..SlotAdjustment::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    let stored = h.availability.get(record.id).await.unwrap().unwrap();
    assert_eq!((stored.capacity, stored.booked), (Some(2), Some(2)));
}

#[tokio::test]
async fn hard_blocks_cannot_gain_a_capacity() {
    let h = harness();
    let block = h
        .service
        .mark_unavailable(DAY, &[time!(11:00), time!(11:30)], Some("Training".to_string()))
        .await
        .unwrap();

    let err = h
        .service
        .adjust_slot(
            block.id,
            SlotAdjustment {
                capacity: Some(3),
                ..SlotAdjustment::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    for slot in [time!(11:00), time!(11:30)] {
        assert!(!h.service.is_available(DAY, slot).await.unwrap());
    }

    let renamed = h
        .service
        .adjust_slot(
            block.id,
            SlotAdjustment {
                reason: Some("Fire drill".to_string()),
                ..SlotAdjustment::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.kind, UnavailabilityKind::Block);
    assert_eq!(renamed.capacity, None);
    assert_eq!(renamed.reason.as_deref(), Some("Fire drill"));
}
