mod common;

use std::sync::Arc;

use time::macros::time;

use clinic_scheduler::db::{AppointmentStatus, NewMedicine};
use clinic_scheduler::scheduling::store::MedicineStore;
use clinic_scheduler::scheduling::BookingError;

use common::{diagnosis, draft, harness, harness_with, rx, Harness, LockstepReads, DAY};

async fn booked(h: &Harness) -> uuid::Uuid {
    h.service
        .book_slot(DAY, time!(9:00), draft("Ada"))
        .await
        .unwrap()
        .appointment
        .id
}

async fn medicine(h: &Harness, name: &str, stock: i32) -> uuid::Uuid {
    h.medicines
        .create(NewMedicine {
            name: name.to_string(),
            stock,
        })
        .await
        .unwrap()
        .id
}

async fn stock_of(h: &Harness, id: uuid::Uuid) -> i32 {
    h.medicines.get(id).await.unwrap().unwrap().stock
}

#[tokio::test]
async fn cancel_requires_a_reason() {
    let h = harness();
    let id = booked(&h).await;

    let err = h.service.cancel_appointment(id, "  ").await.unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
    assert_eq!(
        h.service.get_appointment(id).await.unwrap().status,
        AppointmentStatus::Scheduled
    );

    let cancelled = h
        .service
        .cancel_appointment(id, "Feeling better")
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Feeling better"));
}

#[tokio::test]
async fn cancelling_keeps_the_slot_counted() {
    let h = harness();
    let id = booked(&h).await;
    h.service.cancel_appointment(id, "No show").await.unwrap();

    assert!(!h.service.is_available(DAY, time!(9:00)).await.unwrap());
}

#[tokio::test]
async fn complete_requires_blood_pressure_and_a_complaint() {
    let h = harness();
    let id = booked(&h).await;

    let mut missing_bp = diagnosis(Vec::new());
    missing_bp.blood_pressure = String::new();
    let err = h
        .service
        .complete_appointment(id, missing_bp)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    let mut no_complaint = diagnosis(Vec::new());
    no_complaint.chief_complaints.clear();
    let err = h
        .service
        .complete_appointment(id, no_complaint)
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    assert_eq!(
        h.service.get_appointment(id).await.unwrap().status,
        AppointmentStatus::Scheduled
    );
}

#[tokio::test]
async fn terminal_appointments_do_not_move() {
    let h = harness();
    let id = booked(&h).await;
    h.service
        .complete_appointment(id, diagnosis(Vec::new()))
        .await
        .unwrap();

    let err = h
        .service
        .cancel_appointment(id, "Too late")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::InvalidTransition {
            from: AppointmentStatus::Completed,
            to: AppointmentStatus::Cancelled,
        }
    ));
}

#[tokio::test]
async fn completion_takes_prescribed_stock() {
    let h = harness();
    let id = booked(&h).await;
    let paracetamol = medicine(&h, "Paracetamol", 10).await;

    let completed = h
        .service
        .complete_appointment(id, diagnosis(vec![rx(paracetamol, 3)]))
        .await
        .unwrap();

    assert_eq!(completed.status, AppointmentStatus::Completed);
    assert_eq!(stock_of(&h, paracetamol).await, 7);
}

#[tokio::test]
async fn insufficient_stock_rejects_and_leaves_everything_untouched() {
    let h = harness();
    let id = booked(&h).await;
    let plenty = medicine(&h, "Ibuprofen", 10).await;
    let scarce = medicine(&h, "Amoxicillin", 1).await;

    let err = h
        .service
        .complete_appointment(id, diagnosis(vec![rx(plenty, 2), rx(scarce, 5)]))
        .await
        .unwrap_err();

    match err {
        BookingError::Validation(message) => assert!(message.contains("Amoxicillin")),
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert_eq!(stock_of(&h, plenty).await, 10);
    assert_eq!(stock_of(&h, scarce).await, 1);
    assert_eq!(
        h.service.get_appointment(id).await.unwrap().status,
        AppointmentStatus::Scheduled
    );
}

#[tokio::test]
async fn diagnosis_update_applies_only_the_difference() {
    let h = harness();
    let id = booked(&h).await;
    let a = medicine(&h, "Cetirizine", 10).await;
    let b = medicine(&h, "Omeprazole", 10).await;

    h.service
        .complete_appointment(id, diagnosis(vec![rx(a, 4), rx(b, 2)]))
        .await
        .unwrap();
    assert_eq!((stock_of(&h, a).await, stock_of(&h, b).await), (6, 8));

    let updated = h
        .service
        .update_diagnosis(id, diagnosis(vec![rx(a, 1), rx(b, 5)]))
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Completed);
    assert_eq!((stock_of(&h, a).await, stock_of(&h, b).await), (9, 5));
}

#[tokio::test]
async fn diagnosis_edit_needs_a_completed_appointment() {
    let h = harness();
    let id = booked(&h).await;

    let err = h
        .service
        .update_diagnosis(id, diagnosis(Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
}

#[tokio::test]
async fn unknown_and_deleted_appointments_are_not_found() {
    let h = harness();
    let id = booked(&h).await;

    h.service.delete_appointment(id).await.unwrap();
    assert!(matches!(
        h.service.get_appointment(id).await.unwrap_err(),
        BookingError::NotFound(_)
    ));
    assert!(matches!(
        h.service.delete_appointment(id).await.unwrap_err(),
        BookingError::NotFound(_)
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn completing_twice_at_once_takes_stock_once() {
    let h = harness_with(Arc::new(LockstepReads::new(2)));
    let id = booked(&h).await;
    let paracetamol = medicine(&h, "Paracetamol", 10).await;

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&h.service);
            tokio::spawn(async move {
                service
                    .complete_appointment(id, diagnosis(vec![rx(paracetamol, 3)]))
                    .await
            })
        })
        .collect();

    let mut completed = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => completed += 1,
            Err(err) => assert!(
                matches!(err, BookingError::InvalidTransition { .. }),
                "unexpected error: {err}"
            ),
        }
    }

    assert_eq!(completed, 1);
    assert_eq!(stock_of(&h, paracetamol).await, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_racing_complete_leaves_one_terminal_state() {
    let h = harness_with(Arc::new(LockstepReads::new(2)));
    let id = booked(&h).await;
    let paracetamol = medicine(&h, "Paracetamol", 10).await;

    let complete = {
        let service = Arc::clone(&h.service);
        tokio::spawn(async move {
            service
                .complete_appointment(id, diagnosis(vec![rx(paracetamol, 3)]))
                .await
        })
    };
    let cancel = {
        let service = Arc::clone(&h.service);
        tokio::spawn(async move { service.cancel_appointment(id, "Left early").await })
    };

    let completed = complete.await.unwrap();
    let cancelled = cancel.await.unwrap();
    assert!(
        completed.is_ok() != cancelled.is_ok(),
        "exactly one of complete/cancel must win"
    );

    let stored = h.service.get_appointment(id).await.unwrap();
    match completed {
        Ok(_) => {
            assert_eq!(stored.status, AppointmentStatus::Completed);
            assert_eq!(stock_of(&h, paracetamol).await, 7);
            assert!(matches!(
                cancelled.unwrap_err(),
                BookingError::InvalidTransition {
                    from: AppointmentStatus::Completed,
                    to: AppointmentStatus::Cancelled,
                }
            ));
        }
        Err(err) => {
            assert_eq!(stored.status, AppointmentStatus::Cancelled);
            assert_eq!(stock_of(&h, paracetamol).await, 10);
            assert!(matches!(
                err,
                BookingError::InvalidTransition {
                    from: AppointmentStatus::Cancelled,
                    to: AppointmentStatus::Completed,
                }
            ));
        }
    }
}
