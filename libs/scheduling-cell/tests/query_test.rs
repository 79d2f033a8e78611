use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    Appointment, AppointmentStatus, AvailabilityExceptionType, CreateExceptionRequest,
    CreateTemplateRequest, DoctorAvailabilityResponse,
};
use scheduling_cell::services::{AvailabilityQueryService, AvailabilityService, ExceptionService};
use scheduling_cell::stores::{
    InMemoryAppointmentStore, InMemoryExceptionStore, InMemoryTemplateStore,
};
use shared_config::ScheduleConfig;
use shared_models::SchedulingError;

struct TestCore {
    doctor_id: Uuid,
    availability: Arc<AvailabilityService>,
    exceptions: Arc<ExceptionService>,
    appointments: Arc<InMemoryAppointmentStore>,
    query: AvailabilityQueryService,
}

fn create_core() -> TestCore {
    let templates = Arc::new(InMemoryTemplateStore::new());
    let appointments = Arc::new(InMemoryAppointmentStore::new());
    let exceptions = Arc::new(ExceptionService::new(Arc::new(InMemoryExceptionStore::new())));
    let availability = Arc::new(AvailabilityService::new(
        templates,
        exceptions.clone(),
        ScheduleConfig::default(),
    ));
    let query = AvailabilityQueryService::new(
        availability.clone(),
        appointments.clone(),
        ScheduleConfig::default(),
    );

    TestCore { doctor_id: Uuid::new_v4(), availability, exceptions, appointments, query }
}

fn template(weekday: i32, start: &str, end: &str) -> CreateTemplateRequest {
    CreateTemplateRequest {
        weekday,
        start_time: start.to_string(),
        end_time: end.to_string(),
        is_recurring: None,
        clinic_id: None,
        location: None,
        notes: None,
    }
}

fn appointment(
    doctor_id: Uuid,
    date: (i32, u32, u32),
    start: (u32, u32),
    end: (u32, u32),
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        doctor_id,
        clinic_id: None,
        patient_id: Uuid::new_v4(),
        start_time: Utc
            .with_ymd_and_hms(date.0, date.1, date.2, start.0, start.1, 0)
            .unwrap(),
        end_time: Utc.with_ymd_and_hms(date.0, date.1, date.2, end.0, end.1, 0).unwrap(),
        status,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_query_aggregates_dates_and_slots() {
    let core = create_core();

    // Monday 09:00-11:00 and Tuesday 09:00-10:00 in June 2030
    core.availability
        .create(core.doctor_id, template(1, "09:00", "11:00"))
        .await
        .unwrap();
    core.availability
        .create(core.doctor_id, template(2, "09:00", "10:00"))
        .await
        .unwrap();

    // One real booking plus a cancelled one that must not block anything
    core.appointments
        .insert(appointment(
            core.doctor_id,
            (2030, 6, 3),
            (9, 30),
            (10, 0),
            AppointmentStatus::Confirmed,
        ))
        .await;
    core.appointments
        .insert(appointment(
            core.doctor_id,
            (2030, 6, 3),
            (10, 0),
            (10, 30),
            AppointmentStatus::Cancelled,
        ))
        .await;

    let response = core
        .query
        .get_availability_for_doctor(core.doctor_id, Some("2030-06-03"), Some("2030-06-04"))
        .await
        .unwrap();

    let found = match response {
        DoctorAvailabilityResponse::Available(found) => found,
        other => panic!("expected available dates, got {:?}", other),
    };

    assert_eq!(found.total_days, 2);
    assert_eq!(found.total_slots, 5);
    assert_eq!(found.range.start, date(2030, 6, 3));
    assert_eq!(found.range.end, date(2030, 6, 4));

    let monday = &found.available_dates[0];
    assert_eq!(monday.date, date(2030, 6, 3));
    assert_eq!(monday.slots, vec!["09:00", "10:00", "10:30"]);
    assert_eq!(monday.label, "el lunes 3 de junio");

    let tuesday = &found.available_dates[1];
    assert_eq!(tuesday.slots, vec!["09:00", "09:30"]);
}

#[tokio::test]
async fn test_query_uses_extra_hours_without_template() {
    let core = create_core();

    // Sunday has no template, only a one-off extra-hours exception
    core.exceptions
        .create(
            core.doctor_id,
            CreateExceptionRequest {
                date: Utc.with_ymd_and_hms(2030, 6, 9, 0, 0, 0).unwrap(),
                exception_type: AvailabilityExceptionType::ExtraHours,
                reason: Some("Jornada especial".to_string()),
                start_time: Some("10:00".to_string()),
                end_time: Some("11:00".to_string()),
            },
        )
        .await
        .unwrap();

    let response = core
        .query
        .get_availability_for_doctor(core.doctor_id, Some("2030-06-09"), Some("2030-06-09"))
        .await
        .unwrap();

    let found = match response {
        DoctorAvailabilityResponse::Available(found) => found,
        other => panic!("expected available dates, got {:?}", other),
    };

    assert_eq!(found.total_days, 1);
    assert_eq!(found.available_dates[0].slots, vec!["10:00", "10:30"]);
    assert_eq!(found.available_dates[0].weekday, 0);
}

#[tokio::test]
async fn test_query_rejects_unparseable_range() {
    let core = create_core();

    let result = core
        .query
        .get_availability_for_doctor(core.doctor_id, Some("mañana"), None)
        .await;

    assert_matches!(result, Err(SchedulingError::Validation(_)));
}

#[tokio::test]
async fn test_blocked_range_falls_back_with_suggestions() {
    let core = create_core();

    // Tuesday template, but the requested Tuesday is blocked
    core.availability
        .create(core.doctor_id, template(2, "09:00", "12:00"))
        .await
        .unwrap();
    core.exceptions
        .create(
            core.doctor_id,
            CreateExceptionRequest {
                date: Utc.with_ymd_and_hms(2030, 6, 4, 0, 0, 0).unwrap(),
                exception_type: AvailabilityExceptionType::Blocked,
                reason: Some("Vacaciones".to_string()),
                start_time: None,
                end_time: None,
            },
        )
        .await
        .unwrap();

    let response = core
        .query
        .get_availability_for_doctor(core.doctor_id, Some("2030-06-04"), Some("2030-06-04"))
        .await
        .unwrap();

    let fallback = match response {
        DoctorAvailabilityResponse::NoAvailability(fallback) => fallback,
        other => panic!("expected fallback, got {:?}", other),
    };

    assert!(fallback.available_dates.is_empty());
    assert_eq!(fallback.regular_schedule, "martes de 09:00 a 12:00");

    // The scan starts the day after the range and finds the next Tuesday
    assert!(!fallback.suggestions.is_empty());
    let first = &fallback.suggestions[0];
    assert_eq!(first.date, date(2030, 6, 11));
    assert_eq!(first.label, "el martes 11 de junio");
    assert_eq!(first.slots.len(), 5); // 6 raw slots capped at 5

    assert!(fallback.message.contains("el martes 11 de junio"));
    assert!(fallback.message.contains("09:00, 09:30, 10:00"));
    assert!(fallback.message.contains("y 2 más"));
}

#[tokio::test]
async fn test_bookings_on_final_range_date_are_filtered() {
    let core = create_core();

    core.availability
        .create(core.doctor_id, template(1, "09:00", "10:00"))
        .await
        .unwrap();
    core.availability
        .create(core.doctor_id, template(2, "09:00", "10:00"))
        .await
        .unwrap();

    // The booking sits on the last calendar date of the queried range
    core.appointments
        .insert(appointment(
            core.doctor_id,
            (2030, 6, 4),
            (9, 0),
            (9, 30),
            AppointmentStatus::Confirmed,
        ))
        .await;

    let response = core
        .query
        .get_availability_for_doctor(core.doctor_id, Some("2030-06-03"), Some("2030-06-04"))
        .await
        .unwrap();

    let found = match response {
        DoctorAvailabilityResponse::Available(found) => found,
        other => panic!("expected available dates, got {:?}", other),
    };

    assert_eq!(found.total_days, 2);
    let tuesday = &found.available_dates[1];
    assert_eq!(tuesday.date, date(2030, 6, 4));
    assert_eq!(tuesday.slots, vec!["09:30"]);
}

#[tokio::test]
async fn test_fully_booked_day_falls_back() {
    let core = create_core();

    core.availability
        .create(core.doctor_id, template(1, "09:00", "10:00"))
        .await
        .unwrap();
    core.appointments
        .insert(appointment(
            core.doctor_id,
            (2030, 6, 3),
            (9, 0),
            (10, 0),
            AppointmentStatus::Confirmed,
        ))
        .await;

    let response = core
        .query
        .get_availability_for_doctor(core.doctor_id, Some("2030-06-03"), Some("2030-06-03"))
        .await
        .unwrap();

    // Every slot is booked, so the day contributes nothing
    assert_matches!(response, DoctorAvailabilityResponse::NoAvailability(_));
}

#[tokio::test]
async fn test_fallback_without_any_schedule() {
    let core = create_core();

    let response = core
        .query
        .get_availability_for_doctor(core.doctor_id, Some("2030-06-03"), Some("2030-06-05"))
        .await
        .unwrap();

    let fallback = match response {
        DoctorAvailabilityResponse::NoAvailability(fallback) => fallback,
        other => panic!("expected fallback, got {:?}", other),
    };

    assert_eq!(fallback.regular_schedule, "Sin horario semanal configurado");
    assert!(fallback.suggestions.is_empty());
    assert!(fallback.message.contains("próximos días"));
}

#[tokio::test]
async fn test_regular_schedule_describes_active_weekdays() {
    let core = create_core();

    for weekday in [1, 3, 5] {
        core.availability
            .create(core.doctor_id, template(weekday, "09:00", "12:00"))
            .await
            .unwrap();
    }
    // Sunday goes last in the prose regardless of its weekday number
    core.availability
        .create(core.doctor_id, template(0, "09:00", "12:00"))
        .await
        .unwrap();

    let description = core
        .query
        .describe_regular_schedule(core.doctor_id)
        .await
        .unwrap();

    assert_eq!(
        description,
        "lunes, miércoles, viernes y domingo de 09:00 a 12:00"
    );
}

#[tokio::test]
async fn test_find_next_available_slots_caps_suggestions() {
    let core = create_core();

    // Open every single weekday: the scan must stop at five suggestions
    for weekday in 0..7 {
        core.availability
            .create(core.doctor_id, template(weekday, "09:00", "10:00"))
            .await
            .unwrap();
    }

    let suggestions = core
        .query
        .find_next_available_slots(core.doctor_id, date(2030, 6, 3), 14)
        .await;

    assert_eq!(suggestions.len(), 5);
    assert_eq!(suggestions[0].date, date(2030, 6, 3));
    assert_eq!(suggestions[4].date, date(2030, 6, 7));
    assert!(suggestions.iter().all(|s| s.slots == vec!["09:00", "09:30"]));
}

#[tokio::test]
async fn test_find_next_available_slots_respects_day_bound() {
    let core = create_core();

    // Next availability lies past the scan bound
    core.availability
        .create(core.doctor_id, template(2, "09:00", "12:00"))
        .await
        .unwrap();
    core.exceptions
        .create(
            core.doctor_id,
            CreateExceptionRequest {
                date: Utc.with_ymd_and_hms(2030, 6, 11, 0, 0, 0).unwrap(),
                exception_type: AvailabilityExceptionType::Blocked,
                reason: None,
                start_time: None,
                end_time: None,
            },
        )
        .await
        .unwrap();

    // Scanning only 7 days from Wednesday the 5th: the sole Tuesday in
    // reach (the 11th) is blocked
    let suggestions = core
        .query
        .find_next_available_slots(core.doctor_id, date(2030, 6, 5), 7)
        .await;

    assert!(suggestions.is_empty());
}
