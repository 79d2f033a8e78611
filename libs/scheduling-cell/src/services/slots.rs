//! Pure slot math: expands open intervals into fixed-width candidate
//! slots and removes any that collide with booked appointments.

use chrono::{DateTime, Timelike, Utc};

use shared_models::SchedulingError;
use shared_utils::time::{minutes_to_time, ranges_overlap, time_to_minutes};

use crate::models::{Appointment, AvailabilitySlotSnapshot};

/// Start times ("HH:MM") of every bookable slot of `slot_minutes` width
/// inside `open_intervals`, net of `booked` appointments for that date.
///
/// Candidates step from each interval's start; one that would overrun
/// the interval end is discarded rather than shortened. Results keep
/// generation order (interval order, ascending within an interval) and
/// are not de-duplicated across coinciding intervals. Deterministic and
/// side-effect-free.
pub fn calculate_available_slots(
    open_intervals: &[AvailabilitySlotSnapshot],
    booked: &[Appointment],
    slot_minutes: i64,
) -> Result<Vec<String>, SchedulingError> {
    let booked_ranges = booked_minute_ranges(booked);

    let mut available = Vec::new();
    for interval in open_intervals {
        let interval_start = time_to_minutes(&interval.start_time)?;
        let interval_end = time_to_minutes(&interval.end_time)?;

        let mut slot_start = interval_start;
        while slot_start + slot_minutes <= interval_end {
            let slot_end = slot_start + slot_minutes;

            let collides = booked_ranges
                .iter()
                .any(|&(booked_start, booked_end)| {
                    ranges_overlap(slot_start, slot_end, booked_start, booked_end)
                });

            if !collides {
                available.push(minutes_to_time(slot_start));
            }

            slot_start += slot_minutes;
        }
    }

    Ok(available)
}

/// UTC minute-of-day ranges occupied by the given appointments.
fn booked_minute_ranges(booked: &[Appointment]) -> Vec<(i64, i64)> {
    booked
        .iter()
        .map(|appointment| {
            (
                minute_of_day(appointment.start_time),
                minute_of_day(appointment.end_time),
            )
        })
        .collect()
}

fn minute_of_day(timestamp: DateTime<Utc>) -> i64 {
    i64::from(timestamp.hour()) * 60 + i64::from(timestamp.minute())
}
