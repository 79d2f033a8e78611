//! Conversational Spanish date labels, relative to a reference "today".

use chrono::{Datelike, Duration, NaiveDate};

use shared_utils::time::weekday_number;

const WEEKDAY_NAMES: [&str; 7] = [
    "domingo",
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
];

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

pub fn weekday_name(weekday: i32) -> &'static str {
    WEEKDAY_NAMES[weekday.rem_euclid(7) as usize]
}

/// Renders a calendar date the way a person would say it relative to
/// `reference`: "hoy …", "mañana …", "pasado mañana …", "este <weekday> …"
/// within the reference week, "el próximo <weekday> …" in the following
/// week, and "el <weekday> <day> de <month>" beyond that.
///
/// Weeks start on Sunday and are anchored on the reference date's weekday
/// number, not on a fixed calendar grid.
pub fn format_date_conversational(date: NaiveDate, reference: NaiveDate) -> String {
    let base = format!(
        "{} {} de {}",
        weekday_name(weekday_number(date)),
        date.day(),
        MONTH_NAMES[date.month0() as usize]
    );

    match (date - reference).num_days() {
        0 => format!("hoy {}", base),
        1 => format!("mañana {}", base),
        2 => format!("pasado mañana {}", base),
        days if days < 0 => format!("el {}", base),
        _ => {
            let week_start = reference - Duration::days(i64::from(weekday_number(reference)));
            if date < week_start + Duration::days(7) {
                format!("este {}", base)
            } else if date < week_start + Duration::days(14) {
                format!("el próximo {}", base)
            } else {
                format!("el {}", base)
            }
        }
    }
}
