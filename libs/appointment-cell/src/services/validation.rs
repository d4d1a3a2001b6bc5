use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;

use crate::models::{CreateAppointmentRequest, UpdateAppointmentRequest};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time pattern is valid"));

pub const PATIENT_NAME_ERROR: &str = "Patient name must be at least 2 characters";
pub const EMAIL_ERROR: &str = "Invalid email";
pub const DOCTOR_NAME_ERROR: &str = "Doctor name must be at least 2 characters";
pub const DATE_FORMAT_ERROR: &str = "Date must be in YYYY-MM-DD format";
pub const TIME_FORMAT_ERROR: &str = "Time must be in HH:MM format";
pub const PAST_DATE_ERROR: &str = "Appointment date and time cannot be in the past";

fn is_valid_name(name: &str) -> bool {
    name.trim().chars().count() >= 2
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn is_valid_date(date: &str) -> bool {
    DATE_PATTERN.is_match(date)
}

fn is_valid_time(time: &str) -> bool {
    TIME_PATTERN.is_match(time)
}

/// Combined date and time as a UTC instant, if both parse.
///
/// The date regex alone admits values like `2025-13-99`; those yield `None`.
pub fn appointment_instant(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Some(date.and_time(time))
}

pub fn validate_create_request(request: &CreateAppointmentRequest) -> Vec<String> {
    validate_create_request_at(request, Utc::now())
}

/// Every violated rule is reported; checks never short-circuit.
pub fn validate_create_request_at(request: &CreateAppointmentRequest, now: DateTime<Utc>) -> Vec<String> {
    let mut errors = Vec::new();

    if !request.patient_name.as_deref().is_some_and(is_valid_name) {
        errors.push(PATIENT_NAME_ERROR.to_string());
    }

    if !request.patient_email.as_deref().is_some_and(is_valid_email) {
        errors.push(EMAIL_ERROR.to_string());
    }

    if !request.doctor_name.as_deref().is_some_and(is_valid_name) {
        errors.push(DOCTOR_NAME_ERROR.to_string());
    }

    if !request.appointment_date.as_deref().is_some_and(is_valid_date) {
        errors.push(DATE_FORMAT_ERROR.to_string());
    }

    if !request.appointment_time.as_deref().is_some_and(is_valid_time) {
        errors.push(TIME_FORMAT_ERROR.to_string());
    }

    if let Some(date) = request.appointment_date.as_deref().filter(|d| !d.is_empty()) {
        let time = request.appointment_time.as_deref().filter(|t| !t.is_empty()).unwrap_or("00:00");
        if let Some(instant) = appointment_instant(date, time) {
            if instant < now.naive_utc() {
                errors.push(PAST_DATE_ERROR.to_string());
            }
        }
    }

    errors
}

/// Format rules for whichever fields an update carries. Past dates are allowed here.
pub fn validate_update_request(request: &UpdateAppointmentRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if request.patient_name.as_deref().is_some_and(|n| !is_valid_name(n)) {
        errors.push(PATIENT_NAME_ERROR.to_string());
    }
    if request.patient_email.as_deref().is_some_and(|e| !is_valid_email(e)) {
        errors.push(EMAIL_ERROR.to_string());
    }
    if request.doctor_name.as_deref().is_some_and(|n| !is_valid_name(n)) {
        errors.push(DOCTOR_NAME_ERROR.to_string());
    }
    if request.appointment_date.as_deref().is_some_and(|d| !is_valid_date(d)) {
        errors.push(DATE_FORMAT_ERROR.to_string());
    }
    if request.appointment_time.as_deref().is_some_and(|t| !is_valid_time(t)) {
        errors.push(TIME_FORMAT_ERROR.to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn valid_request() -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_name: Some("Ana Torres".into()),
            patient_email: Some("ana@example.com".into()),
            doctor_name: Some("Dr. House".into()),
            appointment_date: Some("2025-12-15".into()),
            appointment_time: Some("10:00".into()),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_well_formed_future_request() {
        assert!(validate_create_request_at(&valid_request(), now()).is_empty());
    }

    #[test]
    fn reports_every_violated_rule() {
        let request = CreateAppointmentRequest {
            patient_email: None,
            doctor_name: None,
            ..valid_request()
        };
        let errors = validate_create_request_at(&request, now());
        assert_eq!(errors, vec![EMAIL_ERROR.to_string(), DOCTOR_NAME_ERROR.to_string()]);
    }

    #[test]
    fn empty_request_fails_all_field_rules() {
        let errors = validate_create_request_at(&CreateAppointmentRequest::default(), now());
        assert_eq!(errors.len(), 5);
        assert!(!errors.contains(&PAST_DATE_ERROR.to_string()));
    }

    #[test]
    fn names_are_trimmed_before_length_check() {
        let request = CreateAppointmentRequest {
            patient_name: Some("  A  ".into()),
            ..valid_request()
        };
        assert_eq!(validate_create_request_at(&request, now()), vec![PATIENT_NAME_ERROR.to_string()]);
    }

    #[test]
    fn email_pattern_is_permissive_but_needs_at_and_dot() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@b.co"));
    }

    #[test]
    fn time_accepts_24_hour_clock_only() {
        assert!(is_valid_time("00:00"));
        assert!(is_valid_time("23:59"));
        assert!(is_valid_time("9:30"));
        assert!(!is_valid_time("24:00"));
        assert!(!is_valid_time("12:60"));
        assert!(!is_valid_time("12:5"));
    }

    #[test]
    fn calendar_invalid_date_passes_format_check() {
        let request = CreateAppointmentRequest {
            appointment_date: Some("2025-13-99".into()),
            ..valid_request()
        };
        assert!(validate_create_request_at(&request, now()).is_empty());
    }

    #[test]
    fn past_instant_is_rejected() {
        let request = CreateAppointmentRequest {
            appointment_date: Some("2025-06-01".into()),
            appointment_time: Some("11:59".into()),
            ..valid_request()
        };
        assert_eq!(validate_create_request_at(&request, now()), vec![PAST_DATE_ERROR.to_string()]);
    }

    #[test]
    fn missing_time_defaults_to_midnight_for_past_check() {
        let request = CreateAppointmentRequest {
            appointment_date: Some("2025-06-01".into()),
            appointment_time: None,
            ..valid_request()
        };
        let errors = validate_create_request_at(&request, now());
        assert_eq!(errors, vec![TIME_FORMAT_ERROR.to_string(), PAST_DATE_ERROR.to_string()]);
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        let update = UpdateAppointmentRequest {
            notes: Some(Some("bring results".into())),
            ..Default::default()
        };
        assert!(validate_update_request(&update).is_empty());

        let update = UpdateAppointmentRequest {
            patient_email: Some("nope".into()),
            appointment_time: Some("25:00".into()),
            ..Default::default()
        };
        assert_eq!(
            validate_update_request(&update),
            vec![EMAIL_ERROR.to_string(), TIME_FORMAT_ERROR.to_string()]
        );
    }

    #[test]
    fn update_allows_past_dates() {
        let update = UpdateAppointmentRequest {
            appointment_date: Some("2001-01-01".into()),
            ..Default::default()
        };
        assert!(validate_update_request(&update).is_empty());
    }
}
