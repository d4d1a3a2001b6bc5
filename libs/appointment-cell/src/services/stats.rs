use chrono::{DateTime, Duration, Utc};

use crate::models::{Appointment, AppointmentStats, AppointmentStatus};

pub fn compute_stats(appointments: &[Appointment]) -> AppointmentStats {
    compute_stats_at(appointments, Utc::now())
}

/// Grouped counts plus the today / next-7-days windows, both excluding
/// cancelled appointments. Windows compare ISO date strings, inclusive.
pub fn compute_stats_at(appointments: &[Appointment], now: DateTime<Utc>) -> AppointmentStats {
    let today = now.format("%Y-%m-%d").to_string();
    let next_week = (now + Duration::days(7)).format("%Y-%m-%d").to_string();

    let mut stats = AppointmentStats {
        total: appointments.len() as u64,
        ..AppointmentStats::default()
    };

    for appointment in appointments {
        *stats.by_status.entry(appointment.status.as_str().to_string()).or_insert(0) += 1;
        *stats.by_priority.entry(appointment.priority.as_str().to_string()).or_insert(0) += 1;
        *stats.by_type.entry(appointment.appointment_type.as_str().to_string()).or_insert(0) += 1;
        *stats.by_doctor.entry(appointment.doctor_name.clone()).or_insert(0) += 1;

        if appointment.status == AppointmentStatus::Cancelled {
            continue;
        }

        let date = appointment.appointment_date.as_str();
        if date == today {
            stats.upcoming_today += 1;
        }
        if date >= today.as_str() && date <= next_week.as_str() {
            stats.upcoming_week += 1;
        }
    }

    stats
}
