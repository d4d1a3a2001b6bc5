// libs/appointment-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_name: String,
    pub patient_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    pub doctor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_specialty: Option<String>,
    pub appointment_date: String,
    pub appointment_time: String,
    /// Length in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub status: AppointmentStatus,
    pub priority: AppointmentPriority,
    pub appointment_type: AppointmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_info: Option<InsuranceInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

impl Appointment {
    pub const DEFAULT_DURATION_MINUTES: u32 = 30;

    /// Build a new record from a validated creation request.
    ///
    /// Status is always `scheduled`; defaults are filled for duration, priority and type.
    pub fn from_request(
        id: String,
        request: CreateAppointmentRequest,
        now: DateTime<Utc>,
        created_by: Option<String>,
    ) -> Self {
        Self {
            id,
            patient_name: request.patient_name.unwrap_or_default(),
            patient_email: request.patient_email.unwrap_or_default(),
            patient_phone: request.patient_phone,
            doctor_name: request.doctor_name.unwrap_or_default(),
            doctor_specialty: request.doctor_specialty,
            appointment_date: request.appointment_date.unwrap_or_default(),
            appointment_time: request.appointment_time.unwrap_or_default(),
            duration: Some(
                request
                    .duration
                    .filter(|minutes| *minutes > 0)
                    .unwrap_or(Self::DEFAULT_DURATION_MINUTES),
            ),
            status: AppointmentStatus::Scheduled,
            priority: request.priority.unwrap_or_default(),
            appointment_type: request.appointment_type.unwrap_or_default(),
            notes: request.notes,
            symptoms: request.symptoms,
            room_number: request.room_number,
            cost: request.cost,
            insurance_info: request.insurance_info,
            created_at: now,
            updated_at: now,
            created_by: created_by.clone(),
            updated_by: created_by,
        }
    }

    pub fn slot(&self) -> Slot {
        Slot {
            doctor_name: self.doctor_name.clone(),
            appointment_date: self.appointment_date.clone(),
            appointment_time: self.appointment_time.clone(),
        }
    }

    /// Refresh the mutation stamp; `updated_at` never drops below `created_at`.
    pub fn touch(&mut self, stamp: &UpdateStamp) {
        self.updated_at = stamp.at.max(self.created_at);
        if stamp.by.is_some() {
            self.updated_by = stamp.by.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceInfo {
    pub provider: String,
    pub policy_number: String,
    pub coverage_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in-progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no-show",
        }
    }

    /// Statuses that hold a doctor's slot.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl AppointmentPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentPriority::Low => "low",
            AppointmentPriority::Medium => "medium",
            AppointmentPriority::High => "high",
            AppointmentPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for AppointmentPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    #[default]
    Consultation,
    FollowUp,
    Procedure,
    Emergency,
}

impl AppointmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentType::Consultation => "consultation",
            AppointmentType::FollowUp => "follow-up",
            AppointmentType::Procedure => "procedure",
            AppointmentType::Emergency => "emergency",
        }
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (doctor, date, time) triple a scheduling conflict is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    pub doctor_name: String,
    pub appointment_date: String,
    pub appointment_time: String,
}

/// Who/when of a mutation.
#[derive(Debug, Clone)]
pub struct UpdateStamp {
    pub at: DateTime<Utc>,
    pub by: Option<String>,
}

impl UpdateStamp {
    pub fn now(by: Option<String>) -> Self {
        Self { at: Utc::now(), by }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Body of `POST /appointments`. Required fields are optional here so that a
/// missing field is reported by validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_specialty: Option<String>,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub duration: Option<u32>,
    pub priority: Option<AppointmentPriority>,
    pub appointment_type: Option<AppointmentType>,
    pub notes: Option<String>,
    pub symptoms: Option<String>,
    pub room_number: Option<String>,
    pub cost: Option<f64>,
    pub insurance_info: Option<InsuranceInfo>,
}

// Present-but-null deserializes to Some(None) so clearing can be told apart from absence.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update. `None` leaves a field untouched; for optional attributes
/// `Some(None)` (an explicit JSON `null`) clears it.
///
/// Serializing yields exactly the changed fields, with `null` for cleared ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub doctor_specialty: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub duration: Option<Option<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AppointmentPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<AppointmentType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub room_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub cost: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub insurance_info: Option<Option<InsuranceInfo>>,
}

impl UpdateAppointmentRequest {
    pub fn with_status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// True when the update moves the appointment to another doctor, date or time.
    pub fn touches_slot(&self) -> bool {
        self.doctor_name.is_some() || self.appointment_date.is_some() || self.appointment_time.is_some()
    }

    /// True when the update moves an inactive record back to an active status.
    pub fn reactivates(&self, current: &Appointment) -> bool {
        self.status.is_some_and(|status| status.is_active()) && !current.status.is_active()
    }

    /// Slot the record would occupy once this update is applied.
    pub fn resulting_slot(&self, current: &Appointment) -> Slot {
        Slot {
            doctor_name: self.doctor_name.clone().unwrap_or_else(|| current.doctor_name.clone()),
            appointment_date: self
                .appointment_date
                .clone()
                .unwrap_or_else(|| current.appointment_date.clone()),
            appointment_time: self
                .appointment_time
                .clone()
                .unwrap_or_else(|| current.appointment_time.clone()),
        }
    }

    pub fn apply_to(&self, appointment: &mut Appointment) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }

        set(&mut appointment.patient_name, &self.patient_name);
        set(&mut appointment.patient_email, &self.patient_email);
        set(&mut appointment.patient_phone, &self.patient_phone);
        set(&mut appointment.doctor_name, &self.doctor_name);
        set(&mut appointment.doctor_specialty, &self.doctor_specialty);
        set(&mut appointment.appointment_date, &self.appointment_date);
        set(&mut appointment.appointment_time, &self.appointment_time);
        set(&mut appointment.duration, &self.duration);
        set(&mut appointment.status, &self.status);
        set(&mut appointment.priority, &self.priority);
        set(&mut appointment.appointment_type, &self.appointment_type);
        set(&mut appointment.notes, &self.notes);
        set(&mut appointment.symptoms, &self.symptoms);
        set(&mut appointment.room_number, &self.room_number);
        set(&mut appointment.cost, &self.cost);
        set(&mut appointment.insurance_info, &self.insurance_info);
    }
}

/// Optional list predicates; combined with AND. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<String>,
}

impl AppointmentFilters {
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            doctor_name: keep(self.doctor_name),
            patient_email: keep(self.patient_email),
            status: keep(self.status),
            appointment_date: keep(self.appointment_date),
            date_from: keep(self.date_from),
            date_to: keep(self.date_to),
            priority: keep(self.priority),
            appointment_type: keep(self.appointment_type),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Raw query string of `GET /appointments`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListQuery {
    #[serde(flatten)]
    pub filters: AppointmentFilters,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub include_stats: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
    pub total: usize,
    pub page: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "AppointmentFilters::is_empty")]
    pub filters: AppointmentFilters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<AppointmentStats>,
}

// ==============================================================================
// STATISTICS MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
    pub by_doctor: BTreeMap<String, u64>,
    pub upcoming_today: u64,
    pub upcoming_week: u64,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("An appointment is already scheduled for this doctor at that time")]
    ConflictDetected,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Store error: {0}")]
    Store(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Appointment {
        let request: CreateAppointmentRequest = serde_json::from_value(json!({
            "patientName": "Ana Torres",
            "patientEmail": "ana@example.com",
            "doctorName": "Dr. House",
            "appointmentDate": "2030-01-10",
            "appointmentTime": "09:30",
            "notes": "first visit",
            "cost": 80.5
        }))
        .unwrap();
        Appointment::from_request("apt-1".into(), request, Utc::now(), None)
    }

    #[test]
    fn new_records_get_defaults() {
        let appointment = sample();
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.priority, AppointmentPriority::Medium);
        assert_eq!(appointment.appointment_type, AppointmentType::Consultation);
        assert_eq!(appointment.duration, Some(30));
        assert_eq!(appointment.created_at, appointment.updated_at);
    }

    #[test]
    fn enums_use_kebab_case_on_the_wire() {
        assert_eq!(json!(AppointmentStatus::InProgress), json!("in-progress"));
        assert_eq!(json!(AppointmentStatus::NoShow), json!("no-show"));
        assert_eq!(json!(AppointmentType::FollowUp), json!("follow-up"));
        assert_eq!(AppointmentStatus::NoShow.as_str(), "no-show");
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let update: UpdateAppointmentRequest =
            serde_json::from_value(json!({ "notes": null, "roomNumber": "B-12" })).unwrap();
        assert_eq!(update.notes, Some(None));
        assert_eq!(update.room_number, Some(Some("B-12".to_string())));
        assert_eq!(update.symptoms, None);

        let mut appointment = sample();
        update.apply_to(&mut appointment);
        assert_eq!(appointment.notes, None);
        assert_eq!(appointment.room_number.as_deref(), Some("B-12"));
        assert_eq!(appointment.cost, Some(80.5));
    }

    #[test]
    fn update_serializes_only_changed_fields() {
        let update: UpdateAppointmentRequest =
            serde_json::from_value(json!({ "cost": null, "status": "confirmed" })).unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "cost": null, "status": "confirmed" })
        );
    }

    #[test]
    fn resulting_slot_merges_with_current_record() {
        let appointment = sample();
        let update = UpdateAppointmentRequest {
            appointment_time: Some("11:00".into()),
            ..Default::default()
        };
        assert!(update.touches_slot());
        let slot = update.resulting_slot(&appointment);
        assert_eq!(slot.doctor_name, "Dr. House");
        assert_eq!(slot.appointment_date, "2030-01-10");
        assert_eq!(slot.appointment_time, "11:00");
    }

    #[test]
    fn reactivation_only_counts_inactive_to_active() {
        let mut appointment = sample();
        let confirm = UpdateAppointmentRequest::with_status(AppointmentStatus::Confirmed);
        assert!(!confirm.reactivates(&appointment));

        appointment.status = AppointmentStatus::Cancelled;
        assert!(confirm.reactivates(&appointment));
        assert!(!UpdateAppointmentRequest::with_status(AppointmentStatus::NoShow).reactivates(&appointment));
        assert!(!UpdateAppointmentRequest::default().reactivates(&appointment));
    }

    #[test]
    fn touch_never_moves_updated_at_before_created_at() {
        let mut appointment = sample();
        let earlier = appointment.created_at - chrono::Duration::seconds(5);
        appointment.touch(&UpdateStamp { at: earlier, by: Some("user-123".into()) });
        assert_eq!(appointment.updated_at, appointment.created_at);
        assert_eq!(appointment.updated_by.as_deref(), Some("user-123"));
    }

    #[test]
    fn blank_filters_are_dropped() {
        let filters = AppointmentFilters {
            doctor_name: Some(String::new()),
            status: Some("scheduled".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(filters.doctor_name, None);
        assert_eq!(filters.status.as_deref(), Some("scheduled"));
    }
}
