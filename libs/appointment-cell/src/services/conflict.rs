use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, Slot};
use crate::store::AppointmentStore;

/// First active record, other than `exclude_id`, occupying exactly `slot`.
pub fn find_conflict<'a, I>(slot: &Slot, exclude_id: Option<&str>, records: I) -> Option<&'a Appointment>
where
    I: IntoIterator<Item = &'a Appointment>,
{
    records.into_iter().find(|appointment| {
        exclude_id != Some(appointment.id.as_str())
            && appointment.doctor_name == slot.doctor_name
            && appointment.appointment_date == slot.appointment_date
            && appointment.appointment_time == slot.appointment_time
            && appointment.status.is_active()
    })
}

pub fn has_conflict<'a, I>(slot: &Slot, exclude_id: Option<&str>, records: I) -> bool
where
    I: IntoIterator<Item = &'a Appointment>,
{
    find_conflict(slot, exclude_id, records).is_some()
}

pub struct ConflictDetectionService {
    store: Arc<dyn AppointmentStore>,
}

impl ConflictDetectionService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Check whether `slot` is already held by an active appointment.
    ///
    /// The store narrows candidates natively; the match is re-checked here so
    /// stores that over-fetch stay correct.
    pub async fn check_slot(&self, slot: &Slot, exclude_id: Option<&str>) -> Result<bool, AppointmentError> {
        debug!(
            "Checking conflicts for doctor {} on {} at {}",
            slot.doctor_name, slot.appointment_date, slot.appointment_time
        );

        let candidates = self.store.find_in_slot(slot, exclude_id).await?;

        match find_conflict(slot, exclude_id, &candidates) {
            Some(existing) => {
                warn!(
                    "Conflict detected for doctor {} on {} at {} with appointment {}",
                    slot.doctor_name, slot.appointment_date, slot.appointment_time, existing.id
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
