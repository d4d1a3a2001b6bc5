use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::models::{Appointment, AppointmentError, AppointmentFilters, Slot, UpdateAppointmentRequest, UpdateStamp};

pub mod memory;
pub mod supabase;

pub use memory::InMemoryAppointmentStore;
pub use supabase::SupabaseAppointmentStore;

/// One batch of records plus the cursor to the next batch, if any.
#[derive(Debug, Clone, Default)]
pub struct StorePage {
    pub items: Vec<Appointment>,
    pub next_cursor: Option<String>,
}

/// Persistence seam for appointments.
///
/// Implementations may push `list` filters down natively; callers still
/// re-check results, so over-fetching is allowed but dropping matches is not.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError>;

    async fn get(&self, id: &str) -> Result<Option<Appointment>, AppointmentError>;

    async fn list(
        &self,
        filters: &AppointmentFilters,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<StorePage, AppointmentError>;

    /// Apply a partial update. `Ok(None)` when no record has this id.
    async fn update(
        &self,
        id: &str,
        changes: &UpdateAppointmentRequest,
        stamp: &UpdateStamp,
    ) -> Result<Option<Appointment>, AppointmentError>;

    /// Remove and return the record. `Ok(None)` when no record has this id.
    async fn delete(&self, id: &str) -> Result<Option<Appointment>, AppointmentError>;

    /// Active records in `slot`, excluding `exclude_id`.
    async fn find_in_slot(&self, slot: &Slot, exclude_id: Option<&str>) -> Result<Vec<Appointment>, AppointmentError>;
}

pub(crate) fn encode_cursor(offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(offset.to_string())
}

pub(crate) fn decode_cursor(cursor: Option<&str>) -> Result<usize, AppointmentError> {
    let Some(cursor) = cursor else {
        return Ok(0);
    };

    URL_SAFE_NO_PAD
        .decode(cursor)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| AppointmentError::InvalidRequest(format!("Invalid cursor '{}'", cursor)))
}

/// Cursor for the batch after `offset + fetched`, or `None` once a short batch ends the scan.
pub(crate) fn next_cursor(offset: usize, fetched: usize, limit: usize) -> Option<String> {
    (fetched > 0 && fetched >= limit).then(|| encode_cursor(offset + fetched))
}
