use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Appointment, AppointmentError, AppointmentFilters, Slot, UpdateAppointmentRequest, UpdateStamp};
use crate::services::conflict::find_conflict;
use crate::store::{decode_cursor, next_cursor, AppointmentStore, StorePage};

/// Process-local store. Non-durable; each instance owns its own records.
#[derive(Debug, Default)]
pub struct InMemoryAppointmentStore {
    records: RwLock<BTreeMap<String, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn with_records(records: impl IntoIterator<Item = Appointment>) -> Self {
        let records = records.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let mut records = self.records.write().await;
        if records.contains_key(&appointment.id) {
            return Err(AppointmentError::Store(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }

        debug!("Storing appointment {} in memory", appointment.id);
        records.insert(appointment.id.clone(), appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list(
        &self,
        filters: &AppointmentFilters,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<StorePage, AppointmentError> {
        let offset = decode_cursor(cursor)?;
        let records = self.records.read().await;

        let items: Vec<Appointment> = records
            .values()
            .filter(|a| filters.matches(a))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        debug!("Listed {} appointments from memory at offset {}", items.len(), offset);
        let next_cursor = next_cursor(offset, items.len(), limit);
        Ok(StorePage { items, next_cursor })
    }

    async fn update(
        &self,
        id: &str,
        changes: &UpdateAppointmentRequest,
        stamp: &UpdateStamp,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let mut records = self.records.write().await;
        let Some(appointment) = records.get_mut(id) else {
            return Ok(None);
        };

        changes.apply_to(appointment);
        appointment.touch(stamp);
        Ok(Some(appointment.clone()))
    }

    async fn delete(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.records.write().await.remove(id))
    }

    async fn find_in_slot(&self, slot: &Slot, exclude_id: Option<&str>) -> Result<Vec<Appointment>, AppointmentError> {
        let records = self.records.read().await;
        let mut remaining = records.values();
        let mut found = Vec::new();
        while let Some(existing) = find_conflict(slot, exclude_id, &mut remaining) {
            found.push(existing.clone());
        }
        Ok(found)
    }
}
