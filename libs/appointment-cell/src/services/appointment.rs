use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::{AppConfig, StoreBackend};

use crate::models::{
    Appointment, AppointmentError, AppointmentFilters, AppointmentListQuery, AppointmentListResponse,
    AppointmentStats, AppointmentStatus, CreateAppointmentRequest, UpdateAppointmentRequest, UpdateStamp,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::query::{run_query, PageRequest};
use crate::services::stats::compute_stats;
use crate::services::validation::{validate_create_request, validate_update_request};
use crate::store::{AppointmentStore, InMemoryAppointmentStore, SupabaseAppointmentStore};

/// Records pulled from the store per round trip when scanning.
const STORE_BATCH_SIZE: usize = 100;

pub struct AppointmentService {
    store: Arc<dyn AppointmentStore>,
    conflict_service: ConflictDetectionService,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        let conflict_service = ConflictDetectionService::new(Arc::clone(&store));
        Self { store, conflict_service }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryAppointmentStore::new()))
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory appointment store");
                Self::in_memory()
            }
            StoreBackend::Supabase => {
                info!("Using Supabase appointment store (table '{}')", config.appointments_table);
                Self::new(Arc::new(SupabaseAppointmentStore::from_config(config)))
            }
        }
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        created_by: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let errors = validate_create_request(&request);
        if !errors.is_empty() {
            warn!("Rejected appointment request: {:?}", errors);
            return Err(AppointmentError::ValidationFailed(errors));
        }

        let appointment = Appointment::from_request(Uuid::new_v4().to_string(), request, Utc::now(), created_by);

        if self.conflict_service.check_slot(&appointment.slot(), None).await? {
            return Err(AppointmentError::ConflictDetected);
        }

        let appointment = self.store.create(appointment).await?;
        info!(
            "Appointment {} created for {} with {} on {} at {}",
            appointment.id,
            appointment.patient_email,
            appointment.doctor_name,
            appointment.appointment_date,
            appointment.appointment_time
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: &str) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", id);
        self.store.get(id).await?.ok_or(AppointmentError::NotFound)
    }

    pub async fn list_appointments(&self, query: AppointmentListQuery) -> Result<AppointmentListResponse, AppointmentError> {
        let page = PageRequest::parse(query.page.as_deref(), query.limit.as_deref())?;
        let filters = query.filters.normalized();
        debug!("Listing appointments with filters {:?}, page {:?}", filters, page);

        let candidates = self.load_matching(&filters).await?;
        let result = run_query(candidates, &filters, page);

        let stats = match query.include_stats.as_deref() {
            Some("true") => Some(compute_stats(&self.load_all().await?)),
            _ => None,
        };

        Ok(AppointmentListResponse {
            appointments: result.items,
            total: result.total,
            page: result.page,
            limit: result.limit,
            filters,
            stats,
        })
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        changes: UpdateAppointmentRequest,
        updated_by: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", id);

        let errors = validate_update_request(&changes);
        if !errors.is_empty() {
            warn!("Rejected update for appointment {}: {:?}", id, errors);
            return Err(AppointmentError::ValidationFailed(errors));
        }

        let current = self.get_appointment(id).await?;

        if changes.touches_slot() || changes.reactivates(&current) {
            let slot = changes.resulting_slot(&current);
            if self.conflict_service.check_slot(&slot, Some(id)).await? {
                return Err(AppointmentError::ConflictDetected);
            }
        }

        let updated = self
            .store
            .update(id, &changes, &UpdateStamp::now(updated_by))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        info!("Appointment {} updated successfully", id);
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: &str) -> Result<Appointment, AppointmentError> {
        let deleted = self.store.delete(id).await?.ok_or(AppointmentError::NotFound)?;
        info!("Appointment {} deleted", id);
        Ok(deleted)
    }

    pub async fn confirm_appointment(&self, id: &str, updated_by: Option<String>) -> Result<Appointment, AppointmentError> {
        self.set_status(id, AppointmentStatus::Confirmed, updated_by).await
    }

    pub async fn cancel_appointment(&self, id: &str, updated_by: Option<String>) -> Result<Appointment, AppointmentError> {
        self.set_status(id, AppointmentStatus::Cancelled, updated_by).await
    }

    pub async fn get_stats(&self) -> Result<AppointmentStats, AppointmentError> {
        let records = self.load_all().await?;
        debug!("Computing stats over {} appointments", records.len());
        Ok(compute_stats(&records))
    }

    /// Forced transition from any current status; slot conflicts are not checked.
    async fn set_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        updated_by: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let changes = UpdateAppointmentRequest::with_status(status);
        let updated = self
            .store
            .update(id, &changes, &UpdateStamp::now(updated_by))
            .await?
            .ok_or(AppointmentError::NotFound)?;

        info!("Appointment {} marked {}", id, status);
        Ok(updated)
    }

    async fn load_all(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.load_matching(&AppointmentFilters::default()).await
    }

    /// Drain every store batch for `filters`, following cursors to the end.
    async fn load_matching(&self, filters: &AppointmentFilters) -> Result<Vec<Appointment>, AppointmentError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.store.list(filters, cursor.as_deref(), STORE_BATCH_SIZE).await?;
            records.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}
