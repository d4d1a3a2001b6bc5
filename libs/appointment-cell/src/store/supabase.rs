use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentFilters, Slot, UpdateAppointmentRequest, UpdateStamp};
use crate::store::{decode_cursor, next_cursor, AppointmentStore, StorePage};

const SCHEDULE_ORDER: &str = "order=appointmentDate.asc,appointmentTime.asc,id.asc";

/// Appointments kept in a Supabase table, reached through PostgREST.
/// Column names match the camelCase wire names.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
    table: String,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>, table: impl Into<String>) -> Self {
        Self {
            supabase,
            table: table.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Arc::new(SupabaseClient::new(config)), config.appointments_table.clone())
    }

    fn table_path(&self) -> String {
        format!("/rest/v1/{}", self.table)
    }

    fn record_path(&self, id: &str) -> String {
        format!("{}?id=eq.{}", self.table_path(), urlencoding::encode(id))
    }

    fn filter_params(filters: &AppointmentFilters) -> Vec<String> {
        let mut params = Vec::new();
        let enc = |v: &str| urlencoding::encode(v).into_owned();

        if let Some(doctor) = &filters.doctor_name {
            params.push(format!("doctorName=ilike.*{}*", enc(doctor)));
        }
        if let Some(email) = &filters.patient_email {
            params.push(format!("patientEmail=ilike.*{}*", enc(email)));
        }
        if let Some(status) = &filters.status {
            params.push(format!("status=eq.{}", enc(status)));
        }
        if let Some(date) = &filters.appointment_date {
            params.push(format!("appointmentDate=eq.{}", enc(date)));
        }
        if let Some(from) = &filters.date_from {
            params.push(format!("appointmentDate=gte.{}", enc(from)));
        }
        if let Some(to) = &filters.date_to {
            params.push(format!("appointmentDate=lte.{}", enc(to)));
        }
        if let Some(priority) = &filters.priority {
            params.push(format!("priority=eq.{}", enc(priority)));
        }
        if let Some(kind) = &filters.appointment_type {
            params.push(format!("appointmentType=eq.{}", enc(kind)));
        }

        params
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, AppointmentError> {
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::Store(format!("Failed to parse appointments: {}", e)))
    }

    fn first_row(rows: Vec<Value>) -> Result<Option<Appointment>, AppointmentError> {
        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Vec<Value>, AppointmentError> {
        let result = if method == Method::GET {
            self.supabase.request(method, path, None, body).await
        } else {
            let headers = SupabaseClient::representation_headers();
            self.supabase
                .request_with_headers(method, path, None, body, Some(headers))
                .await
        };

        result.map_err(|e| AppointmentError::Store(e.to_string()))
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn create(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        debug!("Inserting appointment {} into {}", appointment.id, self.table);

        let body = serde_json::to_value(&appointment)
            .map_err(|e| AppointmentError::Store(format!("Failed to encode appointment: {}", e)))?;
        let rows = self.send(Method::POST, &self.table_path(), Some(body)).await?;

        Self::first_row(rows)?
            .ok_or_else(|| AppointmentError::Store("Insert returned no rows".to_string()))
    }

    async fn get(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        debug!("Fetching appointment {} from {}", id, self.table);
        let rows = self.send(Method::GET, &self.record_path(id), None).await?;
        Self::first_row(rows)
    }

    async fn list(
        &self,
        filters: &AppointmentFilters,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<StorePage, AppointmentError> {
        let offset = decode_cursor(cursor)?;

        let mut params = Self::filter_params(filters);
        params.push(SCHEDULE_ORDER.to_string());
        params.push(format!("limit={}", limit));
        params.push(format!("offset={}", offset));
        let path = format!("{}?{}", self.table_path(), params.join("&"));

        debug!("Listing appointments: {}", path);
        let items = Self::parse_rows(self.send(Method::GET, &path, None).await?)?;
        let next_cursor = next_cursor(offset, items.len(), limit);

        Ok(StorePage { items, next_cursor })
    }

    async fn update(
        &self,
        id: &str,
        changes: &UpdateAppointmentRequest,
        stamp: &UpdateStamp,
    ) -> Result<Option<Appointment>, AppointmentError> {
        debug!("Patching appointment {} in {}", id, self.table);

        let mut body = serde_json::to_value(changes)
            .map_err(|e| AppointmentError::Store(format!("Failed to encode update: {}", e)))?;
        if let Value::Object(fields) = &mut body {
            fields.insert("updatedAt".to_string(), serde_json::json!(stamp.at));
            if let Some(by) = &stamp.by {
                fields.insert("updatedBy".to_string(), Value::String(by.clone()));
            }
        }

        let rows = self.send(Method::PATCH, &self.record_path(id), Some(body)).await?;
        Self::first_row(rows)
    }

    async fn delete(&self, id: &str) -> Result<Option<Appointment>, AppointmentError> {
        debug!("Deleting appointment {} from {}", id, self.table);
        let rows = self.send(Method::DELETE, &self.record_path(id), None).await?;
        Self::first_row(rows)
    }

    async fn find_in_slot(&self, slot: &Slot, exclude_id: Option<&str>) -> Result<Vec<Appointment>, AppointmentError> {
        let mut params = vec![
            format!("doctorName=eq.{}", urlencoding::encode(&slot.doctor_name)),
            format!("appointmentDate=eq.{}", urlencoding::encode(&slot.appointment_date)),
            format!("appointmentTime=eq.{}", urlencoding::encode(&slot.appointment_time)),
            "status=in.(scheduled,confirmed)".to_string(),
        ];
        if let Some(id) = exclude_id {
            params.push(format!("id=neq.{}", urlencoding::encode(id)));
        }

        let path = format!("{}?{}", self.table_path(), params.join("&"));
        Self::parse_rows(self.send(Method::GET, &path, None).await?)
    }
}
