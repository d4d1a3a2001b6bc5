use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{
    Appointment, AppointmentError, AppointmentFilters, AppointmentListQuery, CreateAppointmentRequest,
    UpdateAppointmentRequest, UpdateStamp,
};
use appointment_cell::services::AppointmentService;
use appointment_cell::store::{AppointmentStore, SupabaseAppointmentStore};
use shared_utils::test_utils::{date_in_days, MockSupabaseResponses, TestConfig};

fn store_for(server: &MockServer) -> SupabaseAppointmentStore {
    SupabaseAppointmentStore::from_config(&TestConfig::with_supabase_url(&server.uri()).to_app_config())
}

fn row(id: &str, doctor: &str, date: &str, time: &str) -> Value {
    let request = CreateAppointmentRequest {
        patient_name: Some("Ana Torres".into()),
        patient_email: Some("ana@example.com".into()),
        doctor_name: Some(doctor.into()),
        appointment_date: Some(date.into()),
        appointment_time: Some(time.into()),
        ..Default::default()
    };
    serde_json::to_value(Appointment::from_request(id.into(), request, Utc::now(), None)).unwrap()
}

#[tokio::test]
async fn get_queries_by_id_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.apt-1"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("apt-1", "Dr. House", "2030-01-01", "10:00")])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let found = store.get("apt-1").await.unwrap().unwrap();
    assert_eq!(found.id, "apt-1");
    assert_eq!(found.doctor_name, "Dr. House");
}

#[tokio::test]
async fn get_on_empty_result_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert_eq!(store_for(&server).get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn list_translates_filters_to_postgrest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctorName", "ilike.*house*"))
        .and(query_param("status", "eq.confirmed"))
        .and(query_param("appointmentDate", "gte.2030-01-01"))
        .and(query_param("order", "appointmentDate.asc,appointmentTime.asc,id.asc"))
        .and(query_param("limit", "2"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row("a", "Dr. House", "2030-01-01", "09:00"),
            row("b", "Dr. House", "2030-01-02", "09:00"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filters = AppointmentFilters {
        doctor_name: Some("house".into()),
        status: Some("confirmed".into()),
        date_from: Some("2030-01-01".into()),
        ..Default::default()
    };
    let page = store_for(&server).list(&filters, None, 2).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page.next_cursor.is_some());
}

#[tokio::test]
async fn cursor_advances_the_offset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row("a", "Dr. House", "2030-01-01", "09:00"),
            row("b", "Dr. House", "2030-01-01", "09:30"),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("c", "Dr. House", "2030-01-01", "10:00")])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let first = store.list(&AppointmentFilters::default(), None, 2).await.unwrap();
    let second = store
        .list(&AppointmentFilters::default(), first.next_cursor.as_deref(), 2)
        .await
        .unwrap();

    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, "c");
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn slot_lookup_asks_only_for_active_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctorName", "eq.Dr. House"))
        .and(query_param("appointmentDate", "eq.2030-01-01"))
        .and(query_param("appointmentTime", "eq.10:00"))
        .and(query_param("status", "in.(scheduled,confirmed)"))
        .and(query_param("id", "neq.apt-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let slot = appointment_cell::models::Slot {
        doctor_name: "Dr. House".into(),
        appointment_date: "2030-01-01".into(),
        appointment_time: "10:00".into(),
    };
    let found = store_for(&server).find_in_slot(&slot, Some("apt-9")).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn create_posts_and_asks_for_representation() {
    let server = MockServer::start().await;
    let stored = row("apt-1", "Dr. House", "2030-01-01", "10:00");
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("Prefer", "return=representation"))
        .and(body_partial_json(json!({ "id": "apt-1", "doctorName": "Dr. House", "status": "scheduled" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([stored.clone()])))
        .expect(1)
        .mount(&server)
        .await;

    let appointment: Appointment = serde_json::from_value(stored).unwrap();
    let created = store_for(&server).create(appointment.clone()).await.unwrap();
    assert_eq!(created, appointment);
}

#[tokio::test]
async fn update_patches_only_changed_fields() {
    let server = MockServer::start().await;
    let mut patched = row("apt-1", "Dr. House", "2030-01-01", "10:00");
    patched["status"] = json!("confirmed");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.apt-1"))
        .and(body_partial_json(json!({ "status": "confirmed", "notes": null, "updatedBy": "user-123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([patched])))
        .expect(1)
        .mount(&server)
        .await;

    let changes = UpdateAppointmentRequest {
        status: Some(appointment_cell::models::AppointmentStatus::Confirmed),
        notes: Some(None),
        ..Default::default()
    };
    let updated = store_for(&server)
        .update("apt-1", &changes, &UpdateStamp::now(Some("user-123".into())))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status.as_str(), "confirmed");
}

#[tokio::test]
async fn delete_of_missing_row_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert_eq!(store_for(&server).delete("gone").await.unwrap(), None);
}

#[tokio::test]
async fn server_errors_surface_as_store_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(MockSupabaseResponses::error_response("relation does not exist", "42P01")),
        )
        .mount(&server)
        .await;

    let result = store_for(&server).get("apt-1").await;
    assert_matches!(result, Err(AppointmentError::Store(_)));
}

#[tokio::test]
async fn service_rejects_booking_when_remote_slot_is_taken() {
    let server = MockServer::start().await;
    let date = date_in_days(3);
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(scheduled,confirmed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("taken", "Dr. House", &date, "10:00")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = AppointmentService::new(Arc::new(store_for(&server)));
    let request = CreateAppointmentRequest {
        patient_name: Some("Ben Lee".into()),
        patient_email: Some("ben@example.com".into()),
        doctor_name: Some("Dr. House".into()),
        appointment_date: Some(date),
        appointment_time: Some("10:00".into()),
        ..Default::default()
    };

    let result = service.create_appointment(request, None).await;
    assert_matches!(result, Err(AppointmentError::ConflictDetected));
}

#[tokio::test]
async fn service_listing_rechecks_remote_results() {
    let server = MockServer::start().await;
    // Remote over-fetches a record that does not satisfy the filter
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            row("a", "Dr. House", "2030-01-02", "09:00"),
            row("b", "Dr. Wilson", "2030-01-01", "09:00"),
        ])))
        .mount(&server)
        .await;

    let service = AppointmentService::new(Arc::new(store_for(&server)));
    let query = AppointmentListQuery {
        filters: AppointmentFilters {
            doctor_name: Some("house".into()),
            ..Default::default()
        },
        ..Default::default()
    };

    let response = service.list_appointments(query).await.unwrap();
    assert_eq!(response.total, 1);
    assert_eq!(response.appointments[0].id, "a");
}
