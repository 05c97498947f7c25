use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::services::PatientChatIndex;
use notification_cell::services::NotificationService;
use notification_cell::services::summary::NO_RECORDS_MESSAGE;
use shared_chat::ChatId;
use shared_chat::test_utils::{FlakyTransport, RecordingTransport};
use shared_config::AppConfig;

fn test_config(supabase_url: String) -> AppConfig {
    AppConfig {
        supabase_url,
        supabase_service_key: "test-service-key".to_string(),
        telegram_bot_token: "test-token".to_string(),
        notify_interval_secs: 60,
    }
}

fn completed_visit_row(visit_id: Uuid, patient_id: Uuid, practitioner_id: Uuid) -> serde_json::Value {
    json!({
        "id": visit_id,
        "patient_id": patient_id,
        "practitioner_id": practitioner_id,
        "start_time": "2024-05-02T08:00:00",
        "end_time": "2024-05-02T08:30:00",
        "note": null,
        "practitioner": { "full_name": "Ivanov I.I." }
    })
}

/// Mounts the completed-visit scan. The matchers double as an assertion
/// that the reconciler only ever asks for ended, unnotified visits.
async fn mount_visit_scan(mock_server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("end_time", "not.is.null"))
        .and(query_param("notified", "eq.false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

async fn mount_empty_records(mock_server: &MockServer) {
    for table in ["diagnoses", "referrals", "prescriptions", "sick_leaves"] {
        Mock::given(method("GET"))
            .and(path(format!("/rest/v1/{}", table)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(mock_server)
            .await;
    }
}

#[tokio::test]
async fn visit_without_chat_mapping_is_skipped_not_marked() {
    let mock_server = MockServer::start().await;
    let visit_id = Uuid::new_v4();
    mount_visit_scan(
        &mock_server,
        json!([completed_visit_row(visit_id, Uuid::new_v4(), Uuid::new_v4())]),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(&test_config(mock_server.uri()));
    let index = PatientChatIndex::new();
    let transport = RecordingTransport::new();

    service.run_once(&index, &transport).await.unwrap();

    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn visit_with_no_records_gets_summary_and_no_records_message() {
    let mock_server = MockServer::start().await;
    let visit_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    mount_visit_scan(
        &mock_server,
        json!([completed_visit_row(visit_id, patient_id, Uuid::new_v4())]),
    )
    .await;
    mount_empty_records(&mock_server).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/visits"))
        .and(query_param("id", format!("eq.{}", visit_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(&test_config(mock_server.uri()));
    let index = PatientChatIndex::new();
    let chat = ChatId(500);
    index.record(chat, patient_id);
    let transport = RecordingTransport::new();

    service.run_once(&index, &transport).await.unwrap();

    let texts = transport.texts_for(chat);
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("Ivanov I.I."));
    assert!(texts[0].contains("02.05.2024"));
    assert!(texts[0].contains("08:00-08:30"));
    assert_eq!(texts[1], NO_RECORDS_MESSAGE);
}

#[tokio::test]
async fn clinical_records_are_listed_per_kind() {
    let mock_server = MockServer::start().await;
    let visit_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let practitioner_id = Uuid::new_v4();
    mount_visit_scan(
        &mock_server,
        json!([completed_visit_row(visit_id, patient_id, practitioner_id)]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnoses"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("created_at", "gte.2024-05-02T08:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Hypertension", "description": null, "created_at": "2024-05-02T08:10:00" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("issued_on", "gte.2024-05-02T08:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "medication": "Lisinopril", "dosage": "10mg", "issued_on": "2024-05-02T08:20:00", "expires_on": null }
        ])))
        .mount(&mock_server)
        .await;

    // Sick leaves filter on issue date even though the display period
    // uses start/end dates.
    Mock::given(method("GET"))
        .and(path("/rest/v1/sick_leaves"))
        .and(query_param("issue_date", "gte.2024-05-02T08:00:00"))
        .and(query_param("issue_date", "lte.2024-05-02T08:30:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/referrals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/visits"))
        .and(query_param("id", format!("eq.{}", visit_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(&test_config(mock_server.uri()));
    let index = PatientChatIndex::new();
    let chat = ChatId(501);
    index.record(chat, patient_id);
    let transport = RecordingTransport::new();

    service.run_once(&index, &transport).await.unwrap();

    let texts = transport.texts_for(chat);
    // Summary, diagnosis listing, prescription listing. No "no records"
    // fallback once anything was sent.
    assert_eq!(texts.len(), 3);
    assert!(texts[1].contains("Hypertension"));
    assert!(texts[2].contains("Lisinopril"));
    assert!(!texts.iter().any(|t| t == NO_RECORDS_MESSAGE));
}

#[tokio::test]
async fn send_failure_aborts_run_before_marking() {
    let mock_server = MockServer::start().await;
    let visit_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    mount_visit_scan(
        &mock_server,
        json!([completed_visit_row(visit_id, patient_id, Uuid::new_v4())]),
    )
    .await;
    mount_empty_records(&mock_server).await;

    // The visit must stay eligible when delivery fails mid-way.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(&test_config(mock_server.uri()));
    let index = PatientChatIndex::new();
    let chat = ChatId(502);
    index.record(chat, patient_id);

    // Summary goes through, the "no records" message fails.
    let transport = FlakyTransport::failing_after(1);

    let result = service.run_once(&index, &transport).await;
    assert!(result.is_err());
    assert_eq!(transport.sent().len(), 1);
}
