use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::services::PatientService;
use shared_config::AppConfig;

fn test_config(supabase_url: String) -> AppConfig {
    AppConfig {
        supabase_url,
        supabase_service_key: "test-service-key".to_string(),
        telegram_bot_token: "test-token".to_string(),
        notify_interval_secs: 60,
    }
}

#[tokio::test]
async fn find_by_identity_number_returns_patient() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("identity_number", "eq.111-111-111 11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": patient_id,
            "identity_number": "111-111-111 11",
            "first_name": "Ivan",
            "last_name": "Petrov",
            "middle_name": null,
            "phone_number": "+100000000"
        }])))
        .mount(&mock_server)
        .await;

    let service = PatientService::new(&test_config(mock_server.uri()));
    let patient = service
        .find_by_identity_number("111-111-111 11")
        .await
        .unwrap()
        .expect("patient should be found");

    assert_eq!(patient.id, patient_id);
    assert_eq!(patient.identity_number, "111-111-111 11");
    assert_eq!(patient.full_name(), "Petrov Ivan");
}

#[tokio::test]
async fn find_by_identity_number_misses_cleanly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = PatientService::new(&test_config(mock_server.uri()));
    let patient = service
        .find_by_identity_number("222-222-222 22")
        .await
        .unwrap();

    assert!(patient.is_none());
}

#[tokio::test]
async fn store_failure_is_an_error_not_a_miss() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&mock_server)
        .await;

    let service = PatientService::new(&test_config(mock_server.uri()));
    let result = service.find_by_identity_number("111-111-111 11").await;

    assert!(result.is_err());
}
