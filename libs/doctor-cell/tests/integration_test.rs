use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::services::{AvailabilityService, DirectoryService};
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
async fn list_specialties_dedupes_and_sorts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/practitioners"))
        .and(query_param("select", "specialty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "specialty": "Therapy" },
            { "specialty": "Cardiology" },
            { "specialty": "Cardiology" }
        ])))
        .mount(&mock_server)
        .await;

    let service = DirectoryService::new(&test_config(mock_server.uri()));
    let specialties = service.list_specialties().await.unwrap();

    assert_eq!(specialties, vec!["Cardiology".to_string(), "Therapy".to_string()]);
}

#[tokio::test]
async fn list_by_specialty_parses_practitioners() {
    let mock_server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/practitioners"))
        .and(query_param("specialty", "eq.Cardiology"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": practitioner_id,
            "full_name": "Ivanov I.I.",
            "specialty": "Cardiology"
        }])))
        .mount(&mock_server)
        .await;

    let service = DirectoryService::new(&test_config(mock_server.uri()));
    let practitioners = service.list_by_specialty("Cardiology").await.unwrap();

    assert_eq!(practitioners.len(), 1);
    assert_eq!(practitioners[0].id, practitioner_id);
    assert_eq!(practitioners[0].full_name, "Ivanov I.I.");
}

#[tokio::test]
async fn open_slots_excludes_booked_times() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("select", "start_time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "start_time": "2024-05-02T08:00:00" },
            { "start_time": "2024-05-02T14:30:00" }
        ])))
        .mount(&mock_server)
        .await;

    let service = AvailabilityService::new(&test_config(mock_server.uri()));
    let slots = service
        .open_slots(Uuid::new_v4(), NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
        .await
        .unwrap();

    assert_eq!(slots.len(), 16);
    assert!(!slots.contains(&NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
    assert!(!slots.contains(&NaiveTime::from_hms_opt(14, 30, 0).unwrap()));
    assert!(slots.contains(&NaiveTime::from_hms_opt(8, 30, 0).unwrap()));
}

#[tokio::test]
async fn slot_with_existing_visit_is_not_free() {
    let mock_server = MockServer::start().await;
    let practitioner_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .and(query_param("practitioner_id", format!("eq.{}", practitioner_id)))
        .and(query_param("start_time", "eq.2024-05-02T08:00:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4() }
        ])))
        .mount(&mock_server)
        .await;

    // Any other exact start time is unbooked.
    Mock::given(method("GET"))
        .and(path("/rest/v1/visits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = AvailabilityService::new(&test_config(mock_server.uri()));

    let taken = NaiveDate::from_ymd_opt(2024, 5, 2)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    assert!(!service.is_slot_free(practitioner_id, taken).await.unwrap());

    let other = NaiveDate::from_ymd_opt(2024, 5, 2)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    assert!(service.is_slot_free(practitioner_id, other).await.unwrap());
}
