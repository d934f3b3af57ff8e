// HTTP route tests for Bloodlink

use actix_web::{http::StatusCode, test, web, App};
use bloodlink::config::MatchingSettings;
use bloodlink::core::DonorMatcher;
use bloodlink::models::{CompatibilityResponse, ErrorResponse, SearchDonorsResponse};
use bloodlink::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use bloodlink::services::{CacheManager, SessionVerifier, SupabaseClient, SupabaseTables};
use jsonwebtoken::{encode, EncodingKey, Header};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

const JWT_SECRET: &str = "route-test-secret";

fn bearer(user_id: &str) -> (&'static str, String) {
    let claims = json!({
        "sub": user_id,
        "aud": "authenticated",
        "exp": chrono::Utc::now().timestamp() + 3600,
        "role": "authenticated",
    });
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

fn app_state(store_url: String) -> AppState {
    let store = SupabaseClient::new(
        store_url,
        "service-key".to_string(),
        SupabaseTables {
            profiles: "profiles".to_string(),
            blood_requests: "blood_requests".to_string(),
            messages: "messages".to_string(),
        },
    )
    .unwrap();

    AppState {
        store: Arc::new(store),
        cache: Arc::new(CacheManager::in_memory(100, 60)),
        matcher: DonorMatcher::default(),
        matching: MatchingSettings::default(),
    }
}

macro_rules! test_app {
    ($store_url:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(app_state($store_url)))
                .app_data(web::Data::new(SessionVerifier::new(JWT_SECRET, "authenticated")))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
                .configure(routes::configure_routes),
        )
        .await
    };
}

fn blood_request(requester_id: &str, status: &str) -> serde_json::Value {
    json!([{
        "id": "r1",
        "requester_id": requester_id,
        "patient_name": "Rajesh Kumar",
        "patient_blood_type": "O+",
        "urgency_level": "critical",
        "units_required": 2,
        "hospital_name": "Apollo Hospital",
        "status": status
    }])
}

fn request_row(id: &str, requester_id: &str, blood_type: &str, urgency: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "requester_id": requester_id,
        "patient_name": "Meera Patel",
        "patient_blood_type": blood_type,
        "urgency_level": urgency,
        "units_required": 3,
        "units_fulfilled": 1,
        "hospital_name": "Fortis Hospital",
        "status": status,
        "coordinates": { "lat": 12.97, "lng": 77.59 }
    })
}

fn days_ago(days: i64) -> String {
    (chrono::Utc::now() - chrono::Duration::days(days)).to_rfc3339()
}

#[actix_web::test]
async fn test_health_reports_store_state() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("select".into(), "id".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cache"]["l2_enabled"], false);
}

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let server = Server::new_async().await;
    let app = test_app!(server.url());

    let req = test::TestRequest::get().uri("/api/v1/donors/me/eligibility").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "unauthorized");
    assert_eq!(body.status_code, 401);
}

#[actix_web::test]
async fn test_compatibility_lookup() {
    let server = Server::new_async().await;
    let app = test_app!(server.url());

    let req = test::TestRequest::get().uri("/api/v1/donors/compatible/AB-").to_request();
    let body: CompatibilityResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.can_receive_from.len(), 4);
    assert_eq!(body.can_donate_to.len(), 2);

    let req = test::TestRequest::get().uri("/api/v1/donors/compatible/XY").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_blood_type");
}

#[actix_web::test]
async fn test_search_donors_from_caller_location() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.me".into()))
        .with_status(200)
        .with_body(json!([{ "id": "me", "coordinates": { "lat": 12.97, "lng": 77.59 } }]).to_string())
        .create_async()
        .await;
    let donors = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("is_active".into(), "eq.true".into()))
        .with_status(200)
        .with_body(
            json!([
                { "id": "me", "blood_type": "O-", "coordinates": { "lat": 12.97, "lng": 77.59 } },
                { "id": "near", "blood_type": "A-", "coordinates": { "lat": 12.98, "lng": 77.60 } },
                { "id": "nearer", "blood_type": "O-", "coordinates": { "lat": 12.971, "lng": 77.591 } },
                { "id": "far", "blood_type": "B-", "coordinates": { "lat": 13.97, "lng": 77.59 } },
                { "id": "wrong-type", "blood_type": "O+", "coordinates": { "lat": 12.97, "lng": 77.59 } }
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let app = test_app!(server.url());

    let search = json!({ "bloodType": "AB-", "maxDistanceKm": 10 });
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/v1/donors/search")
            .insert_header(bearer("me"))
            .set_json(&search)
            .to_request();
        let body: SearchDonorsResponse = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<&str> = body.matches.iter().map(|m| m.donor.id.as_str()).collect();
        assert_eq!(ids, vec!["nearer", "near"]);
        assert_eq!(body.total_candidates, 5);
    }

    // Second search was served from cache
    donors.assert_async().await;
}

#[actix_web::test]
async fn test_invalid_json_body() {
    let server = Server::new_async().await;
    let app = test_app!(server.url());

    let req = test::TestRequest::post()
        .uri("/api/v1/donors/search")
        .insert_header(bearer("me"))
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"bloodType": "C+"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_json");
}

#[actix_web::test]
async fn test_update_status_requires_requester() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/blood_requests")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.r1".into()))
        .with_status(200)
        .with_body(blood_request("someone-else", "active").to_string())
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::patch()
        .uri("/api/v1/requests/r1/status")
        .insert_header(bearer("me"))
        .set_json(json!({ "status": "fulfilled" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_update_status_cannot_move_backwards() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/blood_requests")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.r1".into()))
        .with_status(200)
        .with_body(blood_request("me", "fulfilled").to_string())
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::patch()
        .uri("/api/v1/requests/r1/status")
        .insert_header(bearer("me"))
        .set_json(json!({ "status": "active" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_cannot_message_yourself() {
    let server = Server::new_async().await;
    let app = test_app!(server.url());

    let req = test::TestRequest::post()
        .uri("/api/v1/messages")
        .insert_header(bearer("me"))
        .set_json(json!({ "receiverId": "me", "content": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "invalid_message");
}

#[actix_web::test]
async fn test_eligible_search_includes_inactive_donors() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.me".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    // Only matches a directory read without an active-flag filter
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Regex(r"^select=[^&]*&blood_type=[^&]*$".into()))
        .with_status(200)
        .with_body(
            json!([
                { "id": "resting", "blood_type": "O-", "is_active": false },
                { "id": "recent", "blood_type": "O+", "last_donation_date": days_ago(10) },
                { "id": "ready", "blood_type": "O+", "last_donation_date": days_ago(120) }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::post()
        .uri("/api/v1/donors/search")
        .insert_header(bearer("me"))
        .set_json(json!({ "bloodType": "O+", "availability": "eligible" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: SearchDonorsResponse = test::read_body_json(resp).await;
    let ids: Vec<&str> = body.matches.iter().map(|m| m.donor.id.as_str()).collect();
    assert_eq!(ids, vec!["resting", "ready"]);
}

#[actix_web::test]
async fn test_create_request() {
    let mut server = Server::new_async().await;
    let insert = server
        .mock("POST", "/rest/v1/blood_requests")
        .match_body(Matcher::PartialJson(json!({
            "requester_id": "me",
            "patient_name": "Rajesh Kumar",
            "status": "active",
            "units_fulfilled": 0
        })))
        .with_status(201)
        .with_body(
            json!([{
                "id": "r9",
                "requester_id": "me",
                "patient_name": "Rajesh Kumar",
                "patient_blood_type": "B+",
                "urgency_level": "urgent",
                "units_required": 3,
                "units_fulfilled": 0,
                "hospital_name": "Apollo Hospital",
                "status": "active"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::post()
        .uri("/api/v1/requests")
        .insert_header(bearer("me"))
        .set_json(json!({
            "patientName": "  Rajesh Kumar ",
            "patientBloodType": "B+",
            "urgencyLevel": "urgent",
            "unitsRequired": 3,
            "hospitalName": "Apollo Hospital"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], "r9");
    assert_eq!(body["remainingUnits"], 3);
    insert.assert_async().await;
}

#[actix_web::test]
async fn test_urgent_feed_is_capped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/blood_requests")
        .match_query(Matcher::UrlEncoded("status".into(), "in.(active,partial)".into()))
        .with_status(200)
        .with_body(
            json!([
                request_row("r1", "a", "O+", "critical", "active"),
                request_row("r2", "b", "A+", "urgent", "active"),
                request_row("r3", "c", "B-", "critical", "partial"),
                request_row("r4", "d", "AB+", "critical", "active"),
                request_row("r5", "e", "O-", "critical", "active")
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::get()
        .uri("/api/v1/requests/urgent")
        .insert_header(bearer("me"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<&str> = body["requests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["r1", "r3", "r4"]);
    assert_eq!(body["total"], 3);
}

#[actix_web::test]
async fn test_requests_for_me_skips_own_requests() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.me".into()))
        .with_status(200)
        .with_body(json!([{ "id": "me", "blood_type": "O+" }]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/rest/v1/blood_requests")
        .match_query(Matcher::UrlEncoded("status".into(), "in.(active)".into()))
        .with_status(200)
        .with_body(
            json!([
                request_row("r1", "someone", "A+", "regular", "active"),
                request_row("r2", "me", "O+", "critical", "active"),
                request_row("r3", "someone", "AB-", "urgent", "active")
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::get()
        .uri("/api/v1/requests/for-me")
        .insert_header(bearer("me"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total"], 1);
    assert_eq!(body["requests"][0]["id"], "r1");
    assert_eq!(body["requests"][0]["remainingUnits"], 2);
}

#[actix_web::test]
async fn test_requests_for_me_needs_blood_type() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.me".into()))
        .with_status(200)
        .with_body(json!([{ "id": "me", "full_name": "New Member" }]).to_string())
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::get()
        .uri("/api/v1/requests/for-me")
        .insert_header(bearer("me"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "bad_request");
}

#[actix_web::test]
async fn test_request_donors_within_default_radius() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/blood_requests")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.r1".into()))
        .with_status(200)
        .with_body(json!([request_row("r1", "requester", "O+", "critical", "active")]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("blood_type".into(), "in.(\"O+\",\"O-\")".into()),
            Matcher::UrlEncoded("is_active".into(), "eq.true".into()),
        ]))
        .with_status(200)
        .with_body(
            json!([
                { "id": "requester", "blood_type": "O+", "coordinates": { "lat": 12.97, "lng": 77.59 } },
                { "id": "near", "blood_type": "O-", "coordinates": { "lat": 12.98, "lng": 77.60 } },
                { "id": "edge", "blood_type": "O+", "coordinates": { "lat": 13.30, "lng": 77.59 } },
                { "id": "far", "blood_type": "O+", "coordinates": { "lat": 13.97, "lng": 77.59 } },
                { "id": "recent", "blood_type": "O+", "last_donation_date": days_ago(10),
                  "coordinates": { "lat": 12.97, "lng": 77.59 } }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::get()
        .uri("/api/v1/requests/r1/donors")
        .insert_header(bearer("me"))
        .to_request();
    let body: SearchDonorsResponse = test::call_and_read_body_json(&app, req).await;

    let ids: Vec<&str> = body.matches.iter().map(|m| m.donor.id.as_str()).collect();
    assert_eq!(ids, vec!["near", "edge"]);
    assert!(body.matches.iter().all(|m| m.distance_km.unwrap() <= 50.0));

    let req = test::TestRequest::get()
        .uri("/api/v1/requests/r1/donors?maxDistanceKm=-5")
        .insert_header(bearer("me"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_update_status_lost_race_is_conflict() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/blood_requests")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.r1".into()))
        .with_status(200)
        .with_body(blood_request("me", "active").to_string())
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/rest/v1/blood_requests")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("requester_id".into(), "eq.me".into()),
            Matcher::UrlEncoded("status".into(), "eq.active".into()),
        ]))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::patch()
        .uri("/api/v1/requests/r1/status")
        .insert_header(bearer("me"))
        .set_json(json!({ "status": "partial" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    patch.assert_async().await;
}

fn message_row(id: &str, from: &str, to: &str, timestamp: &str, is_read: bool) -> serde_json::Value {
    json!({
        "id": id,
        "sender_id": from,
        "receiver_id": to,
        "content": "Can you donate this week?",
        "timestamp": timestamp,
        "is_read": is_read
    })
}

#[actix_web::test]
async fn test_conversations_join_names_and_filter() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                message_row("m4", "me", "asha", "2024-09-01T09:00:00Z", true),
                message_row("m1", "asha", "me", "2024-09-01T10:00:00Z", false),
                message_row("m2", "me", "ravi", "2024-09-01T11:00:00Z", false),
                message_row("m3", "ghost", "me", "2024-09-01T12:00:00Z", false)
            ])
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded(
            "id".into(),
            "in.(\"asha\",\"ghost\",\"ravi\")".into(),
        ))
        .with_status(200)
        .with_body(
            json!([
                { "id": "asha", "full_name": "Asha Rao" },
                { "id": "ravi", "full_name": "Ravi Kumar" }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let app = test_app!(server.url());

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/conversations")
        .insert_header(bearer("me"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let names: Vec<&str> = body["conversations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["otherUserName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ravi Kumar", "Asha Rao"]);
    assert_eq!(body["conversations"][1]["unreadCount"], 1);
    assert_eq!(body["unreadTotal"], 1);

    let req = test::TestRequest::get()
        .uri("/api/v1/messages/conversations?q=ASH")
        .insert_header(bearer("me"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["conversations"].as_array().unwrap().len(), 1);
    assert_eq!(body["conversations"][0]["otherUserId"], "asha");
}

#[actix_web::test]
async fn test_sender_cannot_mark_read() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/messages")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.m2".into()))
        .with_status(200)
        .with_body(json!([message_row("m2", "me", "ravi", "2024-09-01T11:00:00Z", false)]).to_string())
        .create_async()
        .await;
    let patch = server
        .mock("PATCH", "/rest/v1/messages")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::post()
        .uri("/api/v1/messages/m2/read")
        .insert_header(bearer("me"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    patch.assert_async().await;
}

#[actix_web::test]
async fn test_send_message_to_known_receiver() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.asha".into()))
        .with_status(200)
        .with_body(json!([{ "id": "asha", "full_name": "Asha Rao" }]).to_string())
        .create_async()
        .await;
    server
        .mock("POST", "/rest/v1/messages")
        .match_body(Matcher::PartialJson(json!({
            "sender_id": "me",
            "receiver_id": "asha",
            "content": "See you at the blood bank"
        })))
        .with_status(201)
        .with_body(json!([message_row("m7", "me", "asha", "2024-09-02T08:00:00Z", false)]).to_string())
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::post()
        .uri("/api/v1/messages")
        .insert_header(bearer("me"))
        .set_json(json!({ "receiverId": "asha", "content": "  See you at the blood bank  " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn test_send_message_to_unknown_receiver() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.asha,ravi)".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/rest/v1/messages")
        .expect(0)
        .create_async()
        .await;

    let app = test_app!(server.url());
    let req = test::TestRequest::post()
        .uri("/api/v1/messages")
        .insert_header(bearer("me"))
        .set_json(json!({ "receiverId": "asha,ravi)", "content": "hello" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "not_found");
    insert.assert_async().await;
}
