use aerobook_api::{app, middleware::Claims, AppState, AuthConfig};
use aerobook_core::events::NoopPublisher;
use aerobook_core::{Airport, BookingStore, Flight, FlightStatus, NewAircraft};
use aerobook_store::{app_config::BusinessRules, InMemoryBookingStore};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const FLIGHT: &str = "EK202";

fn token(sub: &str, is_staff: bool, is_superuser: bool) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        is_staff,
        is_superuser,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

async fn seeded_state() -> AppState {
    let store = Arc::new(InMemoryBookingStore::new());
    for (code, city) in [("DXB", "Dubai"), ("LHR", "London")] {
        store
            .create_airport(&Airport {
                code: code.into(),
                name: format!("{} International", city),
                city: city.into(),
                country: "XX".into(),
            })
            .await
            .unwrap();
    }
    let aircraft = store
        .create_aircraft(&NewAircraft {
            model: "A350".into(),
            economy_seats: 10,
            business_seats: 4,
            first_seats: 2,
        })
        .await
        .unwrap();
    let departure = Utc::now() + Duration::days(3);
    store
        .create_flight(&Flight {
            flight_number: FLIGHT.into(),
            departure_time: departure,
            arrival_time: departure + Duration::hours(7),
            economy_price: 100,
            business_price: 500,
            first_class_price: 1000,
            departure_airport: "DXB".into(),
            arrival_airport: "LHR".into(),
            aircraft_id: aircraft.id,
            status: FlightStatus::Scheduled,
        })
        .await
        .unwrap();

    AppState::new(
        store,
        Arc::new(NoopPublisher),
        None,
        AuthConfig {
            secret: SECRET.into(),
        },
        BusinessRules::default(),
    )
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", t));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn passenger_json(name: &str) -> Value {
    json!({
        "passenger_name": name,
        "passport": "A12345678",
        "national_id": "1234567890",
        "date_of_birth": "1990-05-17"
    })
}

fn booking_body(seats: &[&str]) -> Value {
    let passengers: Vec<Value> = seats
        .iter()
        .enumerate()
        .map(|(i, _)| passenger_json(&format!("Traveller {}", ["Ann", "Bob", "Cy"][i % 3])))
        .collect();
    json!({
        "flight_number": FLIGHT,
        "cabin_class": "Economy",
        "seat_numbers": seats,
        "passengers": passengers
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let state = seeded_state().await;
    let (status, body) = send(&state, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_missing_or_forged_token_is_rejected() {
    let state = seeded_state().await;

    let (status, _) = send(&state, "GET", "/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = encode(
        &Header::default(),
        &Claims {
            sub: "mallory".into(),
            is_staff: true,
            is_superuser: true,
            exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        },
        &EncodingKey::from_secret(b"other-secret"),
    )
    .unwrap();
    let (status, body) = send(&state, "GET", "/v1/admin/reports", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_book_pay_and_view() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);

    let (status, receipt) = send(
        &state,
        "POST",
        "/v1/bookings",
        Some(&alice),
        Some(booking_body(&["12a", "12B"])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["booking"]["status"], "PENDING");
    assert_eq!(receipt["total_price"], 200);
    assert_eq!(receipt["tickets"].as_array().unwrap().len(), 2);
    let booking_id = receipt["booking"]["id"].as_str().unwrap().to_string();

    let (status, availability) =
        send(&state, "GET", &format!("/v1/flights/{}/availability", FLIGHT), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["sold"], 2);
    assert_eq!(availability["available"], 14);

    let (_, seats) =
        send(&state, "GET", &format!("/v1/flights/{}/seats", FLIGHT), Some(&alice), None).await;
    assert_eq!(seats["taken_seats"], json!(["12A", "12B"]));

    let (status, quote) = send(
        &state,
        "GET",
        &format!("/v1/bookings/{}/payment", booking_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["quote"]["total"], 200);

    let pay_uri = format!("/v1/bookings/{}/pay", booking_id);
    let (status, paid) =
        send(&state, "POST", &pay_uri, Some(&alice), Some(json!({ "method": "CREDIT_CARD" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(paid["outcome"], "PAID");
    assert_eq!(paid["booking"]["status"], "CONFIRMED");

    let (status, again) =
        send(&state, "POST", &pay_uri, Some(&alice), Some(json!({ "method": "CASH" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["outcome"], "ALREADY_CONFIRMED");

    let (status, details) =
        send(&state, "GET", &format!("/v1/bookings/{}", booking_id), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["payment"]["method"], "CREDIT_CARD");
    assert_eq!(details["amount"], 200);

    let (_, mine) = send(&state, "GET", "/v1/bookings", Some(&alice), None).await;
    assert_eq!(mine["upcoming"].as_array().unwrap().len(), 1);
    assert!(mine["past"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_taken_seat_conflicts() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);
    let bob = token("bob", false, false);

    let (status, _) =
        send(&state, "POST", "/v1/bookings", Some(&alice), Some(booking_body(&["3C"]))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        send(&state, "POST", "/v1/bookings", Some(&bob), Some(booking_body(&["3c", "4A"]))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("3C"));
}

#[tokio::test]
async fn test_invalid_booking_reports_field_details() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);

    let mut body = booking_body(&["1A", "1B"]);
    body["passengers"][1]["passport"] = json!("123");

    let (status, error) = send(&state, "POST", "/v1/bookings", Some(&alice), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let details = error["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d["field"] == "passport" && d["seat"] == "1B"));
}

#[tokio::test]
async fn test_ticket_cancellation_is_owner_only() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);
    let bob = token("bob", false, false);

    let (_, receipt) =
        send(&state, "POST", "/v1/bookings", Some(&alice), Some(booking_body(&["7F"]))).await;
    let ticket_uri = format!("/v1/tickets/{}", receipt["tickets"][0]["id"].as_str().unwrap());

    let (status, _) = send(&state, "DELETE", &ticket_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, outcome) = send(&state, "DELETE", &ticket_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["outcome"], "RELEASED");
    assert_eq!(outcome["booking_cancelled"], true);
    assert_eq!(outcome["booking"]["status"], "CANCELLED");

    let (_, seats) =
        send(&state, "GET", &format!("/v1/flights/{}/seats", FLIGHT), Some(&alice), None).await;
    assert_eq!(seats["taken_seats"], json!([]));
}

#[tokio::test]
async fn test_admin_routes_require_staff() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);
    let ops = token("ops", true, false);

    let airport = json!({ "code": "JFK", "name": "John F Kennedy", "city": "New York", "country": "US" });
    let (status, _) =
        send(&state, "POST", "/v1/admin/airports", Some(&alice), Some(airport.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) =
        send(&state, "POST", "/v1/admin/airports", Some(&ops), Some(airport)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["code"], "JFK");

    let (status, _) = send(&state, "DELETE", "/v1/admin/airports/JFK", Some(&ops), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_manifest_and_passenger_removal() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);
    let ops = token("ops", true, false);

    let (_, receipt) =
        send(&state, "POST", "/v1/bookings", Some(&alice), Some(booking_body(&["10A", "2B"]))).await;

    let manifest_uri = format!("/v1/admin/flights/{}/manifest", FLIGHT);
    let (status, manifest) = send(&state, "GET", &manifest_uri, Some(&ops), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(manifest["occupied"], 2);
    let seats: Vec<&str> = manifest["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["seat_number"].as_str().unwrap())
        .collect();
    assert_eq!(seats, vec!["2B", "10A"]);

    let (status, _) = send(&state, "GET", &manifest_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ticket_id = receipt["tickets"][0]["id"].as_str().unwrap();
    let (status, outcome) =
        send(&state, "DELETE", &format!("/v1/admin/tickets/{}", ticket_id), Some(&ops), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["booking_cancelled"], false);

    let (_, manifest) = send(&state, "GET", &manifest_uri, Some(&ops), None).await;
    assert_eq!(manifest["occupied"], 1);
}

#[tokio::test]
async fn test_flight_status_update_and_delete_guard() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);
    let ops = token("ops", true, false);

    let (status, flight) = send(
        &state,
        "PUT",
        &format!("/v1/admin/flights/{}/status", FLIGHT),
        Some(&ops),
        Some(json!({ "status": "Delayed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(flight["status"], "Delayed");

    send(&state, "POST", "/v1/bookings", Some(&alice), Some(booking_body(&["5A"]))).await;
    let (status, _) =
        send(&state, "DELETE", &format!("/v1/admin/flights/{}", FLIGHT), Some(&ops), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_search_accepts_lowercase_cabin() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);
    let date = (Utc::now() + Duration::days(3)).date_naive();

    let uri = format!(
        "/v1/flights/search?origin=dxb&destination=lhr&date_from={}&date_to={}&cabin_class=business",
        date - Duration::days(1),
        date + Duration::days(1)
    );
    let (status, results) = send(&state, "GET", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let flights = results["flights"].as_array().unwrap();
    assert_eq!(flights.len(), 1);
    assert_eq!(flights[0]["flight_number"], FLIGHT);
    assert_eq!(flights[0]["price"], 500);
    assert_eq!(flights[0]["available_seats"], 4);
}

#[tokio::test]
async fn test_reports_include_revenue_for_superusers_only() {
    let state = seeded_state().await;
    let alice = token("alice", false, false);

    let (_, receipt) =
        send(&state, "POST", "/v1/bookings", Some(&alice), Some(booking_body(&["1A"]))).await;
    let booking_id = receipt["booking"]["id"].as_str().unwrap();
    send(
        &state,
        "POST",
        &format!("/v1/bookings/{}/pay", booking_id),
        Some(&alice),
        Some(json!({ "method": "WALLET" })),
    )
    .await;

    let (status, staff_view) =
        send(&state, "GET", "/v1/admin/reports", Some(&token("ops", true, false)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(staff_view["flights"][0]["revenue"].is_null());

    let (_, owner_view) =
        send(&state, "GET", "/v1/admin/reports", Some(&token("root", true, true)), None).await;
    assert_eq!(owner_view["flights"][0]["revenue"], 100);
}
