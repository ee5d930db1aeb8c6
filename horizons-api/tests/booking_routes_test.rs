use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use horizons_api::{
    app,
    health::HealthProbe,
    metrics::Metrics,
    middleware::GatewayClaims,
    state::{AppState, AuthConfig},
};
use horizons_booking::{BookingService, InMemoryBookingRepository, RecordingPublisher};
use horizons_core::repository::SeatRepository;
use horizons_core::{Booking, Seat, StoreError};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

struct FixedSeats;

#[async_trait]
impl SeatRepository for FixedSeats {
    async fn get_by_flight_code(&self, flight_code: &str) -> Result<Vec<Seat>, StoreError> {
        let mut taken = Seat::new(1, "B");
        taken.available = flight_code != "FR788";
        Ok(vec![Seat::new(1, "A"), taken])
    }
}

struct StaticProbe {
    up: bool,
}

#[async_trait]
impl HealthProbe for StaticProbe {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn check(&self) -> Result<(), String> {
        if self.up {
            Ok(())
        } else {
            Err("connection refused".to_string())
        }
    }
}

struct TestApp {
    router: Router,
    service: Arc<BookingService>,
    publisher: Arc<RecordingPublisher>,
}

fn test_app_with_probe(up: bool) -> TestApp {
    let publisher = Arc::new(RecordingPublisher::new());
    let service = Arc::new(BookingService::new(
        Arc::new(InMemoryBookingRepository::new()),
        publisher.clone(),
    ));

    let state = AppState {
        bookings: service.clone(),
        seats: Arc::new(FixedSeats),
        auth: AuthConfig {
            secret: SECRET.to_string(),
            allowed_roles: vec!["user".to_string(), "admin".to_string()],
        },
        metrics: Arc::new(Metrics::new().unwrap()),
        probes: vec![Arc::new(StaticProbe { up })],
    };

    TestApp {
        router: app(state),
        service,
        publisher,
    }
}

fn test_app() -> TestApp {
    test_app_with_probe(true)
}

fn token(user_id: i32, role: &str) -> String {
    let claims = GatewayClaims {
        sub: format!("user-{}", user_id),
        user_id,
        role: role.to_string(),
        exp: 4_000_000_000,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn booking_json(id: i32, user_id: i32) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "flight_code": "FR788",
        "flight_class": 1,
        "luggage": ["SmallBag", "Cargo20kg"],
        "status": "Success",
        "passengers": [{
            "full_name": "Jane Doe",
            "date_of_birth": "1990-04-12T00:00:00Z",
            "passport_number": "NL1234567",
            "email": "jane@example.com"
        }],
        "seats": [{ "row": 4, "column": "C" }],
        "payment": { "card": "4111111111111111", "amount": 120.5 }
    })
}

fn json_request(method: Method, uri: &str, body: &Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_returns_pending_booking() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(json_request(Method::POST, "/bookings", &booking_json(1, 2), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], 1);
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["flight_class"], 1);
    assert_eq!(body["luggage"], json!(["SmallBag", "Cargo20kg"]));
    assert!(body.get("payment").is_none());

    let created = app.publisher.messages_on("booking.created");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].key, "1");
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let app = test_app();
    let request = || json_request(Method::POST, "/bookings", &booking_json(1, 2), None);

    let first = app.router.clone().oneshot(request()).await.unwrap();
    let second = app.router.clone().oneshot(request()).await.unwrap();

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(second).await["message"],
        "Booking with the ID 1 already exists"
    );
    assert_eq!(app.service.get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = test_app();

    let response = app
        .router
        .oneshot(json_request(Method::POST, "/bookings", &json!({ "id": "one" }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn own_bookings_require_a_token() {
    let app = test_app();

    let missing = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, "/bookings/", None))
        .await
        .unwrap();
    let garbage = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, "/bookings/", Some("not-a-jwt")))
        .await
        .unwrap();
    let wrong_role = app
        .router
        .oneshot(empty_request(Method::GET, "/bookings/", Some(&token(2, "airline"))))
        .await
        .unwrap();

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_role.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn own_bookings_lists_only_the_callers_bookings() {
    let app = test_app();
    for (id, user) in [(1, 2), (2, 2), (3, 4)] {
        app.service
            .create(Booking::new(id, user, "FR788"))
            .await
            .unwrap();
    }

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::GET, "/bookings/", Some(&token(2, "user"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);

    let none = app
        .router
        .oneshot(empty_request(Method::GET, "/bookings/", Some(&token(9, "user"))))
        .await
        .unwrap();
    assert_eq!(none.status(), StatusCode::OK);
    assert_eq!(body_json(none).await, json!([]));
}

#[tokio::test]
async fn update_checks_owner_then_existence() {
    let app = test_app();
    app.service.create(Booking::new(1, 2, "FR788")).await.unwrap();

    let foreign = app
        .router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/bookings/",
            &booking_json(1, 2),
            Some(&token(4, "user")),
        ))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

    let missing = app
        .router
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/bookings/",
            &booking_json(7, 2),
            Some(&token(2, "user")),
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(app.service.get_by_id(7).await.unwrap().is_none());

    let updated = app
        .router
        .oneshot(json_request(
            Method::PUT,
            "/bookings/",
            &booking_json(1, 2),
            Some(&token(2, "user")),
        ))
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let body = body_json(updated).await;
    assert_eq!(body["flight_class"], 1);
    assert_eq!(body["seats"][0]["row"], 4);
    assert_eq!(body["status"], "Pending");
}

#[tokio::test]
async fn delete_removes_booking() {
    let app = test_app();
    app.service.create(Booking::new(5, 2, "FR788")).await.unwrap();

    let response = app
        .router
        .clone()
        .oneshot(empty_request(Method::DELETE, "/bookings/5", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "message": "Booking deleted successfully" })
    );

    let again = app
        .router
        .clone()
        .oneshot(empty_request(Method::DELETE, "/bookings/5", None))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    assert!(body_json(again).await["message"].is_string());

    let invalid = app
        .router
        .oneshot(empty_request(Method::DELETE, "/bookings/abc", None))
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn seat_map_marks_taken_seats() {
    let app = test_app();

    let response = app
        .router
        .oneshot(empty_request(Method::GET, "/bookings/seats/FR788", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([
            { "row": 1, "column": "A", "available": true },
            { "row": 1, "column": "B", "available": false }
        ])
    );
}

#[tokio::test]
async fn health_reports_probe_status() {
    let up = test_app_with_probe(true)
        .router
        .oneshot(empty_request(Method::GET, "/health", None))
        .await
        .unwrap();
    assert_eq!(up.status(), StatusCode::OK);
    assert_eq!(body_json(up).await["checks"]["database"], "UP");

    let down = test_app_with_probe(false)
        .router
        .oneshot(empty_request(Method::GET, "/health", None))
        .await
        .unwrap();
    assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(down).await["status"], "DOWN");
}

#[tokio::test]
async fn metrics_count_created_bookings() {
    let app = test_app();
    app.router
        .clone()
        .oneshot(json_request(Method::POST, "/bookings", &booking_json(1, 2), None))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(empty_request(Method::GET, "/metrics", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("http_bookings_created_total 1"));
}
