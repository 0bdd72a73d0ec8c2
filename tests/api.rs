use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use serde_json::{json, Value};
use tower::ServiceExt;

use booking_system::{app, catalog::InMemoryCatalog, config::Config, services::notify::MemoryNotifier, AppState};

fn test_app(configure: impl FnOnce(&mut Config)) -> (Router, Arc<MemoryNotifier>) {
    let mut config = Config::default();
    config.payment.simulated_delay_ms = 20;
    configure(&mut config);
    let notifier = Arc::new(MemoryNotifier::default());
    let state = AppState::new(config, Arc::new(InMemoryCatalog::seeded()), notifier.clone()).unwrap();
    (app(state), notifier)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, value)
}

fn passenger() -> Value {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    let phone: u64 = (9_000_000_000u64..9_999_999_999).fake();
    let age: u8 = (18u8..80).fake();
    json!({ "name": name, "email": email, "phone": phone.to_string(), "age": age })
}

async fn wait_for_stage(app: &Router, session: &str, stage: &str) -> Value {
    for _ in 0..300 {
        let (_, view) = send(app, Method::GET, &format!("/api/sessions/{}", session), None).await;
        if view["stage"] == stage {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session {} never reached {}", session, stage);
}

#[tokio::test]
async fn health_and_root() {
    let (app, _) = test_app(|_| {});
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn catalog_endpoints() {
    let (app, _) = test_app(|_| {});

    let (status, routes) = send(&app, Method::GET, "/api/routes?from=new%20york", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(routes.as_array().unwrap().len(), 3);

    let (status, _) = send(&app, Method::GET, "/api/routes/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, categories) = send(&app, Method::GET, "/api/matches/m1/categories", None).await;
    let ids: Vec<&str> = categories.as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c4"]);

    let (_, promos) = send(&app, Method::GET, "/api/promos", None).await;
    assert_eq!(promos.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn bus_flow_end_to_end() {
    let (app, notifier) = test_app(|_| {});

    let (status, session) = send(&app, Method::POST, "/api/sessions/bus", Some(json!({ "route_id": "1" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["bus"]["available_seats"], 90);

    let toggle = format!("/api/sessions/{}/seats/toggle", id);
    let (_, result) = send(&app, Method::PATCH, &toggle, Some(json!({ "seat": "1A" }))).await;
    assert_eq!(result["outcome"], json!({ "rejected": "booked" }));

    for seat in ["1C", "1D"] {
        let (_, result) = send(&app, Method::PATCH, &toggle, Some(json!({ "seat": seat }))).await;
        assert_eq!(result["outcome"], "selected");
    }

    // 2 x 75.00, SAVE50, сбор 5% от подытога
    let (_, promo) = send(&app, Method::PATCH, &format!("/api/sessions/{}/promo", id), Some(json!({ "code": "SAVE50" }))).await;
    assert_eq!(promo["outcome"]["status"], "applied");
    let pricing = &promo["session"]["pricing"];
    assert_eq!(pricing["subtotal"], 15_000);
    assert_eq!(pricing["discount"], 5_000);
    assert_eq!(pricing["convenience_fee"], 750);
    assert_eq!(pricing["total"], 10_750);

    // без пассажира оплату не начать
    let (status, _) = send(&app, Method::POST, &format!("/api/sessions/{}/payment", id), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::PUT, &format!("/api/sessions/{}/passenger", id), Some(passenger())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, payment) = send(&app, Method::POST, &format!("/api/sessions/{}/payment", id), Some(json!({ "method": "card" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(payment["amount"], 10_750);
    assert_eq!(payment["status"], "pending");

    let view = wait_for_stage(&app, &id, "completed").await;
    let reference = view["booking_reference"].as_str().unwrap().to_string();
    assert!(reference.starts_with("BG"));

    let (status, booking) = send(&app, Method::GET, &format!("/api/bookings/{}", reference), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["item"]["seats"], json!(["1C", "1D"]));
    assert_eq!(booking["total_amount"], 10_750);

    let (_, stats) = send(&app, Method::GET, "/api/analytics?route_id=1", None).await;
    assert_eq!(stats["booked_seats"], 12);
    assert_eq!(stats["sold_seats"], 2);
    assert_eq!(stats["bookings_count"], 1);

    // новая сессия видит проданные места
    let (_, fresh) = send(&app, Method::POST, "/api/sessions/bus", Some(json!({ "route_id": "1" }))).await;
    let fresh_id = fresh["id"].as_str().unwrap();
    let (_, result) = send(&app, Method::PATCH, &format!("/api/sessions/{}/seats/toggle", fresh_id), Some(json!({ "seat": "1C" }))).await;
    assert_eq!(result["outcome"], json!({ "rejected": "booked" }));

    assert!(notifier.drain().iter().any(|n| n.title == "Booking Confirmed!"));
}

#[tokio::test]
async fn seat_cap_is_enforced() {
    let (app, _) = test_app(|_| {});
    let (_, session) = send(&app, Method::POST, "/api/sessions/bus", Some(json!({ "route_id": "2" }))).await;
    let toggle = format!("/api/sessions/{}/seats/toggle", session["id"].as_str().unwrap());

    for seat in ["1C", "1D", "2A", "2B"] {
        send(&app, Method::PATCH, &toggle, Some(json!({ "seat": seat }))).await;
    }
    let (status, result) = send(&app, Method::PATCH, &toggle, Some(json!({ "seat": "3A" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["outcome"], json!({ "rejected": "cap_reached" }));
    assert_eq!(result["session"]["bus"]["selected_count"], 4);
    assert_eq!(result["session"]["bus"]["remaining"], 0);
}

#[tokio::test]
async fn legacy_labels_resolve_to_the_same_seat() {
    let (app, _) = test_app(|_| {});
    let (_, session) = send(&app, Method::POST, "/api/sessions/bus", Some(json!({ "route_id": "3" }))).await;
    let toggle = format!("/api/sessions/{}/seats/toggle", session["id"].as_str().unwrap());

    let (_, first) = send(&app, Method::PATCH, &toggle, Some(json!({ "seat": "C4" }))).await;
    // ряд C, место 4 -> "3D"
    assert_eq!(first["session"]["bus"]["selected_seats"], json!(["3D"]));
    let (_, second) = send(&app, Method::PATCH, &toggle, Some(json!({ "seat": "3D" }))).await;
    assert_eq!(second["outcome"], "deselected");
}

#[tokio::test]
async fn match_flow_with_cancelled_then_completed_payment() {
    // отмена успевает до завершения, повторный платёж проходит
    let (app, notifier) = test_app(|c| c.payment.simulated_delay_ms = 500);

    let (_, session) = send(&app, Method::POST, "/api/sessions/match", Some(json!({ "match_id": "m1" }))).await;
    let id = session["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::PATCH, &format!("/api/sessions/{}/seats/toggle", id), Some(json!({ "seat": "1A" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, Method::PATCH, &format!("/api/sessions/{}/category", id), Some(json!({ "category_id": "c2" }))).await;
    let (_, view) = send(&app, Method::PATCH, &format!("/api/sessions/{}/quantity", id), Some(json!({ "quantity": 3 }))).await;
    assert_eq!(view["match"]["quantity"], 3);
    assert_eq!(view["pricing"]["total"], 750_000);
    assert_eq!(view["pricing"]["convenience_fee"], 0);

    let payment_uri = format!("/api/sessions/{}/payment", id);
    let (status, first) = send(&app, Method::POST, &payment_uri, Some(json!({ "method": "upi" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = send(&app, Method::PATCH, &format!("/api/sessions/{}/quantity", id), Some(json!({ "quantity": 1 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, cancelled) = send(&app, Method::DELETE, &payment_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["success"], true);

    let (_, view) = send(&app, Method::GET, &format!("/api/sessions/{}", id), None).await;
    assert_eq!(view["stage"], "selecting");
    assert_eq!(view["match"]["quantity"], 3);

    // статус отменённого платежа по-прежнему доступен
    let (status, info) = send(&app, Method::GET, &payment_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["payment_id"], first["payment_id"]);
    assert_eq!(info["status"], "cancelled");

    let (status, second) = send(&app, Method::POST, &payment_uri, Some(json!({ "method": "card" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_ne!(second["payment_id"], first["payment_id"]);
    assert_eq!(second["amount"], 750_000);

    let view = wait_for_stage(&app, &id, "completed").await;
    let reference = view["booking_reference"].as_str().unwrap().to_string();
    assert!(reference.starts_with("IPL"));
    assert_eq!(reference.len(), 16);

    let (_, info) = send(&app, Method::GET, &payment_uri, None).await;
    assert_eq!(info["payment_id"], second["payment_id"]);
    assert_eq!(info["status"], "completed");

    let (status, booking) = send(&app, Method::GET, &format!("/api/bookings/{}", reference), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(booking["total_amount"], 750_000);

    // 150 - 3
    let (_, categories) = send(&app, Method::GET, "/api/matches/m1/categories", None).await;
    let c2 = categories.as_array().unwrap().iter().find(|c| c["id"] == "c2").unwrap();
    assert_eq!(c2["available_seats"], 147);

    let notices = notifier.drain();
    assert_eq!(notices.iter().filter(|n| n.title == "Booking Confirmed!").count(), 1);
}

#[tokio::test]
async fn invalid_passenger_is_rejected() {
    let (app, _) = test_app(|_| {});
    let (_, session) = send(&app, Method::POST, "/api/sessions/bus", Some(json!({ "route_id": "1" }))).await;
    let uri = format!("/api/sessions/{}/passenger", session["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::PUT, &uri, Some(json!({ "name": "", "email": "nope", "phone": "1", "age": 0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn merchandise_orders_and_feature_flags() {
    let (app, _) = test_app(|_| {});
    let (status, order) = send(&app, Method::POST, "/api/merchandise/orders", Some(json!({ "merchandise_id": "p2", "size": "M", "quantity": 8 }))).await;
    assert_eq!(status.as_u16(), 419);
    assert!(order.as_str().unwrap().contains("7"));

    let (disabled, _) = test_app(|c| {
        c.features.enable_merchandise = false;
        c.features.enable_analytics = false;
    });
    let (status, _) = send(&disabled, Method::GET, "/api/merchandise", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&disabled, Method::GET, "/api/analytics?route_id=1", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (app, _) = test_app(|_| {});
    let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
