mod common;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use common::template;
use paylink::domain::payment::Id;
use paylink::domain::ports::PaymentGateway;
use paylink::error::PaymentError;
use paylink::infrastructure::yookassa::{YookassaConfig, YookassaGateway};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v3")
}

fn gateway(base_url: String, timeout: Duration) -> YookassaGateway {
    YookassaGateway::new(YookassaConfig {
        base_url,
        shop_id: "shop".into(),
        secret_key: "key".into(),
        return_url: "https://shop.example.com/thanks".into(),
        timeout,
    })
}

async fn accept(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.requests.lock().unwrap().push((headers, body));
    Json(json!({
        "id": "2c3f-provider",
        "status": "pending",
        "paid": false,
        "confirmation": {
            "type": "redirect",
            "confirmation_url": "https://yoomoney.ru/checkout/payments/v2/contract?orderId=2c3f"
        }
    }))
}

#[tokio::test]
async fn test_create_payment_request_shape() {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v3/payments", post(accept))
        .with_state(recorded.clone());
    let gateway = gateway(spawn(app).await, Duration::from_secs(2));
    let id = Id::new("order-1").unwrap();

    let payment = gateway
        .create_payment(&id, &template())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(payment.provider_id, "2c3f-provider");
    assert_eq!(payment.status, "pending");
    assert!(payment.checkout_url.starts_with("https://yoomoney.ru/checkout/"));

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, body) = &requests[0];
    assert_eq!(headers["idempotence-key"], "order-1");
    // "shop:key" in base64
    assert_eq!(headers["authorization"], "Basic c2hvcDprZXk=");
    assert_eq!(
        body,
        &json!({
            "amount": {"value": "1000.00", "currency": "RUB"},
            "confirmation": {"type": "redirect", "return_url": "https://shop.example.com/thanks"},
            "capture": true,
            "description": "course",
            "metadata": {"id": "order-1"}
        })
    );
}

#[tokio::test]
async fn test_provider_rejection_is_gateway_error() {
    async fn reject() -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"type": "error", "code": "invalid_credentials"})),
        )
            .into_response()
    }
    let app = Router::new().route("/v3/payments", post(reject));
    let gateway = gateway(spawn(app).await, Duration::from_secs(2));

    let err = gateway
        .create_payment(&Id::generate(), &template())
        .await
        .unwrap_err();

    let PaymentError::GatewayError(msg) = err else {
        panic!("expected gateway error, got {err:?}");
    };
    assert!(msg.contains("401"));
    assert!(msg.contains("invalid_credentials"));
}

#[tokio::test]
async fn test_undecodable_response_is_gateway_error() {
    async fn garbage() -> &'static str {
        "<html>maintenance</html>"
    }
    let app = Router::new().route("/v3/payments", post(garbage));
    let gateway = gateway(spawn(app).await, Duration::from_secs(2));

    let err = gateway
        .create_payment(&Id::generate(), &template())
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::GatewayError(_)));
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    async fn slow() -> Json<Value> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Json(json!({}))
    }
    let app = Router::new().route("/v3/payments", post(slow));
    let gateway = gateway(spawn(app).await, Duration::from_millis(100));

    let err = gateway
        .create_payment(&Id::generate(), &template())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PaymentError::GatewayError("yookassa request timed out".into())
    );
}

#[tokio::test]
async fn test_unreachable_provider_is_gateway_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = gateway(format!("http://{addr}/v3"), Duration::from_secs(2));
    let err = gateway
        .create_payment(&Id::generate(), &template())
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::GatewayError(_)));
}

#[tokio::test]
async fn test_fetch_payment_reads_provider_state() {
    async fn lookup(Path(id): Path<String>, headers: HeaderMap) -> Response {
        if headers["authorization"] != "Basic c2hvcDprZXk=" {
            return StatusCode::UNAUTHORIZED.into_response();
        }
        Json(json!({
            "id": id,
            "status": "succeeded",
            "paid": true,
            "metadata": {"id": "order-1"}
        }))
        .into_response()
    }
    let app = Router::new().route("/v3/payments/:id", get(lookup));
    let gateway = gateway(spawn(app).await, Duration::from_secs(2));

    let payment = gateway.fetch_payment("2c3f-provider").await.unwrap();

    assert_eq!(payment.provider_id, "2c3f-provider");
    assert_eq!(payment.status, "succeeded");
    assert_eq!(payment.checkout_url, "");
}

#[tokio::test]
async fn test_fetch_unknown_payment_is_gateway_error() {
    async fn missing() -> Response {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"type": "error", "code": "not_found"})),
        )
            .into_response()
    }
    let app = Router::new().route("/v3/payments/:id", get(missing));
    let gateway = gateway(spawn(app).await, Duration::from_secs(2));

    let err = gateway.fetch_payment("nope").await.unwrap_err();
    let PaymentError::GatewayError(msg) = err else {
        panic!("expected gateway error, got {err:?}");
    };
    assert!(msg.contains("404"));
}
