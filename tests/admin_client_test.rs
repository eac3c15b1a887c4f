mod common;

use common::{template, user};
use paylink::application::orchestrator::{PaymentOrchestrator, RedirectMode};
use paylink::domain::payment::{Id, Status, TemplateSource};
use paylink::domain::ports::{PaymentAdmin, TemplateStore};
use paylink::error::PaymentError;
use paylink::infrastructure::admin_client::AdminClient;
use paylink::infrastructure::in_memory::{InMemoryPaymentStore, InMemoryTemplateStore};
use paylink::infrastructure::links::BaseUrlLinkGenerator;
use paylink::infrastructure::mock_gateway::{MockBehavior, MockGateway};
use paylink::interfaces::http::{AppState, router};
use std::sync::Arc;

const API_KEY: &str = "secret";

/// Serves the real API on a random port and returns its root url.
async fn serve(api_key: Option<&str>) -> (String, Arc<PaymentOrchestrator>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let root = format!("http://{}", listener.local_addr().unwrap());

    let templates = InMemoryTemplateStore::new();
    templates.put_template("basic", template()).await.unwrap();
    let orchestrator = Arc::new(PaymentOrchestrator::new(
        Box::new(templates),
        Box::new(BaseUrlLinkGenerator::new(&root).unwrap()),
        Box::new(InMemoryPaymentStore::new()),
        Box::new(MockGateway::new("https://pay.example.com", MockBehavior::Succeed).unwrap()),
        RedirectMode::Indirect,
    ));
    let app = router(AppState {
        orchestrator: Arc::clone(&orchestrator),
        api_key: api_key.map(str::to_string),
        files: None,
    });
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (root, orchestrator)
}

#[tokio::test]
async fn test_remote_admin_round_trip() {
    let (root, _) = serve(Some(API_KEY)).await;
    let client = AdminClient::new(&root, Some(API_KEY.to_string())).unwrap();

    let link = client
        .create_payment(TemplateSource::Named("basic".into()), user())
        .await
        .unwrap();
    assert!(link.as_str().starts_with(&root));

    let id: Id = link.as_str().rsplit('/').next().unwrap().parse().unwrap();
    assert_eq!(client.payment_status(&id).await.unwrap(), Status::Pending);

    let statuses = client.payment_statuses().await.unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[&id], Status::Pending);
}

#[tokio::test]
async fn test_remote_status_reflects_webhook_updates() {
    let (root, orchestrator) = serve(None).await;
    let client = AdminClient::new(&root, None).unwrap();

    client
        .create_payment(TemplateSource::Inline(template()), user())
        .await
        .unwrap();
    let id = orchestrator
        .get_all_payment_statuses()
        .await
        .unwrap()
        .into_keys()
        .next()
        .unwrap();
    orchestrator
        .update_payment_status(&id, Status::Succeeded)
        .await
        .unwrap();

    assert_eq!(client.payment_status(&id).await.unwrap(), Status::Succeeded);
}

#[tokio::test]
async fn test_remote_errors_keep_their_kind() {
    let (root, _) = serve(None).await;
    let client = AdminClient::new(&root, None).unwrap();

    let err = client
        .payment_status(&Id::new("unknown").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = client
        .create_payment(TemplateSource::Named("missing".into()), user())
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::ValidationError(_)));
}

#[tokio::test]
async fn test_wrong_api_key_is_rejected() {
    let (root, _) = serve(Some(API_KEY)).await;
    let client = AdminClient::new(&root, Some("wrong".into())).unwrap();

    let err = client.payment_statuses().await.unwrap_err();
    let PaymentError::GatewayError(msg) = err else {
        panic!("expected gateway error, got {err:?}");
    };
    assert!(msg.contains("401"));
}

#[test]
fn test_invalid_server_url() {
    assert!(AdminClient::new("not a url", None).is_err());
}
