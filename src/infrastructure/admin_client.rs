use crate::domain::payment::{Id, Link, Status, TemplateSource, User};
use crate::domain::ports::PaymentAdmin;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header carrying the admin API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// `PaymentAdmin` over the service's HTTP API, for processes that do not own the
/// payment store (the chat bot in a split deployment).
#[derive(Clone)]
pub struct AdminClient {
    api_url: url::Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct NewPaymentRequest<'a> {
    template: &'a TemplateSource,
    user: &'a User,
}

#[derive(Deserialize)]
struct StatusesResponse {
    statuses: Vec<PaymentStatus>,
}

#[derive(Deserialize)]
struct PaymentStatus {
    id: Id,
    status: Status,
}

impl AdminClient {
    /// `server_url` is the service root; requests go to `<server_url>/api`.
    pub fn new(server_url: &str, api_key: Option<String>) -> Result<Self> {
        let invalid =
            || PaymentError::ValidationError(format!("invalid server url {server_url:?}"));
        let mut api_url = url::Url::parse(server_url).map_err(|_| invalid())?;
        api_url
            .path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("api");
        Ok(Self {
            api_url,
            api_key,
            client: reqwest::Client::new(),
        })
    }

    fn request(&self, method: reqwest::Method, segments: &[&str]) -> reqwest::RequestBuilder {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, op: &str) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| PaymentError::GatewayError(format!("{op}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let msg = format!("{op}: api responded {}: {body}", status.as_u16());
        Err(match status {
            StatusCode::NOT_FOUND => PaymentError::NotFound(msg),
            StatusCode::BAD_REQUEST => PaymentError::ValidationError(msg),
            _ => PaymentError::GatewayError(msg),
        })
    }
}

#[async_trait]
impl PaymentAdmin for AdminClient {
    async fn create_payment(&self, source: TemplateSource, user: User) -> Result<Link> {
        const OP: &str = "AdminClient::create_payment";

        let body = NewPaymentRequest {
            template: &source,
            user: &user,
        };
        let response = self
            .send(self.request(reqwest::Method::POST, &["payments"]).json(&body), OP)
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::GatewayError(format!("{OP}: {e}")))?;
        Link::parse(text).map_err(|e| e.context(OP))
    }

    async fn payment_status(&self, id: &Id) -> Result<Status> {
        const OP: &str = "AdminClient::payment_status";

        let response = self
            .send(
                self.request(reqwest::Method::GET, &["payments", id.as_str()]),
                OP,
            )
            .await?;
        let text = response
            .text()
            .await
            .map_err(|e| PaymentError::GatewayError(format!("{OP}: {e}")))?;
        text.parse::<Status>().map_err(|e| e.context(OP))
    }

    async fn payment_statuses(&self) -> Result<HashMap<Id, Status>> {
        const OP: &str = "AdminClient::payment_statuses";

        let response = self
            .send(self.request(reqwest::Method::GET, &["payments"]), OP)
            .await?;
        let body: StatusesResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::GatewayError(format!("{OP}: {e}")))?;
        Ok(body
            .statuses
            .into_iter()
            .map(|entry| (entry.id, entry.status))
            .collect())
    }
}
