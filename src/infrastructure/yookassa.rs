use crate::domain::payment::{Id, PaymentTemplate};
use crate::domain::ports::{GatewayPayment, PaymentGateway};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the YooKassa API.
#[derive(Debug, Clone)]
pub struct YookassaConfig {
    /// API root, e.g. `https://api.yookassa.ru/v3`.
    pub base_url: String,
    pub shop_id: String,
    pub secret_key: String,
    /// Where the payer lands after leaving the checkout page.
    pub return_url: String,
    pub timeout: Duration,
}

/// Redirect-based payment creation against YooKassa.
pub struct YookassaGateway {
    config: YookassaConfig,
    client: reqwest::Client,
}

impl YookassaGateway {
    pub fn new(config: YookassaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePaymentRequest<'a> {
    amount: Amount,
    confirmation: ConfirmationRequest<'a>,
    capture: bool,
    description: &'a str,
    metadata: Metadata<'a>,
}

#[derive(Debug, Serialize)]
struct Amount {
    value: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct ConfirmationRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    return_url: &'a str,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    status: String,
    confirmation: Option<ConfirmationResponse>,
}

#[derive(Debug, Deserialize)]
struct ConfirmationResponse {
    #[serde(default)]
    confirmation_url: String,
}

impl YookassaGateway {
    /// Authenticates, sends and decodes one API call.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<PaymentResponse> {
        let response = request
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PaymentError::GatewayError("yookassa request timed out".into())
                } else {
                    PaymentError::GatewayError(format!("yookassa request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::GatewayError(format!(
                "yookassa responded {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PaymentError::GatewayError(format!("undecodable yookassa response: {e}")))
    }
}

impl From<PaymentResponse> for GatewayPayment {
    fn from(payment: PaymentResponse) -> Self {
        Self {
            provider_id: payment.id,
            status: payment.status,
            checkout_url: payment
                .confirmation
                .map(|c| c.confirmation_url)
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl PaymentGateway for YookassaGateway {
    fn name(&self) -> &'static str {
        "yookassa"
    }

    async fn create_payment(
        &self,
        id: &Id,
        template: &PaymentTemplate,
    ) -> Result<Option<GatewayPayment>> {
        let url = format!("{}/payments", self.config.base_url.trim_end_matches('/'));
        let body = CreatePaymentRequest {
            amount: Amount {
                value: format!("{}.00", template.amount),
                currency: template.currency.clone(),
            },
            confirmation: ConfirmationRequest {
                kind: "redirect",
                return_url: &self.config.return_url,
            },
            capture: true,
            description: &template.description,
            metadata: Metadata { id: id.as_str() },
        };

        let request = self
            .client
            .post(url)
            .header("Idempotence-Key", id.as_str())
            .json(&body);
        let payment = self.send(request).await?;

        Ok(Some(payment.into()))
    }

    async fn fetch_payment(&self, provider_id: &str) -> Result<GatewayPayment> {
        let base = &self.config.base_url;
        let invalid = || PaymentError::GatewayError(format!("invalid yookassa url {base:?}"));
        let mut url = url::Url::parse(base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("payments")
            .push(provider_id);

        let payment = self.send(self.client.get(url)).await?;
        Ok(payment.into())
    }
}
