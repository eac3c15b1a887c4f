use crate::domain::payment::{Id, PaymentTemplate, Status};
use crate::domain::ports::{GatewayPayment, PaymentGateway};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    #[default]
    Succeed,
    Fail,
    /// Accepts the call but returns no payment.
    Empty,
    /// Returns a payment whose checkout URL is not a link.
    InvalidLink,
}

/// Stand-in provider for local runs and tests. Never talks to the network.
///
/// Issued payments stay `pending` until `set_status` moves them. `Clone` shares
/// the issued payments and the call counter.
#[derive(Clone)]
pub struct MockGateway {
    checkout_base: String,
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    payments: Arc<Mutex<HashMap<String, GatewayPayment>>>,
}

impl MockGateway {
    pub fn new(checkout_base: &str, behavior: MockBehavior) -> Result<Self> {
        url::Url::parse(checkout_base).map_err(|e| {
            PaymentError::ValidationError(format!("invalid checkout base {checkout_base:?}: {e}"))
        })?;
        Ok(Self {
            checkout_base: checkout_base.trim_end_matches('/').to_string(),
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            payments: Arc::default(),
        })
    }

    /// Number of `create_payment` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Moves an issued payment to `status`, as the payer would on the checkout page.
    pub fn set_status(&self, provider_id: &str, status: Status) -> Result<()> {
        let mut payments = self.payments.lock().unwrap_or_else(PoisonError::into_inner);
        let payment = payments
            .get_mut(provider_id)
            .ok_or_else(|| PaymentError::NotFound(format!("mock payment {provider_id}")))?;
        payment.status = status.to_string();
        Ok(())
    }

    fn issue(&self, payment: GatewayPayment) -> GatewayPayment {
        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(payment.provider_id.clone(), payment.clone());
        payment
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_payment(
        &self,
        id: &Id,
        _template: &PaymentTemplate,
    ) -> Result<Option<GatewayPayment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let provider_id = format!("mock_{}", uuid::Uuid::new_v4());
        match self.behavior {
            MockBehavior::Fail => Err(PaymentError::GatewayError(format!(
                "mock decline for payment {id}"
            ))),
            MockBehavior::Empty => Ok(None),
            MockBehavior::InvalidLink => Ok(Some(self.issue(GatewayPayment {
                provider_id,
                status: "pending".to_string(),
                checkout_url: "checkout".to_string(),
            }))),
            MockBehavior::Succeed => Ok(Some(self.issue(GatewayPayment {
                checkout_url: format!("{}/checkout/{provider_id}", self.checkout_base),
                provider_id,
                status: "pending".to_string(),
            }))),
        }
    }

    async fn fetch_payment(&self, provider_id: &str) -> Result<GatewayPayment> {
        if self.behavior == MockBehavior::Fail {
            return Err(PaymentError::GatewayError(format!(
                "mock lookup failed for {provider_id}"
            )));
        }
        self.payments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider_id)
            .cloned()
            .ok_or_else(|| PaymentError::GatewayError(format!("mock has no payment {provider_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Link;

    fn template() -> PaymentTemplate {
        PaymentTemplate {
            currency: "RUB".into(),
            amount: 100,
            description: "test".into(),
            resource_link: Link::parse("https://example.com/res").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_issued_payment_can_be_moved() {
        let gateway = MockGateway::new("https://pay.example.com/", MockBehavior::Succeed).unwrap();
        let issued = gateway
            .create_payment(&Id::generate(), &template())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            issued.checkout_url,
            format!("https://pay.example.com/checkout/{}", issued.provider_id)
        );

        let shared = gateway.clone();
        shared.set_status(&issued.provider_id, Status::Succeeded).unwrap();

        let fetched = gateway.fetch_payment(&issued.provider_id).await.unwrap();
        assert_eq!(fetched.status, "succeeded");
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_provider_id() {
        let gateway = MockGateway::new("https://pay.example.com", MockBehavior::Succeed).unwrap();

        assert!(matches!(
            gateway.fetch_payment("mock_missing").await,
            Err(PaymentError::GatewayError(_))
        ));
        assert!(gateway.set_status("mock_missing", Status::Succeeded).unwrap_err().is_not_found());
    }
}
