use crate::application::keyed_lock::KeyedLocks;
use crate::domain::payment::{Id, Link, Payment, PaymentTemplate, Status, TemplateSource, User};
use crate::domain::ports::{
    GatewayPayment, LinkGeneratorBox, PaymentAdmin, PaymentGatewayBox, PaymentStoreBox,
    TemplateStoreBox,
};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

/// Which link `create_payment` hands back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectMode {
    /// The provider's hosted checkout page.
    Direct,
    /// A link back into this service that redirects to the active redirect link,
    /// so the same URL later leads to the purchased resource.
    #[default]
    Indirect,
}

/// Coordinates templates, the payment provider and the payment store.
///
/// The orchestrator keeps no payment state of its own: every query goes to the
/// store. Writes for one payment id are serialized; unrelated ids proceed in parallel.
/// Nothing is retried here. Creation in particular is not idempotent, so a caller that
/// sees an ambiguous failure must not blindly call `create_payment` again.
pub struct PaymentOrchestrator {
    templates: TemplateStoreBox,
    links: LinkGeneratorBox,
    store: PaymentStoreBox,
    gateway: PaymentGatewayBox,
    redirect_mode: RedirectMode,
    locks: KeyedLocks<Id>,
}

impl PaymentOrchestrator {
    /// Creates a new `PaymentOrchestrator`.
    ///
    /// # Arguments
    ///
    /// * `templates` - Named payment templates.
    /// * `links` - Builds links pointing back into this service.
    /// * `store` - Payment records and active redirect links.
    /// * `gateway` - The payment provider.
    /// * `redirect_mode` - Which link `create_payment` returns.
    pub fn new(
        templates: TemplateStoreBox,
        links: LinkGeneratorBox,
        store: PaymentStoreBox,
        gateway: PaymentGatewayBox,
        redirect_mode: RedirectMode,
    ) -> Self {
        Self {
            templates,
            links,
            store,
            gateway,
            redirect_mode,
            locks: KeyedLocks::new(),
        }
    }

    /// Creates a payment with the provider and records it.
    ///
    /// Steps run strictly in order, each gated on the previous one: template
    /// resolution, provider call, record write, redirect link write. A failure after
    /// the provider call leaves the provider-side payment in place.
    pub async fn create_payment(&self, source: TemplateSource, user: User) -> Result<Link> {
        const OP: &str = "PaymentOrchestrator::create_payment";

        user.validate().map_err(|e| e.context(OP))?;
        let template = self.resolve_template(source).await.map_err(|e| e.context(OP))?;

        let id = Id::generate();
        let indirect_link = match self.redirect_mode {
            RedirectMode::Indirect => {
                Some(self.links.generate_link(&id).map_err(|e| e.context(OP))?)
            }
            RedirectMode::Direct => None,
        };

        let response = self
            .gateway
            .create_payment(&id, &template)
            .await
            .map_err(|e| e.context(OP))?
            .ok_or_else(|| {
                PaymentError::GatewayError(format!(
                    "{} returned no payment",
                    self.gateway.name()
                ))
                .context(OP)
            })?;
        let (provider_id, status, checkout_link) =
            validate_gateway_payment(response).map_err(|e| e.context(OP))?;

        let payment = Payment {
            user,
            amount: template.amount,
            currency: template.currency,
            description: template.description,
            status,
            provider_id,
            payment_link: checkout_link.clone(),
            resource_link: template.resource_link,
        };

        {
            let _guard = self.locks.lock(&id).await;
            self.store
                .set(&id, payment)
                .await
                .map_err(|e| e.context("persist payment").context(OP))?;
            self.store
                .set_link(&id, checkout_link.clone())
                .await
                .map_err(|e| e.context("persist redirect link").context(OP))?;
        }

        tracing::info!(payment_id = %id, status = %status, "payment created");

        Ok(indirect_link.unwrap_or(checkout_link))
    }

    /// Returns the link a visitor of this payment is currently sent to.
    pub async fn get_redirect_link(&self, id: &Id) -> Result<Link> {
        self.store
            .get_link(id)
            .await
            .map_err(|e| e.context("PaymentOrchestrator::get_redirect_link"))
    }

    pub async fn get_payment_status(&self, id: &Id) -> Result<Status> {
        self.store
            .get_status(id)
            .await
            .map_err(|e| e.context("PaymentOrchestrator::get_payment_status"))
    }

    pub async fn get_all_payment_statuses(&self) -> Result<HashMap<Id, Status>> {
        self.store
            .get_statuses()
            .await
            .map_err(|e| e.context("PaymentOrchestrator::get_all_payment_statuses"))
    }

    /// Applies a status reported by the provider.
    ///
    /// On `Succeeded` the active redirect link is switched to the resource link
    /// before the status is written; if that switch fails the status stays as it was.
    /// Otherwise the status is overwritten unconditionally: the last reported
    /// status wins, whatever the previous one was.
    pub async fn update_payment_status(&self, id: &Id, status: Status) -> Result<()> {
        const OP: &str = "PaymentOrchestrator::update_payment_status";

        let _guard = self.locks.lock(id).await;

        if status == Status::Succeeded {
            let payment = self.store.get(id).await.map_err(|e| e.context(OP))?;
            self.store
                .set_link(id, payment.resource_link)
                .await
                .map_err(|e| e.context("expose resource link").context(OP))?;
        }

        self.store
            .update_status(id, status)
            .await
            .map_err(|e| e.context(OP))?;

        tracing::info!(payment_id = %id, status = %status, "payment status updated");
        Ok(())
    }

    /// Asks the provider for the payment's current status and applies that one.
    ///
    /// Used for provider notifications: their payload is unauthenticated, so only
    /// the provider's own answer reaches `update_payment_status`.
    pub async fn sync_payment_status(&self, id: &Id) -> Result<Status> {
        const OP: &str = "PaymentOrchestrator::sync_payment_status";

        let payment = self.store.get(id).await.map_err(|e| e.context(OP))?;
        let response = self
            .gateway
            .fetch_payment(&payment.provider_id)
            .await
            .map_err(|e| e.context(OP))?;

        if response.provider_id != payment.provider_id {
            return Err(PaymentError::GatewayError(format!(
                "{} answered for payment {:?} instead of {:?}",
                self.gateway.name(),
                response.provider_id,
                payment.provider_id
            ))
            .context(OP));
        }
        let status = response.status.parse::<Status>().map_err(|e| {
            PaymentError::GatewayError(format!("provider response rejected: {e}")).context(OP)
        })?;

        self.update_payment_status(id, status).await?;
        Ok(status)
    }

    async fn resolve_template(&self, source: TemplateSource) -> Result<PaymentTemplate> {
        let template = match source {
            TemplateSource::Named(name) => self.templates.get_template(&name).await?,
            TemplateSource::Inline(template) => template,
        };
        template.validate()?;
        Ok(template)
    }
}

fn validate_gateway_payment(response: GatewayPayment) -> Result<(String, Status, Link)> {
    if response.provider_id.trim().is_empty() {
        return Err(PaymentError::GatewayError(
            "provider returned an empty payment id".into(),
        ));
    }
    let status = response
        .status
        .parse::<Status>()
        .map_err(|e| PaymentError::GatewayError(format!("provider response rejected: {e}")))?;
    let checkout = Link::parse(response.checkout_url)
        .map_err(|e| PaymentError::GatewayError(format!("provider response rejected: {e}")))?;
    Ok((response.provider_id, status, checkout))
}

#[async_trait]
impl PaymentAdmin for PaymentOrchestrator {
    async fn create_payment(&self, source: TemplateSource, user: User) -> Result<Link> {
        PaymentOrchestrator::create_payment(self, source, user).await
    }

    async fn payment_status(&self, id: &Id) -> Result<Status> {
        self.get_payment_status(id).await
    }

    async fn payment_statuses(&self) -> Result<HashMap<Id, Status>> {
        self.get_all_payment_statuses().await
    }
}
