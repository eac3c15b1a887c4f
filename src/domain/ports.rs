use super::payment::{Id, Link, Payment, PaymentTemplate, Status, TemplateSource, User};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fails with `NotFound` when no template is registered under `name`.
    async fn get_template(&self, name: &str) -> Result<PaymentTemplate>;
    async fn put_template(&self, name: &str, template: PaymentTemplate) -> Result<()>;
}

pub trait LinkGenerator: Send + Sync {
    fn generate_link(&self, id: &Id) -> Result<Link>;
}

/// Durable mapping from payment id to its record and its active redirect link.
///
/// `set` creates or replaces a record; `set_link` requires the record to exist.
/// Every other method fails with `NotFound` for an unknown id. All of them fail
/// with `StorageError` when the backend cannot be read or written.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn get(&self, id: &Id) -> Result<Payment>;
    async fn set(&self, id: &Id, payment: Payment) -> Result<()>;
    async fn update_status(&self, id: &Id, status: Status) -> Result<()>;
    async fn set_link(&self, id: &Id, link: Link) -> Result<()>;
    async fn get_link(&self, id: &Id) -> Result<Link>;
    async fn get_status(&self, id: &Id) -> Result<Status>;
    async fn get_statuses(&self) -> Result<HashMap<Id, Status>>;
}

/// Provider response to a payment creation, as received.
///
/// Fields are raw so the caller decides what a usable response is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayPayment {
    pub provider_id: String,
    pub status: String,
    pub checkout_url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Creates one payment on the provider side, correlated by `id`.
    ///
    /// `Ok(None)` means the provider accepted the call but returned nothing usable.
    async fn create_payment(
        &self,
        id: &Id,
        template: &PaymentTemplate,
    ) -> Result<Option<GatewayPayment>>;

    /// Current state of a payment this provider created, by its provider id.
    async fn fetch_payment(&self, provider_id: &str) -> Result<GatewayPayment>;
}

/// Purchased files served by this service, keyed by payment id.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Fails with `NotFound` when nothing is stored under `id`.
    async fn get_data(&self, id: &Id) -> Result<Vec<u8>>;
}

/// Administrative operations the chat interface needs.
#[async_trait]
pub trait PaymentAdmin: Send + Sync {
    async fn create_payment(&self, source: TemplateSource, user: User) -> Result<Link>;
    async fn payment_status(&self, id: &Id) -> Result<Status>;
    async fn payment_statuses(&self) -> Result<HashMap<Id, Status>>;
}

pub type TemplateStoreBox = Box<dyn TemplateStore>;
pub type LinkGeneratorBox = Box<dyn LinkGenerator>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type PaymentAdminBox = Box<dyn PaymentAdmin>;
pub type FileStoreBox = Box<dyn FileStore>;

#[async_trait]
impl<T: PaymentAdmin + ?Sized> PaymentAdmin for std::sync::Arc<T> {
    async fn create_payment(&self, source: TemplateSource, user: User) -> Result<Link> {
        (**self).create_payment(source, user).await
    }

    async fn payment_status(&self, id: &Id) -> Result<Status> {
        (**self).payment_status(id).await
    }

    async fn payment_statuses(&self) -> Result<HashMap<Id, Status>> {
        (**self).payment_statuses().await
    }
}
