use crate::domain::payment::{Id, Link, Payment, PaymentTemplate, Status};
use crate::domain::ports::{PaymentStore, TemplateStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory payment store.
///
/// Records and redirect links live in two maps guarded by one `RwLock`, so every
/// method is atomic with respect to the others. `Clone` shares the underlying state.
/// Contents are lost when the process exits.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<Tables>>,
}

#[derive(Default)]
struct Tables {
    payments: HashMap<Id, Payment>,
    links: HashMap<Id, Link>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn payment_not_found(id: &Id) -> PaymentError {
    PaymentError::NotFound(format!("payment {id}"))
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn get(&self, id: &Id) -> Result<Payment> {
        let tables = self.inner.read().await;
        tables
            .payments
            .get(id)
            .cloned()
            .ok_or_else(|| payment_not_found(id))
    }

    async fn set(&self, id: &Id, payment: Payment) -> Result<()> {
        let mut tables = self.inner.write().await;
        tables.payments.insert(id.clone(), payment);
        Ok(())
    }

    async fn update_status(&self, id: &Id, status: Status) -> Result<()> {
        let mut tables = self.inner.write().await;
        let payment = tables
            .payments
            .get_mut(id)
            .ok_or_else(|| payment_not_found(id))?;
        payment.status = status;
        Ok(())
    }

    async fn set_link(&self, id: &Id, link: Link) -> Result<()> {
        let mut tables = self.inner.write().await;
        if !tables.payments.contains_key(id) {
            return Err(payment_not_found(id));
        }
        tables.links.insert(id.clone(), link);
        Ok(())
    }

    async fn get_link(&self, id: &Id) -> Result<Link> {
        let tables = self.inner.read().await;
        tables
            .links
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("redirect link for payment {id}")))
    }

    async fn get_status(&self, id: &Id) -> Result<Status> {
        let tables = self.inner.read().await;
        tables
            .payments
            .get(id)
            .map(|payment| payment.status)
            .ok_or_else(|| payment_not_found(id))
    }

    async fn get_statuses(&self) -> Result<HashMap<Id, Status>> {
        let tables = self.inner.read().await;
        Ok(tables
            .payments
            .iter()
            .map(|(id, payment)| (id.clone(), payment.status))
            .collect())
    }
}

/// A thread-safe in-memory template store.
#[derive(Default, Clone)]
pub struct InMemoryTemplateStore {
    templates: Arc<RwLock<HashMap<String, PaymentTemplate>>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn get_template(&self, name: &str) -> Result<PaymentTemplate> {
        let templates = self.templates.read().await;
        templates
            .get(name)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("template {name:?}")))
    }

    async fn put_template(&self, name: &str, template: PaymentTemplate) -> Result<()> {
        let mut templates = self.templates.write().await;
        templates.insert(name.to_string(), template);
        Ok(())
    }
}
