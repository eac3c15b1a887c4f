#![allow(dead_code)]

use async_trait::async_trait;
use paylink::domain::payment::{Id, Link, Payment, PaymentTemplate, Status, TemplateSource, User};
use paylink::domain::ports::{PaymentAdmin, PaymentStore};
use paylink::error::{PaymentError, Result};
use paylink::infrastructure::in_memory::InMemoryPaymentStore;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

pub const RESOURCE_LINK: &str = "https://example.com/res";

pub fn user() -> User {
    User {
        id: "42".into(),
        name: "admin".into(),
        email: "admin@example.com".into(),
    }
}

pub fn template() -> PaymentTemplate {
    PaymentTemplate {
        currency: "RUB".into(),
        amount: 1000,
        description: "course".into(),
        resource_link: Link::parse(RESOURCE_LINK).unwrap(),
    }
}

/// In-memory store whose writes can be made to fail on demand.
#[derive(Clone, Default)]
pub struct FlakyPaymentStore {
    pub inner: InMemoryPaymentStore,
    fail_set: std::sync::Arc<AtomicBool>,
    fail_set_link: std::sync::Arc<AtomicBool>,
}

impl FlakyPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set_link(&self, fail: bool) {
        self.fail_set_link.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentStore for FlakyPaymentStore {
    async fn get(&self, id: &Id) -> Result<Payment> {
        self.inner.get(id).await
    }

    async fn set(&self, id: &Id, payment: Payment) -> Result<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(PaymentError::StorageError("record write refused".into()));
        }
        self.inner.set(id, payment).await
    }

    async fn update_status(&self, id: &Id, status: Status) -> Result<()> {
        self.inner.update_status(id, status).await
    }

    async fn set_link(&self, id: &Id, link: Link) -> Result<()> {
        if self.fail_set_link.load(Ordering::SeqCst) {
            return Err(PaymentError::StorageError("link write refused".into()));
        }
        self.inner.set_link(id, link).await
    }

    async fn get_link(&self, id: &Id) -> Result<Link> {
        self.inner.get_link(id).await
    }

    async fn get_status(&self, id: &Id) -> Result<Status> {
        self.inner.get_status(id).await
    }

    async fn get_statuses(&self) -> Result<HashMap<Id, Status>> {
        self.inner.get_statuses().await
    }
}

/// `PaymentAdmin` that records every creation request and answers from fixed data.
pub struct RecordingAdmin {
    pub created: Mutex<Vec<(TemplateSource, User)>>,
    pub statuses: HashMap<Id, Status>,
    pub fail: bool,
}

impl RecordingAdmin {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            statuses: HashMap::new(),
            fail: false,
        }
    }

    pub fn with_statuses(statuses: &[(&str, Status)]) -> Self {
        Self {
            statuses: statuses
                .iter()
                .map(|(id, status)| (Id::new(*id).unwrap(), *status))
                .collect(),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn created(&self) -> Vec<(TemplateSource, User)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentAdmin for RecordingAdmin {
    async fn create_payment(&self, source: TemplateSource, user: User) -> Result<Link> {
        self.created.lock().unwrap().push((source, user));
        if self.fail {
            return Err(PaymentError::GatewayError("provider unavailable".into()));
        }
        Link::parse("https://pay.example.com/checkout/1")
    }

    async fn payment_status(&self, id: &Id) -> Result<Status> {
        if self.fail {
            return Err(PaymentError::StorageError("store unavailable".into()));
        }
        self.statuses
            .get(id)
            .copied()
            .ok_or_else(|| PaymentError::NotFound(format!("payment {id}")))
    }

    async fn payment_statuses(&self) -> Result<HashMap<Id, Status>> {
        if self.fail {
            return Err(PaymentError::StorageError("store unavailable".into()));
        }
        Ok(self.statuses.clone())
    }
}
