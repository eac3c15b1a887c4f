use crate::domain::payment::{Id, Link, Payment, PaymentTemplate, Status};
use crate::domain::ports::{PaymentStore, TemplateStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

/// Column Family for payment records.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for active redirect links.
pub const CF_LINKS: &str = "links";
/// Column Family for named payment templates.
pub const CF_TEMPLATES: &str = "templates";

/// A persistent store implementation using RocksDB.
///
/// Payments, redirect links and templates live in separate Column Families,
/// keyed by payment id or template name, with JSON values.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`). Single
/// writes are atomic; read-modify-write sequences such as `update_status` rely on
/// the caller serializing writes per id.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

fn storage_error(context: &str, err: impl Display) -> PaymentError {
    PaymentError::StorageError(format!("{context}: {err}"))
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_PAYMENTS, CF_LINKS, CF_TEMPLATES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| storage_error("open rocksdb", e))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| storage_error(name, "column family not found"))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self
            .db
            .get_pinned_cf(cf, key)
            .map_err(|e| storage_error(cf_name, e))?
        {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| storage_error(cf_name, format!("deserialization error: {e}"))),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)
            .map_err(|e| storage_error(cf_name, format!("serialization error: {e}")))?;
        self.db
            .put_cf(cf, key, bytes)
            .map_err(|e| storage_error(cf_name, e))
    }

    fn payment(&self, id: &Id) -> Result<Payment> {
        self.read(CF_PAYMENTS, id.as_str().as_bytes())?
            .ok_or_else(|| PaymentError::NotFound(format!("payment {id}")))
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn get(&self, id: &Id) -> Result<Payment> {
        self.payment(id)
    }

    async fn set(&self, id: &Id, payment: Payment) -> Result<()> {
        self.write(CF_PAYMENTS, id.as_str().as_bytes(), &payment)
    }

    async fn update_status(&self, id: &Id, status: Status) -> Result<()> {
        let mut payment = self.payment(id)?;
        payment.status = status;
        self.write(CF_PAYMENTS, id.as_str().as_bytes(), &payment)
    }

    async fn set_link(&self, id: &Id, link: Link) -> Result<()> {
        self.payment(id)?;
        self.write(CF_LINKS, id.as_str().as_bytes(), &link)
    }

    async fn get_link(&self, id: &Id) -> Result<Link> {
        self.read(CF_LINKS, id.as_str().as_bytes())?
            .ok_or_else(|| PaymentError::NotFound(format!("redirect link for payment {id}")))
    }

    async fn get_status(&self, id: &Id) -> Result<Status> {
        Ok(self.payment(id)?.status)
    }

    async fn get_statuses(&self) -> Result<HashMap<Id, Status>> {
        let cf = self.cf(CF_PAYMENTS)?;
        let mut statuses = HashMap::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item.map_err(|e| storage_error(CF_PAYMENTS, e))?;
            let id = String::from_utf8(key.to_vec())
                .map_err(|e| storage_error(CF_PAYMENTS, format!("invalid key: {e}")))
                .and_then(Id::new)?;
            let payment: Payment = serde_json::from_slice(&value)
                .map_err(|e| storage_error(CF_PAYMENTS, format!("deserialization error: {e}")))?;
            statuses.insert(id, payment.status);
        }

        Ok(statuses)
    }
}

#[async_trait]
impl TemplateStore for RocksDBStore {
    async fn get_template(&self, name: &str) -> Result<PaymentTemplate> {
        self.read(CF_TEMPLATES, name.as_bytes())?
            .ok_or_else(|| PaymentError::NotFound(format!("template {name:?}")))
    }

    async fn put_template(&self, name: &str, template: PaymentTemplate) -> Result<()> {
        self.write(CF_TEMPLATES, name.as_bytes(), &template)
    }
}
