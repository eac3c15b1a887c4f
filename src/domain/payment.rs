use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Identifier of a payment, the sole key into the payment store.
///
/// Any non-empty string without surrounding whitespace is accepted so that ids
/// created by older deployments stay addressable; fresh ids are UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || value.trim() != value {
            return Err(PaymentError::ValidationError(format!(
                "invalid payment id {value:?}"
            )));
        }
        Ok(Self(value))
    }

    /// Generates a fresh UUID v4 identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Id {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl FromStr for Id {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status reported by the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    WaitingForCapture,
    Succeeded,
    #[serde(rename = "canceled", alias = "cancelled")]
    Cancelled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::WaitingForCapture => "waiting_for_capture",
            Self::Succeeded => "succeeded",
            Self::Cancelled => "canceled",
        }
    }
}

impl FromStr for Status {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "waiting_for_capture" => Ok(Self::WaitingForCapture),
            "succeeded" => Ok(Self::Succeeded),
            "canceled" | "cancelled" => Ok(Self::Cancelled),
            other => Err(PaymentError::ValidationError(format!(
                "unknown payment status {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An absolute URL, kept verbatim as it was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Link(String);

impl Link {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        match Url::parse(&value) {
            Ok(url) if url.has_host() => Ok(Self(value)),
            _ => Err(PaymentError::ValidationError(format!(
                "invalid link {value:?}"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Link {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Link> for String {
    fn from(link: Link) -> Self {
        link.0
    }
}

impl FromStr for Link {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The person a payment is issued for. Sent to the provider as metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(PaymentError::ValidationError("user id is empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(PaymentError::ValidationError("user name is empty".into()));
        }
        match self.email.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(())
            }
            _ => Err(PaymentError::ValidationError(format!(
                "invalid user email {:?}",
                self.email
            ))),
        }
    }
}

/// Reusable description of a payment class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTemplate {
    /// ISO 4217 alphabetic code, e.g. `RUB`.
    pub currency: String,
    /// Whole currency units.
    pub amount: u32,
    pub description: String,
    /// Exposed to the payer once the payment succeeds.
    pub resource_link: Link,
}

impl PaymentTemplate {
    pub fn validate(&self) -> Result<()> {
        if self.amount == 0 {
            return Err(PaymentError::ValidationError(
                "amount must be positive".into(),
            ));
        }
        if self.currency.len() != 3 || !self.currency.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(PaymentError::ValidationError(format!(
                "invalid currency code {:?}",
                self.currency
            )));
        }
        Ok(())
    }
}

/// Where `create_payment` takes its template from.
///
/// On the wire a JSON string names a stored template, a JSON object is the template itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateSource {
    Named(String),
    Inline(PaymentTemplate),
}

/// The persisted record of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub user: User,
    pub amount: u32,
    pub currency: String,
    pub description: String,
    pub status: Status,
    /// Identifier assigned by the provider.
    pub provider_id: String,
    /// Hosted checkout page, active while the payment is not settled.
    pub payment_link: Link,
    /// Becomes the active redirect link once the payment succeeds.
    pub resource_link: Link,
}
