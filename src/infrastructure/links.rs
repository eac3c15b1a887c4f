use crate::domain::payment::{Id, Link};
use crate::domain::ports::LinkGenerator;
use crate::error::{PaymentError, Result};
use url::Url;

/// Builds `<base>/<id>` links that resolve to this service's redirect endpoint.
#[derive(Debug, Clone)]
pub struct BaseUrlLinkGenerator {
    base: Url,
}

impl BaseUrlLinkGenerator {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|e| PaymentError::ValidationError(format!("invalid base url {base:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(PaymentError::ValidationError(format!(
                "invalid base url {base}"
            )));
        }
        Ok(Self { base })
    }
}

impl LinkGenerator for BaseUrlLinkGenerator {
    fn generate_link(&self, id: &Id) -> Result<Link> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PaymentError::ValidationError(format!("invalid base url {}", self.base)))?
            .pop_if_empty()
            .push(id.as_str());
        Link::parse(url.to_string())
    }
}
