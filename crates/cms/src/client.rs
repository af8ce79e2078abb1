use std::{fmt, time::Duration};

use reqwest::{header::ACCEPT, Url};

use crate::{
    CmsError, CmsResult, CollectionPage, CollectionSource, FilterCriteria, APPLICATION_STATUS_FIELD, USER_NAME_FIELD,
};

/// Everything needed to read one collection.
#[derive(Clone)]
pub struct CollectionQuery {
    pub collection_id: String,
    pub site_id: Option<String>,
    pub token: String,
    /// Sent upstream as `filter[<field>]` parameters when present.
    pub filters: Option<FilterCriteria>,
}

impl fmt::Debug for CollectionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionQuery")
            .field("collection_id", &self.collection_id)
            .field("site_id", &self.site_id)
            .field("token", &"<redacted>")
            .field("filters", &self.filters)
            .finish()
    }
}

impl CollectionQuery {
    pub fn new(collection_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self { collection_id: collection_id.into(), site_id: None, token: token.into(), filters: None }
    }

    pub fn site(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    pub fn filters(mut self, filters: FilterCriteria) -> Self {
        self.filters = Some(filters);
        self
    }

    /// `{base}/[sites/{site}/]collections/{collection}/items[?filter[..]=..]`
    pub fn url(&self, base: &str) -> CmsResult<Url> {
        let mut url = Url::parse(base).map_err(|e| CmsError::Transport(format!("invalid base url: {e}")))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| CmsError::Transport("base url cannot carry a path".into()))?;
            segments.pop_if_empty();
            if let Some(site) = &self.site_id {
                segments.extend(["sites", site.as_str()]);
            }
            segments.extend(["collections", self.collection_id.as_str(), "items"]);
        }
        if let Some(filters) = self.filters.as_ref().filter(|f| !f.is_unconstrained()) {
            let mut pairs = url.query_pairs_mut();
            if let Some(user) = &filters.identifier {
                pairs.append_pair(&format!("filter[{USER_NAME_FIELD}]"), user);
            }
            if let Some(status) = &filters.status {
                pairs.append_pair(&format!("filter[{APPLICATION_STATUS_FIELD}]"), status);
            }
        }
        Ok(url)
    }
}

/// HTTP client for the CMS collections API. One GET per call, never retried.
pub struct CmsClient {
    base: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl CmsClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Self {
        Self { base: base.into(), client: reqwest::Client::new(), timeout }
    }
}

#[async_trait::async_trait]
impl CollectionSource for CmsClient {
    async fn fetch_items(&self, query: &CollectionQuery) -> CmsResult<CollectionPage> {
        let url = query.url(&self.base)?;
        tracing::debug!(%url, "fetching collection items");
        let resp = self
            .client
            .get(url)
            .bearer_auth(&query.token)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), collection = %query.collection_id, "upstream rejected collection read");
            return Err(CmsError::Status { status: status.as_u16(), body });
        }

        let value: serde_json::Value = resp.json().await.map_err(|e| {
            if e.is_timeout() { CmsError::Timeout } else { CmsError::Decode(e.to_string()) }
        })?;
        CollectionPage::from_value(value)
    }
}

fn transport_error(e: reqwest::Error) -> CmsError {
    if e.is_timeout() { CmsError::Timeout } else { CmsError::Transport(e.to_string()) }
}
