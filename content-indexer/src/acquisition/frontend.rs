//! Frontend page fetching.
//!
//! Redirects are followed by hand so that every hop passes the address policy
//! before a connection is made. Host names are resolved and checked by
//! [`PolicyResolver`], installed as the client's only resolver.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect, Client, Response};
use tracing::debug;
use url::Url;

use crate::acquisition::ssrf::{AddressPolicy, HostLookup, PolicyResolver, SystemLookup};
use crate::config::FetchSettings;
use crate::errors::AcquisitionError;

/// A fetched page, with the body capped at the configured size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL of the final hop.
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// The body was cut at the size cap.
    pub truncated: bool,
}

impl FetchedPage {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
    }

    /// Textual bodies that can be indexed as-is. A missing content type counts as text.
    pub fn is_plain_text(&self) -> bool {
        match self.content_type.as_deref() {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.starts_with("text/") || ct.contains("json") || ct.contains("xml")
            }
        }
    }
}

/// Fetches the public page of an item.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, AcquisitionError>;
}

/// [`PageFetcher`] backed by reqwest.
///
/// TLS certificates are always verified.
pub struct HttpPageFetcher {
    client: Client,
    policy: AddressPolicy,
    max_redirects: usize,
    max_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self, AcquisitionError> {
        Self::build(
            settings,
            settings.timeout(),
            AddressPolicy::new(),
            Arc::new(SystemLookup),
        )
    }

    fn build(
        settings: &FetchSettings,
        timeout: Duration,
        policy: AddressPolicy,
        lookup: Arc<dyn HostLookup>,
    ) -> Result<Self, AcquisitionError> {
        // A proxy would resolve the target itself, past the resolver.
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .redirect(redirect::Policy::none())
            .no_proxy()
            .dns_resolver(Arc::new(PolicyResolver::new(policy, lookup)))
            .timeout(timeout)
            .build()
            .map_err(|e| AcquisitionError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            policy,
            max_redirects: settings.max_redirects,
            max_bytes: settings.max_bytes,
        })
    }

    async fn read_capped(
        &self,
        mut response: Response,
    ) -> Result<(Vec<u8>, bool), AcquisitionError> {
        let mut buffer = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let remaining = self.max_bytes - buffer.len();
            if chunk.len() > remaining {
                buffer.extend_from_slice(&chunk[..remaining]);
                return Ok((buffer, true));
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok((buffer, false))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, AcquisitionError> {
        let mut current = url.clone();

        for hop in 0..=self.max_redirects {
            self.policy.check_url(&current)?;
            debug!(url = %current, hop, "Fetching page");

            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| {
                        AcquisitionError::Transport(format!(
                            "redirect {} without location",
                            status.as_u16()
                        ))
                    })?;
                current = current
                    .join(location)
                    .map_err(|e| AcquisitionError::InvalidUrl(format!("{location}: {e}")))?;
                continue;
            }

            if !status.is_success() {
                return Err(AcquisitionError::Http(status.as_u16()));
            }

            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            let (bytes, truncated) = self.read_capped(response).await?;

            return Ok(FetchedPage {
                url: current,
                status: status.as_u16(),
                content_type,
                headers,
                body: String::from_utf8_lossy(&bytes).into_owned(),
                truncated,
            });
        }

        Err(AcquisitionError::TooManyRedirects)
    }
}
