//! Retrieval of the form page and its schema.

use std::time::Duration;

use async_trait::async_trait;

use crate::browser::BrowserSource;
use crate::config::{FetchMode, FillerConfig};
use crate::decode::decode_html;
use crate::error::{Error, Result};
use crate::schema::Section;

/// Anything that can produce the HTML of a form page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;

    /// Release whatever the source holds open.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// HTTP client with the run's timeout and optional proxy applied.
pub(crate) fn http_client(timeout: Duration, proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| Error::ConfigError(format!("invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| Error::ConfigError(format!("failed to build HTTP client: {e}")))
}

/// Plain HTTP page source.
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &FillerConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config.timeout, config.proxy.as_deref())?,
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::FetchError(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchError(format!("{url}: status code {status}")));
        }
        response
            .text()
            .await
            .map_err(|e| Error::FetchError(format!("{url}: {e}")))
    }
}

/// Build the page source selected by the configuration.
pub async fn page_source(config: &FillerConfig) -> Result<Box<dyn PageSource>> {
    Ok(match config.fetch {
        FetchMode::Http => Box::new(HttpSource::new(config)?),
        FetchMode::Browser => Box::new(BrowserSource::launch(config).await?),
    })
}

/// Fetch a form page and decode its schema.
pub async fn load_schema(source: &dyn PageSource, url: &str) -> Result<Vec<Section>> {
    tracing::info!(url, "fetching form");
    let html = source.fetch_html(url).await?;
    decode_html(&html)
}

/// Load the schema, then close and drop the source whether or not loading
/// succeeded. The page source is not needed once the schema is decoded.
pub async fn fetch_schema(mut source: Box<dyn PageSource>, url: &str) -> Result<Vec<Section>> {
    let loaded = load_schema(source.as_ref(), url).await;
    if let Err(e) = source.close().await {
        tracing::debug!(error = %e, "failed to close page source");
    }
    loaded
}
