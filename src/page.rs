use std::time::Duration;

use chromiumoxide::page::Page as CrPage;

use crate::error::{Error, Result};

/// A browser tab holding a loaded form page.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration) -> Self {
        Self {
            inner,
            default_timeout,
        }
    }

    /// Navigate to the given URL and wait for the page to load.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| Error::FetchError(e.to_string()))?;
        Ok(())
    }

    /// Get the current page title.
    pub async fn title(&self) -> Result<String> {
        let result = self
            .inner
            .evaluate("document.title")
            .await
            .map_err(|e| Error::FetchError(e.to_string()))?;
        Ok(result.into_value::<String>().unwrap_or_default())
    }

    /// Get the full HTML content of the page.
    pub async fn html(&self) -> Result<String> {
        self.inner
            .content()
            .await
            .map_err(|e| Error::FetchError(e.to_string()))
    }

    /// Wait until the document contains `marker`, then return its HTML.
    /// Polls every 100ms up to the configured default timeout.
    pub async fn wait_for_text(&self, marker: &str) -> Result<String> {
        let interval = Duration::from_millis(100);
        let start = std::time::Instant::now();

        loop {
            let html = self.html().await?;
            if html.contains(marker) {
                return Ok(html);
            }
            if start.elapsed() >= self.default_timeout {
                tracing::debug!(marker, "gave up waiting for marker");
                return Ok(html);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Close the tab.
    pub async fn close(self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}
