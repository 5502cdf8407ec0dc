use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;

use crate::config::FillerConfig;
use crate::decode::MARKER;
use crate::error::{Error, Result};
use crate::fetch::PageSource;
use crate::page::Page;

/// Chrome flags that improve performance without affecting functionality.
const PERF_ARGS: &[&str] = &[
    "disable-gpu",
    "disable-extensions",
    "metrics-recording-only",
    "mute-audio",
    "no-default-browser-check",
    "disable-client-side-phishing-detection",
    "disable-popup-blocking",
    "disable-prompt-on-repost",
];

/// Page source backed by a headless Chrome instance.
pub struct BrowserSource {
    browser: CrBrowser,
    default_timeout: std::time::Duration,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSource {
    /// Launch a browser using the browser section of `config`.
    pub async fn launch(config: &FillerConfig) -> Result<Self> {
        let browser_config = &config.browser;
        let mut builder = CrBrowserConfig::builder();

        if browser_config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        for arg in PERF_ARGS {
            builder = builder.arg(*arg);
        }

        // chromiumoxide adds the `--` prefix; ("key", "value") becomes --key=value
        if let Some(ref proxy) = config.proxy {
            builder = builder.arg(("proxy-server", proxy.as_str()));
        }

        if let Some(ref path) = browser_config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder
            .request_timeout(config.timeout)
            .viewport(Viewport {
                width: browser_config.viewport_width,
                height: browser_config.viewport_height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });

        let cr_config = builder
            .build()
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let (browser, mut handler) = CrBrowser::launch(cr_config)
            .await
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        tracing::debug!(headless = browser_config.headless, "browser launched");
        Ok(Self {
            browser,
            default_timeout: config.timeout,
            handler_task,
        })
    }

    /// Open a new tab navigated to the given URL.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let cr_page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::FetchError(e.to_string()))?;

        let page = Page::new(cr_page, self.default_timeout);
        page.goto(url).await?;
        Ok(page)
    }
}

#[async_trait]
impl PageSource for BrowserSource {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let page = self.new_page(url).await?;
        let title = page.title().await.unwrap_or_default();
        tracing::debug!(%title, "form page loaded");
        let html = page.wait_for_text(MARKER).await;
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "failed to close page");
        }
        html
    }

    async fn close(&mut self) -> Result<()> {
        self.browser.close().await?;
        self.browser.wait().await?;
        self.handler_task.abort();
        tracing::debug!("browser closed");
        Ok(())
    }
}
