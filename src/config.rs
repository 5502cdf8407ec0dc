use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generator::DEFAULT_MODEL;

/// How the form page is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Plain HTTP GET.
    #[default]
    Http,
    /// Load the page in headless Chrome and read the rendered document.
    Browser,
}

/// Settings for the headless browser page source.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chrome_path: None,
        }
    }
}

/// Everything one fill run needs.
#[derive(Debug, Clone)]
pub struct FillerConfig {
    pub form_url: String,
    pub api_key: Option<String>,
    pub model_name: String,
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,
    /// Number of independent responses to generate.
    pub batch: usize,
    /// Pause between generator calls.
    pub delay: Duration,
    pub output: PathBuf,
    /// Timeout for page loads and generator requests (default: 30s).
    pub timeout: Duration,
    /// Proxy server URL, e.g. "http://host:port" or "socks5://host:port".
    pub proxy: Option<String>,
    pub fetch: FetchMode,
    pub browser: BrowserConfig,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            form_url: String::new(),
            api_key: None,
            model_name: DEFAULT_MODEL.to_string(),
            temperature: 1.8,
            batch: 1,
            delay: Duration::from_secs(4),
            output: PathBuf::from("responses.txt"),
            timeout: Duration::from_secs(30),
            proxy: None,
            fetch: FetchMode::Http,
            browser: BrowserConfig::default(),
        }
    }
}

impl FillerConfig {
    pub fn builder() -> FillerBuilder {
        FillerBuilder::new()
    }

    /// The API key, or an error naming how to supply it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::ConfigError("GEMINI_API_KEY is not set (use --api-key or the environment)".into())
            })
    }
}

pub struct FillerBuilder {
    config: FillerConfig,
}

impl FillerBuilder {
    pub fn new() -> Self {
        Self {
            config: FillerConfig::default(),
        }
    }

    pub fn form_url(mut self, url: impl Into<String>) -> Self {
        self.config.form_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.config.model_name = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn batch(mut self, batch: usize) -> Self {
        self.config.batch = batch;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Route page fetches and generator calls through a proxy server.
    pub fn proxy(mut self, server: impl Into<String>) -> Self {
        self.config.proxy = Some(server.into());
        self
    }

    /// Fetch the form with headless Chrome instead of plain HTTP.
    pub fn use_browser(mut self, enabled: bool) -> Self {
        self.config.fetch = if enabled {
            FetchMode::Browser
        } else {
            FetchMode::Http
        };
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.browser.headless = headless;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.config.browser.chrome_path = Some(path.into());
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<FillerConfig> {
        let config = self.config;
        if config.form_url.trim().is_empty() {
            return Err(Error::ConfigError(
                "form URL is required (use --form-url or FORM_URL)".into(),
            ));
        }
        if !(0.0..=2.0).contains(&config.temperature) {
            return Err(Error::ConfigError(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                config.temperature
            )));
        }
        if config.batch == 0 {
            return Err(Error::ConfigError("batch size must be at least 1".into()));
        }
        Ok(config)
    }
}

impl Default for FillerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
