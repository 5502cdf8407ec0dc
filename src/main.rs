use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use form_filler::runner::{preview, write_urls};
use form_filler::{
    fetch_schema, page_source, question_count, render_questions, BatchRunner, FillerConfig,
    GeminiGenerator, Section,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status when the form could not be fetched or decoded.
const EXIT_FORM_UNAVAILABLE: i32 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "form-filler",
    about = "Fill a web form with generated answers and write prefilled submission URLs",
    version
)]
struct Cli {
    /// Form URL to process
    #[arg(long, env = "FORM_URL")]
    form_url: String,

    /// Generative model name
    #[arg(long, env = "MODEL_NAME", default_value = form_filler::generator::DEFAULT_MODEL)]
    model_name: String,

    /// API key for the generative model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Number of responses to generate
    #[arg(long, default_value_t = 1)]
    batch: usize,

    /// Output file for URLs
    #[arg(long, default_value = "responses.txt")]
    output: PathBuf,

    /// Delay in seconds between model requests
    #[arg(long, default_value_t = 4.0)]
    delay: f64,

    /// Sampling temperature, 0.0-2.0
    #[arg(long, default_value_t = 1.8)]
    temperature: f32,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Proxy server for page fetch and model calls
    #[arg(long)]
    proxy: Option<String>,

    /// Load the form in headless Chrome instead of a plain HTTP request
    #[arg(long)]
    browser: bool,

    /// Chrome executable to use with --browser
    #[arg(long, requires = "browser")]
    chrome_path: Option<String>,

    /// Print the decoded schema as JSON and exit
    #[arg(long, conflicts_with = "prompt_only")]
    dump_schema: bool,

    /// Print the rendered questions and exit without calling the model
    #[arg(long)]
    prompt_only: bool,
}

impl Cli {
    fn into_config(self) -> Result<FillerConfig> {
        let delay = Duration::try_from_secs_f64(self.delay)
            .map_err(|e| anyhow!("--delay {}: {e}", self.delay))?;
        let mut builder = FillerConfig::builder()
            .form_url(self.form_url)
            .model_name(self.model_name)
            .batch(self.batch)
            .output(self.output)
            .delay(delay)
            .temperature(self.temperature)
            .timeout(Duration::from_secs(self.timeout))
            .use_browser(self.browser);
        if let Some(key) = self.api_key {
            builder = builder.api_key(key);
        }
        if let Some(proxy) = self.proxy {
            builder = builder.proxy(proxy);
        }
        if let Some(path) = self.chrome_path {
            builder = builder.chrome_path(path);
        }
        Ok(builder.build()?)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "form_filler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let code = run(Cli::parse()).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Fetch and decode the form. The page source is closed before returning.
async fn load_form(config: &FillerConfig) -> form_filler::Result<Vec<Section>> {
    let source = page_source(config).await?;
    fetch_schema(source, &config.form_url).await
}

/// Run the whole pipeline and return the process exit status.
async fn run(cli: Cli) -> Result<i32> {
    let dump_schema = cli.dump_schema;
    let prompt_only = cli.prompt_only;
    let config = cli.into_config()?;

    let sections = match load_form(&config).await {
        Ok(sections) => sections,
        Err(e) => {
            tracing::error!(url = %config.form_url, error = %e, "failed to fetch or parse the form");
            return Ok(EXIT_FORM_UNAVAILABLE);
        }
    };
    tracing::info!(
        sections = sections.len(),
        questions = question_count(&sections),
        "form parsed"
    );

    if dump_schema {
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(0);
    }
    if prompt_only {
        println!("{}", render_questions(&sections));
        return Ok(0);
    }

    let generator = GeminiGenerator::new(
        config.require_api_key()?,
        config.model_name.clone(),
        config.temperature,
        config.timeout,
        config.proxy.as_deref(),
    )?;
    tracing::info!(
        batch = config.batch,
        model = generator.model(),
        temperature = config.temperature,
        output = %config.output.display(),
        "generating responses"
    );

    let report = BatchRunner::new(&sections, &config.form_url, &generator)
        .delay(config.delay)
        .run(config.batch)
        .await;

    if report.urls.is_empty() {
        tracing::error!("no URLs generated successfully");
    } else {
        write_urls(&config.output, &report.urls)
            .await
            .with_context(|| format!("writing {}", config.output.display()))?;
        tracing::info!(path = %config.output.display(), "URLs saved");
        for (idx, url) in report.urls.iter().take(3).enumerate() {
            tracing::info!("{}. {}", idx + 1, preview(url, 100));
        }
    }

    Ok(report.outcome().exit_code())
}
