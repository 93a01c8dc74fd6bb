//! CLI runner - executes commands

use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::CsvLayout;
use crate::types::Product;
use chrono::NaiveDate;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                since,
                parent_only,
                format,
                output,
            } => {
                self.fetch(*since, *parent_only, *format, output.as_deref())
                    .await
            }
            Commands::Upload {
                since,
                parent_only,
                region,
            } => self.upload(*since, *parent_only, *region).await,
            Commands::Authorize { code } => self.authorize(code.as_deref()).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load the config file (if any) and apply the environment
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.cli.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn catalog(&self, config: &AppConfig, parent_only: bool) -> Result<Catalog> {
        let client = HttpClient::with_auth(config.http_config(), config.auth_config())?;
        let mut catalog = Catalog::new(
            client,
            config.catalog_paths(),
            config.page_template(),
            config.paginator_config(),
        )?;
        if parent_only {
            catalog.set_parent_only(true);
        }
        Ok(catalog)
    }

    /// Run the paginator, cancelling on Ctrl-C
    async fn collect(&self, catalog: &Catalog, since: Option<NaiveDate>) -> Result<Vec<Product>> {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                trigger.cancel();
            }
        });

        let result = catalog.products_until_cancelled(since, cancel).await;
        watcher.abort();

        let result = result?;
        info!(
            "Fetched {} products from {} pages in {}ms",
            result.stats.records, result.stats.pages_fetched, result.stats.duration_ms
        );
        Ok(result.into_records())
    }

    async fn fetch(
        &self,
        since: Option<NaiveDate>,
        parent_only: bool,
        format: OutputFormat,
        output: Option<&Path>,
    ) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.catalog(&config, parent_only)?;
        let products = self.collect(&catalog, since).await?;

        let bytes = match format {
            OutputFormat::Csv => CsvLayout::from_products(&products).to_csv_bytes()?,
            OutputFormat::Json => serde_json::to_vec_pretty(&products)?,
        };

        match output {
            Some(path) => {
                std::fs::write(path, &bytes)?;
                info!("Wrote {} products to {}", products.len(), path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    async fn upload(&self, since: Option<NaiveDate>, parent_only: bool, region: u64) -> Result<()> {
        let config = self.load_config()?;
        let catalog = self.catalog(&config, parent_only)?;
        let products = self.collect(&catalog, since).await?;

        catalog.upload(&products, region).await?;
        println!("Uploaded {} products to profile {}", products.len(), region);
        Ok(())
    }

    /// Print the consent URL, read the code, and store the token pair
    async fn authorize(&self, code: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let flow = config.authorization_flow()?;
        let store = config
            .token_store()
            .ok_or_else(|| Error::missing_field("auth.token_cache"))?;

        let code = match code {
            Some(code) => code.to_string(),
            None => {
                println!("Visit this URL to authorize the application:");
                println!("{}", flow.consent_url("state")?);
                println!("Then paste the authorization code:");
                let mut line = String::new();
                BufReader::new(tokio::io::stdin())
                    .read_line(&mut line)
                    .await?;
                line
            }
        };

        let client = reqwest::Client::builder()
            .timeout(config.http_config().timeout)
            .build()?;
        let token = flow.exchange(&client, &code).await?;
        store.save(&token).await?;
        println!("Saved credentials to {}", store.path().display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        let auth = if config.auth_config().needs_refresh() {
            "oauth2 refresh"
        } else if config.auth.access_token.is_some() {
            "bearer"
        } else {
            "none"
        };

        println!("Configuration is valid");
        println!("  api:        {}", config.api.base_url);
        println!("  auth:       {auth}");
        println!("  filter:     {}", config.product_filter());
        println!(
            "  pagination: {} slots, {} calls per {}s",
            config.pagination.slots, config.pagination.max_calls, config.pagination.window_seconds
        );
        Ok(())
    }
}
