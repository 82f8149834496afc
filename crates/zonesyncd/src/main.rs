// # zonesyncd - one-shot zone reconciliation
//
// Thin runner around zonesync-core. It reads configuration from the
// environment, builds the provider through the registry, and either applies
// a change plan or prints the current records.
//
// ## Configuration
//
// ### DNS Provider
// - `ZONESYNC_PROVIDER_TYPE`: Provider type (hetzner)
// - `ZONESYNC_API_TOKEN`: API token
// - `ZONESYNC_API_URL`: API base URL override (optional)
//
// ### Engine
// - `ZONESYNC_BULK_MODE`: Apply through zone-file export/import (true/false)
// - `ZONESYNC_DRY_RUN`: Log changes without applying them (true/false)
// - `ZONESYNC_SLASH_ESCAPE`: Token standing in for `/` in label keys
// - `ZONESYNC_DEFAULT_TTL`: TTL for zones reported without one
//
// ### Run
// - `ZONESYNC_CHANGES_FILE`: JSON change plan to apply. When unset, the
//   current records are printed to stdout as JSON.
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export ZONESYNC_API_TOKEN=your_token
// export ZONESYNC_BULK_MODE=true
// export ZONESYNC_CHANGES_FILE=/tmp/changes.json
//
// zonesyncd
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{
    Changes, EngineConfig, ProviderConfig, ProviderRegistry, Reconciler, SyncConfig, SyncMetrics,
};

/// Exit codes for different termination scenarios
///
/// - 0: Pass completed
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy)]
enum ZonesyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    provider_type: String,
    api_token: String,
    api_url: Option<String>,
    bulk_mode: bool,
    dry_run: bool,
    slash_escape: Option<String>,
    default_ttl: Option<u32>,
    changes_file: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let flag = |key: &str| -> Result<bool> {
            match lookup(key) {
                None => Ok(false),
                Some(value) => parse_bool(&value)
                    .with_context(|| format!("{} must be true or false. Got: {}", key, value)),
            }
        };

        Ok(Self {
            provider_type: lookup("ZONESYNC_PROVIDER_TYPE").unwrap_or_else(|| "hetzner".to_string()),
            api_token: lookup("ZONESYNC_API_TOKEN").context("ZONESYNC_API_TOKEN is required")?,
            api_url: lookup("ZONESYNC_API_URL").filter(|s| !s.is_empty()),
            bulk_mode: flag("ZONESYNC_BULK_MODE")?,
            dry_run: flag("ZONESYNC_DRY_RUN")?,
            slash_escape: lookup("ZONESYNC_SLASH_ESCAPE"),
            default_ttl: lookup("ZONESYNC_DEFAULT_TTL")
                .map(|s| {
                    s.trim()
                        .parse::<u32>()
                        .with_context(|| format!("ZONESYNC_DEFAULT_TTL is not a number: {}", s))
                })
                .transpose()?,
            changes_file: lookup("ZONESYNC_CHANGES_FILE").filter(|s| !s.is_empty()),
            log_level: lookup("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            anyhow::bail!(
                "ZONESYNC_API_TOKEN is required. \
                Set it via: export ZONESYNC_API_TOKEN=your_token"
            );
        }

        match self.provider_type.as_str() {
            "hetzner" => {}
            _ => anyhow::bail!(
                "ZONESYNC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: hetzner",
                self.provider_type
            ),
        }

        if let Some(ref url) = self.api_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!("ZONESYNC_API_URL must use HTTP or HTTPS scheme. Got: {}", url);
        }

        if self.default_ttl == Some(0) {
            anyhow::bail!("ZONESYNC_DEFAULT_TTL must be greater than zero");
        }

        parse_level(&self.log_level)?;

        self.sync_config().validate()?;

        Ok(())
    }

    fn sync_config(&self) -> SyncConfig {
        let mut engine = EngineConfig {
            bulk_mode: self.bulk_mode,
            dry_run: self.dry_run,
            ..EngineConfig::default()
        };
        if let Some(ref escape) = self.slash_escape {
            engine.slash_escape = escape.clone();
        }
        if let Some(ttl) = self.default_ttl {
            engine.default_ttl = ttl;
        }

        SyncConfig {
            provider: ProviderConfig::Hetzner {
                api_token: self.api_token.clone(),
                base_url: self.api_url.clone(),
            },
            engine,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean '{}'", other),
    }
}

fn parse_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "ZONESYNC_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let log_level = parse_level(&config.log_level).unwrap_or(Level::INFO);
    // Logs go to stderr so the records listing on stdout stays parseable
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    info!("Starting zonesyncd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    let reconciler = match build_reconciler(&config) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    rt.block_on(async {
        let result = run(&config, &reconciler).await;
        info!(metrics = ?reconciler.metrics().snapshot(), "Pass finished");
        match result {
            Ok(()) => ZonesyncExitCode::Success,
            Err(e) => {
                error!("Run failed: {:#}", e);
                ZonesyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

fn build_reconciler(config: &Config) -> Result<Reconciler> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "hetzner")]
    {
        info!("Registering Hetzner provider");
        zonesync_provider_hetzner::register(&registry);
    }

    let sync_config = config.sync_config();
    let provider = registry.create_provider(&sync_config.provider)?;
    info!(
        provider = %sync_config.provider.type_name(),
        bulk_mode = sync_config.engine.bulk_mode,
        dry_run = sync_config.engine.dry_run,
        "Provider ready"
    );

    Ok(Reconciler::new(
        Arc::from(provider),
        sync_config,
        Arc::new(SyncMetrics::new()),
    )?)
}

async fn run(config: &Config, reconciler: &Reconciler) -> Result<()> {
    match config.changes_file {
        Some(ref path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read change plan {}", path))?;
            let changes: Changes = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse change plan {}", path))?;
            info!(
                creates = changes.create.len(),
                updates = changes.update_new.len(),
                deletes = changes.delete.len(),
                "Applying change plan"
            );
            reconciler.apply_changes(&changes).await?;
        }
        None => {
            let endpoints = reconciler.records().await?;
            info!("Listed {} endpoint(s)", endpoints.len());
            println!("{}", serde_json::to_string_pretty(&endpoints)?);
        }
    }
    Ok(())
}
