use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::article::Article;
use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use crate::storage::{ArticleRepository, ArticleStore, RefreshOutcome, Repository, RepositoryFactory};

/// Write a default configuration file at `config_file`.
pub fn init(config_file: &Path, force: bool) -> Result<()> {
    if config_file.exists() && !force {
        warn!("Configuration file already exists: {}", config_file.display());
        println!("⚠️  Configuration already exists: {}", config_file.display());
        println!("   Use --force to overwrite it");
        return Ok(());
    }

    let config = Config::default();
    config.save(config_file)?;
    info!("Created default configuration: {}", config_file.display());

    println!("✅ help-articles initialized successfully!");
    println!("   Config file: {}", config_file.display());
    println!("   Server: {}", config.remote.base_url);
    println!("   Cache directory: {}", config.cache_dir()?.display());
    println!();
    println!("Next steps:");
    println!("   1. Point remote.base_url at your help center API");
    println!("   2. Fetch articles: help-articles list");

    Ok(())
}

/// Print the article list, newest first.
pub async fn list(config: &Config, refresh: bool) -> Result<()> {
    let repo = RepositoryFactory::from_config(config).await?;
    let articles = repo.get_collection(refresh).await?;
    print_list(&articles);
    report_fallback(&repo);
    Ok(())
}

/// Print one article in full.
pub async fn show(config: &Config, id: &str, refresh: bool) -> Result<()> {
    let repo = RepositoryFactory::from_config(config).await?;
    let article = repo.get_item(id, refresh).await?;
    println!("{}", article.to_text());
    report_fallback(&repo);
    Ok(())
}

/// Force a list refresh and report whether the caller should retry.
pub async fn refresh(config: &Config) -> Result<RefreshOutcome> {
    let repo = RepositoryFactory::from_config(config).await?;

    println!("🔄 Refreshing articles from {}", config.remote.base_url);
    let outcome = repo.trigger_refresh().await;
    match outcome {
        RefreshOutcome::Success => {
            let count = repo.store().get_all().await?.len();
            println!("✅ Refreshed {} articles", count);
        }
        RefreshOutcome::Retry => {
            println!("❌ Refresh failed; try again later");
        }
    }

    Ok(outcome)
}

/// Print configuration and cache state.
pub async fn status(config: &Config, config_file: &Path) -> Result<()> {
    println!("📊 help-articles Status");
    println!("=======================");

    if config_file.exists() {
        println!("✅ Configuration: {}", config_file.display());
    } else {
        println!("❌ Configuration: not found, using defaults");
        println!("   Run 'help-articles init' to create one");
    }
    println!("   Server: {}", config.remote.base_url);
    println!("   Timeout: {}s", config.remote.timeout_secs);

    let repo = RepositoryFactory::from_config(config).await?;
    let stats = repo.store().stats().await?;

    println!("\n💾 Cache: {}", config.cache_dir()?.display());
    println!("   Articles: {}", stats.article_count);
    match stats.last_fetch_timestamp {
        Some(ts) => println!("   Last fetch: {}", format_millis(ts)),
        None => println!("   Last fetch: never"),
    }
    println!(
        "   State: {}",
        if stats.is_stale { "stale" } else { "fresh" }
    );

    Ok(())
}

/// Remove every cached article.
pub async fn clear(config: &Config) -> Result<()> {
    let repo = RepositoryFactory::from_config(config).await?;
    repo.clear_cache().await?;
    println!("🗑️  Cache cleared");
    Ok(())
}

fn print_list(articles: &[Article]) {
    if articles.is_empty() {
        println!("📋 No articles available.");
        return;
    }

    println!("📋 Help Articles ({})", articles.len());
    println!("==================");
    for article in articles {
        let updated = article
            .last_updated()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("\n📰 {} [{}]", article.title, article.id);
        println!("   Updated: {}", updated);
        if !article.summary.is_empty() {
            println!("   {}", article.summary);
        }
    }
}

fn report_fallback(repo: &Repository) {
    if repo.stats().stale_fallbacks > 0 {
        println!("\n⚠️  Server unreachable; showing cached articles");
    }
}

/// One-line description of a failed command for the terminal.
pub fn describe_failure(err: &Error) -> String {
    match err.as_remote() {
        Some(remote) => format!("{}: {}", remote.title(), remote.user_message()),
        None if err.is_user_error() => format!(
            "{}\n   Check the configuration or run 'help-articles init'",
            err
        ),
        None => err.to_string(),
    }
}

fn format_millis(ts: i64) -> String {
    Utc.timestamp_millis_opt(ts)
        .single()
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Initialize logging. The returned guard must be held while logging to a file.
pub fn init_logging(
    debug: bool,
    verbose: bool,
    logging: &LoggingConfig,
) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug);

    let mut guard = None;
    let result = if logging.log_to_file {
        let path = log_file_path(&logging.log_file)?;
        let (dir, file_name) = match (path.parent(), path.file_name()) {
            (Some(dir), Some(name)) => (dir.to_path_buf(), name.to_owned()),
            _ => return Err(Error::Config(format!("Invalid log file: {}", path.display()))),
        };
        std::fs::create_dir_all(&dir)?;

        let (writer, worker) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        guard = Some(worker);

        if logging.json_format {
            builder.json().with_writer(writer).with_ansi(false).try_init()
        } else {
            builder.with_writer(writer).with_ansi(false).try_init()
        }
    } else if logging.json_format {
        builder.json().with_writer(std::io::stderr).try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };

    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(guard)
}

/// Relative log paths live under the config directory.
fn log_file_path(log_file: &str) -> Result<PathBuf> {
    let path = PathBuf::from(log_file);
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(Config::config_dir()?.join(path))
    }
}
