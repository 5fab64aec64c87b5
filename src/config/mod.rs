//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "hollow";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_CAPACITY: u64 = 1024;
const DEFAULT_REVALIDATE_SECS: u64 = crate::domain::content::DEFAULT_REVALIDATE_SECS;
const DEFAULT_SEARCH_INDEX_TTL_SECS: u64 = 300;
const DEFAULT_SEARCH_INDEX_FALLBACK_TTL_SECS: u64 = 60;
const DEFAULT_LANDING_SLUG: &str = "home";
const DEFAULT_POSTS_PER_PAGE: u64 = 10;
const DEFAULT_NEWSLETTER_API_URL: &str = "https://api.resend.com/emails";

/// Command-line arguments for the hollow server binary.
#[derive(Debug, Parser)]
#[command(name = "hollow", version, about = "Headless WordPress edge server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "HOLLOW_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the WordPress GraphQL endpoint.
    #[arg(long = "wordpress-graphql-url", value_name = "URL")]
    pub wordpress_graphql_url: Option<String>,

    /// Override the search index endpoint.
    #[arg(long = "wordpress-search-index-url", value_name = "URL")]
    pub wordpress_search_index_url: Option<String>,

    /// Override the upstream request timeout.
    #[arg(long = "wordpress-request-timeout-seconds", value_name = "SECONDS")]
    pub wordpress_request_timeout_seconds: Option<u64>,

    /// Override the maximum number of cached entries.
    #[arg(long = "cache-capacity", value_name = "COUNT")]
    pub cache_capacity: Option<u64>,

    /// Override the fallback revalidate window.
    #[arg(long = "cache-default-revalidate-seconds", value_name = "SECONDS")]
    pub cache_default_revalidate_seconds: Option<u64>,

    /// Override the slug of the page served at `/`.
    #[arg(long = "site-landing-slug", value_name = "SLUG")]
    pub site_landing_slug: Option<String>,

    /// Override the blog index page size.
    #[arg(long = "site-posts-per-page", value_name = "COUNT")]
    pub site_posts_per_page: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub wordpress: WordpressSettings,
    pub cache: CacheSettings,
    pub site: SiteSettings,
    pub revalidate: SecretSettings,
    pub preview: SecretSettings,
    pub newsletter: NewsletterSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct WordpressSettings {
    pub graphql_url: Option<Url>,
    pub search_index_url: Option<Url>,
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub capacity: NonZeroUsize,
    pub default_revalidate_seconds: NonZeroU64,
    pub search_index_ttl_seconds: NonZeroU64,
    pub search_index_fallback_ttl_seconds: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub landing_slug: String,
    pub posts_per_page: NonZeroU32,
}

/// A shared secret; `None` means the guarded endpoint rejects every request.
#[derive(Clone, Default)]
pub struct SecretSettings {
    pub secret: Option<String>,
}

impl std::fmt::Debug for SecretSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone)]
pub struct NewsletterSettings {
    pub api_url: Url,
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub audience: Option<String>,
}

impl std::fmt::Debug for NewsletterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsletterSettings")
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .field("audience", &self.audience)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("HOLLOW").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    wordpress: RawWordpressSettings,
    cache: RawCacheSettings,
    site: RawSiteSettings,
    revalidate: RawSecretSettings,
    preview: RawSecretSettings,
    newsletter: RawNewsletterSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.wordpress_graphql_url.as_ref() {
            self.wordpress.graphql_url = Some(url.clone());
        }
        if let Some(url) = overrides.wordpress_search_index_url.as_ref() {
            self.wordpress.search_index_url = Some(url.clone());
        }
        if let Some(seconds) = overrides.wordpress_request_timeout_seconds {
            self.wordpress.request_timeout_seconds = Some(seconds);
        }
        if let Some(capacity) = overrides.cache_capacity {
            self.cache.capacity = Some(capacity);
        }
        if let Some(seconds) = overrides.cache_default_revalidate_seconds {
            self.cache.default_revalidate_seconds = Some(seconds);
        }
        if let Some(slug) = overrides.site_landing_slug.as_ref() {
            self.site.landing_slug = Some(slug.clone());
        }
        if let Some(count) = overrides.site_posts_per_page {
            self.site.posts_per_page = Some(count);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            wordpress,
            cache,
            site,
            revalidate,
            preview,
            newsletter,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            wordpress: build_wordpress_settings(wordpress)?,
            cache: build_cache_settings(cache)?,
            site: build_site_settings(site)?,
            revalidate: build_secret_settings(revalidate),
            preview: build_secret_settings(preview),
            newsletter: build_newsletter_settings(newsletter)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_wordpress_settings(
    wordpress: RawWordpressSettings,
) -> Result<WordpressSettings, LoadError> {
    let graphql_url = optional_url(wordpress.graphql_url, "wordpress.graphql_url")?;
    let search_index_url = optional_url(wordpress.search_index_url, "wordpress.search_index_url")?;

    let timeout_secs = wordpress
        .request_timeout_seconds
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let timeout_secs = non_zero_u64(timeout_secs, "wordpress.request_timeout_seconds")?;

    Ok(WordpressSettings {
        graphql_url,
        search_index_url,
        auth_token: non_empty(wordpress.auth_token),
        request_timeout: Duration::from_secs(timeout_secs.get()),
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY);
    let capacity = usize::try_from(capacity)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| LoadError::invalid("cache.capacity", "must be a positive entry count"))?;

    Ok(CacheSettings {
        capacity,
        default_revalidate_seconds: non_zero_u64(
            cache
                .default_revalidate_seconds
                .unwrap_or(DEFAULT_REVALIDATE_SECS),
            "cache.default_revalidate_seconds",
        )?,
        search_index_ttl_seconds: non_zero_u64(
            cache
                .search_index_ttl_seconds
                .unwrap_or(DEFAULT_SEARCH_INDEX_TTL_SECS),
            "cache.search_index_ttl_seconds",
        )?,
        search_index_fallback_ttl_seconds: non_zero_u64(
            cache
                .search_index_fallback_ttl_seconds
                .unwrap_or(DEFAULT_SEARCH_INDEX_FALLBACK_TTL_SECS),
            "cache.search_index_fallback_ttl_seconds",
        )?,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let landing_slug = site
        .landing_slug
        .map(|slug| slug.trim().trim_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_LANDING_SLUG.to_string());
    if landing_slug.is_empty() {
        return Err(LoadError::invalid(
            "site.landing_slug",
            "slug must not be empty",
        ));
    }

    let posts_per_page = non_zero_u32(
        site.posts_per_page.unwrap_or(DEFAULT_POSTS_PER_PAGE),
        "site.posts_per_page",
    )?;

    Ok(SiteSettings {
        landing_slug,
        posts_per_page,
    })
}

fn build_secret_settings(raw: RawSecretSettings) -> SecretSettings {
    SecretSettings {
        secret: non_empty(raw.secret),
    }
}

fn build_newsletter_settings(
    newsletter: RawNewsletterSettings,
) -> Result<NewsletterSettings, LoadError> {
    let api_url = newsletter
        .api_url
        .unwrap_or_else(|| DEFAULT_NEWSLETTER_API_URL.to_string());
    let api_url = Url::parse(api_url.trim())
        .map_err(|err| LoadError::invalid("newsletter.api_url", err.to_string()))?;

    Ok(NewsletterSettings {
        api_url,
        api_key: non_empty(newsletter.api_key),
        from: non_empty(newsletter.from),
        audience: non_empty(newsletter.audience),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawWordpressSettings {
    graphql_url: Option<String>,
    search_index_url: Option<String>,
    auth_token: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    capacity: Option<u64>,
    default_revalidate_seconds: Option<u64>,
    search_index_ttl_seconds: Option<u64>,
    search_index_fallback_ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    landing_slug: Option<String>,
    posts_per_page: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSecretSettings {
    secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNewsletterSettings {
    api_url: Option<String>,
    api_key: Option<String>,
    from: Option<String>,
    audience: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn optional_url(value: Option<String>, key: &'static str) -> Result<Option<Url>, LoadError> {
    match non_empty(value) {
        Some(raw) => Url::parse(&raw)
            .map(Some)
            .map_err(|err| LoadError::invalid(key, format!("invalid url `{raw}`: {err}"))),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u64(value: u64, key: &'static str) -> Result<NonZeroU64, LoadError> {
    NonZeroU64::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
