use std::{process, sync::Arc, time::Duration};

use hollow::{
    application::{
        error::AppError,
        newsletter::{NewsletterConfig, NewsletterService},
        preview::PreviewService,
        revalidate::Revalidator,
        search_index::SearchIndexService,
        site::{SiteConfig, SiteService},
        sources::{ContentSource, Mailer, SearchIndexSource},
    },
    cache::{CacheConfig, CacheStore, ContentCache, MemoryStore},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        mailer::HttpMailer,
        telemetry,
        wordpress::{self, GraphqlContentSource, HttpSearchIndexSource},
    },
};
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let state = build_http_state(&settings)?;
    serve_http(&settings, state).await
}

fn build_http_state(settings: &config::Settings) -> Result<HttpState, AppError> {
    let graphql_url = settings
        .wordpress
        .graphql_url
        .clone()
        .ok_or_else(|| InfraError::configuration("wordpress graphql url is not configured"))
        .map_err(AppError::from)?;

    if settings.revalidate.secret.is_none() {
        warn!(
            target = "hollow::bootstrap",
            "revalidate secret is not configured; the webhook will reject every request"
        );
    }

    let http_client = wordpress::http_client(settings.wordpress.request_timeout)?;
    let cache_config = CacheConfig::from(&settings.cache);

    let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new(&cache_config));
    let cache = Arc::new(ContentCache::new(store));

    let content_source: Arc<dyn ContentSource> = Arc::new(GraphqlContentSource::new(
        http_client.clone(),
        graphql_url,
        settings.wordpress.auth_token.clone(),
        cache_config.default_revalidate_secs,
    ));
    let search_source: Arc<dyn SearchIndexSource> = Arc::new(HttpSearchIndexSource::new(
        http_client.clone(),
        settings.wordpress.search_index_url.clone(),
    ));
    let mailer: Arc<dyn Mailer> = Arc::new(HttpMailer::new(
        http_client,
        settings.newsletter.api_url.clone(),
        settings.newsletter.api_key.clone(),
    ));

    let site = SiteService::new(
        content_source,
        cache.clone(),
        SiteConfig {
            landing_slug: settings.site.landing_slug.clone(),
            posts_per_page: settings.site.posts_per_page.get(),
            default_revalidate_secs: cache_config.default_revalidate_secs,
        },
    );
    let search_index = SearchIndexService::new(
        search_source,
        cache.clone(),
        cache_config.search_index_ttl(),
        cache_config.search_index_fallback_ttl(),
    );
    let newsletter = NewsletterService::new(
        mailer,
        NewsletterConfig {
            from: settings.newsletter.from.clone(),
            audience: settings.newsletter.audience.clone(),
        },
    );

    Ok(HttpState {
        site: Arc::new(site),
        revalidator: Arc::new(Revalidator::new(
            cache,
            settings.revalidate.secret.clone(),
        )),
        search_index: Arc::new(search_index),
        preview: Arc::new(PreviewService::new(settings.preview.secret.clone())),
        newsletter: Arc::new(newsletter),
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "hollow::bootstrap",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "hollow::bootstrap", "server stopped");
    Ok(())
}

/// Resolves on ctrl-c, then arms a hard deadline for in-flight requests.
async fn shutdown_signal(grace: Duration) {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!(
        target = "hollow::bootstrap",
        grace_secs = grace.as_secs(),
        "shutdown requested; draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "hollow::bootstrap", "graceful shutdown deadline reached");
        process::exit(1);
    });
}
