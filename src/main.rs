use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use bloodlink::config::{LoggingSettings, Settings};
use bloodlink::core::DonorMatcher;
use bloodlink::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use bloodlink::services::{CacheManager, SessionVerifier, SupabaseClient, SupabaseTables};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// LOG_LEVEL / LOG_FORMAT win over the logging section
fn init_tracing(logging: &LoggingSettings) {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("Configuration error: {}", e))
    })?;

    init_tracing(&settings.logging);

    info!("Starting Bloodlink donor matching service...");

    if settings.store.jwt_secret.is_empty() {
        warn!("store.jwt_secret is empty; every authenticated request will be rejected");
    }

    // Initialize store client
    let tables = SupabaseTables {
        profiles: settings.tables.profiles.clone(),
        blood_requests: settings.tables.blood_requests.clone(),
        messages: settings.tables.messages.clone(),
    };

    let store = SupabaseClient::new(settings.store.url.clone(), settings.store.service_key.clone(), tables)
        .map_err(|e| {
            error!("Failed to build store client: {}", e);
            io::Error::other(e.to_string())
        })?;
    let store = Arc::new(store);

    info!("Store client initialized for {}", settings.store.url);

    // Initialize cache manager (Redis is optional)
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(60);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);

    let cache = match settings.cache.redis_url.as_deref() {
        Some(redis_url) => match CacheManager::new(redis_url, l1_cache_size, cache_ttl).await {
            Ok(c) => {
                info!("Cache manager initialized (L1: {} entries, TTL: {}s, Redis L2)", l1_cache_size, cache_ttl);
                c
            }
            Err(e) => {
                error!("Failed to connect to Redis ({}), running with in-process cache only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => {
            info!("Cache manager initialized (L1: {} entries, TTL: {}s)", l1_cache_size, cache_ttl);
            CacheManager::in_memory(l1_cache_size, cache_ttl)
        }
    };

    let matcher = DonorMatcher::new(settings.matching.eligibility_window_days);

    info!(
        "Matcher initialized (eligibility window: {} days, default radius: {} km)",
        matcher.eligibility_window_days(),
        settings.matching.default_max_distance_km
    );

    let verifier = web::Data::new(SessionVerifier::new(
        &settings.store.jwt_secret,
        &settings.store.jwt_audience,
    ));

    // Build application state
    let app_state = AppState {
        store,
        cache: Arc::new(cache),
        matcher,
        matching: settings.matching,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(verifier.clone())
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
