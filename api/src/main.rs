use actix_web::{web, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pa_api::app::create_app;
use pa_api::config::{Config, StorageBackend};
use pa_api::middleware::Authenticator;
use pa_api::routes::AppState;

use pa_core::repositories::{
    InMemoryProfileRepository, InMemoryTokenDenylist, InMemoryUserRepository, ProfileRepository,
    TokenDenylist, UserRepository,
};
use pa_core::services::abuse::{InMemoryRateLimiter, RateLimiterTrait};
use pa_core::services::auth::{AuthService, AuthServiceConfig};
use pa_core::services::authorization::AuthorizationService;
use pa_core::services::cleanup::{CleanupConfig, CleanupService};
use pa_core::services::otp::{
    CodeGenerator, InMemoryOtpStore, OtpStore, SecureCodeGenerator, SmsServiceTrait,
};
use pa_core::services::token::TokenService;
use pa_infra::cache::{RedisClient, RedisOtpStore, RedisTokenDenylist};
use pa_infra::database::{DatabasePool, MySqlProfileRepository, MySqlUserRepository};
use pa_infra::services::auth::RedisRateLimiter;
use pa_infra::sms::{create_sms_service, SmsServiceAdapter};
use pa_shared::LoggingConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        environment = %config.environment,
        storage = ?config.storage,
        bind = %config.server.bind_address(),
        "Starting PropAuth API server"
    );

    if config.auth.jwt.is_using_default_secret() {
        if config.environment.is_production() {
            anyhow::bail!("TOKEN_SIGNING_SECRET must be set in production");
        }
        warn!("TOKEN_SIGNING_SECRET not set, using the development secret");
    }

    let sms = Arc::new(SmsServiceAdapter::new(
        create_sms_service(&config.sms),
        config.sms.clone(),
        config.otp.ttl_seconds,
    ));
    info!(provider = sms.provider_name(), "SMS gateway ready");

    let generator: Arc<dyn CodeGenerator> = Arc::new(SecureCodeGenerator);

    match config.storage {
        StorageBackend::Persistent => run_persistent(config, sms, generator).await,
        StorageBackend::Memory => run_in_memory(config, sms, generator).await,
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Redis for OTPs, throttling and revocation; MySQL for identities
async fn run_persistent(
    config: Config,
    sms: Arc<SmsServiceAdapter>,
    generator: Arc<dyn CodeGenerator>,
) -> anyhow::Result<()> {
    let redis = Arc::new(
        RedisClient::new(config.cache.clone())
            .await
            .context("Failed to connect to Redis")?,
    );

    let database = DatabasePool::new(config.database.clone())
        .await
        .context("Failed to connect to MySQL")?;
    database
        .run_migrations()
        .await
        .context("Failed to run database migrations")?;
    info!(stats = %database.get_statistics(), "Database ready");

    let pool = database.get_pool().clone();
    let cutoff_ttl = config.auth.jwt.refresh_token_ttl.max(1) as u64;

    serve(
        &config,
        Arc::new(MySqlUserRepository::new(pool.clone())),
        Arc::new(MySqlProfileRepository::new(pool)),
        sms,
        Arc::new(RedisOtpStore::new(redis.clone())),
        Arc::new(RedisRateLimiter::new(redis.clone())),
        Arc::new(RedisTokenDenylist::new(redis, cutoff_ttl)),
        generator,
    )
    .await
}

/// Process-local stores, swept periodically by the cleanup task
async fn run_in_memory(
    config: Config,
    sms: Arc<SmsServiceAdapter>,
    generator: Arc<dyn CodeGenerator>,
) -> anyhow::Result<()> {
    if config.environment.is_production() {
        anyhow::bail!("STORAGE_BACKEND=memory is not allowed in production");
    }
    warn!("Using in-memory storage; all state is lost on restart");

    let otp_store = Arc::new(InMemoryOtpStore::new());
    let rate_limiter = Arc::new(InMemoryRateLimiter::new());
    let denylist = Arc::new(InMemoryTokenDenylist::new());

    Arc::new(CleanupService::new(
        otp_store.clone(),
        rate_limiter.clone(),
        denylist.clone(),
        CleanupConfig::default(),
    ))
    .start_background_task();

    serve(
        &config,
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryProfileRepository::new()),
        sms,
        otp_store,
        rate_limiter,
        denylist,
        generator,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn serve<U, P, S, O, R, D>(
    config: &Config,
    users: Arc<U>,
    profiles: Arc<P>,
    sms: Arc<S>,
    otp_store: Arc<O>,
    rate_limiter: Arc<R>,
    denylist: Arc<D>,
    generator: Arc<dyn CodeGenerator>,
) -> anyhow::Result<()>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    S: SmsServiceTrait + 'static,
    O: OtpStore + 'static,
    R: RateLimiterTrait + 'static,
    D: TokenDenylist + 'static,
{
    let tokens = Arc::new(TokenService::new(denylist, config.auth.jwt.clone()));
    let auth_config = AuthServiceConfig {
        otp: config.otp.clone(),
        rate_limit: config.rate_limit.clone(),
        auth: config.auth.clone(),
    };

    let auth_service = Arc::new(AuthService::new(
        users.clone(),
        profiles.clone(),
        sms,
        otp_store,
        rate_limiter,
        tokens.clone(),
        generator,
        auth_config,
    ));
    let authenticator: Authenticator =
        Arc::new(AuthorizationService::new(users, profiles, tokens));

    let app_state = web::Data::new(
        AppState::new(auth_service).with_trusted_proxies(config.server.trusted_proxies.clone()),
    );
    let authenticator = web::Data::new(authenticator);
    let cors = config.cors.clone();
    let environment = config.environment;
    let bind_address = config.server.bind_address();

    let mut server = HttpServer::new(move || {
        create_app(app_state.clone(), authenticator.clone(), &cors, environment)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    info!(address = %bind_address, "Listening");
    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    Ok(())
}
