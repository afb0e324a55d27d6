use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use qrest_api::{
    create_router, expose_internal_errors, middleware::RateLimiter, AppState, ServerInfo,
};
use qrest_core::services::{
    AccountService, ActivityService, AdminService, AiService, AuthService, CatalogService,
    CategoryService, CreditService, MenuItemService, MenuService, OrganizationService,
    PublicMenuService, QrCodeService, TeamService, ThemeService,
};
use qrest_infrastructure::{
    create_pool, create_redis_pool, run_migrations, OpenAiClient, PgActivityLogRepository,
    PgAiContentRepository, PgAuthTokenRepository, PgCategoryRepository,
    PgCreditPackageRepository, PgCreditRepository, PgMembershipRepository, PgMenuItemRepository,
    PgMenuRepository, PgMenuViewRepository, PgOrganizationRepository, PgQrCodeRepository,
    PgSubscriptionPlanRepository, PgThemeRepository, PgUserRepository, QrCodeRenderer,
    RedisRateLimitStore,
};
use qrest_security::JwtService;
use qrest_shared::config::AppConfig;

const CREDIT_RESET_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize telemetry; the guard flushes the file writer on exit
    let _log_guard = qrest_shared::telemetry::init_telemetry(&config.log)?;
    expose_internal_errors(config.app.env == "development");

    info!("QRest server starting ({})...", config.app.env);

    // Connect to Database
    info!("Connecting to database...");
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    info!("Database connection established, migrations applied.");

    // Connect to Redis
    let redis = create_redis_pool(&config.redis)?;
    info!("Redis pool created.");

    // Repositories
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let organizations = Arc::new(PgOrganizationRepository::new(pool.clone()));
    let memberships = Arc::new(PgMembershipRepository::new(pool.clone()));
    let tokens = Arc::new(PgAuthTokenRepository::new(pool.clone()));
    let menus = Arc::new(PgMenuRepository::new(pool.clone()));
    let categories = Arc::new(PgCategoryRepository::new(pool.clone()));
    let items = Arc::new(PgMenuItemRepository::new(pool.clone()));
    let views = Arc::new(PgMenuViewRepository::new(pool.clone()));
    let qr_codes = Arc::new(PgQrCodeRepository::new(pool.clone()));
    let themes = Arc::new(PgThemeRepository::new(pool.clone()));
    let activity = Arc::new(PgActivityLogRepository::new(pool.clone()));
    let credit_ledger = Arc::new(PgCreditRepository::new(pool.clone()));
    let plans = Arc::new(PgSubscriptionPlanRepository::new(pool.clone()));
    let packages = Arc::new(PgCreditPackageRepository::new(pool.clone()));
    let contents = Arc::new(PgAiContentRepository::new(pool.clone()));

    // Adapters
    let jwt = Arc::new(JwtService::new(&config.jwt));
    let ai_provider = Arc::new(OpenAiClient::new(config.ai.clone())?);
    if config.ai.api_key.as_deref().map_or(true, str::is_empty) {
        warn!("No AI API key configured; generation endpoints will return 503");
    }
    let renderer = Arc::new(QrCodeRenderer::new());
    let rate_limiter = RateLimiter::new(
        Arc::new(RedisRateLimitStore::new(redis)),
        jwt.clone(),
        &config.rate_limit,
    );

    // Services
    let team = Arc::new(TeamService::new(
        users.clone(),
        memberships.clone(),
        activity.clone(),
    ));
    let credits = Arc::new(CreditService::new(
        organizations.clone(),
        credit_ledger,
        plans.clone(),
        packages.clone(),
        contents.clone(),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        server: ServerInfo::new(config.app.env.clone()),
        jwt: jwt.clone(),
        rate_limiter,
        auth: Arc::new(AuthService::new(
            users.clone(),
            organizations.clone(),
            memberships.clone(),
            tokens.clone(),
            jwt.clone(),
        )),
        account: Arc::new(AccountService::new(
            users.clone(),
            tokens,
            config.app.frontend_url.clone(),
        )),
        organizations: Arc::new(OrganizationService::new(
            organizations.clone(),
            memberships.clone(),
            themes.clone(),
            team.clone(),
        )),
        team,
        menus: Arc::new(MenuService::new(
            menus.clone(),
            qr_codes.clone(),
            views.clone(),
            activity.clone(),
            jwt.clone(),
        )),
        categories: Arc::new(CategoryService::new(
            menus.clone(),
            categories.clone(),
            items.clone(),
        )),
        items: Arc::new(MenuItemService::new(categories.clone(), items.clone())),
        qr_codes: Arc::new(QrCodeService::new(
            menus.clone(),
            qr_codes.clone(),
            activity.clone(),
            renderer,
            config.app.frontend_url.clone(),
        )),
        public_menus: Arc::new(PublicMenuService::new(
            menus.clone(),
            qr_codes.clone(),
            organizations.clone(),
            themes.clone(),
            views.clone(),
            activity.clone(),
            jwt,
        )),
        themes: Arc::new(ThemeService::new(themes, activity.clone())),
        activity: Arc::new(ActivityService::new(
            activity,
            memberships.clone(),
            organizations.clone(),
            menus.clone(),
            categories,
            items,
        )),
        credits: credits.clone(),
        ai: Arc::new(AiService::new(
            ai_provider,
            credits.clone(),
            contents,
            menus.clone(),
        )),
        admin: Arc::new(AdminService::new(
            organizations.clone(),
            users,
            memberships,
            menus,
            qr_codes,
            views,
        )),
        catalog: Arc::new(CatalogService::new(plans, packages, organizations)),
    };

    // Monthly AI credit refill for organizations whose reset date has passed
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(CREDIT_RESET_CHECK_INTERVAL);
        loop {
            ticker.tick().await;
            match credits.reset_monthly_credits().await {
                Ok(0) => {}
                Ok(count) => info!("Reset monthly AI credits for {} organizations", count),
                Err(e) => error!("Monthly credit reset failed: {}", e),
            }
        }
    });

    let app = create_router(state);

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = signal_or_pending(
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).map(
            |mut signal| async move {
                signal.recv().await;
            },
        ),
        "SIGTERM",
    );

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Waits on an installed listener. One that failed to install never fires.
#[cfg_attr(not(unix), allow(dead_code))]
async fn signal_or_pending<F>(listener: std::io::Result<F>, name: &str)
where
    F: std::future::Future<Output = ()>,
{
    match listener {
        Ok(signal) => signal.await,
        Err(e) => {
            error!("Failed to listen for {}: {}", name, e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_listener_does_not_trigger_shutdown() {
        let failed: std::io::Result<std::future::Ready<()>> =
            Err(std::io::Error::other("signal registration denied"));
        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            signal_or_pending(failed, "SIGTERM"),
        )
        .await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_installed_listener_triggers_shutdown() {
        let fired = tokio::time::timeout(
            Duration::from_millis(50),
            signal_or_pending(Ok(std::future::ready(())), "SIGTERM"),
        )
        .await;
        assert!(fired.is_ok());
    }
}
