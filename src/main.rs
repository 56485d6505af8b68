use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wishlist_server::config::Config;
use wishlist_server::scrape::{ScrapeConfig, Scraper};
use wishlist_server::state::AppState;
use wishlist_server::{db, handlers};

#[tokio::main]
async fn main() {
    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "wishlist_server=info,tower_http=info,sqlx=warn"
            .parse()
            .unwrap()
    });

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Wishlist Server starting...");

    let config = Config::from_env().expect("Failed to load configuration");
    info!("📝 Configuration loaded");

    // Create database connection pool
    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    // Auto-run pending migrations on startup.
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    info!("✅ Database migrations applied");

    db::health_check(&pool)
        .await
        .expect("Database health check failed");
    info!("✅ Database health check passed");

    // CORS: dev mode mirrors the requesting origin and allows credentials so
    // the cookie-based frontend works from its own dev server port.
    let cors = if config.is_dev {
        info!("🔓 CORS: very permissive (dev mode)");
        CorsLayer::very_permissive()
    } else {
        tracing::warn!(
            "🔒 CORS: restrictive (production mode). \
             Cross-origin requests will be denied."
        );
        CorsLayer::new()
    };

    let addr = config.server_addr();

    let scraper = Scraper::new(ScrapeConfig {
        max_sessions: config.max_concurrent_scrapes,
        ..ScrapeConfig::default()
    });
    info!(
        "🔍 Scraper ready ({} concurrent sessions max)",
        config.max_concurrent_scrapes
    );

    let app_state = AppState {
        pool,
        jwt_secret: Arc::from(config.jwt_secret.as_str()),
        scraper: Arc::new(scraper),
        is_dev: config.is_dev,
    };

    // Prometheus metrics layer
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    // Build router
    let app = Router::new()
        // Health check + metrics
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        // Auth routes
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/me", get(handlers::users::get_current_user))
        // Wishlist routes (protected)
        .route("/api/wishlists", get(handlers::wishlists::list_wishlists))
        .route("/api/wishlists", post(handlers::wishlists::create_wishlist))
        .route(
            "/api/wishlists/shared",
            get(handlers::wishlists::list_shared_wishlists),
        )
        .route("/api/wishlists/:id", get(handlers::wishlists::get_wishlist))
        .route(
            "/api/wishlists/:id",
            patch(handlers::wishlists::update_wishlist),
        )
        .route(
            "/api/wishlists/:id",
            delete(handlers::wishlists::delete_wishlist),
        )
        // Share routes (protected, owner only)
        .route(
            "/api/wishlists/:id/share",
            post(handlers::wishlists::share_wishlist),
        )
        .route(
            "/api/wishlists/:id/shares",
            get(handlers::wishlists::list_shares),
        )
        .route(
            "/api/wishlists/:id/share/:user_id",
            delete(handlers::wishlists::unshare_wishlist),
        )
        // Item routes (protected, nested under wishlist)
        .route(
            "/api/wishlists/:id/items",
            post(handlers::items::create_item),
        )
        .route("/api/items/:id", patch(handlers::items::update_item))
        .route("/api/items/:id", delete(handlers::items::delete_item))
        .route(
            "/api/items/:id/purchased",
            patch(handlers::items::set_purchased),
        )
        // Product page scraping
        .route("/api/parse-url", post(handlers::scrape::parse_url))
        // Middleware
        .layer(prometheus_layer)
        .layer(cors)
        .with_state(app_state);

    // Start server
    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
