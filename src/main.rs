use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::HeaderValue;
use axum::{routing::get, Router};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::{signal, sync::mpsc};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use uuid::Uuid;

use storefront_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    // Init DB
    let db = api::db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to the database")?;
    if cfg.auto_migrate {
        api::db::setup_schema(&db).await.map_err(|e| {
            error!("Failed setting up database schema: {}", e);
            e
        })?;
    }
    let db = Arc::new(db);
    let cfg = Arc::new(cfg);

    // Init events
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = api::events::EventSender::new(event_tx);
    tokio::spawn(api::events::process_events(event_rx));

    // Auth service
    let auth_service = Arc::new(api::auth::AuthService::new(
        api::auth::AuthConfig::new(cfg.jwt_secret.clone(), cfg.jwt_expiration),
        db.clone(),
    ));

    bootstrap_admin(&db, &cfg).await?;

    // Aggregate app services used by HTTP handlers
    let services = api::services::AppServices::new(db.clone(), event_sender.clone(), cfg.clone());

    let state = Arc::new(api::AppState {
        db,
        config: cfg.clone(),
        auth: auth_service,
        event_sender,
        services,
    });

    // Build CORS layer from config
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    let cors_layer = if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        info!("Using permissive CORS (explicit origins not configured)");
        CorsLayer::permissive()
    } else {
        error!("Missing CORS configuration; set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true");
        anyhow::bail!("missing CORS configuration");
    };

    // Build router: status/health + full v1 API + Swagger UI
    let app = Router::new()
        .route("/", get(|| async { "storefront-api up" }))
        .route("/health", get(api::handlers::health::health))
        .nest("/api/v1", api::handlers::api_router())
        .merge(api::openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors_layer)
        .with_state(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("storefront-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Creates the configured admin account when it does not exist yet, so a
/// fresh deployment has a principal able to create companies and stores.
async fn bootstrap_admin(
    db: &Arc<DatabaseConnection>,
    cfg: &api::config::AppConfig,
) -> anyhow::Result<()> {
    use api::entities::user;

    let (Some(email), Some(password)) = (
        cfg.bootstrap_admin_email.clone(),
        cfg.bootstrap_admin_password.clone(),
    ) else {
        return Ok(());
    };

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(&**db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Administrator".to_string()),
        email: Set(email.clone()),
        password_hash: Set(api::auth::hash_password(&password)?),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&**db)
    .await?;

    info!(%email, "bootstrap admin account created");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
