use std::time::Duration;

use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::entities::{address, cart, cart_item, company, order, order_item, payment, product, store, user};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

/// Establishes a connection pool with custom configuration.
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, DbErr> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    Database::connect(opt).await
}

/// Establishes a connection pool from the application configuration.
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, DbErr> {
    let config = DbConfig {
        url: cfg.database_url.clone(),
        max_connections: cfg.db_max_connections,
        min_connections: cfg.db_min_connections,
        ..Default::default()
    };
    establish_connection_with_config(&config).await
}

/// Creates any missing tables and indexes from the entity definitions.
///
/// Idempotent: every statement carries IF NOT EXISTS. The unique index on
/// `payments.order_id` comes from the entity itself and is the backstop for
/// the double-initiation race; the composite cart_items index keeps a cart
/// from holding two lines for the same product under concurrent adds.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    macro_rules! create_table {
        ($entity:expr) => {{
            let mut stmt = schema.create_table_from_entity($entity);
            stmt.if_not_exists();
            db.execute(backend.build(&stmt)).await?;
        }};
    }

    create_table!(user::Entity);
    create_table!(company::Entity);
    create_table!(store::Entity);
    create_table!(product::Entity);
    create_table!(cart::Entity);
    create_table!(cart_item::Entity);
    create_table!(address::Entity);
    create_table!(order::Entity);
    create_table!(order_item::Entity);
    create_table!(payment::Entity);

    let cart_line_idx = Index::create()
        .name("ux_cart_items_cart_product")
        .table(cart_item::Entity)
        .col(cart_item::Column::CartId)
        .col(cart_item::Column::ProductId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&cart_line_idx)).await?;

    let order_store_idx = Index::create()
        .name("ix_orders_store_id")
        .table(order::Entity)
        .col(order::Column::StoreId)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&order_store_idx)).await?;

    let address_store_idx = Index::create()
        .name("ix_addresses_store_id")
        .table(address::Entity)
        .col(address::Column::StoreId)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&address_store_idx)).await?;

    info!("Database schema is up to date");
    Ok(())
}
