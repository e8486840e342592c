pub mod addresses;
pub mod carts;
pub mod companies;
pub mod orders;
pub mod payments;
pub mod products;
pub mod reports;
pub mod stores;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::events::EventSender;

/// Caller scope handed to operations that serve both roles. Admin callers
/// see everything; store callers are confined to their own tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Admin(Uuid),
    Store(Uuid),
}

impl Actor {
    /// The tenant filter this actor implies, if any.
    pub fn store_scope(&self) -> Option<Uuid> {
        match self {
            Actor::Admin(_) => None,
            Actor::Store(id) => Some(*id),
        }
    }
}

/// Aggregated lifecycle services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub carts: Arc<carts::CartService>,
    pub orders: Arc<orders::OrderService>,
    pub payments: Arc<payments::PaymentService>,
    pub addresses: Arc<addresses::AddressService>,
    pub products: Arc<products::ProductService>,
    pub stores: Arc<stores::StoreService>,
    pub companies: Arc<companies::CompanyService>,
    pub reports: Arc<reports::ReportService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            carts: Arc::new(carts::CartService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(orders::OrderService::new(
                db.clone(),
                event_sender.clone(),
                config.clone(),
            )),
            payments: Arc::new(payments::PaymentService::new(
                db.clone(),
                event_sender.clone(),
                config,
            )),
            addresses: Arc::new(addresses::AddressService::new(db.clone(), event_sender)),
            products: Arc::new(products::ProductService::new(db.clone())),
            stores: Arc::new(stores::StoreService::new(db.clone())),
            companies: Arc::new(companies::CompanyService::new(db.clone())),
            reports: Arc::new(reports::ReportService::new(db)),
        }
    }
}
