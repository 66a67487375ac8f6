pub mod carts;
pub mod common;
pub mod products;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{CartService, CatalogService, ReviewService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub carts: Arc<CartService>,
    pub catalog: Arc<CatalogService>,
    pub reviews: Arc<ReviewService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            carts: Arc::new(CartService::new(db_pool.clone(), event_sender.clone())),
            catalog: Arc::new(CatalogService::new(
                db_pool.clone(),
                event_sender.clone(),
                config,
            )),
            reviews: Arc::new(ReviewService::new(db_pool, event_sender)),
        }
    }
}
