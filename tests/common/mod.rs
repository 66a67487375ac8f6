#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use storefront_api::{
    auth::{AuthConfig, AuthService, RegisterRequest},
    config::AppConfig,
    db,
    entities::Category,
    events::{self, EventSender},
    handlers::AppServices,
    services::CreateProductInput,
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application backed by a throwaway
/// SQLite database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub token: String,
    pub user_id: Uuid,
}

impl TestApp {
    /// Construct a new test application with fresh database state and a
    /// registered shopper whose token is ready to use.
    pub async fn new() -> Self {
        let db_file = std::env::temp_dir().join(format!("storefront_test_{}.db", Uuid::new_v4()));

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(64);
        let event_sender = EventSender::new(event_tx);
        tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(3600),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            Arc::new(cfg.clone()),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
            auth: auth_service.clone(),
        };

        let router = storefront_api::app_router(state.clone());

        let registered = auth_service
            .register(RegisterRequest {
                name: "Test Shopper".to_string(),
                email: format!("shopper-{}@example.com", Uuid::new_v4()),
                password: "a-perfectly-fine-password".to_string(),
            })
            .await
            .expect("failed to register test user");

        Self {
            router,
            state,
            token: registered.access_token,
            user_id: registered.user.id,
        }
    }

    /// Register an additional user, returning (user_id, token).
    pub async fn register_user(&self, name: &str) -> (Uuid, String) {
        let registered = self
            .state
            .auth
            .register(RegisterRequest {
                name: name.to_string(),
                email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                password: "a-perfectly-fine-password".to_string(),
            })
            .await
            .expect("failed to register user");
        (registered.user.id, registered.access_token)
    }

    /// Seed a catalog product directly through the service layer.
    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> Uuid {
        let product = self
            .state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: format!("{} description", name),
                price,
                category: Category::Electronics,
                image_url: None,
                stock: Some(stock),
            })
            .await
            .expect("failed to seed product");
        product.id
    }

    /// Seed a product in a specific category.
    pub async fn seed_product_in(
        &self,
        name: &str,
        price: Decimal,
        stock: i32,
        category: Category,
    ) -> Uuid {
        let product = self
            .state
            .services
            .catalog
            .create_product(CreateProductInput {
                name: name.to_string(),
                description: format!("{} description", name),
                price,
                category,
                image_url: None,
                stock: Some(stock),
            })
            .await
            .expect("failed to seed product");
        product.id
    }

    /// Issue a request against the in-process router, decoding the JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request failed");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }
}
