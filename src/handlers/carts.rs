use crate::handlers::common::{success_response, validate_input};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    errors::ServiceError,
    services::AddItemInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints. Every route requires a bearer
/// token; the cart is addressed implicitly by the authenticated user.
pub fn carts_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/update", put(update_cart_item))
        .route("/remove/{product_id}", delete(remove_cart_item))
        .route("/clear", delete(clear_cart))
        .route("/count", get(cart_count))
        .with_auth()
}

/// Get the user's cart, creating an empty one on first access
async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let cart = state.services.carts.get_cart(user.id).await?;
    Ok(success_response(cart))
}

/// Add a product to the cart
async fn add_to_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddToCartRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .carts
        .add_item(
            user.id,
            AddItemInput {
                product_id: payload.product_id,
                quantity: payload.quantity,
            },
        )
        .await?;

    Ok(success_response(cart))
}

/// Set a cart line's quantity (0 removes the line)
async fn update_cart_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .carts
        .update_item_quantity(user.id, payload.product_id, payload.quantity)
        .await?;

    Ok(success_response(cart))
}

/// Remove a product from the cart
async fn remove_cart_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let cart = state
        .services
        .carts
        .remove_item(user.id, product_id)
        .await?;

    Ok(success_response(cart))
}

/// Empty the cart (idempotent)
async fn clear_cart(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let cart = state.services.carts.clear_cart(user.id).await?;
    Ok(success_response(cart))
}

/// Total quantity across all cart lines
async fn cart_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let count = state.services.carts.item_count(user.id).await?;
    Ok(success_response(serde_json::json!({ "count": count })))
}

// Request DTOs

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}
