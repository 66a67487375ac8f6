use crate::handlers::common::{created_response, success_response};
use crate::{
    auth::{AuthRouterExt, AuthUser},
    entities::ProductModel,
    errors::ServiceError,
    services::{
        AddReviewInput, CreateProductInput, ProductListQuery, ReviewView, UpdateProductInput,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde::Serialize;
use uuid::Uuid;

/// Creates the router for catalog endpoints.
///
/// Reads are public; product writes and review submission require auth.
pub fn products_routes() -> Router<AppState> {
    let reads = Router::new()
        .route("/", get(list_products))
        .route("/categories", get(list_categories))
        .route("/{id}", get(get_product))
        .route("/{id}/reviews", get(list_reviews));

    let writes = Router::new()
        .route("/", post(create_product))
        .route("/{id}", put(update_product))
        .route("/{id}", delete(delete_product))
        .route("/{id}/reviews", post(add_review))
        .with_auth();

    reads.merge(writes)
}

/// Filtered, sorted, paginated product listing
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let page = state.services.catalog.list_products(query).await?;
    Ok(success_response(page))
}

/// Distinct categories across active products
async fn list_categories(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(
        serde_json::json!({ "categories": categories }),
    ))
}

/// Product detail with reviews (reviewer names resolved)
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let product = state.services.catalog.get_product(id).await?;
    let reviews = state.services.reviews.list_reviews(id).await?;

    Ok(success_response(ProductDetail { product, reviews }))
}

/// Create a product
async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let product = state.services.catalog.create_product(payload).await?;
    Ok(created_response(product))
}

/// Partially update a product
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductInput>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let product = state.services.catalog.update_product(id, payload).await?;
    Ok(success_response(product))
}

/// Soft-delete a product
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    state.services.catalog.deactivate_product(id).await?;
    Ok(success_response(serde_json::json!({
        "message": "Product deleted successfully"
    })))
}

/// List a product's reviews
async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let reviews = state.services.reviews.list_reviews(id).await?;
    Ok(success_response(serde_json::json!({ "reviews": reviews })))
}

/// Submit a review for a product
async fn add_review(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddReviewInput>,
) -> Result<impl axum::response::IntoResponse, ServiceError> {
    let review = state.services.reviews.add_review(user.id, id, payload).await?;
    Ok(created_response(review))
}

/// Product detail response: the product joined with its reviews
#[derive(Debug, Serialize)]
struct ProductDetail {
    #[serde(flatten)]
    product: ProductModel,
    reviews: Vec<ReviewView>,
}
