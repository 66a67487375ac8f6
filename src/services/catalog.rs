use crate::{
    config::AppConfig,
    entities::{product, Category, Product, ProductModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// New products get this placeholder when no image is supplied.
const DEFAULT_IMAGE_URL: &str = "https://via.placeholder.com/300x300?text=No+Image";

/// Product catalog service: listing with filters/sort/pagination plus
/// administrative product writes. Soft-deletes only; a deactivated product
/// disappears from shopper-facing reads but its row (and its reviews) remain.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

impl CatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    /// Create a new product
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        if input.name.trim().is_empty() || input.description.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Name and description are required".to_string(),
            ));
        }
        if input.price < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Price cannot be negative".to_string(),
            ));
        }
        let stock = input.stock.unwrap_or(0);
        if stock < 0 {
            return Err(ServiceError::InvalidInput(
                "Stock cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            price: Set(input.price),
            category: Set(input.category),
            image_url: Set(input
                .image_url
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string())),
            stock: Set(stock),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!("Created product: {}", product.id);
        Ok(product)
    }

    /// Update an existing product. Inactive products stay updatable so an
    /// administrator can fix and relist them.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductModel, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let mut active: product::ActiveModel = product.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::InvalidInput(
                    "Name cannot be empty".to_string(),
                ));
            }
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(
                    "Price cannot be negative".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(image_url);
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(ServiceError::InvalidInput(
                    "Stock cannot be negative".to_string(),
                ));
            }
            active.stock = Set(stock);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }

        active.updated_at = Set(Utc::now());

        let product = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        info!("Updated product: {}", product_id);
        Ok(product)
    }

    /// Soft delete: clear the active flag, keeping the row and its reviews.
    #[instrument(skip(self))]
    pub async fn deactivate_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let mut active: product::ActiveModel = product.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeactivated(product_id))
            .await;

        info!("Deactivated product: {}", product_id);
        Ok(())
    }

    /// Get an active product by ID.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.is_purchasable())
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    /// Filtered, sorted, paginated listing of active products.
    ///
    /// An out-of-range page is not an error; it returns an empty item list
    /// with correct pagination metadata.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<ProductPage, ServiceError> {
        let mut condition = Condition::all().add(product::Column::IsActive.eq(true));

        // The literal "all" disables the category filter; any other unknown
        // value simply matches nothing.
        if let Some(category) = query
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != "all")
        {
            condition = condition.add(product::Column::Category.eq(category));
        }

        if let Some(min_price) = query.min_price {
            condition = condition.add(product::Column::Price.gte(min_price));
        }
        if let Some(max_price) = query.max_price {
            condition = condition.add(product::Column::Price.lte(max_price));
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            condition = condition.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            product::Entity,
                            product::Column::Name,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            product::Entity,
                            product::Column::Description,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        let mut select = Product::find().filter(condition);

        let sort_column = match query.sort_by.as_deref() {
            Some("name") => product::Column::Name,
            Some("price") => product::Column::Price,
            Some("stock") => product::Column::Stock,
            _ => product::Column::CreatedAt,
        };
        select = match query.sort_order.as_deref() {
            Some("asc") => select.order_by_asc(sort_column),
            _ => select.order_by_desc(sort_column),
        };

        let page = query.page.max(1);
        let page_size = query
            .limit
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size.max(1));

        let paginator = select.paginate(&*self.db, page_size);
        let total_items = paginator.num_items().await?;
        let items = paginator.fetch_page(page - 1).await?;

        Ok(ProductPage {
            items,
            pagination: PageMeta::compute(total_items, page, page_size),
        })
    }

    /// Distinct categories across active products.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        let categories = Product::find()
            .filter(product::Column::IsActive.eq(true))
            .select_only()
            .column(product::Column::Category)
            .distinct()
            .into_tuple::<Category>()
            .all(&*self.db)
            .await?;

        Ok(categories)
    }
}

/// Input for creating a product
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Category,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

/// Input for updating a product
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<Category>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
}

/// Catalog listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    pub limit: Option<u64>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn default_page() -> u64 {
    1
}

/// One page of products plus pagination metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<ProductModel>,
    pub pagination: PageMeta,
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    /// Derives the full metadata set from a total count and the requested
    /// page/size. `page_size` must be non-zero; callers clamp it first.
    pub fn compute(total_items: u64, page: u64, page_size: u64) -> Self {
        let total_pages = total_items.div_ceil(page_size);
        Self {
            current_page: page,
            total_pages,
            total_items,
            has_next: page * page_size < total_items,
            has_prev: page > 1,
        }
    }
}
