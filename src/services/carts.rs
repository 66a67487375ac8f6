use crate::{
    entities::{cart, cart_item, product, Cart, CartItem, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shopping cart service.
///
/// Owns every cart mutation: validating requested quantities against current
/// product stock, merging lines, and recomputing the cart total from current
/// catalog prices on every persist. Each operation runs its read-mutate-write
/// sequence inside one transaction on the cart's own rows. Stock is read in
/// that same transaction but products are not locked: two concurrent adds for
/// the same product can both pass the stock check and jointly overcommit.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = self.find_or_create_cart(&txn, user_id).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;
        Ok(view)
    }

    /// Adds `quantity` of a product to the cart, merging with an existing
    /// line for the same product.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        input: AddItemInput,
    ) -> Result<CartView, ServiceError> {
        if input.quantity < 1 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let product = self.find_active_product(&txn, input.product_id).await?;
        let cart = self.find_or_create_cart(&txn, user_id).await?;

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        match existing {
            Some(line) => {
                let requested = line.quantity + input.quantity;
                if product.stock < requested {
                    return Err(ServiceError::InsufficientStock(format!(
                        "Only {} of {} available",
                        product.stock, product.name
                    )));
                }

                let mut line: cart_item::ActiveModel = line.into();
                line.quantity = Set(requested);
                line.updated_at = Set(Utc::now());
                line.update(&txn).await?;
            }
            None => {
                if product.stock < input.quantity {
                    return Err(ServiceError::InsufficientStock(format!(
                        "Only {} of {} available",
                        product.stock, product.name
                    )));
                }

                let line = cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(input.product_id),
                    quantity: Set(input.quantity),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                };
                line.insert(&txn).await?;
            }
        }

        let cart = self.recalculate_total(&txn, cart.id).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: view.id,
                product_id: input.product_id,
                quantity: input.quantity,
            })
            .await;

        info!(
            "Added product {} x{} to cart {}",
            input.product_id, input.quantity, view.id
        );
        Ok(view)
    }

    /// Sets a line's quantity to exactly the requested value.
    ///
    /// Zero removes the line; negative values are rejected.
    #[instrument(skip(self))]
    pub async fn update_item_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        if quantity < 0 {
            return Err(ServiceError::InvalidInput(
                "Quantity cannot be negative".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let cart = self.find_cart(&txn, user_id).await?;
        let line = self.find_line(&txn, cart.id, product_id).await?;

        if quantity == 0 {
            let line: cart_item::ActiveModel = line.into();
            line.delete(&txn).await?;
        } else {
            let product = self.find_active_product(&txn, product_id).await?;
            if product.stock < quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "Only {} of {} available",
                    product.stock, product.name
                )));
            }

            let mut line: cart_item::ActiveModel = line.into();
            line.quantity = Set(quantity);
            line.updated_at = Set(Utc::now());
            line.update(&txn).await?;
        }

        let cart = self.recalculate_total(&txn, cart.id).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                cart_id: view.id,
                product_id,
                quantity,
            })
            .await;

        Ok(view)
    }

    /// Removes a line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = self.find_cart(&txn, user_id).await?;
        let line = self.find_line(&txn, cart.id, product_id).await?;

        let line: cart_item::ActiveModel = line.into();
        line.delete(&txn).await?;

        let cart = self.recalculate_total(&txn, cart.id).await?;
        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id: view.id,
                product_id,
            })
            .await;

        Ok(view)
    }

    /// Empties the cart, creating it first if the user has none. Idempotent.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;

        let cart = self.find_or_create_cart(&txn, user_id).await?;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        let mut active: cart::ActiveModel = cart.into();
        active.total_amount = Set(Decimal::ZERO);
        active.updated_at = Set(Utc::now());
        let cart = active.update(&txn).await?;

        let view = self.build_view(&txn, cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared(view.id))
            .await;

        info!("Cleared cart {}", view.id);
        Ok(view)
    }

    /// Sum of all line quantities; 0 when the user has no cart.
    #[instrument(skip(self))]
    pub async fn item_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        let cart = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;

        let Some(cart) = cart else {
            return Ok(0);
        };

        let lines = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .all(&*self.db)
            .await?;

        Ok(lines.iter().map(|line| i64::from(line.quantity)).sum())
    }

    async fn find_cart<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<cart::Model, ServiceError> {
        Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart not found".to_string()))
    }

    async fn find_or_create_cart<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<cart::Model, ServiceError> {
        if let Some(existing) = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(conn)
            .await?
        {
            return Ok(existing);
        }

        let cart = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            total_amount: Set(Decimal::ZERO),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };

        let cart = cart.insert(conn).await?;
        self.event_sender
            .send_or_log(Event::CartCreated(cart.id))
            .await;
        Ok(cart)
    }

    async fn find_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> Result<cart_item::Model, ServiceError> {
        CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Item not found in cart".to_string()))
    }

    async fn find_active_product<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(conn)
            .await?
            .filter(|p| p.is_purchasable())
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))
    }

    /// Recomputes the cart total from the lines' current product prices.
    ///
    /// The total is a function of catalog prices at this moment, never of the
    /// prices in effect when lines were added; price drift between add and
    /// checkout is absorbed silently.
    async fn recalculate_total<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart_id: Uuid,
    ) -> Result<cart::Model, ServiceError> {
        let lines = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .find_also_related(Product)
            .all(conn)
            .await?;

        let total: Decimal = lines
            .iter()
            .filter_map(|(line, product)| {
                product
                    .as_ref()
                    .map(|p| p.price * Decimal::from(line.quantity))
            })
            .sum();

        let mut cart: cart::ActiveModel = Cart::find_by_id(cart_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart not found".to_string()))?
            .into();

        cart.total_amount = Set(total);
        cart.updated_at = Set(Utc::now());

        Ok(cart.update(conn).await?)
    }

    /// Builds the denormalized cart view, joining each line with current
    /// product details at response-construction time.
    async fn build_view<C: ConnectionTrait>(
        &self,
        conn: &C,
        cart: cart::Model,
    ) -> Result<CartView, ServiceError> {
        let lines = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .find_also_related(Product)
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(conn)
            .await?;

        let items = lines
            .into_iter()
            .filter_map(|(line, product)| {
                product.map(|p| CartLineView {
                    product_id: p.id,
                    name: p.name,
                    price: p.price,
                    image_url: p.image_url,
                    category: p.category,
                    stock: p.stock,
                    quantity: line.quantity,
                    line_total: p.price * Decimal::from(line.quantity),
                })
            })
            .collect();

        Ok(CartView {
            id: cart.id,
            user_id: cart.user_id,
            items,
            total_amount: cart.total_amount,
            updated_at: cart.updated_at,
        })
    }
}

/// Input for adding an item to the cart
#[derive(Debug, Deserialize)]
pub struct AddItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart response with product details resolved into each line
#[derive(Debug, Serialize, Deserialize)]
pub struct CartView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLineView>,
    pub total_amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// One cart line joined with current product details
#[derive(Debug, Serialize, Deserialize)]
pub struct CartLineView {
    pub product_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
    pub category: crate::entities::Category,
    pub stock: i32,
    pub quantity: i32,
    pub line_total: Decimal,
}
