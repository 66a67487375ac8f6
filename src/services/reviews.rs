use crate::{
    entities::{review, user, Product, Review, User},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Review service: append-only ratings with a one-review-per-user-per-product
/// rule. The average rating is never stored; clients derive it from the list.
#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// All reviews for a product, oldest first, with reviewer names resolved.
    ///
    /// Works for inactive products too; reviews outlive a soft delete.
    #[instrument(skip(self))]
    pub async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<ReviewView>, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let reviews = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .find_also_related(User)
            .order_by_asc(review::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(reviews
            .into_iter()
            .map(|(review, reviewer)| ReviewView::resolve(review, reviewer))
            .collect())
    }

    /// Append a review for a product on behalf of a user.
    #[instrument(skip(self))]
    pub async fn add_review(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        input: AddReviewInput,
    ) -> Result<ReviewView, ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::InvalidInput(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        let comment = input.comment.trim().to_string();
        if comment.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Comment cannot be empty".to_string(),
            ));
        }

        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .filter(|p| p.is_purchasable())
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let reviewer = User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        // Domain rule, checked here rather than left to the unique index so
        // the caller gets a Conflict instead of a constraint violation.
        let existing = Review::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "You have already reviewed this product".to_string(),
            ));
        }

        let review = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            comment: Set(comment),
            created_at: Set(Utc::now()),
        };

        let review = review.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ReviewAdded {
                product_id,
                user_id,
                rating: review.rating,
            })
            .await;

        info!("Added review {} for product {}", review.id, product_id);
        Ok(ReviewView::resolve(review, Some(reviewer)))
    }
}

/// Input for submitting a review
#[derive(Debug, Deserialize)]
pub struct AddReviewInput {
    pub rating: i32,
    pub comment: String,
}

/// Review with the reviewer's display name resolved
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl ReviewView {
    fn resolve(review: review::Model, reviewer: Option<user::Model>) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            user_name: reviewer
                .map(|u| u.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}
