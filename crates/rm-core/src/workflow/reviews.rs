//! The review gate: one review per (buyer, product), only after delivery.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::guards;
use crate::models::{Actor, OrderStatus, RatingSummary, Review, ReviewStatus};
use crate::traits::{OrderRepo, ReviewRepo};

pub struct ReviewGate {
    reviews: Arc<dyn ReviewRepo>,
    orders: Arc<dyn OrderRepo>,
}

impl ReviewGate {
    pub fn new(reviews: Arc<dyn ReviewRepo>, orders: Arc<dyn OrderRepo>) -> Self {
        Self { reviews, orders }
    }

    /// The preconditions fire in a fixed order so each failure mode stays
    /// distinguishable: missing order, wrong buyer, order not delivered,
    /// duplicate review.
    pub async fn create_review(
        &self,
        actor: &Actor,
        product_id: Uuid,
        order_id: Uuid,
        rating: u8,
        body: String,
    ) -> Result<Review> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::ValidationError("rating must be between 1 and 5".into()));
        }

        let order = self
            .orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".into(), order_id.to_string()))?;

        if !guards::is_buyer_of(&order, actor) {
            return Err(AppError::Forbidden(
                "only the order's buyer may leave a review".into(),
            ));
        }
        if order.status != OrderStatus::Delivered {
            return Err(AppError::InvalidState(
                "the order must be delivered before it can be reviewed".into(),
            ));
        }
        if self
            .reviews
            .find_by_author_and_product(actor.id, product_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "you have already reviewed this product".into(),
            ));
        }

        let review = Review {
            id: Uuid::now_v7(),
            product_id,
            order_id,
            author_id: actor.id,
            rating,
            body,
            status: ReviewStatus::Published,
            created_at: Utc::now(),
        };
        self.reviews.create_review(review.clone()).await?;
        log::info!("review {} published for product {}", review.id, product_id);
        Ok(review)
    }

    /// Aggregate rating, recomputed from the full review set on every call.
    /// Removing a review (moderation) therefore needs no compensation
    /// arithmetic: the next read is already correct.
    pub async fn product_rating(&self, product_id: Uuid) -> Result<RatingSummary> {
        Ok(self.reviews.rating_summary(product_id).await?)
    }
}
