mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::{errors::ServiceError, services::AddReviewInput};
use uuid::Uuid;

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn add_review_resolves_reviewer_name() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Reviewed", dec!(10.00), 5).await;

    let review = app
        .state
        .services
        .reviews
        .add_review(
            app.user_id,
            product_id,
            AddReviewInput {
                rating: 4,
                comment: "  Works as advertised  ".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(review.rating, 4);
    assert_eq!(review.user_name, "Test Shopper");
    // Comments are stored trimmed.
    assert_eq!(review.comment, "Works as advertised");

    let reviews = app
        .state
        .services
        .reviews
        .list_reviews(product_id)
        .await
        .unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].user_name, "Test Shopper");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn one_review_per_user_per_product() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Popular", dec!(10.00), 5).await;

    let reviews = &app.state.services.reviews;
    reviews
        .add_review(
            app.user_id,
            product_id,
            AddReviewInput {
                rating: 5,
                comment: "First impression".to_string(),
            },
        )
        .await
        .unwrap();

    // A second submission fails regardless of content.
    let err = reviews
        .add_review(
            app.user_id,
            product_id,
            AddReviewInput {
                rating: 1,
                comment: "Changed my mind".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // A different user may still review it.
    let (other_id, _) = app.register_user("Second").await;
    let review = reviews
        .add_review(
            other_id,
            product_id,
            AddReviewInput {
                rating: 3,
                comment: "It is fine".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(review.user_name, "Second");

    let all = reviews.list_reviews(product_id).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn rating_and_comment_are_validated() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Strict", dec!(10.00), 5).await;
    let reviews = &app.state.services.reviews;

    for rating in [0, 6, -1] {
        let err = reviews
            .add_review(
                app.user_id,
                product_id,
                AddReviewInput {
                    rating,
                    comment: "Valid comment".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(_));
    }

    let err = reviews
        .add_review(
            app.user_id,
            product_id,
            AddReviewInput {
                rating: 3,
                comment: "   ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn review_targets_must_exist_and_be_active_for_writes() {
    let app = TestApp::new().await;
    let reviews = &app.state.services.reviews;

    let err = reviews
        .add_review(
            app.user_id,
            Uuid::new_v4(),
            AddReviewInput {
                rating: 3,
                comment: "Ghost product".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let err = reviews.list_reviews(Uuid::new_v4()).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    // Writes require an active product; reads keep working after soft delete.
    let product_id = app.seed_product("Retiring", dec!(10.00), 5).await;
    reviews
        .add_review(
            app.user_id,
            product_id,
            AddReviewInput {
                rating: 5,
                comment: "Before retirement".to_string(),
            },
        )
        .await
        .unwrap();

    app.state
        .services
        .catalog
        .deactivate_product(product_id)
        .await
        .unwrap();

    let (other_id, _) = app.register_user("Late").await;
    let err = reviews
        .add_review(
            other_id,
            product_id,
            AddReviewInput {
                rating: 2,
                comment: "Too late".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let listed = reviews.list_reviews(product_id).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn reviews_are_listed_oldest_first() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Chronicle", dec!(10.00), 5).await;
    let reviews = &app.state.services.reviews;

    reviews
        .add_review(
            app.user_id,
            product_id,
            AddReviewInput {
                rating: 5,
                comment: "first".to_string(),
            },
        )
        .await
        .unwrap();

    let (second_id, _) = app.register_user("Later").await;
    reviews
        .add_review(
            second_id,
            product_id,
            AddReviewInput {
                rating: 4,
                comment: "second".to_string(),
            },
        )
        .await
        .unwrap();

    let listed = reviews.list_reviews(product_id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].comment, "first");
    assert_eq!(listed[1].comment, "second");
}
