mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use storefront_api::{
    entities::Category,
    errors::ServiceError,
    services::{CreateProductInput, ProductListQuery, UpdateProductInput},
};
use uuid::Uuid;

fn query() -> ProductListQuery {
    ProductListQuery {
        page: 1,
        ..Default::default()
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn create_product_applies_defaults() {
    let app = TestApp::new().await;

    let product = app
        .state
        .services
        .catalog
        .create_product(CreateProductInput {
            name: "Bare".to_string(),
            description: "No image, no stock".to_string(),
            price: dec!(9.99),
            category: Category::Books,
            image_url: None,
            stock: None,
        })
        .await
        .unwrap();

    assert_eq!(product.stock, 0);
    assert!(product.is_active);
    assert!(product.image_url.contains("placeholder"));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn create_product_rejects_negative_price_and_blank_name() {
    let app = TestApp::new().await;
    let catalog = &app.state.services.catalog;

    let err = catalog
        .create_product(CreateProductInput {
            name: "Bad".to_string(),
            description: "x".to_string(),
            price: dec!(-1),
            category: Category::Other,
            image_url: None,
            stock: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = catalog
        .create_product(CreateProductInput {
            name: "   ".to_string(),
            description: "x".to_string(),
            price: dec!(1),
            category: Category::Other,
            image_url: None,
            stock: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn price_range_filter_is_inclusive() {
    let app = TestApp::new().await;
    app.seed_product("Cheap", dec!(5.00), 1).await;
    app.seed_product("LowerBound", dec!(10.00), 1).await;
    app.seed_product("Middle", dec!(30.00), 1).await;
    app.seed_product("UpperBound", dec!(50.00), 1).await;
    app.seed_product("Expensive", dec!(99.00), 1).await;

    let page = app
        .state
        .services
        .catalog
        .list_products(ProductListQuery {
            min_price: Some(Decimal::from(10)),
            max_price: Some(Decimal::from(50)),
            ..query()
        })
        .await
        .unwrap();

    let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(page.pagination.total_items, 3);
    assert!(names.contains(&"LowerBound"));
    assert!(names.contains(&"Middle"));
    assert!(names.contains(&"UpperBound"));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn category_filter_and_all_sentinel() {
    let app = TestApp::new().await;
    app.seed_product_in("Novel", dec!(12.00), 3, Category::Books)
        .await;
    app.seed_product_in("Racket", dec!(40.00), 3, Category::Sports)
        .await;

    let catalog = &app.state.services.catalog;

    let books = catalog
        .list_products(ProductListQuery {
            category: Some("books".to_string()),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(books.pagination.total_items, 1);
    assert_eq!(books.items[0].name, "Novel");

    let all = catalog
        .list_products(ProductListQuery {
            category: Some("all".to_string()),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(all.pagination.total_items, 2);

    // An unknown category matches nothing rather than erroring.
    let unknown = catalog
        .list_products(ProductListQuery {
            category: Some("groceries".to_string()),
            ..query()
        })
        .await
        .unwrap();
    assert_eq!(unknown.pagination.total_items, 0);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn search_matches_name_or_description_case_insensitively() {
    let app = TestApp::new().await;
    app.state
        .services
        .catalog
        .create_product(CreateProductInput {
            name: "Mechanical Keyboard".to_string(),
            description: "Clicky switches".to_string(),
            price: dec!(80.00),
            category: Category::Electronics,
            image_url: None,
            stock: Some(5),
        })
        .await
        .unwrap();
    app.state
        .services
        .catalog
        .create_product(CreateProductInput {
            name: "Mouse".to_string(),
            description: "Pairs well with any KEYBOARD".to_string(),
            price: dec!(25.00),
            category: Category::Electronics,
            image_url: None,
            stock: Some(5),
        })
        .await
        .unwrap();
    app.seed_product("Desk Lamp", dec!(15.00), 5).await;

    let page = app
        .state
        .services
        .catalog
        .list_products(ProductListQuery {
            search: Some("keyBOARD".to_string()),
            ..query()
        })
        .await
        .unwrap();

    assert_eq!(page.pagination.total_items, 2);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn pagination_metadata_and_out_of_range_pages() {
    let app = TestApp::new().await;
    for i in 0..5 {
        app.seed_product(&format!("Product {}", i), dec!(1.00), 1)
            .await;
    }

    let catalog = &app.state.services.catalog;

    let first = catalog
        .list_products(ProductListQuery {
            page: 1,
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.pagination.total_items, 5);
    assert_eq!(first.pagination.total_pages, 3);
    assert!(first.pagination.has_next);
    assert!(!first.pagination.has_prev);

    let last = catalog
        .list_products(ProductListQuery {
            page: 3,
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert!(!last.pagination.has_next);
    assert!(last.pagination.has_prev);

    let beyond = catalog
        .list_products(ProductListQuery {
            page: 9,
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.pagination.total_pages, 3);
    assert_eq!(beyond.pagination.total_items, 5);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn sorting_by_price() {
    let app = TestApp::new().await;
    app.seed_product("Mid", dec!(20.00), 1).await;
    app.seed_product("Cheap", dec!(5.00), 1).await;
    app.seed_product("Dear", dec!(50.00), 1).await;

    let page = app
        .state
        .services
        .catalog
        .list_products(ProductListQuery {
            sort_by: Some("price".to_string()),
            sort_order: Some("asc".to_string()),
            ..query()
        })
        .await
        .unwrap();

    let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Cheap", "Mid", "Dear"]);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn soft_delete_hides_product_from_reads_but_keeps_row() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Ephemeral", dec!(10.00), 5).await;

    let catalog = &app.state.services.catalog;
    catalog.deactivate_product(product_id).await.unwrap();

    let err = catalog.get_product(product_id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let page = catalog.list_products(query()).await.unwrap();
    assert_eq!(page.pagination.total_items, 0);

    // The row survives: it can be updated and relisted.
    let relisted = catalog
        .update_product(
            product_id,
            UpdateProductInput {
                is_active: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(relisted.is_active);
    assert!(catalog.get_product(product_id).await.is_ok());
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn update_is_partial_and_validates_bounds() {
    let app = TestApp::new().await;
    let product_id = app.seed_product("Stable", dec!(10.00), 5).await;

    let catalog = &app.state.services.catalog;

    let updated = catalog
        .update_product(
            product_id,
            UpdateProductInput {
                stock: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.stock, 42);
    assert_eq!(updated.name, "Stable");
    assert_eq!(updated.price, dec!(10.00));

    let err = catalog
        .update_product(
            product_id,
            UpdateProductInput {
                price: Some(dec!(-3)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = catalog
        .update_product(
            product_id,
            UpdateProductInput {
                stock: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));

    let err = catalog
        .update_product(Uuid::new_v4(), UpdateProductInput::default())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn categories_lists_distinct_active_categories() {
    let app = TestApp::new().await;
    app.seed_product_in("A", dec!(1.00), 1, Category::Books).await;
    app.seed_product_in("B", dec!(1.00), 1, Category::Books).await;
    let toys = app
        .seed_product_in("C", dec!(1.00), 1, Category::Toys)
        .await;

    let catalog = &app.state.services.catalog;
    let mut categories = catalog.list_categories().await.unwrap();
    categories.sort_by_key(|c| format!("{:?}", c));
    assert_eq!(categories, vec![Category::Books, Category::Toys]);

    // Deactivating the only toys product removes the category from the list.
    catalog.deactivate_product(toys).await.unwrap();
    let categories = catalog.list_categories().await.unwrap();
    assert_eq!(categories, vec![Category::Books]);
}
