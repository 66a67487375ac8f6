//! Business logic services used by the HTTP handlers
pub mod carts;
pub mod catalog;
pub mod reviews;

pub use carts::{AddItemInput, CartService, CartView};
pub use catalog::{
    CatalogService, CreateProductInput, PageMeta, ProductListQuery, ProductPage,
    UpdateProductInput,
};
pub use reviews::{AddReviewInput, ReviewService, ReviewView};
