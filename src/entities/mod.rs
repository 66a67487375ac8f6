//! Database entities
pub mod cart;
pub mod cart_item;
pub mod product;
pub mod review;
pub mod user;

// Re-export entities
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use product::{Category, Entity as Product, Model as ProductModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use user::{Entity as User, Model as UserModel};
