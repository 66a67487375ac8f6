use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    pub category: Category,
    pub image_url: String,
    pub stock: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fixed product category set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "electronics")]
    Electronics,
    #[sea_orm(string_value = "clothing")]
    Clothing,
    #[sea_orm(string_value = "books")]
    Books,
    #[sea_orm(string_value = "home")]
    Home,
    #[sea_orm(string_value = "sports")]
    Sports,
    #[sea_orm(string_value = "toys")]
    Toys,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Model {
    /// Whether the product can currently be served to shoppers.
    pub fn is_purchasable(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_to_lowercase() {
        let json = serde_json::to_string(&Category::Electronics).unwrap();
        assert_eq!(json, "\"electronics\"");

        let parsed: Category = serde_json::from_str("\"books\"").unwrap();
        assert_eq!(parsed, Category::Books);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let parsed: Result<Category, _> = serde_json::from_str("\"groceries\"");
        assert!(parsed.is_err());
    }
}
