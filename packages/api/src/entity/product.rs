//! `SeaORM` Entity for products

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    /// Live price. Order items snapshot this at checkout time and never
    /// reference it again.
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    /// Stored path of the product image, if any
    #[sea_orm(column_type = "Text", nullable)]
    pub image: Option<String>,
    /// Hidden products are excluded from the storefront
    pub hide: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(has_many = "super::product_size::Entity")]
    ProductSize,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_size::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSize.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
