//! `SeaORM` Entity for order line items

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    /// Deletion of the referenced inventory row is restricted so order
    /// history stays intact.
    pub product_size_id: i32,
    pub quantity: i32,
    /// Unit price captured at order time, decoupled from the live
    /// `Product.price`.
    #[sea_orm(column_type = "Double")]
    pub price: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product_size::Entity",
        from = "Column::ProductSizeId",
        to = "super::product_size::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    ProductSize,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product_size::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductSize.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
