//! `SeaORM` entities for the storefront schema

pub mod category;
pub mod order;
pub mod order_item;
pub mod prelude;
pub mod product;
pub mod product_size;
pub mod sea_orm_active_enums;
pub mod size;
pub mod user;
