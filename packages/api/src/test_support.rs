//! Shared fixtures for the handler tests. Everything runs against an
//! in-memory sqlite database with the schema derived from the entities.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend, EntityTrait,
    Schema, Set,
};

use crate::entity::{
    category, order, order_item, product, product_size, sea_orm_active_enums::OrderStatus, size,
    user,
};
use crate::routes::admin::users::hash_password;

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    let schema = Schema::new(DbBackend::Sqlite);
    let builder = db.get_database_backend();
    for stmt in [
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(size::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(product_size::Entity),
        schema.create_table_from_entity(order::Entity),
        schema.create_table_from_entity(order_item::Entity),
    ] {
        db.execute(builder.build(&stmt)).await.expect("create table");
    }

    db
}

/// One category with one product in sizes M (10 in stock) and L (5 in stock).
pub struct Seeded {
    pub category: category::Model,
    pub product: product::Model,
    pub size_m: size::Model,
    pub size_l: size::Model,
    pub variant_m: product_size::Model,
    pub variant_l: product_size::Model,
}

pub async fn seed_catalog(db: &DatabaseConnection) -> Seeded {
    let category = category::ActiveModel {
        name: Set("T-Shirts".into()),
        hide: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed category");

    let product = product::ActiveModel {
        category_id: Set(category.id),
        name: Set("Basic Tee".into()),
        price: Set(19.99),
        image: Set(None),
        hide: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed product");

    let size_m = size::ActiveModel {
        name: Set("M".into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed size M");
    let size_l = size::ActiveModel {
        name: Set("L".into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed size L");

    let variant_m = product_size::ActiveModel {
        product_id: Set(product.id),
        size_id: Set(size_m.id),
        quantity: Set(10),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed variant M");
    let variant_l = product_size::ActiveModel {
        product_id: Set(product.id),
        size_id: Set(size_l.id),
        quantity: Set(5),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed variant L");

    Seeded {
        category,
        product,
        size_m,
        size_l,
        variant_m,
        variant_l,
    }
}

/// Account with the password `password`.
pub async fn seed_user(db: &DatabaseConnection, username: &str, staff: bool) -> user::Model {
    let now = Utc::now().naive_utc();
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(None),
        password_hash: Set(hash_password("password").expect("hash seed password")),
        is_staff: Set(staff),
        is_superuser: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed user")
}

/// A fresh pending order for a fresh account, with no line items.
pub async fn seed_order(db: &DatabaseConnection) -> order::Model {
    let user = seed_user(db, "order-owner", false).await;
    let now = Utc::now().naive_utc();
    order::ActiveModel {
        user_id: Set(user.id),
        receiver: Set("Alice".into()),
        phone: Set("0123456789".into()),
        address: Set("1 Main Street".into()),
        note: Set(None),
        total_amount: Set(19.99),
        status: Set(OrderStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed order")
}

/// Set an order's status directly, bypassing the lifecycle rules.
pub async fn force_status(db: &DatabaseConnection, order_id: i32, status: OrderStatus) {
    let order = order::Entity::find_by_id(order_id)
        .one(db)
        .await
        .expect("load order")
        .expect("order exists");
    let mut active: order::ActiveModel = order.into();
    active.status = Set(status);
    active.update(db).await.expect("force status");
}
