pub use super::category::Entity as Category;
pub use super::order::Entity as Order;
pub use super::order_item::Entity as OrderItem;
pub use super::product::Entity as Product;
pub use super::product_size::Entity as ProductSize;
pub use super::size::Entity as Size;
pub use super::user::Entity as User;
