//! Back-office JSON APIs. Every handler checks `AppUser::require_staff`
//! before touching anything.

use axum::Router;

use crate::state::AppState;

pub mod orders;
pub mod products;
pub mod users;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", orders::routes())
        .nest("/products", products::routes())
        .nest("/users", users::routes())
}
