use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

/// Security scheme modifier to add authentication methods
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                Http::builder()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = "Storefront backend: catalog browsing, checkout and the back office.\n\n## Authentication\n\nStaff endpoints under `/admin` and the order endpoints require a JWT: `Authorization: Bearer <token>`.",
        license(name = "MIT")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "admin", description = "Back-office operations, staff only")
    ),
    paths(
        // Health routes
        crate::routes::health::health,
        crate::routes::health::db_health,
        // Admin order routes
        crate::routes::admin::orders::search_orders::search_orders,
        crate::routes::admin::orders::statistics::order_statistics,
        crate::routes::admin::orders::accept_order::accept_order,
        crate::routes::admin::orders::cancel_order::cancel_order,
        crate::routes::admin::orders::update_status::update_status,
        // Admin product routes
        crate::routes::admin::products::list_products::list_products,
        crate::routes::admin::products::create_product::create_product,
        crate::routes::admin::products::update_product::update_product,
        // Admin user routes
        crate::routes::admin::users::list_users::list_users,
        crate::routes::admin::users::create_user::create_user,
        crate::routes::admin::users::update_password::update_password,
        crate::routes::admin::users::delete_user::delete_user,
    ),
    components(schemas(
        // Health schemas
        crate::routes::health::HealthResponse,
        crate::routes::health::DbHealthResponse,
        // Admin order schemas
        crate::routes::admin::orders::StatusChangeResponse,
        crate::routes::admin::orders::cancel_order::CancelRequest,
        crate::routes::admin::orders::update_status::UpdateStatusRequest,
        crate::routes::admin::orders::statistics::OrderStats,
        crate::routes::admin::orders::statistics::StatisticsResponse,
        // Admin product schemas
        crate::routes::admin::products::SizeQuantity,
        crate::routes::admin::products::create_product::CreateProductRequest,
        crate::routes::admin::products::update_product::UpdateProductRequest,
        // Admin user schemas
        crate::routes::admin::users::create_user::CreateUserRequest,
        crate::routes::admin::users::update_password::UpdatePasswordRequest,
        crate::routes::admin::users::update_password::UpdatePasswordResponse,
        crate::routes::admin::users::delete_user::DeleteUserResponse,
    ))
)]
pub struct ApiDoc;
