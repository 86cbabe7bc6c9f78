//! # Server Configuration
//!
//! Router assembly, shared application state and the OpenAPI document for
//! the Orderdesk API.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::{TraceContext, with_trace_context};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
}

/// Assigns every request a trace ID, exposed to handlers through both the
/// request extensions and task-local storage, and echoed as `X-Trace-Id`.
async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let context = TraceContext {
        trace_id: trace_id.clone(),
    };

    request.extensions_mut().insert(context.clone());

    let mut response = with_trace_context(context, next.run(request)).await;

    if let Ok(value) = trace_id.parse() {
        response.headers_mut().insert("X-Trace-Id", value);
    }

    response
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/tenants",
            post(handlers::tenants::create_tenant).get(handlers::tenants::list_tenants),
        )
        .route(
            "/tenants/{id}",
            get(handlers::tenants::get_tenant)
                .patch(handlers::tenants::update_tenant)
                .delete(handlers::tenants::delete_tenant),
        )
        .route(
            "/tenants/{id}/settings",
            get(handlers::tenants::get_settings).put(handlers::tenants::put_settings),
        )
        .route(
            "/locations",
            post(handlers::locations::create_location).get(handlers::locations::list_locations),
        )
        .route(
            "/locations/{id}",
            get(handlers::locations::get_location)
                .patch(handlers::locations::update_location)
                .delete(handlers::locations::delete_location),
        )
        .route(
            "/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/categories",
            post(handlers::categories::create_category).get(handlers::categories::list_categories),
        )
        .route(
            "/categories/{id}",
            get(handlers::categories::get_category)
                .patch(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route(
            "/products",
            post(handlers::products::create_product).get(handlers::products::list_products),
        )
        .route(
            "/products/{id}",
            get(handlers::products::get_product)
                .patch(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/customers",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/customers/{id}",
            get(handlers::customers::get_customer)
                .patch(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/orders",
            post(handlers::orders::create_order).get(handlers::orders::list_orders),
        )
        .route("/orders/stats", get(handlers::orders::order_stats))
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/{id}/status",
            patch(handlers::orders::update_order_status),
        )
        .route(
            "/orders/{id}/payment",
            patch(handlers::orders::update_payment_status),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", protected)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Creates an application state for tests
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    AppState {
        config: Arc::new(config),
        db,
    }
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;
    let profile = config.profile.clone();

    let state = AppState {
        config: Arc::new(config),
        db,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("opaque")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::tenants::create_tenant,
        crate::handlers::tenants::get_tenant,
        crate::handlers::tenants::list_tenants,
        crate::handlers::tenants::update_tenant,
        crate::handlers::tenants::delete_tenant,
        crate::handlers::tenants::get_settings,
        crate::handlers::tenants::put_settings,
        crate::handlers::locations::create_location,
        crate::handlers::locations::get_location,
        crate::handlers::locations::list_locations,
        crate::handlers::locations::update_location,
        crate::handlers::locations::delete_location,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::list_users,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::categories::create_category,
        crate::handlers::categories::get_category,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::list_products,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::order_stats,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::update_payment_status,
        crate::handlers::orders::delete_order,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::tenant::TenantStatus,
            crate::models::user::UserRole,
            crate::models::order::OrderStatus,
            crate::models::order::OrderType,
            crate::models::order::OrderSource,
            crate::models::order::PaymentMethod,
            crate::models::order::PaymentStatus,
            crate::error::ApiError,
            crate::handlers::tenants::TenantDto,
            crate::handlers::tenants::CreateTenantRequest,
            crate::handlers::tenants::UpdateTenantRequest,
            crate::handlers::tenants::TenantSettingsDto,
            crate::handlers::tenants::PutSettingsRequest,
            crate::handlers::locations::LocationDto,
            crate::handlers::locations::CreateLocationRequest,
            crate::handlers::locations::UpdateLocationRequest,
            crate::handlers::users::UserDto,
            crate::handlers::users::CreateUserRequest,
            crate::handlers::users::UpdateUserRequest,
            crate::handlers::categories::CategoryDto,
            crate::handlers::categories::CreateCategoryRequest,
            crate::handlers::categories::UpdateCategoryRequest,
            crate::handlers::products::ProductDto,
            crate::handlers::products::CreateProductRequest,
            crate::handlers::products::UpdateProductRequest,
            crate::handlers::customers::CustomerDto,
            crate::handlers::customers::CreateCustomerRequest,
            crate::handlers::customers::UpdateCustomerRequest,
            crate::handlers::orders::OrderDto,
            crate::handlers::orders::OrderItemDto,
            crate::handlers::orders::CreateOrderRequest,
            crate::handlers::orders::OrderCustomer,
            crate::handlers::orders::OrderItemRequest,
            crate::handlers::orders::UpdateOrderStatusRequest,
            crate::handlers::orders::UpdatePaymentStatusRequest,
            crate::handlers::orders::OrderStatsDto,
            crate::repositories::order::StatusCount,
            crate::repositories::order::RevenueSummary,
            crate::handlers::types::PaginatedResponse<crate::handlers::tenants::TenantDto>,
            crate::handlers::types::PaginatedResponse<crate::handlers::locations::LocationDto>,
            crate::handlers::types::PaginatedResponse<crate::handlers::users::UserDto>,
            crate::handlers::types::PaginatedResponse<crate::handlers::categories::CategoryDto>,
            crate::handlers::types::PaginatedResponse<crate::handlers::products::ProductDto>,
            crate::handlers::types::PaginatedResponse<crate::handlers::customers::CustomerDto>,
            crate::handlers::types::PaginatedResponse<crate::handlers::orders::OrderDto>,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Orderdesk API",
        description = "Multi-tenant restaurant ordering API",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
